//! Model fallback for image understanding
//!
//! Discovers candidate models (or falls back to a fixed list), then tries
//! them one at a time until the first success. Failures are classified into
//! the caller-facing [`FailureKind`] taxonomy.

pub mod candidates;
pub mod classify;
pub mod requester;

pub use candidates::{filter_discovered, resolve_candidates, STATIC_FALLBACK_MODELS};
pub use classify::{classify, FailureKind};
pub use requester::{
    analyze_image, first_success, AggregateOutcome, Attempts, Failure, FallbackRequester,
    Success,
};
