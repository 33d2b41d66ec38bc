//! Celebrity outfit "dupe" finder service
//!
//! Accepts a photo of a celebrity outfit, asks a Gemini vision model to
//! identify the pieces and invent budget alternatives, and serves the
//! analysis as JSON. Model selection falls back across candidates until one
//! answers.

pub mod ai;
pub mod app;
pub mod comparison;
pub mod error;
pub mod fallback;
pub mod models;
pub mod prompts;
pub mod server;

pub use error::{Error, Result};
