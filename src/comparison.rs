//! Normalization of the structured outfit comparison returned by the model.
//!
//! The requester treats any successful generation as final; this layer
//! decides whether the text is a usable comparison document.

use crate::fallback::FailureKind;
use serde_json::{Map, Value};

pub const CELEBRITY_ITEMS: &str = "celebrityItems";
pub const BUDGET_ITEMS: &str = "budgetItems";

/// Parses and validates the comparison JSON, backfilling missing totals.
///
/// Fields the model supplied are passed through untouched.
pub fn normalize_comparison(text: &str) -> Result<Value, FailureKind> {
    let mut document: Value = serde_json::from_str(text).map_err(|e| {
        tracing::error!("Failed to parse Gemini JSON response: {}\nBody: {}", e, text);
        FailureKind::MalformedResponse
    })?;

    let object = document.as_object_mut().ok_or_else(|| {
        tracing::error!("Gemini JSON response is not an object");
        FailureKind::InvalidResponseShape
    })?;

    for field in [CELEBRITY_ITEMS, BUDGET_ITEMS] {
        if !object.get(field).is_some_and(Value::is_array) {
            tracing::error!("Gemini JSON response is missing array field {}", field);
            return Err(FailureKind::InvalidResponseShape);
        }
    }

    backfill_totals(object);
    Ok(document)
}

/// Totals that would overflow `i64` are left out rather than wrapped.
fn backfill_totals(object: &mut Map<String, Value>) {
    let celeb_total = sum_prices(&object[CELEBRITY_ITEMS]);
    let budget_total = sum_prices(&object[BUDGET_ITEMS]);

    let celeb_total = fill_number(object, "totalCelebPrice", celeb_total);
    let budget_total = fill_number(object, "totalBudgetPrice", budget_total);
    let saving = celeb_total
        .zip(budget_total)
        .and_then(|(celeb, budget)| celeb.checked_sub(budget));
    let saving = fill_number(object, "savingAmount", saving);

    if let Some(saving) = saving {
        if !object.contains_key("savingText") {
            object.insert("savingText".to_string(), Value::from(saving_text(saving)));
        }
    }
}

/// Inserts `derived` under `key` when absent and returns the effective value.
fn fill_number(object: &mut Map<String, Value>, key: &str, derived: Option<i64>) -> Option<i64> {
    match object.get(key) {
        Some(existing) => existing.as_i64().or(derived),
        None => {
            if let Some(value) = derived {
                object.insert(key.to_string(), Value::from(value));
            } else {
                tracing::warn!("Skipping {} backfill: derived total overflows", key);
            }
            derived
        }
    }
}

fn sum_prices(items: &Value) -> Option<i64> {
    let Some(items) = items.as_array() else {
        return Some(0);
    };
    items.iter().try_fold(0i64, |total, item| {
        let price = match item.get("price") {
            Some(Value::String(price)) => parse_price(price),
            Some(Value::Number(n)) => n.as_i64().unwrap_or(0),
            _ => 0,
        };
        total.checked_add(price)
    })
}

/// Reads a display price such as `"350,000"` or `"49,000원"`; digits only,
/// anything unparsable counts as zero.
pub fn parse_price(price: &str) -> i64 {
    let digits: String = price.chars().filter(char::is_ascii_digit).collect();
    digits.parse().unwrap_or(0)
}

/// Formats `amount` with thousands separators and a trailing `원`.
pub fn format_won(amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    let sign = if amount < 0 { "-" } else { "" };
    format!("{}{}원", sign, grouped)
}

pub fn saving_text(amount: i64) -> String {
    format!("총 {} 절약!", format_won(amount))
}
