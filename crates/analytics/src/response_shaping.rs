//! Response shaping (size control) for analytics API payloads.
//!
//! Every upstream payload goes through three stages, always in this order:
//! 1. result-count limiting (top-level arrays, and arrays one level inside a top-level object)
//! 2. string truncation (recursive)
//! 3. total-size enforcement on the serialized payload
//!
//! Stages 2 and 3 are skipped when truncation is disabled. The pipeline is pure: no I/O, no state.

use crate::config::ShapingConfig;
use serde_json::{Map, Value, json};
use tracing::debug;

/// Strings longer than this (in chars) are cut by stage 2.
pub const MAX_STRING_LENGTH: usize = 1000;
/// Limit used by the stage 3 fallback for oversized non-array payloads.
pub const AGGRESSIVE_STRING_LENGTH: usize = 200;
/// Appended to every shortened string.
pub const TRUNCATION_MARKER: &str = "... [truncated]";

/// Applies the shaping stages with a fixed [`ShapingConfig`].
///
/// Cheap to copy and safe to share across tasks.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseShaper {
    config: ShapingConfig,
}

impl ResponseShaper {
    #[must_use]
    pub fn new(config: ShapingConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &ShapingConfig {
        &self.config
    }

    /// Bound a raw upstream payload.
    #[must_use]
    pub fn shape(&self, value: Value) -> Value {
        let value = limit_results(value, self.config.max_results);
        if !self.config.enable_truncation {
            return value;
        }
        let value = truncate_strings(value, MAX_STRING_LENGTH);
        enforce_total_size(value, self.config.max_response_size)
    }
}

/// Stage 1: replace over-long arrays with a results wrapper.
///
/// Only the value itself and the direct values of a top-level object are inspected; deeper
/// arrays pass through untouched.
#[must_use]
pub fn limit_results(value: Value, max_results: usize) -> Value {
    match value {
        Value::Array(items) => limit_array(items, max_results),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| match v {
                    Value::Array(items) => (k, limit_array(items, max_results)),
                    other => (k, other),
                })
                .collect::<Map<String, Value>>(),
        ),
        other => other,
    }
}

fn limit_array(mut items: Vec<Value>, max_results: usize) -> Value {
    let total = items.len();
    if total <= max_results {
        return Value::Array(items);
    }
    items.truncate(max_results);
    debug!(total, returned = max_results, "limited result count");
    results_wrapper(
        items,
        total,
        format!(
            "Showing {max_results} of {total} results. Use more specific filters to narrow the results."
        ),
    )
}

/// Stage 2: shorten every string longer than `max_chars` (keys are left alone).
#[must_use]
pub fn truncate_strings(mut value: Value, max_chars: usize) -> Value {
    truncate_strings_in_place(&mut value, max_chars);
    value
}

fn truncate_strings_in_place(v: &mut Value, max_chars: usize) {
    match v {
        Value::String(s) => {
            // Byte offset of the first char past the limit, if any.
            if let Some((cut, _)) = s.char_indices().nth(max_chars) {
                s.truncate(cut);
                s.push_str(TRUNCATION_MARKER);
            }
        }
        Value::Object(map) => {
            for v in map.values_mut() {
                truncate_strings_in_place(v, max_chars);
            }
        }
        Value::Array(arr) => {
            for v in arr {
                truncate_strings_in_place(v, max_chars);
            }
        }
        _ => {}
    }
}

/// Stage 3: keep the serialized payload within `max_size` characters (best-effort).
///
/// Arrays are cut to an item budget estimated from the average serialized item size. Anything
/// else gets one more string-truncation pass with [`AGGRESSIVE_STRING_LENGTH`], which may still
/// leave the payload above the limit.
#[must_use]
pub fn enforce_total_size(value: Value, max_size: usize) -> Value {
    let size = serialized_len(&value);
    if size <= max_size {
        return value;
    }

    match value {
        Value::Array(mut items) if !items.is_empty() => {
            let total = items.len();
            // floor(0.8 * max_size / (size / total)), at least one item.
            let budget = ((max_size.saturating_mul(4) / 5).saturating_mul(total) / size)
                .clamp(1, total);
            items.truncate(budget);
            debug!(size, max_size, total, returned = budget, "cut array to size budget");
            results_wrapper(
                items,
                total,
                format!(
                    "Response truncated to {budget} of {total} items to stay within the {max_size} character size limit. Use more specific filters or pagination."
                ),
            )
        }
        mut other => {
            debug!(size, max_size, "oversized payload, applying aggressive string truncation");
            truncate_strings_in_place(&mut other, AGGRESSIVE_STRING_LENGTH);
            other
        }
    }
}

/// Length of the compact JSON serialization, in chars.
#[must_use]
pub fn serialized_len(value: &Value) -> usize {
    value.to_string().chars().count()
}

fn results_wrapper(results: Vec<Value>, total: usize, message: String) -> Value {
    let returned = results.len();
    json!({
        "results": results,
        "total_available": total,
        "returned": returned,
        "truncated": true,
        "message": message,
    })
}
