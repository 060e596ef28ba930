//! Status message extraction from workload log output.
//!
//! Workloads log one JSON record per line, `{"message": "...", ...}`. The
//! most recent message is the one reported back to callers.

use serde::Deserialize;

#[derive(Deserialize)]
struct LogRecord {
    message: String,
}

/// Pull the latest status message out of raw log output.
///
/// The whole payload is tried as a single JSON record first. Otherwise the
/// last non-empty line is used, unwrapped if it is itself a JSON record.
/// Empty output yields an empty message.
pub fn extract_message(raw: &str) -> String {
    let trimmed = raw.trim();
    if let Some(message) = parse_record(trimmed) {
        return message;
    }
    match trimmed.lines().rev().map(str::trim).find(|l| !l.is_empty()) {
        Some(line) => parse_record(line).unwrap_or_else(|| line.to_string()),
        None => String::new(),
    }
}

fn parse_record(text: &str) -> Option<String> {
    if !text.starts_with('{') {
        return None;
    }
    serde_json::from_str::<LogRecord>(text)
        .ok()
        .map(|r| r.message)
}
