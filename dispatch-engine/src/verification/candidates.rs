//! Candidate extraction from vision model output
//!
//! The model is asked for `{"candidates": [...]}` but frequently wraps it in a
//! code fence, adds prose, or answers with free text. Structured extraction is
//! tried first; when the text holds no parseable JSON object, token-like runs
//! are pulled out with a regex instead.

use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

/// Fixed extraction prompt sent with every image
pub const EXTRACTION_PROMPT: &str = "You are reading a photo of utility equipment. \
List every serial number, asset number, barcode text or other alphanumeric \
identifier visible in the image, exactly as printed. Respond with JSON only, \
in the form {\"candidates\": [\"...\", \"...\"]}. If nothing is legible, \
respond with {\"candidates\": []}.";

/// Runs of at least six alphanumeric, hyphen or colon characters
static TOKEN_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z0-9\-:]{6,}").expect("token pattern is valid"));

/// Extract candidate strings, de-duplicated in first-seen order
pub fn extract_candidates(text: &str) -> Vec<String> {
    let raw = match parse_json_candidates(text) {
        Some(found) => found,
        None => TOKEN_PATTERN
            .find_iter(text)
            .map(|m| m.as_str().to_string())
            .collect(),
    };

    let mut seen = Vec::with_capacity(raw.len());
    for candidate in raw {
        let candidate = candidate.trim();
        if !candidate.is_empty() && !seen.iter().any(|s: &String| s == candidate) {
            seen.push(candidate.to_string());
        }
    }
    seen
}

/// `None` when the text holds no JSON object
fn parse_json_candidates(text: &str) -> Option<Vec<String>> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }
    let value: Value = serde_json::from_str(&text[start..=end]).ok()?;

    let mut out = Vec::new();
    match value.get("candidates") {
        Some(candidates) => collect_strings(candidates, &mut out),
        None => collect_strings(&value, &mut out),
    }
    Some(out)
}

fn collect_strings(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::String(s) => out.push(s.clone()),
        // 模型有时把纯数字序列号输出成数字
        Value::Number(n) => out.push(n.to_string()),
        Value::Array(items) => items.iter().for_each(|v| collect_strings(v, out)),
        Value::Object(map) => map.values().for_each(|v| collect_strings(v, out)),
        Value::Null | Value::Bool(_) => {}
    }
}
