//! Five-stage layered structured-output parser, extending `executor::parser`'s
//! fallback-chain idiom (strict JSON, then a fenced code block) with a
//! balanced-brace extraction and a key-scan stage before the final raw-text fallback.

use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

#[derive(Debug, Clone)]
pub struct ParsedOutput {
    pub value: Value,
    pub structured_ok: bool,
}

fn fenced_block_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"```(?:json|JSON)?\s*\n([\s\S]*?)```").unwrap())
}

/// Known specialist-output field names the key-scan stage looks for when JSON
/// extraction fails outright.
const KEY_SCAN_FIELDS: [&str; 5] = ["status", "summary", "confidence", "root_cause", "impact"];

fn key_scan_string_regex(field: &str) -> Regex {
    // Matches field: "value" with or without quotes around the field name itself —
    // LLM output that has fallen out of strict JSON often drops them — allowing
    // escaped quotes inside the value.
    Regex::new(&format!(r#"\b{field}\b\s*:\s*"((?:[^"\\]|\\.)*)""#)).unwrap()
}

/// Undo JSON string escapes in one left-to-right pass so an escaped backslash
/// immediately followed by a literal `n`/`"` isn't mis-paired by a prior
/// whole-string replacement.
fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('"') => out.push('"'),
            Some('n') => out.push('\n'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// Extract the first balanced `{...}` span, correctly skipping braces inside string
/// literals so a quoted `}` in a log excerpt doesn't close the object early.
fn first_balanced_braces(text: &str) -> Option<&str> {
    let bytes = text.as_bytes();
    let start = text.find('{')?;
    let mut depth = 0i32;
    let mut in_string = false;
    let mut escaped = false;
    for (i, &b) in bytes.iter().enumerate().skip(start) {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..=i]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Parse a specialist's raw LLM response into a structured JSON value, trying
/// progressively looser extraction strategies before giving up.
pub fn parse_structured_output(text: &str) -> ParsedOutput {
    let trimmed = text.trim();

    // (a) strict JSON.
    if let Ok(value @ Value::Object(_)) = serde_json::from_str::<Value>(trimmed) {
        return ParsedOutput { value, structured_ok: true };
    }

    // (b) fenced code block.
    if let Some(captures) = fenced_block_regex().captures(trimmed) {
        if let Ok(value @ Value::Object(_)) = serde_json::from_str::<Value>(captures[1].trim()) {
            return ParsedOutput { value, structured_ok: true };
        }
    }

    // (c) first balanced braces.
    if let Some(candidate) = first_balanced_braces(trimmed) {
        if let Ok(value @ Value::Object(_)) = serde_json::from_str::<Value>(candidate) {
            return ParsedOutput { value, structured_ok: true };
        }
    }

    // (d) key-scan by name with escape handling.
    let mut scanned = serde_json::Map::new();
    for field in KEY_SCAN_FIELDS {
        if let Some(captures) = key_scan_string_regex(field).captures(trimmed) {
            scanned.insert(field.to_string(), Value::String(unescape(&captures[1])));
        }
    }
    if !scanned.is_empty() {
        return ParsedOutput {
            value: Value::Object(scanned),
            structured_ok: false,
        };
    }

    // (e) exhausted: minimal raw-text fallback.
    ParsedOutput {
        value: serde_json::json!({ "chat_message": trimmed }),
        structured_ok: false,
    }
}
