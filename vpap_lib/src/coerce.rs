//! Total conversions from page text to typed values.
//!
//! None of these fail: malformed or missing text becomes a documented default.

use scraper::ElementRef;
use serde::Serialize;

/// Result of integer coercion. Text that is not a number is kept verbatim
/// (trimmed) rather than replaced by a default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum IntOrText {
    Int(i64),
    Text(String),
}

impl Default for IntOrText {
    fn default() -> Self {
        IntOrText::Int(0)
    }
}

impl IntOrText {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            IntOrText::Int(n) => Some(*n),
            IntOrText::Text(_) => None,
        }
    }
}

/// `"-"`, `"None"`, blank or missing text → `Int(0)`; digits → `Int`;
/// anything else → `Text` of the trimmed input.
pub fn to_int(text: Option<&str>) -> IntOrText {
    let Some(text) = text else {
        return IntOrText::Int(0);
    };
    let trimmed = text.trim();
    if trimmed.is_empty() || trimmed == "-" || trimmed == "None" {
        return IntOrText::Int(0);
    }
    match trimmed.parse::<i64>() {
        Ok(n) => IntOrText::Int(n),
        Err(_) => IntOrText::Text(trimmed.to_string()),
    }
}

/// `"$12,345.67"` → `12345.67`; missing or unparsable → `0.0`.
pub fn to_currency(text: Option<&str>) -> f64 {
    text.map(|t| parse_float(&t.replace(['$', ','], "")))
        .unwrap_or(0.0)
}

/// `"54.3%"` → `54.3`; dashes are dropped; missing or unparsable → `0.0`.
pub fn to_percent(text: Option<&str>) -> f64 {
    text.map(|t| parse_float(&t.replace(['%', ',', '-'], "")))
        .unwrap_or(0.0)
}

fn parse_float(cleaned: &str) -> f64 {
    match cleaned.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => v,
        _ => 0.0,
    }
}

/// Concatenated text of an element, or `None` when the element is absent.
pub fn text_of(element: Option<ElementRef<'_>>) -> Option<String> {
    element.map(|el| el.text().collect::<String>())
}

/// Trimmed, non-empty lines of a block of text.
pub fn lines_of(text: &str) -> Vec<&str> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect()
}

/// Joins the non-empty lines of `text` with single spaces.
pub fn squash_lines(text: &str) -> String {
    lines_of(text).join(" ")
}

/// Turns a field label such as `"Party / Caucus:"` into `party_caucus`.
/// The last character (the colon) is always dropped.
pub fn snake_label(label: &str) -> String {
    let mut chars = label.chars();
    chars.next_back();
    chars
        .as_str()
        .trim()
        .to_lowercase()
        .replace(' ', "_")
        .replace('/', "")
        .replace("__", "_")
}
