use std::collections::HashSet;

use crate::error::ResearchError;

pub const MAX_NAME_LENGTH: usize = 100;

/// Strip ASCII control characters (0x00-0x1F except space 0x20), trim whitespace,
/// and enforce a byte-length limit.
pub fn sanitize_text(input: &str, max_len: usize) -> Result<String, ResearchError> {
    if input.len() > max_len {
        return Err(ResearchError::InvalidInput(format!(
            "input exceeds maximum length of {} bytes",
            max_len
        )));
    }
    let sanitized: String = input
        .chars()
        .filter(|c| !c.is_ascii_control() || *c == ' ')
        .collect::<String>()
        .trim()
        .to_string();
    if sanitized.is_empty() {
        return Err(ResearchError::InvalidInput(
            "input is empty after sanitization".to_string(),
        ));
    }
    Ok(sanitized)
}

/// Validate a candidate name: enforce length, strip control chars, trim.
pub fn validate_candidate_name(input: &str) -> Result<String, ResearchError> {
    sanitize_text(input, MAX_NAME_LENGTH)
}

/// Parse a candidate list, one name per line.
///
/// Blank lines and lines starting with `#` are skipped. Duplicates are
/// dropped, keeping the first occurrence, so the batch runs in file order.
pub fn parse_candidate_list(contents: &str) -> Result<Vec<String>, ResearchError> {
    let mut seen = HashSet::new();
    let mut names = Vec::new();
    for (i, line) in contents.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let name = validate_candidate_name(trimmed).map_err(|e| {
            ResearchError::InvalidInput(format!("line {}: {}", i + 1, e))
        })?;
        if seen.insert(name.clone()) {
            names.push(name);
        }
    }
    if names.is_empty() {
        return Err(ResearchError::InvalidInput(
            "candidate list contains no names".to_string(),
        ));
    }
    Ok(names)
}
