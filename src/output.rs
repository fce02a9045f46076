//! Parsing of VBoxManage's line-oriented `Key: Value` output.

use std::collections::BTreeMap;

/// Fields scraped from a command's stdout.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedOutput {
    pub fields: BTreeMap<String, String>,
    /// Non-empty lines that did not look like `Key: Value`.
    pub skipped: usize,
}

impl ParsedOutput {
    /// Value for `key`, treating an empty value as absent.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    /// Value for `key`, or `""` when absent.
    pub fn get_or_empty(&self, key: &str) -> &str {
        self.fields.get(key).map(String::as_str).unwrap_or("")
    }
}

/// Split a single line into `(key, value)`.
///
/// The key is everything before the first colon; the value is the rest,
/// trimmed. Lines without a colon or with a blank key don't match.
pub fn parse_line(line: &str) -> Option<(&str, &str)> {
    let (key, value) = line.split_once(':')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    Some((key, value.trim()))
}

/// Parse a whole stdout buffer. Repeated keys keep the last value.
pub fn parse_output(out: &str) -> ParsedOutput {
    let mut parsed = ParsedOutput::default();
    for line in out.lines() {
        match parse_line(line) {
            Some((key, value)) => {
                parsed.fields.insert(key.to_string(), value.to_string());
            }
            None if !line.trim().is_empty() => parsed.skipped += 1,
            None => {}
        }
    }
    parsed
}
