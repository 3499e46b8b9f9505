//! Stored Record: the flat `key=value` text representation of one entity.
//!
//! One file per entity instance, UTF-8, newline-separated property lines.
//! There is no schema version header; unknown keys are ignored on load and
//! missing keys leave the entity's defaults in place.

use std::collections::HashMap;

/// An order-irrelevant mapping from attribute name to stored token.
#[derive(Debug, Default, Clone)]
pub struct StoredRecord {
    entries: HashMap<String, String>,
}

impl StoredRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse properties text. Blank lines and `#`/`!` comment lines are
    /// skipped; lines without a `=` separator are ignored.
    pub fn parse(text: &str) -> Self {
        let mut entries = HashMap::new();
        for line in text.lines() {
            let trimmed = line.trim_start();
            if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('!') {
                continue;
            }
            if let Some((key, value)) = trimmed.split_once('=') {
                let key = key.trim();
                if key.is_empty() {
                    continue;
                }
                entries.insert(key.to_string(), unescape_value(value));
            }
        }
        Self { entries }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn insert(&mut self, key: &str, value: String) {
        self.entries.insert(key.to_string(), value);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Render the record as properties text. Keys are written in sorted order
    /// so unchanged entities produce identical files across saves.
    pub fn to_text(&self) -> String {
        let mut keys: Vec<&String> = self.entries.keys().collect();
        keys.sort();
        let mut out = String::new();
        for key in keys {
            out.push_str(key);
            out.push('=');
            out.push_str(&escape_value(&self.entries[key]));
            out.push('\n');
        }
        out
    }
}

fn escape_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            c => out.push(c),
        }
    }
    out
}

fn unescape_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_properties() {
        let record = StoredRecord::parse("name=Alice\nbalance=100.0\n");
        assert_eq!(record.get("name"), Some("Alice"));
        assert_eq!(record.get("balance"), Some("100.0"));
        assert_eq!(record.get("missing"), None);
    }

    #[test]
    fn skips_comments_and_blank_lines() {
        let record = StoredRecord::parse("# header\n\n! note\nname=Bob\nno separator line\n");
        assert_eq!(record.len(), 1);
        assert_eq!(record.get("name"), Some("Bob"));
    }

    #[test]
    fn values_with_newlines_round_trip() {
        let mut record = StoredRecord::new();
        record.insert("board", "line one\nline two\\end".to_string());
        let text = record.to_text();
        assert_eq!(text.lines().count(), 1);
        let parsed = StoredRecord::parse(&text);
        assert_eq!(parsed.get("board"), Some("line one\nline two\\end"));
    }

    #[test]
    fn output_is_sorted_and_stable() {
        let mut record = StoredRecord::new();
        record.insert("zeta", "1".to_string());
        record.insert("alpha", "2".to_string());
        assert_eq!(record.to_text(), "alpha=2\nzeta=1\n");
    }
}
