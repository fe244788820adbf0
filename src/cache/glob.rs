//! Key Pattern Module
//!
//! Redis `KEYS`-style glob patterns compiled to anchored regular expressions.
//!
//! Supported syntax:
//! - `*` matches any run of characters (including none)
//! - `?` matches exactly one character
//! - `[abc]`, `[a-z]`, `[^a]` / `[!a]` character classes
//! - `\x` matches `x` literally

use regex::Regex;

use crate::error::{CacheError, Result};

// == Key Pattern ==
/// A compiled glob that matches whole cache keys.
#[derive(Debug, Clone)]
pub struct KeyPattern {
    source: String,
    regex: Regex,
}

impl KeyPattern {
    /// Compiles a glob. Fails with a validation error for unusable patterns.
    pub fn new(glob: &str) -> Result<Self> {
        let translated = translate(glob);
        let regex = Regex::new(&translated)
            .map_err(|e| CacheError::Validation(format!("Invalid pattern '{}': {}", glob, e)))?;
        Ok(Self {
            source: glob.to_string(),
            regex,
        })
    }

    pub fn matches(&self, key: &str) -> bool {
        self.regex.is_match(key)
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }
}

fn translate(glob: &str) -> String {
    let chars: Vec<char> = glob.chars().collect();
    let mut out = String::with_capacity(glob.len() * 2 + 8);
    out.push_str("^(?s:");

    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '*' => out.push_str(".*"),
            '?' => out.push('.'),
            '\\' if i + 1 < chars.len() => {
                i += 1;
                push_literal(&mut out, chars[i]);
            }
            '[' => match class_end(&chars, i) {
                Some(end) => {
                    push_class(&mut out, &chars[i + 1..end]);
                    i = end;
                }
                None => push_literal(&mut out, '['),
            },
            c => push_literal(&mut out, c),
        }
        i += 1;
    }

    out.push_str(")$");
    out
}

/// Index of the `]` closing the class opened at `start`, honouring escapes.
fn class_end(chars: &[char], start: usize) -> Option<usize> {
    let mut j = start + 1;
    while j < chars.len() {
        match chars[j] {
            '\\' => j += 2,
            ']' if j > start + 1 => return Some(j),
            _ => j += 1,
        }
    }
    None
}

fn push_class(out: &mut String, body: &[char]) {
    out.push('[');
    let mut k = 0;
    if matches!(body.first(), Some('^') | Some('!')) {
        out.push('^');
        k = 1;
    }
    while k < body.len() {
        let c = match body[k] {
            '\\' if k + 1 < body.len() => {
                k += 1;
                body[k]
            }
            c => c,
        };
        if matches!(c, '[' | ']' | '\\' | '^' | '&' | '~') {
            out.push('\\');
        }
        out.push(c);
        k += 1;
    }
    out.push(']');
}

fn push_literal(out: &mut String, c: char) {
    let mut buf = [0u8; 4];
    out.push_str(&regex::escape(c.encode_utf8(&mut buf)));
}
