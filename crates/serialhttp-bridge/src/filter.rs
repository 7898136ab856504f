use bytes::Bytes;
use regex::bytes::Regex;

use crate::error::{BridgeError, Result};

/// Validates reply frames against a pattern and optionally rewrites them.
#[derive(Debug, Clone)]
pub struct ResponseFilter {
    pattern: Regex,
    replacement: Option<String>,
}

impl ResponseFilter {
    /// Compile a filter. `replacement` may use `$1` / `$name` capture references.
    pub fn new(pattern: &str, replacement: Option<String>) -> Result<Self> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
            replacement,
        })
    }

    /// The pattern source.
    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    /// Check `frame` against the pattern, then apply the replacement to every match.
    pub fn apply(&self, frame: &[u8]) -> Result<Bytes> {
        if !self.pattern.is_match(frame) {
            return Err(BridgeError::ResponseRejected {
                pattern: self.pattern.as_str().to_string(),
            });
        }
        Ok(match &self.replacement {
            Some(replacement) => Bytes::from(
                self.pattern
                    .replace_all(frame, replacement.as_bytes())
                    .into_owned(),
            ),
            None => Bytes::copy_from_slice(frame),
        })
    }
}
