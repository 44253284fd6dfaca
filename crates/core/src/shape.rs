//! Boundary validation for generative inference output.
//!
//! Inference text is untrusted. Every response is decoded into a typed shape
//! and then checked against that shape's rules; the caller branches on the
//! returned `Result` and runs its deterministic fallback on `Err`.

use serde::de::DeserializeOwned;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ShapeError {
    #[error("inference returned an empty response")]
    Empty,

    #[error("inference response is not valid JSON for the expected shape: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("inference response violates the expected shape: {0}")]
    Violation(String),
}

impl ShapeError {
    pub fn violation(message: impl Into<String>) -> Self {
        Self::Violation(message.into())
    }

    /// Short machine-readable reason, used as a log field.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Decode(_) => "decode",
            Self::Violation(_) => "violation",
        }
    }
}

/// A decoded inference payload that knows how to check itself.
pub trait ValidatedShape: DeserializeOwned + Sized {
    fn validate(self) -> Result<Self, ShapeError>;
}

pub fn strip_code_fences(raw: &str) -> &str {
    let mut text = raw.trim();
    if let Some(rest) = text.strip_prefix("```") {
        // drop the info string ("json", "JSON", ...) on the opening fence
        text = match rest.find('\n') {
            Some(newline) if rest[..newline].chars().all(|ch| ch.is_ascii_alphanumeric()) => {
                &rest[newline + 1..]
            }
            _ => rest.trim_start_matches(|ch: char| ch.is_ascii_alphabetic()),
        };
    }
    if let Some(rest) = text.trim_end().strip_suffix("```") {
        text = rest;
    }
    text.trim()
}

pub fn parse_shape<T: ValidatedShape>(raw: &str) -> Result<T, ShapeError> {
    let text = strip_code_fences(raw);
    if text.is_empty() {
        return Err(ShapeError::Empty);
    }
    let decoded: T = serde_json::from_str(text)?;
    decoded.validate()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Sample {
        value: i64,
    }

    impl ValidatedShape for Sample {
        fn validate(self) -> Result<Self, ShapeError> {
            if self.value < 0 {
                return Err(ShapeError::violation("negative value"));
            }
            Ok(self)
        }
    }

    #[test]
    fn strips_json_fence() {
        assert_eq!(strip_code_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("```\n[1]\n```"), "[1]");
        assert_eq!(strip_code_fences("  {\"a\":1}  "), "{\"a\":1}");
        assert_eq!(strip_code_fences("```json{\"a\":1}```"), "{\"a\":1}");
    }

    #[test]
    fn tags_each_rejection() {
        assert!(matches!(parse_shape::<Sample>("   "), Err(ShapeError::Empty)));
        assert!(matches!(
            parse_shape::<Sample>("not json"),
            Err(ShapeError::Decode(_))
        ));
        assert!(matches!(
            parse_shape::<Sample>("{\"value\": -1}"),
            Err(ShapeError::Violation(_))
        ));
        assert_eq!(parse_shape::<Sample>("```json\n{\"value\": 3}\n```").unwrap().value, 3);
    }
}
