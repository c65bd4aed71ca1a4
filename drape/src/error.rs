//! Error taxonomy for a bake.
//!
//! Per-mesh and per-morph-target variants are caught by the orchestrator and
//! turned into skips; `MalformedField` and `Resource` abort the bake.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BakeError {
    #[error("missing input: {0}")]
    MissingInput(String),

    #[error("malformed field '{field}': {reason}")]
    MalformedField { field: String, reason: String },

    #[error("morph target '{target}' has {got} deltas, mesh has {expected} vertices")]
    ShapeMismatch { target: String, expected: usize, got: usize },

    #[error("cannot allocate working buffer of {requested} bytes: {reason}")]
    Resource { requested: usize, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl BakeError {
    pub(crate) fn malformed(field: &str, reason: impl Into<String>) -> Self {
        BakeError::MalformedField { field: field.to_string(), reason: reason.into() }
    }

    /// True for errors that must abort the whole batch rather than skip one item.
    pub fn is_fatal(&self) -> bool {
        matches!(self, BakeError::MalformedField { .. } | BakeError::Resource { .. })
    }
}

pub type Result<T> = std::result::Result<T, BakeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = BakeError::ShapeMismatch { target: "Smile".into(), expected: 10, got: 8 };
        let text = format!("{}", err);
        assert!(text.contains("Smile"));
        assert!(text.contains("10"));
        assert!(text.contains("8"));

        let err = BakeError::malformed("primary", "3 weights for 4 centers");
        assert_eq!(format!("{}", err), "malformed field 'primary': 3 weights for 4 centers");
    }

    #[test]
    fn test_fatality() {
        assert!(BakeError::malformed("primary", "x").is_fatal());
        assert!(BakeError::Resource { requested: 1, reason: "budget".into() }.is_fatal());
        assert!(!BakeError::MissingInput("Body".into()).is_fatal());
        assert!(!BakeError::ShapeMismatch { target: "a".into(), expected: 1, got: 2 }.is_fatal());
    }
}
