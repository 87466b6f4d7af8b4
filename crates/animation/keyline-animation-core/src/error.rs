//! Boundary errors.
//!
//! Inside a walk, problems are plain messages pushed into a caller-owned sink so one
//! bad step never aborts the rest. Only the wrappers ([`crate::Animation`],
//! [`crate::build_trigger`]) turn the collected messages into an [`AnimationError`].

use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AnimationError {
    /// The animation tree failed validation.
    #[error("animation validation failed:\n{}", .0.join("\n"))]
    Validation(Vec<String>),

    /// A trigger definition (states, transitions, or their animations) is invalid.
    #[error("animation parsing for the {trigger} trigger has failed:\n{}", .errors.join("\n"))]
    TriggerParse { trigger: String, errors: Vec<String> },

    /// The trigger builder was handed something other than a trigger node.
    #[error("expected a trigger node, got {kind}")]
    UnexpectedNode { kind: String },

    /// An animation document could not be parsed.
    #[error("animation json parse error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AnimationError {
    /// The individual messages carried by this error.
    pub fn messages(&self) -> Vec<String> {
        match self {
            Self::Validation(errors) => errors.clone(),
            Self::TriggerParse { errors, .. } => errors.clone(),
            other => vec![other.to_string()],
        }
    }

    /// Get error category for logging.
    #[inline]
    pub fn category(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::TriggerParse { .. } | Self::UnexpectedNode { .. } => "trigger",
            Self::Json(_) => "serialization",
        }
    }
}
