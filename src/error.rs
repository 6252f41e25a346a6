//! Error taxonomy for the RETE engine.
//!
//! Mirrors the category/severity/context pattern used across this codebase's
//! other error modules, narrowed to the handful of variants the engine
//! actually needs.

use thiserror::Error;

use crate::wme::WmeId;

/// Coarse grouping used for metrics and for deciding whether a failure is
/// worth surfacing loudly to an operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    Construction,
    WorkingMemory,
    Action,
    Internal,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ErrorCategory::Construction => "construction",
            ErrorCategory::WorkingMemory => "working_memory",
            ErrorCategory::Action => "action",
            ErrorCategory::Internal => "internal",
        };
        write!(f, "{s}")
    }
}

/// The engine's single error type.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("a production named '{name}' already exists")]
    DuplicateProductionName { name: String },

    #[error("retract of unknown WME {id:?}")]
    UnknownWme { id: WmeId },

    #[error("action callback for production '{production}' failed: {source}")]
    ActionError {
        production: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("malformed condition in production '{production}': {reason}")]
    MalformedCondition { production: String, reason: String },

    #[error("internal invariant violated: {reason}")]
    Internal { reason: String },
}

impl EngineError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            EngineError::DuplicateProductionName { .. } => ErrorCategory::Construction,
            EngineError::MalformedCondition { .. } => ErrorCategory::Construction,
            EngineError::UnknownWme { .. } => ErrorCategory::WorkingMemory,
            EngineError::ActionError { .. } => ErrorCategory::Action,
            EngineError::Internal { .. } => ErrorCategory::Internal,
        }
    }

    /// Whether the engine's internal state is still trustworthy after this
    /// error. Action errors leave partial mutations in place (§5) but the
    /// network topology itself is never corrupted by them.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, EngineError::Internal { .. })
    }
}

impl From<anyhow::Error> for EngineError {
    fn from(source: anyhow::Error) -> Self {
        EngineError::Internal { reason: source.to_string() }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories_match_the_taxonomy() {
        assert_eq!(EngineError::DuplicateProductionName { name: "r".into() }.category(), ErrorCategory::Construction);
        assert_eq!(EngineError::MalformedCondition { production: "r".into(), reason: "x".into() }.category(), ErrorCategory::Construction);
        assert_eq!(EngineError::UnknownWme { id: WmeId(0) }.category(), ErrorCategory::WorkingMemory);
        assert_eq!(
            EngineError::ActionError { production: "r".into(), source: anyhow::anyhow!("boom") }.category(),
            ErrorCategory::Action
        );
        assert_eq!(EngineError::Internal { reason: "x".into() }.category(), ErrorCategory::Internal);
    }

    #[test]
    fn only_internal_errors_are_unrecoverable() {
        assert!(!EngineError::Internal { reason: "x".into() }.is_recoverable());
        assert!(EngineError::UnknownWme { id: WmeId(0) }.is_recoverable());
    }

    #[test]
    fn anyhow_errors_convert_to_internal() {
        let err: EngineError = anyhow::anyhow!("oops").into();
        assert!(matches!(err, EngineError::Internal { .. }));
    }
}
