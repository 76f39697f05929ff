//! Error types for the object cache
//!
//! Provides unified error handling using thiserror.

use std::fmt;

use thiserror::Error;

// == Hook Kind ==
/// Identifies which lifecycle hook produced an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookKind {
    Setup,
    Update,
    Evict,
}

impl fmt::Display for HookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HookKind::Setup => "setup",
            HookKind::Update => "update",
            HookKind::Evict => "evict",
        };
        f.write_str(name)
    }
}

// == Cache Error Enum ==
/// Unified error type for the object cache.
///
/// Missing keys are not errors: lookups return `Option` and removals
/// return `bool`.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Rejected before any state was touched
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A caller-supplied lifecycle hook failed
    #[error("{hook} hook failed for '{key}': {source}")]
    Hook {
        hook: HookKind,
        key: String,
        #[source]
        source: anyhow::Error,
    },

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CacheError {
    /// Returns the failing hook if this error came from a lifecycle callback.
    pub fn hook_kind(&self) -> Option<HookKind> {
        match self {
            CacheError::Hook { hook, .. } => Some(*hook),
            _ => None,
        }
    }
}

// == Result Type Alias ==
/// Convenience Result type for the object cache.
pub type Result<T> = std::result::Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hook_error_names_the_hook() {
        let err = CacheError::Hook {
            hook: HookKind::Evict,
            key: "device-7".to_string(),
            source: anyhow::anyhow!("listener offline"),
        };

        assert_eq!(err.hook_kind(), Some(HookKind::Evict));
        assert_eq!(
            err.to_string(),
            "evict hook failed for 'device-7': listener offline"
        );
    }

    #[test]
    fn test_invalid_argument_is_not_a_hook_error() {
        let err = CacheError::InvalidArgument("ttl must be positive".to_string());
        assert!(err.hook_kind().is_none());
        assert_eq!(err.to_string(), "Invalid argument: ttl must be positive");
    }
}
