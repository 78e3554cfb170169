//! Error types for the authorization engine

use crate::resource::ResourceSegment;
use thiserror::Error;

/// Authorization engine errors
#[derive(Debug, Error)]
pub enum AuthzError {
    /// Malformed resource name, or a pattern where a definite name is required
    #[error("Invalid resource name '{name}': {reason}")]
    InvalidResourceName { name: String, reason: String },

    /// Malformed action
    #[error("Invalid action '{action}': {reason}")]
    InvalidAction { action: String, reason: String },

    /// Target segment was never registered in the resource graph
    #[error("Unknown resource: {0}")]
    UnknownResource(ResourceSegment),

    /// The resource graph would contain (or contains) a cycle
    #[error("Cycle detected in resource graph: {0}")]
    CycleDetected(String),

    /// Name is deeper than the configured maximum
    #[error("Resource name '{name}' has depth {depth}, exceeding maximum {max_depth}")]
    DepthExceeded {
        name: String,
        depth: usize,
        max_depth: usize,
    },

    /// Too many ancestry paths for a single segment
    #[error("Resource {segment} resolves to more than {limit} names")]
    PathLimitExceeded {
        segment: ResourceSegment,
        limit: usize,
    },

    /// Failure surfaced while evaluating stored policies
    #[error("Policy evaluation failed ({context}): {source}")]
    Evaluation {
        context: String,
        #[source]
        source: Box<AuthzError>,
    },
}

impl AuthzError {
    pub(crate) fn invalid_name(name: impl Into<String>, reason: impl Into<String>) -> Self {
        AuthzError::InvalidResourceName {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Wrap an error with the evaluation step it came from
    pub(crate) fn during(context: impl Into<String>, source: AuthzError) -> Self {
        AuthzError::Evaluation {
            context: context.into(),
            source: Box::new(source),
        }
    }

    /// Innermost error, unwrapping any evaluation context
    pub fn root_cause(&self) -> &AuthzError {
        match self {
            AuthzError::Evaluation { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

/// Result type for authorization operations
pub type Result<T> = std::result::Result<T, AuthzError>;
