//! Error types for persistence operations.
//!
//! Every error carries a structured [`ErrorContext`] so that stores can log
//! what failed without string parsing.

use std::fmt;

/// Result type for repository operations
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Structured context for repository errors.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ErrorContext {
    /// The operation being performed (e.g., "read", "write")
    pub operation: Option<String>,
    /// The snapshot kind involved (e.g., "routes", "aircraft")
    pub entity: Option<String>,
    /// The storage key if applicable
    pub key: Option<String>,
    /// Additional details about the error
    pub details: Option<String>,
    /// Whether this error is retryable
    pub retryable: bool,
}

impl ErrorContext {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: Some(operation.into()),
            ..Default::default()
        }
    }

    pub fn with_entity(mut self, entity: impl Into<String>) -> Self {
        self.entity = Some(entity.into());
        self
    }

    pub fn with_key(mut self, key: impl ToString) -> Self {
        self.key = Some(key.to_string());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn retryable(mut self) -> Self {
        self.retryable = true;
        self
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(ref op) = self.operation {
            parts.push(format!("operation={}", op));
        }
        if let Some(ref entity) = self.entity {
            parts.push(format!("entity={}", entity));
        }
        if let Some(ref key) = self.key {
            parts.push(format!("key={}", key));
        }
        if let Some(ref details) = self.details {
            parts.push(format!("details={}", details));
        }
        if self.retryable {
            parts.push("retryable=true".to_string());
        }
        write!(f, "[{}]", parts.join(", "))
    }
}

/// Error type for repository operations
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RepositoryError {
    /// Backing store unreachable; usually transient.
    #[error("Connection error: {message} {context}")]
    ConnectionError {
        message: String,
        context: ErrorContext,
    },

    /// Filesystem failure.
    #[error("I/O error: {message} {context}")]
    IoError {
        message: String,
        context: ErrorContext,
    },

    /// Stored data could not be decoded or failed its checksum.
    #[error("Corrupt data: {message} {context}")]
    CorruptData {
        message: String,
        context: ErrorContext,
    },

    /// A snapshot could not be serialized.
    #[error("Serialization error: {message} {context}")]
    SerializationError {
        message: String,
        context: ErrorContext,
    },

    /// `[persistence]` settings cannot produce a repository.
    #[error("Configuration error: {message}")]
    ConfigurationError { message: String },
}

impl RepositoryError {
    pub fn connection(message: impl Into<String>, context: ErrorContext) -> Self {
        Self::ConnectionError {
            message: message.into(),
            context: context.retryable(),
        }
    }

    pub fn io(message: impl Into<String>, context: ErrorContext) -> Self {
        Self::IoError {
            message: message.into(),
            context,
        }
    }

    pub fn corrupt(message: impl Into<String>, context: ErrorContext) -> Self {
        Self::CorruptData {
            message: message.into(),
            context,
        }
    }

    pub fn serialization(message: impl Into<String>, context: ErrorContext) -> Self {
        Self::SerializationError {
            message: message.into(),
            context,
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::ConfigurationError {
            message: message.into(),
        }
    }

    /// Only connection failures are worth retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ConnectionError { context, .. } if context.retryable)
    }

    pub fn is_corrupt(&self) -> bool {
        matches!(self, Self::CorruptData { .. })
    }

    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            Self::ConnectionError { context, .. }
            | Self::IoError { context, .. }
            | Self::CorruptData { context, .. }
            | Self::SerializationError { context, .. } => Some(context),
            Self::ConfigurationError { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_display() {
        let ctx = ErrorContext::new("write")
            .with_entity("routes")
            .with_key("flight-plan-routes")
            .retryable();
        assert_eq!(
            ctx.to_string(),
            "[operation=write, entity=routes, key=flight-plan-routes, retryable=true]"
        );
    }

    #[test]
    fn test_only_connection_errors_retry() {
        let err = RepositoryError::connection("down", ErrorContext::new("read"));
        assert!(err.is_retryable());
        assert!(err.to_string().contains("operation=read"));
        assert!(!RepositoryError::io("disk full", ErrorContext::new("write")).is_retryable());
        assert!(RepositoryError::configuration("no directory").context().is_none());
    }
}
