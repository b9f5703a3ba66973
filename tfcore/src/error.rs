//! Error types for tfcore

/// Error type for framework and adapter operations
#[derive(Debug, thiserror::Error)]
pub enum TfError {
    #[error("attribute '{0}' is required")]
    MissingAttribute(String),

    #[error("attribute '{attribute}': expected {expected}, got {actual}")]
    TypeMismatch {
        attribute: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("resource type not found: {0}")]
    ResourceNotFound(String),

    #[error("data source type not found: {0}")]
    DataSourceNotFound(String),

    #[error("provider not configured")]
    ProviderNotConfigured,

    #[error("encoding error: {0}")]
    Encoding(String),

    #[error("decoding error: {0}")]
    Decoding(String),

    /// A remote API failure wrapped with resource-identifying context.
    /// The underlying error is preserved unmodified in semantics.
    #[error("{context}: {source}")]
    Remote {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("{0}")]
    Message(String),
}

impl TfError {
    /// Wrap a remote service error with adapter context.
    pub fn remote(
        context: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        TfError::Remote {
            context: context.into(),
            source: Box::new(source),
        }
    }
}

/// Result type alias for tfcore operations
pub type Result<T> = std::result::Result<T, TfError>;

impl From<String> for TfError {
    fn from(s: String) -> Self {
        TfError::Message(s)
    }
}

impl From<&str> for TfError {
    fn from(s: &str) -> Self {
        TfError::Message(s.to_string())
    }
}
