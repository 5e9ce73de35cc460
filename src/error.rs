use thiserror::Error;

/// Boxed error returned by caller-supplied batch handlers
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that can occur while talking to the netdisk API
#[derive(Error, Debug)]
pub enum PanError {
    #[error("Access token is missing")]
    MissingAccessToken,

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Bad request, status code: {status}")]
    Status { status: u16 },

    #[error(
        "errno: {errno}, request_id: {}, msg: {message}",
        .request_id.as_deref().unwrap_or("-")
    )]
    Provider {
        errno: i64,
        request_id: Option<String>,
        message: String,
    },

    #[error("Failed to decode response: {message}")]
    Decode { message: String },

    #[error("Unexpected shape for field `{field}`: found {found}")]
    UnexpectedShape { field: String, found: String },

    #[error("Request attempt panicked: {message}")]
    AttemptPanicked { message: String },

    #[error("OAuth error {error}: {description}")]
    OAuth { error: String, description: String },

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("Logging setup failed: {message}")]
    Logging { message: String },

    #[error("Batch handler failed: {0}")]
    Callback(BoxError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl PanError {
    /// Whether another transport attempt may succeed where this one failed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            PanError::Network(_)
                | PanError::Status { .. }
                | PanError::Provider { .. }
                | PanError::Decode { .. }
                | PanError::UnexpectedShape { .. }
                | PanError::AttemptPanicked { .. }
                | PanError::Serialization(_)
        )
    }

    /// Provider errno carried by this error, if any
    pub fn errno(&self) -> Option<i64> {
        match self {
            PanError::Provider { errno, .. } => Some(*errno),
            _ => None,
        }
    }
}

/// Result type alias for netdisk operations
pub type Result<T> = std::result::Result<T, PanError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_error_display() {
        let err = PanError::Provider {
            errno: -9,
            request_id: Some("8905413093476573185".to_string()),
            message: "file or directory does not exist".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "errno: -9, request_id: 8905413093476573185, msg: file or directory does not exist"
        );

        let err = PanError::Provider {
            errno: 2,
            request_id: None,
            message: String::new(),
        };
        assert_eq!(err.to_string(), "errno: 2, request_id: -, msg: ");
    }

    #[test]
    fn test_retry_classification() {
        assert!(!PanError::MissingAccessToken.is_retryable());
        assert!(PanError::Status { status: 502 }.is_retryable());
        assert!(PanError::Decode { message: "eof".into() }.is_retryable());
        assert!(!PanError::Callback("stop".into()).is_retryable());
        assert!(!PanError::InvalidConfig { message: "x".into() }.is_retryable());
    }
}
