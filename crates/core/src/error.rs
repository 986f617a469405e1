use thiserror::Error;

pub type AdminResult<T> = Result<T, AdminError>;

#[derive(Error, Debug)]
pub enum AdminError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Data source error: {0}")]
    DataSource(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AdminError {
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }

    /// Whether the failure came from the remote store rather than the caller.
    pub fn is_data_source(&self) -> bool {
        matches!(self, Self::DataSource(_) | Self::PermissionDenied(_))
    }
}

impl From<config::ConfigError> for AdminError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message() {
        let err = AdminError::not_found("report", "r-1");
        assert_eq!(err.to_string(), "report not found: r-1");
        assert!(!err.is_data_source());
    }

    #[test]
    fn test_data_source_classification() {
        assert!(AdminError::DataSource("offline".into()).is_data_source());
        assert!(AdminError::PermissionDenied("rules".into()).is_data_source());
        assert!(!AdminError::Validation("title".into()).is_data_source());
    }
}
