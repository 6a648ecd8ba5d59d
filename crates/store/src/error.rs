use kana_core::account::user_message;
use kana_core::error::CoreError;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    #[error("{entity} already exists: {key}")]
    AlreadyExists { entity: &'static str, key: String },

    #[error("Invalid storage path '{0}'")]
    InvalidPath(String),

    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failure reported by the account collaborator, keyed by its code.
    #[error("{}", user_message(.code, .message))]
    Auth { code: String, message: String },
}

impl StoreError {
    pub fn not_found(entity: &'static str, key: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            key: key.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<StoreError> for CoreError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity, key } => CoreError::NotFound { entity, id: key },
            StoreError::AlreadyExists { .. } => CoreError::Conflict(err.to_string()),
            StoreError::InvalidPath(_) => CoreError::Validation(err.to_string()),
            StoreError::Auth { .. } => CoreError::Unauthorized(err.to_string()),
            StoreError::Io(e) => CoreError::Internal(format!("storage: {e}")),
        }
    }
}
