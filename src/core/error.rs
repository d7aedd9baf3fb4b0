use thiserror::Error;

#[derive(Error, Debug)]
pub enum ControlError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Illegal cluster state: {0}")]
    IllegalState(String),

    #[error("Activation failed: {0}")]
    Activation(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Lock error: {0}")]
    LockError(String),

    #[error("I/O error: {0}")]
    IoError(String),
}

pub type Result<T> = std::result::Result<T, ControlError>;

impl ControlError {
    /// Short name of the error class, used in command output.
    pub fn kind(&self) -> &'static str {
        match self {
            ControlError::NotFound(_) => "NotFound",
            ControlError::Validation(_) => "ValidationError",
            ControlError::IllegalState(_) => "IllegalStateError",
            ControlError::Activation(_) => "ActivationError",
            ControlError::Internal(_) | ControlError::LockError(_) | ControlError::IoError(_) => {
                "InternalError"
            }
        }
    }

    /// Error text without the class prefix.
    pub fn detail(&self) -> &str {
        match self {
            ControlError::NotFound(msg)
            | ControlError::Validation(msg)
            | ControlError::IllegalState(msg)
            | ControlError::Activation(msg)
            | ControlError::Internal(msg)
            | ControlError::LockError(msg)
            | ControlError::IoError(msg) => msg,
        }
    }
}

impl<T> From<std::sync::PoisonError<T>> for ControlError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        Self::LockError(err.to_string())
    }
}

impl From<std::io::Error> for ControlError {
    fn from(err: std::io::Error) -> Self {
        Self::IoError(err.to_string())
    }
}

impl From<serde_json::Error> for ControlError {
    fn from(err: serde_json::Error) -> Self {
        Self::Internal(format!("metastore serialization: {}", err))
    }
}
