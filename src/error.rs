use thiserror::Error;

#[derive(Error, Debug)]
pub enum EternalError {
    #[error("Entity '{0}' not found in registry")]
    NotFound(String),

    #[error("Lock error: {0}")]
    LockError(String),
}

pub type Result<T> = std::result::Result<T, EternalError>;

impl<T> From<std::sync::PoisonError<T>> for EternalError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        Self::LockError(err.to_string())
    }
}
