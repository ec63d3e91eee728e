use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    ValidationError(#[from] garde::Report),
    #[error("{0}")]
    UnprocessableEntity(String),
    #[error("{0}")]
    EntityNotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    AlreadyDecided(String),
    #[error("{0}")]
    WrongPaymentMethod(String),
    #[error("{0}")]
    Unavailable(String),
}

impl AppError {
    // ストレージ層の一時的なエラーのみリトライ対象とする。
    // それ以外は呼び出し側にとって終端的なエラーである
    pub fn is_transient(&self) -> bool {
        matches!(self, AppError::Unavailable(_))
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_unavailable_is_transient() {
        assert!(AppError::Unavailable("lock timed out".into()).is_transient());
        assert!(!AppError::Conflict("overlap".into()).is_transient());
        assert!(!AppError::AlreadyDecided("decided".into()).is_transient());
    }
}
