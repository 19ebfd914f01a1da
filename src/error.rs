use thiserror::Error;

pub type LarchResult<T, E = LarchError> = Result<T, E>;

#[derive(Debug, Error)]
pub enum LarchError {
    #[error("Not support: {0}")]
    NotSupport(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Index error: {0}")]
    Index(String),
}
