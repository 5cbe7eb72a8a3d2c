use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BufferError {
    #[error("Buffer capacity must be at least 1")]
    ZeroCapacity,
}

pub type BufferResult<T> = Result<T, BufferError>;
