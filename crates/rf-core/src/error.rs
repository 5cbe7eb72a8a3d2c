use thiserror::Error;

pub type CoreResult<T> = Result<T, CoreError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("Invalid value for environment variable {var}: {value:?}")]
    InvalidEnv { var: &'static str, value: String },

    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },
}
