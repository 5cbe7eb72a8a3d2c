use rf_components::BufferError;
use rf_core::CoreError;
use rf_graph::GraphError;
use rf_update::UpdateError;
use thiserror::Error;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("At least one producer range is required, and every range must be positive")]
    InvalidRanges,

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Buffer(#[from] BufferError),

    #[error(transparent)]
    Update(#[from] UpdateError),

    #[error("Failed to encode outcome: {0}")]
    Json(#[from] serde_json::Error),
}
