use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] pinkeep_core::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("At most {max} tags can be combined in a filter (got {given})")]
    TooManyTags { max: usize, given: usize },
    #[error("No shared text provided")]
    EmptySharedText,
    #[error("Configuration error: {0}")]
    Config(String),
    #[error(
        "No API token configured. Run `pinkeep config init --token user:TOKEN`, or set PINKEEP_API_TOKEN."
    )]
    MissingToken,
}
