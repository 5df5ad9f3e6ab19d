//! Errors raised by the framework itself, outside of any test

use thiserror::Error;
use verity_config::ConfigError;

#[derive(Error, Debug)]
pub enum VerityError {
    #[error("Unknown report '{name}' (available: {available})")]
    UnknownReport { name: String, available: String },

    #[error("Failed to install interrupt handler: {0}")]
    InterruptHandler(#[from] ctrlc::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub type VerityResult<T> = Result<T, VerityError>;
