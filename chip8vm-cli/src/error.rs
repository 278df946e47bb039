//! Application errors
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Chip8(#[from] chip8vm::prelude::Chip8Error),
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config: {0}")]
    Config(#[from] serde_yaml::Error),
    #[error("{0}")]
    Fmt(#[from] std::fmt::Error),
    #[error("logger: {0}")]
    Logger(#[from] log::SetLoggerError),
}

pub type AppResult<T> = std::result::Result<T, AppError>;
