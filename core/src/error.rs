use thiserror::Error;

/// Construction-time failures. Runtime actions (`open`, `flag`) never error;
/// invalid ones are silent no-ops so UI layers need no failure handling for
/// user-driven races.
#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Board dimensions must be positive")]
    EmptyBoard,
    #[error("Mine count must be positive")]
    ZeroMines,
    #[error("Too many mines")]
    TooManyMines,
    #[error("Invalid coordinates")]
    InvalidCoords,
}

pub type Result<T> = std::result::Result<T, ConfigError>;
