// src/roulette/error.rs

use super::core::ResourceKind;

#[derive(thiserror::Error, Debug)]
pub enum RouletteError {
    #[error("I/O while reading config: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON parse error: {0}")]
    Ron(String),
    #[error("RON serialize error: {0}")]
    RonWrite(String),
    #[error("Duplicate resource kind '{0}' in config")]
    DuplicateKind(ResourceKind),
    #[error("Grouping radius must be finite and >= 0 (got {0})")]
    InvalidRadius(f32),
    #[error("Max group size must be at least 1")]
    InvalidGroupSize,
    #[error("Full randomization is enabled but no resource kind is enabled")]
    NoEligibleKinds,
    #[error("Session has no scanned deposits yet")]
    NotScanned,
    #[error("Purity grade {0} is out of range")]
    InvalidPurity(u8),
}
