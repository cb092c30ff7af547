use thiserror::Error;

pub type Result<T> = std::result::Result<T, CoreError>;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("coordinates not valid: z={z}, t={t} (both must be non-negative)")]
    InvalidCoordinate { z: i64, t: i64 },

    #[error("coordinate {axis}={value} is outside the representable range 0..={max}")]
    CoordinateOutOfRange {
        axis: &'static str,
        value: i64,
        max: u32,
    },

    #[error("invalid metadata: {0}")]
    InvalidMetadata(String),
}
