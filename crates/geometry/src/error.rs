//! Result and Error types for hidra-geometry

/// Type alias for Result<T, geometry::Error>
pub type Result<T> = core::result::Result<T, Error>;

/// The error type for the `hidra-geometry` crate
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("failed input/output stream")]
    IOError(#[from] std::io::Error),

    #[error("failed to (de)serialise")]
    FailedSerde(#[from] serde_json::Error),

    #[error("instrument has not been built, call build_instrument() first")]
    NotBuilt,

    #[error("wavelength must be set before calculating d-spacing")]
    MissingWavelength,

    #[error("invalid {quantity} of {value} (must be finite and > 0)")]
    InvalidGeometry { quantity: String, value: f64 },

    #[error("{quantity} of {value} is outside of the allowed range [{min}, {max}]")]
    InvalidRange {
        quantity: String,
        value: f64,
        min: f64,
        max: f64,
    },
}
