//! Result and Error types for hidra-reduce

/// Type alias for Result<T, reduce::Error>
pub type Result<T> = core::result::Result<T, Error>;

/// The error type for the `hidra-reduce` crate
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("instrument geometry error")]
    GeometryError(#[from] hidra_geometry::Error),

    #[error("invalid range or bins: {0}")]
    UtilsError(#[from] hidra_utils::Error),

    #[error("inconsistent length of {quantity} (expected {expected}, found {found})")]
    ShapeMismatch {
        quantity: String,
        expected: usize,
        found: usize,
    },

    #[error("{quantity} range ({min}, {max}) is invalid, minimum must be less than maximum")]
    InvalidRange { quantity: String, min: f64, max: f64 },

    #[error("{quantity} of {value} is outside of the allowed range [{min}, {max}]")]
    OutOfRange {
        quantity: String,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("experimental data has not been set, call set_experimental_data() first")]
    NoExperimentalData,

    #[error("data key \"{0}\" does not exist")]
    DataKeyNotFound(String),

    #[error("data file \"{0}\" has already been loaded and may not be replaced")]
    DataAlreadyLoaded(String),

    #[error("scan index {index} not found in range [{min}, {max}]")]
    ScanIndexNotFound { index: u32, min: u32, max: u32 },

    #[error("sample log \"{0}\" cannot be found")]
    SampleLogNotFound(String),

    #[error("{0} may not be empty")]
    EmptyInput(String),
}
