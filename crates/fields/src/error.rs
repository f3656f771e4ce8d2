//! Result and Error types for hidra-fields

/// Type alias for Result<T, fields::Error>
pub type Result<T> = core::result::Result<T, Error>;

/// The error type for the `hidra-fields` crate
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("failed input/output stream")]
    IOError(#[from] std::io::Error),

    #[error("failed to write csv records")]
    CsvError(#[from] csv::Error),

    #[error("invalid coordinates or grid: {0}")]
    UtilsError(#[from] hidra_utils::Error),

    #[error("inconsistent length of {quantity} (expected {expected}, found {found})")]
    ShapeMismatch {
        quantity: String,
        expected: usize,
        found: usize,
    },

    #[error("index {index} is out of bounds for {length} point(s)")]
    IndexOutOfBounds { index: usize, length: usize },

    #[error("{0} may not be empty")]
    EmptySample(String),

    #[error("unsupported mode \"{0}\"")]
    UnsupportedMode(String),

    #[error("sample contains {0} point(s) that are not in the target point list")]
    PointListNotContained(usize),

    #[error("{quantity} range ({min}, {max}) is invalid, minimum must be less than maximum")]
    InvalidRange { quantity: String, min: f64, max: f64 },
}
