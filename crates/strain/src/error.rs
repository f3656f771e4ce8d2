//! Result and Error types for hidra-strain

/// Type alias for Result<T, strain::Error>
pub type Result<T> = core::result::Result<T, Error>;

/// The error type for the `hidra-strain` crate
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("scalar field error")]
    FieldsError(#[from] hidra_fields::Error),

    #[error("inconsistent length of {quantity} (expected {expected}, found {found})")]
    ShapeMismatch {
        quantity: String,
        expected: usize,
        found: usize,
    },

    #[error("{0} point(s) of a single scan overlap within the resolution")]
    Overlap(usize),

    #[error("unsupported mode \"{0}\"")]
    UnsupportedMode(String),

    #[error("parameter \"{0}\" is not available for this peak collection")]
    ParameterNotFound(String),

    #[error("strain33 is None, it is required for the {0} stress type")]
    MissingStrain33(String),

    #[error("{quantity} of {value} is outside of the allowed range ({min}, {max})")]
    OutOfRange {
        quantity: String,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("{0} may not be empty")]
    EmptyInput(String),

    #[error("no strain has been set for direction {0}")]
    MissingStrain(String),

    #[error("session \"{0}\" does not exist")]
    SessionNotFound(String),

    #[error("session \"{0}\" already exists")]
    SessionExists(String),

    #[error("no session is active, create or switch to one first")]
    NoActiveSession,
}
