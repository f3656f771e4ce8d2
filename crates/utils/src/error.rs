//! Result and Error types for the utils module

/// Type alias for `Result<T, utils::Error>`
pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, PartialEq)]
/// The error type for `hidra_utils`
pub enum Error {
    /// An empty slice of floats for SliceExt
    SliceContainsNoValues,

    /// The slice of float values contains things like NAN or INFINITY
    SliceContainsUndefinedValues,

    /// Value that is searched for outside of the min/max of the array
    ValueOutsideOfBounds {
        value: f64,
        lower_bound: f64,
        upper_bound: f64,
    },

    /// For when a slice has fewer than the minimum required values
    BelowMinimumSliceLength {
        length: usize,
        minimum_required: usize,
    },

    /// Range generation needs a finite, positive step
    InvalidStep { step: f64 },

    /// Range generation needs finite bounds with start < stop
    InvalidBounds { start: f64, stop: f64 },
}

// error boilerplate
impl core::fmt::Display for Error {
    fn fmt(&self, fmt: &mut core::fmt::Formatter) -> core::result::Result<(), core::fmt::Error> {
        match self {
            Self::InvalidStep { step } => write!(fmt, "step {step} must be finite and > 0"),
            Self::InvalidBounds { start, stop } => {
                write!(fmt, "range ({start}, {stop}) must be finite with start < stop")
            }
            _ => write!(fmt, "{self:?}"),
        }
    }
}

// implement standard error trait to use with ? operator
impl std::error::Error for Error {}
