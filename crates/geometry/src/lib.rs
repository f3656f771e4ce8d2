//! Instrument geometry for the HB2B area detector
#![doc = include_str!("../readme.md")]

// Split into subfiles for development, but anything important is re-exported
mod config;
mod error;
mod instrument;
mod rotation;

#[doc(inline)]
pub use rotation::{compose_rotation, rotate_pixels, rotation_matrix, Axis};

#[doc(inline)]
pub use instrument::{dspacing_of, two_theta_of, Instrument, INCIDENT_BEAM};

#[doc(inline)]
pub use config::{read_json, write_json, DetectorGeometry, DetectorShift};

#[doc(inline)]
pub use error::{Error, Result};
