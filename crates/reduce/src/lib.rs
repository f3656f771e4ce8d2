//! Reduction of detector counts to diffraction patterns
#![doc = include_str!("../readme.md")]

// Split into subfiles for development, but anything important is re-exported
mod data;
mod error;
mod histogram;
mod pattern;
mod reducer;

#[doc(inline)]
pub use reducer::{Reducer, ReductionOptions};

#[doc(inline)]
pub use histogram::{bin_centres, histogram, normalise_by_pixels, NormalisationPolicy};

#[doc(inline)]
pub use pattern::{DiffractionPattern, PatternKind, PatternUnit};

#[doc(inline)]
pub use data::{DataKey, DataManager, ScanData};

#[doc(inline)]
pub use error::{Error, Result};
