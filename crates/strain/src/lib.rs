//! Peak collections, strain fields, and stress calculation
#![doc = include_str!("../readme.md")]

// Split into subfiles for development, but anything important is re-exported
mod engine;
mod error;
mod peaks;
mod session;
mod strain;
mod stress;

#[doc(inline)]
pub use peaks::{
    to_microstrain, BackgroundFunction, EffectiveParameter, EffectiveParameters, FitStatus,
    PeakCollection, PeakShape, DEFAULT_D_REFERENCE,
};

#[doc(inline)]
pub use engine::{MomentEstimator, PeakFitEngine};

#[doc(inline)]
pub use strain::{DReference, StrainField, StrainFieldSingle, Winners};

#[doc(inline)]
pub use stress::{to_megapascal, Direction, StressField, StressType};

#[doc(inline)]
pub use session::{ElasticConstants, SessionRegistry, StrainStressSession};

#[doc(inline)]
pub use error::{Error, Result};
