//! Scalar field samples with fusion, stacking, and interpolation
#![doc = include_str!("../readme.md")]

// Split into subfiles for development, but anything important is re-exported
mod error;
mod export;
mod interpolate;
mod modes;
mod point_list;
mod sample;
mod spatial;
mod stack;

#[doc(inline)]
pub use sample::{stack_scalar_field_samples, ScalarFieldSample};

#[doc(inline)]
pub use point_list::{PointList, DEFAULT_POINT_RESOLUTION};

#[doc(inline)]
pub use modes::{Criterion, ExportForm, InterpolationMethod, StackMode};

#[doc(inline)]
pub use stack::{coalesce_indices, stack_point_lists, StackedPoints};

#[doc(inline)]
pub use export::{Export, GridDimension, HistogramGrid};

#[doc(inline)]
pub use error::{Error, Result};
