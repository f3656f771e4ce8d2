//! `hidra` is a semi-modular toolkit for neutron diffraction reduction and
//! residual stress mapping
//!
#![doc = include_str!("../readme.md")]
#![deny(missing_docs, missing_debug_implementations)]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

// Re-exports of toolkit crates.
#[doc(inline)]
pub use hidra_utils as utils;

#[cfg(feature = "geometry")]
#[cfg_attr(docsrs, doc(cfg(feature = "geometry")))]
#[doc(inline)]
pub use hidra_geometry as geometry;

#[cfg(feature = "reduce")]
#[cfg_attr(docsrs, doc(cfg(feature = "reduce")))]
#[doc(inline)]
pub use hidra_reduce as reduce;

#[cfg(feature = "fields")]
#[cfg_attr(docsrs, doc(cfg(feature = "fields")))]
#[doc(inline)]
pub use hidra_fields as fields;

#[cfg(feature = "strain")]
#[cfg_attr(docsrs, doc(cfg(feature = "strain")))]
#[doc(inline)]
pub use hidra_strain as strain;
