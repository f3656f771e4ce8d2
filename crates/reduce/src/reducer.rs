//! Reduction of one sub run of detector counts

// crate modules
use crate::error::{Error, Result};
use crate::histogram::{bin_centres, histogram, normalise_by_pixels, NormalisationPolicy};
use crate::pattern::{DiffractionPattern, PatternKind, PatternUnit};

// hidra modules
use hidra_geometry::{DetectorGeometry, DetectorShift, Instrument};
use hidra_utils::{arange, linspace, SliceExt};

// external crates
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

/// Options for [Reducer::reduce_to_2theta_histogram()]
///
/// | Field                 | Default      | Meaning                                      |
/// | --------------------- | ------------ | -------------------------------------------- |
/// | `two_theta_range`     | `(None, None)` | histogram limits, pixel extent if omitted  |
/// | `two_theta_step`      | `0.1`        | constant bin width in degrees                |
/// | `apply_mask`          | `true`       | multiply counts by the mask if one is set    |
/// | `is_point_data`       | `true`       | report bin centres rather than edges         |
/// | `normalize_pixel_bin` | `true`       | divide by the number of pixels in each bin   |
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReductionOptions {
    /// Minimum and maximum 2θ, either may be omitted
    pub two_theta_range: (Option<f64>, Option<f64>),
    /// Bin width in degrees
    pub two_theta_step: f64,
    /// Apply the pixel mask to the counts
    pub apply_mask: bool,
    /// Output bin centres instead of bin edges
    pub is_point_data: bool,
    /// Normalise each bin by its number of pixels
    pub normalize_pixel_bin: bool,
}

impl Default for ReductionOptions {
    fn default() -> Self {
        Self {
            two_theta_range: (None, None),
            two_theta_step: 0.1,
            apply_mask: true,
            is_point_data: true,
            normalize_pixel_bin: true,
        }
    }
}

/// Reducer for HB2B detector counts
///
/// Holds the instrument model together with the experimental data of a single
/// sub run: the detector swing angle, raw counts per pixel, and an optional
/// mask (1 for the region of interest, 0 to mask out).
///
/// A typical sequence is [set_experimental_data()](Reducer::set_experimental_data),
/// [build_instrument()](Reducer::build_instrument), then one of the reduction
/// methods. Every call is validated up front and nothing is partially updated
/// on failure.
#[derive(Debug, Clone, PartialEq)]
pub struct Reducer {
    instrument: Instrument,
    detector_two_theta: Option<f64>,
    counts: Option<Vec<f64>>,
    mask: Option<Vec<f64>>,
    policy: NormalisationPolicy,
}

impl Reducer {
    /// New reducer for a detector geometry and optional wavelength in Å
    pub fn new(geometry: DetectorGeometry, wavelength: Option<f64>) -> Result<Self> {
        let mut instrument = Instrument::new(geometry)?;
        if let Some(w) = wavelength {
            instrument.set_wavelength(w)?;
        }

        Ok(Self {
            instrument,
            detector_two_theta: None,
            counts: None,
            mask: None,
            policy: NormalisationPolicy::default(),
        })
    }

    /// The instrument model
    pub fn instrument(&self) -> &Instrument {
        &self.instrument
    }

    /// Mutable access to the instrument model, e.g. to change the wavelength
    pub fn instrument_mut(&mut self) -> &mut Instrument {
        &mut self.instrument
    }

    /// Change how empty bins are normalised
    pub fn set_normalisation_policy(&mut self, policy: NormalisationPolicy) {
        self.policy = policy;
    }

    /// Current treatment of empty bins
    pub fn normalisation_policy(&self) -> NormalisationPolicy {
        self.policy
    }

    /// Set the detector swing angle (degrees) and raw counts for a sub run
    pub fn set_experimental_data(&mut self, two_theta: f64, counts: Vec<f64>) -> Result<()> {
        check_angle("detector 2theta", two_theta)?;

        if counts.is_empty() {
            return Err(Error::EmptyInput("detector counts".to_string()));
        }

        self.detector_two_theta = Some(two_theta);
        self.counts = Some(counts);
        Ok(())
    }

    /// Raw counts of the current sub run
    pub fn counts(&self) -> Option<&[f64]> {
        self.counts.as_deref()
    }

    /// Set the pixel mask, 1 for the region of interest and 0 to mask out
    pub fn set_mask(&mut self, mask: Vec<f64>) -> Result<()> {
        if mask.is_empty() {
            return Err(Error::EmptyInput("mask".to_string()));
        }
        self.mask = Some(mask);
        Ok(())
    }

    /// Current pixel mask
    pub fn mask(&self) -> Option<&[f64]> {
        self.mask.as_deref()
    }

    /// Build the instrument at the swing angle of the experimental data
    pub fn build_instrument(&mut self, calibration: Option<&DetectorShift>) -> Result<()> {
        let two_theta = self.detector_two_theta.ok_or(Error::NoExperimentalData)?;
        self.instrument.build_instrument(two_theta, calibration)?;
        Ok(())
    }

    /// Build the instrument at an explicit swing angle, ignoring the data
    pub fn build_instrument_at(
        &mut self,
        two_theta: f64,
        calibration: Option<&DetectorShift>,
    ) -> Result<()> {
        check_angle("detector 2theta", two_theta)?;
        self.instrument.build_instrument(two_theta, calibration)?;
        Ok(())
    }

    /// Bin edges for a 2θ histogram
    ///
    /// An omitted minimum or maximum defaults to the pixel 2θ extent. Both
    /// limits must lie within [-180, 180], the step within (0, 180], and the
    /// minimum must be less than the maximum. The maximum itself is not
    /// included as an edge.
    pub fn generate_2theta_histogram_vector(
        &self,
        min_2theta: Option<f64>,
        step_2theta: f64,
        max_2theta: Option<f64>,
    ) -> Result<Vec<f64>> {
        let (min_2theta, max_2theta) = match (min_2theta, max_2theta) {
            (Some(min), Some(max)) => (min, max),
            (min, max) => {
                let pixels = self.instrument.pixel_two_theta()?;
                (
                    min.map_or_else(|| pixels.try_min(), Ok)?,
                    max.map_or_else(|| pixels.try_max(), Ok)?,
                )
            }
        };

        check_angle("minimum 2theta", min_2theta)?;
        check_angle("maximum 2theta", max_2theta)?;

        if !(step_2theta > 0.0 && step_2theta <= 180.0) {
            return Err(Error::OutOfRange {
                quantity: "2theta bin size".to_string(),
                value: step_2theta,
                min: 0.0,
                max: 180.0,
            });
        }

        if min_2theta >= max_2theta {
            return Err(Error::InvalidRange {
                quantity: "2theta".to_string(),
                min: min_2theta,
                max: max_2theta,
            });
        }

        Ok(arange(min_2theta, max_2theta, step_2theta)?)
    }

    /// Reduce the current counts to a 2θ diffraction pattern
    pub fn reduce_to_2theta_histogram(
        &self,
        options: &ReductionOptions,
    ) -> Result<DiffractionPattern> {
        let counts = self.counts.as_ref().ok_or(Error::NoExperimentalData)?;
        let edges = self.generate_2theta_histogram_vector(
            options.two_theta_range.0,
            options.two_theta_step,
            options.two_theta_range.1,
        )?;

        let pixel_2theta = self.instrument.pixel_two_theta()?;
        check_length("detector counts", pixel_2theta.len(), counts.len())?;

        if let Ok((min, max)) = pixel_2theta.try_finite_range() {
            info!(
                "Pixel 2theta range: ({min}, {max}) vs histogram range: ({}, {})",
                edges[0],
                edges[edges.len() - 1]
            );
        }

        let mask = if options.apply_mask {
            self.mask.as_deref()
        } else {
            None
        };
        let weights = apply_mask(counts, mask)?;

        self.histogram(
            pixel_2theta,
            &weights,
            &edges,
            options.is_point_data,
            options.normalize_pixel_bin,
            PatternUnit::TwoTheta,
        )
    }

    /// Reduce counts to a d-spacing pattern of `num_bins` equal width bins
    ///
    /// The range defaults to the extent of the finite pixel d-spacings. Bins
    /// are always normalised by their number of pixels.
    pub fn reduce_to_dspacing_histogram(
        &self,
        counts: &[f64],
        mask: Option<&[f64]>,
        num_bins: usize,
        x_range: Option<(f64, f64)>,
        is_point_data: bool,
    ) -> Result<DiffractionPattern> {
        let dspacing = self.instrument.dspacing()?;
        check_length("detector counts", dspacing.len(), counts.len())?;

        if num_bins == 0 {
            return Err(Error::EmptyInput("number of d-spacing bins".to_string()));
        }

        let (min, max) = match x_range {
            Some((min, max)) => {
                if !(min < max) || !min.is_finite() || !max.is_finite() {
                    return Err(Error::InvalidRange {
                        quantity: "d-spacing".to_string(),
                        min,
                        max,
                    });
                }
                (min, max)
            }
            None => dspacing.try_finite_range()?,
        };
        info!("Pixel d-spacing histogram range: ({min}, {max})");

        let edges = linspace(min, max, num_bins + 1)?;
        let weights = apply_mask(counts, mask)?;

        self.histogram(
            &dspacing,
            &weights,
            &edges,
            is_point_data,
            true,
            PatternUnit::DSpacing,
        )
    }

    fn histogram(
        &self,
        positions: &[f64],
        weights: &[f64],
        edges: &[f64],
        is_point_data: bool,
        normalize: bool,
        unit: PatternUnit,
    ) -> Result<DiffractionPattern> {
        let mut intensity = histogram(positions, weights, edges)?;

        if normalize {
            let pixels = histogram(positions, &vec![1.0; positions.len()], edges)?;
            let empty = pixels.iter().filter(|p| **p < 0.1).count();
            if empty > 0 {
                warn!("{empty} bin(s) contain no pixels, treated as {:?}", self.policy);
            }
            normalise_by_pixels(&mut intensity, &pixels, self.policy)?;
        }

        let (x, kind) = if is_point_data {
            (bin_centres(edges), PatternKind::Point)
        } else {
            (edges.to_vec(), PatternKind::Histogram)
        };

        debug!("Reduced to {} bins of {unit}", intensity.len());

        Ok(DiffractionPattern {
            x,
            y: intensity,
            kind,
            unit,
        })
    }
}

/// Masked copy of the counts, logging the effect of the mask
fn apply_mask(counts: &[f64], mask: Option<&[f64]>) -> Result<Vec<f64>> {
    let raw_counts: f64 = counts.iter().sum();

    let (weights, num_masked) = match mask {
        Some(mask) => {
            check_length("mask", counts.len(), mask.len())?;
            let masked = counts.iter().zip(mask).map(|(c, m)| c * m).collect();
            let num_masked = mask.len() as f64 - mask.iter().sum::<f64>();
            (masked, num_masked)
        }
        None => (counts.to_vec(), 0.0),
    };

    info!(
        "Raw counts = {raw_counts}, # Masked Pixels = {num_masked}, Counts in ROI = {}",
        weights.iter().sum::<f64>()
    );

    Ok(weights)
}

fn check_angle(quantity: &str, value: f64) -> Result<()> {
    if !(-180.0..=180.0).contains(&value) {
        return Err(Error::OutOfRange {
            quantity: quantity.to_string(),
            value,
            min: -180.0,
            max: 180.0,
        });
    }
    Ok(())
}

fn check_length(quantity: &str, expected: usize, found: usize) -> Result<()> {
    if expected != found {
        return Err(Error::ShapeMismatch {
            quantity: quantity.to_string(),
            expected,
            found,
        });
    }
    Ok(())
}
