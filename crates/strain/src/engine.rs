//! Boundary to peak fitting engines

// crate modules
use crate::error::{Error, Result};
use crate::peaks::{BackgroundFunction, PeakCollection, PeakShape};

// hidra modules
use hidra_reduce::DiffractionPattern;

// standard library
use std::f64::consts::{LN_2, PI};

// external crates
use log::{debug, warn};

/// Fits one peak in every sub run of a scan
///
/// Implementations receive each sub run's pattern (2θ in degrees) and the
/// window to fit within, and return fitted native parameters with their
/// uncertainties and a cost for every sub run.
pub trait PeakFitEngine {
    /// Fit `shape` on top of `background` within `window` for every pattern
    fn fit_peaks(
        &self,
        tag: &str,
        patterns: &[(u32, &DiffractionPattern)],
        window: (f64, f64),
        shape: PeakShape,
        background: BackgroundFunction,
        wavelength: f64,
    ) -> Result<PeakCollection>;
}

/// Reference engine estimating peaks from their moments
///
/// The background is the straight line through the first and last points of
/// the window. The centre and width come from the first and second moments
/// of the intensity above it, the height from its maximum. Uncertainties
/// follow counting statistics. Sub runs with too few points or no intensity
/// above the background are reported as NaN.
///
/// ```rust
/// # use hidra_strain::{MomentEstimator, PeakFitEngine, PeakShape, BackgroundFunction, EffectiveParameter};
/// # use hidra_reduce::DiffractionPattern;
/// let x: Vec<f64> = (0..200).map(|i| 80.0 + 0.05 * i as f64).collect();
/// let y = x.iter().map(|x| 100.0 * (-(x - 85.0f64).powi(2) / 0.5).exp() + 2.0).collect();
/// let pattern = DiffractionPattern { x, y, ..Default::default() };
///
/// let peaks = MomentEstimator::default()
///     .fit_peaks("peak", &[(1, &pattern)], (82.0, 88.0), PeakShape::Gaussian, BackgroundFunction::Linear, 1.5)
///     .unwrap();
///
/// let (centres, _) = peaks.effective_param(EffectiveParameter::Center);
/// assert!((centres[0] - 85.0).abs() < 1e-3);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MomentEstimator {
    /// Smallest number of points needed in the window
    pub min_points: usize,
}

impl Default for MomentEstimator {
    fn default() -> Self {
        Self { min_points: 5 }
    }
}

impl PeakFitEngine for MomentEstimator {
    fn fit_peaks(
        &self,
        tag: &str,
        patterns: &[(u32, &DiffractionPattern)],
        window: (f64, f64),
        shape: PeakShape,
        background: BackgroundFunction,
        wavelength: f64,
    ) -> Result<PeakCollection> {
        if !(window.0 < window.1) {
            return Err(Error::OutOfRange {
                quantity: "fit window maximum".to_string(),
                value: window.1,
                min: window.0,
                max: f64::INFINITY,
            });
        }

        if patterns.is_empty() {
            return Err(Error::EmptyInput("list of patterns to fit".to_string()));
        }

        let mut collection = PeakCollection::new(tag, shape, background, wavelength)?;
        let num_params = collection.native_parameter_names().len();

        let mut subruns = Vec::with_capacity(patterns.len());
        let mut values = Vec::with_capacity(patterns.len());
        let mut errors = Vec::with_capacity(patterns.len());
        let mut chisq = Vec::with_capacity(patterns.len());

        for (subrun, pattern) in patterns {
            let windowed = pattern.window(window.0, window.1);
            let moments = match self.estimate(&windowed) {
                Some(m) => m,
                None => {
                    warn!("Sub run {subrun}: no peak found in ({}, {})", window.0, window.1);
                    subruns.push(*subrun);
                    values.push(vec![f64::NAN; num_params]);
                    errors.push(vec![f64::NAN; num_params]);
                    chisq.push(f64::NAN);
                    continue;
                }
            };

            debug!(
                "Sub run {subrun}: centre {} with sigma {}",
                moments.centre, moments.sigma
            );

            let (v, e) = moments.native(shape);
            subruns.push(*subrun);
            values.push(v);
            errors.push(e);
            chisq.push(moments.chisq);
        }

        collection.set_peak_fitting_values(subruns, values, errors, chisq)?;
        Ok(collection)
    }
}

/// Moments of a single peak above a linear background
#[derive(Debug, Clone, Copy, PartialEq)]
struct Moments {
    centre: f64,
    sigma: f64,
    height: f64,
    area: f64,
    counts: f64,
    a0: f64,
    a1: f64,
    chisq: f64,
}

impl MomentEstimator {
    fn estimate(&self, pattern: &DiffractionPattern) -> Option<Moments> {
        let n = pattern.len();
        if n < self.min_points.max(3) {
            return None;
        }

        let x = &pattern.x;
        let y = &pattern.y;

        // straight line through both ends of the window
        let a1 = (y[n - 1] - y[0]) / (x[n - 1] - x[0]);
        let a0 = y[0] - a1 * x[0];
        let net: Vec<f64> = x
            .iter()
            .zip(y)
            .map(|(x, y)| (y - a0 - a1 * x).max(0.0))
            .collect();

        let counts: f64 = net.iter().sum();
        if !(counts > 0.0) {
            return None;
        }

        let centre = x.iter().zip(&net).map(|(x, w)| x * w).sum::<f64>() / counts;
        let variance = x
            .iter()
            .zip(&net)
            .map(|(x, w)| (x - centre).powi(2) * w)
            .sum::<f64>()
            / counts;
        let sigma = variance.sqrt();
        let height = net.iter().copied().fold(0.0, f64::max);
        let step = (x[n - 1] - x[0]) / (n - 1) as f64;
        let area = counts * step;

        // reduced chi-square of the gaussian described by the moments
        let residual: f64 = x
            .iter()
            .zip(y)
            .map(|(x, y)| {
                let model = a0 + a1 * x + height * (-(x - centre).powi(2) / (2.0 * variance)).exp();
                (y - model).powi(2)
            })
            .sum();
        let dof = n.saturating_sub(5).max(1) as f64;

        Some(Moments {
            centre,
            sigma,
            height,
            area,
            counts,
            a0,
            a1,
            chisq: residual / dof,
        })
    }
}

impl Moments {
    /// Native values and errors for a peak shape with a linear background
    fn native(&self, shape: PeakShape) -> (Vec<f64>, Vec<f64>) {
        let centre_error = self.sigma / self.counts.sqrt();
        let sigma_error = self.sigma / (2.0 * self.counts).sqrt();
        let relative = 1.0 / self.counts.sqrt();

        match shape {
            PeakShape::Gaussian => (
                vec![self.height, self.centre, self.sigma, self.a0, self.a1],
                vec![
                    self.height * relative,
                    centre_error,
                    sigma_error,
                    0.0,
                    0.0,
                ],
            ),
            PeakShape::PseudoVoigt => {
                let ratio = 2.0 * (2.0 * LN_2).sqrt();
                // mixing that reproduces the observed height for this area and width
                let fwhm = ratio * self.sigma;
                let gauss = (4.0 * LN_2 / PI).sqrt();
                let mixing = ((self.height * fwhm / self.area - gauss) / (2.0 / PI - gauss))
                    .clamp(0.0, 1.0);
                (
                    vec![self.area, self.centre, fwhm, mixing, self.a0, self.a1],
                    vec![
                        self.area * relative,
                        centre_error,
                        ratio * sigma_error,
                        0.0,
                        0.0,
                        0.0,
                    ],
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::peaks::{EffectiveParameter, FitStatus};

    fn gaussian(centre: f64, sigma: f64) -> DiffractionPattern {
        let x: Vec<f64> = (0..400).map(|i| 80.0 + 0.025 * i as f64).collect();
        let y = x
            .iter()
            .map(|x| 50.0 * (-(x - centre).powi(2) / (2.0 * sigma * sigma)).exp() + 1.0 + 0.1 * x)
            .collect();
        DiffractionPattern {
            x,
            y,
            ..Default::default()
        }
    }

    #[test]
    fn recovers_gaussian() {
        let pattern = gaussian(84.0, 0.3);
        let peaks = MomentEstimator::default()
            .fit_peaks(
                "peak",
                &[(3, &pattern)],
                (81.0, 87.0),
                PeakShape::Gaussian,
                BackgroundFunction::Linear,
                1.5,
            )
            .unwrap();

        let (v, _) = peaks.effective_params()[0];
        assert!((v.center - 84.0).abs() < 1e-3);
        assert!((v.fwhm - 2.354_820_045 * 0.3).abs() < 1e-2);
        assert!((v.height - 50.0).abs() < 0.5);
        assert!((v.a1 - 0.1).abs() < 1e-6);
        assert_eq!(peaks.subruns(), &[3]);
    }

    #[test]
    fn pseudo_voigt_of_a_gaussian() {
        let pattern = gaussian(84.0, 0.3);
        let peaks = MomentEstimator::default()
            .fit_peaks(
                "peak",
                &[(1, &pattern)],
                (81.0, 87.0),
                PeakShape::PseudoVoigt,
                BackgroundFunction::Linear,
                1.5,
            )
            .unwrap();

        let (v, _) = peaks.effective_params()[0];
        assert!(v.mixing < 0.05);
        assert!((v.height - 50.0).abs() < 1.0);
    }

    #[test]
    fn empty_window_fails_one_subrun() {
        let pattern = gaussian(84.0, 0.3);
        let flat = DiffractionPattern {
            x: pattern.x.clone(),
            y: vec![1.0; pattern.len()],
            ..Default::default()
        };

        let peaks = MomentEstimator::default()
            .fit_peaks(
                "peak",
                &[(1, &pattern), (2, &flat)],
                (81.0, 87.0),
                PeakShape::Gaussian,
                BackgroundFunction::Linear,
                1.5,
            )
            .unwrap();

        assert_eq!(peaks.fit_status(), &[FitStatus::Success, FitStatus::Failed]);
        let (centres, _) = peaks.effective_param(EffectiveParameter::Center);
        assert!(centres[1].is_nan());
    }

    #[test]
    fn invalid_window() {
        let pattern = gaussian(84.0, 0.3);
        let result = MomentEstimator::default().fit_peaks(
            "peak",
            &[(1, &pattern)],
            (87.0, 81.0),
            PeakShape::Gaussian,
            BackgroundFunction::Linear,
            1.5,
        );
        assert!(result.is_err());
    }
}
