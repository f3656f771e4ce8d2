//! Fitted peak parameters of every sub run in a scan

// crate modules
use crate::error::{Error, Result};

// hidra modules
use hidra_utils::ValueExt;

// standard library
use std::f64::consts::{LN_2, PI};

// external crates
use log::warn;
use serde::{Deserialize, Serialize};

/// Reference lattice spacing used until one is set explicitly
pub const DEFAULT_D_REFERENCE: f64 = 1.0;

/// Ratio of the full width at half maximum to sigma of a Gaussian
const GAUSSIAN_FWHM_RATIO: f64 = 2.354_820_045_030_949_4;

/// Convert a fractional strain to microstrain
///
/// ```rust
/// # use hidra_strain::to_microstrain;
/// assert_eq!(to_microstrain(0.002), 2000.0);
/// ```
pub fn to_microstrain(strain: f64) -> f64 {
    strain * 1e6
}

/// Peak profile functions
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PeakShape {
    /// Height, PeakCentre, Sigma
    Gaussian,
    /// Intensity, PeakCentre, FWHM, Mixing
    #[default]
    PseudoVoigt,
}

impl PeakShape {
    /// Names of the parameters fitted for this shape
    pub fn native_parameters(&self) -> &'static [&'static str] {
        match self {
            Self::Gaussian => &["Height", "PeakCentre", "Sigma"],
            Self::PseudoVoigt => &["Intensity", "PeakCentre", "FWHM", "Mixing"],
        }
    }
}

impl TryFrom<&str> for PeakShape {
    type Error = Error;

    fn try_from(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "gaussian" => Ok(Self::Gaussian),
            "pseudovoigt" | "pseudo_voigt" | "pv" => Ok(Self::PseudoVoigt),
            _ => Err(Error::UnsupportedMode(s.to_string())),
        }
    }
}

impl std::fmt::Display for PeakShape {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Gaussian => write!(f, "Gaussian"),
            Self::PseudoVoigt => write!(f, "PseudoVoigt"),
        }
    }
}

/// Background functions fitted underneath a peak
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BackgroundFunction {
    /// A0 + A1 x
    #[default]
    Linear,
}

impl BackgroundFunction {
    /// Names of the parameters fitted for this background
    pub fn native_parameters(&self) -> &'static [&'static str] {
        match self {
            Self::Linear => &["A0", "A1"],
        }
    }
}

impl TryFrom<&str> for BackgroundFunction {
    type Error = Error;

    fn try_from(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "linear" => Ok(Self::Linear),
            _ => Err(Error::UnsupportedMode(s.to_string())),
        }
    }
}

impl std::fmt::Display for BackgroundFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Linear => write!(f, "Linear"),
        }
    }
}

/// Shape independent peak parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EffectiveParameter {
    /// Peak centre in degrees 2θ
    Center,
    /// Peak height
    Height,
    /// Full width at half maximum
    FWHM,
    /// Lorentzian fraction
    Mixing,
    /// Background constant
    A0,
    /// Background slope
    A1,
    /// Integrated intensity
    Intensity,
}

impl TryFrom<&str> for EffectiveParameter {
    type Error = Error;

    fn try_from(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "center" | "centre" | "peakcentre" => Ok(Self::Center),
            "height" => Ok(Self::Height),
            "fwhm" => Ok(Self::FWHM),
            "mixing" => Ok(Self::Mixing),
            "a0" => Ok(Self::A0),
            "a1" => Ok(Self::A1),
            "intensity" => Ok(Self::Intensity),
            _ => Err(Error::ParameterNotFound(s.to_string())),
        }
    }
}

/// Values (or errors) of all effective parameters for one sub run
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EffectiveParameters {
    /// Peak centre in degrees 2θ
    pub center: f64,
    /// Peak height
    pub height: f64,
    /// Full width at half maximum
    pub fwhm: f64,
    /// Lorentzian fraction
    pub mixing: f64,
    /// Background constant
    pub a0: f64,
    /// Background slope
    pub a1: f64,
    /// Integrated intensity
    pub intensity: f64,
}

impl EffectiveParameters {
    /// Value of a single parameter
    pub fn get(&self, parameter: EffectiveParameter) -> f64 {
        match parameter {
            EffectiveParameter::Center => self.center,
            EffectiveParameter::Height => self.height,
            EffectiveParameter::FWHM => self.fwhm,
            EffectiveParameter::Mixing => self.mixing,
            EffectiveParameter::A0 => self.a0,
            EffectiveParameter::A1 => self.a1,
            EffectiveParameter::Intensity => self.intensity,
        }
    }
}

/// Outcome of fitting one sub run
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FitStatus {
    /// Every parameter and the cost are finite
    #[default]
    Success,
    /// Something in the fit is undefined
    Failed,
}

impl std::fmt::Display for FitStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Fitted parameters of one peak for every sub run of a scan
///
/// Native parameters are stored per sub run in the order given by
/// [PeakCollection::native_parameter_names()], peak parameters first and
/// background parameters after.
///
/// ```rust
/// # use hidra_strain::{PeakCollection, PeakShape, BackgroundFunction, EffectiveParameter};
/// let mut peaks = PeakCollection::new("Fe110", PeakShape::Gaussian, BackgroundFunction::Linear, 1.5).unwrap();
///
/// // Height, PeakCentre, Sigma, A0, A1
/// peaks.set_peak_fitting_values(
///     vec![1, 2],
///     vec![vec![10.0, 90.0, 0.5, 0.0, 0.0], vec![12.0, 90.2, 0.5, 0.0, 0.0]],
///     vec![vec![0.0; 5], vec![0.0; 5]],
///     vec![1.2, 0.9],
/// ).unwrap();
///
/// let (centres, _) = peaks.effective_param(EffectiveParameter::Center);
/// assert_eq!(centres, vec![90.0, 90.2]);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeakCollection {
    tag: String,
    shape: PeakShape,
    background: BackgroundFunction,
    wavelength: f64,
    subruns: Vec<u32>,
    values: Vec<Vec<f64>>,
    errors: Vec<Vec<f64>>,
    chisq: Vec<f64>,
    fit_status: Vec<FitStatus>,
    d_reference: (f64, f64),
}

impl PeakCollection {
    /// Empty collection for a peak fitted at a given wavelength (Å)
    pub fn new(
        tag: impl Into<String>,
        shape: PeakShape,
        background: BackgroundFunction,
        wavelength: f64,
    ) -> Result<Self> {
        check_positive("wavelength", wavelength)?;

        Ok(Self {
            tag: tag.into(),
            shape,
            background,
            wavelength,
            subruns: Vec::new(),
            values: Vec::new(),
            errors: Vec::new(),
            chisq: Vec::new(),
            fit_status: Vec::new(),
            d_reference: (DEFAULT_D_REFERENCE, 0.0),
        })
    }

    /// Collection holding strain values directly
    ///
    /// Builds a synthetic collection at unit wavelength and unit reference
    /// spacing whose peak centres give back exactly `strain` (as a fraction)
    /// and `errors`. Strains below -0.5 have no valid peak centre and become
    /// NaN.
    pub fn from_strain(tag: impl Into<String>, strain: &[f64], errors: &[f64]) -> Result<Self> {
        check_length("strain errors", strain.len(), errors.len())?;
        let mut collection = Self::new(tag, PeakShape::Gaussian, BackgroundFunction::Linear, 1.0)?;

        let (values, errors): (Vec<Vec<f64>>, Vec<Vec<f64>>) = strain
            .iter()
            .zip(errors)
            .map(|(e, de)| {
                let d = DEFAULT_D_REFERENCE * (1.0 + e);
                let (centre, centre_error) = centre_of(collection.wavelength, d, de.abs());
                (
                    vec![1.0, centre, 1.0, 0.0, 0.0],
                    vec![0.0, centre_error, 0.0, 0.0, 0.0],
                )
            })
            .unzip();

        let subruns = (1..=strain.len() as u32).collect();
        let chisq = vec![0.0; strain.len()];
        collection.set_peak_fitting_values(subruns, values, errors, chisq)?;
        Ok(collection)
    }

    /// Set the fitted values, errors and cost of every sub run
    pub fn set_peak_fitting_values(
        &mut self,
        subruns: Vec<u32>,
        values: Vec<Vec<f64>>,
        errors: Vec<Vec<f64>>,
        chisq: Vec<f64>,
    ) -> Result<()> {
        let n = subruns.len();
        check_length("fitted values", n, values.len())?;
        check_length("fitted errors", n, errors.len())?;
        check_length("chi-square", n, chisq.len())?;

        let num_params = self.native_parameter_names().len();
        for row in values.iter().chain(&errors) {
            check_length("native parameters", num_params, row.len())?;
        }

        let fit_status: Vec<FitStatus> = values
            .iter()
            .zip(&chisq)
            .map(|(row, c)| {
                if c.is_finite() && row.iter().all(|v| v.is_finite()) {
                    FitStatus::Success
                } else {
                    FitStatus::Failed
                }
            })
            .collect();

        let failed = fit_status.iter().filter(|s| **s == FitStatus::Failed).count();
        if failed > 0 {
            warn!("{failed} of {n} sub run(s) failed to fit peak \"{}\"", self.tag);
        }

        self.subruns = subruns;
        self.values = values;
        self.errors = errors;
        self.chisq = chisq;
        self.fit_status = fit_status;
        Ok(())
    }

    /// Peak label
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Peak profile
    pub fn shape(&self) -> PeakShape {
        self.shape
    }

    /// Background function
    pub fn background(&self) -> BackgroundFunction {
        self.background
    }

    /// Wavelength in Å
    pub fn wavelength(&self) -> f64 {
        self.wavelength
    }

    /// Number of sub runs
    pub fn len(&self) -> usize {
        self.subruns.len()
    }

    /// True if there are no sub runs
    pub fn is_empty(&self) -> bool {
        self.subruns.is_empty()
    }

    /// Sub run numbers
    pub fn subruns(&self) -> &[u32] {
        &self.subruns
    }

    /// Fit cost of every sub run
    pub fn chisq(&self) -> &[f64] {
        &self.chisq
    }

    /// Fit outcome of every sub run
    pub fn fit_status(&self) -> &[FitStatus] {
        &self.fit_status
    }

    /// Native parameter names, peak first then background
    pub fn native_parameter_names(&self) -> Vec<&'static str> {
        let mut names = self.shape.native_parameters().to_vec();
        names.extend_from_slice(self.background.native_parameters());
        names
    }

    /// Fitted values and errors of every native parameter, per sub run
    pub fn native_params(&self) -> (&[Vec<f64>], &[Vec<f64>]) {
        (&self.values, &self.errors)
    }

    /// Values and errors of one native parameter
    pub fn native_param(&self, name: &str) -> Result<(Vec<f64>, Vec<f64>)> {
        let column = self
            .native_parameter_names()
            .iter()
            .position(|n| n.eq_ignore_ascii_case(name))
            .ok_or_else(|| Error::ParameterNotFound(name.to_string()))?;

        Ok((
            self.values.iter().map(|row| row[column]).collect(),
            self.errors.iter().map(|row| row[column]).collect(),
        ))
    }

    /// Effective parameter values and errors of every sub run
    pub fn effective_params(&self) -> Vec<(EffectiveParameters, EffectiveParameters)> {
        self.values
            .iter()
            .zip(&self.errors)
            .map(|(v, e)| effective(self.shape, v, e))
            .collect()
    }

    /// Values and errors of one effective parameter
    pub fn effective_param(&self, parameter: EffectiveParameter) -> (Vec<f64>, Vec<f64>) {
        self.effective_params()
            .iter()
            .map(|(v, e)| (v.get(parameter), e.get(parameter)))
            .unzip()
    }

    /// Reference lattice spacing and its error
    pub fn d_reference(&self) -> (f64, f64) {
        self.d_reference
    }

    /// Set the reference lattice spacing (Å) and its error
    pub fn set_d_reference(&mut self, value: f64, error: f64) -> Result<()> {
        check_positive("reference d-spacing", value)?;
        self.d_reference = (value, error);
        Ok(())
    }

    /// Lattice spacing of the peak centres by Bragg's law, with errors
    pub fn dspacing_center(&self) -> (Vec<f64>, Vec<f64>) {
        let (centres, errors) = self.effective_param(EffectiveParameter::Center);
        centres
            .iter()
            .zip(&errors)
            .map(|(c, e)| dspacing_of(self.wavelength, *c, *e))
            .unzip()
    }

    /// Microstrain relative to the reference spacing of this collection
    pub fn strain(&self) -> (Vec<f64>, Vec<f64>) {
        let (d0, d0_error) = self.d_reference;
        let (d, d_error) = self.dspacing_center();
        d.iter()
            .zip(&d_error)
            .map(|(d, de)| strain_of(*d, *de, d0, d0_error))
            .unzip()
    }
}

impl std::fmt::Display for PeakCollection {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        writeln!(f, "Peak \"{}\"", self.tag)?;
        writeln!(f, "  profile:    {} + {}", self.shape, self.background)?;
        writeln!(f, "  wavelength: {}", self.wavelength.sci(5, 2))?;
        writeln!(f, "  sub runs:   {}", self.len())?;
        write!(
            f,
            "  d0:         {} +/- {}",
            self.d_reference.0.sci(5, 2),
            self.d_reference.1.sci(5, 2)
        )
    }
}

/// d-spacing and error from a peak centre and error in degrees
pub(crate) fn dspacing_of(wavelength: f64, centre: f64, centre_error: f64) -> (f64, f64) {
    let theta = 0.5 * centre.to_radians();
    let d = 0.5 * wavelength / theta.sin();
    let d_error = (0.25 * wavelength * theta.cos() / theta.sin().powi(2)
        * centre_error.to_radians())
    .abs();
    (d, d_error)
}

/// Peak centre and error in degrees for a d-spacing and error
fn centre_of(wavelength: f64, d: f64, d_error: f64) -> (f64, f64) {
    let theta = (0.5 * wavelength / d).asin();
    let centre = (2.0 * theta).to_degrees();
    let centre_error =
        (d_error * 4.0 * theta.sin().powi(2) / (wavelength * theta.cos())).to_degrees();
    (centre, centre_error.abs())
}

/// Microstrain and error from observed and reference spacings
pub(crate) fn strain_of(d: f64, d_error: f64, d0: f64, d0_error: f64) -> (f64, f64) {
    let strain = to_microstrain((d - d0) / d0);
    let error = to_microstrain(((d_error / d0).powi(2) + (d * d0_error / d0.powi(2)).powi(2)).sqrt());
    (strain, error)
}

/// Effective parameters of one sub run with propagated errors
fn effective(
    shape: PeakShape,
    v: &[f64],
    e: &[f64],
) -> (EffectiveParameters, EffectiveParameters) {
    let n = shape.native_parameters().len();
    let (a0, a1) = (v[n], v[n + 1]);
    let (a0_error, a1_error) = (e[n], e[n + 1]);

    match shape {
        PeakShape::Gaussian => {
            let (height, centre, sigma) = (v[0], v[1], v[2]);
            let (dh, dc, ds) = (e[0], e[1], e[2]);
            let root = (2.0 * PI).sqrt();
            (
                EffectiveParameters {
                    center: centre,
                    height,
                    fwhm: GAUSSIAN_FWHM_RATIO * sigma,
                    mixing: 0.0,
                    a0,
                    a1,
                    intensity: height * sigma * root,
                },
                EffectiveParameters {
                    center: dc,
                    height: dh,
                    fwhm: GAUSSIAN_FWHM_RATIO * ds,
                    mixing: 0.0,
                    a0: a0_error,
                    a1: a1_error,
                    intensity: root * ((sigma * dh).powi(2) + (height * ds).powi(2)).sqrt(),
                },
            )
        }
        PeakShape::PseudoVoigt => {
            let (intensity, centre, fwhm, mixing) = (v[0], v[1], v[2], v[3]);
            let (di, dc, df, dm) = (e[0], e[1], e[2], e[3]);

            // height per unit intensity
            let gauss = (4.0 * LN_2 / PI).sqrt();
            let per_intensity = (mixing * 2.0 / PI + (1.0 - mixing) * gauss) / fwhm;
            let height = intensity * per_intensity;

            let d_intensity = per_intensity * di;
            let d_fwhm = height / fwhm * df;
            let d_mixing = intensity / fwhm * (2.0 / PI - gauss) * dm;

            (
                EffectiveParameters {
                    center: centre,
                    height,
                    fwhm,
                    mixing,
                    a0,
                    a1,
                    intensity,
                },
                EffectiveParameters {
                    center: dc,
                    height: (d_intensity.powi(2) + d_fwhm.powi(2) + d_mixing.powi(2)).sqrt(),
                    fwhm: df,
                    mixing: dm,
                    a0: a0_error,
                    a1: a1_error,
                    intensity: di,
                },
            )
        }
    }
}

fn check_positive(quantity: &str, value: f64) -> Result<()> {
    if !(value.is_finite() && value > 0.0) {
        return Err(Error::OutOfRange {
            quantity: quantity.to_string(),
            value,
            min: 0.0,
            max: f64::INFINITY,
        });
    }
    Ok(())
}

pub(crate) fn check_length(quantity: &str, expected: usize, found: usize) -> Result<()> {
    if expected != found {
        return Err(Error::ShapeMismatch {
            quantity: quantity.to_string(),
            expected,
            found,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn collection(shape: PeakShape) -> PeakCollection {
        let mut peaks = PeakCollection::new("testing", shape, BackgroundFunction::Linear, 1.5).unwrap();
        let values = match shape {
            PeakShape::Gaussian => vec![vec![1.0, 3.0, 4.0, 0.0, 0.0], vec![2.0, 4.0, 5.0, 0.0, 0.0]],
            PeakShape::PseudoVoigt => vec![
                vec![1.0, 3.0, 4.0, 0.0, 0.0, 0.0],
                vec![2.0, 4.0, 5.0, 1.0, 0.0, 0.0],
            ],
        };
        let errors = values.iter().map(|row| vec![0.0; row.len()]).collect();
        peaks
            .set_peak_fitting_values(vec![1, 2], values, errors, vec![42.0, 43.0])
            .unwrap();
        peaks
    }

    #[rstest]
    #[case("gaussian", PeakShape::Gaussian, 3)]
    #[case("GAUSSIAN", PeakShape::Gaussian, 3)]
    #[case("PseudoVoigt", PeakShape::PseudoVoigt, 4)]
    fn shape_names(#[case] name: &str, #[case] shape: PeakShape, #[case] n: usize) {
        let parsed = PeakShape::try_from(name).unwrap();
        assert_eq!(parsed, shape);
        assert_eq!(parsed.native_parameters().len(), n);
    }

    #[test]
    fn unknown_names() {
        assert!(PeakShape::try_from("non-existent-peak-shape").is_err());
        assert!(BackgroundFunction::try_from("quadratic").is_err());
        assert_eq!(
            BackgroundFunction::try_from("LINEAR").unwrap(),
            BackgroundFunction::Linear
        );
        assert!(matches!(
            EffectiveParameter::try_from("Gamma"),
            Err(Error::ParameterNotFound(_))
        ));
    }

    #[test]
    fn gaussian_effective_parameters() {
        let peaks = collection(PeakShape::Gaussian);
        assert_eq!(peaks.chisq(), &[42.0, 43.0]);
        assert_eq!(peaks.fit_status(), &[FitStatus::Success; 2]);

        let params = peaks.effective_params();
        assert_eq!(params.len(), 2);
        let (v, e) = params[0];
        assert_eq!(v.center, 3.0);
        assert_eq!(v.height, 1.0);
        assert!((v.fwhm - 2.0 * (2.0 * LN_2).sqrt() * 4.0).abs() < 1e-12);
        assert_eq!(e, EffectiveParameters::default());
    }

    #[test]
    fn pseudo_voigt_effective_parameters() {
        let peaks = collection(PeakShape::PseudoVoigt);
        let (v, _) = peaks.effective_params()[1];
        assert_eq!(v.intensity, 2.0);
        assert_eq!(v.fwhm, 5.0);
        assert_eq!(v.mixing, 1.0);
        // fully Lorentzian
        assert!((v.height - 2.0 * 2.0 / (PI * 5.0)).abs() < 1e-12);
    }

    #[test]
    fn native_columns() {
        let peaks = collection(PeakShape::Gaussian);
        let (sigma, _) = peaks.native_param("sigma").unwrap();
        assert_eq!(sigma, vec![4.0, 5.0]);
        assert!(matches!(
            peaks.native_param("FWHM"),
            Err(Error::ParameterNotFound(_))
        ));
    }

    #[test]
    fn wrong_number_of_parameters() {
        let mut peaks =
            PeakCollection::new("bad", PeakShape::Gaussian, BackgroundFunction::Linear, 1.5).unwrap();
        let result = peaks.set_peak_fitting_values(vec![1], vec![vec![1.0; 4]], vec![vec![0.0; 4]], vec![0.0]);
        assert!(matches!(result, Err(Error::ShapeMismatch { .. })));
    }

    #[test]
    fn bragg_back_scattering() {
        // 2θ = 180 with λ = 2 is exactly d = 1
        let (d, _) = dspacing_of(2.0, 180.0, 0.0);
        assert!((d - 1.0).abs() < 1e-12);
    }

    #[test]
    fn strain_round_trip() {
        let peaks = PeakCollection::from_strain("strain", &[0.01, -0.002], &[0.001, 0.0005]).unwrap();
        let (strain, errors) = peaks.strain();
        assert!((strain[0] - 10_000.0).abs() < 1e-6);
        assert!((strain[1] + 2_000.0).abs() < 1e-6);
        assert!((errors[0] - 1_000.0).abs() < 1e-6);
        assert!((errors[1] - 500.0).abs() < 1e-6);
    }

    #[test]
    fn failed_fits() {
        let mut peaks =
            PeakCollection::new("bad", PeakShape::Gaussian, BackgroundFunction::Linear, 1.5).unwrap();
        peaks
            .set_peak_fitting_values(
                vec![1, 2],
                vec![vec![1.0; 5], vec![f64::NAN; 5]],
                vec![vec![0.0; 5]; 2],
                vec![1.0, 1.0],
            )
            .unwrap();
        assert_eq!(peaks.fit_status(), &[FitStatus::Success, FitStatus::Failed]);
    }
}
