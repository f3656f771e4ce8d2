//! Named options for combining, interpolating, and exporting samples

// crate modules
use crate::error::Error;

// external crates
use serde::{Deserialize, Serialize};

/// Which points make it onto a stacked point list
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StackMode {
    /// Every point found in any of the samples
    #[default]
    Union,
    /// Only points found in all of the samples
    Intersection,
}

impl TryFrom<&str> for StackMode {
    type Error = Error;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s.trim().to_lowercase().as_str() {
            "union" | "complete" => Ok(Self::Union),
            "intersection" | "common" => Ok(Self::Intersection),
            _ => Err(Error::UnsupportedMode(s.to_string())),
        }
    }
}

impl std::fmt::Display for StackMode {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Union => write!(f, "union"),
            Self::Intersection => write!(f, "intersection"),
        }
    }
}

/// Rule for picking one of several coincident measurements
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Criterion {
    /// Smallest reported error, the first candidate wins a tie
    #[default]
    MinError,
}

impl Criterion {
    /// Pick the winning index out of `candidates`
    ///
    /// A NaN error never beats a finite one.
    ///
    /// ```rust
    /// # use hidra_fields::Criterion;
    /// let errors = [0.3, f64::NAN, 0.1, 0.1];
    /// assert_eq!(Criterion::MinError.winner(&[0, 1, 2, 3], &errors), Some(2));
    /// assert_eq!(Criterion::MinError.winner(&[], &errors), None);
    /// ```
    pub fn winner(&self, candidates: &[usize], errors: &[f64]) -> Option<usize> {
        match self {
            Self::MinError => {
                let mut best: Option<(usize, f64)> = None;
                for &i in candidates {
                    let error = errors.get(i).copied().unwrap_or(f64::NAN);
                    let error = if error.is_nan() { f64::INFINITY } else { error };
                    match best {
                        Some((_, e)) if e <= error => (),
                        _ => best = Some((i, error)),
                    }
                }
                best.map(|(i, _)| i)
            }
        }
    }
}

impl TryFrom<&str> for Criterion {
    type Error = Error;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s.trim().to_lowercase().as_str() {
            "min_error" => Ok(Self::MinError),
            _ => Err(Error::UnsupportedMode(s.to_string())),
        }
    }
}

impl std::fmt::Display for Criterion {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::MinError => write!(f, "min_error"),
        }
    }
}

/// How vacant grid nodes are filled in
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterpolationMethod {
    /// Linear between the closest known nodes along each grid axis
    #[default]
    Linear,
    /// Copy of the closest known node
    Nearest,
}

impl TryFrom<&str> for InterpolationMethod {
    type Error = Error;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s.trim().to_lowercase().as_str() {
            "linear" => Ok(Self::Linear),
            "nearest" => Ok(Self::Nearest),
            _ => Err(Error::UnsupportedMode(s.to_string())),
        }
    }
}

impl std::fmt::Display for InterpolationMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Linear => write!(f, "linear"),
            Self::Nearest => write!(f, "nearest"),
        }
    }
}

/// Output forms for exporting a sample
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExportForm {
    /// Regular histogram grid with signal and squared errors
    #[default]
    MDHistoWorkspace,
    /// Comma separated x, y, z, value, error records
    Csv,
}

impl TryFrom<&str> for ExportForm {
    type Error = Error;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s.trim().to_lowercase().as_str() {
            "mdhistoworkspace" | "md_histo_workspace" => Ok(Self::MDHistoWorkspace),
            "csv" => Ok(Self::Csv),
            _ => Err(Error::UnsupportedMode(s.to_string())),
        }
    }
}
