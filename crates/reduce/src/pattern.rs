//! Reduced one dimensional diffraction data

// hidra modules
use hidra_utils::ValueExt;

// external crates
use serde::{Deserialize, Serialize};

/// How the abscissa relates to the intensities
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PatternKind {
    /// `x` holds bin edges, one more than the intensities
    Histogram,
    /// `x` holds bin centres, one per intensity
    #[default]
    Point,
}

/// Unit of the abscissa
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PatternUnit {
    /// Scattering angle 2θ in degrees
    #[default]
    TwoTheta,
    /// Lattice spacing in Å
    DSpacing,
}

impl std::fmt::Display for PatternUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::TwoTheta => write!(f, "2theta (deg)"),
            Self::DSpacing => write!(f, "d-spacing (A)"),
        }
    }
}

/// Diffraction pattern for a single sub run
///
/// The output of histogram reduction. For [PatternKind::Point] data `x` and
/// `y` have the same length. For [PatternKind::Histogram] data `x` holds the
/// bin edges.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiffractionPattern {
    /// Bin centres or bin edges
    pub x: Vec<f64>,
    /// Intensity per bin
    pub y: Vec<f64>,
    /// Point or histogram data
    pub kind: PatternKind,
    /// Unit of `x`
    pub unit: PatternUnit,
}

impl DiffractionPattern {
    /// Number of intensity bins
    pub fn len(&self) -> usize {
        self.y.len()
    }

    /// True if the pattern has no bins
    pub fn is_empty(&self) -> bool {
        self.y.is_empty()
    }

    /// Whether `x` holds bin centres
    pub fn is_point_data(&self) -> bool {
        self.kind == PatternKind::Point
    }

    /// Bin centres regardless of how the pattern is stored
    pub fn centres(&self) -> Vec<f64> {
        match self.kind {
            PatternKind::Point => self.x.clone(),
            PatternKind::Histogram => self.x.windows(2).map(|w| 0.5 * (w[0] + w[1])).collect(),
        }
    }

    /// Iterator over `(centre, intensity)` pairs
    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.centres().into_iter().zip(self.y.iter().copied())
    }

    /// Point data restricted to centres within `[min, max]`
    ///
    /// ```rust
    /// # use hidra_reduce::{DiffractionPattern, PatternKind, PatternUnit};
    /// let pattern = DiffractionPattern {
    ///     x: vec![1.0, 2.0, 3.0, 4.0],
    ///     y: vec![5.0, 6.0, 7.0, 8.0],
    ///     kind: PatternKind::Point,
    ///     unit: PatternUnit::TwoTheta,
    /// };
    ///
    /// let window = pattern.window(1.5, 3.0);
    /// assert_eq!(window.x, vec![2.0, 3.0]);
    /// assert_eq!(window.y, vec![6.0, 7.0]);
    /// ```
    pub fn window(&self, min: f64, max: f64) -> DiffractionPattern {
        let (x, y) = self.points().filter(|(x, _)| *x >= min && *x <= max).unzip();
        DiffractionPattern {
            x,
            y,
            kind: PatternKind::Point,
            unit: self.unit,
        }
    }
}

impl std::fmt::Display for DiffractionPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        writeln!(f, "{:?} data, {} bins in {}", self.kind, self.len(), self.unit)?;
        for (x, y) in self.points() {
            writeln!(f, "{:>13}{:>13}", x.sci(5, 2), y.sci(5, 2))?;
        }
        Ok(())
    }
}
