//! Rasterised forms of a sample for visualisation

// crate modules
use crate::error::Result;
use crate::modes::Criterion;
use crate::sample::ScalarFieldSample;

// hidra modules
use hidra_utils::{SliceExt, ValueExt};

// external crates
use serde::Serialize;

/// Half width (mm) given to an axis with a single coordinate
const DEGENERATE_HALF_WIDTH: f64 = 0.0005;

/// Output of [ScalarFieldSample::export()]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Export {
    /// Regular histogram grid
    Histogram(HistogramGrid),
    /// Comma separated records, header included
    Csv(String),
}

/// Binning of one grid axis
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GridDimension {
    /// Axis name
    pub name: String,
    /// Units of the boundaries
    pub units: String,
    /// Lower boundary
    pub min: f64,
    /// Upper boundary
    pub max: f64,
    /// Number of bins
    pub bins: usize,
}

impl GridDimension {
    /// Width of one bin
    pub fn bin_width(&self) -> f64 {
        (self.max - self.min) / self.bins as f64
    }

    /// Bin index of a coordinate, clamped to the grid
    fn bin_of(&self, value: f64) -> usize {
        let bin = ((value - self.min) / self.bin_width()).floor();
        if bin <= 0.0 {
            0
        } else {
            (bin as usize).min(self.bins - 1)
        }
    }
}

impl std::fmt::Display for GridDimension {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "{}: {} to {} {} in {} bins",
            self.name,
            self.min.sci(5, 2),
            self.max.sci(5, 2),
            self.units,
            self.bins
        )
    }
}

/// Sample values binned onto a regular 3D grid
///
/// Each axis has one bin per unique coordinate, and its boundaries are the
/// coordinate extents expanded by half the smallest coordinate step. The
/// signal is stored with x varying fastest, empty bins are NaN.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramGrid {
    /// Name of the binned quantity
    pub name: String,
    /// x, y and z binning
    pub dimensions: [GridDimension; 3],
    /// Binned values
    pub signal: Vec<f64>,
    /// Squared errors of the binned values
    pub error_squared: Vec<f64>,
}

impl HistogramGrid {
    /// Bin every finite value of a sample
    pub fn from_sample(sample: &ScalarFieldSample, resolution: f64) -> Result<Self> {
        let dimensions = [
            dimension("x", &sample.x(), resolution)?,
            dimension("y", &sample.y(), resolution)?,
            dimension("z", &sample.z(), resolution)?,
        ];

        let [nx, ny, nz] = [dimensions[0].bins, dimensions[1].bins, dimensions[2].bins];
        let mut signal = vec![f64::NAN; nx * ny * nz];
        let mut error_squared = vec![f64::NAN; nx * ny * nz];
        let mut errors = vec![f64::NAN; nx * ny * nz];

        for ((p, v), e) in sample
            .coordinates()
            .iter()
            .zip(sample.values())
            .zip(sample.errors())
        {
            let i = dimensions[0].bin_of(p[0]);
            let j = dimensions[1].bin_of(p[1]);
            let k = dimensions[2].bin_of(p[2]);
            let n = i + nx * (j + ny * k);

            // one measurement per bin, the smallest error wins
            if signal[n].is_finite()
                && Criterion::MinError.winner(&[0, 1], &[errors[n], *e]) == Some(0)
            {
                continue;
            }
            signal[n] = *v;
            errors[n] = *e;
            error_squared[n] = e * e;
        }

        Ok(Self {
            name: sample.name().to_string(),
            dimensions,
            signal,
            error_squared,
        })
    }

    /// Number of bins along x, y and z
    pub fn shape(&self) -> [usize; 3] {
        [
            self.dimensions[0].bins,
            self.dimensions[1].bins,
            self.dimensions[2].bins,
        ]
    }
}

impl std::fmt::Display for HistogramGrid {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        writeln!(f, "{}", self.name)?;
        for dimension in &self.dimensions {
            writeln!(f, "  {dimension}")?;
        }
        Ok(())
    }
}

fn dimension(name: &str, coordinates: &[f64], resolution: f64) -> Result<GridDimension> {
    let unique = coordinates.unique_within(resolution);
    let (min, max) = coordinates.try_finite_range()?;

    let (half_width, bins) = if unique.len() < 2 {
        (DEGENERATE_HALF_WIDTH, 1)
    } else {
        let step = unique
            .windows(2)
            .map(|w| w[1] - w[0])
            .fold(f64::INFINITY, f64::min);
        (0.5 * step, unique.len())
    };

    Ok(GridDimension {
        name: name.to_string(),
        units: "mm".to_string(),
        min: min - half_width,
        max: max + half_width,
        bins,
    })
}
