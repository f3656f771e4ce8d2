//! Scalar values with uncertainties over a list of sample points

// crate modules
use crate::error::{Error, Result};
use crate::export::{Export, HistogramGrid};
use crate::interpolate::interpolate;
use crate::modes::{Criterion, ExportForm, InterpolationMethod, StackMode};
use crate::point_list::{check_length, PointList, DEFAULT_POINT_RESOLUTION};
use crate::stack::{coalesce_indices, stack_point_lists};

// standard library
use std::io::Write;
use std::ops::{Add, Mul};

// external crates
use itertools::izip;
use log::debug;
use serde::Serialize;

/// One measured scalar quantity over a set of sample points
///
/// Every point carries a value, an error, and (x, y, z) coordinates. The
/// order of points is the insertion order, but two points within the spatial
/// resolution of each other are the same physical sample point and may carry
/// different (redundant or conflicting) measurements until fused.
///
/// All combining operations return new samples.
///
/// ```rust
/// # use hidra_fields::{ScalarFieldSample, StackMode, DEFAULT_POINT_RESOLUTION};
/// let a = ScalarFieldSample::new(
///     "d-spacing",
///     vec![1.0, 2.0],
///     vec![0.1, 0.1],
///     vec![0.0, 1.0],
///     vec![0.0; 2],
///     vec![0.0; 2],
/// ).unwrap();
/// let b = a.extract(&[1]).unwrap();
///
/// let (sa, sb) = a.stack_with(&b, StackMode::Union, DEFAULT_POINT_RESOLUTION);
/// assert_eq!(sa.values(), &[1.0, 2.0]);
/// assert!(sb.values()[0].is_nan());
/// assert_eq!(sb.values()[1], 2.0);
/// ```
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct ScalarFieldSample {
    name: String,
    values: Vec<f64>,
    errors: Vec<f64>,
    point_list: PointList,
}

impl ScalarFieldSample {
    /// Build a sample, all five sequences must have equal length
    pub fn new(
        name: impl Into<String>,
        values: Vec<f64>,
        errors: Vec<f64>,
        x: Vec<f64>,
        y: Vec<f64>,
        z: Vec<f64>,
    ) -> Result<Self> {
        check_length("errors", values.len(), errors.len())?;
        check_length("x coordinates", values.len(), x.len())?;
        let point_list = PointList::new(x, y, z)?;
        Self::from_point_list(name, values, errors, point_list)
    }

    /// Build a sample over an existing point list
    pub fn from_point_list(
        name: impl Into<String>,
        values: Vec<f64>,
        errors: Vec<f64>,
        point_list: PointList,
    ) -> Result<Self> {
        check_length("errors", values.len(), errors.len())?;
        check_length("sample points", values.len(), point_list.len())?;

        Ok(Self {
            name: name.into(),
            values,
            errors,
            point_list,
        })
    }

    /// Same sample under another name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Name of the measured quantity
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Measured values
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Errors of the measured values
    pub fn errors(&self) -> &[f64] {
        &self.errors
    }

    /// Sample point coordinates
    pub fn point_list(&self) -> &PointList {
        &self.point_list
    }

    /// All points as (x, y, z) triplets
    pub fn coordinates(&self) -> &[[f64; 3]] {
        self.point_list.coordinates()
    }

    /// All x coordinates
    pub fn x(&self) -> Vec<f64> {
        self.point_list.x()
    }

    /// All y coordinates
    pub fn y(&self) -> Vec<f64> {
        self.point_list.y()
    }

    /// All z coordinates
    pub fn z(&self) -> Vec<f64> {
        self.point_list.z()
    }

    /// Number of points
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True if there are no points
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Multiply values and errors in place, for unit conversions
    pub fn scale(&mut self, factor: f64) {
        self.values.iter_mut().for_each(|v| *v *= factor);
        self.errors.iter_mut().for_each(|e| *e *= factor.abs());
    }

    /// Points with the given indices, in the order given
    pub fn extract(&self, indices: &[usize]) -> Result<Self> {
        let point_list = self.point_list.extract(indices)?;
        Ok(Self {
            name: self.name.clone(),
            values: indices.iter().map(|i| self.values[*i]).collect(),
            errors: indices.iter().map(|i| self.errors[*i]).collect(),
            point_list,
        })
    }

    /// Only the points with a finite value
    pub fn isfinite(&self) -> Self {
        let indices: Vec<usize> = (0..self.len())
            .filter(|i| self.values[*i].is_finite())
            .collect();
        self.select(&indices)
    }

    /// Concatenation of both samples, coincident points are all kept
    pub fn aggregate(&self, other: &ScalarFieldSample) -> Self {
        Self {
            name: self.name.clone(),
            values: [self.values.as_slice(), other.values.as_slice()].concat(),
            errors: [self.errors.as_slice(), other.errors.as_slice()].concat(),
            point_list: self.point_list.aggregate(&other.point_list),
        }
    }

    /// Points of both samples that coincide with a point of the other
    ///
    /// Matching points of this sample come first, followed by the matching
    /// points of `other`, so one collision gives two output points.
    pub fn intersection(&self, other: &ScalarFieldSample, resolution: f64) -> Self {
        let (from_self, from_other) = self
            .point_list
            .intersection_indices(&other.point_list, resolution);

        let offset = self.len();
        let indices: Vec<usize> = from_self
            .into_iter()
            .chain(from_other.into_iter().map(|i| i + offset))
            .collect();

        self.aggregate(other).select(&indices)
    }

    /// Merge coincident points into one, chosen by `criterion`
    ///
    /// The merged point keeps the coordinates of the winner. Points with no
    /// coincident partner pass through unchanged.
    pub fn coalesce(&self, criterion: Criterion, resolution: f64) -> Self {
        let winners = coalesce_indices(&self.point_list, &self.errors, criterion, resolution);
        self.select(&winners)
    }

    /// Aggregate with `other`, then coalesce
    pub fn fuse_with(
        &self,
        other: &ScalarFieldSample,
        criterion: Criterion,
        resolution: f64,
    ) -> Self {
        self.aggregate(other).coalesce(criterion, resolution)
    }

    /// Rebuild the sample on its minimal regular grid
    ///
    /// Each axis spans the unique coordinates found along it, with as many
    /// evenly spaced nodes as there are unique values. Coincident points are
    /// coalesced first. Grid nodes with no measurement are filled in by
    /// `method` where possible. Nodes left undefined are kept as NaN if
    /// `keep_nan`, otherwise dropped.
    pub fn interpolated_sample(
        &self,
        method: InterpolationMethod,
        keep_nan: bool,
        resolution: f64,
        criterion: Criterion,
    ) -> Result<Self> {
        if self.is_empty() {
            return Err(Error::EmptySample(format!("sample \"{}\"", self.name)));
        }

        let coalesced = self.coalesce(criterion, resolution);
        let grid = interpolate(&coalesced, method, resolution)?;

        let (mut points, mut values, mut errors) = (Vec::new(), Vec::new(), Vec::new());
        for (point, value, error) in izip!(grid.points, grid.values, grid.errors) {
            if keep_nan || value.is_finite() {
                points.push(point);
                values.push(value);
                errors.push(error);
            }
        }

        Self::from_point_list(
            self.name.clone(),
            values,
            errors,
            PointList::from_coordinates(points),
        )
    }

    /// The same measurements on another point list, NaN where unmeasured
    ///
    /// Every point of this sample must coincide with one of `point_list`.
    pub fn extend_to_point_list(&self, point_list: &PointList, resolution: f64) -> Result<Self> {
        if self.point_list.is_equal_within_resolution(point_list, resolution) {
            return Ok(self.clone());
        }

        let missing = self
            .point_list
            .index_in(point_list, resolution)
            .iter()
            .filter(|i| i.is_none())
            .count();
        if missing > 0 {
            return Err(Error::PointListNotContained(missing));
        }

        let sources = point_list.index_in(&self.point_list, resolution);
        Ok(self.with_sources(&sources, point_list.clone()))
    }

    /// Put both samples on one shared point list
    ///
    /// Returns one sample per input, each holding its own measurements and NaN
    /// where it has none. Coincident points within one input are resolved by
    /// the smallest error.
    pub fn stack_with(
        &self,
        other: &ScalarFieldSample,
        mode: StackMode,
        resolution: f64,
    ) -> (Self, Self) {
        let stacked = stack_point_lists(
            &[
                (&self.point_list, self.errors.as_slice()),
                (&other.point_list, other.errors.as_slice()),
            ],
            mode,
            resolution,
        );

        (
            self.with_sources(&stacked.sources[0], stacked.point_list.clone()),
            other.with_sources(&stacked.sources[1], stacked.point_list),
        )
    }

    /// Raster the sample onto a histogram grid for visualisation
    pub fn to_md_histo_workspace(&self, resolution: f64) -> Result<HistogramGrid> {
        HistogramGrid::from_sample(self, resolution)
    }

    /// Write `x, y, z, value, error` records with a header
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut writer = csv::Writer::from_writer(writer);
        writer.write_record(["x", "y", "z", "value", "error"])?;
        for (p, v, e) in izip!(self.coordinates(), &self.values, &self.errors) {
            writer.serialize((p[0], p[1], p[2], v, e))?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Export the sample in one of the supported forms
    pub fn export(&self, form: ExportForm) -> Result<Export> {
        debug!("Exporting \"{}\" as {form:?}", self.name);
        match form {
            ExportForm::MDHistoWorkspace => Ok(Export::Histogram(
                self.to_md_histo_workspace(DEFAULT_POINT_RESOLUTION)?,
            )),
            ExportForm::Csv => {
                let mut buffer = Vec::new();
                self.write_csv(&mut buffer)?;
                Ok(Export::Csv(String::from_utf8_lossy(&buffer).into_owned()))
            }
        }
    }

    /// Selection by indices known to be in bounds
    fn select(&self, indices: &[usize]) -> Self {
        Self {
            name: self.name.clone(),
            values: indices.iter().map(|i| self.values[*i]).collect(),
            errors: indices.iter().map(|i| self.errors[*i]).collect(),
            point_list: indices
                .iter()
                .filter_map(|i| self.point_list.point(*i))
                .collect(),
        }
    }

    /// Measurements mapped onto a new point list, NaN for `None`
    fn with_sources(&self, sources: &[Option<usize>], point_list: PointList) -> Self {
        let pick = |data: &[f64]| -> Vec<f64> {
            sources
                .iter()
                .map(|s| s.map_or(f64::NAN, |i| data[i]))
                .collect()
        };

        Self {
            name: self.name.clone(),
            values: pick(&self.values),
            errors: pick(&self.errors),
            point_list,
        }
    }
}

/// Stack any number of samples onto one shared point list
///
/// Equivalent to chaining [ScalarFieldSample::stack_with()], but every input
/// is matched against all others in one pass.
pub fn stack_scalar_field_samples(
    samples: &[&ScalarFieldSample],
    mode: StackMode,
    resolution: f64,
) -> Result<Vec<ScalarFieldSample>> {
    if samples.is_empty() {
        return Err(Error::EmptySample("list of samples to stack".to_string()));
    }

    let inputs: Vec<(&PointList, &[f64])> = samples
        .iter()
        .map(|s| (&s.point_list, s.errors.as_slice()))
        .collect();
    let stacked = stack_point_lists(&inputs, mode, resolution);

    Ok(samples
        .iter()
        .zip(&stacked.sources)
        .map(|(sample, sources)| sample.with_sources(sources, stacked.point_list.clone()))
        .collect())
}

impl Add for &ScalarFieldSample {
    type Output = ScalarFieldSample;

    /// Fuse by minimum error at the default resolution
    fn add(self, other: &ScalarFieldSample) -> ScalarFieldSample {
        self.fuse_with(other, Criterion::MinError, DEFAULT_POINT_RESOLUTION)
    }
}

impl Mul for &ScalarFieldSample {
    type Output = (ScalarFieldSample, ScalarFieldSample);

    /// Stack in union mode at the default resolution
    fn mul(self, other: &ScalarFieldSample) -> Self::Output {
        self.stack_with(other, StackMode::Union, DEFAULT_POINT_RESOLUTION)
    }
}
