//! Strain fields from one or more scans

// crate modules
use crate::error::{Error, Result};
use crate::peaks::{check_length, strain_of, EffectiveParameter, PeakCollection};

// hidra modules
use hidra_fields::{
    coalesce_indices, stack_point_lists, Criterion, HistogramGrid, PointList, ScalarFieldSample,
    StackMode, DEFAULT_POINT_RESOLUTION,
};

// standard library
use std::ops::{Add, Mul};

// external crates
use log::debug;

/// New reference lattice spacing for a strain field
#[derive(Debug, Clone, PartialEq)]
pub enum DReference {
    /// Same value and error at every point
    Constant(f64, f64),
    /// Values matched onto the strain points by coordinate
    Field(ScalarFieldSample),
}

/// Strain measured in a single scan
///
/// Holds the fitted peaks of every sub run together with the sample point of
/// each sub run and a reference spacing per point. Points of a single scan
/// may not overlap.
#[derive(Debug, Clone, PartialEq)]
pub struct StrainFieldSingle {
    peak_collection: PeakCollection,
    point_list: PointList,
    d_reference: ScalarFieldSample,
}

impl StrainFieldSingle {
    /// Pair every sub run of a peak collection with its sample point
    pub fn new(peak_collection: PeakCollection, point_list: PointList) -> Result<Self> {
        check_length("sample points", peak_collection.len(), point_list.len())?;

        let clusters = point_list.cluster(DEFAULT_POINT_RESOLUTION);
        if clusters.len() < point_list.len() {
            return Err(Error::Overlap(point_list.len() - clusters.len()));
        }

        let (d0, d0_error) = peak_collection.d_reference();
        let n = point_list.len();
        let d_reference = ScalarFieldSample::from_point_list(
            "d-reference",
            vec![d0; n],
            vec![d0_error; n],
            point_list.clone(),
        )?;

        Ok(Self {
            peak_collection,
            point_list,
            d_reference,
        })
    }

    /// Number of points
    pub fn len(&self) -> usize {
        self.point_list.len()
    }

    /// True if there are no points
    pub fn is_empty(&self) -> bool {
        self.point_list.is_empty()
    }

    /// The fitted peaks
    pub fn peak_collection(&self) -> &PeakCollection {
        &self.peak_collection
    }

    /// Sample points, one per sub run
    pub fn point_list(&self) -> &PointList {
        &self.point_list
    }

    /// Reference spacing at every point
    pub fn get_d_reference(&self) -> &ScalarFieldSample {
        &self.d_reference
    }

    /// Replace the reference spacing
    ///
    /// A field only changes the points it has a coincident point for, all
    /// other points keep their current reference.
    pub fn set_d_reference(&mut self, d_reference: &DReference) -> Result<()> {
        let (mut values, mut errors) = (
            self.d_reference.values().to_vec(),
            self.d_reference.errors().to_vec(),
        );

        match d_reference {
            DReference::Constant(value, error) => {
                values.iter_mut().for_each(|v| *v = *value);
                errors.iter_mut().for_each(|e| *e = *error);
            }
            DReference::Field(field) => {
                let matches = self
                    .point_list
                    .index_in(field.point_list(), DEFAULT_POINT_RESOLUTION);
                let mut updated = 0;
                for (n, m) in matches.iter().enumerate() {
                    if let Some(m) = m {
                        values[n] = field.values()[*m];
                        errors[n] = field.errors()[*m];
                        updated += 1;
                    }
                }
                debug!(
                    "Updated the reference spacing of {updated} of {} point(s) for \"{}\"",
                    self.len(),
                    self.peak_collection.tag()
                );
            }
        }

        self.d_reference =
            ScalarFieldSample::from_point_list("d-reference", values, errors, self.point_list.clone())?;
        Ok(())
    }

    /// Observed lattice spacing at every point
    pub fn get_dspacing_center(&self) -> Result<ScalarFieldSample> {
        let (values, errors) = self.peak_collection.dspacing_center();
        Ok(ScalarFieldSample::from_point_list(
            "d-spacing",
            values,
            errors,
            self.point_list.clone(),
        )?)
    }

    /// Microstrain and error at every point
    pub fn strain(&self) -> (Vec<f64>, Vec<f64>) {
        let (d, d_error) = self.peak_collection.dspacing_center();
        d.iter()
            .zip(&d_error)
            .zip(self.d_reference.values().iter().zip(self.d_reference.errors()))
            .map(|((d, de), (d0, d0e))| strain_of(*d, *de, *d0, *d0e))
            .unzip()
    }

    /// Microstrain as a scalar field sample
    pub fn field(&self) -> Result<ScalarFieldSample> {
        let (values, errors) = self.strain();
        Ok(ScalarFieldSample::from_point_list(
            "strain",
            values,
            errors,
            self.point_list.clone(),
        )?)
    }
}

/// Which scan and point supplies each point of a [StrainField]
///
/// Both are -1 where no scan contributes.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Winners {
    /// Index into the contributing scans
    pub scan_indexes: Vec<i64>,
    /// Index of the point within that scan
    pub point_indexes: Vec<i64>,
}

impl Winners {
    fn push(&mut self, winner: Option<(usize, usize)>) {
        let (scan, point) = winner.map_or((-1, -1), |(s, p)| (s as i64, p as i64));
        self.scan_indexes.push(scan);
        self.point_indexes.push(point);
    }

    fn get(&self, n: usize) -> Option<(usize, usize)> {
        let scan = usize::try_from(*self.scan_indexes.get(n)?).ok()?;
        let point = usize::try_from(*self.point_indexes.get(n)?).ok()?;
        Some((scan, point))
    }
}

/// Strain over the combined points of one or more scans
///
/// Keeps every contributing scan for provenance, and for each of its points
/// the scan and point the value comes from.
///
/// ```rust
/// # use hidra_strain::StrainField;
/// # use hidra_fields::PointList;
/// let points = PointList::new(vec![0.0, 1.0], vec![0.0; 2], vec![0.0; 2]).unwrap();
/// let strain = StrainField::from_strain("peak", &[0.001, 0.002], &[1e-4, 1e-4], points).unwrap();
///
/// assert_eq!(strain.len(), 2);
/// assert!((strain.values()[1] - 2000.0).abs() < 1e-6);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct StrainField {
    strains: Vec<StrainFieldSingle>,
    point_list: PointList,
    winners: Winners,
}

impl StrainField {
    /// Strain of a single scan
    pub fn new(peak_collection: PeakCollection, point_list: PointList) -> Result<Self> {
        Ok(Self::from_single(StrainFieldSingle::new(
            peak_collection,
            point_list,
        )?))
    }

    /// Strain of a single scan from fractional strain values and errors
    pub fn from_strain(
        tag: &str,
        strain: &[f64],
        errors: &[f64],
        point_list: PointList,
    ) -> Result<Self> {
        Self::new(PeakCollection::from_strain(tag, strain, errors)?, point_list)
    }

    /// Wrap a single scan strain
    pub fn from_single(single: StrainFieldSingle) -> Self {
        let mut winners = Winners::default();
        (0..single.len()).for_each(|p| winners.push(Some((0, p))));

        Self {
            point_list: single.point_list().clone(),
            strains: vec![single],
            winners,
        }
    }

    /// Number of points
    pub fn len(&self) -> usize {
        self.point_list.len()
    }

    /// True if there are no points
    pub fn is_empty(&self) -> bool {
        self.point_list.is_empty()
    }

    /// Sample points
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

    /// Contributing single scan strains
    pub fn strains(&self) -> &[StrainFieldSingle] {
        &self.strains
    }

    /// Peak collections of every contributing scan
    pub fn peak_collections(&self) -> Vec<&PeakCollection> {
        self.strains.iter().map(|s| s.peak_collection()).collect()
    }

    /// Source of every point
    pub fn winners(&self) -> &Winners {
        &self.winners
    }

    /// Microstrain at every point, NaN where no scan contributes
    pub fn values(&self) -> Vec<f64> {
        self.gather(|s| s.strain()).0
    }

    /// Microstrain errors at every point
    pub fn errors(&self) -> Vec<f64> {
        self.gather(|s| s.strain()).1
    }

    /// Microstrain as a scalar field sample
    pub fn field(&self) -> Result<ScalarFieldSample> {
        self.sample("strain", |s| s.strain())
    }

    /// Observed lattice spacing at every point
    pub fn get_dspacing_center(&self) -> Result<ScalarFieldSample> {
        self.sample("d-spacing", |s| s.peak_collection().dspacing_center())
    }

    /// Reference lattice spacing at every point
    pub fn get_d_reference(&self) -> Result<ScalarFieldSample> {
        self.sample("d-reference", |s| {
            let d0 = s.get_d_reference();
            (d0.values().to_vec(), d0.errors().to_vec())
        })
    }

    /// Replace the reference spacing of every contributing scan
    pub fn set_d_reference(&mut self, d_reference: &DReference) -> Result<()> {
        for strain in &mut self.strains {
            strain.set_d_reference(d_reference)?;
        }
        Ok(())
    }

    /// Effective peak parameter at every point, e.g. "Center" or "FWHM"
    pub fn get_effective_peak_parameter(&self, name: &str) -> Result<ScalarFieldSample> {
        let parameter = EffectiveParameter::try_from(name)?;
        self.sample(name, |s| s.peak_collection().effective_param(parameter))
    }

    /// Raster the strain onto a histogram grid
    pub fn to_md_histo_workspace(&self, resolution: f64) -> Result<HistogramGrid> {
        Ok(self.field()?.to_md_histo_workspace(resolution)?)
    }

    /// Combine with `other`, resolving coincident points by `criterion`
    pub fn fuse_with(&self, other: &StrainField, criterion: Criterion, resolution: f64) -> Self {
        fuse(&[self, other], criterion, resolution)
    }

    /// Put both strains on one shared point list
    pub fn stack_with(&self, other: &StrainField, mode: StackMode, resolution: f64) -> (Self, Self) {
        let mut stacked = stack(&[self, other], mode, resolution).into_iter();
        match (stacked.next(), stacked.next()) {
            (Some(a), Some(b)) => (a, b),
            // stacking always returns one field per input
            _ => (self.clone(), other.clone()),
        }
    }

    /// Fuse any number of strains at once
    pub fn fuse_strains(
        strains: &[&StrainField],
        criterion: Criterion,
        resolution: f64,
    ) -> Result<Self> {
        if strains.is_empty() {
            return Err(Error::EmptyInput("list of strains to fuse".to_string()));
        }
        Ok(fuse(strains, criterion, resolution))
    }

    /// Stack any number of strains onto one shared point list
    pub fn stack_strains(
        strains: &[&StrainField],
        mode: StackMode,
        resolution: f64,
    ) -> Result<Vec<Self>> {
        if strains.is_empty() {
            return Err(Error::EmptyInput("list of strains to stack".to_string()));
        }
        Ok(stack(strains, mode, resolution))
    }

    /// Per point values picked from per scan values through the winners
    fn gather<F>(&self, per_scan: F) -> (Vec<f64>, Vec<f64>)
    where
        F: Fn(&StrainFieldSingle) -> (Vec<f64>, Vec<f64>),
    {
        let scans: Vec<(Vec<f64>, Vec<f64>)> = self.strains.iter().map(per_scan).collect();

        (0..self.len())
            .map(|n| {
                self.winners
                    .get(n)
                    .and_then(|(s, p)| {
                        let (values, errors) = scans.get(s)?;
                        Some((*values.get(p)?, *errors.get(p)?))
                    })
                    .unwrap_or((f64::NAN, f64::NAN))
            })
            .unzip()
    }

    fn sample<F>(&self, name: &str, per_scan: F) -> Result<ScalarFieldSample>
    where
        F: Fn(&StrainFieldSingle) -> (Vec<f64>, Vec<f64>),
    {
        let (values, errors) = self.gather(per_scan);
        Ok(ScalarFieldSample::from_point_list(
            name,
            values,
            errors,
            self.point_list.clone(),
        )?)
    }
}

fn fuse(strains: &[&StrainField], criterion: Criterion, resolution: f64) -> StrainField {
    let mut scans = Vec::new();
    let mut coordinates = Vec::new();
    let mut errors = Vec::new();
    let mut sources = Winners::default();

    for strain in strains {
        let offset = scans.len();
        coordinates.extend_from_slice(strain.coordinates());
        errors.extend(strain.errors());
        for n in 0..strain.len() {
            sources.push(strain.winners.get(n).map(|(s, p)| (s + offset, p)));
        }
        scans.extend(strain.strains.iter().cloned());
    }

    let aggregated = PointList::from_coordinates(coordinates);
    let chosen = coalesce_indices(&aggregated, &errors, criterion, resolution);

    let mut winners = Winners::default();
    let mut points = Vec::with_capacity(chosen.len());
    for n in chosen {
        winners.push(sources.get(n));
        if let Some(p) = aggregated.point(n) {
            points.push(p);
        }
    }

    StrainField {
        strains: scans,
        point_list: PointList::from_coordinates(points),
        winners,
    }
}

fn stack(strains: &[&StrainField], mode: StackMode, resolution: f64) -> Vec<StrainField> {
    let errors: Vec<Vec<f64>> = strains.iter().map(|s| s.errors()).collect();
    let inputs: Vec<(&PointList, &[f64])> = strains
        .iter()
        .zip(&errors)
        .map(|(s, e)| (s.point_list(), e.as_slice()))
        .collect();
    let stacked = stack_point_lists(&inputs, mode, resolution);

    strains
        .iter()
        .zip(&stacked.sources)
        .map(|(strain, sources)| {
            let mut winners = Winners::default();
            for source in sources {
                winners.push(source.and_then(|i| strain.winners.get(i)));
            }
            StrainField {
                strains: strain.strains.clone(),
                point_list: stacked.point_list.clone(),
                winners,
            }
        })
        .collect()
}

impl Add for &StrainField {
    type Output = StrainField;

    /// Fuse by minimum error at the default resolution
    fn add(self, other: &StrainField) -> StrainField {
        self.fuse_with(other, Criterion::MinError, DEFAULT_POINT_RESOLUTION)
    }
}

impl Mul for &StrainField {
    type Output = (StrainField, StrainField);

    /// Stack in union mode at the default resolution
    fn mul(self, other: &StrainField) -> Self::Output {
        self.stack_with(other, StackMode::Union, DEFAULT_POINT_RESOLUTION)
    }
}
