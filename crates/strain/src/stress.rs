//! Stress from three directions of strain

// crate modules
use crate::error::{Error, Result};
use crate::strain::{DReference, StrainField};

// hidra modules
use hidra_fields::{HistogramGrid, PointList, ScalarFieldSample, StackMode, DEFAULT_POINT_RESOLUTION};
use hidra_utils::ValueExt;

// standard library
use std::ops::Index;

// external crates
use itertools::izip;
use log::{trace, warn};
use serde::{Deserialize, Serialize};

/// Convert GPa × microstrain into MPa
pub fn to_megapascal(value: f64) -> f64 {
    value * 1e-3
}

/// Principal direction of a stress field
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Direction {
    #[default]
    D11,
    D22,
    D33,
}

impl Direction {
    /// All directions in iteration order
    pub const ALL: [Direction; 3] = [Direction::D11, Direction::D22, Direction::D33];

    fn index(&self) -> usize {
        match self {
            Self::D11 => 0,
            Self::D22 => 1,
            Self::D33 => 2,
        }
    }
}

impl TryFrom<&str> for Direction {
    type Error = Error;

    fn try_from(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "11" | "d11" => Ok(Self::D11),
            "22" | "d22" => Ok(Self::D22),
            "33" | "d33" => Ok(Self::D33),
            _ => Err(Error::UnsupportedMode(s.to_string())),
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::D11 => write!(f, "11"),
            Self::D22 => write!(f, "22"),
            Self::D33 => write!(f, "33"),
        }
    }
}

/// Simplification used for the out of plane direction
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StressType {
    /// All three strains are measured
    #[default]
    Diagonal,
    /// Out of plane strain is zero
    InPlaneStrain,
    /// Out of plane stress is zero
    InPlaneStress,
}

impl TryFrom<&str> for StressType {
    type Error = Error;

    fn try_from(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "diagonal" => Ok(Self::Diagonal),
            "in-plane-strain" | "in_plane_strain" => Ok(Self::InPlaneStrain),
            "in-plane-stress" | "in_plane_stress" => Ok(Self::InPlaneStress),
            _ => Err(Error::UnsupportedMode(s.to_string())),
        }
    }
}

impl std::fmt::Display for StressType {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Diagonal => write!(f, "diagonal"),
            Self::InPlaneStrain => write!(f, "in-plane-strain"),
            Self::InPlaneStress => write!(f, "in-plane-stress"),
        }
    }
}

/// Stress in the three principal directions of an isotropic material
///
/// The strains are stacked onto one shared point list when the field is
/// built. Stresses are computed with Hooke's law
///
/// σ<sub>ii</sub> = E / (1 + ν) · (ε<sub>ii</sub> + ν / (1 - 2ν) · Σ<sub>j</sub> ε<sub>jj</sub>)
///
/// with E in GPa and ε in microstrain, reported in MPa. Changing the elastic
/// constants or the reference spacing recomputes all three directions.
///
/// ```rust
/// # use hidra_strain::{Direction, StrainField, StressField, StressType};
/// # use hidra_fields::PointList;
/// let points = || PointList::new(vec![0.0, 1.0], vec![0.0; 2], vec![0.0; 2]).unwrap();
/// let strain = |v: f64| StrainField::from_strain("peak", &[v, v], &[0.0, 0.0], points()).unwrap();
///
/// let mut stress = StressField::new(
///     &strain(0.001),
///     &strain(0.001),
///     None,
///     200.0,
///     0.0,
///     StressType::InPlaneStrain,
/// )
/// .unwrap();
///
/// stress.select(Direction::D11);
/// assert!((stress.values()[0] - 200.0).abs() < 1e-6);
/// assert_eq!(stress.stress33().values(), &[0.0, 0.0]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct StressField {
    strain11: StrainField,
    strain22: StrainField,
    strain33: Option<StrainField>,
    youngs_modulus: f64,
    poisson_ratio: f64,
    stress_type: StressType,
    point_list: PointList,
    strains: [ScalarFieldSample; 3],
    stresses: [ScalarFieldSample; 3],
    direction: Direction,
}

impl StressField {
    /// Build the stress of two or three strain directions
    ///
    /// `strain33` is required for [StressType::Diagonal] and ignored
    /// otherwise. The Young's modulus is in GPa.
    pub fn new(
        strain11: &StrainField,
        strain22: &StrainField,
        strain33: Option<&StrainField>,
        youngs_modulus: f64,
        poisson_ratio: f64,
        stress_type: StressType,
    ) -> Result<Self> {
        check_youngs_modulus(youngs_modulus)?;
        check_poisson_ratio(poisson_ratio)?;

        let strain33 = match (stress_type, strain33) {
            (StressType::Diagonal, None) => {
                return Err(Error::MissingStrain33(stress_type.to_string()));
            }
            (StressType::Diagonal, Some(s)) => Some(s),
            (_, Some(_)) => {
                warn!("Ignoring strain33, it is derived for the {stress_type} stress type");
                None
            }
            (_, None) => None,
        };

        let mut inputs = vec![strain11, strain22];
        inputs.extend(strain33);
        let mut stacked =
            StrainField::stack_strains(&inputs, StackMode::Union, DEFAULT_POINT_RESOLUTION)?
                .into_iter();

        let (strain11, strain22) = match (stacked.next(), stacked.next()) {
            (Some(a), Some(b)) => (a, b),
            _ => return Err(Error::EmptyInput("stacked strains".to_string())),
        };
        let strain33 = stacked.next();
        let point_list = strain11.point_list().clone();

        let mut stress = Self {
            strain11,
            strain22,
            strain33,
            youngs_modulus,
            poisson_ratio,
            stress_type,
            point_list,
            strains: Default::default(),
            stresses: Default::default(),
            direction: Direction::D11,
        };
        stress.update_stress_calculation()?;
        Ok(stress)
    }

    /// Choose the direction reported by [strain](Self::strain),
    /// [stress](Self::stress), [values](Self::values), and [errors](Self::errors)
    pub fn select(&mut self, direction: Direction) {
        self.direction = direction;
    }

    /// Currently selected direction
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Simplification of the out of plane direction
    pub fn stress_type(&self) -> StressType {
        self.stress_type
    }

    /// Strain of the selected direction
    pub fn strain(&self) -> &ScalarFieldSample {
        &self.strains[self.direction.index()]
    }

    /// Stress of the selected direction
    pub fn stress(&self) -> &ScalarFieldSample {
        &self.stresses[self.direction.index()]
    }

    /// Stress values of the selected direction in MPa
    pub fn values(&self) -> &[f64] {
        self.stress().values()
    }

    /// Stress errors of the selected direction in MPa
    pub fn errors(&self) -> &[f64] {
        self.stress().errors()
    }

    pub fn stress11(&self) -> &ScalarFieldSample {
        &self[Direction::D11]
    }

    pub fn stress22(&self) -> &ScalarFieldSample {
        &self[Direction::D22]
    }

    pub fn stress33(&self) -> &ScalarFieldSample {
        &self[Direction::D33]
    }

    pub fn strain11(&self) -> &ScalarFieldSample {
        &self.strains[0]
    }

    pub fn strain22(&self) -> &ScalarFieldSample {
        &self.strains[1]
    }

    /// Measured, zero, or derived out of plane strain depending on the stress type
    pub fn strain33(&self) -> &ScalarFieldSample {
        &self.strains[2]
    }

    /// Stacked strain fields that were measured
    pub fn strain_fields(&self) -> Vec<&StrainField> {
        let mut fields = vec![&self.strain11, &self.strain22];
        fields.extend(self.strain33.as_ref());
        fields
    }

    /// Stress of every direction in the order 11, 22, 33
    pub fn iter(&self) -> impl Iterator<Item = &ScalarFieldSample> {
        self.stresses.iter()
    }

    /// Number of points
    pub fn len(&self) -> usize {
        self.point_list.len()
    }

    /// True if there are no points
    pub fn is_empty(&self) -> bool {
        self.point_list.is_empty()
    }

    /// Shared sample points
    pub fn point_list(&self) -> &PointList {
        &self.point_list
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

    /// Young's modulus in GPa
    pub fn youngs_modulus(&self) -> f64 {
        self.youngs_modulus
    }

    /// Change the Young's modulus and recompute
    pub fn set_youngs_modulus(&mut self, youngs_modulus: f64) -> Result<()> {
        check_youngs_modulus(youngs_modulus)?;
        let previous = std::mem::replace(&mut self.youngs_modulus, youngs_modulus);
        self.update_stress_calculation().inspect_err(|_| {
            self.youngs_modulus = previous;
        })
    }

    pub fn poisson_ratio(&self) -> f64 {
        self.poisson_ratio
    }

    /// Change the Poisson ratio and recompute
    pub fn set_poisson_ratio(&mut self, poisson_ratio: f64) -> Result<()> {
        check_poisson_ratio(poisson_ratio)?;
        let previous = std::mem::replace(&mut self.poisson_ratio, poisson_ratio);
        self.update_stress_calculation().inspect_err(|_| {
            self.poisson_ratio = previous;
        })
    }

    /// Change the reference spacing of every measured direction and recompute
    pub fn set_d_reference(&mut self, d_reference: &DReference) -> Result<()> {
        let mut strain11 = self.strain11.clone();
        let mut strain22 = self.strain22.clone();
        let mut strain33 = self.strain33.clone();

        strain11.set_d_reference(d_reference)?;
        strain22.set_d_reference(d_reference)?;
        if let Some(s) = strain33.as_mut() {
            s.set_d_reference(d_reference)?;
        }

        let (strains, stresses) = self.calculate(&strain11, &strain22, strain33.as_ref())?;
        self.strain11 = strain11;
        self.strain22 = strain22;
        self.strain33 = strain33;
        self.strains = strains;
        self.stresses = stresses;
        Ok(())
    }

    /// Recompute the strains and stresses of all three directions
    pub fn update_stress_calculation(&mut self) -> Result<()> {
        let (strains, stresses) =
            self.calculate(&self.strain11, &self.strain22, self.strain33.as_ref())?;
        self.strains = strains;
        self.stresses = stresses;
        Ok(())
    }

    /// Raster the stress of the selected direction onto a histogram grid
    pub fn to_md_histo_workspace(&self, resolution: f64) -> Result<HistogramGrid> {
        Ok(self.stress().to_md_histo_workspace(resolution)?)
    }

    fn calculate(
        &self,
        strain11: &StrainField,
        strain22: &StrainField,
        strain33: Option<&StrainField>,
    ) -> Result<([ScalarFieldSample; 3], [ScalarFieldSample; 3])> {
        trace!(
            "Computing {} stress with E = {} GPa and v = {}",
            self.stress_type,
            self.youngs_modulus.sci(5, 2),
            self.poisson_ratio.sci(5, 2)
        );

        let n = self.point_list.len();
        let (e11, de11) = (strain11.values(), strain11.errors());
        let (e22, de22) = (strain22.values(), strain22.errors());

        let nu = self.poisson_ratio;
        let (e33, de33) = match (self.stress_type, strain33) {
            (StressType::Diagonal, Some(s)) => (s.values(), s.errors()),
            (StressType::Diagonal, None) => {
                return Err(Error::MissingStrain33(self.stress_type.to_string()));
            }
            (StressType::InPlaneStrain, _) => (vec![0.0; n], vec![0.0; n]),
            (StressType::InPlaneStress, _) => {
                let factor = nu / (nu - 1.0);
                izip!(&e11, &de11, &e22, &de22)
                    .map(|(a, da, b, db)| (factor * (a + b), factor.abs() * da.hypot(*db)))
                    .unzip()
            }
        };

        let prefactor = self.youngs_modulus / (1.0 + nu);
        let lambda = nu / (1.0 - 2.0 * nu);

        let mut stress = [
            (Vec::with_capacity(n), Vec::with_capacity(n)),
            (Vec::with_capacity(n), Vec::with_capacity(n)),
            (Vec::with_capacity(n), Vec::with_capacity(n)),
        ];

        for (e11, de11, e22, de22, e33, de33) in izip!(&e11, &de11, &e22, &de22, &e33, &de33) {
            let strain = [*e11, *e22, *e33];
            let error = [*de11, *de22, *de33];
            let trace = lambda * strain.iter().sum::<f64>();

            for (i, (values, errors)) in stress.iter_mut().enumerate() {
                values.push(to_megapascal(prefactor * (strain[i] + trace)));

                // dσ_ii/dε_jj is 1 + λ on the diagonal and λ elsewhere
                let variance: f64 = error
                    .iter()
                    .enumerate()
                    .map(|(j, e)| {
                        let partial = if i == j { 1.0 + lambda } else { lambda };
                        (partial * e).powi(2)
                    })
                    .sum();
                errors.push(to_megapascal(prefactor * variance.sqrt()));
            }
        }

        if self.stress_type == StressType::InPlaneStress {
            stress[2] = (vec![0.0; n], vec![0.0; n]);
        }

        let [s11, s22, s33] = stress;
        let sample = |name: &str, (values, errors): (Vec<f64>, Vec<f64>)| {
            ScalarFieldSample::from_point_list(name, values, errors, self.point_list.clone())
        };

        Ok((
            [
                sample("strain11", (e11, de11))?,
                sample("strain22", (e22, de22))?,
                sample("strain33", (e33, de33))?,
            ],
            [
                sample("stress11", s11)?,
                sample("stress22", s22)?,
                sample("stress33", s33)?,
            ],
        ))
    }
}

impl Index<Direction> for StressField {
    type Output = ScalarFieldSample;

    fn index(&self, direction: Direction) -> &ScalarFieldSample {
        &self.stresses[direction.index()]
    }
}

fn check_youngs_modulus(value: f64) -> Result<()> {
    if value > 0.0 && value.is_finite() {
        return Ok(());
    }
    Err(Error::OutOfRange {
        quantity: "Young's modulus".to_string(),
        value,
        min: 0.0,
        max: f64::INFINITY,
    })
}

fn check_poisson_ratio(value: f64) -> Result<()> {
    if value > -1.0 && value < 0.5 {
        return Ok(());
    }
    Err(Error::OutOfRange {
        quantity: "Poisson ratio".to_string(),
        value,
        min: -1.0,
        max: 0.5,
    })
}
