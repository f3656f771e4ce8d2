//! Named strain and stress computation contexts

// crate modules
use crate::error::{Error, Result};
use crate::strain::{DReference, StrainField};
use crate::stress::{Direction, StressField, StressType};

// standard library
use std::collections::BTreeMap;

// external crates
use log::{debug, info};
use serde::{Deserialize, Serialize};

/// Isotropic elastic constants of a material
///
/// Missing keys fall back to the defaults of a typical steel.
///
/// ```rust
/// # use hidra_strain::ElasticConstants;
/// let constants: ElasticConstants = serde_json::from_str(r#"{"poisson_ratio": 0.29}"#).unwrap();
/// assert_eq!(constants.youngs_modulus, 200.0);
/// assert_eq!(constants.poisson_ratio, 0.29);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ElasticConstants {
    /// Young's modulus in GPa
    pub youngs_modulus: f64,
    /// Poisson ratio
    pub poisson_ratio: f64,
}

impl Default for ElasticConstants {
    fn default() -> Self {
        Self {
            youngs_modulus: 200.0,
            poisson_ratio: 0.3,
        }
    }
}

/// One strain and stress computation
#[derive(Debug, Clone, PartialEq)]
pub struct StrainStressSession {
    name: String,
    stress_type: StressType,
    constants: ElasticConstants,
    strains: BTreeMap<Direction, StrainField>,
    stress: Option<StressField>,
}

impl StrainStressSession {
    pub fn new(name: impl Into<String>, stress_type: StressType) -> Self {
        Self {
            name: name.into(),
            stress_type,
            constants: ElasticConstants::default(),
            strains: BTreeMap::new(),
            stress: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn stress_type(&self) -> StressType {
        self.stress_type
    }

    pub fn elastic_constants(&self) -> ElasticConstants {
        self.constants
    }

    /// Set the strain of one direction, any computed stress is discarded
    pub fn set_strain(&mut self, direction: Direction, strain: StrainField) {
        self.strains.insert(direction, strain);
        self.stress = None;
    }

    /// Strain set for a direction
    pub fn strain(&self, direction: Direction) -> Option<&StrainField> {
        self.strains.get(&direction)
    }

    /// Change the elastic constants, updating any computed stress
    pub fn set_elastic_constants(&mut self, constants: ElasticConstants) -> Result<()> {
        if let Some(stress) = self.stress.as_ref() {
            let mut updated = stress.clone();
            updated.set_youngs_modulus(constants.youngs_modulus)?;
            updated.set_poisson_ratio(constants.poisson_ratio)?;
            self.stress = Some(updated);
        }
        self.constants = constants;
        Ok(())
    }

    /// Change the reference spacing of every strain, updating any computed stress
    pub fn set_d_reference(&mut self, d_reference: &DReference) -> Result<()> {
        for strain in self.strains.values_mut() {
            strain.set_d_reference(d_reference)?;
        }
        if let Some(stress) = self.stress.as_mut() {
            stress.set_d_reference(d_reference)?;
        }
        Ok(())
    }

    /// Compute the stress from the strains set so far
    pub fn compute_stress(&mut self) -> Result<&StressField> {
        let strain11 = self
            .strains
            .get(&Direction::D11)
            .ok_or_else(|| Error::MissingStrain(Direction::D11.to_string()))?;
        let strain22 = self
            .strains
            .get(&Direction::D22)
            .ok_or_else(|| Error::MissingStrain(Direction::D22.to_string()))?;

        debug!("Computing {} stress for session \"{}\"", self.stress_type, self.name);
        let stress = StressField::new(
            strain11,
            strain22,
            self.strains.get(&Direction::D33),
            self.constants.youngs_modulus,
            self.constants.poisson_ratio,
            self.stress_type,
        )?;

        Ok(&*self.stress.insert(stress))
    }

    /// Last computed stress
    pub fn stress(&self) -> Option<&StressField> {
        self.stress.as_ref()
    }
}

/// Owns every session by name and tracks the active one
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SessionRegistry {
    sessions: BTreeMap<String, StrainStressSession>,
    current: Option<String>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a session and make it the active one
    pub fn create_session(
        &mut self,
        name: &str,
        stress_type: StressType,
    ) -> Result<&mut StrainStressSession> {
        if self.sessions.contains_key(name) {
            return Err(Error::SessionExists(name.to_string()));
        }

        info!("Creating {stress_type} session \"{name}\"");
        self.current = Some(name.to_string());
        Ok(self
            .sessions
            .entry(name.to_string())
            .or_insert_with(|| StrainStressSession::new(name, stress_type)))
    }

    /// Make an existing session the active one
    pub fn switch_session(&mut self, name: &str) -> Result<()> {
        if !self.sessions.contains_key(name) {
            return Err(Error::SessionNotFound(name.to_string()));
        }
        debug!("Switching to session \"{name}\"");
        self.current = Some(name.to_string());
        Ok(())
    }

    /// Remove a session, leaving no active session if it was the active one
    pub fn destroy_session(&mut self, name: &str) -> Result<StrainStressSession> {
        let session = self
            .sessions
            .remove(name)
            .ok_or_else(|| Error::SessionNotFound(name.to_string()))?;

        if self.current.as_deref() == Some(name) {
            self.current = None;
        }
        info!("Destroyed session \"{name}\"");
        Ok(session)
    }

    /// The active session
    pub fn current(&self) -> Result<&StrainStressSession> {
        self.current
            .as_ref()
            .and_then(|name| self.sessions.get(name))
            .ok_or(Error::NoActiveSession)
    }

    /// The active session, mutably
    pub fn current_mut(&mut self) -> Result<&mut StrainStressSession> {
        match self.current.as_ref() {
            Some(name) => self.sessions.get_mut(name).ok_or(Error::NoActiveSession),
            None => Err(Error::NoActiveSession),
        }
    }

    /// Any session by name
    pub fn get(&self, name: &str) -> Result<&StrainStressSession> {
        self.sessions
            .get(name)
            .ok_or_else(|| Error::SessionNotFound(name.to_string()))
    }

    /// Names of all sessions in sorted order
    pub fn names(&self) -> Vec<&str> {
        self.sessions.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
