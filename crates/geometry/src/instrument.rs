//! Pixel positions, scattering angles, and d-spacing for a detector panel

// crate modules
use crate::config::{DetectorGeometry, DetectorShift};
use crate::error::{Error, Result};
use crate::rotation::{compose_rotation, rotate_pixels, rotation_matrix, Axis};

// external crates
use log::{debug, warn};
use nalgebra::Vector3;
use rayon::prelude::*;

/// Direction of the incident beam, travelling along +Z
pub const INCIDENT_BEAM: Vector3<f64> = Vector3::new(0.0, 0.0, 1.0);

/// Scattering angle 2θ in degrees for a pixel at `position`
///
/// This is the angle between the incident beam and the vector from the sample
/// (at the origin) to the pixel.
///
/// ```rust
/// # use hidra_geometry::two_theta_of;
/// # use nalgebra::Vector3;
/// assert!(two_theta_of(&Vector3::new(0.0, 0.0, 0.985)).abs() < 1e-12);
/// assert!((two_theta_of(&Vector3::new(1.0, 0.0, 0.0)) - 90.0).abs() < 1e-12);
/// ```
pub fn two_theta_of(position: &Vector3<f64>) -> f64 {
    let cos_angle = position.normalize().dot(&INCIDENT_BEAM);
    cos_angle.clamp(-1.0, 1.0).acos().to_degrees()
}

/// Bragg's law d-spacing `0.5 λ / sin(θ)` for a scattering angle in degrees
///
/// The result is infinite at 2θ = 0.
///
/// ```rust
/// # use hidra_geometry::dspacing_of;
/// assert!((dspacing_of(180.0, 2.0) - 1.0).abs() < 1e-12);
/// assert!(dspacing_of(0.0, 1.5).is_infinite());
/// ```
pub fn dspacing_of(two_theta: f64, wavelength: f64) -> f64 {
    0.5 * wavelength / (0.5 * two_theta.to_radians()).sin()
}

/// Derived state of a built instrument
#[derive(Debug, Clone, PartialEq)]
struct BuiltPixels {
    /// Detector swing angle used for the build
    swing: f64,
    /// Pixel positions in pixel ID order
    positions: Vec<Vector3<f64>>,
    /// Pixel scattering angles in pixel ID order
    two_theta: Vec<f64>,
}

/// Model of the detector panel on its arm
///
/// An instrument is created from an immutable [DetectorGeometry]. The raw
/// pixel layout is a regular grid of pixel centres on the XY plane, centred on
/// the origin. Y increases with the row index and X decreases with the column
/// index.
///
/// Pixel IDs increase up each column first, so the flat arrays returned by
/// the getters are indexed by `id = column * rows + row` and the matrix views
/// are shaped `columns × rows`.
///
/// Calling [build_instrument()](Instrument::build_instrument) computes every
/// pixel position and 2θ angle. Until then the getters return
/// [Error::NotBuilt].
#[derive(Debug, Clone, PartialEq)]
pub struct Instrument {
    geometry: DetectorGeometry,
    raw_pixels: Vec<Vector3<f64>>,
    built: Option<BuiltPixels>,
    wavelength: Option<f64>,
}

impl Instrument {
    /// Create an unbuilt instrument for the given detector geometry
    pub fn new(geometry: DetectorGeometry) -> Result<Self> {
        geometry.validate()?;

        Ok(Self {
            raw_pixels: Self::uncalibrated_pixels(&geometry),
            geometry,
            built: None,
            wavelength: None,
        })
    }

    /// Flat panel of pixel centres on the XY plane
    fn uncalibrated_pixels(geometry: &DetectorGeometry) -> Vec<Vector3<f64>> {
        let rows = geometry.rows as f64;
        let columns = geometry.columns as f64;

        let start_y = -(rows * 0.5 - 0.5) * geometry.pixel_size_y;
        let start_x = (columns * 0.5 - 0.5) * geometry.pixel_size_x;

        let mut pixels = Vec::with_capacity(geometry.number_of_pixels());
        for column in 0..geometry.columns {
            let x = start_x - column as f64 * geometry.pixel_size_x;
            for row in 0..geometry.rows {
                let y = start_y + row as f64 * geometry.pixel_size_y;
                pixels.push(Vector3::new(x, y, 0.0));
            }
        }
        pixels
    }

    /// Place the detector at a swing angle of `two_theta` degrees
    ///
    /// With a calibration the pixel centres are first shifted in XY, rotated
    /// about the origin by `Rx * Ry * Rz`, and then pushed out along Z by the
    /// arm length plus the calibrated arm shift. Without a calibration only the
    /// nominal arm length is applied. Finally the whole panel is rotated about
    /// Y by the swing angle and every pixel's 2θ is recalculated.
    ///
    /// Any previous build is replaced.
    pub fn build_instrument(
        &mut self,
        two_theta: f64,
        calibration: Option<&DetectorShift>,
    ) -> Result<()> {
        if !two_theta.is_finite() {
            return Err(Error::InvalidRange {
                quantity: "detector 2theta".to_string(),
                value: two_theta,
                min: -180.0,
                max: 180.0,
            });
        }

        debug!("Building instrument at 2theta = {two_theta}");
        let mut positions = self.raw_pixels.clone();
        let mut arm = self.geometry.arm_length;

        if let Some(shift) = calibration {
            debug!("Applying calibration: {shift}");
            let offset = Vector3::new(shift.center_shift_x, shift.center_shift_y, 0.0);
            positions.par_iter_mut().for_each(|p| *p += offset);

            let rotation = compose_rotation(
                shift.rotation_x.to_radians(),
                shift.rotation_y.to_radians(),
                shift.rotation_z.to_radians(),
            );
            rotate_pixels(&rotation, &mut positions);
            arm += shift.center_shift_z;
        }

        let offset = Vector3::new(0.0, 0.0, arm);
        positions.par_iter_mut().for_each(|p| *p += offset);

        rotate_pixels(
            &rotation_matrix(two_theta.to_radians(), Axis::Y),
            &mut positions,
        );

        let angles = positions.par_iter().map(two_theta_of).collect();

        self.built = Some(BuiltPixels {
            swing: two_theta,
            positions,
            two_theta: angles,
        });

        Ok(())
    }

    fn built(&self) -> Result<&BuiltPixels> {
        self.built.as_ref().ok_or(Error::NotBuilt)
    }

    /// Whether [build_instrument()](Instrument::build_instrument) has been run
    pub fn is_built(&self) -> bool {
        self.built.is_some()
    }

    /// Detector geometry the instrument was created with
    pub fn geometry(&self) -> &DetectorGeometry {
        &self.geometry
    }

    /// Total number of detector pixels
    pub fn number_of_pixels(&self) -> usize {
        self.raw_pixels.len()
    }

    /// Uncalibrated pixel centres on the XY plane, in pixel ID order
    pub fn raw_pixel_positions(&self) -> &[Vector3<f64>] {
        &self.raw_pixels
    }

    /// Swing angle of the last build
    pub fn swing_angle(&self) -> Result<f64> {
        Ok(self.built()?.swing)
    }

    /// Pixel positions in pixel ID order
    pub fn pixel_positions(&self) -> Result<&[Vector3<f64>]> {
        Ok(&self.built()?.positions)
    }

    /// Pixel positions shaped as `columns × rows`
    pub fn pixel_matrix(&self) -> Result<Vec<&[Vector3<f64>]>> {
        Ok(self
            .built()?
            .positions
            .chunks(self.geometry.rows)
            .collect())
    }

    /// Pixel 2θ angles (degrees) in pixel ID order
    pub fn pixel_two_theta(&self) -> Result<&[f64]> {
        Ok(&self.built()?.two_theta)
    }

    /// Pixel 2θ angles (degrees) shaped as `columns × rows`
    pub fn pixel_two_theta_matrix(&self) -> Result<Vec<&[f64]>> {
        Ok(self
            .built()?
            .two_theta
            .chunks(self.geometry.rows)
            .collect())
    }

    /// Set the neutron wavelength in Å
    pub fn set_wavelength(&mut self, wavelength: f64) -> Result<()> {
        if !wavelength.is_finite() || wavelength <= 0.0 {
            return Err(Error::InvalidGeometry {
                quantity: "wavelength".to_string(),
                value: wavelength,
            });
        }
        self.wavelength = Some(wavelength);
        Ok(())
    }

    /// Neutron wavelength in Å, if set
    pub fn wavelength(&self) -> Option<f64> {
        self.wavelength
    }

    /// Pixel d-spacing in pixel ID order
    ///
    /// Pixels sitting exactly on the beam (2θ = 0) have an infinite d-spacing
    /// and should be excluded by the caller.
    pub fn dspacing(&self) -> Result<Vec<f64>> {
        let two_theta = self.pixel_two_theta()?;
        let wavelength = self.wavelength.ok_or(Error::MissingWavelength)?;

        let dspacing: Vec<f64> = two_theta
            .par_iter()
            .map(|t| dspacing_of(*t, wavelength))
            .collect();

        let undefined = dspacing.iter().filter(|d| !d.is_finite()).count();
        if undefined > 0 {
            warn!("{undefined} pixel(s) at 2theta = 0 have undefined d-spacing");
        }

        Ok(dspacing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small() -> Instrument {
        Instrument::new(DetectorGeometry::new(3, 2, 0.1, 0.2, 1.0)).unwrap()
    }

    #[test]
    fn raw_layout_follows_pixel_ids() {
        let instrument = small();
        let raw = instrument.raw_pixel_positions();
        assert_eq!(raw.len(), 6);

        // id 0 is column 0, row 0
        assert!((raw[0] - Vector3::new(0.05, -0.2, 0.0)).norm() < 1e-12);
        // id 1 moves up the column
        assert!((raw[1] - Vector3::new(0.05, 0.0, 0.0)).norm() < 1e-12);
        // id 3 starts the next column
        assert!((raw[3] - Vector3::new(-0.05, -0.2, 0.0)).norm() < 1e-12);
    }

    #[test]
    fn not_built() {
        let instrument = small();
        assert!(matches!(instrument.pixel_positions(), Err(Error::NotBuilt)));
        assert!(matches!(instrument.pixel_matrix(), Err(Error::NotBuilt)));
        assert!(matches!(instrument.pixel_two_theta(), Err(Error::NotBuilt)));
        assert!(matches!(instrument.dspacing(), Err(Error::NotBuilt)));
    }

    #[test]
    fn missing_wavelength() {
        let mut instrument = small();
        instrument.build_instrument(20.0, None).unwrap();
        assert!(matches!(instrument.dspacing(), Err(Error::MissingWavelength)));
    }

    #[test]
    fn matrix_shape() {
        let mut instrument = small();
        instrument.build_instrument(0.0, None).unwrap();
        let matrix = instrument.pixel_matrix().unwrap();
        assert_eq!(matrix.len(), 2);
        assert!(matrix.iter().all(|column| column.len() == 3));
    }
}
