//! Detector definition and calibration inputs
//!
//! Both are plain data that can be stored as JSON. Calibration files use the
//! keys written by the instrument calibration tools.
//!
//! ```json
//! {
//!     "Shift_x": 0.001,
//!     "Shift_y": -0.002,
//!     "Shift_z": 0.015,
//!     "Rot_x": 0.1,
//!     "Rot_y": -0.3,
//!     "Rot_z": 0.0,
//!     "Lambda": 1.452
//! }
//! ```

// crate modules
use crate::error::{Error, Result};

// hidra modules
use hidra_utils::ValueExt;

// standard library
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

// external crates
use serde::{de::DeserializeOwned, Deserialize, Serialize};

/// Immutable description of a flat area detector on an arm
///
/// Lengths are in metres. The default is the HB2B panel, a 0.3 m square of
/// 1024 × 1024 pixels at the end of a 0.985 m arm.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetectorGeometry {
    /// Number of pixel rows (along Y)
    pub rows: usize,
    /// Number of pixel columns (along X)
    pub columns: usize,
    /// Pixel pitch along X
    pub pixel_size_x: f64,
    /// Pixel pitch along Y
    pub pixel_size_y: f64,
    /// Nominal distance from the sample to the panel centre
    pub arm_length: f64,
}

impl DetectorGeometry {
    /// Describe a new detector
    pub fn new(
        rows: usize,
        columns: usize,
        pixel_size_x: f64,
        pixel_size_y: f64,
        arm_length: f64,
    ) -> Self {
        Self {
            rows,
            columns,
            pixel_size_x,
            pixel_size_y,
            arm_length,
        }
    }

    /// Total number of pixels on the panel
    pub fn number_of_pixels(&self) -> usize {
        self.rows * self.columns
    }

    /// Check every dimension is usable
    pub fn validate(&self) -> Result<()> {
        let counts = [("rows", self.rows), ("columns", self.columns)];
        for (quantity, value) in counts {
            if value == 0 {
                return Err(Error::InvalidGeometry {
                    quantity: quantity.to_string(),
                    value: value as f64,
                });
            }
        }

        let lengths = [
            ("pixel size x", self.pixel_size_x),
            ("pixel size y", self.pixel_size_y),
            ("arm length", self.arm_length),
        ];
        for (quantity, value) in lengths {
            if !value.is_finite() || value <= 0.0 {
                return Err(Error::InvalidGeometry {
                    quantity: quantity.to_string(),
                    value,
                });
            }
        }

        Ok(())
    }
}

impl Default for DetectorGeometry {
    fn default() -> Self {
        Self {
            rows: 1024,
            columns: 1024,
            pixel_size_x: 0.3 / 1024.0,
            pixel_size_y: 0.3 / 1024.0,
            arm_length: 0.985,
        }
    }
}

impl std::fmt::Display for DetectorGeometry {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        writeln!(f, "Detector geometry:")?;
        writeln!(f, " - panel size : {} x {} pixels", self.rows, self.columns)?;
        writeln!(
            f,
            " - pixel size : {} x {} m",
            self.pixel_size_x.sci(5, 2),
            self.pixel_size_y.sci(5, 2)
        )?;
        write!(f, " - arm length : {} m", self.arm_length.sci(5, 2))
    }
}

/// Calibrated offsets of the detector panel
///
/// Translations are in metres and rotations in degrees. The translation along
/// Z is the correction to the nominal arm length.
///
/// | Field            | JSON key  | Applied as                         |
/// | ---------------- | --------- | ---------------------------------- |
/// | `center_shift_x` | `Shift_x` | translation of pixels along X      |
/// | `center_shift_y` | `Shift_y` | translation of pixels along Y      |
/// | `center_shift_z` | `Shift_z` | added to the arm length            |
/// | `rotation_x`     | `Rot_x`   | flip about X                       |
/// | `rotation_y`     | `Rot_y`   | tilt about Y                       |
/// | `rotation_z`     | `Rot_z`   | spin about Z                       |
/// | `wavelength`     | `Lambda`  | optional calibrated wavelength (Å) |
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetectorShift {
    /// Panel centre shift along X
    #[serde(rename = "Shift_x", default)]
    pub center_shift_x: f64,
    /// Panel centre shift along Y
    #[serde(rename = "Shift_y", default)]
    pub center_shift_y: f64,
    /// Arm length correction
    #[serde(rename = "Shift_z", default)]
    pub center_shift_z: f64,
    /// Flip angle about X in degrees
    #[serde(rename = "Rot_x", default)]
    pub rotation_x: f64,
    /// Tilt angle about Y in degrees
    #[serde(rename = "Rot_y", default)]
    pub rotation_y: f64,
    /// Spin angle about Z in degrees
    #[serde(rename = "Rot_z", default)]
    pub rotation_z: f64,
    /// Calibrated wavelength, if any
    #[serde(rename = "Lambda", default, skip_serializing_if = "Option::is_none")]
    pub wavelength: Option<f64>,
}

impl DetectorShift {
    /// Shift with only translations set
    pub fn translation(x: f64, y: f64, z: f64) -> Self {
        Self {
            center_shift_x: x,
            center_shift_y: y,
            center_shift_z: z,
            ..Default::default()
        }
    }

    /// Shift with only rotations set, in degrees
    pub fn rotation(x: f64, y: f64, z: f64) -> Self {
        Self {
            rotation_x: x,
            rotation_y: y,
            rotation_z: z,
            ..Default::default()
        }
    }
}

impl std::fmt::Display for DetectorShift {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "shift ({}, {}, {}) m, rotation ({}, {}, {}) deg",
            self.center_shift_x.sci(4, 2),
            self.center_shift_y.sci(4, 2),
            self.center_shift_z.sci(4, 2),
            self.rotation_x.sci(4, 2),
            self.rotation_y.sci(4, 2),
            self.rotation_z.sci(4, 2),
        )
    }
}

/// Read any JSON configuration, such as a [DetectorShift] calibration
///
/// The `path` takes anything that can be turned into a `Path` reference, such
/// as a [&str], [String], [Path], etc...
///
/// ```rust, no_run
/// # use hidra_geometry::{read_json, DetectorShift};
/// let calibration: DetectorShift = read_json("path/to/calibration.json").unwrap();
/// ```
pub fn read_json<T: DeserializeOwned, P: AsRef<Path>>(path: P) -> Result<T> {
    let reader = BufReader::new(File::open(path.as_ref())?);
    Ok(serde_json::from_reader(reader)?)
}

/// Write any configuration to a pretty JSON file
pub fn write_json<T: Serialize, P: AsRef<Path>>(value: &T, path: P) -> Result<()> {
    let writer = BufWriter::new(File::create(path.as_ref())?);
    Ok(serde_json::to_writer_pretty(writer, value)?)
}
