//! Rotation matrices about the principal axes
//!
//! All rotations are right-handed and take angles in radians. For an angle
//! `a` with `c = cos(a)` and `s = sin(a)`:
//!
//! | Axis | Matrix                                  |
//! | ---- | --------------------------------------- |
//! | X    | `[[1, 0, 0], [0, c, -s], [0, s, c]]`    |
//! | Y    | `[[c, 0, s], [0, 1, 0], [-s, 0, c]]`    |
//! | Z    | `[[c, -s, 0], [s, c, 0], [0, 0, 1]]`    |

// external crates
use nalgebra::{Rotation, Vector3};
use rayon::prelude::*;

/// Principal axis of a rotation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    /// Flip about the horizontal X axis
    X,
    /// Vertical tilt about the Y axis, also the 2θ swing axis
    Y,
    /// Spin about the Z axis (the beam direction)
    Z,
}

impl std::fmt::Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let s = match self {
            Self::X => "X",
            Self::Y => "Y",
            Self::Z => "Z",
        };
        write!(f, "{s}")
    }
}

/// Right-handed rotation of `angle` radians about one principal axis
///
/// ```rust
/// # use hidra_geometry::{rotation_matrix, Axis};
/// # use nalgebra::Vector3;
/// let r = rotation_matrix(std::f64::consts::FRAC_PI_2, Axis::Y);
/// let v = r * Vector3::new(0.0, 0.0, 1.0);
///
/// // a quarter turn about Y takes +Z onto +X
/// assert!((v.x - 1.0).abs() < 1e-12);
/// assert!(v.z.abs() < 1e-12);
/// ```
pub fn rotation_matrix(angle: f64, axis: Axis) -> Rotation<f64, 3> {
    match axis {
        Axis::X => Rotation::from_axis_angle(&Vector3::x_axis(), angle),
        Axis::Y => Rotation::from_axis_angle(&Vector3::y_axis(), angle),
        Axis::Z => Rotation::from_axis_angle(&Vector3::z_axis(), angle),
    }
}

/// Combined calibration rotation `Rx(flip) * Ry(tilt) * Rz(spin)`
///
/// Angles are in radians. The product is taken in a fixed X, Y, Z order so
/// that applying the result to a vector spins it about Z first, then tilts,
/// then flips.
pub fn compose_rotation(flip: f64, tilt: f64, spin: f64) -> Rotation<f64, 3> {
    rotation_matrix(flip, Axis::X) * rotation_matrix(tilt, Axis::Y) * rotation_matrix(spin, Axis::Z)
}

/// Apply a rotation about the origin to every pixel position in place
pub fn rotate_pixels(rotation: &Rotation<f64, 3>, pixels: &mut [Vector3<f64>]) {
    pixels
        .par_iter_mut()
        .for_each(|p| *p = rotation.transform_vector(p));
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Matrix3;
    use rstest::rstest;

    fn assert_orthonormal(r: &Rotation<f64, 3>) {
        let m = r.matrix();
        let identity = m.transpose() * m;
        assert!((identity - Matrix3::identity()).amax() < 1e-12);
        assert!((m.determinant() - 1.0).abs() < 1e-12);
    }

    #[rstest]
    #[case(0.0)]
    #[case(0.3)]
    #[case(-1.7)]
    #[case(2.9)]
    #[case(std::f64::consts::PI)]
    fn principal_rotations_are_orthonormal(#[case] angle: f64) {
        for axis in [Axis::X, Axis::Y, Axis::Z] {
            assert_orthonormal(&rotation_matrix(angle, axis));
        }
    }

    #[rstest]
    #[case(0.1, -0.2, 0.3)]
    #[case(1.5, 0.7, -2.2)]
    fn composed_rotation_is_orthonormal(#[case] x: f64, #[case] y: f64, #[case] z: f64) {
        assert_orthonormal(&compose_rotation(x, y, z));
    }

    #[test]
    fn explicit_matrix_entries() {
        let (s, c) = 0.4_f64.sin_cos();

        let rx = Matrix3::new(1.0, 0.0, 0.0, 0.0, c, -s, 0.0, s, c);
        let ry = Matrix3::new(c, 0.0, s, 0.0, 1.0, 0.0, -s, 0.0, c);
        let rz = Matrix3::new(c, -s, 0.0, s, c, 0.0, 0.0, 0.0, 1.0);

        assert!((rotation_matrix(0.4, Axis::X).matrix() - rx).amax() < 1e-12);
        assert!((rotation_matrix(0.4, Axis::Y).matrix() - ry).amax() < 1e-12);
        assert!((rotation_matrix(0.4, Axis::Z).matrix() - rz).amax() < 1e-12);
    }

    #[test]
    fn composition_order() {
        let expected = rx_ry_rz(0.2, 0.5, -0.9);
        let composed = compose_rotation(0.2, 0.5, -0.9);
        assert!((composed.matrix() - expected).amax() < 1e-12);
    }

    fn rx_ry_rz(x: f64, y: f64, z: f64) -> Matrix3<f64> {
        rotation_matrix(x, Axis::X).matrix()
            * rotation_matrix(y, Axis::Y).matrix()
            * rotation_matrix(z, Axis::Z).matrix()
    }

    #[test]
    fn batched_rotation() {
        let mut pixels = vec![Vector3::new(1.0, 0.0, 0.0), Vector3::new(0.0, 1.0, 0.0)];
        rotate_pixels(&rotation_matrix(std::f64::consts::FRAC_PI_2, Axis::Z), &mut pixels);
        assert!((pixels[0] - Vector3::new(0.0, 1.0, 0.0)).norm() < 1e-12);
        assert!((pixels[1] - Vector3::new(-1.0, 0.0, 0.0)).norm() < 1e-12);
    }
}
