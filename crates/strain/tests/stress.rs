//! Integration tests for stress from three strain directions

use hidra_fields::PointList;
use hidra_strain::{DReference, Direction, Error, StrainField, StressField, StressType};
use rstest::{fixture, rstest};

const STRAIN: [f64; 4] = [1e-4, -2e-4, 5e-4, 1e-3];
const ERROR: f64 = 1e-5;

fn points(x: &[f64]) -> PointList {
    let n = x.len();
    PointList::new(x.to_vec(), vec![0.0; n], vec![0.0; n]).unwrap()
}

fn strain_along(x: &[f64], values: &[f64]) -> StrainField {
    StrainField::from_strain("peak", values, &vec![ERROR; values.len()], points(x)).unwrap()
}

#[fixture]
fn strain() -> StrainField {
    strain_along(&[0.0, 1.0, 2.0, 3.0], &STRAIN)
}

fn assert_relative(a: f64, b: f64) {
    assert!((a - b).abs() <= 1e-6 * b.abs().max(1.0), "{a} != {b}");
}

#[rstest]
fn hydrostatic_identity(strain: StrainField) {
    // E / (1 + v) = 1 and v / (1 - 2v) = 1
    let stress = StressField::new(
        &strain,
        &strain,
        Some(&strain),
        4.0 / 3.0,
        1.0 / 3.0,
        StressType::Diagonal,
    )
    .unwrap();

    for s in stress.iter() {
        for (i, (value, error)) in s.values().iter().zip(s.errors()).enumerate() {
            assert_relative(*value, 4.0 * STRAIN[i] * 1e3);
            assert_relative(*error, 6f64.sqrt() * ERROR * 1e3);
        }
    }
}

#[rstest]
fn linear_in_youngs_modulus(strain: StrainField) {
    let mut stress =
        StressField::new(&strain, &strain, Some(&strain), 200.0, 0.3, StressType::Diagonal)
            .unwrap();
    let before = stress.stress22().values().to_vec();

    stress.set_youngs_modulus(400.0).unwrap();
    assert_eq!(stress.youngs_modulus(), 400.0);
    for (a, b) in stress.stress22().values().iter().zip(&before) {
        assert_relative(*a, 2.0 * b);
    }
}

#[rstest]
fn uniaxial_without_poisson(strain: StrainField) {
    let zero = strain_along(&[0.0, 1.0, 2.0, 3.0], &[0.0; 4]);
    let mut stress =
        StressField::new(&strain, &zero, Some(&zero), 200.0, 0.0, StressType::Diagonal).unwrap();

    stress.select(Direction::D11);
    assert_eq!(stress.direction(), Direction::D11);
    for (value, e) in stress.values().iter().zip(STRAIN) {
        assert_relative(*value, 200.0 * e * 1e6 * 1e-3);
    }

    stress.select(Direction::D22);
    assert!(stress.values().iter().all(|v| v.abs() < 1e-9));
}

#[rstest]
fn in_plane_stress_zeroes_out_of_plane(strain: StrainField) {
    let stress =
        StressField::new(&strain, &strain, None, 200.0, 0.3, StressType::InPlaneStress).unwrap();

    assert!(stress.stress33().values().iter().all(|v| *v == 0.0));
    assert!(stress.stress33().errors().iter().all(|v| *v == 0.0));

    // derived out of plane strain
    let factor = 0.3 / (0.3 - 1.0);
    for (e33, e) in stress.strain33().values().iter().zip(STRAIN) {
        assert_relative(*e33, factor * 2.0 * e * 1e6);
    }
}

#[rstest]
fn in_plane_strain_has_no_out_of_plane_strain(strain: StrainField) {
    let stress =
        StressField::new(&strain, &strain, Some(&strain), 200.0, 0.3, StressType::InPlaneStrain)
            .unwrap();

    assert_eq!(stress.strain_fields().len(), 2);
    assert!(stress.strain33().values().iter().all(|v| *v == 0.0));
    assert!(stress.stress33().values().iter().any(|v| *v != 0.0));
}

#[rstest]
fn diagonal_requires_strain33(strain: StrainField) {
    let result = StressField::new(&strain, &strain, None, 200.0, 0.3, StressType::Diagonal);
    assert!(matches!(result, Err(Error::MissingStrain33(_))));
}

#[rstest]
#[case(0.0, 0.3)]
#[case(-10.0, 0.3)]
#[case(200.0, 0.5)]
#[case(200.0, -1.5)]
fn invalid_elastic_constants(strain: StrainField, #[case] e: f64, #[case] v: f64) {
    let result = StressField::new(&strain, &strain, Some(&strain), e, v, StressType::Diagonal);
    assert!(matches!(result, Err(Error::OutOfRange { .. })));
}

#[rstest]
fn rejected_setter_keeps_state(strain: StrainField) {
    let mut stress =
        StressField::new(&strain, &strain, Some(&strain), 200.0, 0.3, StressType::Diagonal)
            .unwrap();
    let before = stress.clone();

    assert!(stress.set_poisson_ratio(0.7).is_err());
    assert_eq!(stress, before);
}

#[rstest]
fn directions_are_stacked(strain: StrainField) {
    let shifted = strain_along(&[1.0, 2.0, 3.0, 4.0], &STRAIN);
    let stress =
        StressField::new(&strain, &shifted, Some(&strain), 200.0, 0.3, StressType::Diagonal)
            .unwrap();

    assert_eq!(stress.len(), 5);
    assert_eq!(stress.x(), vec![0.0, 1.0, 2.0, 3.0, 4.0]);
    assert!(stress.strain22().values()[0].is_nan());
    assert!(stress[Direction::D11].values()[0].is_nan());
    assert!(stress[Direction::D11].values()[1].is_finite());
}

#[rstest]
fn reference_spacing_relaxes_stress() {
    let uniform = strain_along(&[0.0, 1.0, 2.0], &[5e-4; 3]);
    let mut stress =
        StressField::new(&uniform, &uniform, Some(&uniform), 200.0, 0.3, StressType::Diagonal)
            .unwrap();
    assert!(stress.values().iter().all(|v| v.abs() > 1.0));

    stress
        .set_d_reference(&DReference::Constant(1.0005, 0.0))
        .unwrap();
    for s in stress.iter() {
        assert!(s.values().iter().all(|v| v.abs() < 1e-6));
    }
}

#[rstest]
fn iteration_order(strain: StrainField) {
    let stress =
        StressField::new(&strain, &strain, Some(&strain), 200.0, 0.3, StressType::Diagonal)
            .unwrap();
    let names: Vec<&str> = stress.iter().map(|s| s.name()).collect();
    assert_eq!(names, vec!["stress11", "stress22", "stress33"]);

    let grid = stress.to_md_histo_workspace(0.01).unwrap();
    assert_eq!(grid.shape(), [4, 1, 1]);
}
