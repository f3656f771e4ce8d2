//! Integration tests for combining and regridding scalar field samples

use hidra_fields::{
    stack_scalar_field_samples, Criterion, Error, Export, ExportForm, InterpolationMethod,
    ScalarFieldSample, StackMode, DEFAULT_POINT_RESOLUTION,
};
use rstest::{fixture, rstest};

/// Sample along the x axis with errors of 0.1
fn line(values: &[f64], x: &[f64]) -> ScalarFieldSample {
    let n = values.len();
    ScalarFieldSample::new(
        "strain",
        values.to_vec(),
        vec![0.1; n],
        x.to_vec(),
        vec![0.0; n],
        vec![0.0; n],
    )
    .unwrap()
}

#[fixture]
fn first() -> ScalarFieldSample {
    line(&[1.0, 2.0, 3.0, 4.0], &[0.0, 1.0, 2.0, 3.0])
}

#[fixture]
fn second() -> ScalarFieldSample {
    // three of the points coincide with the first sample
    line(&[5.0, 6.0, 7.0, 8.0], &[1.001, 2.0, 3.005, 7.0])
}

/// Cube of `n` points per side with values x + y + z, x outermost
fn cube(n: usize) -> ScalarFieldSample {
    let (mut x, mut y, mut z) = (Vec::new(), Vec::new(), Vec::new());
    for i in 0..n {
        for j in 0..n {
            for k in 0..n {
                x.push(i as f64);
                y.push(j as f64);
                z.push(k as f64);
            }
        }
    }
    let values = (0..x.len()).map(|p| x[p] + y[p] + z[p]).collect();
    ScalarFieldSample::new("cube", values, vec![0.1; n * n * n], x, y, z).unwrap()
}

#[rstest]
fn mismatched_lengths() {
    let result = ScalarFieldSample::new(
        "bad",
        vec![1.0, 2.0],
        vec![0.1],
        vec![0.0, 1.0],
        vec![0.0, 1.0],
        vec![0.0, 1.0],
    );
    assert!(matches!(result, Err(Error::ShapeMismatch { .. })));

    let result = ScalarFieldSample::new(
        "bad",
        vec![1.0, 2.0],
        vec![0.1, 0.1],
        vec![0.0, 1.0],
        vec![0.0, 1.0],
        vec![0.0],
    );
    assert!(matches!(result, Err(Error::ShapeMismatch { .. })));
}

#[rstest]
#[case(&[], &[])]
#[case(&[1.0], &[0.0])]
#[case(&[1.0, 2.0, 3.0], &[0.0, 0.0, 0.0])]
fn aggregate_length(first: ScalarFieldSample, #[case] values: &[f64], #[case] x: &[f64]) {
    let other = line(values, x);
    assert_eq!(first.aggregate(&other).len(), first.len() + other.len());
    assert_eq!(other.aggregate(&first).len(), first.len() + other.len());
}

#[rstest]
fn fuse_length(first: ScalarFieldSample, second: ScalarFieldSample) {
    let fused = first.fuse_with(&second, Criterion::MinError, DEFAULT_POINT_RESOLUTION);
    assert_eq!(fused.len(), first.len() + second.len() - 3);
    assert_eq!((&first + &second).len(), fused.len());
}

#[rstest]
fn intersection_keeps_both_sides(first: ScalarFieldSample, second: ScalarFieldSample) {
    let common = first.intersection(&second, DEFAULT_POINT_RESOLUTION);
    assert_eq!(common.len(), 6);
    assert_eq!(common.values(), &[2.0, 3.0, 4.0, 5.0, 6.0, 7.0]);
}

#[rstest]
fn coalesce_by_smallest_error() {
    let sample = ScalarFieldSample::new(
        "strain",
        vec![1.0, 2.0, 3.0, 4.0],
        vec![0.3, 0.1, 0.2, 0.1],
        vec![0.0, 5.0, 0.002, 5.003],
        vec![0.0; 4],
        vec![0.0; 4],
    )
    .unwrap();

    let coalesced = sample.coalesce(Criterion::MinError, DEFAULT_POINT_RESOLUTION);
    assert_eq!(coalesced.values(), &[3.0, 2.0]);
    assert_eq!(coalesced.x(), vec![0.002, 5.0]);
}

#[rstest]
fn stack_symmetry(first: ScalarFieldSample, second: ScalarFieldSample) {
    let (ab_first, ab_second) = &first * &second;
    let (ba_second, ba_first) = &second * &first;

    assert_eq!(ab_first.len(), 5);
    assert_eq!(ab_first.len(), ba_second.len());
    assert_eq!(ab_first.point_list(), ab_second.point_list());

    // same coordinates, possibly in another order
    for p in ab_first.coordinates() {
        assert!(ba_first
            .coordinates()
            .iter()
            .any(|q| (0..3).all(|i| (p[i] - q[i]).abs() < 1e-9)));
    }

    // every input point keeps its value in its own component
    for (input, stacked) in [(&first, &ab_first), (&second, &ab_second), (&first, &ba_first)] {
        for (p, v) in input.coordinates().iter().zip(input.values()) {
            let found = stacked
                .coordinates()
                .iter()
                .zip(stacked.values())
                .any(|(q, w)| (p[0] - q[0]).abs() <= DEFAULT_POINT_RESOLUTION && v == w);
            assert!(found);
        }
    }

    let nan = ab_second.values().iter().filter(|v| v.is_nan()).count();
    assert_eq!(nan, 1);
}

#[rstest]
fn stack_intersection(first: ScalarFieldSample, second: ScalarFieldSample) {
    let (a, b) = first.stack_with(&second, StackMode::Intersection, DEFAULT_POINT_RESOLUTION);
    assert_eq!(a.len(), 3);
    assert_eq!(a.values(), &[2.0, 3.0, 4.0]);
    assert_eq!(b.values(), &[5.0, 6.0, 7.0]);
}

#[rstest]
fn stacking_many(first: ScalarFieldSample, second: ScalarFieldSample) {
    let third = line(&[9.0], &[10.0]);
    let stacked =
        stack_scalar_field_samples(&[&first, &second, &third], StackMode::Union, 0.01).unwrap();
    assert_eq!(stacked.len(), 3);
    assert!(stacked.iter().all(|s| s.len() == 6));

    // chained stacking ends up on an equivalent grid
    let (a, _) = &first * &second;
    let (chained, _) = &a * &third;
    assert_eq!(chained.len(), 6);
}

#[rstest]
fn extend_to_point_list(first: ScalarFieldSample, second: ScalarFieldSample) {
    let (stacked, _) = &first * &second;

    let extended = first
        .extend_to_point_list(stacked.point_list(), DEFAULT_POINT_RESOLUTION)
        .unwrap();
    assert_eq!(extended.len(), 5);
    assert_eq!(extended.values()[..4], [1.0, 2.0, 3.0, 4.0]);
    assert!(extended.values()[4].is_nan());

    let unchanged = first
        .extend_to_point_list(first.point_list(), DEFAULT_POINT_RESOLUTION)
        .unwrap();
    assert_eq!(unchanged, first);

    let result = second.extend_to_point_list(first.point_list(), DEFAULT_POINT_RESOLUTION);
    assert!(matches!(result, Err(Error::PointListNotContained(1))));
}

#[rstest]
#[case(InterpolationMethod::Linear)]
#[case(InterpolationMethod::Nearest)]
fn full_cube_is_unchanged(#[case] method: InterpolationMethod) {
    let sample = cube(4);
    let interpolated = sample
        .interpolated_sample(method, true, DEFAULT_POINT_RESOLUTION, Criterion::MinError)
        .unwrap();
    assert_eq!(interpolated, sample);
}

#[rstest]
fn cube_vacancies_are_filled() {
    let full = cube(6);

    // every other interior point, 32 of the 64
    let kept: Vec<usize> = (0..full.len())
        .filter(|p| {
            let (i, j, k) = (p / 36, (p / 6) % 6, p % 6);
            let interior = [i, j, k].iter().all(|c| (1..=4).contains(c));
            !(interior && (i + j + k) % 2 == 0)
        })
        .collect();
    let sparse = full.extract(&kept).unwrap();
    assert_eq!(sparse.len(), 216 - 32);

    let interpolated = sparse
        .interpolated_sample(
            InterpolationMethod::Linear,
            false,
            DEFAULT_POINT_RESOLUTION,
            Criterion::MinError,
        )
        .unwrap();

    assert_eq!(interpolated.len(), 216);
    assert_eq!(interpolated.point_list(), full.point_list());
    for (a, b) in interpolated.values().iter().zip(full.values()) {
        assert!((a - b).abs() < 1e-9);
    }
}

#[rstest]
fn interpolation_drops_or_keeps_nan() {
    // two corners of a square, the other two cannot be interpolated linearly
    let sample = ScalarFieldSample::new(
        "corners",
        vec![1.0, 2.0],
        vec![0.1, 0.1],
        vec![0.0, 1.0],
        vec![0.0, 1.0],
        vec![0.0, 0.0],
    )
    .unwrap();

    let dropped = sample
        .interpolated_sample(InterpolationMethod::Linear, false, 0.01, Criterion::MinError)
        .unwrap();
    assert_eq!(dropped.len(), 2);

    let kept = sample
        .interpolated_sample(InterpolationMethod::Linear, true, 0.01, Criterion::MinError)
        .unwrap();
    assert_eq!(kept.len(), 4);
    assert_eq!(kept.values().iter().filter(|v| v.is_nan()).count(), 2);

    let empty = ScalarFieldSample::default();
    assert!(matches!(
        empty.interpolated_sample(InterpolationMethod::Linear, true, 0.01, Criterion::MinError),
        Err(Error::EmptySample(_))
    ));
}

#[rstest]
fn export_forms(first: ScalarFieldSample) {
    match first.export(ExportForm::MDHistoWorkspace).unwrap() {
        Export::Histogram(grid) => {
            assert_eq!(grid.shape(), [4, 1, 1]);
            assert_eq!(grid.dimensions[0].min, -0.5);
            assert_eq!(grid.dimensions[0].max, 3.5);
            assert_eq!(grid.signal, first.values());
        }
        Export::Csv(_) => panic!("expected a histogram grid"),
    }

    match first.export(ExportForm::Csv).unwrap() {
        Export::Csv(text) => {
            assert!(text.starts_with("x,y,z,value,error\n"));
            assert_eq!(text.lines().count(), 5);
        }
        Export::Histogram(_) => panic!("expected csv text"),
    }
}
