//! Histogram-by-weight binning of pixel values

// crate modules
use crate::error::{Error, Result};

// hidra modules
use hidra_utils::SliceExt;

// external crates
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Treatment of bins that no pixel falls into when normalising
///
/// Summed intensities are divided by the number of pixels in each bin. A bin
/// with no pixels would otherwise divide by zero.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NormalisationPolicy {
    /// Bins with fewer than 0.1 pixels count as one more pixel
    ///
    /// Empty bins stay at zero intensity and sparse bins are biased low rather
    /// than producing NaN or infinity.
    #[default]
    TreatEmptyAsOne,
    /// Empty bins become NaN
    Nan,
}

/// Sum `weights` into the bins defined by `edges`
///
/// Bins are half-open, `low <= x < high`, except the final bin which also
/// includes its upper edge. Values outside of the edges (or NaN) are ignored.
///
/// ```rust
/// # use hidra_reduce::histogram;
/// let edges = [0.0, 1.0, 2.0, 3.0];
/// let positions = [0.5, 1.0, 1.5, 3.0, 7.0];
/// let weights = [1.0, 2.0, 3.0, 4.0, 5.0];
///
/// let hist = histogram(&positions, &weights, &edges).unwrap();
/// assert_eq!(hist, vec![1.0, 5.0, 4.0]);
/// ```
pub fn histogram(positions: &[f64], weights: &[f64], edges: &[f64]) -> Result<Vec<f64>> {
    if positions.len() != weights.len() {
        return Err(Error::ShapeMismatch {
            quantity: "histogram weights".to_string(),
            expected: positions.len(),
            found: weights.len(),
        });
    }

    if edges.len() < 2 {
        return Err(Error::ShapeMismatch {
            quantity: "histogram bin edges".to_string(),
            expected: 2,
            found: edges.len(),
        });
    }

    let n_bins = edges.len() - 1;

    let hist = positions
        .par_iter()
        .zip(weights.par_iter())
        .fold(
            || vec![0.0; n_bins],
            |mut acc, (p, w)| {
                if let Ok(i) = edges.find_bin_exclusive(*p) {
                    acc[i] += w;
                }
                acc
            },
        )
        .reduce(
            || vec![0.0; n_bins],
            |mut a, b| {
                a.iter_mut().zip(b).for_each(|(x, y)| *x += y);
                a
            },
        );

    Ok(hist)
}

/// Divide each bin by the number of pixels that landed in it
///
/// `pixels` is the histogram of the same positions with unit weights.
pub fn normalise_by_pixels(
    intensity: &mut [f64],
    pixels: &[f64],
    policy: NormalisationPolicy,
) -> Result<()> {
    if intensity.len() != pixels.len() {
        return Err(Error::ShapeMismatch {
            quantity: "pixel count histogram".to_string(),
            expected: intensity.len(),
            found: pixels.len(),
        });
    }

    for (value, count) in intensity.iter_mut().zip(pixels) {
        *value = match policy {
            NormalisationPolicy::TreatEmptyAsOne if *count < 0.1 => *value / (count + 1.0),
            NormalisationPolicy::Nan if *count < 0.1 => f64::NAN,
            _ => *value / count,
        };
    }

    Ok(())
}

/// Convert bin edges into bin centres
///
/// The edges are shifted up by half of the first bin width and the trailing
/// edge is dropped, so the result has one value per bin.
///
/// ```rust
/// # use hidra_reduce::bin_centres;
/// assert_eq!(bin_centres(&[0.0, 1.0, 2.0, 3.0]), vec![0.5, 1.5, 2.5]);
/// assert!(bin_centres(&[1.0]).is_empty());
/// ```
pub fn bin_centres(edges: &[f64]) -> Vec<f64> {
    if edges.len() < 2 {
        return Vec::new();
    }

    let half_width = 0.5 * (edges[1] - edges[0]);
    edges[..edges.len() - 1]
        .iter()
        .map(|e| e + half_width)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn mismatched_weights() {
        let result = histogram(&[1.0, 2.0], &[1.0], &[0.0, 3.0]);
        assert!(matches!(result, Err(Error::ShapeMismatch { .. })));
    }

    #[test]
    fn last_bin_is_closed() {
        let hist = histogram(&[0.0, 2.0, 2.0], &[1.0, 1.0, 1.0], &[0.0, 1.0, 2.0]).unwrap();
        assert_eq!(hist, vec![1.0, 2.0]);
    }

    #[rstest]
    #[case(NormalisationPolicy::TreatEmptyAsOne, vec![2.0, 0.0, 3.0])]
    #[case(NormalisationPolicy::Nan, vec![2.0, f64::NAN, 3.0])]
    fn empty_bin_policies(#[case] policy: NormalisationPolicy, #[case] expected: Vec<f64>) {
        let mut intensity = vec![4.0, 0.0, 3.0];
        normalise_by_pixels(&mut intensity, &[2.0, 0.0, 1.0], policy).unwrap();

        for (a, b) in intensity.iter().zip(expected.iter()) {
            assert!(a == b || (a.is_nan() && b.is_nan()));
        }
    }
}
