use crate::error::{Error, Result};

/// Evenly spaced values within the half-open interval `[start, stop)`
///
/// The number of values is `ceil((stop - start) / step)`, so `stop` itself is
/// never included. This is the usual way of generating histogram bin edges
/// from a minimum, a maximum, and a constant bin width.
///
/// ```rust
/// # use hidra_utils::arange;
/// assert_eq!(arange(0.0, 1.0, 0.25), Ok(vec![0.0, 0.25, 0.5, 0.75]));
/// assert_eq!(arange(0.0, 1.1, 0.5), Ok(vec![0.0, 0.5, 1.0]));
///
/// // Bad inputs are an error
/// assert!(arange(0.0, 1.0, 0.0).is_err());
/// assert!(arange(1.0, 0.0, 0.1).is_err());
/// ```
pub fn arange(start: f64, stop: f64, step: f64) -> Result<Vec<f64>> {
    if !step.is_finite() || step <= 0.0 {
        return Err(Error::InvalidStep { step });
    }

    if !start.is_finite() || !stop.is_finite() || start >= stop {
        return Err(Error::InvalidBounds { start, stop });
    }

    let n = ((stop - start) / step).ceil() as usize;
    Ok((0..n).map(|i| start + i as f64 * step).collect())
}

/// `num` evenly spaced values over the closed interval `[start, stop]`
///
/// Both end points are included, so `num` values describe `num - 1` equal
/// width bins.
///
/// ```rust
/// # use hidra_utils::linspace;
/// assert_eq!(linspace(0.0, 1.0, 5), Ok(vec![0.0, 0.25, 0.5, 0.75, 1.0]));
/// assert_eq!(linspace(2.0, 2.0, 1), Ok(vec![2.0]));
/// assert!(linspace(0.0, 1.0, 0).is_err());
/// ```
pub fn linspace(start: f64, stop: f64, num: usize) -> Result<Vec<f64>> {
    if !start.is_finite() || !stop.is_finite() || start > stop {
        return Err(Error::InvalidBounds { start, stop });
    }

    match num {
        0 => Err(Error::BelowMinimumSliceLength {
            length: 0,
            minimum_required: 1,
        }),
        1 => Ok(vec![start]),
        _ => {
            let step = (stop - start) / (num - 1) as f64;
            let mut values: Vec<f64> = (0..num).map(|i| start + i as f64 * step).collect();
            // avoid accumulated rounding on the final edge
            values[num - 1] = stop;
            Ok(values)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(10.0, 20.0, 1.0, 10)]
    #[case(10.0, 20.0, 3.0, 4)]
    #[case(-5.0, 5.0, 0.5, 20)]
    fn arange_lengths(#[case] start: f64, #[case] stop: f64, #[case] step: f64, #[case] n: usize) {
        let values = arange(start, stop, step).unwrap();
        assert_eq!(values.len(), n);
        assert_eq!(values[0], start);
        assert!(*values.last().unwrap() < stop);
    }

    #[test]
    fn linspace_end_points() {
        let values = linspace(0.3, 0.9, 7).unwrap();
        assert_eq!(values.len(), 7);
        assert_eq!(values[0], 0.3);
        assert_eq!(values[6], 0.9);
    }
}
