use crate::error::{Error, Result};

/// Extends functionality for slices of float arrays
pub trait SliceExt<T> {
    /// Find the minimum value in float arrays
    ///
    /// Only provides the minimum value from a collection of valid numbers. Any
    /// NAN values, infinite values, or empty slices will return an error.
    ///
    /// ```rust
    /// # use hidra_utils::SliceExt;
    /// # use hidra_utils::Error;
    /// // Successful cases
    /// assert_eq!([1.1, 0.5, 2.2].try_min(), Ok(0.5));
    /// assert_eq!([1.1, f64::MIN, 2.2].try_min(), Ok(f64::MIN));
    ///
    /// // Error cases
    /// assert_eq!([1.1, f64::NAN, 2.2].try_min(), Err(Error::SliceContainsUndefinedValues));
    /// assert_eq!([1.1, f64::INFINITY, 2.2].try_min(), Err(Error::SliceContainsUndefinedValues));
    /// assert_eq!(Vec::<f64>::new().try_min(), Err(Error::SliceContainsNoValues));
    /// ```
    ///
    /// The float primitives do not implement `Ord` due to `NaN` being
    /// incomparable, so this uses `total_cmp` for an ordering in accordance to
    /// the totalOrder predicate of IEEE 754 (2008 revision).
    fn try_min(&self) -> Result<T>;

    /// Find the maximum value in float arrays
    ///
    /// Only provides the maximum value from a collection of valid numbers. Any
    /// NAN values, infinite values, or empty slices will return an error.
    ///
    /// ```rust
    /// # use hidra_utils::SliceExt;
    /// # use hidra_utils::Error;
    /// // Successful cases
    /// assert_eq!([1.1, 0.5, 2.2].try_max(), Ok(2.2));
    /// assert_eq!([1.1, f64::MAX, 2.2].try_max(), Ok(f64::MAX));
    ///
    /// // Error cases
    /// assert_eq!([1.1, f64::NAN, 2.2].try_max(), Err(Error::SliceContainsUndefinedValues));
    /// assert_eq!(Vec::<f64>::new().try_max(), Err(Error::SliceContainsNoValues));
    /// ```
    fn try_max(&self) -> Result<T>;

    /// Minimum and maximum of only the finite values
    ///
    /// Undefined values are skipped rather than treated as an error, which is
    /// what is needed for d-spacing arrays where pixels at 2θ=0 are infinite.
    ///
    /// ```rust
    /// # use hidra_utils::SliceExt;
    /// assert_eq!([2.0, f64::INFINITY, 0.5, f64::NAN].try_finite_range(), Ok((0.5, 2.0)));
    /// assert!([f64::NAN, f64::INFINITY].try_finite_range().is_err());
    /// ```
    fn try_finite_range(&self) -> Result<(T, T)>;

    /// Find index bin containing 'value', where bins are low <= value < high
    ///
    /// A value on a bin edge returns the bin above. Values equal to the highest
    /// bound are considered part of the last bin, which is the usual
    /// histogram-by-weight convention.
    ///
    /// Bin edges must be in ascending order.
    ///
    /// ```text
    ///     edges: 0.0 0.1 1.0 20.0
    ///
    ///     0.0 <= bin 0 < 0.1
    ///     0.1 <= bin 1 < 1.0
    ///     1.0 <= bin 2 <= 20.0
    /// ```
    ///
    /// ```rust
    /// # use hidra_utils::SliceExt;
    /// let bounds = vec![0.0, 0.1, 1.0, 20.0];
    ///
    /// // Find values in the array
    /// assert_eq!(bounds.find_bin_exclusive(0.0 ), Ok(0));
    /// assert_eq!(bounds.find_bin_exclusive(0.5 ), Ok(1));
    /// assert_eq!(bounds.find_bin_exclusive(1.0 ), Ok(2));
    /// assert_eq!(bounds.find_bin_exclusive(20.0), Ok(2));
    ///
    /// // Values outside the bin bounds are an error case
    /// assert!(bounds.find_bin_exclusive(-1.0).is_err());
    /// assert!(bounds.find_bin_exclusive(21.0).is_err());
    /// assert!(bounds.find_bin_exclusive(f64::NAN).is_err());
    /// ```
    fn find_bin_exclusive(&self, value: T) -> Result<usize>;

    /// Sorted unique values, merging any that lie within `tolerance`
    ///
    /// Values are sorted and consecutive values no further apart than the
    /// tolerance are chained into one group. Each group is represented by its
    /// mean. Non-finite values are ignored.
    ///
    /// ```rust
    /// # use hidra_utils::SliceExt;
    /// let values = [1.0, 0.0, 0.001, 2.0, 1.002, 0.0];
    /// assert_eq!(values.unique_within(0.01).len(), 3);
    /// assert_eq!(values.unique_within(0.0).len(), 5);
    /// ```
    fn unique_within(&self, tolerance: T) -> Vec<T>;
}

impl SliceExt<f64> for [f64] {
    fn try_min(&self) -> Result<f64> {
        if self.iter().any(|v| !v.is_finite()) {
            return Err(Error::SliceContainsUndefinedValues);
        };

        if let Some(v) = self.iter().min_by(|a, b| a.total_cmp(b)).copied() {
            Ok(v)
        } else {
            Err(Error::SliceContainsNoValues)
        }
    }

    fn try_max(&self) -> Result<f64> {
        if self.iter().any(|v| !v.is_finite()) {
            return Err(Error::SliceContainsUndefinedValues);
        };

        if let Some(v) = self.iter().max_by(|a, b| a.total_cmp(b)).copied() {
            Ok(v)
        } else {
            Err(Error::SliceContainsNoValues)
        }
    }

    fn try_finite_range(&self) -> Result<(f64, f64)> {
        let mut finite = self.iter().filter(|v| v.is_finite());

        let first = match finite.next() {
            Some(v) => *v,
            None => return Err(Error::SliceContainsNoValues),
        };

        Ok(finite.fold((first, first), |(lo, hi), v| (lo.min(*v), hi.max(*v))))
    }

    fn find_bin_exclusive(&self, value: f64) -> Result<usize> {
        // make sure there are bin edges to check against
        let n = self.len();
        if n < 2 {
            return Err(Error::BelowMinimumSliceLength {
                length: n,
                minimum_required: 2,
            });
        }

        let lower_bound = self[0];
        let upper_bound = self[n - 1];

        // is the value relevant? (comparisons with NAN are always false)
        if !(value >= lower_bound && value <= upper_bound) {
            return Err(Error::ValueOutsideOfBounds {
                value,
                lower_bound,
                upper_bound,
            });
        }

        // special case for being on the upper edge
        if value == upper_bound {
            return Ok(n - 2);
        }

        // number of edges <= value, the bin is the one starting at the last
        Ok(self.partition_point(|edge| *edge <= value) - 1)
    }

    fn unique_within(&self, tolerance: f64) -> Vec<f64> {
        let mut sorted: Vec<f64> = self.iter().copied().filter(|v| v.is_finite()).collect();
        sorted.sort_by(|a, b| a.total_cmp(b));

        let mut unique = Vec::new();
        let mut group: Vec<f64> = Vec::new();

        for value in sorted {
            if let Some(last) = group.last() {
                if value - last > tolerance {
                    unique.push(group.iter().sum::<f64>() / group.len() as f64);
                    group.clear();
                }
            }
            group.push(value);
        }

        if !group.is_empty() {
            unique.push(group.iter().sum::<f64>() / group.len() as f64);
        }

        unique
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(10.0, 0)]
    #[case(10.5, 0)]
    #[case(11.0, 1)]
    #[case(13.999, 3)]
    #[case(14.0, 3)]
    fn histogram_bins(#[case] value: f64, #[case] expected: usize) {
        let edges = [10.0, 11.0, 12.0, 13.0, 14.0];
        assert_eq!(edges.find_bin_exclusive(value), Ok(expected));
    }

    #[test]
    fn unique_chains_close_values() {
        let values = [0.0, 0.009, 0.018, 1.0];
        let unique = values.unique_within(0.01);
        assert_eq!(unique.len(), 2);
        assert!((unique[0] - 0.009).abs() < 1e-12);
        assert_eq!(unique[1], 1.0);
    }
}
