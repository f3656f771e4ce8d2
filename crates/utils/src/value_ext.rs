use crate::f;

/// Extends primitives with formatting and comparison helpers
pub trait ValueExt {
    /// Scientific number formatting with a signed, padded exponent
    ///
    /// Works for anything that can be represented as scientific using the
    /// `LowerExp` trait, which is pretty much every numerical primitive.
    ///
    /// ```rust
    /// # use hidra_utils::ValueExt;
    /// assert_eq!((-1.0_f64).sci(5, 2), "-1.00000e+00".to_string());
    /// assert_eq!((0.00125_f64).sci(3, 2), "1.250e-03".to_string());
    /// ```
    fn sci(&self, precision: usize, exp_pad: usize) -> String
    where
        Self: std::fmt::LowerExp,
    {
        let mut num = f!("{:.precision$e}", &self, precision = precision);
        let exp = match num.find('e') {
            Some(i) => num.split_off(i),
            None => return num,
        };
        let (sign, exp) = match exp.strip_prefix("e-") {
            Some(exp) => ('-', exp),
            None => ('+', &exp[1..]),
        };
        num.push_str(&f!("e{}{:0>pad$}", sign, exp, pad = exp_pad));
        num
    }

    /// Relative and absolute closeness test, `|a - b| <= atol + rtol * |b|`
    ///
    /// NAN values are never close to anything.
    ///
    /// ```rust
    /// # use hidra_utils::ValueExt;
    /// assert!(1.0_f64.is_close(1.0 + 1e-12, 1e-9, 0.0));
    /// assert!(!1.0_f64.is_close(1.1, 1e-9, 0.05));
    /// assert!(0.0_f64.is_close(0.001, 0.0, 0.01));
    /// ```
    fn is_close(&self, other: f64, rtol: f64, atol: f64) -> bool;
}

impl ValueExt for f64 {
    fn is_close(&self, other: f64, rtol: f64, atol: f64) -> bool {
        (self - other).abs() <= atol + rtol * other.abs()
    }
}
