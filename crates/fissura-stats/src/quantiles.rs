//! Empirical quantiles and IQR fences.
//!
//! Quantiles use the lower empirical estimate: the value at index
//! `floor(q * (n - 1))` of the sorted sample. This keeps every quantile an
//! observed data point, which matters for small structural-inspection samples
//! where interpolated quantiles would invent measurements that were never
//! taken.

/// Multiplier applied to the IQR when computing outlier fences.
pub const IQR_FENCE_FACTOR: f64 = 1.5;

/// Computes a single quantile from pre-sorted values.
///
/// # Arguments
///
/// * `sorted` - Values sorted in ascending order
/// * `q` - The quantile to compute, in `[0.0, 1.0]`
///
/// # Returns
///
/// The value at the quantile, or `None` if the input is empty.
///
/// # Examples
///
/// ```
/// use fissura_stats::quantiles::quantile;
///
/// let values = [1.0, 2.0, 100.0];
/// assert_eq!(quantile(&values, 0.25), Some(1.0));
/// assert_eq!(quantile(&values, 0.5), Some(2.0));
/// assert_eq!(quantile(&values, 0.75), Some(2.0));
/// ```
#[expect(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
#[must_use]
pub fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    debug_assert!(sorted.is_sorted_by(|a, b| a <= b), "values must be sorted");
    let idx = (q.clamp(0.0, 1.0) * ((sorted.len() - 1) as f64)).floor() as usize;
    Some(sorted[idx.min(sorted.len() - 1)])
}

/// First quartile, median, and third quartile of a sorted sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quartiles {
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
}

impl Quartiles {
    /// Computes quartiles from pre-sorted values. Returns `None` on empty input.
    #[must_use]
    pub fn from_sorted(sorted: &[f64]) -> Option<Self> {
        Some(Self {
            q1: quantile(sorted, 0.25)?,
            median: quantile(sorted, 0.5)?,
            q3: quantile(sorted, 0.75)?,
        })
    }

    /// The interquartile range `q3 - q1`.
    #[must_use]
    pub fn iqr(&self) -> f64 {
        self.q3 - self.q1
    }

    /// The Tukey fences `[q1 - 1.5·IQR, q3 + 1.5·IQR]` used both for outlier
    /// flagging and build-time value capping.
    #[must_use]
    pub fn fences(&self) -> (f64, f64) {
        let spread = IQR_FENCE_FACTOR * self.iqr();
        (self.q1 - spread, self.q3 + spread)
    }
}

/// Sorts a copy of `values` ascending, ignoring nothing: callers are expected
/// to have removed non-finite values already.
#[must_use]
pub fn sorted_copy(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    sorted
}
