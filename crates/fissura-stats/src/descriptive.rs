//! Descriptive statistics for numeric measurement columns.

use crate::quantiles::{Quartiles, sorted_copy};

/// Summary statistics for one numeric sample.
///
/// Variance and standard deviation use the sample (`n - 1`) denominator;
/// skewness and kurtosis use population moments, matching the conventions of
/// the upstream inspection tooling this pipeline replaces. `kurtosis` is the
/// excess kurtosis (normal distribution = 0).
#[derive(Debug, Clone, PartialEq)]
pub struct DescriptiveStats {
    pub n: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
    /// Most frequent value; ties resolve to the smallest value.
    pub mode: f64,
    pub variance: f64,
    pub std_dev: f64,
    pub range: f64,
    pub iqr: f64,
    /// Coefficient of variation `std_dev / mean`; `None` when the mean is zero.
    pub cv: Option<f64>,
    pub skewness: f64,
    pub kurtosis: f64,
}

impl DescriptiveStats {
    /// Computes descriptive statistics from unsorted values.
    ///
    /// Returns `None` on empty input.
    ///
    /// # Examples
    ///
    /// ```
    /// use fissura_stats::descriptive::DescriptiveStats;
    ///
    /// let stats = DescriptiveStats::new(&[2.0, 1.0, 3.0, 2.0]).unwrap();
    /// assert_eq!(stats.mean, 2.0);
    /// assert_eq!(stats.mode, 2.0);
    /// assert_eq!(stats.min, 1.0);
    /// ```
    #[must_use]
    pub fn new(values: &[f64]) -> Option<Self> {
        Self::from_sorted(&sorted_copy(values))
    }

    /// Computes descriptive statistics from pre-sorted values, skipping the
    /// sort. Returns `None` on empty input.
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn from_sorted(sorted: &[f64]) -> Option<Self> {
        debug_assert!(sorted.is_sorted_by(|a, b| a <= b), "values must be sorted");
        let n = sorted.len();
        let min = *sorted.first()?;
        let max = *sorted.last()?;
        let len = n as f64;
        let mean = sorted.iter().sum::<f64>() / len;

        let m2 = central_moment(sorted, mean, 2);
        let variance = if n > 1 {
            sorted.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (len - 1.0)
        } else {
            0.0
        };
        let std_dev = variance.sqrt();

        let (skewness, kurtosis) = if m2 > 0.0 {
            let m3 = central_moment(sorted, mean, 3);
            let m4 = central_moment(sorted, mean, 4);
            (m3 / m2.powf(1.5), m4 / (m2 * m2) - 3.0)
        } else {
            (0.0, 0.0)
        };

        let quartiles = Quartiles::from_sorted(sorted)?;
        let cv = if mean == 0.0 { None } else { Some(std_dev / mean) };

        Some(Self {
            n,
            min,
            max,
            mean,
            median: quartiles.median,
            mode: mode_of_sorted(sorted),
            variance,
            std_dev,
            range: max - min,
            iqr: quartiles.iqr(),
            cv,
            skewness,
            kurtosis,
        })
    }

    /// Classifies the distribution shape from skewness and excess kurtosis.
    #[must_use]
    pub fn shape(&self) -> DistributionShape {
        DistributionShape {
            symmetry: Symmetry::classify(self.skewness),
            tails: TailWeight::classify(self.kurtosis),
        }
    }
}

/// Skewness/kurtosis shape classification for a numeric column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DistributionShape {
    pub symmetry: Symmetry,
    pub tails: TailWeight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Symmetry {
    Symmetric,
    RightSkewed,
    LeftSkewed,
}

impl Symmetry {
    /// `|skew| < 0.5` is symmetric; the sign decides the tail direction
    /// otherwise.
    #[must_use]
    pub fn classify(skewness: f64) -> Self {
        if skewness.abs() < 0.5 {
            Self::Symmetric
        } else if skewness > 0.0 {
            Self::RightSkewed
        } else {
            Self::LeftSkewed
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TailWeight {
    /// Excess kurtosis above 0.5: heavy tails.
    Leptokurtic,
    /// Excess kurtosis below -0.5: light tails.
    Platykurtic,
    /// Normal-like tails.
    Mesokurtic,
}

impl TailWeight {
    #[must_use]
    pub fn classify(excess_kurtosis: f64) -> Self {
        if excess_kurtosis > 0.5 {
            Self::Leptokurtic
        } else if excess_kurtosis < -0.5 {
            Self::Platykurtic
        } else {
            Self::Mesokurtic
        }
    }
}

#[expect(clippy::cast_precision_loss)]
fn central_moment(values: &[f64], mean: f64, order: i32) -> f64 {
    values.iter().map(|v| (v - mean).powi(order)).sum::<f64>() / (values.len() as f64)
}

/// Most frequent value of a sorted sample; ties resolve to the smallest value.
fn mode_of_sorted(sorted: &[f64]) -> f64 {
    let mut best = sorted[0];
    let mut best_count = 0usize;
    let mut i = 0;
    while i < sorted.len() {
        let mut j = i;
        while j < sorted.len() && sorted[j] == sorted[i] {
            j += 1;
        }
        if j - i > best_count {
            best_count = j - i;
            best = sorted[i];
        }
        i = j;
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{a} != {b}");
    }

    #[test]
    fn empty_sample_yields_none() {
        assert_eq!(DescriptiveStats::new(&[]), None);
    }

    #[test]
    fn basic_moments() {
        let stats = DescriptiveStats::new(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        close(stats.mean, 5.0);
        // Population m2 = 4, sample variance = 32/7.
        close(stats.variance, 32.0 / 7.0);
        assert_eq!(stats.mode, 4.0);
        assert_eq!(stats.range, 7.0);
    }

    #[test]
    fn single_value_sample() {
        let stats = DescriptiveStats::new(&[3.5]).unwrap();
        assert_eq!(stats.n, 1);
        assert_eq!(stats.variance, 0.0);
        assert_eq!(stats.skewness, 0.0);
        assert_eq!(stats.cv, Some(0.0));
        assert_eq!(stats.shape().symmetry, Symmetry::Symmetric);
    }

    #[test]
    fn right_skew_is_detected() {
        let stats = DescriptiveStats::new(&[1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 10.0]).unwrap();
        assert!(stats.skewness > 0.5);
        assert_eq!(stats.shape().symmetry, Symmetry::RightSkewed);
        assert_eq!(stats.shape().tails, TailWeight::Leptokurtic);
    }

    #[test]
    fn mode_ties_pick_smallest() {
        let stats = DescriptiveStats::new(&[5.0, 1.0, 5.0, 1.0, 3.0]).unwrap();
        assert_eq!(stats.mode, 1.0);
    }

    #[test]
    fn cv_is_none_for_zero_mean() {
        let stats = DescriptiveStats::new(&[-1.0, 1.0]).unwrap();
        assert_eq!(stats.cv, None);
    }
}
