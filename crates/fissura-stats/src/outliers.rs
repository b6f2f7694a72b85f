//! Multi-method outlier scans over numeric columns.
//!
//! Three independent methods run per column: the classical z-score (needs a
//! non-degenerate standard deviation and a reasonable sample size), the
//! IQR/Tukey-fence rule, and the robust modified z-score built on the median
//! absolute deviation.

use crate::descriptive::DescriptiveStats;
use crate::quantiles::{Quartiles, quantile, sorted_copy};

/// z-score magnitude above which a value is flagged.
pub const Z_SCORE_THRESHOLD: f64 = 3.0;
/// Modified z-score magnitude above which a value is flagged.
pub const MODIFIED_Z_THRESHOLD: f64 = 3.5;
/// Consistency constant relating the MAD to the normal standard deviation.
pub const MAD_SCALE: f64 = 0.6745;
/// Below this sample size the z-score method is reported but flagged
/// non-authoritative: with so few points the sample mean and standard
/// deviation are dominated by the outlier itself.
pub const Z_SCORE_MIN_POWER_N: usize = 8;

/// Flagged values for one detection method.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodReport {
    pub count: usize,
    pub percentage: f64,
    pub values: Vec<f64>,
}

/// Overall outlier impact, driven by the z-score flag share.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutlierImpact {
    /// z-outliers exceed 5% of the sample.
    High,
    /// z-outliers exceed 1% of the sample.
    Moderate,
    Low,
}

/// Results of all three methods over one column.
#[derive(Debug, Clone, PartialEq)]
pub struct OutlierScan {
    pub n: usize,
    /// `None` when the standard deviation is zero.
    pub z_score: Option<MethodReport>,
    pub iqr: MethodReport,
    /// `None` when the MAD is zero (over half the sample sits on the median).
    pub modified_z: Option<MethodReport>,
    pub impact: OutlierImpact,
    /// False below [`Z_SCORE_MIN_POWER_N`]; the z-score report is still
    /// produced but should not be treated as conclusive.
    pub z_score_authoritative: bool,
}

impl OutlierScan {
    /// Scans `values` with all three methods. Returns `None` on empty input.
    ///
    /// # Examples
    ///
    /// ```
    /// use fissura_stats::outliers::OutlierScan;
    ///
    /// let scan = OutlierScan::new(&[1.0, 2.0, 100.0]).unwrap();
    /// assert_eq!(scan.iqr.values, vec![100.0]);
    /// assert!(!scan.z_score_authoritative); // n = 3 < 8
    /// ```
    #[must_use]
    pub fn new(values: &[f64]) -> Option<Self> {
        let sorted = sorted_copy(values);
        let stats = DescriptiveStats::from_sorted(&sorted)?;
        let n = stats.n;

        let z_score = (stats.std_dev > 0.0).then(|| {
            flag(values, n, |v| {
                ((v - stats.mean) / stats.std_dev).abs() > Z_SCORE_THRESHOLD
            })
        });

        let quartiles = Quartiles::from_sorted(&sorted)?;
        let (lo, hi) = quartiles.fences();
        let iqr = flag(values, n, |v| v < lo || v > hi);

        let modified_z = modified_z_report(values, &sorted, n);

        let impact = match &z_score {
            Some(report) if report.percentage > 5.0 => OutlierImpact::High,
            Some(report) if report.percentage > 1.0 => OutlierImpact::Moderate,
            _ => OutlierImpact::Low,
        };

        Some(Self {
            n,
            z_score,
            iqr,
            modified_z,
            impact,
            z_score_authoritative: n >= Z_SCORE_MIN_POWER_N,
        })
    }
}

#[expect(clippy::cast_precision_loss)]
fn flag<F>(values: &[f64], n: usize, mut is_outlier: F) -> MethodReport
where
    F: FnMut(f64) -> bool,
{
    let flagged: Vec<f64> = values.iter().copied().filter(|&v| is_outlier(v)).collect();
    MethodReport {
        count: flagged.len(),
        percentage: (flagged.len() as f64) / (n as f64) * 100.0,
        values: flagged,
    }
}

fn modified_z_report(values: &[f64], sorted: &[f64], n: usize) -> Option<MethodReport> {
    let median = quantile(sorted, 0.5)?;
    let abs_dev = sorted_copy(&values.iter().map(|v| (v - median).abs()).collect::<Vec<_>>());
    let mad = quantile(&abs_dev, 0.5)?;
    if mad <= 0.0 {
        return None;
    }
    Some(flag(values, n, |v| {
        (MAD_SCALE * (v - median) / mad).abs() > MODIFIED_Z_THRESHOLD
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_yields_none() {
        assert_eq!(OutlierScan::new(&[]), None);
    }

    #[test]
    fn iqr_flags_the_extreme_width_on_tiny_sample() {
        // Crack widths 1, 2, 100 (ratio 1.0): the IQR fences flag 100; the
        // z-score method finds nothing at n = 3 and is marked low-power.
        let scan = OutlierScan::new(&[1.0, 2.0, 100.0]).unwrap();
        assert_eq!(scan.iqr.count, 1);
        assert_eq!(scan.iqr.values, vec![100.0]);
        let z = scan.z_score.unwrap();
        assert_eq!(z.count, 0);
        assert!(!scan.z_score_authoritative);
        // The robust method agrees with IQR here.
        assert_eq!(scan.modified_z.unwrap().values, vec![100.0]);
    }

    #[test]
    fn constant_column_has_no_usable_z_or_mad() {
        let scan = OutlierScan::new(&[5.0; 10]).unwrap();
        assert!(scan.z_score.is_none());
        assert!(scan.modified_z.is_none());
        assert_eq!(scan.iqr.count, 0);
        assert_eq!(scan.impact, OutlierImpact::Low);
    }

    #[test]
    fn clean_normalish_sample_reports_low_impact() {
        let values: Vec<f64> = (0..100).map(|i| f64::from(i % 10)).collect();
        let scan = OutlierScan::new(&values).unwrap();
        assert_eq!(scan.z_score.as_ref().unwrap().count, 0);
        assert_eq!(scan.impact, OutlierImpact::Low);
        assert!(scan.z_score_authoritative);
    }

    #[test]
    fn exactly_one_percent_flagged_stays_low_impact() {
        let mut values = vec![10.0; 99];
        values[0] = 10.5;
        values.push(1000.0);
        let scan = OutlierScan::new(&values).unwrap();
        let z = scan.z_score.as_ref().unwrap();
        assert_eq!(z.count, 1);
        assert!((z.percentage - 1.0).abs() < 1e-9);
        // Exactly 1% is not strictly greater than 1%.
        assert_eq!(scan.impact, OutlierImpact::Low);
    }
}
