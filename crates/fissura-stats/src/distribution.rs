//! p-values and critical values from the standard reference distributions.
//!
//! Thin wrappers over [`statrs`] that keep the rest of the workspace free of
//! distribution-parameter plumbing. All functions return `Option` and yield
//! `None` when the parameters are out of the distribution's domain (e.g. a
//! non-positive degree of freedom), never panicking.

use statrs::distribution::{ChiSquared, ContinuousCDF, FisherSnedecor, Normal, StudentsT};

/// Standard normal CDF `Φ(z)`.
#[must_use]
pub fn normal_cdf(z: f64) -> f64 {
    // The standard normal parameters are always valid.
    Normal::new(0.0, 1.0).map_or(f64::NAN, |d| d.cdf(z))
}

/// Two-tailed p-value for a standard normal test statistic.
///
/// # Examples
///
/// ```
/// use fissura_stats::distribution::two_tailed_p_from_z;
///
/// let p = two_tailed_p_from_z(1.96);
/// assert!((p - 0.05).abs() < 1e-3);
/// ```
#[must_use]
pub fn two_tailed_p_from_z(z: f64) -> f64 {
    (2.0 * (1.0 - normal_cdf(z.abs()))).clamp(0.0, 1.0)
}

/// Two-tailed p-value for a Student's t statistic with `df` degrees of
/// freedom. Returns `None` for `df <= 0`.
#[must_use]
pub fn two_tailed_p_from_t(t: f64, df: f64) -> Option<f64> {
    let dist = StudentsT::new(0.0, 1.0, df).ok()?;
    Some((2.0 * (1.0 - dist.cdf(t.abs()))).clamp(0.0, 1.0))
}

/// Two-sided critical value of the standard normal distribution at the given
/// confidence level (e.g. `0.95` gives roughly `1.96`).
#[must_use]
pub fn z_critical(confidence: f64) -> f64 {
    Normal::new(0.0, 1.0)
        .map_or(f64::NAN, |d| d.inverse_cdf(1.0 - (1.0 - confidence) / 2.0))
}

/// Two-sided critical value of Student's t at the given confidence level.
/// Returns `None` for `df <= 0`.
///
/// # Examples
///
/// ```
/// use fissura_stats::distribution::t_critical;
///
/// let t = t_critical(0.95, 10.0).unwrap();
/// assert!((t - 2.228).abs() < 1e-3);
/// ```
#[must_use]
pub fn t_critical(confidence: f64, df: f64) -> Option<f64> {
    let dist = StudentsT::new(0.0, 1.0, df).ok()?;
    Some(dist.inverse_cdf(1.0 - (1.0 - confidence) / 2.0))
}

/// Survival function of the F distribution: `P(F > f)` with `df1`/`df2`
/// degrees of freedom. Returns `None` for non-positive degrees of freedom.
#[must_use]
pub fn f_sf(f: f64, df1: f64, df2: f64) -> Option<f64> {
    let dist = FisherSnedecor::new(df1, df2).ok()?;
    Some((1.0 - dist.cdf(f.max(0.0))).clamp(0.0, 1.0))
}

/// Survival function of the chi-squared distribution: `P(X² > x)`. Returns
/// `None` for `df <= 0`.
#[must_use]
pub fn chi_squared_sf(x: f64, df: f64) -> Option<f64> {
    let dist = ChiSquared::new(df).ok()?;
    Some((1.0 - dist.cdf(x.max(0.0))).clamp(0.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normal_cdf_at_zero_is_half() {
        assert!((normal_cdf(0.0) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn z_and_t_critical_values_match_tables() {
        assert!((z_critical(0.95) - 1.959_96).abs() < 1e-4);
        assert!((z_critical(0.99) - 2.575_83).abs() < 1e-4);
        assert!((t_critical(0.95, 5.0).unwrap() - 2.570_58).abs() < 1e-4);
    }

    #[test]
    fn t_converges_to_z_for_large_df() {
        let p_t = two_tailed_p_from_t(2.0, 1000.0).unwrap();
        let p_z = two_tailed_p_from_z(2.0);
        assert!((p_t - p_z).abs() < 1e-3);
    }

    #[test]
    fn invalid_degrees_of_freedom_yield_none() {
        assert_eq!(two_tailed_p_from_t(1.0, 0.0), None);
        assert_eq!(f_sf(1.0, 0.0, 5.0), None);
        assert_eq!(chi_squared_sf(1.0, -1.0), None);
    }

    #[test]
    fn f_survival_matches_table_value() {
        // F(2, 12) upper 5% point is about 3.885.
        let p = f_sf(3.885, 2.0, 12.0).unwrap();
        assert!((p - 0.05).abs() < 1e-3);
    }

    #[test]
    fn chi_squared_survival_matches_table_value() {
        // Chi-squared with 3 df: upper 5% point is about 7.815.
        let p = chi_squared_sf(7.815, 3.0).unwrap();
        assert!((p - 0.05).abs() < 1e-3);
    }
}
