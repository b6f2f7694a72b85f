//! Inferential statistics module.
//!
//! Per numeric column: a sampling summary, a one-sample test against the
//! column's own median (a fixed, reproducible baseline), and confidence
//! intervals at the three standard levels. Dataset-wide: a Welch two-sample
//! test over the two largest severity groups and the uniform goodness-of-fit
//! over severity labels.

use serde::Serialize;

use fissura_stats::{
    descriptive::DescriptiveStats,
    distribution::{t_critical, two_tailed_p_from_t, two_tailed_p_from_z, z_critical},
};

use crate::analytics::variance::uniform_goodness_of_fit;
use crate::dataset::{CategoricalColumn, Dataset, NumericColumn};
use crate::result::{
    ALPHA, ALPHA_STRICT, EffectSize, ModuleError, ModuleOutcome, ModuleSection, StatisticalResult,
};

/// Sample size from which the central limit theorem is assumed to apply and
/// normal-approximation results are reported.
pub const CLT_MIN_N: usize = 30;
/// Confidence levels for the interval estimates.
pub const CONFIDENCE_LEVELS: [f64; 3] = [0.90, 0.95, 0.99];
/// `|d|` above which an effect is called practically significant.
pub const PRACTICAL_D_THRESHOLD: f64 = 0.5;

/// Sampling-distribution summary of one numeric column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SamplingSummary {
    pub n: usize,
    pub mean: f64,
    pub std_dev: f64,
    /// `sd / √n`.
    pub standard_error: f64,
    /// `1.96 · SE`.
    pub margin_of_error_95: f64,
    /// `n ≥ 30`.
    pub central_limit_applies: bool,
    pub conclusion: String,
}

/// Normal-approximation companion to the t-test, reported only when
/// `n ≥ 30`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZTest {
    pub statistic: f64,
    pub p_value: f64,
}

/// One-sample test of the column mean against the column median.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OneSampleTest {
    /// The null value: the column's own median.
    pub null_value: f64,
    pub t_statistic: f64,
    pub df: f64,
    pub p_value: f64,
    pub z_test: Option<ZTest>,
    /// Cohen's d `(mean − median) / sd`.
    pub effect_size: EffectSize,
    pub significant_at_05: bool,
    pub significant_at_01: bool,
    /// `|d| > 0.5`.
    pub practically_significant: bool,
    pub conclusion: String,
}

/// One confidence interval at one level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct IntervalEstimate {
    pub level: f64,
    pub lower: f64,
    pub upper: f64,
    pub margin: f64,
}

/// t- and normal-based interval estimates for a column mean.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfidenceIntervals {
    pub mean: f64,
    pub standard_error: f64,
    pub t_intervals: Vec<IntervalEstimate>,
    /// Reported only when `n ≥ 30`.
    pub normal_intervals: Option<Vec<IntervalEstimate>>,
    pub conclusion: String,
}

/// One side of a two-sample comparison.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupSample {
    pub name: String,
    pub n: usize,
    pub mean: f64,
    pub std_dev: f64,
}

/// Welch two-sample test between the two largest severity groups.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TwoSampleTest {
    pub response: String,
    pub group_a: GroupSample,
    pub group_b: GroupSample,
    pub t_statistic: f64,
    /// Welch–Satterthwaite degrees of freedom.
    pub df: f64,
    pub p_value: f64,
    pub significant: bool,
    /// Pooled Cohen's d.
    pub effect_size: EffectSize,
    pub conclusion: String,
}

/// Runs the whole inferential module over the dataset.
#[must_use]
pub fn analyze(dataset: &Dataset) -> ModuleSection {
    let mut section = ModuleSection::new();

    for column in NumericColumn::ALL {
        let values = dataset.numeric(column);
        section.insert(
            format!("sampling:{}", column.name()),
            ModuleOutcome::from_module(sampling_summary(values).map(StatisticalResult::Sampling)),
        );
        section.insert(
            format!("one_sample:{}", column.name()),
            ModuleOutcome::from_module(
                one_sample_test(column, values).map(StatisticalResult::HypothesisTest),
            ),
        );
        section.insert(
            format!("intervals:{}", column.name()),
            ModuleOutcome::from_module(
                confidence_intervals(column, values).map(StatisticalResult::ConfidenceInterval),
            ),
        );
    }

    section.insert(
        "two_sample:severity".to_owned(),
        ModuleOutcome::from_module(
            two_sample_by_severity(dataset).map(StatisticalResult::TwoSampleTest),
        ),
    );
    section.insert(
        "goodness_of_fit:severity".to_owned(),
        ModuleOutcome::from_module(
            uniform_goodness_of_fit(dataset.categorical(CategoricalColumn::Severity))
                .map(StatisticalResult::GoodnessOfFit),
        ),
    );

    section
}

#[expect(clippy::cast_precision_loss)]
fn sampling_summary(values: &[f64]) -> Result<SamplingSummary, ModuleError> {
    let stats = column_stats(values, 2)?;
    let standard_error = stats.std_dev / (stats.n as f64).sqrt();
    let central_limit_applies = stats.n >= CLT_MIN_N;
    let conclusion = if central_limit_applies {
        format!(
            "n = {} supports the normal approximation; SE = {standard_error:.4}.",
            stats.n,
        )
    } else {
        format!(
            "n = {} is below {CLT_MIN_N}; normal-approximation results are withheld.",
            stats.n,
        )
    };
    Ok(SamplingSummary {
        n: stats.n,
        mean: stats.mean,
        std_dev: stats.std_dev,
        standard_error,
        margin_of_error_95: 1.96 * standard_error,
        central_limit_applies,
        conclusion,
    })
}

#[expect(clippy::cast_precision_loss)]
fn one_sample_test(column: NumericColumn, values: &[f64]) -> Result<OneSampleTest, ModuleError> {
    let stats = column_stats(values, 2)?;
    if stats.std_dev <= 0.0 {
        return Err(ModuleError::DegenerateDistribution {
            column: column.name().to_owned(),
        });
    }
    let n = stats.n as f64;
    let standard_error = stats.std_dev / n.sqrt();
    let t_statistic = (stats.mean - stats.median) / standard_error;
    let df = n - 1.0;
    let p_value = two_tailed_p_from_t(t_statistic, df).ok_or(ModuleError::InsufficientData {
        needed: 2,
        actual: stats.n,
        unit: "rows",
    })?;

    let z_test = (stats.n >= CLT_MIN_N).then(|| ZTest {
        statistic: t_statistic,
        p_value: two_tailed_p_from_z(t_statistic),
    });

    let effect_size = EffectSize::cohens_d((stats.mean - stats.median) / stats.std_dev);
    let significant_at_05 = p_value < ALPHA;
    let significant_at_01 = p_value < ALPHA_STRICT;
    let practically_significant = effect_size.value.abs() > PRACTICAL_D_THRESHOLD;
    let conclusion = format!(
        "Mean {} from the median baseline (t = {t_statistic:.3}, p = {p_value:.4}, d = {:.3} [{}]).",
        if significant_at_05 {
            "differs significantly"
        } else {
            "does not differ significantly"
        },
        effect_size.value,
        effect_size.interpretation,
    );

    Ok(OneSampleTest {
        null_value: stats.median,
        t_statistic,
        df,
        p_value,
        z_test,
        effect_size,
        significant_at_05,
        significant_at_01,
        practically_significant,
        conclusion,
    })
}

#[expect(clippy::cast_precision_loss)]
fn confidence_intervals(
    column: NumericColumn,
    values: &[f64],
) -> Result<ConfidenceIntervals, ModuleError> {
    let stats = column_stats(values, 2)?;
    if stats.std_dev <= 0.0 {
        return Err(ModuleError::DegenerateDistribution {
            column: column.name().to_owned(),
        });
    }
    let n = stats.n as f64;
    let standard_error = stats.std_dev / n.sqrt();
    let df = n - 1.0;

    let mut t_intervals = Vec::with_capacity(CONFIDENCE_LEVELS.len());
    for level in CONFIDENCE_LEVELS {
        let critical = t_critical(level, df).ok_or(ModuleError::InsufficientData {
            needed: 2,
            actual: stats.n,
            unit: "rows",
        })?;
        t_intervals.push(interval(stats.mean, critical * standard_error, level));
    }

    let normal_intervals = (stats.n >= CLT_MIN_N).then(|| {
        CONFIDENCE_LEVELS
            .iter()
            .map(|&level| interval(stats.mean, z_critical(level) * standard_error, level))
            .collect()
    });

    let ci95 = t_intervals[1];
    let conclusion = format!(
        "95% CI for the mean: [{:.4}, {:.4}] (t-based, n = {}).",
        ci95.lower, ci95.upper, stats.n,
    );
    Ok(ConfidenceIntervals {
        mean: stats.mean,
        standard_error,
        t_intervals,
        normal_intervals,
        conclusion,
    })
}

fn interval(mean: f64, margin: f64, level: f64) -> IntervalEstimate {
    IntervalEstimate {
        level,
        lower: mean - margin,
        upper: mean + margin,
        margin,
    }
}

#[expect(clippy::cast_precision_loss)]
fn two_sample_by_severity(dataset: &Dataset) -> Result<TwoSampleTest, ModuleError> {
    let labels = dataset.categorical(CategoricalColumn::Severity);
    let response = NumericColumn::AreaMm2;
    let values = dataset.numeric(response);

    let mut groups: Vec<(String, Vec<f64>)> = Vec::new();
    for (label, &value) in labels.iter().zip(values) {
        match groups.iter_mut().find(|(name, _)| name == label) {
            Some((_, members)) => members.push(value),
            None => groups.push((label.clone(), vec![value])),
        }
    }
    if groups.len() < 2 {
        return Err(ModuleError::InsufficientClassVariation {
            classes: groups.len(),
        });
    }
    // Two largest groups; ties break lexicographically for determinism.
    groups.sort_by(|a, b| b.1.len().cmp(&a.1.len()).then(a.0.cmp(&b.0)));
    let (name_a, sample_a) = &groups[0];
    let (name_b, sample_b) = &groups[1];

    let a = column_stats(sample_a, 2)?;
    let b = column_stats(sample_b, 2)?;
    let var_a = a.variance;
    let var_b = b.variance;
    let (n_a, n_b) = (sample_a.len() as f64, sample_b.len() as f64);
    let se2 = var_a / n_a + var_b / n_b;
    if se2 <= 0.0 {
        return Err(ModuleError::DegenerateDistribution {
            column: response.name().to_owned(),
        });
    }

    let t_statistic = (a.mean - b.mean) / se2.sqrt();
    // Welch–Satterthwaite approximation.
    let df = se2.powi(2)
        / ((var_a / n_a).powi(2) / (n_a - 1.0) + (var_b / n_b).powi(2) / (n_b - 1.0));
    let p_value = two_tailed_p_from_t(t_statistic, df).ok_or(ModuleError::InsufficientData {
        needed: 2,
        actual: sample_a.len().min(sample_b.len()),
        unit: "rows per group",
    })?;

    let pooled_sd =
        (((n_a - 1.0) * var_a + (n_b - 1.0) * var_b) / (n_a + n_b - 2.0)).sqrt();
    let effect_size = EffectSize::cohens_d((a.mean - b.mean) / pooled_sd);
    let significant = p_value < ALPHA;
    let conclusion = format!(
        "'{name_a}' vs '{name_b}' on {}: {} (Welch t = {t_statistic:.3}, p = {p_value:.4}).",
        response.name(),
        if significant {
            "means differ significantly"
        } else {
            "no significant difference"
        },
    );

    Ok(TwoSampleTest {
        response: response.name().to_owned(),
        group_a: group_sample(name_a, &a),
        group_b: group_sample(name_b, &b),
        t_statistic,
        df,
        p_value,
        significant,
        effect_size,
        conclusion,
    })
}

fn group_sample(name: &str, stats: &DescriptiveStats) -> GroupSample {
    GroupSample {
        name: name.to_owned(),
        n: stats.n,
        mean: stats.mean,
        std_dev: stats.std_dev,
    }
}

fn column_stats(values: &[f64], needed: usize) -> Result<DescriptiveStats, ModuleError> {
    if values.len() < needed {
        return Err(ModuleError::InsufficientData {
            needed,
            actual: values.len(),
            unit: "rows",
        });
    }
    DescriptiveStats::new(values).ok_or(ModuleError::InsufficientData {
        needed,
        actual: values.len(),
        unit: "rows",
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::DatasetBuilder;
    use crate::detection::{PixelBox, RawDetection, SiteContext};
    use crate::measurement::{MeasurementRecord, calibrate};

    fn record(i: usize, label: &str, width_px: f64, height_px: f64) -> MeasurementRecord {
        let detection = RawDetection {
            label: label.to_owned(),
            bbox: PixelBox {
                x: 0.0,
                y: 0.0,
                width_px,
                height_px,
            },
            confidence: 0.6 + 0.03 * (i % 10) as f64,
        };
        calibrate(i, &detection, "Concrete", 1.0, &SiteContext::default()).unwrap()
    }

    fn dataset(n: usize) -> Dataset {
        let records = (0..n)
            .map(|i| {
                record(
                    i,
                    ["Minor", "Moderate", "Severe"][i % 3],
                    1.0 + (i % 7) as f64,
                    2.0 + (i % 11) as f64,
                )
            })
            .collect();
        DatasetBuilder::new(3).build(records).unwrap()
    }

    fn one_sample(section: &ModuleSection, key: &str) -> OneSampleTest {
        match section[key].available().unwrap() {
            StatisticalResult::HypothesisTest(test) => test.clone(),
            other => panic!("expected hypothesis test, got {other:?}"),
        }
    }

    #[test]
    fn z_and_t_p_values_converge_for_large_n() {
        let section = analyze(&dataset(60));
        let test = one_sample(&section, "one_sample:width_mm");
        let z = test.z_test.expect("n >= 30 must report a z-test");
        assert!((test.p_value - z.p_value).abs() < 0.02);
    }

    #[test]
    fn z_test_is_withheld_below_thirty_rows() {
        let section = analyze(&dataset(20));
        let test = one_sample(&section, "one_sample:width_mm");
        assert!(test.z_test.is_none());
    }

    #[test]
    fn degenerate_column_is_unavailable_with_reason() {
        // Default site context: structure age is constant across rows.
        let section = analyze(&dataset(20));
        match &section["one_sample:structure_age_years"] {
            ModuleOutcome::Unavailable { reason } => {
                assert!(reason.contains("Degenerate"), "{reason}");
            }
            ModuleOutcome::Available(_) => panic!("constant column must be unavailable"),
        }
    }

    #[test]
    fn normal_intervals_only_for_large_samples() {
        let small = analyze(&dataset(15));
        match small["intervals:width_mm"].available().unwrap() {
            StatisticalResult::ConfidenceInterval(ci) => {
                assert!(ci.normal_intervals.is_none());
                assert_eq!(ci.t_intervals.len(), 3);
            }
            other => panic!("expected intervals, got {other:?}"),
        }
        let large = analyze(&dataset(45));
        match large["intervals:width_mm"].available().unwrap() {
            StatisticalResult::ConfidenceInterval(ci) => {
                let normal = ci.normal_intervals.as_ref().unwrap();
                assert_eq!(normal.len(), 3);
                // t intervals are wider than normal intervals at equal level.
                assert!(ci.t_intervals[1].margin > normal[1].margin);
            }
            other => panic!("expected intervals, got {other:?}"),
        }
    }

    #[test]
    fn interval_width_grows_with_level() {
        let section = analyze(&dataset(25));
        match section["intervals:area_mm2"].available().unwrap() {
            StatisticalResult::ConfidenceInterval(ci) => {
                assert!(ci.t_intervals[0].margin < ci.t_intervals[1].margin);
                assert!(ci.t_intervals[1].margin < ci.t_intervals[2].margin);
            }
            other => panic!("expected intervals, got {other:?}"),
        }
    }

    #[test]
    fn two_sample_picks_the_two_largest_groups() {
        let mut records: Vec<MeasurementRecord> = (0..10)
            .map(|i| record(i, "Minor", 1.0 + i as f64, 2.0))
            .collect();
        records.extend((10..18).map(|i| record(i, "Severe", 20.0 + i as f64, 2.0)));
        records.extend((18..21).map(|i| record(i, "Critical", 5.0, 2.0)));
        let dataset = DatasetBuilder::new(0).build(records).unwrap();
        let section = analyze(&dataset);
        match section["two_sample:severity"].available().unwrap() {
            StatisticalResult::TwoSampleTest(test) => {
                assert_eq!(test.group_a.name, "Minor");
                assert_eq!(test.group_b.name, "Severe");
                assert!(test.p_value < ALPHA, "clearly separated groups");
            }
            other => panic!("expected two-sample test, got {other:?}"),
        }
    }

    #[test]
    fn single_severity_makes_two_sample_unavailable() {
        let records = (0..12)
            .map(|i| record(i, "Minor", 1.0 + (i % 4) as f64, 2.0))
            .collect();
        let dataset = DatasetBuilder::new(0).build(records).unwrap();
        let section = analyze(&dataset);
        assert!(!section["two_sample:severity"].is_available());
    }
}
