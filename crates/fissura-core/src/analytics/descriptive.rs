//! Descriptive statistics module.
//!
//! Per numeric column: a full summary with distribution shape and a 10-bin
//! density histogram, plus the three-method outlier scan. Per categorical
//! column: a frequency table with Shannon entropy. Pairwise over numeric
//! columns: Pearson/Spearman/Kendall with the exact Pearson significance
//! test. Section keys are prefixed by payload kind, e.g. `summary:width_mm`,
//! `outliers:risk_index`, `correlation:width_mm~length_mm`.

use std::collections::BTreeMap;

use serde::Serialize;

use fissura_stats::{
    correlation::{self, CorrelationStrength},
    descriptive::{DescriptiveStats, Symmetry, TailWeight},
    frequency::FrequencyTable,
    histogram::{DEFAULT_BINS, Histogram},
    outliers::{OutlierImpact, OutlierScan},
};

use crate::dataset::{CategoricalColumn, Dataset, NumericColumn};
use crate::result::{ALPHA, ModuleError, ModuleOutcome, ModuleSection, StatisticalResult};

/// Minimum `|r|` for a correlation to be called significant (together with
/// `p < 0.05`).
pub const CORRELATION_MIN_R: f64 = 0.3;

/// Full summary of one numeric column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumericSummary {
    pub n: usize,
    pub mean: f64,
    pub median: f64,
    pub mode: f64,
    pub std_dev: f64,
    pub variance: f64,
    pub min: f64,
    pub max: f64,
    pub range: f64,
    pub iqr: f64,
    /// Coefficient of variation; omitted when the mean is zero.
    pub cv: Option<f64>,
    pub skewness: f64,
    pub kurtosis: f64,
    pub symmetry: &'static str,
    pub tails: &'static str,
    pub histogram: HistogramSummary,
    pub conclusion: String,
}

/// Serializable slice of a density histogram.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramSummary {
    pub edges: Vec<f64>,
    pub counts: Vec<u64>,
    pub densities: Vec<f64>,
}

/// Frequency table of one categorical column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoricalSummary {
    pub n: usize,
    pub absolute: BTreeMap<String, usize>,
    pub relative: BTreeMap<String, f64>,
    pub mode: String,
    pub cardinality: usize,
    pub entropy_bits: f64,
    pub conclusion: String,
}

/// One outlier-detection method's findings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutlierMethod {
    pub count: usize,
    pub percentage: f64,
    pub values: Vec<f64>,
}

/// Three-method outlier scan over one numeric column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutlierReport {
    pub n: usize,
    /// Omitted when the column has zero standard deviation.
    pub z_score: Option<OutlierMethod>,
    pub iqr: OutlierMethod,
    /// Omitted when the MAD is zero.
    pub modified_z: Option<OutlierMethod>,
    pub impact: &'static str,
    /// Below 8 rows the z-score method is low-power and non-authoritative.
    pub z_score_authoritative: bool,
    pub conclusion: String,
}

/// Pairwise association between two numeric columns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationPair {
    pub x: String,
    pub y: String,
    pub pearson: f64,
    pub spearman: Option<f64>,
    pub kendall: Option<f64>,
    /// Omitted for a perfect correlation, where the statistic diverges.
    pub t_statistic: Option<f64>,
    pub p_value: f64,
    pub strength: &'static str,
    /// `|r| > 0.3` and `p < 0.05`.
    pub significant: bool,
    pub conclusion: String,
}

/// Runs the whole descriptive module over the dataset.
#[must_use]
pub fn analyze(dataset: &Dataset) -> ModuleSection {
    let mut section = ModuleSection::new();

    for column in NumericColumn::ALL {
        let values = dataset.numeric(column);
        section.insert(
            format!("summary:{}", column.name()),
            ModuleOutcome::from_module(
                numeric_summary(values).map(StatisticalResult::Descriptive),
            ),
        );
        section.insert(
            format!("outliers:{}", column.name()),
            ModuleOutcome::from_module(outlier_report(values).map(StatisticalResult::Outliers)),
        );
    }

    for column in CategoricalColumn::ALL {
        section.insert(
            format!("frequency:{}", column.name()),
            ModuleOutcome::from_module(
                categorical_summary(dataset.categorical(column))
                    .map(StatisticalResult::Frequency),
            ),
        );
    }

    for (i, x) in NumericColumn::ALL.iter().enumerate() {
        for y in &NumericColumn::ALL[i + 1..] {
            section.insert(
                format!("correlation:{}~{}", x.name(), y.name()),
                ModuleOutcome::from_module(
                    correlation_pair(dataset, *x, *y).map(StatisticalResult::Correlation),
                ),
            );
        }
    }

    section
}

fn numeric_summary(values: &[f64]) -> Result<NumericSummary, ModuleError> {
    let stats = DescriptiveStats::new(values).ok_or(ModuleError::InsufficientData {
        needed: 1,
        actual: 0,
        unit: "rows",
    })?;
    let histogram =
        Histogram::new(values, DEFAULT_BINS).ok_or(ModuleError::InsufficientData {
            needed: 1,
            actual: 0,
            unit: "rows",
        })?;
    let shape = stats.shape();
    let symmetry = symmetry_label(shape.symmetry);
    let tails = tail_label(shape.tails);
    let conclusion = format!(
        "Distribution is {symmetry} with {tails} tails (mean {:.3}, sd {:.3}).",
        stats.mean, stats.std_dev,
    );
    Ok(NumericSummary {
        n: stats.n,
        mean: stats.mean,
        median: stats.median,
        mode: stats.mode,
        std_dev: stats.std_dev,
        variance: stats.variance,
        min: stats.min,
        max: stats.max,
        range: stats.range,
        iqr: stats.iqr,
        cv: stats.cv,
        skewness: stats.skewness,
        kurtosis: stats.kurtosis,
        symmetry,
        tails,
        histogram: HistogramSummary {
            edges: histogram.edges,
            counts: histogram.counts,
            densities: histogram.densities,
        },
        conclusion,
    })
}

fn categorical_summary(labels: &[String]) -> Result<CategoricalSummary, ModuleError> {
    let table = FrequencyTable::new(labels).ok_or(ModuleError::InsufficientData {
        needed: 1,
        actual: 0,
        unit: "rows",
    })?;
    let conclusion = format!(
        "{} distinct categories; '{}' dominates ({:.1}% of rows).",
        table.cardinality,
        table.mode,
        table.relative[&table.mode] * 100.0,
    );
    Ok(CategoricalSummary {
        n: labels.len(),
        absolute: table.absolute,
        relative: table.relative,
        mode: table.mode,
        cardinality: table.cardinality,
        entropy_bits: table.entropy_bits,
        conclusion,
    })
}

fn outlier_report(values: &[f64]) -> Result<OutlierReport, ModuleError> {
    let scan = OutlierScan::new(values).ok_or(ModuleError::InsufficientData {
        needed: 1,
        actual: 0,
        unit: "rows",
    })?;
    let impact = impact_label(scan.impact);
    let flagged = scan.iqr.count;
    let conclusion = if scan.z_score_authoritative {
        format!("IQR method flagged {flagged} value(s); overall impact {impact}.")
    } else {
        format!(
            "IQR method flagged {flagged} value(s); z-score method is low-power at n = {}.",
            scan.n,
        )
    };
    Ok(OutlierReport {
        n: scan.n,
        z_score: scan.z_score.map(method),
        iqr: method(scan.iqr),
        modified_z: scan.modified_z.map(method),
        impact,
        z_score_authoritative: scan.z_score_authoritative,
        conclusion,
    })
}

fn method(report: fissura_stats::outliers::MethodReport) -> OutlierMethod {
    OutlierMethod {
        count: report.count,
        percentage: report.percentage,
        values: report.values,
    }
}

fn correlation_pair(
    dataset: &Dataset,
    x: NumericColumn,
    y: NumericColumn,
) -> Result<CorrelationPair, ModuleError> {
    let xs = dataset.numeric(x);
    let ys = dataset.numeric(y);
    if xs.len() < 3 {
        return Err(ModuleError::InsufficientData {
            needed: 3,
            actual: xs.len(),
            unit: "rows",
        });
    }
    let test = correlation::pearson_test(xs, ys).ok_or_else(|| {
        ModuleError::DegenerateDistribution {
            column: format!("{}~{}", x.name(), y.name()),
        }
    })?;
    let strength = strength_label(test.strength);
    let significant = test.r.abs() > CORRELATION_MIN_R && test.p_value < ALPHA;
    let conclusion = if significant {
        format!(
            "{} and {} show a {strength} correlation (r = {:.3}, p = {:.4}).",
            x.name(),
            y.name(),
            test.r,
            test.p_value,
        )
    } else {
        format!(
            "No significant correlation between {} and {} (r = {:.3}, p = {:.4}).",
            x.name(),
            y.name(),
            test.r,
            test.p_value,
        )
    };
    Ok(CorrelationPair {
        x: x.name().to_owned(),
        y: y.name().to_owned(),
        pearson: test.r,
        spearman: correlation::spearman(xs, ys),
        kendall: correlation::kendall_tau_b(xs, ys),
        t_statistic: test.t_statistic.is_finite().then_some(test.t_statistic),
        p_value: test.p_value,
        strength,
        significant,
        conclusion,
    })
}

fn symmetry_label(symmetry: Symmetry) -> &'static str {
    match symmetry {
        Symmetry::Symmetric => "symmetric",
        Symmetry::RightSkewed => "right_skewed",
        Symmetry::LeftSkewed => "left_skewed",
    }
}

fn tail_label(tails: TailWeight) -> &'static str {
    match tails {
        TailWeight::Leptokurtic => "heavy",
        TailWeight::Platykurtic => "light",
        TailWeight::Mesokurtic => "normal",
    }
}

fn impact_label(impact: OutlierImpact) -> &'static str {
    match impact {
        OutlierImpact::High => "high",
        OutlierImpact::Moderate => "moderate",
        OutlierImpact::Low => "low",
    }
}

fn strength_label(strength: CorrelationStrength) -> &'static str {
    match strength {
        CorrelationStrength::VeryWeak => "very_weak",
        CorrelationStrength::Weak => "weak",
        CorrelationStrength::Moderate => "moderate",
        CorrelationStrength::Strong => "strong",
        CorrelationStrength::VeryStrong => "very_strong",
    }
}
