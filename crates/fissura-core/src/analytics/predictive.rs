//! Predictive modeling module.
//!
//! Linear regression with a seeded train/test split, logistic regression on a
//! median-split risk label, and a deterministic synthetic deterioration
//! series. Models are fit fresh per request; nothing here is persisted or
//! shared. The series exists to exercise the time-series statistics, not to
//! forecast the inspected structure.

use std::collections::BTreeMap;

use rand::{SeedableRng, seq::SliceRandom};
use rand_distr::{Distribution, Normal};
use rand_pcg::Pcg32;
use serde::Serialize;

use fissura_stats::{
    descriptive::DescriptiveStats,
    quantiles::{quantile, sorted_copy},
    regression::{LOGISTIC_ITERATIONS, LOGISTIC_LEARNING_RATE, LinearModel, LogisticModel, Scaler},
};

use crate::dataset::{Dataset, NumericColumn};
use crate::measurement::Severity;
use crate::result::{ModuleError, ModuleOutcome, ModuleSection, StatisticalResult};

/// Above this row count the linear model uses a held-out test split.
pub const TRAIN_SPLIT_MIN_N: usize = 10;
/// Train share of the split.
pub const TRAIN_FRACTION: f64 = 0.7;
/// Regression targets in priority order; the first non-constant one wins.
pub const TARGET_PRIORITY: [NumericColumn; 3] = [
    NumericColumn::RiskIndex,
    NumericColumn::AreaMm2,
    NumericColumn::SeverityOrdinal,
];

/// Monthly periods in the synthetic deterioration series.
pub const SERIES_PERIODS: usize = 24;
/// Periods extrapolated by the linear trend.
pub const SERIES_FORECAST_PERIODS: usize = 3;
const SERIES_RAMP_TOTAL: f64 = 0.3;
const SERIES_SEASONAL_AMPLITUDE: f64 = 0.05;
const SERIES_SEASONAL_PERIOD: f64 = 12.0;
const SERIES_NOISE_SD: f64 = 0.02;
const SERIES_NOISE_CLAMP: f64 = 0.05;
const MOVING_AVERAGE_WINDOW: usize = 3;

/// Linear-regression diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinearRegressionReport {
    pub target: String,
    pub features: Vec<String>,
    pub intercept: f64,
    pub coefficients: BTreeMap<String, f64>,
    pub train_n: usize,
    pub test_n: usize,
    pub train_r_squared: f64,
    /// Omitted when the test responses have zero variance.
    pub test_r_squared: Option<f64>,
    pub train_rmse: f64,
    pub test_rmse: f64,
    /// `|R²_train − R²_test|`; omitted with `test_r_squared`.
    pub overfitting_indicator: Option<f64>,
    pub residual_mean: f64,
    pub residual_std: f64,
    /// True when `n ≤ 10` forced train and test onto the identical full set.
    pub degenerate_split: bool,
    pub conclusion: String,
}

/// Logistic-regression diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogisticRegressionReport {
    /// How rows were labelled, e.g. `risk_index > median`.
    pub target_rule: String,
    pub features: Vec<String>,
    pub intercept: f64,
    pub coefficients: BTreeMap<String, f64>,
    pub odds_ratios: BTreeMap<String, f64>,
    pub positive_rows: usize,
    pub accuracy: f64,
    pub conclusion: String,
}

/// Deterministic synthetic deterioration series with its diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeteriorationSeries {
    /// Mean dataset risk index, the series baseline.
    pub base: f64,
    pub values: Vec<f64>,
    pub moving_average: Vec<f64>,
    /// Omitted for a constant series.
    pub lag1_autocorrelation: Option<f64>,
    pub trend_slope: f64,
    pub trend_intercept: f64,
    pub forecast: Vec<f64>,
    pub conclusion: String,
}

/// Runs the whole predictive module over the dataset.
#[must_use]
pub fn analyze(dataset: &Dataset, seed: u64) -> ModuleSection {
    let mut section = ModuleSection::new();
    section.insert(
        "linear_regression".to_owned(),
        ModuleOutcome::from_module(
            linear_regression(dataset, seed).map(StatisticalResult::LinearRegression),
        ),
    );
    section.insert(
        "logistic_regression".to_owned(),
        ModuleOutcome::from_module(
            logistic_regression(dataset).map(StatisticalResult::LogisticRegression),
        ),
    );
    section.insert(
        "deterioration_series".to_owned(),
        ModuleOutcome::from_module(
            deterioration_series(dataset, seed).map(StatisticalResult::TimeSeries),
        ),
    );
    section
}

fn column_variance(values: &[f64]) -> f64 {
    DescriptiveStats::new(values).map_or(0.0, |s| s.variance)
}

/// The first target in priority order with any variation.
fn pick_target(dataset: &Dataset) -> Result<NumericColumn, ModuleError> {
    TARGET_PRIORITY
        .iter()
        .copied()
        .find(|&column| column_variance(dataset.numeric(column)) > 0.0)
        .ok_or(ModuleError::DegenerateDistribution {
            column: "risk_index".to_owned(),
        })
}

/// Non-constant numeric columns usable as predictors, excluding `exclude`.
fn predictor_columns(dataset: &Dataset, exclude: &[NumericColumn]) -> Vec<NumericColumn> {
    NumericColumn::ALL
        .iter()
        .copied()
        .filter(|column| !exclude.contains(column))
        .filter(|&column| column_variance(dataset.numeric(column)) > 0.0)
        .collect()
}

fn feature_rows(dataset: &Dataset, columns: &[NumericColumn], indices: &[usize]) -> Vec<Vec<f64>> {
    indices
        .iter()
        .map(|&i| columns.iter().map(|&c| dataset.numeric(c)[i]).collect())
        .collect()
}

#[expect(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn linear_regression(dataset: &Dataset, seed: u64) -> Result<LinearRegressionReport, ModuleError> {
    let n = dataset.len();
    let target = pick_target(dataset)?;
    let mut predictors = predictor_columns(dataset, &[target]);
    if predictors.is_empty() {
        return Err(ModuleError::InsufficientData {
            needed: 1,
            actual: 0,
            unit: "non-constant predictors",
        });
    }

    let degenerate_split = n <= TRAIN_SPLIT_MIN_N;
    let (train_idx, test_idx) = if degenerate_split {
        let all: Vec<usize> = (0..n).collect();
        (all.clone(), all)
    } else {
        let mut indices: Vec<usize> = (0..n).collect();
        indices.shuffle(&mut Pcg32::seed_from_u64(seed));
        let cut = ((n as f64) * TRAIN_FRACTION).floor() as usize;
        (indices[..cut].to_vec(), indices[cut..].to_vec())
    };

    // Keep at least one residual degree of freedom on the training rows.
    let max_predictors = train_idx.len().saturating_sub(2);
    if max_predictors == 0 {
        return Err(ModuleError::InsufficientData {
            needed: 3,
            actual: train_idx.len(),
            unit: "training rows",
        });
    }
    predictors.truncate(max_predictors);

    let targets = dataset.numeric(target);
    let train_x = feature_rows(dataset, &predictors, &train_idx);
    let train_y: Vec<f64> = train_idx.iter().map(|&i| targets[i]).collect();
    let model = LinearModel::fit(&train_x, &train_y).ok_or_else(|| {
        ModuleError::DegenerateDistribution {
            column: target.name().to_owned(),
        }
    })?;

    let test_x = feature_rows(dataset, &predictors, &test_idx);
    let test_y: Vec<f64> = test_idx.iter().map(|&i| targets[i]).collect();
    let (test_r_squared, test_rmse) = holdout_metrics(&model, &test_x, &test_y);
    let overfitting_indicator = test_r_squared.map(|r2| (model.r_squared - r2).abs());

    let residuals: Vec<f64> = train_x
        .iter()
        .zip(&train_y)
        .map(|(row, &y)| y - model.predict(row))
        .collect();
    let residual_stats = DescriptiveStats::new(&residuals).ok_or(
        ModuleError::InsufficientData {
            needed: 1,
            actual: 0,
            unit: "training rows",
        },
    )?;

    let coefficients: BTreeMap<String, f64> = predictors
        .iter()
        .zip(&model.coefficients)
        .map(|(col, &coef)| (col.name().to_owned(), coef))
        .collect();
    let conclusion = match test_r_squared {
        Some(r2) => format!(
            "Model explains {:.1}% of {} on held-out rows (train R² = {:.3}).",
            r2.max(0.0) * 100.0,
            target.name(),
            model.r_squared,
        ),
        None => format!(
            "Train R² = {:.3} for {}; held-out responses had no variance.",
            model.r_squared,
            target.name(),
        ),
    };

    Ok(LinearRegressionReport {
        target: target.name().to_owned(),
        features: predictors.iter().map(|c| c.name().to_owned()).collect(),
        intercept: model.intercept,
        coefficients,
        train_n: train_idx.len(),
        test_n: test_idx.len(),
        train_r_squared: model.r_squared,
        test_r_squared,
        train_rmse: model.rmse,
        test_rmse,
        overfitting_indicator,
        residual_mean: residual_stats.mean,
        residual_std: residual_stats.std_dev,
        degenerate_split,
        conclusion,
    })
}

#[expect(clippy::cast_precision_loss)]
fn holdout_metrics(model: &LinearModel, rows: &[Vec<f64>], y: &[f64]) -> (Option<f64>, f64) {
    let n = y.len() as f64;
    let mean = y.iter().sum::<f64>() / n;
    let mut ss_res = 0.0;
    let mut ss_tot = 0.0;
    for (row, &yi) in rows.iter().zip(y) {
        ss_res += (yi - model.predict(row)).powi(2);
        ss_tot += (yi - mean).powi(2);
    }
    let r_squared = (ss_tot > 0.0).then(|| 1.0 - ss_res / ss_tot);
    (r_squared, (ss_res / n).sqrt())
}

#[expect(clippy::cast_precision_loss)]
fn logistic_regression(dataset: &Dataset) -> Result<LogisticRegressionReport, ModuleError> {
    let risk = dataset.numeric(NumericColumn::RiskIndex);
    let (labels, target_rule, excluded): (Vec<bool>, String, Vec<NumericColumn>) =
        if column_variance(risk) > 0.0 {
            let median = quantile(&sorted_copy(risk), 0.5).ok_or(
                ModuleError::InsufficientData {
                    needed: 1,
                    actual: 0,
                    unit: "rows",
                },
            )?;
            (
                risk.iter().map(|&v| v > median).collect(),
                format!("risk_index > median ({median:.4})"),
                vec![NumericColumn::RiskIndex],
            )
        } else {
            let labels = dataset
                .records()
                .iter()
                .map(|r| matches!(r.severity, Severity::Severe | Severity::Critical))
                .collect();
            (
                labels,
                "severity in {Severe, Critical}".to_owned(),
                vec![NumericColumn::RiskIndex, NumericColumn::SeverityOrdinal],
            )
        };

    let positive_rows = labels.iter().filter(|&&l| l).count();
    if positive_rows == 0 || positive_rows == labels.len() {
        return Err(ModuleError::InsufficientClassVariation { classes: 1 });
    }

    let mut predictors = predictor_columns(dataset, &excluded);
    if predictors.is_empty() {
        return Err(ModuleError::InsufficientData {
            needed: 1,
            actual: 0,
            unit: "non-constant predictors",
        });
    }
    predictors.truncate(labels.len().saturating_sub(2).max(1));

    let indices: Vec<usize> = (0..dataset.len()).collect();
    let raw_rows = feature_rows(dataset, &predictors, &indices);
    let scaler = Scaler::fit(&raw_rows).ok_or(ModuleError::InsufficientData {
        needed: 1,
        actual: 0,
        unit: "rows",
    })?;
    let rows: Vec<Vec<f64>> = raw_rows.iter().map(|r| scaler.transform(r)).collect();
    let model = LogisticModel::fit(&rows, &labels, LOGISTIC_ITERATIONS, LOGISTIC_LEARNING_RATE)
        .ok_or(ModuleError::InsufficientData {
            needed: 1,
            actual: 0,
            unit: "rows",
        })?;

    let correct = rows
        .iter()
        .zip(&labels)
        .filter(|&(row, &label)| model.predict(row) == label)
        .count();
    let accuracy = (correct as f64) / (labels.len() as f64);

    let coefficients: BTreeMap<String, f64> = predictors
        .iter()
        .zip(&model.coefficients)
        .map(|(col, &coef)| (col.name().to_owned(), coef))
        .collect();
    let odds_ratios: BTreeMap<String, f64> = coefficients
        .iter()
        .map(|(name, &coef)| (name.clone(), coef.exp()))
        .collect();
    let conclusion = format!(
        "Classifier for '{target_rule}' reaches {:.1}% accuracy on {} rows.",
        accuracy * 100.0,
        labels.len(),
    );

    Ok(LogisticRegressionReport {
        target_rule,
        features: predictors.iter().map(|c| c.name().to_owned()).collect(),
        intercept: model.intercept,
        coefficients,
        odds_ratios,
        positive_rows,
        accuracy,
        conclusion,
    })
}

#[expect(clippy::cast_precision_loss)]
fn deterioration_series(dataset: &Dataset, seed: u64) -> Result<DeteriorationSeries, ModuleError> {
    let risk = dataset.numeric(NumericColumn::RiskIndex);
    let base = DescriptiveStats::new(risk)
        .ok_or(ModuleError::InsufficientData {
            needed: 1,
            actual: 0,
            unit: "rows",
        })?
        .mean;

    let mut rng = Pcg32::seed_from_u64(seed);
    // Constant, valid parameters; construction cannot fail.
    let noise = Normal::new(0.0, SERIES_NOISE_SD).unwrap();
    let values: Vec<f64> = (0..SERIES_PERIODS)
        .map(|t| {
            let t_f = t as f64;
            let ramp = SERIES_RAMP_TOTAL * t_f / ((SERIES_PERIODS - 1) as f64);
            let seasonal = SERIES_SEASONAL_AMPLITUDE
                * (std::f64::consts::TAU * t_f / SERIES_SEASONAL_PERIOD).sin();
            let jitter = noise
                .sample(&mut rng)
                .clamp(-SERIES_NOISE_CLAMP, SERIES_NOISE_CLAMP);
            base + ramp + seasonal + jitter
        })
        .collect();

    let moving_average: Vec<f64> = values
        .windows(MOVING_AVERAGE_WINDOW)
        .map(|w| w.iter().sum::<f64>() / (MOVING_AVERAGE_WINDOW as f64))
        .collect();
    let lag1_autocorrelation = lag1(&values);

    let time_rows: Vec<Vec<f64>> = (0..SERIES_PERIODS).map(|t| vec![t as f64]).collect();
    let trend = LinearModel::fit(&time_rows, &values).ok_or(
        ModuleError::DegenerateDistribution {
            column: "deterioration_series".to_owned(),
        },
    )?;
    let forecast: Vec<f64> = (SERIES_PERIODS..SERIES_PERIODS + SERIES_FORECAST_PERIODS)
        .map(|t| trend.predict(&[t as f64]))
        .collect();

    let conclusion = format!(
        "Simulated deterioration trends at {:+.4} risk-index units per period from base {base:.4}.",
        trend.coefficients[0],
    );
    Ok(DeteriorationSeries {
        base,
        values,
        moving_average,
        lag1_autocorrelation,
        trend_slope: trend.coefficients[0],
        trend_intercept: trend.intercept,
        forecast,
        conclusion,
    })
}

#[expect(clippy::cast_precision_loss)]
fn lag1(values: &[f64]) -> Option<f64> {
    let mean = values.iter().sum::<f64>() / (values.len() as f64);
    let denom: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    if denom <= 0.0 {
        return None;
    }
    let numer: f64 = values
        .windows(2)
        .map(|w| (w[0] - mean) * (w[1] - mean))
        .sum();
    Some(numer / denom)
}
