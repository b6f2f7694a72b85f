//! The analysis pipeline and its report.
//!
//! [`run_analysis`] is the single entry point: filter detections by
//! confidence, calibrate, build the dataset, run the four analytics modules
//! independently, score, and assemble. Only calibration failures and an
//! unrecoverable empty dataset abort the request; every other failure lands
//! in the report as an unavailable entry.

use serde::{Deserialize, Serialize};
use tracing::{info, info_span};

use crate::analytics::AnalyticsEngine;
use crate::dataset::{DatasetBuilder, EmptyDatasetError};
use crate::detection::{AnalysisConfig, MaterialClassification, RawDetection};
use crate::measurement::{CalibrationError, MeasurementRecord, calibrate};
use crate::result::ModuleSection;
use crate::scoring::{Scores, score};

/// Everything one analysis request consumes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisInput {
    pub detections: Vec<RawDetection>,
    #[serde(default)]
    pub material: Option<MaterialClassification>,
    /// Growth coverage percentage from the external segmentation stage.
    #[serde(default)]
    pub growth_percentage: f64,
    #[serde(default)]
    pub config: AnalysisConfig,
}

/// Fatal pipeline failures. Everything else degrades to unavailable entries
/// inside the report.
#[derive(
    Debug, Clone, PartialEq, derive_more::Display, derive_more::Error, derive_more::From,
)]
pub enum PipelineError {
    #[display("calibration failed: {_0}")]
    Calibration(CalibrationError),
    #[display("dataset construction failed: {_0}")]
    EmptyDataset(EmptyDatasetError),
}

/// Row provenance counts for the report header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DatasetSummary {
    pub rows: usize,
    pub measured_rows: usize,
    pub synthetic_rows: usize,
    /// Detections that survived the confidence filter.
    pub crack_count: usize,
}

/// The structured result handed to the report/HTTP layer.
///
/// Every module key is always present; unavailable computations carry their
/// reason. All serialized floats are finite; optional diagnostics that would
/// be non-finite are omitted as JSON `null`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub measurements: Vec<MeasurementRecord>,
    pub material: Option<MaterialClassification>,
    pub dataset: DatasetSummary,
    pub descriptive: ModuleSection,
    pub inferential: ModuleSection,
    pub variance: ModuleSection,
    pub predictive: ModuleSection,
    pub scores: Scores,
}

/// Runs the whole pipeline over one input.
pub fn run_analysis(input: &AnalysisInput) -> Result<AnalysisReport, PipelineError> {
    let _span = info_span!("analysis").entered();
    let config = &input.config;
    let material_name = input
        .material
        .as_ref()
        .map_or("Unknown", |m| m.predicted_material.as_str());

    let kept: Vec<&RawDetection> = input
        .detections
        .iter()
        .filter(|d| d.confidence >= config.confidence_threshold)
        .collect();
    info!(
        total = input.detections.len(),
        kept = kept.len(),
        threshold = config.confidence_threshold,
        "filtered detections"
    );

    let records: Vec<MeasurementRecord> = kept
        .iter()
        .enumerate()
        .map(|(id, detection)| {
            calibrate(id, detection, material_name, config.mm_per_px, &config.site)
        })
        .collect::<Result<_, _>>()?;
    let crack_count = records.len();

    let dataset = DatasetBuilder::new(config.seed).build(records)?;
    info!(
        rows = dataset.len(),
        synthetic = dataset.synthetic_rows(),
        "dataset built"
    );

    let engine = AnalyticsEngine::new(&dataset, config.seed);
    let descriptive = engine.descriptive();
    let inferential = engine.inferential();
    let variance = engine.variance();
    let predictive = engine.predictive();

    let scores = score(dataset.measured_rows(), input.growth_percentage);
    info!(health = scores.health, risk = ?scores.risk, "analysis complete");

    Ok(AnalysisReport {
        measurements: dataset.records().to_vec(),
        material: input.material.clone(),
        dataset: DatasetSummary {
            rows: dataset.len(),
            measured_rows: dataset.measured_rows(),
            synthetic_rows: dataset.synthetic_rows(),
            crack_count,
        },
        descriptive,
        inferential,
        variance,
        predictive,
        scores,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::PixelBox;

    fn detection(label: &str, width_px: f64, height_px: f64, confidence: f64) -> RawDetection {
        RawDetection {
            label: label.to_owned(),
            bbox: PixelBox {
                x: 0.0,
                y: 0.0,
                width_px,
                height_px,
            },
            confidence,
        }
    }

    fn representative_input() -> AnalysisInput {
        let labels = ["Minor", "Moderate", "Severe", "Critical"];
        let detections = (0..16)
            .map(|i| {
                detection(
                    labels[i % 4],
                    2.0 + (i % 5) as f64,
                    5.0 + (i % 7) as f64,
                    0.4 + 0.03 * (i % 10) as f64,
                )
            })
            .collect();
        AnalysisInput {
            detections,
            material: Some(MaterialClassification {
                predicted_material: "Concrete".to_owned(),
                probabilities: [("Concrete".to_owned(), 0.9), ("Brick".to_owned(), 0.1)]
                    .into_iter()
                    .collect(),
            }),
            growth_percentage: 4.0,
            config: AnalysisConfig::default(),
        }
    }

    #[test]
    fn report_contains_every_module_key() {
        let report = run_analysis(&representative_input()).unwrap();
        assert!(report.descriptive.contains_key("summary:width_mm"));
        assert!(report.descriptive.contains_key("frequency:severity"));
        assert!(report.inferential.contains_key("one_sample:risk_index"));
        assert!(report.inferential.contains_key("goodness_of_fit:severity"));
        assert!(report.variance.contains_key("anova:area_mm2"));
        assert!(report.variance.contains_key("independence:severity~material_type"));
        assert!(report.predictive.contains_key("linear_regression"));
        assert!(report.predictive.contains_key("deterioration_series"));
    }

    #[test]
    fn report_serializes_to_json() {
        let report = run_analysis(&representative_input()).unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert!(json["measurements"].as_array().unwrap().len() >= 16);
        assert_eq!(json["material"]["predicted_material"], "Concrete");
        assert!(json["scores"]["health"].as_f64().unwrap() <= 100.0);
        // Tagged availability is visible in the serialized form.
        assert_eq!(json["descriptive"]["summary:width_mm"]["status"], "available");
        assert_eq!(json["descriptive"]["summary:width_mm"]["kind"], "descriptive");
    }

    fn assert_numbers_finite(value: &serde_json::Value) {
        match value {
            serde_json::Value::Number(n) => {
                assert!(n.as_f64().is_some_and(f64::is_finite), "non-finite number: {n}");
            }
            serde_json::Value::Array(items) => items.iter().for_each(assert_numbers_finite),
            serde_json::Value::Object(map) => map.values().for_each(assert_numbers_finite),
            _ => {}
        }
    }

    #[test]
    fn proportional_boxes_keep_serialized_floats_finite() {
        // Constant 2:1 aspect: length_mm is exactly proportional to width_mm,
        // the case where the Pearson t statistic diverges.
        let labels = ["Minor", "Moderate", "Severe", "Critical"];
        let mut input = representative_input();
        input.detections = (0..12)
            .map(|i| {
                let width = 1.0 + i as f64;
                detection(labels[i % 4], width, 2.0 * width, 0.8)
            })
            .collect();
        let report = run_analysis(&input).unwrap();
        let json = serde_json::to_value(&report).unwrap();
        let pair = &json["descriptive"]["correlation:width_mm~length_mm"];
        assert_eq!(pair["status"], "available");
        assert_eq!(pair["pearson"], 1.0);
        assert!(pair["t_statistic"].is_null());
        assert_eq!(pair["p_value"], 0.0);
        assert_numbers_finite(&json);
    }

    #[test]
    fn low_confidence_detections_are_filtered() {
        let mut input = representative_input();
        input.config.confidence_threshold = 0.9;
        // Nothing survives; the synthetic fallback keeps the pipeline alive.
        let report = run_analysis(&input).unwrap();
        assert_eq!(report.dataset.crack_count, 0);
        assert_eq!(report.dataset.measured_rows, 0);
        assert!(report.dataset.synthetic_rows > 0);
        assert_eq!(report.scores.environment.carbon_kg, 0.0);
    }

    #[test]
    fn bad_ratio_is_fatal() {
        let mut input = representative_input();
        input.config.mm_per_px = -2.0;
        let err = run_analysis(&input).unwrap_err();
        assert!(matches!(err, PipelineError::Calibration(_)));
    }

    #[test]
    fn same_input_same_report() {
        let input = representative_input();
        let a = run_analysis(&input).unwrap();
        let b = run_analysis(&input).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn scores_use_only_measured_rows() {
        let input = AnalysisInput {
            detections: (0..3)
                .map(|i| detection("Severe", 3.0 + i as f64, 9.0, 0.8))
                .collect(),
            material: None,
            growth_percentage: 0.0,
            config: AnalysisConfig::default(),
        };
        let report = run_analysis(&input).unwrap();
        // 3 measured cracks even though synthetic rows pad the dataset.
        assert!(report.dataset.synthetic_rows > 0);
        assert_eq!(report.scores.environment.carbon_kg, 7.5);
        assert_eq!(report.scores.health, 85.0);
    }
}
