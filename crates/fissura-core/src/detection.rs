//! Input boundary: raw detections and per-request configuration.
//!
//! Everything here is produced outside this crate (the perception stage and
//! the caller's configuration) and is read-only once an analysis starts.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::measurement::{MaintenanceHistory, WeatherExposure};

/// Default millimetres-per-pixel calibration ratio.
pub const DEFAULT_MM_PER_PX: f64 = 1.0;
/// Default detector-confidence cutoff applied before calibration.
pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.25;

/// Axis-aligned pixel bounding box from the detector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PixelBox {
    pub x: f64,
    pub y: f64,
    pub width_px: f64,
    pub height_px: f64,
}

/// One raw detection as emitted by the external detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawDetection {
    /// Free-text severity label; unrecognized labels calibrate to severity
    /// `None`.
    pub label: String,
    pub bbox: PixelBox,
    /// Detector confidence in `[0, 1]`.
    pub confidence: f64,
}

/// Material classification from the external classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialClassification {
    pub predicted_material: String,
    pub probabilities: BTreeMap<String, f64>,
}

/// Optional site observations supplied by the caller. Missing fields take
/// documented defaults during calibration instead of failing.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SiteContext {
    pub structure_age_years: Option<f64>,
    pub weather_exposure: Option<WeatherExposure>,
    pub maintenance_history: Option<MaintenanceHistory>,
}

/// Per-request analysis configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Pixel-to-physical calibration ratio, millimetres per pixel. Must be
    /// positive.
    pub mm_per_px: f64,
    /// Detections below this confidence are dropped before calibration.
    pub confidence_threshold: f64,
    pub site: SiteContext,
    /// Seed for every PRNG the pipeline constructs (synthetic augmentation,
    /// train/test split, time-series noise). Same seed, same report.
    pub seed: u64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            mm_per_px: DEFAULT_MM_PER_PX,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            site: SiteContext::default(),
            seed: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detection_json_round_trips() {
        let json = r#"{
            "label": "Severe",
            "bbox": { "x": 1.0, "y": 2.0, "width_px": 30.0, "height_px": 120.0 },
            "confidence": 0.87
        }"#;
        let detection: RawDetection = serde_json::from_str(json).unwrap();
        assert_eq!(detection.label, "Severe");
        assert_eq!(detection.bbox.width_px, 30.0);
        let back = serde_json::to_string(&detection).unwrap();
        let again: RawDetection = serde_json::from_str(&back).unwrap();
        assert_eq!(detection, again);
    }

    #[test]
    fn config_defaults_are_documented_values() {
        let config = AnalysisConfig::default();
        assert_eq!(config.mm_per_px, DEFAULT_MM_PER_PX);
        assert_eq!(config.confidence_threshold, DEFAULT_CONFIDENCE_THRESHOLD);
        assert_eq!(config.site.structure_age_years, None);
    }
}
