//! Calibrated engineering measurements derived from raw detections.
//!
//! Calibration converts pixel geometry into millimetres using a
//! caller-supplied ratio and attaches the site context. A
//! [`MeasurementRecord`] is immutable once produced; recalibrating yields a
//! new record rather than editing in place, so calibration is idempotent by
//! construction.

use serde::{Deserialize, Serialize};

use crate::detection::{RawDetection, SiteContext};

/// Structure age substituted when the site context does not provide one.
pub const DEFAULT_STRUCTURE_AGE_YEARS: f64 = 25.0;

/// Crack severity as labelled by the external detector.
///
/// Ordinal values run `None = 0` through `Critical = 4`. Detector labels are
/// free text; anything unrecognized maps to [`Severity::None`] rather than
/// failing the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Severity {
    None,
    Minor,
    Moderate,
    Severe,
    Critical,
}

impl Severity {
    pub const ALL: [Self; 5] = [
        Self::None,
        Self::Minor,
        Self::Moderate,
        Self::Severe,
        Self::Critical,
    ];

    /// Parses a detector label case-insensitively; unknown labels become
    /// [`Severity::None`].
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "minor" => Self::Minor,
            "moderate" => Self::Moderate,
            "severe" => Self::Severe,
            "critical" => Self::Critical,
            _ => Self::None,
        }
    }

    #[must_use]
    pub fn ordinal(self) -> u8 {
        match self {
            Self::None => 0,
            Self::Minor => 1,
            Self::Moderate => 2,
            Self::Severe => 3,
            Self::Critical => 4,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Minor => "Minor",
            Self::Moderate => "Moderate",
            Self::Severe => "Severe",
            Self::Critical => "Critical",
        }
    }
}

/// Site weather exposure, ordinal `Low = 1` through `High = 3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum WeatherExposure {
    Low,
    Medium,
    High,
}

impl WeatherExposure {
    pub const ALL: [Self; 3] = [Self::Low, Self::Medium, Self::High];

    #[must_use]
    pub fn ordinal(self) -> u8 {
        match self {
            Self::Low => 1,
            Self::Medium => 2,
            Self::High => 3,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }
}

/// Site maintenance history, ordinal `Poor = 1` through `Regular = 3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MaintenanceHistory {
    Poor,
    Irregular,
    Regular,
}

impl MaintenanceHistory {
    pub const ALL: [Self; 3] = [Self::Poor, Self::Irregular, Self::Regular];

    #[must_use]
    pub fn ordinal(self) -> u8 {
        match self {
            Self::Poor => 1,
            Self::Irregular => 2,
            Self::Regular => 3,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Poor => "Poor",
            Self::Irregular => "Irregular",
            Self::Regular => "Regular",
        }
    }
}

/// Provenance of a dataset row. Synthetic rows stabilize small-sample
/// statistics and are tagged so callers needing strict provenance can drop
/// them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DataOrigin {
    Measured,
    Synthetic,
}

/// One calibrated detection, with its derived features.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeasurementRecord {
    pub id: usize,
    pub width_mm: f64,
    pub length_mm: f64,
    pub area_mm2: f64,
    pub severity: Severity,
    pub confidence: f64,
    pub material_type: String,
    pub structure_age_years: f64,
    pub weather_exposure: WeatherExposure,
    pub maintenance_history: MaintenanceHistory,
    pub aspect_ratio: f64,
    pub severity_ordinal: u8,
    pub risk_index: f64,
    pub origin: DataOrigin,
}

/// Fatal calibration failure.
#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
pub enum CalibrationError {
    #[display("Calibration ratio must be positive, got {mm_per_px}")]
    NonPositiveRatio { mm_per_px: f64 },
}

/// Weighted composite of severity, structure age, and weather exposure.
#[must_use]
pub fn risk_index(severity_ordinal: u8, age_years: f64, weather_ordinal: u8) -> f64 {
    0.4 * f64::from(severity_ordinal) + 0.3 * (age_years / 100.0) + 0.3 * (f64::from(weather_ordinal) / 3.0)
}

/// Calibrates one detection into a [`MeasurementRecord`].
///
/// Missing optional site fields take documented defaults
/// ([`DEFAULT_STRUCTURE_AGE_YEARS`], `Medium` exposure, `Irregular`
/// maintenance); only a non-positive ratio fails.
pub fn calibrate(
    id: usize,
    detection: &RawDetection,
    material_type: &str,
    mm_per_px: f64,
    site: &SiteContext,
) -> Result<MeasurementRecord, CalibrationError> {
    if mm_per_px <= 0.0 || !mm_per_px.is_finite() {
        return Err(CalibrationError::NonPositiveRatio { mm_per_px });
    }

    let width_mm = detection.bbox.width_px * mm_per_px;
    let length_mm = detection.bbox.height_px * mm_per_px;
    let severity = Severity::from_label(&detection.label);
    let age = site
        .structure_age_years
        .unwrap_or(DEFAULT_STRUCTURE_AGE_YEARS);
    let weather = site.weather_exposure.unwrap_or(WeatherExposure::Medium);
    let maintenance = site
        .maintenance_history
        .unwrap_or(MaintenanceHistory::Irregular);
    let aspect_ratio = if width_mm > 0.0 { length_mm / width_mm } else { 0.0 };

    Ok(MeasurementRecord {
        id,
        width_mm,
        length_mm,
        area_mm2: width_mm * length_mm,
        severity,
        confidence: detection.confidence,
        material_type: material_type.to_owned(),
        structure_age_years: age,
        weather_exposure: weather,
        maintenance_history: maintenance,
        aspect_ratio,
        severity_ordinal: severity.ordinal(),
        risk_index: risk_index(severity.ordinal(), age, weather.ordinal()),
        origin: DataOrigin::Measured,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::PixelBox;

    fn detection(label: &str, width_px: f64, height_px: f64) -> RawDetection {
        RawDetection {
            label: label.to_owned(),
            bbox: PixelBox {
                x: 0.0,
                y: 0.0,
                width_px,
                height_px,
            },
            confidence: 0.9,
        }
    }

    #[test]
    fn unknown_labels_default_to_none() {
        assert_eq!(Severity::from_label("spalling"), Severity::None);
        assert_eq!(Severity::from_label(""), Severity::None);
        assert_eq!(Severity::from_label(" CRITICAL "), Severity::Critical);
    }

    #[test]
    fn millimetre_conversion_and_derived_fields() {
        let record = calibrate(
            0,
            &detection("Severe", 10.0, 40.0),
            "Concrete",
            0.5,
            &SiteContext::default(),
        )
        .unwrap();
        assert_eq!(record.width_mm, 5.0);
        assert_eq!(record.length_mm, 20.0);
        assert_eq!(record.area_mm2, 100.0);
        assert_eq!(record.aspect_ratio, 4.0);
        assert_eq!(record.severity_ordinal, 3);
        // 0.4·3 + 0.3·(25/100) + 0.3·(2/3)
        assert!((record.risk_index - (1.2 + 0.075 + 0.2)).abs() < 1e-12);
    }

    #[test]
    fn zero_width_guards_aspect_ratio() {
        let record = calibrate(
            0,
            &detection("Minor", 0.0, 40.0),
            "Brick",
            1.0,
            &SiteContext::default(),
        )
        .unwrap();
        assert_eq!(record.aspect_ratio, 0.0);
    }

    #[test]
    fn non_positive_ratio_is_fatal() {
        let err = calibrate(
            0,
            &detection("Minor", 1.0, 1.0),
            "Brick",
            0.0,
            &SiteContext::default(),
        )
        .unwrap_err();
        assert_eq!(err, CalibrationError::NonPositiveRatio { mm_per_px: 0.0 });
    }

    #[test]
    fn calibration_is_idempotent() {
        let det = detection("Moderate", 12.5, 33.0);
        let site = SiteContext {
            structure_age_years: Some(40.0),
            weather_exposure: Some(WeatherExposure::High),
            maintenance_history: Some(MaintenanceHistory::Poor),
        };
        let a = calibrate(7, &det, "Stone", 0.25, &site).unwrap();
        let b = calibrate(7, &det, "Stone", 0.25, &site).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.risk_index.to_bits(), b.risk_index.to_bits());
    }
}
