//! Dataset assembly and cleansing.
//!
//! The builder turns calibrated measurements into one immutable,
//! column-oriented [`Dataset`]. Cleansing runs in a fixed order:
//!
//! 1. **Augment**: below [`MIN_MEASURED_ROWS`] measured rows, seeded synthetic
//!    rows (tagged [`DataOrigin::Synthetic`]) top the dataset up to
//!    [`AUGMENTED_TARGET_ROWS`] so downstream statistics do not degenerate.
//! 2. **Impute**: non-finite numeric cells take the column median, empty
//!    categorical cells take the column mode (or `"Unknown"`).
//! 3. **Derive**: ordinal encodings, aspect ratio, and the risk index are
//!    recomputed at dataset scale from the imputed cells.
//! 4. **Cap**: continuous columns are clipped to their own pre-capping
//!    `[Q1 − 1.5·IQR, Q3 + 1.5·IQR]`. Ordinal code columns are bounded by
//!    construction and are not capped.

use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Exp};
use rand_pcg::Pcg32;
use tracing::debug;

use fissura_stats::quantiles::{Quartiles, sorted_copy};

use crate::measurement::{
    DataOrigin, MaintenanceHistory, MeasurementRecord, Severity, WeatherExposure, risk_index,
};

/// Fewer measured rows than this triggers synthetic augmentation.
pub const MIN_MEASURED_ROWS: usize = 8;
/// Row count the augmented dataset is topped up to.
pub const AUGMENTED_TARGET_ROWS: usize = 12;

/// Severity sampling weights for synthetic rows, `None` through `Critical`.
const SYNTHETIC_SEVERITY_WEIGHTS: [f64; 5] = [0.3, 0.3, 0.2, 0.15, 0.05];
/// Exponential rate for synthetic crack widths (mean 2 mm).
const SYNTHETIC_WIDTH_RATE: f64 = 0.5;
/// Exponential rate for synthetic crack lengths (mean 5 mm).
const SYNTHETIC_LENGTH_RATE: f64 = 0.2;
const SYNTHETIC_MATERIALS: [&str; 4] = ["Concrete", "Brick", "Stone", "Asphalt"];

/// Numeric dataset columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum NumericColumn {
    WidthMm,
    LengthMm,
    AreaMm2,
    Confidence,
    AspectRatio,
    StructureAgeYears,
    SeverityOrdinal,
    WeatherOrdinal,
    MaintenanceOrdinal,
    RiskIndex,
}

impl NumericColumn {
    pub const ALL: [Self; 10] = [
        Self::WidthMm,
        Self::LengthMm,
        Self::AreaMm2,
        Self::Confidence,
        Self::AspectRatio,
        Self::StructureAgeYears,
        Self::SeverityOrdinal,
        Self::WeatherOrdinal,
        Self::MaintenanceOrdinal,
        Self::RiskIndex,
    ];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::WidthMm => "width_mm",
            Self::LengthMm => "length_mm",
            Self::AreaMm2 => "area_mm2",
            Self::Confidence => "confidence",
            Self::AspectRatio => "aspect_ratio",
            Self::StructureAgeYears => "structure_age_years",
            Self::SeverityOrdinal => "severity_ordinal",
            Self::WeatherOrdinal => "weather_ordinal",
            Self::MaintenanceOrdinal => "maintenance_ordinal",
            Self::RiskIndex => "risk_index",
        }
    }

    /// Continuous columns are IQR-capped at build time; ordinal code columns
    /// are not (capping a `{0..4}` code against its own IQR would destroy the
    /// encoding).
    #[must_use]
    pub fn is_continuous(self) -> bool {
        !matches!(
            self,
            Self::SeverityOrdinal | Self::WeatherOrdinal | Self::MaintenanceOrdinal
        )
    }

    fn idx(self) -> usize {
        match self {
            Self::WidthMm => 0,
            Self::LengthMm => 1,
            Self::AreaMm2 => 2,
            Self::Confidence => 3,
            Self::AspectRatio => 4,
            Self::StructureAgeYears => 5,
            Self::SeverityOrdinal => 6,
            Self::WeatherOrdinal => 7,
            Self::MaintenanceOrdinal => 8,
            Self::RiskIndex => 9,
        }
    }
}

/// Categorical dataset columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CategoricalColumn {
    Severity,
    MaterialType,
    WeatherExposure,
    MaintenanceHistory,
}

impl CategoricalColumn {
    pub const ALL: [Self; 4] = [
        Self::Severity,
        Self::MaterialType,
        Self::WeatherExposure,
        Self::MaintenanceHistory,
    ];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Severity => "severity",
            Self::MaterialType => "material_type",
            Self::WeatherExposure => "weather_exposure",
            Self::MaintenanceHistory => "maintenance_history",
        }
    }

    fn idx(self) -> usize {
        match self {
            Self::Severity => 0,
            Self::MaterialType => 1,
            Self::WeatherExposure => 2,
            Self::MaintenanceHistory => 3,
        }
    }
}

/// No usable records and synthetic fallback disabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("No measurement records and synthetic fallback is disabled")]
pub struct EmptyDatasetError;

/// Configures dataset construction.
#[derive(Debug, Clone)]
pub struct DatasetBuilder {
    seed: u64,
    synthetic_fallback: bool,
}

impl DatasetBuilder {
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            synthetic_fallback: true,
        }
    }

    /// Disables synthetic augmentation; an empty input then fails with
    /// [`EmptyDatasetError`].
    #[must_use]
    pub fn without_synthetic_fallback(mut self) -> Self {
        self.synthetic_fallback = false;
        self
    }

    /// Builds the cleansed dataset.
    pub fn build(&self, mut records: Vec<MeasurementRecord>) -> Result<Dataset, EmptyDatasetError> {
        let measured = records.len();
        if measured < MIN_MEASURED_ROWS {
            if self.synthetic_fallback {
                let mut rng = Pcg32::seed_from_u64(self.seed);
                let next_id = records.iter().map(|r| r.id + 1).max().unwrap_or(0);
                while records.len() < AUGMENTED_TARGET_ROWS {
                    let id = next_id + (records.len() - measured);
                    records.push(synthetic_record(id, &mut rng));
                }
                debug!(
                    measured,
                    synthetic = records.len() - measured,
                    "augmented small sample with synthetic rows"
                );
            } else if records.is_empty() {
                return Err(EmptyDatasetError);
            }
        }
        Ok(Dataset::cleanse(records))
    }
}

/// Immutable, column-oriented dataset. One per analysis request; never shared
/// or mutated across requests.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    records: Vec<MeasurementRecord>,
    numeric: [Vec<f64>; 10],
    categorical: [Vec<String>; 4],
    measured_rows: usize,
}

impl Dataset {
    fn cleanse(records: Vec<MeasurementRecord>) -> Self {
        let measured_rows = records
            .iter()
            .filter(|r| r.origin == DataOrigin::Measured)
            .count();

        let mut width: Vec<f64> = records.iter().map(|r| r.width_mm).collect();
        let mut length: Vec<f64> = records.iter().map(|r| r.length_mm).collect();
        let mut confidence: Vec<f64> = records.iter().map(|r| r.confidence).collect();
        let mut age: Vec<f64> = records.iter().map(|r| r.structure_age_years).collect();
        impute_numeric(&mut width);
        impute_numeric(&mut length);
        impute_numeric(&mut confidence);
        impute_numeric(&mut age);

        let mut material: Vec<String> =
            records.iter().map(|r| r.material_type.clone()).collect();
        impute_categorical(&mut material);

        let severity_ord: Vec<f64> = records
            .iter()
            .map(|r| f64::from(r.severity.ordinal()))
            .collect();
        let weather_ord: Vec<f64> = records
            .iter()
            .map(|r| f64::from(r.weather_exposure.ordinal()))
            .collect();
        let maintenance_ord: Vec<f64> = records
            .iter()
            .map(|r| f64::from(r.maintenance_history.ordinal()))
            .collect();

        // Derived columns come from the imputed cells, so a repaired width
        // feeds a consistent area, aspect ratio, and risk index.
        let area: Vec<f64> = width.iter().zip(&length).map(|(w, l)| w * l).collect();
        let aspect: Vec<f64> = width
            .iter()
            .zip(&length)
            .map(|(&w, &l)| if w > 0.0 { l / w } else { 0.0 })
            .collect();
        let risk: Vec<f64> = records
            .iter()
            .zip(&age)
            .map(|(r, &a)| risk_index(r.severity.ordinal(), a, r.weather_exposure.ordinal()))
            .collect();

        let mut numeric = [
            width,
            length,
            area,
            confidence,
            aspect,
            age,
            severity_ord,
            weather_ord,
            maintenance_ord,
            risk,
        ];
        for col in NumericColumn::ALL {
            if col.is_continuous() {
                cap_to_fences(&mut numeric[col.idx()]);
            }
        }

        let categorical = [
            records.iter().map(|r| r.severity.as_str().to_owned()).collect(),
            material,
            records
                .iter()
                .map(|r| r.weather_exposure.as_str().to_owned())
                .collect(),
            records
                .iter()
                .map(|r| r.maintenance_history.as_str().to_owned())
                .collect(),
        ];

        let records = rebuild_records(records, &numeric, &categorical);
        Self {
            records,
            numeric,
            categorical,
            measured_rows,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Rows that came from real detections.
    #[must_use]
    pub fn measured_rows(&self) -> usize {
        self.measured_rows
    }

    /// Synthetic augmentation rows.
    #[must_use]
    pub fn synthetic_rows(&self) -> usize {
        self.records.len() - self.measured_rows
    }

    /// The cleansed records, in input order (synthetic rows last).
    #[must_use]
    pub fn records(&self) -> &[MeasurementRecord] {
        &self.records
    }

    #[must_use]
    pub fn numeric(&self, column: NumericColumn) -> &[f64] {
        &self.numeric[column.idx()]
    }

    #[must_use]
    pub fn categorical(&self, column: CategoricalColumn) -> &[String] {
        &self.categorical[column.idx()]
    }
}

/// Replaces non-finite cells with the median of the finite ones (0 when no
/// finite cell exists).
fn impute_numeric(values: &mut [f64]) {
    if values.iter().all(|v| v.is_finite()) {
        return;
    }
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    let median = fissura_stats::quantiles::quantile(&sorted_copy(&finite), 0.5).unwrap_or(0.0);
    for v in values.iter_mut().filter(|v| !v.is_finite()) {
        *v = median;
    }
}

/// Replaces empty cells with the mode of the non-empty ones, or `"Unknown"`.
fn impute_categorical(values: &mut [String]) {
    if values.iter().all(|v| !v.trim().is_empty()) {
        return;
    }
    let filled = values
        .iter()
        .filter(|v| !v.trim().is_empty())
        .map(String::as_str);
    let mode = fissura_stats::frequency::FrequencyTable::new(filled)
        .map_or_else(|| "Unknown".to_owned(), |t| t.mode);
    for v in values.iter_mut().filter(|v| v.trim().is_empty()) {
        v.clone_from(&mode);
    }
}

/// Clips every value to the column's own pre-capping Tukey fences.
fn cap_to_fences(values: &mut [f64]) {
    let Some(quartiles) = Quartiles::from_sorted(&sorted_copy(values)) else {
        return;
    };
    let (lo, hi) = quartiles.fences();
    for v in values.iter_mut() {
        *v = v.clamp(lo, hi);
    }
}

/// Rewrites each record's numeric fields from the cleansed columns so the
/// serialized measurements match what the analytics saw.
fn rebuild_records(
    mut records: Vec<MeasurementRecord>,
    numeric: &[Vec<f64>; 10],
    categorical: &[Vec<String>; 4],
) -> Vec<MeasurementRecord> {
    for (i, record) in records.iter_mut().enumerate() {
        record.width_mm = numeric[NumericColumn::WidthMm.idx()][i];
        record.length_mm = numeric[NumericColumn::LengthMm.idx()][i];
        record.area_mm2 = numeric[NumericColumn::AreaMm2.idx()][i];
        record.confidence = numeric[NumericColumn::Confidence.idx()][i];
        record.structure_age_years = numeric[NumericColumn::StructureAgeYears.idx()][i];
        record.aspect_ratio = numeric[NumericColumn::AspectRatio.idx()][i];
        record.risk_index = numeric[NumericColumn::RiskIndex.idx()][i];
        record
            .material_type
            .clone_from(&categorical[CategoricalColumn::MaterialType.idx()][i]);
    }
    records
}

fn synthetic_record(id: usize, rng: &mut Pcg32) -> MeasurementRecord {
    let width_mm = Exp::new(SYNTHETIC_WIDTH_RATE).unwrap().sample(rng);
    let length_mm = Exp::new(SYNTHETIC_LENGTH_RATE).unwrap().sample(rng);
    let severity = weighted_severity(rng.random::<f64>());
    let material = SYNTHETIC_MATERIALS[rng.random_range(0..SYNTHETIC_MATERIALS.len())];
    let age = rng.random_range(5.0..80.0);
    let weather = WeatherExposure::ALL[rng.random_range(0..WeatherExposure::ALL.len())];
    let maintenance = MaintenanceHistory::ALL[rng.random_range(0..MaintenanceHistory::ALL.len())];

    MeasurementRecord {
        id,
        width_mm,
        length_mm,
        area_mm2: width_mm * length_mm,
        severity,
        confidence: rng.random_range(0.5..0.95),
        material_type: material.to_owned(),
        structure_age_years: age,
        weather_exposure: weather,
        maintenance_history: maintenance,
        aspect_ratio: if width_mm > 0.0 { length_mm / width_mm } else { 0.0 },
        severity_ordinal: severity.ordinal(),
        risk_index: risk_index(severity.ordinal(), age, weather.ordinal()),
        origin: DataOrigin::Synthetic,
    }
}

fn weighted_severity(draw: f64) -> Severity {
    let mut cumulative = 0.0;
    for (severity, weight) in Severity::ALL.iter().zip(SYNTHETIC_SEVERITY_WEIGHTS) {
        cumulative += weight;
        if draw < cumulative {
            return *severity;
        }
    }
    Severity::Critical
}
