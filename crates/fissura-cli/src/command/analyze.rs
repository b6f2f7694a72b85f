use std::{
    fs::File,
    io::{BufReader, BufWriter, Read, Write as _},
    path::PathBuf,
};

use anyhow::Context as _;
use chrono::{DateTime, Utc};
use clap::Args;
use serde::Serialize;
use tracing::info;

use fissura_core::report::{AnalysisInput, AnalysisReport, run_analysis};

#[derive(Debug, Clone, Args)]
pub struct AnalyzeArg {
    /// Input JSON with detections and configuration; `-` reads stdin
    #[arg(short, long)]
    input: PathBuf,
    /// Report output path; stdout when omitted
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Override the calibration ratio (millimetres per pixel)
    #[arg(long)]
    mm_per_px: Option<f64>,
    /// Override the detector-confidence cutoff
    #[arg(long)]
    confidence_threshold: Option<f64>,
    /// Override the pipeline seed
    #[arg(long)]
    seed: Option<u64>,
    /// Pretty-print the report JSON
    #[arg(long)]
    pretty: bool,
}

/// Report envelope written by the CLI.
#[derive(Debug, Serialize)]
struct ReportEnvelope {
    generated_at: DateTime<Utc>,
    #[serde(flatten)]
    report: AnalysisReport,
}

pub fn run(arg: &AnalyzeArg) -> anyhow::Result<()> {
    let mut input: AnalysisInput = read_input(arg)?;
    if let Some(mm_per_px) = arg.mm_per_px {
        input.config.mm_per_px = mm_per_px;
    }
    if let Some(threshold) = arg.confidence_threshold {
        input.config.confidence_threshold = threshold;
    }
    if let Some(seed) = arg.seed {
        input.config.seed = seed;
    }

    let report = run_analysis(&input)?;
    info!(
        rows = report.dataset.rows,
        health = report.scores.health,
        risk = ?report.scores.risk,
        "analysis finished"
    );

    let envelope = ReportEnvelope {
        generated_at: Utc::now(),
        report,
    };
    write_report(arg, &envelope)
}

fn read_input(arg: &AnalyzeArg) -> anyhow::Result<AnalysisInput> {
    let raw = if arg.input.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read stdin")?;
        buf
    } else {
        std::fs::read_to_string(&arg.input)
            .with_context(|| format!("failed to read {}", arg.input.display()))?
    };
    serde_json::from_str(&raw).context("failed to parse analysis input JSON")
}

fn write_report(arg: &AnalyzeArg, envelope: &ReportEnvelope) -> anyhow::Result<()> {
    match &arg.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            let mut writer = BufWriter::new(file);
            serialize(arg.pretty, &mut writer, envelope)?;
            writer.flush()?;
        }
        None => {
            let stdout = std::io::stdout();
            let mut writer = BufWriter::new(stdout.lock());
            serialize(arg.pretty, &mut writer, envelope)?;
            writeln!(writer)?;
            writer.flush()?;
        }
    }
    Ok(())
}

fn serialize<W: std::io::Write>(
    pretty: bool,
    writer: &mut W,
    envelope: &ReportEnvelope,
) -> anyhow::Result<()> {
    if pretty {
        serde_json::to_writer_pretty(writer, envelope).context("failed to serialize report")
    } else {
        serde_json::to_writer(writer, envelope).context("failed to serialize report")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fissura_core::detection::{AnalysisConfig, PixelBox, RawDetection};

    #[test]
    fn envelope_flattens_the_report() {
        let input = AnalysisInput {
            detections: vec![RawDetection {
                label: "Minor".to_owned(),
                bbox: PixelBox {
                    x: 0.0,
                    y: 0.0,
                    width_px: 4.0,
                    height_px: 9.0,
                },
                confidence: 0.8,
            }],
            material: None,
            growth_percentage: 0.0,
            config: AnalysisConfig::default(),
        };
        let envelope = ReportEnvelope {
            generated_at: Utc::now(),
            report: run_analysis(&input).unwrap(),
        };
        let json = serde_json::to_value(&envelope).unwrap();
        assert!(json["generated_at"].is_string());
        assert!(json["scores"]["health"].is_number());
        assert!(json["descriptive"].is_object());
    }

    #[test]
    fn minimal_input_json_parses_with_defaults() {
        let raw = r#"{
            "detections": [
                { "label": "Severe",
                  "bbox": { "x": 0, "y": 0, "width_px": 10, "height_px": 25 },
                  "confidence": 0.7 }
            ]
        }"#;
        let input: AnalysisInput = serde_json::from_str(raw).unwrap();
        assert_eq!(input.config.mm_per_px, 1.0);
        assert!(input.material.is_none());
        assert_eq!(input.growth_percentage, 0.0);
    }
}
