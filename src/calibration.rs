use crate::error::DetectionError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// One analyst judgment on a previously flagged account, used to tune
/// thresholds over time. Append-only: never read back by the detection
/// pipeline itself, only by the metrics endpoints and offline tooling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackRecord {
    pub id: Uuid,
    pub account_id: String,
    pub predicted_positive: bool,
    pub actual_positive: bool,
    pub recorded_at: DateTime<Utc>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FeedbackMetrics {
    pub total_feedback: usize,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

/// Appends feedback records to a JSON-lines file and computes
/// precision/recall/F1 from the accumulated history.
pub struct FeedbackCollector {
    path: PathBuf,
}

impl FeedbackCollector {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn add_feedback(&self, record: &FeedbackRecord) -> Result<(), DetectionError> {
        append_line(&self.path, record)
    }

    pub fn get_metrics(&self) -> Result<FeedbackMetrics, DetectionError> {
        let records: Vec<FeedbackRecord> = read_lines(&self.path)?;
        if records.is_empty() {
            return Ok(FeedbackMetrics::default());
        }

        let mut true_positives = 0usize;
        let mut false_positives = 0usize;
        let mut false_negatives = 0usize;

        for record in &records {
            match (record.predicted_positive, record.actual_positive) {
                (true, true) => true_positives += 1,
                (true, false) => false_positives += 1,
                (false, true) => false_negatives += 1,
                (false, false) => {}
            }
        }

        let precision = ratio(true_positives, true_positives + false_positives);
        let recall = ratio(true_positives, true_positives + false_negatives);
        let f1 = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };

        Ok(FeedbackMetrics {
            total_feedback: records.len(),
            precision,
            recall,
            f1,
        })
    }
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// One pipeline run's shape, recorded for trend analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisMetrics {
    pub recorded_at: DateTime<Utc>,
    pub total_nodes: usize,
    pub total_transactions: usize,
    pub suspicious_accounts_flagged: usize,
    pub fraud_rings_detected: usize,
    pub processing_time_seconds: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PerformanceTrends {
    pub runs_considered: usize,
    pub avg_processing_time_seconds: f64,
    pub avg_suspicious_accounts_flagged: f64,
    pub avg_fraud_rings_detected: f64,
}

/// Appends per-run metrics to a JSON-lines file, outside the pipeline's
/// request path; used only by the `/metrics` endpoint.
pub struct PerformanceTracker {
    path: PathBuf,
}

impl PerformanceTracker {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn record_analysis(&self, metrics: &AnalysisMetrics) -> Result<(), DetectionError> {
        append_line(&self.path, metrics)
    }

    pub fn get_trends(&self, last_n: usize) -> Result<PerformanceTrends, DetectionError> {
        let mut records: Vec<AnalysisMetrics> = read_lines(&self.path)?;
        if records.is_empty() {
            return Ok(PerformanceTrends::default());
        }
        if records.len() > last_n {
            records = records.split_off(records.len() - last_n);
        }

        let n = records.len() as f64;
        let avg_processing_time_seconds =
            records.iter().map(|r| r.processing_time_seconds).sum::<f64>() / n;
        let avg_suspicious_accounts_flagged = records
            .iter()
            .map(|r| r.suspicious_accounts_flagged as f64)
            .sum::<f64>()
            / n;
        let avg_fraud_rings_detected =
            records.iter().map(|r| r.fraud_rings_detected as f64).sum::<f64>() / n;

        Ok(PerformanceTrends {
            runs_considered: records.len(),
            avg_processing_time_seconds,
            avg_suspicious_accounts_flagged,
            avg_fraud_rings_detected,
        })
    }
}

fn append_line<T: Serialize>(path: &Path, value: &T) -> Result<(), DetectionError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .map_err(|e| DetectionError::processing(format!("create_dir_all: {e}")))?;
        }
    }
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| DetectionError::processing(format!("opening {path:?}: {e}")))?;
    let line = serde_json::to_string(value)
        .map_err(|e| DetectionError::processing(format!("serializing record: {e}")))?;
    writeln!(file, "{line}")
        .map_err(|e| DetectionError::processing(format!("writing to {path:?}: {e}")))?;
    Ok(())
}

fn read_lines<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<Vec<T>, DetectionError> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let file = std::fs::File::open(path)
        .map_err(|e| DetectionError::processing(format!("opening {path:?}: {e}")))?;
    let mut records = Vec::new();
    for line in BufReader::new(file).lines() {
        let line = line.map_err(|e| DetectionError::processing(format!("reading {path:?}: {e}")))?;
        if line.trim().is_empty() {
            continue;
        }
        let record: T = serde_json::from_str(&line)
            .map_err(|e| DetectionError::processing(format!("parsing {path:?}: {e}")))?;
        records.push(record);
    }
    Ok(records)
}
