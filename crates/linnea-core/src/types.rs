//! Core record types for evaluation runs.
//!
//! Every record is computed once and written once: per-sample prediction
//! records are appended to an output log, the summary is emitted at the end,
//! and per-class prediction pools aggregate open-world model vocabulary.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// One scored model prediction for one dataset sample.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionRecord {
    /// Dataset sample index
    pub index: usize,

    /// Prediction after answer extraction and trimming
    pub prediction: String,

    /// Dataset-provided correct class label
    pub ground_truth: String,

    /// Whether the prediction matched the ground truth
    pub correct: bool,

    /// Raw model output, kept when answer extraction rewrote it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_output: Option<String>,

    /// All sampled completions when more than one was requested
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completions: Option<Vec<String>>,

    /// Round-trip latency of the model call in milliseconds
    pub latency_ms: u64,
}

/// Aggregate results for a whole evaluation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalSummary {
    /// Dataset identifier (e.g., "caltech101")
    pub dataset: String,

    /// Model identifier reported by the provider
    pub model: String,

    /// Prompt style used ("closed", "open", "reasoning")
    pub prompt_style: String,

    /// Samples evaluated
    pub total: usize,

    /// Samples whose prediction matched the ground truth
    pub correct: usize,

    /// Reasoning outputs with no extractable `<answer>` block
    pub invalid: usize,

    /// Samples that failed after all retries
    pub failed: usize,

    /// correct / total (0.0 when total is 0)
    pub accuracy: f64,

    /// Wall-clock duration of the run in seconds
    pub elapsed_seconds: f64,
}

impl EvalSummary {
    /// Recompute the accuracy field from the current counters.
    pub fn finalize(&mut self, elapsed_seconds: f64) {
        self.elapsed_seconds = elapsed_seconds;
        self.accuracy = if self.total == 0 {
            0.0
        } else {
            self.correct as f64 / self.total as f64
        };
    }
}

/// Per-class prediction pools: ground-truth label → set of model outputs.
///
/// BTree containers keep the serialized JSON deterministic across runs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClassPredictions(pub BTreeMap<String, BTreeSet<String>>);

impl ClassPredictions {
    /// Create empty pools for the given class labels.
    pub fn for_classes<'a>(classes: impl IntoIterator<Item = &'a str>) -> Self {
        Self(
            classes
                .into_iter()
                .map(|c| (c.to_string(), BTreeSet::new()))
                .collect(),
        )
    }

    /// Record one prediction under its ground-truth class.
    pub fn insert(&mut self, ground_truth: &str, prediction: &str) {
        self.0
            .entry(ground_truth.to_string())
            .or_default()
            .insert(prediction.to_string());
    }

    /// Fold another pool into this one.
    pub fn merge(&mut self, other: ClassPredictions) {
        for (class, preds) in other.0 {
            self.0.entry(class).or_default().extend(preds);
        }
    }

    /// Total number of distinct predictions across all classes.
    pub fn total_predictions(&self) -> usize {
        self.0.values().map(|s| s.len()).sum()
    }
}

/// Tagged union for streamed run output.
/// Internally tagged: `{"type":"prediction",...}` or `{"type":"summary",...}`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RunRecord {
    Prediction(PredictionRecord),
    Summary(EvalSummary),
}
