//! Versioned linear model artifact.
//!
//! The artifact is a single JSON object written by the training pipeline
//! and loaded exactly once at process startup. Loading validates the format
//! version and internal invariants; a malformed or mismatched artifact is a
//! fatal error rather than a partially-served model.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SiftError};
use crate::linear::evaluate::EvaluationMetrics;

/// Current on-disk format version for linear model artifacts.
pub const LINEAR_MODEL_FORMAT_VERSION: u32 = 1;

/// Provenance and quality metadata stored alongside the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMetadata {
    /// Training timestamp.
    pub trained_at: DateTime<Utc>,
    /// Number of training examples used.
    pub num_examples: usize,
    /// Vocabulary size after document-frequency pruning.
    pub vocabulary_size: usize,
    /// Accuracy on the training split at the calibrated threshold.
    pub train_accuracy: f64,
    /// Accuracy on the held-out split at the calibrated threshold.
    pub test_accuracy: f64,
    /// Precision on the held-out split.
    pub test_precision: f64,
    /// Recall on the held-out split.
    pub test_recall: f64,
    /// F1 on the held-out split.
    pub test_f1: f64,
    /// Area under the ROC curve on the held-out split.
    pub auc: f64,
}

impl ModelMetadata {
    /// Build metadata from held-out metrics.
    pub fn from_metrics(
        num_examples: usize,
        vocabulary_size: usize,
        train_accuracy: f64,
        test: &EvaluationMetrics,
    ) -> Self {
        Self {
            trained_at: Utc::now(),
            num_examples,
            vocabulary_size,
            train_accuracy,
            test_accuracy: test.accuracy,
            test_precision: test.precision,
            test_recall: test.recall,
            test_f1: test.f1,
            auc: test.auc,
        }
    }
}

/// A trained logistic-regression model over TF-IDF features.
///
/// Invariant: every key in `weights` has a corresponding entry in `idf`
/// (weights are a pruned subset of the vocabulary).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearModel {
    /// On-disk format version.
    pub format_version: u32,
    /// Term -> inverse document frequency for the frozen vocabulary.
    pub idf: HashMap<String, f64>,
    /// Term -> learned weight (near-zero weights pruned).
    pub weights: HashMap<String, f64>,
    /// Learned intercept.
    pub bias: f64,
    /// Calibrated decision threshold, in (0, 1).
    pub threshold: f64,
    /// Provenance and quality metadata.
    pub metadata: ModelMetadata,
}

impl LinearModel {
    /// Validate format version and internal invariants.
    pub fn validate(&self) -> Result<()> {
        if self.format_version != LINEAR_MODEL_FORMAT_VERSION {
            return Err(SiftError::artifact(format!(
                "Unsupported linear model format version {} (expected {})",
                self.format_version, LINEAR_MODEL_FORMAT_VERSION
            )));
        }
        if self.weights.is_empty() {
            return Err(SiftError::artifact("Linear model has no weights"));
        }
        if !(self.threshold > 0.0 && self.threshold < 1.0) {
            return Err(SiftError::artifact(format!(
                "Threshold {} outside (0, 1)",
                self.threshold
            )));
        }
        for term in self.weights.keys() {
            if !self.idf.contains_key(term) {
                return Err(SiftError::artifact(format!(
                    "Weight term {term:?} has no IDF entry"
                )));
            }
        }
        Ok(())
    }

    /// Write the model to a JSON artifact.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).map_err(|e| {
            SiftError::artifact(format!("Failed to write model {}: {e}", path.display()))
        })?;
        Ok(())
    }

    /// Load and validate a model from a JSON artifact.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            SiftError::artifact(format!("Failed to read model {}: {e}", path.display()))
        })?;
        let model: LinearModel = serde_json::from_str(&content).map_err(|e| {
            SiftError::artifact(format!("Failed to parse model {}: {e}", path.display()))
        })?;
        model.validate()?;
        Ok(model)
    }
}
