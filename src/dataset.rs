//! Labeled training corpora and dataset utilities.
//!
//! Corpora are static JSON files edited by maintenance scripts; this module
//! loads and saves them, produces deterministic train/test splits, and
//! reports the class ratio that feeds the k-NN prior correction.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SiftError};

/// Ground-truth class for a training example.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Label {
    /// Technical/intellectual content.
    Technical,
    /// Political/lifestyle content.
    NonTechnical,
}

impl Label {
    /// Numeric regression target: technical = 1.0, non-technical = 0.0.
    pub fn as_target(self) -> f64 {
        match self {
            Label::Technical => 1.0,
            Label::NonTechnical => 0.0,
        }
    }
}

/// A single labeled training example.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingExample {
    /// Raw text (title, description, or body excerpt).
    pub text: String,
    /// Ground-truth label.
    pub label: Label,
}

impl TrainingExample {
    /// Create a new training example.
    pub fn new<S: Into<String>>(text: S, label: Label) -> Self {
        Self {
            text: text.into(),
            label,
        }
    }
}

/// Load a labeled corpus from a JSON file.
///
/// An empty corpus is rejected: downstream training would silently produce
/// a degenerate model.
pub fn load_corpus(path: &Path) -> Result<Vec<TrainingExample>> {
    let content = fs::read_to_string(path).map_err(|e| {
        SiftError::artifact(format!("Failed to read corpus {}: {e}", path.display()))
    })?;
    let examples: Vec<TrainingExample> = serde_json::from_str(&content).map_err(|e| {
        SiftError::artifact(format!("Failed to parse corpus {}: {e}", path.display()))
    })?;

    if examples.is_empty() {
        return Err(SiftError::artifact(format!(
            "Corpus {} contains no examples",
            path.display()
        )));
    }

    Ok(examples)
}

/// Save a labeled corpus to a JSON file.
pub fn save_corpus(path: &Path, examples: &[TrainingExample]) -> Result<()> {
    let json = serde_json::to_string_pretty(examples)?;
    fs::write(path, json)?;
    Ok(())
}

/// Split examples into train and test sets with a seeded shuffle.
///
/// The shuffle is deterministic for a given seed, so splits are
/// reproducible across runs.
pub fn train_test_split(
    mut examples: Vec<TrainingExample>,
    test_ratio: f64,
    seed: u64,
) -> (Vec<TrainingExample>, Vec<TrainingExample>) {
    let mut rng = StdRng::seed_from_u64(seed);
    examples.shuffle(&mut rng);

    let test_len = (examples.len() as f64 * test_ratio).round() as usize;
    let split = examples.len().saturating_sub(test_len);
    let test = examples.split_off(split);
    (examples, test)
}

/// Per-class example counts for a corpus.
pub fn class_counts(examples: &[TrainingExample]) -> HashMap<Label, usize> {
    let mut counts = HashMap::new();
    for example in examples {
        *counts.entry(example.label).or_insert(0) += 1;
    }
    counts
}

/// Non-technical examples per technical example in the corpus.
///
/// This is the training-side input to the k-NN class-prior correction.
/// Returns an error if the corpus has no technical examples (the ratio is
/// undefined).
pub fn class_ratio(examples: &[TrainingExample]) -> Result<f64> {
    let counts = class_counts(examples);
    let technical = counts.get(&Label::Technical).copied().unwrap_or(0);
    let non_technical = counts.get(&Label::NonTechnical).copied().unwrap_or(0);

    if technical == 0 {
        return Err(SiftError::invalid_argument(
            "class ratio undefined: corpus has no technical examples",
        ));
    }

    Ok(non_technical as f64 / technical as f64)
}

const TECHNICAL_TERMS: &[&str] = &[
    "rust",
    "compiler",
    "kubernetes",
    "deployment",
    "database",
    "latency",
    "algorithm",
    "machine",
    "learning",
    "optimization",
    "api",
    "server",
    "kernel",
    "encryption",
    "network",
    "cache",
    "async",
    "runtime",
    "container",
    "cluster",
];

const NON_TECHNICAL_TERMS: &[&str] = &[
    "election",
    "policy",
    "senate",
    "debate",
    "celebrity",
    "fashion",
    "recipe",
    "restaurant",
    "travel",
    "lifestyle",
    "vacation",
    "gossip",
    "campaign",
    "president",
    "wedding",
    "diet",
    "movie",
    "music",
    "festival",
    "holiday",
];

/// Build a balanced, separable synthetic corpus from fixed term pools.
///
/// Deterministic (no randomness): example `i` of each class draws five
/// terms from its pool at stride 3. Every pool term recurs across
/// documents, so all of them survive the default `min_df` filter. Used by
/// tests and the bench.
pub fn synthetic_corpus(per_class: usize) -> Vec<TrainingExample> {
    let mut examples = Vec::with_capacity(per_class * 2);

    for i in 0..per_class {
        let technical = document_from_pool(TECHNICAL_TERMS, i);
        examples.push(TrainingExample::new(technical, Label::Technical));

        let non_technical = document_from_pool(NON_TECHNICAL_TERMS, i);
        examples.push(TrainingExample::new(non_technical, Label::NonTechnical));
    }

    examples
}

fn document_from_pool(pool: &[&str], index: usize) -> String {
    (0..5)
        .map(|j| pool[(index + j * 3) % pool.len()])
        .collect::<Vec<_>>()
        .join(" ")
}
