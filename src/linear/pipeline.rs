//! Offline training pipeline.
//!
//! Runs tokenize -> vectorize -> SGD -> cross-validate once, as a batch
//! job, and produces the serialized model artifact. The shipped threshold
//! comes from cross-validation calibration; the final 80/20 retrain exists
//! for reported metrics only.

use crate::analysis::TextTokenizer;
use crate::dataset::{TrainingExample, train_test_split};
use crate::error::{Result, SiftError};
use crate::linear::evaluate::{
    CrossValidationReport, evaluate_at_threshold, k_fold_cross_validate,
};
use crate::linear::model::{LINEAR_MODEL_FORMAT_VERSION, LinearModel, ModelMetadata};
use crate::linear::trainer::{TrainConfig, sigmoid, train};
use crate::vectorize::{Vocabulary, VocabularyConfig, vectorize};

/// Minimum corpus size for a meaningful train/calibrate run.
const MIN_TRAINING_EXAMPLES: usize = 10;

/// Weights with absolute value below this are pruned from the artifact.
const WEIGHT_PRUNE_EPSILON: f64 = 1e-6;

/// Settings for a full training run.
#[derive(Debug, Clone)]
pub struct TrainOptions {
    /// SGD hyperparameters.
    pub train: TrainConfig,
    /// Vocabulary pruning settings.
    pub vocabulary: VocabularyConfig,
    /// Number of cross-validation folds.
    pub folds: usize,
    /// Held-out fraction for the reporting split.
    pub test_ratio: f64,
}

impl TrainOptions {
    /// Default options: 5 folds, 20% held out.
    pub fn new() -> Self {
        Self {
            train: TrainConfig::default(),
            vocabulary: VocabularyConfig::default(),
            folds: 5,
            test_ratio: 0.2,
        }
    }
}

impl Default for TrainOptions {
    fn default() -> Self {
        Self::new()
    }
}

/// Train a linear model over a labeled corpus.
///
/// Returns the model (with cross-validation-calibrated threshold and
/// held-out metrics in its metadata) and the cross-validation report.
pub fn train_model(
    examples: &[TrainingExample],
    options: &TrainOptions,
) -> Result<(LinearModel, CrossValidationReport)> {
    if examples.len() < MIN_TRAINING_EXAMPLES {
        return Err(SiftError::training(format!(
            "Need at least {MIN_TRAINING_EXAMPLES} examples, got {}",
            examples.len()
        )));
    }
    log::info!(
        "training linear model: {} examples, {} folds",
        examples.len(),
        options.folds
    );

    let report =
        k_fold_cross_validate(examples, options.folds, &options.train, &options.vocabulary)?;
    log::info!(
        "cross-validation: f1 {:.4}, auc {:.4}, calibrated threshold {:.2}",
        report.metrics.f1,
        report.metrics.auc,
        report.threshold
    );

    let (train_set, test_set) =
        train_test_split(examples.to_vec(), options.test_ratio, options.train.seed);

    let tokenizer = TextTokenizer::new()?;
    let train_tokens: Vec<Vec<String>> =
        train_set.iter().map(|e| tokenizer.tokenize(&e.text)).collect();
    let vocabulary = Vocabulary::build(&train_tokens, &options.vocabulary);
    let vocabulary_size = vocabulary.len();
    if vocabulary.is_empty() {
        return Err(SiftError::training(
            "Vocabulary is empty after document-frequency pruning",
        ));
    }

    let train_x: Vec<_> = train_tokens
        .iter()
        .map(|tokens| vectorize(tokens, vocabulary.idf()))
        .collect();
    let train_y: Vec<f64> = train_set.iter().map(|e| e.label.as_target()).collect();
    let trained = train(&train_x, &train_y, &options.train)?;
    log::info!("final fit: mean loss {:.6}", trained.final_loss);

    let train_probs: Vec<f64> = train_x
        .iter()
        .map(|v| sigmoid(v.dot(&trained.weights) + trained.bias))
        .collect();
    let train_accuracy =
        evaluate_at_threshold(&train_y, &train_probs, report.threshold).accuracy;

    let test_y: Vec<f64> = test_set.iter().map(|e| e.label.as_target()).collect();
    let test_probs: Vec<f64> = test_set
        .iter()
        .map(|e| {
            let vector = vectorize(&tokenizer.tokenize(&e.text), vocabulary.idf());
            sigmoid(vector.dot(&trained.weights) + trained.bias)
        })
        .collect();
    let test_metrics = evaluate_at_threshold(&test_y, &test_probs, report.threshold);

    let weights: std::collections::HashMap<String, f64> = trained
        .weights
        .into_iter()
        .filter(|&(_, w)| w.abs() >= WEIGHT_PRUNE_EPSILON)
        .collect();
    log::info!(
        "artifact: {} weights after pruning, vocabulary {vocabulary_size}",
        weights.len()
    );

    let model = LinearModel {
        format_version: LINEAR_MODEL_FORMAT_VERSION,
        idf: vocabulary.into_idf(),
        weights,
        bias: trained.bias,
        threshold: report.threshold,
        metadata: ModelMetadata::from_metrics(
            examples.len(),
            vocabulary_size,
            train_accuracy,
            &test_metrics,
        ),
    };
    model.validate()?;

    Ok((model, report))
}
