//! Evaluation metrics, threshold calibration, and k-fold cross-validation.
//!
//! The operating threshold that ships with a model artifact comes from this
//! module, not a fixed 0.5: each cross-validation fold finds its own
//! F1-maximizing threshold on held-out data, and the calibrated threshold
//! is the average of the fold-local optima.

use std::cmp::Ordering;

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::analysis::TextTokenizer;
use crate::dataset::TrainingExample;
use crate::error::{Result, SiftError};
use crate::linear::trainer::{TrainConfig, sigmoid, train};
use crate::vectorize::{Vocabulary, VocabularyConfig, vectorize};

/// Threshold sweep bounds and step, in probability space.
const THRESHOLD_SWEEP_START: f64 = 0.10;
const THRESHOLD_SWEEP_END: f64 = 0.90;
const THRESHOLD_SWEEP_STEP: f64 = 0.05;

/// Classifier quality metrics on a labeled set.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct EvaluationMetrics {
    /// Fraction of correct verdicts.
    pub accuracy: f64,
    /// True positives over predicted positives.
    pub precision: f64,
    /// True positives over actual positives.
    pub recall: f64,
    /// Harmonic mean of precision and recall.
    pub f1: f64,
    /// Area under the ROC curve.
    pub auc: f64,
}

/// The threshold selected by an F1 sweep, with its operating point.
#[derive(Debug, Clone, Copy)]
pub struct ThresholdSelection {
    /// Selected decision threshold.
    pub threshold: f64,
    /// Precision at the selected threshold.
    pub precision: f64,
    /// Recall at the selected threshold.
    pub recall: f64,
    /// F1 at the selected threshold.
    pub f1: f64,
}

/// Averaged metrics across cross-validation folds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrossValidationReport {
    /// Number of folds evaluated.
    pub folds: usize,
    /// Fold-averaged metrics.
    pub metrics: EvaluationMetrics,
    /// Mean of the fold-local optimal thresholds; this is the threshold
    /// that ships with the artifact.
    pub threshold: f64,
}

/// Confusion-matrix counts at a fixed threshold.
#[derive(Debug, Clone, Copy, Default)]
struct Confusion {
    tp: usize,
    fp: usize,
    tn: usize,
    fn_: usize,
}

impl Confusion {
    fn count(labels: &[f64], probabilities: &[f64], threshold: f64) -> Self {
        let mut counts = Confusion::default();
        for (&label, &prob) in labels.iter().zip(probabilities.iter()) {
            let predicted = prob >= threshold;
            let actual = label >= 0.5;
            match (predicted, actual) {
                (true, true) => counts.tp += 1,
                (true, false) => counts.fp += 1,
                (false, false) => counts.tn += 1,
                (false, true) => counts.fn_ += 1,
            }
        }
        counts
    }

    fn accuracy(&self) -> f64 {
        let total = self.tp + self.fp + self.tn + self.fn_;
        if total == 0 {
            return 0.0;
        }
        (self.tp + self.tn) as f64 / total as f64
    }

    fn precision(&self) -> f64 {
        let predicted_positive = self.tp + self.fp;
        if predicted_positive == 0 {
            return 0.0;
        }
        self.tp as f64 / predicted_positive as f64
    }

    fn recall(&self) -> f64 {
        let actual_positive = self.tp + self.fn_;
        if actual_positive == 0 {
            return 0.0;
        }
        self.tp as f64 / actual_positive as f64
    }

    fn f1(&self) -> f64 {
        let precision = self.precision();
        let recall = self.recall();
        if precision + recall == 0.0 {
            return 0.0;
        }
        2.0 * precision * recall / (precision + recall)
    }
}

/// Sweep thresholds from 0.10 to 0.90 in fixed steps, keeping the one that
/// maximizes F1 on the given labeled probabilities.
pub fn find_optimal_threshold(labels: &[f64], probabilities: &[f64]) -> ThresholdSelection {
    let mut best = ThresholdSelection {
        threshold: 0.5,
        precision: 0.0,
        recall: 0.0,
        f1: -1.0,
    };

    let steps = ((THRESHOLD_SWEEP_END - THRESHOLD_SWEEP_START) / THRESHOLD_SWEEP_STEP).round()
        as usize;
    for step in 0..=steps {
        let threshold = THRESHOLD_SWEEP_START + step as f64 * THRESHOLD_SWEEP_STEP;
        let counts = Confusion::count(labels, probabilities, threshold);
        let f1 = counts.f1();
        if f1 > best.f1 {
            best = ThresholdSelection {
                threshold,
                precision: counts.precision(),
                recall: counts.recall(),
                f1,
            };
        }
    }

    best
}

/// Area under the ROC curve via the trapezoidal rule.
///
/// Sorts by descending probability, walks the curve grouping tied scores,
/// and integrates. Returns 0.5 for degenerate single-class inputs.
pub fn compute_auc(labels: &[f64], probabilities: &[f64]) -> f64 {
    let positives = labels.iter().filter(|&&l| l >= 0.5).count();
    let negatives = labels.len() - positives;
    if positives == 0 || negatives == 0 {
        return 0.5;
    }

    let mut order: Vec<usize> = (0..labels.len()).collect();
    order.sort_by(|&a, &b| {
        probabilities[b]
            .partial_cmp(&probabilities[a])
            .unwrap_or(Ordering::Equal)
    });

    let mut auc = 0.0;
    let mut tp = 0usize;
    let mut fp = 0usize;
    let mut prev_tpr = 0.0;
    let mut prev_fpr = 0.0;

    let mut i = 0;
    while i < order.len() {
        // Advance through the whole tie group before emitting a ROC point.
        let tied_prob = probabilities[order[i]];
        while i < order.len() && probabilities[order[i]] == tied_prob {
            if labels[order[i]] >= 0.5 {
                tp += 1;
            } else {
                fp += 1;
            }
            i += 1;
        }

        let tpr = tp as f64 / positives as f64;
        let fpr = fp as f64 / negatives as f64;
        auc += (fpr - prev_fpr) * (tpr + prev_tpr) / 2.0;
        prev_tpr = tpr;
        prev_fpr = fpr;
    }

    auc
}

/// Run k-fold cross-validation over a labeled corpus.
///
/// Examples are shuffled once with the training seed and partitioned into
/// `k` folds. Each fold rebuilds the vocabulary and IDF weights from its
/// training folds only, trains from scratch, and calibrates a fold-local
/// threshold before scoring, so no held-out statistics leak into training
/// or into the threshold choice.
pub fn k_fold_cross_validate(
    examples: &[TrainingExample],
    k: usize,
    train_config: &TrainConfig,
    vocabulary_config: &VocabularyConfig,
) -> Result<CrossValidationReport> {
    if k < 2 {
        return Err(SiftError::invalid_argument("cross-validation needs k >= 2"));
    }
    if examples.len() < k {
        return Err(SiftError::training(format!(
            "Cannot split {} examples into {k} folds",
            examples.len()
        )));
    }

    let tokenizer = TextTokenizer::new()?;
    let tokens: Vec<Vec<String>> = examples.iter().map(|e| tokenizer.tokenize(&e.text)).collect();
    let targets: Vec<f64> = examples.iter().map(|e| e.label.as_target()).collect();

    let mut indices: Vec<usize> = (0..examples.len()).collect();
    let mut rng = StdRng::seed_from_u64(train_config.seed);
    indices.shuffle(&mut rng);

    let mut aggregate = EvaluationMetrics::default();
    let mut threshold_sum = 0.0;

    for fold in 0..k {
        let start = fold * indices.len() / k;
        let end = (fold + 1) * indices.len() / k;
        let test_idx = &indices[start..end];
        let train_idx: Vec<usize> = indices[..start]
            .iter()
            .chain(indices[end..].iter())
            .copied()
            .collect();

        let train_tokens: Vec<Vec<String>> =
            train_idx.iter().map(|&i| tokens[i].clone()).collect();
        let vocabulary = Vocabulary::build(&train_tokens, vocabulary_config);
        let idf = vocabulary.idf();

        let train_x: Vec<_> = train_idx.iter().map(|&i| vectorize(&tokens[i], idf)).collect();
        let train_y: Vec<f64> = train_idx.iter().map(|&i| targets[i]).collect();
        let trained = train(&train_x, &train_y, train_config)?;

        let test_y: Vec<f64> = test_idx.iter().map(|&i| targets[i]).collect();
        let test_probs: Vec<f64> = test_idx
            .iter()
            .map(|&i| {
                let vector = vectorize(&tokens[i], idf);
                sigmoid(vector.dot(&trained.weights) + trained.bias)
            })
            .collect();

        let selection = find_optimal_threshold(&test_y, &test_probs);
        let counts = Confusion::count(&test_y, &test_probs, selection.threshold);

        aggregate.accuracy += counts.accuracy();
        aggregate.precision += counts.precision();
        aggregate.recall += counts.recall();
        aggregate.f1 += counts.f1();
        aggregate.auc += compute_auc(&test_y, &test_probs);
        threshold_sum += selection.threshold;

        log::debug!(
            "fold {}/{k}: f1 {:.4}, threshold {:.2}",
            fold + 1,
            counts.f1(),
            selection.threshold
        );
    }

    let folds = k as f64;
    Ok(CrossValidationReport {
        folds: k,
        metrics: EvaluationMetrics {
            accuracy: aggregate.accuracy / folds,
            precision: aggregate.precision / folds,
            recall: aggregate.recall / folds,
            f1: aggregate.f1 / folds,
            auc: aggregate.auc / folds,
        },
        threshold: threshold_sum / folds,
    })
}

/// Evaluate probabilities against labels at a fixed threshold.
pub fn evaluate_at_threshold(
    labels: &[f64],
    probabilities: &[f64],
    threshold: f64,
) -> EvaluationMetrics {
    let counts = Confusion::count(labels, probabilities, threshold);
    EvaluationMetrics {
        accuracy: counts.accuracy(),
        precision: counts.precision(),
        recall: counts.recall(),
        f1: counts.f1(),
        auc: compute_auc(labels, probabilities),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_optimal_threshold_separable() {
        let labels = vec![1.0, 1.0, 1.0, 0.0, 0.0, 0.0];
        let probs = vec![0.95, 0.9, 0.85, 0.2, 0.15, 0.1];

        let selection = find_optimal_threshold(&labels, &probs);

        assert!((selection.f1 - 1.0).abs() < 1e-12);
        assert!(selection.threshold > 0.2 && selection.threshold <= 0.85);
    }

    #[test]
    fn test_threshold_sweep_monotonicity() {
        // On a separable fixture, raising the threshold never increases
        // recall and never decreases precision.
        let labels = vec![1.0, 1.0, 1.0, 1.0, 0.0, 0.0, 0.0, 0.0];
        let probs = vec![0.95, 0.9, 0.8, 0.7, 0.4, 0.3, 0.2, 0.1];

        let mut prev_recall = f64::INFINITY;
        let mut prev_precision = -1.0;
        for step in 2..=18 {
            let threshold = step as f64 * 0.05;
            let counts = Confusion::count(&labels, &probs, threshold);
            assert!(counts.recall() <= prev_recall);
            assert!(counts.precision() >= prev_precision);
            prev_recall = counts.recall();
            prev_precision = counts.precision();
        }
    }

    #[test]
    fn test_auc_perfect_ranking() {
        let labels = vec![1.0, 1.0, 0.0, 0.0];
        let probs = vec![0.9, 0.8, 0.2, 0.1];
        assert!((compute_auc(&labels, &probs) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_auc_reversed_ranking() {
        let labels = vec![0.0, 0.0, 1.0, 1.0];
        let probs = vec![0.9, 0.8, 0.2, 0.1];
        assert!(compute_auc(&labels, &probs).abs() < 1e-12);
    }

    #[test]
    fn test_auc_all_tied() {
        let labels = vec![1.0, 0.0, 1.0, 0.0];
        let probs = vec![0.5, 0.5, 0.5, 0.5];
        assert!((compute_auc(&labels, &probs) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_auc_single_class() {
        let labels = vec![1.0, 1.0];
        let probs = vec![0.9, 0.1];
        assert_eq!(compute_auc(&labels, &probs), 0.5);
    }

    #[test]
    fn test_precision_zero_when_no_positive_predictions() {
        let labels = vec![1.0, 0.0];
        let probs = vec![0.1, 0.1];
        let counts = Confusion::count(&labels, &probs, 0.9);
        assert_eq!(counts.precision(), 0.0);
        assert_eq!(counts.recall(), 0.0);
        assert_eq!(counts.f1(), 0.0);
    }

    #[test]
    fn test_cross_validate_rejects_bad_k() {
        let examples = crate::dataset::synthetic_corpus(5);
        let config = TrainConfig::default();
        let vocab = VocabularyConfig::default();

        assert!(k_fold_cross_validate(&examples, 1, &config, &vocab).is_err());
        assert!(k_fold_cross_validate(&examples[..3], 5, &config, &vocab).is_err());
    }
}
