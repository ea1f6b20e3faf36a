//! Stochastic gradient descent for L2-regularized logistic regression.
//!
//! Plain per-example SGD with a fresh shuffle each epoch. No mini-batching,
//! no learning-rate decay. The random source is seeded so weight
//! initialization and shuffle order are reproducible.

use std::collections::{BTreeSet, HashMap};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::error::{Result, SiftError};
use crate::vectorize::SparseVector;

/// Hyperparameters for the SGD trainer.
#[derive(Debug, Clone)]
pub struct TrainConfig {
    /// Step size for weight updates.
    pub learning_rate: f64,
    /// Number of full passes over the training set.
    pub epochs: usize,
    /// L2 regularization strength.
    pub lambda: f64,
    /// Seed for weight initialization and epoch shuffling.
    pub seed: u64,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.3,
            epochs: 200,
            lambda: 0.01,
            seed: 42,
        }
    }
}

/// Weights and bias produced by [`train`].
#[derive(Debug, Clone)]
pub struct TrainedWeights {
    /// Term -> learned weight.
    pub weights: HashMap<String, f64>,
    /// Learned intercept.
    pub bias: f64,
    /// Mean cross-entropy loss over the final epoch.
    pub final_loss: f64,
}

/// Logistic sigmoid with overflow clamping.
///
/// `z` saturates at ±500; beyond that `exp` would overflow to infinity
/// without changing the result.
pub fn sigmoid(z: f64) -> f64 {
    let z = z.clamp(-500.0, 500.0);
    1.0 / (1.0 + (-z).exp())
}

/// Fit logistic-regression weights over sparse TF-IDF vectors.
///
/// Weights are initialized to small uniform noise (zero initialization
/// leaves symmetric features indistinguishable), bias to zero. Each epoch
/// shuffles the example order, then for every example applies
/// `w[t] -= lr * (error * x[t] + lambda * w[t])` over its active terms and
/// `bias -= lr * error`.
pub fn train(x: &[SparseVector], y: &[f64], config: &TrainConfig) -> Result<TrainedWeights> {
    if x.is_empty() {
        return Err(SiftError::training("Training set is empty"));
    }
    if x.len() != y.len() {
        return Err(SiftError::training(format!(
            "Feature/label length mismatch: {} vs {}",
            x.len(),
            y.len()
        )));
    }

    let mut rng = StdRng::seed_from_u64(config.seed);

    // Sorted term order keeps the drawn initial values stable for a seed.
    let terms: BTreeSet<&str> = x.iter().flat_map(|v| v.iter().map(|(t, _)| t)).collect();
    let mut weights: HashMap<String, f64> = terms
        .into_iter()
        .map(|term| (term.to_string(), rng.random_range(-0.01..0.01)))
        .collect();
    let mut bias = 0.0;

    let mut indices: Vec<usize> = (0..x.len()).collect();
    let mut epoch_loss = 0.0;

    for epoch in 0..config.epochs {
        indices.shuffle(&mut rng);
        epoch_loss = 0.0;

        for &i in &indices {
            let z = x[i].dot(&weights) + bias;
            let pred = sigmoid(z);
            let error = pred - y[i];

            epoch_loss += cross_entropy(y[i], pred);

            for (term, value) in x[i].iter() {
                if let Some(weight) = weights.get_mut(term) {
                    *weight -= config.learning_rate * (error * value + config.lambda * *weight);
                }
            }
            bias -= config.learning_rate * error;
        }

        epoch_loss /= x.len() as f64;
        if (epoch + 1) % 50 == 0 {
            log::debug!("epoch {}: mean loss {:.6}", epoch + 1, epoch_loss);
        }
    }

    Ok(TrainedWeights {
        weights,
        bias,
        final_loss: epoch_loss,
    })
}

fn cross_entropy(y: f64, pred: f64) -> f64 {
    let pred = pred.clamp(1e-12, 1.0 - 1e-12);
    -(y * pred.ln() + (1.0 - y) * (1.0 - pred).ln())
}
