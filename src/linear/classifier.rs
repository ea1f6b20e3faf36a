//! Runtime linear classifier.

use std::path::Path;

use crate::analysis::TextTokenizer;
use crate::error::Result;
use crate::linear::model::LinearModel;
use crate::linear::trainer::sigmoid;
use crate::vectorize::vectorize;

/// A single classification verdict from the linear model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearPrediction {
    /// Probability that the text is technical, in [0, 1].
    pub probability: f64,
    /// Whether the probability clears the model's calibrated threshold.
    pub is_technical: bool,
}

/// Applies a trained [`LinearModel`] to new text.
///
/// Classification is a pure function of `(text, model)`: the loaded model
/// is read-only state, so one classifier may be shared by concurrent
/// callers without locking.
#[derive(Debug)]
pub struct LinearClassifier {
    model: LinearModel,
    tokenizer: TextTokenizer,
}

impl LinearClassifier {
    /// Create a classifier from a validated model.
    pub fn new(model: LinearModel) -> Result<Self> {
        model.validate()?;
        Ok(Self {
            model,
            tokenizer: TextTokenizer::new()?,
        })
    }

    /// Load the model artifact from disk and build a classifier.
    pub fn from_path(path: &Path) -> Result<Self> {
        Self::new(LinearModel::load(path)?)
    }

    /// Classify text, returning a probability and threshold verdict.
    ///
    /// Text that yields no in-vocabulary features (including empty input)
    /// falls back to probability 0.0, i.e. non-technical, rather than
    /// scoring on the bias alone.
    pub fn classify(&self, text: &str) -> LinearPrediction {
        let tokens = self.tokenizer.tokenize(text);
        let vector = vectorize(&tokens, &self.model.idf);

        let probability = if vector.is_empty() {
            0.0
        } else {
            sigmoid(vector.dot(&self.model.weights) + self.model.bias)
        };

        LinearPrediction {
            probability,
            is_technical: probability >= self.model.threshold,
        }
    }

    /// Access the underlying model.
    pub fn model(&self) -> &LinearModel {
        &self.model
    }
}
