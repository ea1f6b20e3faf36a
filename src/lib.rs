//! # feedsift
//!
//! Technical-content classification for short-form feed ingestion.
//!
//! ## Features
//!
//! - Tokenization tuned for titles and excerpts (stop filtering, bigrams)
//! - TF-IDF features with document-frequency pruning
//! - Logistic regression fit by seeded per-example SGD
//! - Cross-validated threshold calibration with ROC/AUC reporting
//! - Embedding k-NN runtime with class-prior correction
//! - Fail-safe decision combining and running classification counters

pub mod analysis;
pub mod classify;
pub mod dataset;
pub mod embedding;
pub mod error;
pub mod knn;
pub mod linear;
pub mod vectorize;

// The seams consumed by the ingestion/cleanup collaborators.
pub use classify::{ClassificationResult, ContentClassifier, ContentItem};
pub use embedding::{OpenAiEmbedder, TextEmbedder};
pub use error::{Result, SiftError};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
