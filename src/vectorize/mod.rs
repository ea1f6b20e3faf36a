//! TF-IDF feature extraction for feed text.
//!
//! [`Vocabulary`] is built once from a training corpus (document-frequency
//! pruning plus per-term IDF weights); [`vectorize`] turns token lists into
//! sparse TF-IDF vectors against that frozen vocabulary.

pub mod tfidf;
pub mod vocabulary;

pub use tfidf::{SparseVector, vectorize};
pub use vocabulary::{Vocabulary, VocabularyConfig};
