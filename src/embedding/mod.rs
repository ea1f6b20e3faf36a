//! Embedding provider seam.
//!
//! The k-NN classifier depends on an external service that maps text to a
//! fixed-length dense vector. [`embedder::TextEmbedder`] is the trait
//! boundary; [`openai::OpenAiEmbedder`] is the production implementation.

pub mod embedder;
pub mod openai;

pub use embedder::{MAX_EMBED_CHARS, TextEmbedder, truncate_for_embedding};
pub use openai::OpenAiEmbedder;
