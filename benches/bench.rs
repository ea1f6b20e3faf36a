//! Criterion benchmarks for feedsift.
//!
//! Covers the hot paths of both classifier runtimes:
//! - Tokenization and TF-IDF vectorization
//! - Linear classification
//! - k-NN scoring over a precomputed embedding store

use std::hint::black_box;
use std::sync::Arc;

use async_trait::async_trait;
use criterion::{Criterion, criterion_group, criterion_main};

use feedsift::analysis::TextTokenizer;
use feedsift::dataset::synthetic_corpus;
use feedsift::embedding::TextEmbedder;
use feedsift::error::Result;
use feedsift::knn::{EmbeddingStore, KnnClassifier, KnnConfig};
use feedsift::linear::classifier::LinearClassifier;
use feedsift::linear::pipeline::{TrainOptions, train_model};
use feedsift::vectorize::{Vocabulary, VocabularyConfig, vectorize};

const SAMPLE_TITLE: &str =
    "Kubernetes deployment strategies for low-latency database clusters in production";

#[derive(Debug)]
struct NoopEmbedder;

#[async_trait]
impl TextEmbedder for NoopEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Ok(vec![0.0; 8])
    }

    fn dimension(&self) -> usize {
        8
    }

    fn name(&self) -> &str {
        "noop"
    }
}

/// Deterministic pseudo-embeddings for the store scan bench.
fn generated_store(size: usize) -> EmbeddingStore {
    let mut embeddings = Vec::with_capacity(size);
    let mut labels = Vec::with_capacity(size);
    let mut texts = Vec::with_capacity(size);

    for i in 0..size {
        let vector: Vec<f32> = (0..8)
            .map(|d| ((i * 7 + d * 11) % 13) as f32 / 13.0)
            .collect();
        embeddings.push(vector);
        labels.push((i % 2) as u8);
        texts.push(format!("example {i}"));
    }

    EmbeddingStore::new(embeddings, labels, texts).unwrap()
}

fn bench_tokenizer(c: &mut Criterion) {
    let tokenizer = TextTokenizer::new().unwrap();

    c.bench_function("tokenize_title", |b| {
        b.iter(|| tokenizer.tokenize(black_box(SAMPLE_TITLE)))
    });
}

fn bench_vectorize(c: &mut Criterion) {
    let tokenizer = TextTokenizer::new().unwrap();
    let corpus = synthetic_corpus(100);
    let documents: Vec<Vec<String>> = corpus.iter().map(|e| tokenizer.tokenize(&e.text)).collect();
    let vocabulary = Vocabulary::build(&documents, &VocabularyConfig::default());
    let tokens = tokenizer.tokenize(SAMPLE_TITLE);

    c.bench_function("vectorize_title", |b| {
        b.iter(|| vectorize(black_box(&tokens), vocabulary.idf()))
    });
}

fn bench_linear_classify(c: &mut Criterion) {
    let corpus = synthetic_corpus(50);
    let (model, _) = train_model(&corpus, &TrainOptions::new()).unwrap();
    let classifier = LinearClassifier::new(model).unwrap();

    c.bench_function("linear_classify", |b| {
        b.iter(|| classifier.classify(black_box(SAMPLE_TITLE)))
    });
}

fn bench_knn_scoring(c: &mut Criterion) {
    let query: Vec<f32> = (0..8).map(|d| (d as f32) / 8.0).collect();

    for size in [100usize, 1000] {
        let classifier = KnnClassifier::new(
            generated_store(size),
            Arc::new(NoopEmbedder),
            KnnConfig::default(),
        )
        .unwrap();

        c.bench_function(&format!("knn_score_store_{size}"), |b| {
            b.iter(|| classifier.classify_embedding(black_box(&query)))
        });
    }
}

criterion_group!(
    benches,
    bench_tokenizer,
    bench_vectorize,
    bench_linear_classify,
    bench_knn_scoring
);
criterion_main!(benches);
