//! End-to-end scenarios for the offline linear pipeline:
//! train -> calibrate -> serialize -> classify.

use feedsift::dataset::{Label, synthetic_corpus};
use feedsift::linear::classifier::LinearClassifier;
use feedsift::linear::pipeline::{TrainOptions, train_model};

fn trained_classifier() -> (LinearClassifier, feedsift::linear::CrossValidationReport) {
    let examples = synthetic_corpus(30);
    let (model, report) = train_model(&examples, &TrainOptions::new()).unwrap();
    (LinearClassifier::new(model).unwrap(), report)
}

#[test]
fn test_end_to_end_classification_skew() {
    let (classifier, _) = trained_classifier();
    let examples = synthetic_corpus(30);

    let mut correct = 0;
    for example in &examples {
        let prediction = classifier.classify(&example.text);
        let expected = example.label == Label::Technical;
        if prediction.is_technical == expected {
            correct += 1;
        }
    }

    // The synthetic corpus is separable; training accuracy should be
    // near-perfect.
    assert!(
        correct as f64 / examples.len() as f64 > 0.9,
        "only {correct}/{} training examples classified correctly",
        examples.len()
    );
}

#[test]
fn test_probability_range_and_threshold_consistency() {
    let (classifier, _) = trained_classifier();

    let texts = [
        "rust compiler kubernetes deployment database",
        "election policy senate debate celebrity",
        "rust election compiler policy",
        "words the model has never seen",
        "",
    ];
    for text in texts {
        let prediction = classifier.classify(text);
        assert!(
            (0.0..=1.0).contains(&prediction.probability),
            "probability {} out of range for {text:?}",
            prediction.probability
        );
        assert_eq!(
            prediction.is_technical,
            prediction.probability >= classifier.model().threshold
        );
    }
}

#[test]
fn test_classification_is_deterministic() {
    let (classifier, _) = trained_classifier();

    let text = "machine learning optimization cluster";
    let a = classifier.classify(text);
    let b = classifier.classify(text);

    assert_eq!(a.probability.to_bits(), b.probability.to_bits());
    assert_eq!(a.is_technical, b.is_technical);
}

#[test]
fn test_training_is_reproducible_for_a_seed() {
    let examples = synthetic_corpus(30);
    let options = TrainOptions::new();

    let (model_a, report_a) = train_model(&examples, &options).unwrap();
    let (model_b, report_b) = train_model(&examples, &options).unwrap();

    assert_eq!(report_a.threshold, report_b.threshold);
    assert_eq!(model_a.bias, model_b.bias);
    assert_eq!(model_a.weights.len(), model_b.weights.len());
    for (term, weight) in &model_a.weights {
        assert_eq!(weight, &model_b.weights[term]);
    }
}

#[test]
fn test_cross_validation_f1_is_sane() {
    let examples = synthetic_corpus(30);
    let (_, report) = train_model(&examples, &TrainOptions::new()).unwrap();

    // A broken trainer collapses F1 to 0 (or a degenerate 1.0-everywhere
    // vote); a balanced separable corpus must land strictly inside (0, 1].
    assert!(report.metrics.f1 > 0.5, "cv f1 {}", report.metrics.f1);
    assert!(report.metrics.f1 <= 1.0);
    assert!(report.metrics.auc > 0.5);
    assert!(report.threshold > 0.0 && report.threshold < 1.0);
}

#[test]
fn test_artifact_round_trip_preserves_predictions() {
    let (classifier, _) = trained_classifier();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model.json");

    classifier.model().save(&path).unwrap();
    let reloaded = LinearClassifier::from_path(&path).unwrap();

    for text in [
        "kubernetes cluster deployment",
        "celebrity wedding festival",
        "rust database cache",
    ] {
        let before = classifier.classify(text);
        let after = reloaded.classify(text);
        assert_eq!(before.probability.to_bits(), after.probability.to_bits());
        assert_eq!(before.is_technical, after.is_technical);
    }
}

#[test]
fn test_model_metadata_populated() {
    let examples = synthetic_corpus(30);
    let (model, _) = train_model(&examples, &TrainOptions::new()).unwrap();

    assert_eq!(model.metadata.num_examples, examples.len());
    assert!(model.metadata.vocabulary_size > 0);
    assert!(model.metadata.train_accuracy > 0.9);
    assert!(model.metadata.test_accuracy > 0.5);
    assert!(!model.weights.is_empty());
    assert!(model.weights.len() <= model.idf.len());
}
