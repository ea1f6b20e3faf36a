//! feedsift training CLI binary.
//!
//! One-shot batch process: trains the linear model over a labeled corpus,
//! writes the artifact, and exits.

use std::io::Write;
use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use env_logger::Builder;
use log::LevelFilter;

use feedsift::dataset::load_corpus;
use feedsift::embedding::OpenAiEmbedder;
use feedsift::error::Result;
use feedsift::knn::{EmbeddingStore, classifier::DEFAULT_PRODUCTION_CLASS_RATIO, prior_correction};
use feedsift::linear::model::LinearModel;
use feedsift::linear::pipeline::{TrainOptions, train_model};
use feedsift::linear::trainer::TrainConfig;

/// feedsift - technical-content classifier training
#[derive(Parser, Debug)]
#[command(name = "sift-train")]
#[command(about = "Train and inspect feedsift classifier artifacts")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct SiftTrainArgs {
    /// Verbosity level (0=quiet, 1=normal, 2=verbose, 3=debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode (overrides verbose)
    #[arg(short, long)]
    quiet: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    command: Command,
}

impl SiftTrainArgs {
    fn verbosity(&self) -> u8 {
        if self.quiet {
            0
        } else {
            match self.verbose {
                0 => 1,
                n => n,
            }
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Train a linear model from a labeled corpus
    Train(TrainArgs),

    /// Embed a labeled corpus into an embedding store artifact
    Embed(EmbedArgs),

    /// Show a model artifact's metadata
    Stats(StatsArgs),
}

#[derive(Parser, Debug)]
struct TrainArgs {
    /// Labeled corpus JSON file
    #[arg(short, long)]
    corpus: PathBuf,

    /// Output path for the model artifact
    #[arg(short, long)]
    output: PathBuf,

    /// Cross-validation folds
    #[arg(long, default_value_t = 5)]
    folds: usize,

    /// Seed for weight initialization, shuffling, and splits
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// SGD learning rate
    #[arg(long, default_value_t = 0.3)]
    learning_rate: f64,

    /// SGD epochs
    #[arg(long, default_value_t = 200)]
    epochs: usize,

    /// L2 regularization strength
    #[arg(long, default_value_t = 0.01)]
    lambda: f64,
}

#[derive(Parser, Debug)]
struct EmbedArgs {
    /// Labeled corpus JSON file
    #[arg(short, long)]
    corpus: PathBuf,

    /// Output path for the embedding store artifact
    #[arg(short, long)]
    output: PathBuf,

    /// OpenAI API key
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    api_key: String,

    /// Embedding model name
    #[arg(long, default_value = "text-embedding-3-small")]
    model: String,
}

#[derive(Parser, Debug)]
struct StatsArgs {
    /// Model artifact to inspect
    #[arg(short, long)]
    model: PathBuf,
}

fn main() {
    let args = SiftTrainArgs::parse();

    let log_level = match args.verbosity() {
        0 => LevelFilter::Error,
        1 => LevelFilter::Warn,
        2 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };

    Builder::new()
        .filter_level(log_level)
        .format(|buf, record| writeln!(buf, "[{}] {}", record.level(), record.args()))
        .init();

    if let Err(e) = execute_command(args) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn execute_command(args: SiftTrainArgs) -> Result<()> {
    match &args.command {
        Command::Train(train_args) => run_train(train_args),
        Command::Embed(embed_args) => run_embed(embed_args),
        Command::Stats(stats_args) => run_stats(stats_args),
    }
}

fn run_embed(args: &EmbedArgs) -> Result<()> {
    let examples = load_corpus(&args.corpus)?;
    println!(
        "Loaded {} examples from {}",
        examples.len(),
        args.corpus.display()
    );

    let embedder = OpenAiEmbedder::new(args.api_key.clone(), args.model.clone())?;
    let runtime = tokio::runtime::Runtime::new()?;
    let store = runtime.block_on(EmbeddingStore::build(&embedder, &examples))?;

    let train_ratio = store.class_ratio()?;
    println!("Class ratio (non-technical per technical): {train_ratio:.3}");
    println!(
        "Prior correction vs. production ratio {DEFAULT_PRODUCTION_CLASS_RATIO}: {:.2}",
        prior_correction(train_ratio, DEFAULT_PRODUCTION_CLASS_RATIO)?
    );

    store.save(&args.output)?;
    println!(
        "Embedding store ({} vectors, dim {}) written to {}",
        store.len(),
        store.dimension(),
        args.output.display()
    );

    Ok(())
}

fn run_train(args: &TrainArgs) -> Result<()> {
    let examples = load_corpus(&args.corpus)?;
    println!(
        "Loaded {} examples from {}",
        examples.len(),
        args.corpus.display()
    );

    let options = TrainOptions {
        train: TrainConfig {
            learning_rate: args.learning_rate,
            epochs: args.epochs,
            lambda: args.lambda,
            seed: args.seed,
        },
        folds: args.folds,
        ..TrainOptions::new()
    };

    let (model, report) = train_model(&examples, &options)?;

    println!("Cross-validation ({} folds):", report.folds);
    println!("  accuracy:  {:.4}", report.metrics.accuracy);
    println!("  precision: {:.4}", report.metrics.precision);
    println!("  recall:    {:.4}", report.metrics.recall);
    println!("  f1:        {:.4}", report.metrics.f1);
    println!("  auc:       {:.4}", report.metrics.auc);
    println!("Calibrated threshold: {:.2}", report.threshold);

    model.save(&args.output)?;
    println!("Model written to {}", args.output.display());

    Ok(())
}

fn run_stats(args: &StatsArgs) -> Result<()> {
    let model = LinearModel::load(&args.model)?;
    let metadata = &model.metadata;

    println!("Model: {}", args.model.display());
    println!("  trained at:      {}", metadata.trained_at);
    println!("  examples:        {}", metadata.num_examples);
    println!("  vocabulary:      {}", metadata.vocabulary_size);
    println!("  weights:         {}", model.weights.len());
    println!("  threshold:       {:.2}", model.threshold);
    println!("  train accuracy:  {:.4}", metadata.train_accuracy);
    println!("  test accuracy:   {:.4}", metadata.test_accuracy);
    println!("  test precision:  {:.4}", metadata.test_precision);
    println!("  test recall:     {:.4}", metadata.test_recall);
    println!("  test f1:         {:.4}", metadata.test_f1);
    println!("  auc:             {:.4}", metadata.auc);

    Ok(())
}
