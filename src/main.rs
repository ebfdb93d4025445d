use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use log::info;

use sketch_nn::data::csv::load_csv;
use sketch_nn::data::image::canvas_to_input;
use sketch_nn::network::spec::IMAGE_SIDE;
use sketch_nn::{evaluate, train_loop, NetworkSpec, NeuralNetwork, TrainConfig};

/// Train, evaluate and query a three-layer digit classifier.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Train a new network on an MNIST-style CSV and save it as JSON
    Train(TrainArgs),
    /// Report the accuracy of a saved network on a CSV dataset
    Evaluate {
        /// Path of the saved model JSON
        #[arg(short, long)]
        model: PathBuf,

        /// Path of the labeled CSV dataset
        #[arg(short, long)]
        data: PathBuf,
    },
    /// Classify a single image file with a saved network
    Classify {
        /// Path of the saved model JSON
        #[arg(short, long)]
        model: PathBuf,

        /// Image of a light digit on a dark background
        #[arg(short, long)]
        image: PathBuf,
    },
}

#[derive(Args, Debug)]
struct TrainArgs {
    /// Path of the training dataset
    #[arg(short, long)]
    train_path: PathBuf,

    /// Path of the test dataset, evaluated after every epoch
    #[arg(short = 'v', long)]
    test_path: Option<PathBuf>,

    /// Network spec JSON; the flags below override its fields
    #[arg(short, long)]
    spec: Option<PathBuf>,

    /// Number of hidden nodes
    #[arg(long)]
    hidden_nodes: Option<usize>,

    /// Learning rate of the network
    #[arg(short, long)]
    learning_rate: Option<f64>,

    /// Seed for the initial weights
    #[arg(long)]
    seed: Option<u64>,

    /// Number of epochs to train for
    #[arg(short, long, default_value_t = 1)]
    epochs: usize,

    /// Keep the dataset order instead of shuffling every epoch
    #[arg(long)]
    no_shuffle: bool,

    /// Where to write the trained model
    #[arg(short, long, default_value = "model.json")]
    out: PathBuf,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match Cli::parse().command {
        Command::Train(args) => run_train(args),
        Command::Evaluate { model, data } => run_evaluate(&model, &data),
        Command::Classify { model, image } => run_classify(&model, &image),
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    let mut spec = match &args.spec {
        Some(path) => NetworkSpec::load_json(path)
            .with_context(|| format!("reading spec {}", path.display()))?,
        None => NetworkSpec::default(),
    };
    if let Some(hidden) = args.hidden_nodes {
        spec.hidden_nodes = hidden;
    }
    if let Some(lr) = args.learning_rate {
        spec.learning_rate = lr;
    }
    if args.seed.is_some() {
        spec.seed = args.seed;
    }

    let training = load_csv(&args.train_path, spec.output_nodes)
        .with_context(|| format!("loading {}", args.train_path.display()))?;
    let testing = match &args.test_path {
        Some(path) => Some(
            load_csv(path, spec.output_nodes).with_context(|| format!("loading {}", path.display()))?,
        ),
        None => None,
    };
    info!("loaded {} training samples", training.len());

    let mut network = spec.build()?;
    let config = TrainConfig {
        shuffle: !args.no_shuffle,
        ..TrainConfig::new(args.epochs)
    };
    train_loop(&mut network, &training, testing.as_deref(), &config)?;

    network
        .save_json(&args.out)
        .with_context(|| format!("writing {}", args.out.display()))?;
    info!("model saved to {}", args.out.display());
    Ok(())
}

fn run_evaluate(model: &Path, data: &Path) -> Result<()> {
    let network = NeuralNetwork::load_json(model)
        .with_context(|| format!("loading model {}", model.display()))?;
    let samples = load_csv(data, network.output_nodes())
        .with_context(|| format!("loading {}", data.display()))?;

    let eval = evaluate(&network, &samples)?;
    println!(
        "accuracy: {:.2}% ({}/{}), mean loss {:.5}",
        eval.accuracy * 100.0,
        eval.correct,
        eval.total,
        eval.mean_loss
    );
    Ok(())
}

fn run_classify(model: &Path, image: &Path) -> Result<()> {
    let network = NeuralNetwork::load_json(model)
        .with_context(|| format!("loading model {}", model.display()))?;
    let side = IMAGE_SIDE as usize;
    if network.input_nodes() != side * side {
        bail!(
            "model expects {} inputs, images are down-sampled to {}x{}",
            network.input_nodes(),
            side,
            side
        );
    }

    let bytes = std::fs::read(image).with_context(|| format!("reading {}", image.display()))?;
    let input = canvas_to_input(&bytes, IMAGE_SIDE)?;
    let outputs = network.query(&input)?;
    let guess = network.classify(&input)?;

    println!("guess: {}", guess);
    for (digit, activation) in outputs.iter().enumerate() {
        println!("  {}: {:.4}", digit, activation);
    }
    Ok(())
}
