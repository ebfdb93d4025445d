//! sketch-nn sketchpad
//!
//! Trains a digit classifier in the background and lets you draw digits in
//! the browser to see what the network currently thinks they are.
//!
//! Run with:
//!   cargo run --bin sketchpad --release -- --train-path data/mnist_train.csv --test-path data/mnist_test.csv
//! Then open http://127.0.0.1:7878

mod handlers;
mod routes;
mod state;
mod trainer;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use tiny_http::Server;

use sketch_nn::data::csv::load_csv;
use sketch_nn::{NetworkSpec, NeuralNetwork, TrainConfig, TrainingSession};

use state::SketchState;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Path of the training dataset (MNIST CSV)
    #[arg(short, long)]
    train_path: PathBuf,

    /// Path of the test dataset the running accuracy is measured on
    #[arg(short = 'v', long)]
    test_path: PathBuf,

    /// Network spec JSON for a fresh network
    #[arg(short, long, conflicts_with = "model")]
    spec: Option<PathBuf>,

    /// Continue training a previously saved model instead
    #[arg(short, long)]
    model: Option<PathBuf>,

    /// Where the "save model" button writes
    #[arg(long, default_value = "model.json")]
    save_to: PathBuf,

    /// Address to serve the page on
    #[arg(short, long, default_value = "127.0.0.1:7878")]
    addr: String,

    /// Milliseconds between training ticks; 0 trains flat out
    #[arg(long, default_value_t = 16)]
    tick_ms: u64,

    /// Ticks between moves to the next test sample
    #[arg(long, default_value_t = 30)]
    test_every: usize,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let network = match &args.model {
        Some(path) => NeuralNetwork::load_json(path)
            .with_context(|| format!("loading model {}", path.display()))?,
        None => {
            let spec = match &args.spec {
                Some(path) => NetworkSpec::load_json(path)
                    .with_context(|| format!("reading spec {}", path.display()))?,
                None => NetworkSpec::default(),
            };
            spec.build()?
        }
    };

    let n_classes = network.output_nodes();
    let training = load_csv(&args.train_path, n_classes)
        .with_context(|| format!("loading {}", args.train_path.display()))?;
    let testing = load_csv(&args.test_path, n_classes)
        .with_context(|| format!("loading {}", args.test_path.display()))?;

    let config = TrainConfig {
        test_every_ticks: args.test_every,
        ..TrainConfig::default()
    };
    let session = TrainingSession::new(network, training, testing, &config)?;
    let state = Arc::new(SketchState::new(session, args.save_to.clone()));

    let server = Server::http(&args.addr)
        .map_err(|e| anyhow::anyhow!("failed to bind {}: {}", args.addr, e))?;

    println!("╔══════════════════════════════════════════════╗");
    println!("║          sketch-nn sketchpad                 ║");
    println!("╠══════════════════════════════════════════════╣");
    println!("║  Open in your browser:                       ║");
    println!("║  http://{:<37}║", args.addr);
    println!("╚══════════════════════════════════════════════╝");

    trainer::spawn(state.clone(), Duration::from_millis(args.tick_ms));

    // One thread per request; the session mutex serializes network access.
    for request in server.incoming_requests() {
        let state_clone = state.clone();
        std::thread::spawn(move || {
            routes::dispatch(request, state_clone);
        });
    }

    info!("server stopped");
    Ok(())
}
