use std::sync::mpsc;
use std::sync::{atomic::AtomicBool, Arc};

use crate::train::epoch_stats::EpochStats;

/// Configuration for `train_loop` and `TrainingSession`.
///
/// # Fields
/// - `epochs`           — full passes over the training data (`train_loop` only)
/// - `shuffle`          — reshuffle sample order every epoch (`train_loop` only)
/// - `test_every_ticks` — a `TrainingSession` moves on to the next test sample
///                        once every this many ticks
/// - `log_every`        — log progress every this many ticks / samples; `0`
///                        disables periodic logging
/// - `progress_tx`      — optional channel; one `EpochStats` per completed
///                        epoch. A dropped receiver ends training early.
/// - `stop_flag`        — optional atomic flag; when set the loop stops after
///                        the current sample.
pub struct TrainConfig {
    pub epochs: usize,
    pub shuffle: bool,
    pub test_every_ticks: usize,
    pub log_every: usize,
    pub progress_tx: Option<mpsc::Sender<EpochStats>>,
    pub stop_flag: Option<Arc<AtomicBool>>,
}

impl TrainConfig {
    /// Creates a `TrainConfig` with no progress channel and no stop flag.
    pub fn new(epochs: usize) -> Self {
        TrainConfig {
            epochs,
            ..TrainConfig::default()
        }
    }
}

impl Default for TrainConfig {
    fn default() -> Self {
        TrainConfig {
            epochs: 1,
            shuffle: true,
            test_every_ticks: 30,
            log_every: 1000,
            progress_tx: None,
            stop_flag: None,
        }
    }
}
