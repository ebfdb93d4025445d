use serde::{Deserialize, Serialize};

/// Per-epoch statistics emitted by `train_loop`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpochStats {
    /// 1-based epoch number.
    pub epoch: usize,
    pub total_epochs: usize,
    /// Mean sum-of-squares error over the samples trained this epoch.
    pub train_loss: f64,
    /// Fraction of the test set classified correctly after the epoch, if a
    /// test set was provided.
    pub test_accuracy: Option<f64>,
    /// Wall-clock duration of the epoch in milliseconds.
    pub elapsed_ms: u64,
}

/// Outcome of one `TrainingSession::tick`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickReport {
    /// Index of the training sample used for the update.
    pub trained_index: usize,
    pub trained_label: usize,
    /// Index of the test sample that was classified.
    pub tested_index: usize,
    pub label: usize,
    pub guess: usize,
    pub correct: bool,
}

/// Running totals of a `TrainingSession`, shaped for the status endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionStats {
    pub ticks: u64,
    /// Completed passes over the training set.
    pub epochs: usize,
    /// Position within the current epoch, in percent.
    pub epoch_progress_pct: f64,
    /// Correct test guesses over all guesses so far; 0 before the first tick.
    pub accuracy: f64,
    pub total_correct: u64,
    pub total_guesses: u64,
}

/// Accuracy and loss of a network over a labeled set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub correct: usize,
    pub total: usize,
    pub accuracy: f64,
    /// Mean sum-of-squares error against the soft one-hot targets.
    pub mean_loss: f64,
}
