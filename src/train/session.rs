use log::{debug, info};

use crate::data::encoding::argmax;
use crate::data::sample::Sample;
use crate::error::{DatasetError, ShapeError};
use crate::network::network::NeuralNetwork;
use crate::train::epoch_stats::{SessionStats, TickReport};
use crate::train::loop_fn::check_samples;
use crate::train::train_config::TrainConfig;

/// Tick-driven trainer behind the interactive demo.
///
/// Each `tick` trains on the next training sample and classifies the current
/// test sample, keeping a running accuracy tally. The test sample only moves
/// on every `test_every_ticks` ticks so a viewer can follow it. The session
/// knows nothing about frames or rendering; whoever owns it decides the
/// cadence.
pub struct TrainingSession {
    network: NeuralNetwork,
    training: Vec<Sample>,
    testing: Vec<Sample>,
    test_every_ticks: u64,
    log_every: u64,
    training_index: usize,
    testing_index: usize,
    epochs: usize,
    ticks: u64,
    total_correct: u64,
    total_guesses: u64,
    last_report: Option<TickReport>,
}

impl TrainingSession {
    /// Takes ownership of the network and both sample sets. Both sets must be
    /// non-empty and fit the network's layers.
    pub fn new(
        network: NeuralNetwork,
        training: Vec<Sample>,
        testing: Vec<Sample>,
        config: &TrainConfig,
    ) -> Result<TrainingSession, DatasetError> {
        check_samples(&network, &training)?;
        check_samples(&network, &testing)?;
        info!(
            "session ready: {} training / {} test samples, network {}-{}-{}",
            training.len(),
            testing.len(),
            network.input_nodes(),
            network.hidden_nodes(),
            network.output_nodes()
        );

        Ok(TrainingSession {
            network,
            training,
            testing,
            test_every_ticks: config.test_every_ticks.max(1) as u64,
            log_every: config.log_every as u64,
            training_index: 0,
            testing_index: 0,
            epochs: 0,
            ticks: 0,
            total_correct: 0,
            total_guesses: 0,
            last_report: None,
        })
    }

    /// One train step followed by one test guess.
    pub fn tick(&mut self) -> Result<TickReport, ShapeError> {
        let n_classes = self.network.output_nodes();

        let trained_index = self.training_index;
        let sample = &self.training[trained_index];
        self.network.train(&sample.inputs(), &sample.target(n_classes))?;
        let trained_label = sample.label;

        self.training_index += 1;
        if self.training_index == self.training.len() {
            self.training_index = 0;
            self.epochs += 1;
            info!("epoch {} complete, running accuracy {:.2}%", self.epochs, self.accuracy() * 100.0);
        }

        let tested_index = self.testing_index;
        let test = &self.testing[tested_index];
        let guess = argmax(&self.network.query(&test.inputs())?);
        let correct = guess == test.label;

        self.total_guesses += 1;
        if correct {
            self.total_correct += 1;
        }

        self.ticks += 1;
        if self.ticks % self.test_every_ticks == 0 {
            self.testing_index = (self.testing_index + 1) % self.testing.len();
        }
        if self.log_every > 0 && self.ticks % self.log_every == 0 {
            debug!("tick {}: accuracy {:.4}", self.ticks, self.accuracy());
        }

        let report = TickReport {
            trained_index,
            trained_label,
            tested_index,
            label: test.label,
            guess,
            correct,
        };
        self.last_report = Some(report.clone());
        Ok(report)
    }

    /// Classifies an arbitrary input, e.g. a user drawing.
    pub fn classify(&self, input: &[f64]) -> Result<(usize, Vec<f64>), ShapeError> {
        let outputs = self.network.query(input)?;
        Ok((argmax(&outputs), outputs))
    }

    pub fn stats(&self) -> SessionStats {
        SessionStats {
            ticks: self.ticks,
            epochs: self.epochs,
            epoch_progress_pct: 100.0 * self.training_index as f64 / self.training.len() as f64,
            accuracy: self.accuracy(),
            total_correct: self.total_correct,
            total_guesses: self.total_guesses,
        }
    }

    fn accuracy(&self) -> f64 {
        if self.total_guesses == 0 {
            0.0
        } else {
            self.total_correct as f64 / self.total_guesses as f64
        }
    }

    pub fn last_report(&self) -> Option<&TickReport> {
        self.last_report.as_ref()
    }

    pub fn training_sample(&self, index: usize) -> Option<&Sample> {
        self.training.get(index)
    }

    pub fn testing_sample(&self, index: usize) -> Option<&Sample> {
        self.testing.get(index)
    }

    pub fn network(&self) -> &NeuralNetwork {
        &self.network
    }
}
