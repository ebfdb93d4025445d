use std::sync::atomic::Ordering;
use std::time::Instant;

use log::{debug, info};
use rand::seq::SliceRandom;

use crate::data::encoding::argmax;
use crate::data::sample::Sample;
use crate::error::{DatasetError, ShapeError};
use crate::loss::sse::SumSquaredError;
use crate::network::network::NeuralNetwork;
use crate::train::epoch_stats::{EpochStats, Evaluation};
use crate::train::train_config::TrainConfig;

// ---------------------------------------------------------------------------
// Public entry points
// ---------------------------------------------------------------------------

/// Trains `network` online, one sample per `train` call, for `config.epochs`
/// epochs and returns the statistics of the last completed epoch.
///
/// # Early termination
/// The loop stops before the next sample when `config.stop_flag` is set, and
/// after an epoch when the `progress_tx` receiver has been dropped. A partly
/// finished epoch produces no `EpochStats`.
///
/// # Errors
/// Fails up front, before any update, when a set is empty or a sample does not
/// fit the network's input or output layer.
pub fn train_loop(
    network: &mut NeuralNetwork,
    training: &[Sample],
    testing: Option<&[Sample]>,
    config: &TrainConfig,
) -> Result<Option<EpochStats>, DatasetError> {
    check_samples(network, training)?;
    if let Some(testing) = testing {
        check_samples(network, testing)?;
    }

    let n_classes = network.output_nodes();
    let mut order: Vec<usize> = (0..training.len()).collect();
    let mut last = None;

    'epochs: for epoch in 1..=config.epochs {
        let t_start = Instant::now();
        if config.shuffle {
            order.shuffle(&mut rand::thread_rng());
        }

        let mut total_loss = 0.0;
        for (step, &idx) in order.iter().enumerate() {
            if stop_requested(config) {
                info!("training stopped during epoch {}", epoch);
                break 'epochs;
            }

            let sample = &training[idx];
            let inputs = sample.inputs();
            let target = sample.target(n_classes);

            let outputs = network.train_and_report(&inputs, &target)?;
            total_loss += SumSquaredError::loss(&outputs, &target);

            if config.log_every > 0 && (step + 1) % config.log_every == 0 {
                debug!(
                    "epoch {} sample {}/{}: mean loss {:.5}",
                    epoch,
                    step + 1,
                    training.len(),
                    total_loss / (step + 1) as f64
                );
            }
        }

        let test_accuracy = match testing {
            Some(testing) => Some(evaluate(network, testing)?.accuracy),
            None => None,
        };

        let stats = EpochStats {
            epoch,
            total_epochs: config.epochs,
            train_loss: total_loss / training.len() as f64,
            test_accuracy,
            elapsed_ms: t_start.elapsed().as_millis() as u64,
        };

        match stats.test_accuracy {
            Some(acc) => info!(
                "epoch {}/{}: loss {:.5}, test accuracy {:.2}% ({} ms)",
                epoch, config.epochs, stats.train_loss, acc * 100.0, stats.elapsed_ms
            ),
            None => info!(
                "epoch {}/{}: loss {:.5} ({} ms)",
                epoch, config.epochs, stats.train_loss, stats.elapsed_ms
            ),
        }

        last = Some(stats.clone());

        if let Some(ref tx) = config.progress_tx {
            // If the receiver has been dropped, stop training.
            if tx.send(stats).is_err() {
                break;
            }
        }
    }

    Ok(last)
}

/// Classifies every sample and reports accuracy and mean loss.
pub fn evaluate(network: &NeuralNetwork, samples: &[Sample]) -> Result<Evaluation, DatasetError> {
    check_samples(network, samples)?;

    let n_classes = network.output_nodes();
    let mut correct = 0;
    let mut total_loss = 0.0;
    for sample in samples {
        let output = network.query(&sample.inputs())?;
        total_loss += SumSquaredError::loss(&output, &sample.target(n_classes));
        if argmax(&output) == sample.label {
            correct += 1;
        }
    }

    let total = samples.len();
    Ok(Evaluation {
        correct,
        total,
        accuracy: correct as f64 / total as f64,
        mean_loss: total_loss / total as f64,
    })
}

/// Checks that a sample set is non-empty and fits the network's layers.
pub fn check_samples(network: &NeuralNetwork, samples: &[Sample]) -> Result<(), DatasetError> {
    if samples.is_empty() {
        return Err(DatasetError::Empty);
    }
    for sample in samples {
        if sample.pixels.len() != network.input_nodes() {
            return Err(
                ShapeError::length("sample pixels", network.input_nodes(), sample.pixels.len()).into(),
            );
        }
        if sample.label >= network.output_nodes() {
            return Err(DatasetError::Label {
                label: sample.label,
                n_classes: network.output_nodes(),
            });
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

fn stop_requested(config: &TrainConfig) -> bool {
    config
        .stop_flag
        .as_ref()
        .map(|flag| flag.load(Ordering::Relaxed))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;
    use std::sync::{mpsc, Arc};

    /// Two 4-pixel "digits": bright left half is class 0, bright right half is class 1.
    fn toy_set() -> Vec<Sample> {
        vec![
            Sample::new(0, vec![255.0, 255.0, 0.0, 0.0]),
            Sample::new(1, vec![0.0, 0.0, 255.0, 255.0]),
            Sample::new(0, vec![200.0, 230.0, 10.0, 0.0]),
            Sample::new(1, vec![0.0, 20.0, 240.0, 210.0]),
        ]
    }

    #[test]
    fn loop_learns_toy_set() {
        let mut nn = NeuralNetwork::with_seed(4, 6, 2, 0.5, 21).unwrap();
        let data = toy_set();
        let config = TrainConfig { shuffle: false, ..TrainConfig::new(300) };

        let stats = train_loop(&mut nn, &data, Some(data.as_slice()), &config).unwrap().unwrap();
        assert_eq!(stats.epoch, 300);
        assert_eq!(stats.test_accuracy, Some(1.0));
        assert!(evaluate(&nn, &data).unwrap().mean_loss < 0.05);
    }

    #[test]
    fn loop_rejects_mismatched_samples_before_training() {
        let mut nn = NeuralNetwork::with_seed(3, 2, 2, 0.1, 1).unwrap();
        let before = nn.clone();
        let res = train_loop(&mut nn, &toy_set(), None, &TrainConfig::new(1));
        assert!(matches!(res, Err(DatasetError::Shape(_))));
        assert_eq!(nn, before);

        let mut nn = NeuralNetwork::with_seed(4, 2, 1, 0.1, 1).unwrap();
        let res = train_loop(&mut nn, &toy_set(), None, &TrainConfig::new(1));
        assert!(matches!(res, Err(DatasetError::Label { label: 1, n_classes: 1 })));
    }

    #[test]
    fn stop_flag_halts_before_first_update() {
        let mut nn = NeuralNetwork::with_seed(4, 3, 2, 0.1, 2).unwrap();
        let before = nn.clone();
        let flag = Arc::new(AtomicBool::new(true));
        let config = TrainConfig { stop_flag: Some(flag), ..TrainConfig::new(5) };

        assert!(train_loop(&mut nn, &toy_set(), None, &config).unwrap().is_none());
        assert_eq!(nn, before);
    }

    #[test]
    fn progress_channel_receives_every_epoch() {
        let mut nn = NeuralNetwork::with_seed(4, 3, 2, 0.1, 3).unwrap();
        let (tx, rx) = mpsc::channel();
        let config = TrainConfig { progress_tx: Some(tx), ..TrainConfig::new(3) };

        train_loop(&mut nn, &toy_set(), None, &config).unwrap();
        drop(config);
        let epochs: Vec<usize> = rx.iter().map(|s| s.epoch).collect();
        assert_eq!(epochs, vec![1, 2, 3]);
    }
}
