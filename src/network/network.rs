use std::path::Path;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::activation::Sigmoid;
use crate::data::encoding::argmax;
use crate::error::{ConfigError, InvalidModel, ModelError, ShapeError};
use crate::math::Matrix;

/// Three-layer (input → hidden → output) feed-forward network with sigmoid
/// activations, trained one example at a time by backpropagation.
///
/// Shapes:
/// - `weights_input_hidden`  — `hidden × input`
/// - `weights_hidden_output` — `output × hidden`
/// - `bias_hidden`           — `hidden × 1`
/// - `bias_output`           — `output × 1`
///
/// The network has no interior locking. Callers that share one instance
/// across threads must serialize whole `train`/`query` calls themselves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SavedNetwork")]
pub struct NeuralNetwork {
    input_nodes: usize,
    hidden_nodes: usize,
    output_nodes: usize,
    learning_rate: f64,
    weights_input_hidden: Matrix,
    weights_hidden_output: Matrix,
    bias_hidden: Matrix,
    bias_output: Matrix,
}

/// On-disk form of a network; validated on the way in.
#[derive(Deserialize)]
struct SavedNetwork {
    input_nodes: usize,
    hidden_nodes: usize,
    output_nodes: usize,
    learning_rate: f64,
    weights_input_hidden: Matrix,
    weights_hidden_output: Matrix,
    bias_hidden: Matrix,
    bias_output: Matrix,
}

impl TryFrom<SavedNetwork> for NeuralNetwork {
    type Error = InvalidModel;

    fn try_from(saved: SavedNetwork) -> Result<NeuralNetwork, InvalidModel> {
        let network = NeuralNetwork::from_parameters(
            saved.learning_rate,
            saved.weights_input_hidden,
            saved.bias_hidden,
            saved.weights_hidden_output,
            saved.bias_output,
        )?;
        let declared = (saved.input_nodes, saved.hidden_nodes, saved.output_nodes);
        let actual = (network.input_nodes, network.hidden_nodes, network.output_nodes);
        if declared != actual {
            return Err(InvalidModel::NodeCounts { declared, actual });
        }
        Ok(network)
    }
}

fn validate_config(
    input_nodes: usize,
    hidden_nodes: usize,
    output_nodes: usize,
    learning_rate: f64,
) -> Result<(), ConfigError> {
    for (layer, n) in [("input", input_nodes), ("hidden", hidden_nodes), ("output", output_nodes)] {
        if n == 0 {
            return Err(ConfigError::ZeroNodes { layer });
        }
    }
    if !learning_rate.is_finite() || learning_rate <= 0.0 {
        return Err(ConfigError::InvalidLearningRate(learning_rate));
    }
    Ok(())
}

impl NeuralNetwork {
    /// Builds a network with parameters drawn from OS entropy.
    pub fn new(
        input_nodes: usize,
        hidden_nodes: usize,
        output_nodes: usize,
        learning_rate: f64,
    ) -> Result<NeuralNetwork, ConfigError> {
        let mut rng = StdRng::from_entropy();
        NeuralNetwork::with_rng(input_nodes, hidden_nodes, output_nodes, learning_rate, &mut rng)
    }

    /// Builds a network whose initial parameters are fully determined by `seed`.
    pub fn with_seed(
        input_nodes: usize,
        hidden_nodes: usize,
        output_nodes: usize,
        learning_rate: f64,
        seed: u64,
    ) -> Result<NeuralNetwork, ConfigError> {
        let mut rng = StdRng::seed_from_u64(seed);
        NeuralNetwork::with_rng(input_nodes, hidden_nodes, output_nodes, learning_rate, &mut rng)
    }

    /// Builds a network drawing every weight and bias independently from
    /// U[-1/√fan_in, 1/√fan_in], where fan_in is the size of the layer feeding
    /// the unit.
    pub fn with_rng<R: Rng + ?Sized>(
        input_nodes: usize,
        hidden_nodes: usize,
        output_nodes: usize,
        learning_rate: f64,
        rng: &mut R,
    ) -> Result<NeuralNetwork, ConfigError> {
        validate_config(input_nodes, hidden_nodes, output_nodes, learning_rate)?;

        let hidden_bound = 1.0 / (input_nodes as f64).sqrt();
        let output_bound = 1.0 / (hidden_nodes as f64).sqrt();

        let mut weights_input_hidden = Matrix::zeros(hidden_nodes, input_nodes);
        let mut bias_hidden = Matrix::zeros(hidden_nodes, 1);
        let mut weights_hidden_output = Matrix::zeros(output_nodes, hidden_nodes);
        let mut bias_output = Matrix::zeros(output_nodes, 1);

        weights_input_hidden.randomize(-hidden_bound, hidden_bound, rng);
        bias_hidden.randomize(-hidden_bound, hidden_bound, rng);
        weights_hidden_output.randomize(-output_bound, output_bound, rng);
        bias_output.randomize(-output_bound, output_bound, rng);

        Ok(NeuralNetwork {
            input_nodes,
            hidden_nodes,
            output_nodes,
            learning_rate,
            weights_input_hidden,
            weights_hidden_output,
            bias_hidden,
            bias_output,
        })
    }

    /// Rebuilds a network from explicit parameters. Node counts are read off
    /// the weight shapes and every other shape is checked against them.
    pub fn from_parameters(
        learning_rate: f64,
        weights_input_hidden: Matrix,
        bias_hidden: Matrix,
        weights_hidden_output: Matrix,
        bias_output: Matrix,
    ) -> Result<NeuralNetwork, InvalidModel> {
        let (hidden_nodes, input_nodes) = weights_input_hidden.shape();
        let output_nodes = weights_hidden_output.rows();
        validate_config(input_nodes, hidden_nodes, output_nodes, learning_rate)?;

        let expected = [
            ((output_nodes, hidden_nodes), weights_hidden_output.shape()),
            ((hidden_nodes, 1), bias_hidden.shape()),
            ((output_nodes, 1), bias_output.shape()),
        ];
        for (want, got) in expected {
            if want != got {
                return Err(ShapeError::new("from_parameters", want, got).into());
            }
        }

        Ok(NeuralNetwork {
            input_nodes,
            hidden_nodes,
            output_nodes,
            learning_rate,
            weights_input_hidden,
            weights_hidden_output,
            bias_hidden,
            bias_output,
        })
    }

    /// Forward pass. Returns `output_nodes` activations, each in (0, 1) even
    /// for saturated parameters (see `Sigmoid::function`).
    pub fn query(&self, input: &[f64]) -> Result<Vec<f64>, ShapeError> {
        self.check_input("query", input)?;
        let (_, output) = self.forward(&Matrix::from_column(input))?;
        Ok(output.to_vec())
    }

    /// Index of the strongest output unit for `input`.
    pub fn classify(&self, input: &[f64]) -> Result<usize, ShapeError> {
        Ok(argmax(&self.query(input)?))
    }

    /// One stochastic gradient step on a single (input, target) pair.
    ///
    /// Lengths are checked before any work and the four parameter matrices are
    /// only replaced once every update has been computed, so an error leaves
    /// the network untouched.
    pub fn train(&mut self, input: &[f64], target: &[f64]) -> Result<(), ShapeError> {
        self.train_and_report(input, target).map(|_| ())
    }

    /// Same step as `train`, also returning the outputs of the forward pass
    /// it ran, i.e. what `query(input)` gave before the update.
    pub fn train_and_report(&mut self, input: &[f64], target: &[f64]) -> Result<Vec<f64>, ShapeError> {
        self.check_input("train", input)?;
        if target.len() != self.output_nodes {
            return Err(ShapeError::length("train target", self.output_nodes, target.len()));
        }

        let lr = self.learning_rate;
        let inputs = Matrix::from_column(input);
        let targets = Matrix::from_column(target);
        let (hidden, output) = self.forward(&inputs)?;

        // Output layer: δ_o = (t − o) ⊙ o(1 − o)
        let output_error = targets.sub(&output)?;
        let output_gradient = output_error.hadamard(&output.map(Sigmoid::derivative_from_output))?;
        let delta_hidden_output = output_gradient.multiply(&hidden.transpose())?.scale(lr);

        // Must use the output weights as they were before this step.
        let hidden_error = self.weights_hidden_output.transpose().multiply(&output_error)?;
        let hidden_gradient = hidden_error.hadamard(&hidden.map(Sigmoid::derivative_from_output))?;
        let delta_input_hidden = hidden_gradient.multiply(&inputs.transpose())?.scale(lr);

        let weights_hidden_output = self.weights_hidden_output.add(&delta_hidden_output)?;
        let bias_output = self.bias_output.add(&output_gradient.scale(lr))?;
        let weights_input_hidden = self.weights_input_hidden.add(&delta_input_hidden)?;
        let bias_hidden = self.bias_hidden.add(&hidden_gradient.scale(lr))?;

        self.weights_hidden_output = weights_hidden_output;
        self.bias_output = bias_output;
        self.weights_input_hidden = weights_input_hidden;
        self.bias_hidden = bias_hidden;
        Ok(output.to_vec())
    }

    fn check_input(&self, op: &'static str, input: &[f64]) -> Result<(), ShapeError> {
        if input.len() != self.input_nodes {
            return Err(ShapeError::length(op, self.input_nodes, input.len()));
        }
        Ok(())
    }

    /// Returns (hidden activations, output activations) as column matrices.
    fn forward(&self, input: &Matrix) -> Result<(Matrix, Matrix), ShapeError> {
        let hidden = self
            .weights_input_hidden
            .multiply(input)?
            .add(&self.bias_hidden)?
            .map(Sigmoid::function);
        let output = self
            .weights_hidden_output
            .multiply(&hidden)?
            .add(&self.bias_output)?
            .map(Sigmoid::function);
        Ok((hidden, output))
    }

    pub fn input_nodes(&self) -> usize {
        self.input_nodes
    }

    pub fn hidden_nodes(&self) -> usize {
        self.hidden_nodes
    }

    pub fn output_nodes(&self) -> usize {
        self.output_nodes
    }

    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    pub fn weights_input_hidden(&self) -> &Matrix {
        &self.weights_input_hidden
    }

    pub fn weights_hidden_output(&self) -> &Matrix {
        &self.weights_hidden_output
    }

    pub fn bias_hidden(&self) -> &Matrix {
        &self.bias_hidden
    }

    pub fn bias_output(&self) -> &Matrix {
        &self.bias_output
    }

    /// Serializes the network to a pretty-printed JSON file.
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<(), ModelError> {
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Deserializes a network previously written by `save_json`. Shapes and
    /// configuration are validated; an inconsistent file is a `Json` error.
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<NeuralNetwork, ModelError> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        Ok(serde_json::from_reader(reader)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_rejects_zero_nodes() {
        assert_eq!(
            NeuralNetwork::new(0, 3, 2, 0.1).unwrap_err(),
            ConfigError::ZeroNodes { layer: "input" }
        );
        assert_eq!(
            NeuralNetwork::new(2, 0, 2, 0.1).unwrap_err(),
            ConfigError::ZeroNodes { layer: "hidden" }
        );
        assert_eq!(
            NeuralNetwork::new(2, 3, 0, 0.1).unwrap_err(),
            ConfigError::ZeroNodes { layer: "output" }
        );
    }

    #[test]
    fn new_rejects_bad_learning_rate() {
        assert!(NeuralNetwork::new(2, 3, 2, 0.0).is_err());
        assert!(NeuralNetwork::new(2, 3, 2, -0.1).is_err());
        assert!(NeuralNetwork::new(2, 3, 2, f64::NAN).is_err());
        assert!(NeuralNetwork::new(2, 3, 2, f64::INFINITY).is_err());
    }

    #[test]
    fn parameters_have_layer_shapes() {
        let nn = NeuralNetwork::new(5, 3, 2, 0.1).unwrap();
        assert_eq!(nn.weights_input_hidden().shape(), (3, 5));
        assert_eq!(nn.weights_hidden_output().shape(), (2, 3));
        assert_eq!(nn.bias_hidden().shape(), (3, 1));
        assert_eq!(nn.bias_output().shape(), (2, 1));
    }

    #[test]
    fn initial_weights_are_small_and_not_symmetric() {
        let nn = NeuralNetwork::with_seed(4, 6, 3, 0.1, 11).unwrap();
        let rows = nn.weights_input_hidden().row_slices();
        for (i, a) in rows.iter().enumerate() {
            assert!(a.iter().all(|w| w.abs() <= 0.5));
            for b in &rows[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn same_seed_gives_same_network() {
        let a = NeuralNetwork::with_seed(3, 4, 2, 0.3, 42).unwrap();
        let b = NeuralNetwork::with_seed(3, 4, 2, 0.3, 42).unwrap();
        let c = NeuralNetwork::with_seed(3, 4, 2, 0.3, 43).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn query_rejects_wrong_length() {
        let nn = NeuralNetwork::with_seed(3, 4, 2, 0.1, 1).unwrap();
        let err = nn.query(&[0.5, 0.5]).unwrap_err();
        assert_eq!(err, ShapeError::length("query", 3, 2));
    }

    #[test]
    fn train_step_matches_hand_computation() {
        // 1-1-1 network: the hidden update depends on whether the old or the
        // new output weight is used, so this pins the update order.
        let (w1, b1, w2, b2, lr) = (0.4, -0.2, 0.7, 0.1, 0.5);
        let mut nn = NeuralNetwork::from_parameters(
            lr,
            Matrix::from_column(&[w1]),
            Matrix::from_column(&[b1]),
            Matrix::from_column(&[w2]),
            Matrix::from_column(&[b2]),
        )
        .unwrap();

        let (x, t) = (0.9, 0.2);
        let h = Sigmoid::function(w1 * x + b1);
        let o = Sigmoid::function(w2 * h + b2);
        let e = t - o;
        let g_o = e * o * (1.0 - o);
        let g_h = (w2 * e) * h * (1.0 - h);

        nn.train(&[x], &[t]).unwrap();

        let close = |a: f64, b: f64| (a - b).abs() < 1e-12;
        assert!(close(nn.weights_hidden_output().to_vec()[0], w2 + lr * g_o * h));
        assert!(close(nn.bias_output().to_vec()[0], b2 + lr * g_o));
        assert!(close(nn.weights_input_hidden().to_vec()[0], w1 + lr * g_h * x));
        assert!(close(nn.bias_hidden().to_vec()[0], b1 + lr * g_h));
    }

    #[test]
    fn train_and_report_returns_pre_update_outputs() {
        let mut a = NeuralNetwork::with_seed(3, 4, 2, 0.3, 21).unwrap();
        let mut b = a.clone();
        let (input, target) = ([0.2, 0.9, 0.4], [0.99, 0.01]);

        let before = a.query(&input).unwrap();
        assert_eq!(a.train_and_report(&input, &target).unwrap(), before);
        b.train(&input, &target).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn from_parameters_rejects_inconsistent_shapes() {
        let res = NeuralNetwork::from_parameters(
            0.1,
            Matrix::zeros(3, 2),
            Matrix::zeros(2, 1),
            Matrix::zeros(1, 3),
            Matrix::zeros(1, 1),
        );
        assert!(matches!(res, Err(InvalidModel::Shape(_))));
    }

    #[test]
    fn load_reports_mismatched_node_counts_per_layer() {
        let nn = NeuralNetwork::with_seed(2, 3, 2, 0.5, 1).unwrap();
        let mut value = serde_json::to_value(&nn).unwrap();
        value["output_nodes"] = 4.into();

        let saved: SavedNetwork = serde_json::from_value(value).unwrap();
        match NeuralNetwork::try_from(saved) {
            Err(InvalidModel::NodeCounts { declared, actual }) => {
                assert_eq!(declared, (2, 3, 4));
                assert_eq!(actual, (2, 3, 2));
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn saturated_network_still_answers_inside_open_interval() {
        let nn = NeuralNetwork::from_parameters(
            0.1,
            Matrix::from_column(&[40.0]),
            Matrix::from_column(&[0.0]),
            Matrix::from_column(&[40.0]),
            Matrix::from_column(&[0.0]),
        )
        .unwrap();
        let out = nn.query(&[1.0]).unwrap();
        assert!(out[0] > 0.0 && out[0] < 1.0, "{:?}", out);

        let negated = NeuralNetwork::from_parameters(
            0.1,
            Matrix::from_column(&[40.0]),
            Matrix::from_column(&[0.0]),
            Matrix::from_column(&[-800.0]),
            Matrix::from_column(&[0.0]),
        )
        .unwrap();
        let out = negated.query(&[1.0]).unwrap();
        assert!(out[0] > 0.0 && out[0] < 1.0, "{:?}", out);
    }

    #[test]
    fn classify_picks_strongest_output() {
        let nn = NeuralNetwork::with_seed(2, 3, 4, 0.1, 5).unwrap();
        let out = nn.query(&[0.3, 0.7]).unwrap();
        let best = nn.classify(&[0.3, 0.7]).unwrap();
        assert!(out.iter().all(|&v| v <= out[best]));
    }
}
