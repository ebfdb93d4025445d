use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ModelError};
use crate::network::network::NeuralNetwork;

/// Side length of the square digit images the demo works with.
pub const IMAGE_SIDE: u32 = 28;

/// Topology and hyperparameters of a network, saved independently of any
/// trained weights.
///
/// Every field has a default so a partial JSON file (e.g. `{"hidden_nodes": 64}`)
/// is a valid spec. Defaults match the digit demo: 784 → 256 → 10, lr 0.1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkSpec {
    pub input_nodes: usize,
    pub hidden_nodes: usize,
    pub output_nodes: usize,
    pub learning_rate: f64,
    /// Fixes the initial parameters when set; OS entropy otherwise.
    pub seed: Option<u64>,
}

impl Default for NetworkSpec {
    fn default() -> Self {
        NetworkSpec {
            input_nodes: (IMAGE_SIDE * IMAGE_SIDE) as usize,
            hidden_nodes: 256,
            output_nodes: 10,
            learning_rate: 0.1,
            seed: None,
        }
    }
}

impl NetworkSpec {
    /// Builds a freshly initialized network from this spec.
    pub fn build(&self) -> Result<NeuralNetwork, ConfigError> {
        match self.seed {
            Some(seed) => NeuralNetwork::with_seed(
                self.input_nodes,
                self.hidden_nodes,
                self.output_nodes,
                self.learning_rate,
                seed,
            ),
            None => NeuralNetwork::new(
                self.input_nodes,
                self.hidden_nodes,
                self.output_nodes,
                self.learning_rate,
            ),
        }
    }

    /// Serializes the spec to a pretty-printed JSON file.
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<(), ModelError> {
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Deserializes a `NetworkSpec` from a JSON file.
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<NetworkSpec, ModelError> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        Ok(serde_json::from_reader(reader)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let spec: NetworkSpec = serde_json::from_str(r#"{"hidden_nodes": 64, "seed": 9}"#).unwrap();
        assert_eq!(spec.input_nodes, 784);
        assert_eq!(spec.hidden_nodes, 64);
        assert_eq!(spec.output_nodes, 10);
        assert_eq!(spec.seed, Some(9));
    }

    #[test]
    fn seeded_spec_builds_reproducibly() {
        let spec = NetworkSpec { input_nodes: 4, hidden_nodes: 3, output_nodes: 2, learning_rate: 0.2, seed: Some(3) };
        assert_eq!(spec.build().unwrap(), spec.build().unwrap());
    }

    #[test]
    fn invalid_spec_is_a_config_error() {
        let spec = NetworkSpec { learning_rate: -1.0, ..NetworkSpec::default() };
        assert_eq!(spec.build().unwrap_err(), ConfigError::InvalidLearningRate(-1.0));
    }
}
