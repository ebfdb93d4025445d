pub mod error;
pub mod math;
pub mod activation;
pub mod network;
pub mod loss;
pub mod data;
pub mod train;

// Convenience re-exports
pub use error::{ConfigError, DatasetError, InvalidModel, ModelError, ShapeError};
pub use math::matrix::Matrix;
pub use activation::sigmoid::Sigmoid;
pub use network::network::NeuralNetwork;
pub use network::spec::NetworkSpec;
pub use loss::sse::SumSquaredError;
pub use data::sample::Sample;
pub use train::session::TrainingSession;
pub use train::train_config::TrainConfig;
pub use train::loop_fn::{evaluate, train_loop};
pub use train::epoch_stats::{EpochStats, Evaluation, SessionStats, TickReport};
