pub mod network;
pub mod spec;

pub use network::NeuralNetwork;
pub use spec::{NetworkSpec, IMAGE_SIDE};
