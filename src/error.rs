use thiserror::Error;

/// An operand or vector did not have the shape an operation requires.
///
/// `expected` and `actual` are `(rows, cols)` pairs. For length checks on
/// plain vectors the column count is `1`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("shape mismatch in {op}: expected {}x{}, got {}x{}", expected.0, expected.1, actual.0, actual.1)]
pub struct ShapeError {
    pub op: &'static str,
    pub expected: (usize, usize),
    pub actual: (usize, usize),
}

impl ShapeError {
    pub fn new(op: &'static str, expected: (usize, usize), actual: (usize, usize)) -> ShapeError {
        ShapeError { op, expected, actual }
    }

    /// Length check for a flat vector against a node count.
    pub fn length(op: &'static str, expected: usize, actual: usize) -> ShapeError {
        ShapeError::new(op, (expected, 1), (actual, 1))
    }
}

/// Invalid construction parameters for a network.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{layer} layer must have at least one node")]
    ZeroNodes { layer: &'static str },

    #[error("learning rate must be positive and finite, got {0}")]
    InvalidLearningRate(f64),
}

/// Failure while saving or loading a model or a network spec.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("model file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("model JSON is invalid: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failure while reading a dataset or decoding a user drawing.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("dataset I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("line {line}: {reason}")]
    Row { line: usize, reason: String },

    #[error("dataset contains no data rows")]
    Empty,

    #[error("could not decode image: {0}")]
    Image(#[from] image::ImageError),

    #[error("sample label {label} has no output node (network has {n_classes})")]
    Label { label: usize, n_classes: usize },

    #[error(transparent)]
    Shape(#[from] ShapeError),
}

/// A deserialized network whose parameters do not describe a valid network.
#[derive(Debug, Error)]
pub enum InvalidModel {
    #[error(transparent)]
    Shape(#[from] ShapeError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Declared `(input, hidden, output)` node counts disagree with the
    /// counts implied by the weight matrices.
    #[error(
        "declared layers {}-{}-{} do not match the weights' {}-{}-{}",
        declared.0, declared.1, declared.2, actual.0, actual.1, actual.2
    )]
    NodeCounts {
        declared: (usize, usize, usize),
        actual: (usize, usize, usize),
    },
}
