use crate::data::encoding::{normalize_pixel, soft_one_hot};

/// One labeled digit: class index plus raw pixel intensities in `[0, 255]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub label: usize,
    pub pixels: Vec<f64>,
}

impl Sample {
    pub fn new(label: usize, pixels: Vec<f64>) -> Sample {
        Sample { label, pixels }
    }

    /// Network input: every pixel normalized into `[0.01, 1.0]`.
    pub fn inputs(&self) -> Vec<f64> {
        self.pixels.iter().map(|&p| normalize_pixel(p)).collect()
    }

    /// Soft one-hot training target over `n_classes` outputs.
    pub fn target(&self, n_classes: usize) -> Vec<f64> {
        soft_one_hot(self.label, n_classes)
    }
}
