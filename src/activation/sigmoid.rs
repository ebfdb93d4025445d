/// Logistic sigmoid, the only non-linearity the network uses.
pub struct Sigmoid;

const SATURATION: f64 = f64::EPSILON;

impl Sigmoid {
    /// σ(x) = 1 / (1 + e^-x), clamped to `[ε, 1 − ε]`.
    ///
    /// In f64 the raw formula reaches exactly 1.0 once x exceeds about 36.7
    /// and 0.0 below about -745.
    pub fn function(x: f64) -> f64 {
        (1.0 / (1.0 + (-x).exp())).clamp(SATURATION, 1.0 - SATURATION)
    }

    /// σ'(x) written in terms of the activated output `y = σ(x)`: y·(1 − y).
    ///
    /// Backpropagation only keeps activations, so this form avoids
    /// recomputing the pre-activation sums.
    pub fn derivative_from_output(y: f64) -> f64 {
        y * (1.0 - y)
    }
}
