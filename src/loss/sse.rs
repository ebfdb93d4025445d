pub struct SumSquaredError;

impl SumSquaredError {
    /// Scalar SSE: Σ(expected - predicted)²
    pub fn loss(predicted: &[f64], expected: &[f64]) -> f64 {
        predicted.iter().zip(expected.iter())
            .map(|(p, y)| (y - p).powi(2))
            .sum()
    }
}
