/// Value written into the target slot of the correct class.
pub const TARGET_ON: f64 = 0.99;
/// Value written into every other target slot.
pub const TARGET_OFF: f64 = 0.01;

/// Largest raw pixel intensity in the 8-bit greyscale datasets.
const PIXEL_MAX: f64 = 255.0;

/// Maps a raw pixel in `[0, 255]` to `[0.01, 1.0]`.
///
/// An exact zero input would zero the corresponding weight gradients, so the
/// range is shifted off zero.
pub fn normalize_pixel(value: f64) -> f64 {
    value / PIXEL_MAX * (1.0 - TARGET_OFF) + TARGET_OFF
}

/// Inverse of `normalize_pixel`, clamped to the 8-bit range.
pub fn denormalize_pixel(value: f64) -> u8 {
    ((value - TARGET_OFF) / (1.0 - TARGET_OFF) * PIXEL_MAX).round().clamp(0.0, PIXEL_MAX) as u8
}

/// Soft one-hot target: `TARGET_ON` at `label`, `TARGET_OFF` elsewhere.
/// A label outside `0..n_classes` yields an all-`TARGET_OFF` vector.
pub fn soft_one_hot(label: usize, n_classes: usize) -> Vec<f64> {
    let mut target = vec![TARGET_OFF; n_classes];
    if let Some(slot) = target.get_mut(label) {
        *slot = TARGET_ON;
    }
    target
}

/// Index of the maximum value; the first one wins on ties. Returns 0 for an
/// empty slice. NaNs are never selected.
pub fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    let mut record = f64::NEG_INFINITY;
    for (i, &v) in values.iter().enumerate() {
        if v > record {
            record = v;
            best = i;
        }
    }
    best
}
