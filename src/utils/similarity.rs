//! Vector distance functions.

use ndarray::ArrayView1;

/// Compute the Euclidean distance between two f32 slices.
///
/// Returns `f32::INFINITY` for empty slices or mismatched lengths: vectors
/// from different embedding models are incomparable and must never register
/// as a match.
pub fn euclidean_distance(a: &[f32], b: &[f32]) -> f32 {
    if a.is_empty() || b.is_empty() || a.len() != b.len() {
        return f32::INFINITY;
    }

    let a = ArrayView1::from(a);
    let b = ArrayView1::from(b);

    let diff = &a - &b;
    diff.dot(&diff).sqrt()
}
