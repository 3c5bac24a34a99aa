//! Vector helpers.

/// Scale `vector` to unit length. Returns `None` for empty, zero or non-finite vectors.
pub fn normalize(mut vector: Vec<f32>) -> Option<Vec<f32>> {
    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if vector.is_empty() || norm == 0.0 || !norm.is_finite() {
        return None;
    }
    for x in vector.iter_mut() {
        *x /= norm;
    }
    Some(vector)
}

/// Dot product; equals cosine similarity for unit vectors.
pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len(), "Vectors must have same dimension");
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}
