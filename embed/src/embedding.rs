use serde::{Deserialize, Serialize};

/// A fixed-length embedding vector produced by one model version.
///
/// Embeddings from different model versions are not comparable; the
/// version travels with the catalog, not with each vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Embedding(Vec<f32>);

impl Embedding {
    pub fn new(values: Vec<f32>) -> Self {
        Self(values)
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn dimension(&self) -> usize {
        self.0.len()
    }

    /// Euclidean norm, accumulated in f64.
    pub fn norm(&self) -> f64 {
        self.0
            .iter()
            .map(|&x| (x as f64) * (x as f64))
            .sum::<f64>()
            .sqrt()
    }

    pub fn is_finite(&self) -> bool {
        self.0.iter().all(|x| x.is_finite())
    }

    pub fn into_vec(self) -> Vec<f32> {
        self.0
    }
}

impl From<Vec<f32>> for Embedding {
    fn from(values: Vec<f32>) -> Self {
        Self(values)
    }
}

impl AsRef<[f32]> for Embedding {
    fn as_ref(&self) -> &[f32] {
        &self.0
    }
}

/// Scales `v` to unit length in place. Zero vectors are left unchanged.
pub fn l2_normalize(v: &mut [f32]) {
    let norm = v
        .iter()
        .map(|&x| (x as f64) * (x as f64))
        .sum::<f64>()
        .sqrt();
    if norm > 0.0 {
        let scale = (1.0 / norm) as f32;
        v.iter_mut().for_each(|x| *x *= scale);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn l2_normalize_unit() {
        let mut v = vec![3.0f32, 4.0];
        l2_normalize(&mut v);
        assert!((Embedding::new(v).norm() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn l2_normalize_zero() {
        let mut v = vec![0.0f32; 3];
        l2_normalize(&mut v);
        assert_eq!(v, vec![0.0; 3]);
    }

    #[test]
    fn serializes_as_plain_array() {
        let e = Embedding::new(vec![1.0, 0.5]);
        assert_eq!(serde_json::to_string(&e).unwrap(), "[1.0,0.5]");
        let back: Embedding = serde_json::from_str("[1.0,0.5]").unwrap();
        assert_eq!(back, e);
    }
}
