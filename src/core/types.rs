//! Core type definitions: sparse feature vectors and training problems

/// Sparse vector representation with strictly increasing indices
///
/// Feature indices are 1-based as in the libsvm text format. Index 0 is reserved
/// for the row id of a precomputed-kernel row.
#[derive(Clone, Debug, PartialEq)]
pub struct SparseVector {
    /// Sorted indices of non-zero elements
    pub indices: Vec<usize>,
    /// Values corresponding to indices
    pub values: Vec<f64>,
}

impl SparseVector {
    /// Create a new sparse vector, ensuring indices are sorted
    pub fn new(indices: Vec<usize>, values: Vec<f64>) -> Self {
        assert_eq!(
            indices.len(),
            values.len(),
            "Indices and values must have same length"
        );

        let mut pairs: Vec<_> = indices.into_iter().zip(values).collect();
        pairs.sort_by_key(|&(idx, _)| idx);

        let (indices, values): (Vec<_>, Vec<_>) = pairs.into_iter().unzip();
        Self { indices, values }
    }

    /// Build a vector from dense values, assigning indices 1..=n and skipping zeros
    pub fn from_dense(dense: &[f64]) -> Self {
        let (indices, values) = dense
            .iter()
            .enumerate()
            .filter(|&(_, &v)| v != 0.0)
            .map(|(i, &v)| (i + 1, v))
            .unzip();
        Self { indices, values }
    }

    /// Create an empty sparse vector
    pub fn empty() -> Self {
        Self {
            indices: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Get the value at a specific index (0 if not present)
    pub fn get(&self, index: usize) -> f64 {
        match self.indices.binary_search(&index) {
            Ok(pos) => self.values[pos],
            Err(_) => 0.0,
        }
    }

    /// Compute squared L2 norm
    pub fn norm_squared(&self) -> f64 {
        self.values.iter().map(|&v| v * v).sum()
    }

    /// Number of non-zero elements
    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    /// Check if vector is empty
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Largest feature index, 0 for an empty vector
    pub fn max_index(&self) -> usize {
        self.indices.last().copied().unwrap_or(0)
    }

    /// True when indices are strictly increasing
    pub fn is_well_formed(&self) -> bool {
        self.indices.len() == self.values.len() && self.indices.windows(2).all(|w| w[0] < w[1])
    }
}

/// Training set: parallel feature vectors and labels
///
/// Labels are class ids for classification, target values for regression and are
/// ignored by one-class training.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Problem {
    pub x: Vec<SparseVector>,
    pub y: Vec<f64>,
}

impl Problem {
    pub fn new(x: Vec<SparseVector>, y: Vec<f64>) -> Self {
        assert_eq!(x.len(), y.len(), "Vectors and labels must have same length");
        Self { x, y }
    }

    /// Number of training vectors
    pub fn len(&self) -> usize {
        self.y.len()
    }

    pub fn is_empty(&self) -> bool {
        self.y.is_empty()
    }

    /// Largest feature index used by any vector
    pub fn max_index(&self) -> usize {
        self.x.iter().map(SparseVector::max_index).max().unwrap_or(0)
    }

    /// Append one labelled vector
    pub fn push(&mut self, x: SparseVector, y: f64) {
        self.x.push(x);
        self.y.push(y);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sparse_vector_creation() {
        let sv = SparseVector::new(vec![3, 1, 5], vec![2.0, 1.0, 3.0]);
        assert_eq!(sv.indices, vec![1, 3, 5]);
        assert_eq!(sv.values, vec![1.0, 2.0, 3.0]);
        assert!(sv.is_well_formed());
    }

    #[test]
    fn test_sparse_vector_from_dense() {
        let sv = SparseVector::from_dense(&[0.5, 0.0, -2.0]);
        assert_eq!(sv.indices, vec![1, 3]);
        assert_eq!(sv.values, vec![0.5, -2.0]);
        assert_eq!(sv.max_index(), 3);
    }

    #[test]
    fn test_sparse_vector_get() {
        let sv = SparseVector::new(vec![1, 3, 5], vec![1.0, 2.0, 3.0]);

        assert_eq!(sv.get(0), 0.0);
        assert_eq!(sv.get(1), 1.0);
        assert_eq!(sv.get(3), 2.0);
        assert_eq!(sv.get(6), 0.0);
    }

    #[test]
    fn test_sparse_vector_norm() {
        let sv = SparseVector::new(vec![1, 2], vec![3.0, 4.0]);
        assert_eq!(sv.norm_squared(), 25.0);
        assert_eq!(sv.nnz(), 2);
        assert!(SparseVector::empty().is_empty());
    }

    #[test]
    fn test_malformed_vector_detected() {
        let sv = SparseVector {
            indices: vec![2, 2],
            values: vec![1.0, 1.0],
        };
        assert!(!sv.is_well_formed());
    }

    #[test]
    #[should_panic(expected = "Indices and values must have same length")]
    fn test_sparse_vector_length_mismatch() {
        SparseVector::new(vec![0, 1], vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_problem_basics() {
        let mut problem = Problem::default();
        assert!(problem.is_empty());
        problem.push(SparseVector::from_dense(&[1.0, 2.0]), 1.0);
        problem.push(SparseVector::from_dense(&[0.0, 0.0, 4.0]), -1.0);
        assert_eq!(problem.len(), 2);
        assert_eq!(problem.max_index(), 3);
    }
}
