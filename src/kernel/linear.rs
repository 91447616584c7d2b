//! Linear kernel implementation

use crate::core::SparseVector;
use crate::kernel::Kernel;

/// Linear kernel: K(x, y) = x^T * y
#[derive(Debug, Clone, Copy, Default)]
pub struct LinearKernel;

impl LinearKernel {
    /// Create a new linear kernel
    pub fn new() -> Self {
        Self
    }
}

impl Kernel for LinearKernel {
    fn compute(&self, x: &SparseVector, y: &SparseVector) -> f64 {
        dot(x, y)
    }
}

/// Sparse dot product by merge-join over ascending indices
///
/// Runs in O(nnz(x) + nnz(y)). Shared by every kernel family built on the inner product.
pub fn dot(x: &SparseVector, y: &SparseVector) -> f64 {
    debug_assert!(x.is_well_formed() && y.is_well_formed());

    let mut result = 0.0;
    let mut i = 0;
    let mut j = 0;

    while i < x.indices.len() && j < y.indices.len() {
        let x_idx = x.indices[i];
        let y_idx = y.indices[j];

        if x_idx == y_idx {
            result += x.values[i] * y.values[j];
            i += 1;
            j += 1;
        } else if x_idx < y_idx {
            i += 1;
        } else {
            j += 1;
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_kernel_basic() {
        let kernel = LinearKernel::new();

        let x = SparseVector::new(vec![1, 3, 5], vec![1.0, 2.0, 3.0]);
        let y = SparseVector::new(vec![2, 3, 4], vec![1.0, 2.0, 3.0]);

        // Only index 3 overlaps
        assert_eq!(kernel.compute(&x, &y), 4.0);
    }

    #[test]
    fn test_linear_kernel_identical() {
        let x = SparseVector::from_dense(&[1.0, 2.0, 3.0]);
        assert_eq!(LinearKernel.compute(&x, &x), 14.0);
    }

    #[test]
    fn test_dot_with_tails() {
        let x = SparseVector::new(vec![1, 3, 6], vec![1.0, 3.0, 2.0]);
        let y = SparseVector::new(vec![3, 4, 6, 9], vec![2.0, 1.0, 4.0, 7.0]);

        assert_eq!(dot(&x, &y), 14.0);
        assert_eq!(dot(&y, &x), 14.0);
    }

    #[test]
    fn test_dot_empty() {
        let x = SparseVector::empty();
        let y = SparseVector::from_dense(&[1.0, 2.0]);

        assert_eq!(dot(&x, &y), 0.0);
        assert_eq!(dot(&y, &x), 0.0);
    }
}
