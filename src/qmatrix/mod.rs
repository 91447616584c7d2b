//! Q-matrix adapters
//!
//! Each SVM formulation sees the kernel matrix through a different lens: two-class
//! classification folds the labels in (`Q_ij = y_i y_j K_ij`), one-class uses the kernel
//! directly and regression doubles the variable set into `+`/`-` twins. The solver only
//! needs the capability described by [`QMatrix`].

pub mod one_class;
pub mod svc;
pub mod svr;

pub use self::one_class::OneClassQ;
pub use self::svc::SvcQ;
pub use self::svr::SvrQ;

use crate::cache::Qfloat;

/// On-demand access to the Q matrix of one dual problem
pub trait QMatrix {
    /// First `len` entries of column `i` under the current permutation
    ///
    /// The returned slice stays valid until the next call into the adapter.
    fn column(&mut self, i: usize, len: usize) -> &[Qfloat];

    /// Diagonal `Q_ii` for every variable, permuted with the variables
    fn diagonal(&self) -> &[f64];

    /// Exchange variables `i` and `j` in every piece of per-index state
    fn swap_index(&mut self, i: usize, j: usize);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{KernelType, Parameters, SparseVector};
    use crate::kernel::{Kernel, KernelFunction};

    fn data() -> Vec<SparseVector> {
        vec![
            SparseVector::from_dense(&[0.5, 1.0]),
            SparseVector::from_dense(&[-1.0, 0.2, 0.7]),
            SparseVector::from_dense(&[2.0]),
            SparseVector::from_dense(&[0.0, -0.4, 1.5]),
            SparseVector::from_dense(&[1.1, 1.1, 1.1]),
            SparseVector::from_dense(&[-0.3, 0.0, 0.0, 2.2]),
        ]
    }

    fn params() -> Parameters {
        Parameters {
            kernel_type: KernelType::Rbf,
            gamma: 0.4,
            cache_size: 1e-6,
            ..Parameters::default()
        }
    }

    #[test]
    fn test_svc_columns_match_fresh_matrix_under_swaps() {
        let x = data();
        let refs: Vec<&SparseVector> = x.iter().collect();
        let y: Vec<i8> = vec![1, -1, 1, 1, -1, -1];
        let params = params();
        let kernel = KernelFunction::from_params(&params);

        let mut q = SvcQ::new(&refs, &y, &params);
        let mut perm: Vec<usize> = (0..x.len()).collect();
        let swaps = [(0, 5), (1, 3), (2, 2), (4, 0), (3, 5), (1, 2)];

        for (step, &(a, b)) in swaps.iter().enumerate() {
            let len = 2 + step % 5;
            for i in 0..x.len() {
                let column = q.column(i, len).to_vec();
                for (j, &value) in column.iter().enumerate() {
                    let (pi, pj) = (perm[i], perm[j]);
                    let expected = (y[pi] * y[pj]) as f64 * kernel.compute(&x[pi], &x[pj]);
                    assert!((value as f64 - expected).abs() < 1e-6);
                }
                let expected_diag = kernel.compute(&x[perm[i]], &x[perm[i]]);
                assert!((q.diagonal()[i] - expected_diag).abs() < 1e-12);
            }
            q.swap_index(a, b);
            perm.swap(a, b);
        }
    }

    #[test]
    fn test_one_class_columns_are_plain_kernel() {
        let x = data();
        let refs: Vec<&SparseVector> = x.iter().collect();
        let params = params();
        let kernel = KernelFunction::from_params(&params);

        let mut q = OneClassQ::new(&refs, &params);
        q.swap_index(0, 3);
        let column = q.column(0, x.len()).to_vec();
        for (j, &value) in column.iter().enumerate() {
            let pj = match j {
                0 => 3,
                3 => 0,
                other => other,
            };
            let expected = kernel.compute(&x[3], &x[pj]);
            assert!((value as f64 - expected).abs() < 1e-6);
        }
    }

    #[test]
    fn test_svr_twins_share_rows_with_signs() {
        let x = data();
        let refs: Vec<&SparseVector> = x.iter().collect();
        let l = x.len();
        let params = params();
        let kernel = KernelFunction::from_params(&params);

        let mut q = SvrQ::new(&refs, &params);
        assert_eq!(q.diagonal().len(), 2 * l);

        let plus = q.column(1, 2 * l).to_vec();
        let minus = q.column(l + 1, 2 * l).to_vec();
        for j in 0..l {
            let k = kernel.compute(&x[1], &x[j]);
            assert!((plus[j] as f64 - k).abs() < 1e-6);
            assert!((plus[j + l] as f64 + k).abs() < 1e-6);
            assert!((minus[j] as f64 + k).abs() < 1e-6);
            assert!((minus[j + l] as f64 - k).abs() < 1e-6);
        }

        q.swap_index(0, l + 2);
        let swapped = q.column(0, 2 * l).to_vec();
        // variable 0 is now the minus twin of vector 2
        let k = kernel.compute(&x[2], &x[2]);
        assert!((swapped[0] as f64 - k).abs() < 1e-6);
        assert!((q.diagonal()[0] - k).abs() < 1e-12);
    }
}
