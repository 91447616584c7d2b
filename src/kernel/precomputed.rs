//! Precomputed kernel
//!
//! Rows follow the libsvm convention `0:<row id> 1:K(i,1) 2:K(i,2) ...`: entry 0 carries
//! the row id and entry `k` carries the kernel value against training row `k`.

use crate::core::SparseVector;
use crate::kernel::traits::Kernel;

/// Kernel that reads values out of user-supplied kernel rows
#[derive(Debug, Clone, Copy, Default)]
pub struct PrecomputedKernel;

impl Kernel for PrecomputedKernel {
    /// `x` must be a full precomputed row; the id in `y`'s first entry selects the column.
    fn compute(&self, x: &SparseVector, y: &SparseVector) -> f64 {
        let id = y.values.first().copied().unwrap_or(0.0) as usize;
        x.values.get(id).copied().unwrap_or(0.0)
    }
}

/// Row id stored in entry 0 of a precomputed row
pub fn row_id(x: &SparseVector) -> f64 {
    x.values.first().copied().unwrap_or(0.0)
}
