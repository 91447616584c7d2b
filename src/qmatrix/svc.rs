//! Two-class classification: `Q_ij = y_i y_j K(x_i, x_j)`

use crate::cache::{KernelCache, Qfloat};
use crate::core::{Parameters, SparseVector};
use crate::kernel::TrainingKernel;
use crate::qmatrix::QMatrix;

pub struct SvcQ<'a> {
    kernel: TrainingKernel<'a>,
    cache: KernelCache,
    y: Vec<i8>,
    qd: Vec<f64>,
}

impl<'a> SvcQ<'a> {
    pub fn new(x: &[&'a SparseVector], y: &[i8], params: &Parameters) -> Self {
        debug_assert_eq!(x.len(), y.len());
        let kernel = TrainingKernel::new(x, params);
        let qd = (0..x.len()).map(|i| kernel.evaluate(i, i)).collect();
        Self {
            cache: KernelCache::new(x.len(), params.cache_bytes()),
            kernel,
            y: y.to_vec(),
            qd,
        }
    }
}

impl QMatrix for SvcQ<'_> {
    fn column(&mut self, i: usize, len: usize) -> &[Qfloat] {
        let (data, filled) = self.cache.get_data(i, len);
        let yi = self.y[i] as f64;
        for (j, slot) in data.iter_mut().enumerate().take(len).skip(filled) {
            *slot = (yi * self.y[j] as f64 * self.kernel.evaluate(i, j)) as Qfloat;
        }
        &data[..len]
    }

    fn diagonal(&self) -> &[f64] {
        &self.qd
    }

    fn swap_index(&mut self, i: usize, j: usize) {
        self.kernel.swap_index(i, j);
        self.y.swap(i, j);
        self.qd.swap(i, j);
        self.cache.swap_index(i, j);
    }
}
