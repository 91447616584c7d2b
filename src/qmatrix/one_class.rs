//! One-class: `Q_ij = K(x_i, x_j)`

use crate::cache::{KernelCache, Qfloat};
use crate::core::{Parameters, SparseVector};
use crate::kernel::TrainingKernel;
use crate::qmatrix::QMatrix;

pub struct OneClassQ<'a> {
    kernel: TrainingKernel<'a>,
    cache: KernelCache,
    qd: Vec<f64>,
}

impl<'a> OneClassQ<'a> {
    pub fn new(x: &[&'a SparseVector], params: &Parameters) -> Self {
        let kernel = TrainingKernel::new(x, params);
        let qd = (0..x.len()).map(|i| kernel.evaluate(i, i)).collect();
        Self {
            cache: KernelCache::new(x.len(), params.cache_bytes()),
            kernel,
            qd,
        }
    }
}

impl QMatrix for OneClassQ<'_> {
    fn column(&mut self, i: usize, len: usize) -> &[Qfloat] {
        let (data, filled) = self.cache.get_data(i, len);
        for (j, slot) in data.iter_mut().enumerate().take(len).skip(filled) {
            *slot = self.kernel.evaluate(i, j) as Qfloat;
        }
        &data[..len]
    }

    fn diagonal(&self) -> &[f64] {
        &self.qd
    }

    fn swap_index(&mut self, i: usize, j: usize) {
        self.kernel.swap_index(i, j);
        self.qd.swap(i, j);
        self.cache.swap_index(i, j);
    }
}
