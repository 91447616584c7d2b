//! Regression: `2l` variables over `l` training vectors
//!
//! Variable `k < l` is the `+` twin of vector `k`, variable `k + l` its `-` twin. Both
//! twins share one physical cache row, which is never permuted; swaps only touch the
//! sign, twin index and diagonal arrays.

use crate::cache::{KernelCache, Qfloat};
use crate::core::{Parameters, SparseVector};
use crate::kernel::TrainingKernel;
use crate::qmatrix::QMatrix;

pub struct SvrQ<'a> {
    kernel: TrainingKernel<'a>,
    cache: KernelCache,
    l: usize,
    sign: Vec<i8>,
    index: Vec<usize>,
    qd: Vec<f64>,
    /// Two output buffers used in turn so the previous column stays readable
    buffers: [Vec<Qfloat>; 2],
    next_buffer: usize,
}

impl<'a> SvrQ<'a> {
    pub fn new(x: &[&'a SparseVector], params: &Parameters) -> Self {
        let l = x.len();
        let kernel = TrainingKernel::new(x, params);

        let mut sign = vec![1i8; 2 * l];
        let mut index = vec![0usize; 2 * l];
        let mut qd = vec![0.0; 2 * l];
        for k in 0..l {
            sign[k + l] = -1;
            index[k] = k;
            index[k + l] = k;
            qd[k] = kernel.evaluate(k, k);
            qd[k + l] = qd[k];
        }

        Self {
            cache: KernelCache::new(l, params.cache_bytes()),
            kernel,
            l,
            sign,
            index,
            qd,
            buffers: [vec![0.0; 2 * l], vec![0.0; 2 * l]],
            next_buffer: 0,
        }
    }
}

impl QMatrix for SvrQ<'_> {
    fn column(&mut self, i: usize, len: usize) -> &[Qfloat] {
        let real_i = self.index[i];
        let (data, filled) = self.cache.get_data(real_i, self.l);
        for (j, slot) in data.iter_mut().enumerate().take(self.l).skip(filled) {
            *slot = self.kernel.evaluate(real_i, j) as Qfloat;
        }

        let slot = self.next_buffer;
        self.next_buffer = 1 - slot;
        let buf = &mut self.buffers[slot];
        let si = self.sign[i] as Qfloat;
        for j in 0..len {
            buf[j] = si * self.sign[j] as Qfloat * data[self.index[j]];
        }
        &buf[..len]
    }

    fn diagonal(&self) -> &[f64] {
        &self.qd
    }

    fn swap_index(&mut self, i: usize, j: usize) {
        self.sign.swap(i, j);
        self.index.swap(i, j);
        self.qd.swap(i, j);
    }
}
