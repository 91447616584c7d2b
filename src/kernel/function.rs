//! Kernel dispatch from [`Parameters`] and the permutable training-set view

use crate::core::{KernelType, Parameters, SparseVector};
use crate::kernel::{
    Kernel, LinearKernel, PolynomialKernel, PrecomputedKernel, RBFKernel, SigmoidKernel,
};

/// Concrete kernel selected by [`KernelType`]
#[derive(Debug, Clone, Copy)]
pub enum KernelFunction {
    Linear(LinearKernel),
    Polynomial(PolynomialKernel),
    Rbf(RBFKernel),
    Sigmoid(SigmoidKernel),
    Precomputed(PrecomputedKernel),
}

impl KernelFunction {
    /// Build the kernel described by the kernel fields of `params`
    pub fn from_params(params: &Parameters) -> Self {
        match params.kernel_type {
            KernelType::Linear => KernelFunction::Linear(LinearKernel),
            KernelType::Polynomial => KernelFunction::Polynomial(PolynomialKernel::new(
                params.degree,
                params.gamma,
                params.coef0,
            )),
            KernelType::Rbf => KernelFunction::Rbf(RBFKernel::new(params.gamma)),
            KernelType::Sigmoid => {
                KernelFunction::Sigmoid(SigmoidKernel::new(params.gamma, params.coef0))
            }
            KernelType::Precomputed => KernelFunction::Precomputed(PrecomputedKernel),
        }
    }

    fn needs_norms(&self) -> bool {
        matches!(self, KernelFunction::Rbf(_))
    }
}

impl Kernel for KernelFunction {
    fn compute(&self, x: &SparseVector, y: &SparseVector) -> f64 {
        match self {
            KernelFunction::Linear(k) => k.compute(x, y),
            KernelFunction::Polynomial(k) => k.compute(x, y),
            KernelFunction::Rbf(k) => k.compute(x, y),
            KernelFunction::Sigmoid(k) => k.compute(x, y),
            KernelFunction::Precomputed(k) => k.compute(x, y),
        }
    }

    fn compute_with_norms(
        &self,
        x: &SparseVector,
        y: &SparseVector,
        x_norm_sq: f64,
        y_norm_sq: f64,
    ) -> f64 {
        match self {
            KernelFunction::Rbf(k) => k.compute_with_norms(x, y, x_norm_sq, y_norm_sq),
            other => other.compute(x, y),
        }
    }
}

/// Training vectors seen through the solver's current permutation
///
/// Keeps squared norms for RBF so that K(i, j) avoids a second merge-join. Both arrays
/// are permuted together by [`TrainingKernel::swap_index`].
#[derive(Debug, Clone)]
pub struct TrainingKernel<'a> {
    kernel: KernelFunction,
    x: Vec<&'a SparseVector>,
    x_square: Option<Vec<f64>>,
}

impl<'a> TrainingKernel<'a> {
    pub fn new(x: &[&'a SparseVector], params: &Parameters) -> Self {
        let kernel = KernelFunction::from_params(params);
        let x_square = kernel
            .needs_norms()
            .then(|| x.iter().map(|v| v.norm_squared()).collect());
        Self {
            kernel,
            x: x.to_vec(),
            x_square,
        }
    }

    /// Number of training vectors
    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// K(x_i, x_j) under the current permutation
    pub fn evaluate(&self, i: usize, j: usize) -> f64 {
        match &self.x_square {
            Some(sq) => self
                .kernel
                .compute_with_norms(self.x[i], self.x[j], sq[i], sq[j]),
            None => self.kernel.compute(self.x[i], self.x[j]),
        }
    }

    pub fn swap_index(&mut self, i: usize, j: usize) {
        self.x.swap(i, j);
        if let Some(sq) = self.x_square.as_mut() {
            sq.swap(i, j);
        }
    }
}
