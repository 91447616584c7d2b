//! High-level API for training and evaluating SVMs
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use smosvm::api::SVM;
//! use smosvm::KernelType;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let model = SVM::new()
//!     .with_kernel(KernelType::Rbf)
//!     .with_c(10.0)
//!     .with_probability(true)
//!     .train_from_file("data.libsvm")?;
//!
//! let test = smosvm::data::load_problem("test.libsvm")?;
//! let predicted: Vec<f64> = test.x.iter().map(|x| model.predict(x)).collect();
//! println!("Accuracy: {:.2}%", smosvm::api::accuracy(&predicted, &test.y) * 100.0);
//! # Ok(())
//! # }
//! ```

use crate::core::{KernelType, Parameters, Problem, Result, SVMType};
use crate::data::load_problem;
use crate::model::Model;
use crate::optimizer::SVMOptimizer;
use std::path::Path;

/// SVM builder over [`Parameters`]
///
/// A gamma of 0 (the default) is replaced by `1 / max feature index` of the training
/// problem when the kernel uses gamma.
#[derive(Debug, Clone, Default)]
pub struct SVM {
    params: Parameters,
}

impl SVM {
    /// C-SVC with an RBF kernel and default parameters
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a full parameter set
    pub fn with_params(params: Parameters) -> Self {
        Self { params }
    }

    pub fn with_svm_type(mut self, svm_type: SVMType) -> Self {
        self.params.svm_type = svm_type;
        self
    }

    pub fn with_kernel(mut self, kernel_type: KernelType) -> Self {
        self.params.kernel_type = kernel_type;
        self
    }

    pub fn with_gamma(mut self, gamma: f64) -> Self {
        self.params.gamma = gamma;
        self
    }

    pub fn with_degree(mut self, degree: i32) -> Self {
        self.params.degree = degree;
        self
    }

    pub fn with_coef0(mut self, coef0: f64) -> Self {
        self.params.coef0 = coef0;
        self
    }

    /// Set regularization parameter C
    pub fn with_c(mut self, c: f64) -> Self {
        self.params.c = c;
        self
    }

    pub fn with_nu(mut self, nu: f64) -> Self {
        self.params.nu = nu;
        self
    }

    /// Set the epsilon-SVR tube width
    pub fn with_p(mut self, p: f64) -> Self {
        self.params.p = p;
        self
    }

    /// Set convergence tolerance
    pub fn with_epsilon(mut self, eps: f64) -> Self {
        self.params.eps = eps;
        self
    }

    /// Set kernel cache size in megabytes
    pub fn with_cache_size(mut self, megabytes: f64) -> Self {
        self.params.cache_size = megabytes;
        self
    }

    pub fn with_shrinking(mut self, shrinking: bool) -> Self {
        self.params.shrinking = shrinking;
        self
    }

    pub fn with_probability(mut self, probability: bool) -> Self {
        self.params.probability = probability;
        self
    }

    /// Multiply C by `weight` for class `label`
    pub fn with_weight(mut self, label: i32, weight: f64) -> Self {
        self.params.weights.push((label, weight));
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.params.seed = seed;
        self
    }

    pub fn params(&self) -> &Parameters {
        &self.params
    }

    /// Parameters with gamma resolved against `problem`
    pub fn resolved_params(&self, problem: &Problem) -> Parameters {
        let mut params = self.params.clone();
        let max_index = problem.max_index();
        if params.kernel_type.uses_gamma() && params.gamma == 0.0 && max_index > 0 {
            params.gamma = 1.0 / max_index as f64;
        }
        params
    }

    /// Train on a problem
    pub fn train(&self, problem: &Problem) -> Result<Model> {
        SVMOptimizer::new(self.resolved_params(problem)).train(problem)
    }

    /// Train from a libsvm format file
    pub fn train_from_file<P: AsRef<Path>>(&self, path: P) -> Result<Model> {
        let problem = load_problem(path)?;
        self.train(&problem)
    }

    /// Out-of-fold predictions from `nr_fold`-fold cross-validation
    pub fn cross_validate(&self, problem: &Problem, nr_fold: usize) -> Result<Vec<f64>> {
        SVMOptimizer::new(self.resolved_params(problem)).cross_validate(problem, nr_fold)
    }
}

/// Fraction of exact label matches
pub fn accuracy(predicted: &[f64], actual: &[f64]) -> f64 {
    if actual.is_empty() {
        return 0.0;
    }
    let correct = predicted
        .iter()
        .zip(actual)
        .filter(|(p, a)| p == a)
        .count();
    correct as f64 / actual.len() as f64
}

/// Regression quality of a set of predictions
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegressionMetrics {
    pub mean_squared_error: f64,
    pub squared_correlation: f64,
}

impl RegressionMetrics {
    pub fn compute(predicted: &[f64], actual: &[f64]) -> Self {
        let n = actual.len() as f64;
        let (mut sum_v, mut sum_y, mut sum_vv, mut sum_yy, mut sum_vy) = (0.0, 0.0, 0.0, 0.0, 0.0);
        let mut total_error = 0.0;

        for (&v, &y) in predicted.iter().zip(actual) {
            total_error += (v - y) * (v - y);
            sum_v += v;
            sum_y += y;
            sum_vv += v * v;
            sum_yy += y * y;
            sum_vy += v * y;
        }

        let numerator = (n * sum_vy - sum_v * sum_y).powi(2);
        let denominator = (n * sum_vv - sum_v * sum_v) * (n * sum_yy - sum_y * sum_y);

        Self {
            mean_squared_error: total_error / n,
            squared_correlation: numerator / denominator,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::SparseVector;
    use approx::assert_relative_eq;

    fn line_problem() -> Problem {
        let mut problem = Problem::default();
        for i in 0..10 {
            let v = i as f64 - 4.5;
            problem.push(SparseVector::from_dense(&[v, 1.0]), if v > 0.0 { 1.0 } else { -1.0 });
        }
        problem
    }

    #[test]
    fn test_svm_builder_pattern() {
        let svm = SVM::new()
            .with_svm_type(SVMType::NuSvc)
            .with_kernel(KernelType::Polynomial)
            .with_degree(2)
            .with_coef0(1.0)
            .with_c(10.0)
            .with_nu(0.3)
            .with_epsilon(1e-4)
            .with_cache_size(10.0)
            .with_shrinking(false)
            .with_weight(1, 2.0)
            .with_seed(42);

        let params = svm.params();
        assert_eq!(params.svm_type, SVMType::NuSvc);
        assert_eq!(params.kernel_type, KernelType::Polynomial);
        assert_eq!(params.degree, 2);
        assert_eq!(params.c, 10.0);
        assert_eq!(params.nu, 0.3);
        assert_eq!(params.eps, 1e-4);
        assert!(!params.shrinking);
        assert_eq!(params.weights, vec![(1, 2.0)]);
        assert_eq!(params.seed, 42);
    }

    #[test]
    fn test_gamma_resolution() {
        let problem = line_problem();
        assert_eq!(SVM::new().resolved_params(&problem).gamma, 0.5);
        assert_eq!(SVM::new().with_gamma(2.0).resolved_params(&problem).gamma, 2.0);
        assert_eq!(
            SVM::new()
                .with_kernel(KernelType::Linear)
                .resolved_params(&problem)
                .gamma,
            0.0
        );
    }

    #[test]
    fn test_quick_training() {
        let problem = line_problem();
        let model = SVM::new()
            .with_kernel(KernelType::Linear)
            .train(&problem)
            .unwrap();

        let predicted: Vec<f64> = problem.x.iter().map(|x| model.predict(x)).collect();
        assert_eq!(accuracy(&predicted, &problem.y), 1.0);
    }

    #[test]
    fn test_file_operations() {
        use std::io::Write;
        use tempfile::NamedTempFile;

        let mut temp_file = NamedTempFile::new().expect("Failed to create temp file");
        writeln!(temp_file, "+1 1:2.0").expect("Failed to write");
        writeln!(temp_file, "-1 1:-2.0").expect("Failed to write");
        writeln!(temp_file, "+1 1:1.5").expect("Failed to write");
        writeln!(temp_file, "-1 1:-1.5").expect("Failed to write");
        temp_file.flush().expect("Failed to flush");

        let model = SVM::new().train_from_file(temp_file.path()).unwrap();
        assert_eq!(model.labels(), &[1, -1]);
        assert_eq!(model.params.gamma, 1.0);
    }

    #[test]
    fn test_accuracy() {
        assert_eq!(accuracy(&[1.0, 2.0, 3.0, 1.0], &[1.0, 2.0, 1.0, 1.0]), 0.75);
        assert_eq!(accuracy(&[], &[]), 0.0);
    }

    #[test]
    fn test_regression_metrics() {
        let metrics = RegressionMetrics::compute(&[1.0, 2.0, 3.0], &[1.0, 2.0, 4.0]);
        assert_relative_eq!(metrics.mean_squared_error, 1.0 / 3.0);
        assert!(metrics.squared_correlation > 0.9 && metrics.squared_correlation <= 1.0);

        let perfect = RegressionMetrics::compute(&[1.0, 2.0], &[2.0, 4.0]);
        assert_relative_eq!(perfect.squared_correlation, 1.0);
    }
}
