//! Trained SVM model and prediction
//!
//! A [`Model`] stores every support vector once, even in a multi-class model. Row
//! `j - 1` of `sv_coef` holds the coefficients class `i` contributes to the classifier
//! `(i, j)`, and row `i` holds those of class `j`, so one kernel evaluation per support
//! vector serves all `k(k-1)/2` pairwise decision functions.

use crate::core::{Parameters, SVMType, SparseVector};
use crate::kernel::{Kernel, KernelFunction};
use crate::probability::{multiclass_probability, sigmoid_predict};

/// Clamp applied to pairwise probabilities before coupling
const MIN_PROB: f64 = 1e-7;

/// Trained SVM
#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    pub params: Parameters,
    /// Number of classes; 2 for one-class and regression models
    pub nr_class: usize,
    /// Support vectors, grouped by class for classification models
    pub sv: Vec<SparseVector>,
    /// `nr_class - 1` rows of `sv.len()` coefficients
    pub sv_coef: Vec<Vec<f64>>,
    /// One offset per pairwise decision function
    pub rho: Vec<f64>,
    /// Pairwise sigmoid slopes, or `[sigma]` for a calibrated regression model
    pub prob_a: Vec<f64>,
    /// Pairwise sigmoid intercepts
    pub prob_b: Vec<f64>,
    /// 1-based positions of the support vectors in the training set; empty after loading
    pub sv_indices: Vec<usize>,
    /// Class labels in internal order; empty for one-class and regression
    pub label: Vec<i32>,
    /// Support vectors per class; empty for one-class and regression
    pub n_sv: Vec<usize>,
}

impl Model {
    pub fn svm_type(&self) -> SVMType {
        self.params.svm_type
    }

    pub fn nr_class(&self) -> usize {
        self.nr_class
    }

    pub fn labels(&self) -> &[i32] {
        &self.label
    }

    pub fn support_vectors(&self) -> &[SparseVector] {
        &self.sv
    }

    pub fn support_vector_count(&self) -> usize {
        self.sv.len()
    }

    /// 1-based training-set positions of the support vectors
    pub fn support_vector_indices(&self) -> &[usize] {
        &self.sv_indices
    }

    /// Whether [`Model::predict_probability`] produces calibrated output
    pub fn has_probability_model(&self) -> bool {
        match self.svm_type() {
            SVMType::CSvc | SVMType::NuSvc => !self.prob_a.is_empty() && !self.prob_b.is_empty(),
            SVMType::EpsilonSvr | SVMType::NuSvr => !self.prob_a.is_empty(),
            SVMType::OneClass => false,
        }
    }

    /// Laplace scale of the residual distribution of a calibrated regression model
    pub fn svr_probability(&self) -> Option<f64> {
        if self.svm_type().is_regression() {
            self.prob_a.first().copied()
        } else {
            None
        }
    }

    /// Predict `x` and return the raw decision values
    ///
    /// One-class and regression models produce a single value. Classification models
    /// produce the `k(k-1)/2` pairwise values in `(0,1), (0,2), ..., (k-2,k-1)` order.
    pub fn predict_values(&self, x: &SparseVector) -> (f64, Vec<f64>) {
        let kernel = KernelFunction::from_params(&self.params);

        if !self.svm_type().is_classification() {
            let coef = &self.sv_coef[0];
            let sum: f64 = self
                .sv
                .iter()
                .zip(coef)
                .map(|(sv, &c)| c * kernel.compute(x, sv))
                .sum();
            let value = sum - self.rho[0];

            let label = match self.svm_type() {
                SVMType::OneClass => {
                    if value > 0.0 {
                        1.0
                    } else {
                        -1.0
                    }
                }
                _ => value,
            };
            return (label, vec![value]);
        }

        let nr_class = self.nr_class;
        let kvalue: Vec<f64> = self.sv.iter().map(|sv| kernel.compute(x, sv)).collect();

        let mut start = vec![0; nr_class];
        for i in 1..nr_class {
            start[i] = start[i - 1] + self.n_sv[i - 1];
        }

        let mut votes = vec![0usize; nr_class];
        let mut dec_values = Vec::with_capacity(nr_class * (nr_class - 1) / 2);
        let mut p = 0;
        for i in 0..nr_class {
            for j in i + 1..nr_class {
                let (si, sj) = (start[i], start[j]);
                let (ci, cj) = (self.n_sv[i], self.n_sv[j]);
                let coef1 = &self.sv_coef[j - 1];
                let coef2 = &self.sv_coef[i];

                let mut sum = 0.0;
                for k in 0..ci {
                    sum += coef1[si + k] * kvalue[si + k];
                }
                for k in 0..cj {
                    sum += coef2[sj + k] * kvalue[sj + k];
                }
                let value = sum - self.rho[p];
                dec_values.push(value);

                if value > 0.0 {
                    votes[i] += 1;
                } else {
                    votes[j] += 1;
                }
                p += 1;
            }
        }

        let winner = first_max(&votes);
        (self.label[winner] as f64, dec_values)
    }

    /// Predicted label, class or target value
    pub fn predict(&self, x: &SparseVector) -> f64 {
        self.predict_values(x).0
    }

    /// Predict with class probabilities
    ///
    /// Probabilities are returned in [`Model::labels`] order. Models without a
    /// classification calibration fall back to [`Model::predict`] and return `None`.
    pub fn predict_probability(&self, x: &SparseVector) -> (f64, Option<Vec<f64>>) {
        if !self.svm_type().is_classification() || !self.has_probability_model() {
            return (self.predict(x), None);
        }

        let nr_class = self.nr_class;
        let (_, dec_values) = self.predict_values(x);

        let mut pairwise = vec![vec![0.0; nr_class]; nr_class];
        let mut k = 0;
        for i in 0..nr_class {
            for j in i + 1..nr_class {
                let r = sigmoid_predict(dec_values[k], self.prob_a[k], self.prob_b[k])
                    .clamp(MIN_PROB, 1.0 - MIN_PROB);
                pairwise[i][j] = r;
                pairwise[j][i] = 1.0 - r;
                k += 1;
            }
        }

        let probabilities = multiclass_probability(nr_class, &pairwise).probabilities;
        let winner = first_max(&probabilities);
        (self.label[winner] as f64, Some(probabilities))
    }
}

/// Index of the first maximal element
fn first_max<T: PartialOrd + Copy>(values: &[T]) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate().skip(1) {
        if v > values[best] {
            best = i;
        }
    }
    best
}
