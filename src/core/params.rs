//! Training parameters: formulation, kernel family and solver controls
//!
//! Defaults follow the classic libsvm command line tools. Data-independent checks live
//! in [`Parameters::validate`]; [`check_parameter`] adds the checks that need the
//! training set (nu-SVC feasibility).

use crate::core::{Problem, Result, SVMError};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// SVM formulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SVMType {
    CSvc,
    NuSvc,
    OneClass,
    EpsilonSvr,
    NuSvr,
}

impl SVMType {
    /// Name used in the model text format
    pub fn name(&self) -> &'static str {
        match self {
            SVMType::CSvc => "c_svc",
            SVMType::NuSvc => "nu_svc",
            SVMType::OneClass => "one_class",
            SVMType::EpsilonSvr => "epsilon_svr",
            SVMType::NuSvr => "nu_svr",
        }
    }

    /// Classification formulations (labels are class ids)
    pub fn is_classification(&self) -> bool {
        matches!(self, SVMType::CSvc | SVMType::NuSvc)
    }

    /// Regression formulations (labels are target values)
    pub fn is_regression(&self) -> bool {
        matches!(self, SVMType::EpsilonSvr | SVMType::NuSvr)
    }
}

impl fmt::Display for SVMType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SVMType {
    type Err = SVMError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "c_svc" => Ok(SVMType::CSvc),
            "nu_svc" => Ok(SVMType::NuSvc),
            "one_class" => Ok(SVMType::OneClass),
            "epsilon_svr" => Ok(SVMType::EpsilonSvr),
            "nu_svr" => Ok(SVMType::NuSvr),
            other => Err(SVMError::InvalidParameter(format!(
                "unknown svm type: {other}"
            ))),
        }
    }
}

/// Kernel family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum KernelType {
    Linear,
    Polynomial,
    Rbf,
    Sigmoid,
    Precomputed,
}

impl KernelType {
    /// Name used in the model text format
    pub fn name(&self) -> &'static str {
        match self {
            KernelType::Linear => "linear",
            KernelType::Polynomial => "polynomial",
            KernelType::Rbf => "rbf",
            KernelType::Sigmoid => "sigmoid",
            KernelType::Precomputed => "precomputed",
        }
    }

    /// Kernels whose value depends on `gamma`
    pub fn uses_gamma(&self) -> bool {
        matches!(
            self,
            KernelType::Polynomial | KernelType::Rbf | KernelType::Sigmoid
        )
    }

    /// Kernels whose value depends on `coef0`
    pub fn uses_coef0(&self) -> bool {
        matches!(self, KernelType::Polynomial | KernelType::Sigmoid)
    }
}

impl fmt::Display for KernelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for KernelType {
    type Err = SVMError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "linear" => Ok(KernelType::Linear),
            "polynomial" => Ok(KernelType::Polynomial),
            "rbf" => Ok(KernelType::Rbf),
            "sigmoid" => Ok(KernelType::Sigmoid),
            "precomputed" => Ok(KernelType::Precomputed),
            other => Err(SVMError::InvalidParameter(format!(
                "unknown kernel type: {other}"
            ))),
        }
    }
}

/// Full training configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Parameters {
    pub svm_type: SVMType,
    pub kernel_type: KernelType,
    /// Polynomial degree
    pub degree: i32,
    /// Kernel width; 0 means "1 / number of features", resolved by the caller
    pub gamma: f64,
    pub coef0: f64,
    /// Kernel cache budget in megabytes
    pub cache_size: f64,
    /// Stopping tolerance on the KKT violation
    pub eps: f64,
    /// Regularization for C-SVC, epsilon-SVR and nu-SVR
    pub c: f64,
    /// Per-class multipliers of `c` as `(label, weight)`
    pub weights: Vec<(i32, f64)>,
    /// nu for nu-SVC, one-class and nu-SVR
    pub nu: f64,
    /// Insensitive-loss margin for epsilon-SVR
    pub p: f64,
    pub shrinking: bool,
    /// Fit probability calibration during training
    pub probability: bool,
    /// Seed for cross-validation and calibration shuffles
    pub seed: u64,
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            svm_type: SVMType::CSvc,
            kernel_type: KernelType::Rbf,
            degree: 3,
            gamma: 0.0,
            coef0: 0.0,
            cache_size: 100.0,
            eps: 1e-3,
            c: 1.0,
            weights: Vec::new(),
            nu: 0.5,
            p: 0.1,
            shrinking: true,
            probability: false,
            seed: 1,
        }
    }
}

impl Parameters {
    /// Data-independent validation
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: &str| Err(SVMError::InvalidParameter(msg.to_string()));

        if self.kernel_type.uses_gamma() && self.gamma < 0.0 {
            return invalid("gamma < 0");
        }
        if self.kernel_type == KernelType::Polynomial && self.degree < 0 {
            return invalid("degree of polynomial kernel < 0");
        }
        if self.cache_size <= 0.0 {
            return invalid("cache_size <= 0");
        }
        if self.eps <= 0.0 {
            return invalid("eps <= 0");
        }
        if matches!(
            self.svm_type,
            SVMType::CSvc | SVMType::EpsilonSvr | SVMType::NuSvr
        ) && self.c <= 0.0
        {
            return invalid("C <= 0");
        }
        if matches!(
            self.svm_type,
            SVMType::NuSvc | SVMType::OneClass | SVMType::NuSvr
        ) && (self.nu <= 0.0 || self.nu > 1.0)
        {
            return invalid("nu <= 0 or nu > 1");
        }
        if self.svm_type == SVMType::EpsilonSvr && self.p < 0.0 {
            return invalid("p < 0");
        }
        if self.probability && self.svm_type == SVMType::OneClass {
            return invalid("one-class SVM probability output not supported yet");
        }
        Ok(())
    }

    /// Cache budget in bytes
    pub fn cache_bytes(&self) -> usize {
        (self.cache_size * (1 << 20) as f64) as usize
    }
}

/// Validate parameters against a training problem
///
/// Runs [`Parameters::validate`] and, for nu-SVC, rejects a `nu` for which some class
/// pair `(n1, n2)` has `nu * (n1 + n2) / 2 > min(n1, n2)`.
pub fn check_parameter(problem: &Problem, params: &Parameters) -> Result<()> {
    params.validate()?;

    if problem.is_empty() {
        return Err(SVMError::EmptyDataset);
    }

    if params.svm_type == SVMType::NuSvc {
        let mut labels: Vec<i32> = Vec::new();
        let mut counts: Vec<usize> = Vec::new();
        for &y in &problem.y {
            let label = y as i32;
            match labels.iter().position(|&l| l == label) {
                Some(pos) => counts[pos] += 1,
                None => {
                    labels.push(label);
                    counts.push(1);
                }
            }
        }

        for (i, &n1) in counts.iter().enumerate() {
            for &n2 in &counts[i + 1..] {
                if params.nu * (n1 + n2) as f64 / 2.0 > n1.min(n2) as f64 {
                    return Err(SVMError::InvalidParameter(
                        "specified nu is infeasible".to_string(),
                    ));
                }
            }
        }
    }

    Ok(())
}
