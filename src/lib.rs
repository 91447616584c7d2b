//! Support Vector Machine training and prediction
//!
//! An SMO solver with second-order working-set selection, shrinking and a bounded
//! kernel row cache, covering C-SVC, nu-SVC, one-class SVM, epsilon-SVR and nu-SVR.
//! Multi-class problems are decomposed one-vs-one; Platt scaling and pairwise coupling
//! provide probability estimates. Models are stored in the libsvm text format.
//!
//! ```rust
//! use smosvm::{KernelType, Problem, SparseVector, SVM};
//!
//! let mut problem = Problem::default();
//! problem.push(SparseVector::from_dense(&[1.0, 1.0]), 1.0);
//! problem.push(SparseVector::from_dense(&[-1.0, -1.0]), -1.0);
//!
//! let model = SVM::new().with_kernel(KernelType::Linear).train(&problem).unwrap();
//! assert_eq!(model.predict(&SparseVector::from_dense(&[2.0, 2.0])), 1.0);
//! ```

pub mod api;
pub mod cache;
pub mod core;
pub mod data;
pub mod kernel;
pub mod model;
pub mod optimizer;
pub mod persistence;
pub mod probability;
pub mod qmatrix;
pub mod solver;

// Re-export main types for convenience
pub use crate::api::SVM;
pub use crate::cache::{CacheStats, KernelCache};
pub use crate::core::error::{Result, SVMError};
pub use crate::core::params::{check_parameter, KernelType, Parameters, SVMType};
pub use crate::core::types::*;
pub use crate::data::{load_problem, read_problem};
pub use crate::kernel::{Kernel, KernelFunction};
pub use crate::model::Model;
pub use crate::optimizer::SVMOptimizer;
pub use crate::persistence::{load_model, save_model};

// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
