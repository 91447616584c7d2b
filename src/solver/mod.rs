//! SMO solver for the SVM dual problem
//!
//! [`SMOSolver`] works against any [`crate::qmatrix::QMatrix`]; the shrinking
//! thresholds live in [`shrinking`].

pub mod shrinking;
pub mod smo;

pub use self::shrinking::ShrinkThresholds;
pub use self::smo::{AlphaStatus, SMOSolver, SolutionInfo, SolverConfig, SolverVariant};
