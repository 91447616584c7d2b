//! Polynomial Kernel Implementation
//!
//! The polynomial kernel is defined as:
//! K(x, y) = (γ * <x, y> + r)^d
//!
//! Where:
//! - γ (gamma): scaling factor for the dot product
//! - r (coef0): independent term in the polynomial
//! - d (degree): degree of the polynomial

use crate::core::SparseVector;
use crate::kernel::linear::dot;
use crate::kernel::traits::Kernel;

/// Polynomial kernel with configurable degree, gamma, and coefficient
#[derive(Debug, Clone, Copy)]
pub struct PolynomialKernel {
    /// Scaling factor for the dot product
    pub gamma: f64,
    /// Independent term in the polynomial
    pub coef0: f64,
    /// Degree of the polynomial
    pub degree: i32,
}

impl PolynomialKernel {
    /// Creates a new polynomial kernel with the specified parameters
    ///
    /// # Examples
    /// ```
    /// use smosvm::kernel::{Kernel, PolynomialKernel};
    /// use smosvm::SparseVector;
    ///
    /// let kernel = PolynomialKernel::new(2, 1.0, 1.0);
    /// let x = SparseVector::from_dense(&[1.0, 2.0]);
    /// assert_eq!(kernel.compute(&x, &x), 36.0);
    /// ```
    pub fn new(degree: i32, gamma: f64, coef0: f64) -> Self {
        Self {
            gamma,
            coef0,
            degree,
        }
    }
}

impl Kernel for PolynomialKernel {
    fn compute(&self, x: &SparseVector, y: &SparseVector) -> f64 {
        powi(self.gamma * dot(x, y) + self.coef0, self.degree)
    }
}

/// Integer power by repeated squaring
///
/// Negative exponents yield 1.0, matching a degree that validation would reject anyway.
pub fn powi(base: f64, times: i32) -> f64 {
    let mut tmp = base;
    let mut ret = 1.0;
    let mut t = times;
    while t > 0 {
        if t % 2 == 1 {
            ret *= tmp;
        }
        tmp *= tmp;
        t /= 2;
    }
    ret
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_powi_matches_std() {
        for degree in 0..8 {
            assert_relative_eq!(powi(1.7, degree), 1.7f64.powi(degree), epsilon = 1e-12);
            assert_relative_eq!(powi(-0.5, degree), (-0.5f64).powi(degree), epsilon = 1e-12);
        }
        assert_eq!(powi(3.0, -1), 1.0);
    }

    #[test]
    fn test_polynomial_kernel_computation() {
        let kernel = PolynomialKernel::new(2, 1.0, 1.0);

        let x = SparseVector::from_dense(&[1.0, 2.0]);
        let y = SparseVector::from_dense(&[2.0, 1.0]);

        // (1 * 4 + 1)^2
        assert_relative_eq!(kernel.compute(&x, &y), 25.0, epsilon = 1e-10);
    }

    #[test]
    fn test_polynomial_kernel_same_vector() {
        let kernel = PolynomialKernel::new(3, 0.5, 2.0);
        let x = SparseVector::from_dense(&[3.0, 4.0]);

        // (0.5 * 25 + 2)^3
        assert_relative_eq!(kernel.compute(&x, &x), 3048.625, epsilon = 1e-6);
    }

    #[test]
    fn test_polynomial_kernel_negative_base_keeps_sign() {
        let kernel = PolynomialKernel::new(3, -1.0, 0.5);
        let x = SparseVector::from_dense(&[1.0]);

        // (-1 + 0.5)^3
        assert_relative_eq!(kernel.compute(&x, &x), -0.125, epsilon = 1e-12);
    }

    #[test]
    fn test_polynomial_kernel_high_degree() {
        let kernel = PolynomialKernel::new(5, 0.1, 1.0);

        let x = SparseVector::from_dense(&[2.0]);
        let y = SparseVector::from_dense(&[3.0]);

        assert_relative_eq!(kernel.compute(&x, &y), 10.48576, epsilon = 1e-5);
    }
}
