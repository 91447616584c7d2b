//! Probability calibration fitted from internal cross-validation
//!
//! Classification pairs get a Platt sigmoid over out-of-fold decision values.
//! Regression gets the scale of a Laplace distribution over out-of-fold residuals.

use crate::core::{Parameters, SparseVector};
use crate::optimizer::cross_validation::cross_validate_refs;
use crate::optimizer::train_model;
use crate::probability::{sigmoid_train, SigmoidFit};
use log::info;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

/// Folds used by both calibrators
const CALIBRATION_FOLDS: usize = 5;

/// Fit the sigmoid of one two-class subproblem
///
/// `y` holds `+1` for the first class of the pair and `-1` for the second. Folds whose
/// training part lacks one of the classes are scored without training: `+1` or `-1`
/// when only that side remains, `0` when nothing does.
pub fn binary_svc_probability(
    x: &[&SparseVector],
    y: &[f64],
    params: &Parameters,
    cp: f64,
    cn: f64,
    rng: &mut StdRng,
) -> SigmoidFit {
    let l = x.len();
    let mut perm: Vec<usize> = (0..l).collect();
    perm.shuffle(rng);

    let sub_params = Parameters {
        probability: false,
        c: 1.0,
        weights: vec![(1, cp), (-1, cn)],
        ..params.clone()
    };

    let mut dec_values = vec![0.0; l];
    for fold in 0..CALIBRATION_FOLDS {
        let begin = fold * l / CALIBRATION_FOLDS;
        let end = (fold + 1) * l / CALIBRATION_FOLDS;

        let train: Vec<usize> = perm[..begin].iter().chain(&perm[end..]).copied().collect();
        let sub_x: Vec<&SparseVector> = train.iter().map(|&i| x[i]).collect();
        let sub_y: Vec<f64> = train.iter().map(|&i| y[i]).collect();

        let p_count = sub_y.iter().filter(|&&v| v > 0.0).count();
        let n_count = sub_y.len() - p_count;

        let fixed = match (p_count, n_count) {
            (0, 0) => Some(0.0),
            (_, 0) => Some(1.0),
            (0, _) => Some(-1.0),
            _ => None,
        };

        match fixed {
            Some(value) => {
                for &i in &perm[begin..end] {
                    dec_values[i] = value;
                }
            }
            None => {
                let model = train_model(&sub_x, &sub_y, &sub_params, rng);
                // Orient values so that positive means the first class of the pair
                let orientation = model.labels()[0] as f64;
                for &i in &perm[begin..end] {
                    dec_values[i] = model.predict_values(x[i]).1[0] * orientation;
                }
            }
        }
    }

    sigmoid_train(&dec_values, y)
}

/// Laplace scale `sigma` of the out-of-fold regression residuals
///
/// Residuals beyond `5 * sqrt(2) * mae` are treated as outliers and left out of the
/// final mean.
pub fn svr_probability(
    x: &[&SparseVector],
    y: &[f64],
    params: &Parameters,
    rng: &mut StdRng,
) -> f64 {
    let sub_params = Parameters {
        probability: false,
        ..params.clone()
    };
    let predictions = cross_validate_refs(x, y, &sub_params, CALIBRATION_FOLDS, rng);

    let residuals: Vec<f64> = y
        .iter()
        .zip(&predictions)
        .map(|(&target, &predicted)| (target - predicted).abs())
        .collect();
    let mae = residuals.iter().sum::<f64>() / residuals.len() as f64;
    let std = (2.0 * mae * mae).sqrt();

    let kept: Vec<f64> = residuals.into_iter().filter(|&r| r <= 5.0 * std).collect();
    let sigma = kept.iter().sum::<f64>() / kept.len() as f64;

    info!(
        "prob. model for test data: target value = predicted value + z, \
         z: Laplace distribution e^(-|z|/sigma)/(2sigma), sigma = {sigma}"
    );
    sigma
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{KernelType, SVMType};
    use crate::probability::sigmoid_predict;
    use rand::SeedableRng;

    fn linear(svm_type: SVMType) -> Parameters {
        Parameters {
            svm_type,
            kernel_type: KernelType::Linear,
            ..Parameters::default()
        }
    }

    #[test]
    fn test_sigmoid_orients_towards_first_class() {
        let data: Vec<SparseVector> = (0..20)
            .map(|i| {
                let v = if i < 10 { 1.0 + i as f64 * 0.1 } else { -1.0 - (i - 10) as f64 * 0.1 };
                SparseVector::from_dense(&[v])
            })
            .collect();
        let x: Vec<&SparseVector> = data.iter().collect();
        let y: Vec<f64> = (0..20).map(|i| if i < 10 { 1.0 } else { -1.0 }).collect();

        let mut rng = StdRng::seed_from_u64(1);
        let fit = binary_svc_probability(&x, &y, &linear(SVMType::CSvc), 1.0, 1.0, &mut rng);

        assert!(fit.a < 0.0);
        assert!(sigmoid_predict(1.0, fit.a, fit.b) > 0.5);
        assert!(sigmoid_predict(-1.0, fit.a, fit.b) < 0.5);
    }

    #[test]
    fn test_single_class_folds_need_no_training() {
        let data: Vec<SparseVector> = (0..5).map(|i| SparseVector::from_dense(&[i as f64])).collect();
        let x: Vec<&SparseVector> = data.iter().collect();
        let y = vec![1.0; 5];

        let mut rng = StdRng::seed_from_u64(3);
        let fit = binary_svc_probability(&x, &y, &linear(SVMType::CSvc), 1.0, 1.0, &mut rng);
        // Every decision value is +1 and every label positive
        assert!(sigmoid_predict(1.0, fit.a, fit.b) > 0.5);
    }

    #[test]
    fn test_svr_sigma_on_exact_fit() {
        let data: Vec<SparseVector> = (1..=10).map(|i| SparseVector::from_dense(&[i as f64])).collect();
        let x: Vec<&SparseVector> = data.iter().collect();
        let y: Vec<f64> = (1..=10).map(|i| 2.0 * i as f64).collect();
        let params = Parameters {
            c: 100.0,
            p: 0.01,
            ..linear(SVMType::EpsilonSvr)
        };

        let mut rng = StdRng::seed_from_u64(1);
        let sigma = svr_probability(&x, &y, &params, &mut rng);
        assert!(sigma >= 0.0);
        assert!(sigma < 1.0);
    }
}
