//! Probability calibration
//!
//! Platt scaling maps one decision value to `P(y = +1)` through a fitted sigmoid;
//! pairwise coupling (Wu, Lin and Weng, 2004) turns the `k(k-1)/2` pairwise
//! probabilities of a one-vs-one model into `k` class probabilities.
//!
//! Neither fit can fail hard: hitting an iteration ceiling or a failed line search is
//! reported through the `converged` flag of the returned value.

use log::warn;

/// Fitted sigmoid `P(y = +1 | f) = 1 / (1 + exp(A f + B))`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SigmoidFit {
    pub a: f64,
    pub b: f64,
    pub converged: bool,
    pub iterations: usize,
}

/// Class probabilities recovered from pairwise estimates
#[derive(Debug, Clone, PartialEq)]
pub struct CouplingResult {
    pub probabilities: Vec<f64>,
    pub converged: bool,
    pub iterations: usize,
}

const SIGMOID_MAX_ITER: usize = 100;
const MIN_STEP: f64 = 1e-10;
/// Hessian regularization
const SIGMA: f64 = 1e-12;
const SIGMOID_EPS: f64 = 1e-5;

/// Numerically stable `(t - 1) f + log(1 + exp(f))` style cross-entropy term
fn cross_entropy(target: f64, f_apb: f64) -> f64 {
    if f_apb >= 0.0 {
        target * f_apb + (-f_apb).exp().ln_1p()
    } else {
        (target - 1.0) * f_apb + f_apb.exp().ln_1p()
    }
}

/// Fit `A` and `B` by Newton's method with backtracking line search
///
/// `labels` are compared against zero: positive means class `+1`. Targets are the
/// smoothed priors `(N+ + 1) / (N+ + 2)` and `1 / (N- + 2)`.
pub fn sigmoid_train(dec_values: &[f64], labels: &[f64]) -> SigmoidFit {
    debug_assert_eq!(dec_values.len(), labels.len());

    let prior1 = labels.iter().filter(|&&y| y > 0.0).count() as f64;
    let prior0 = labels.len() as f64 - prior1;

    let hi_target = (prior1 + 1.0) / (prior1 + 2.0);
    let lo_target = 1.0 / (prior0 + 2.0);
    let targets: Vec<f64> = labels
        .iter()
        .map(|&y| if y > 0.0 { hi_target } else { lo_target })
        .collect();

    let objective = |a: f64, b: f64| -> f64 {
        dec_values
            .iter()
            .zip(&targets)
            .map(|(&f, &t)| cross_entropy(t, f * a + b))
            .sum()
    };

    let mut a = 0.0;
    let mut b = ((prior0 + 1.0) / (prior1 + 1.0)).ln();
    let mut fval = objective(a, b);
    let mut converged = false;
    let mut iterations = 0;

    while iterations < SIGMOID_MAX_ITER {
        let mut h11 = SIGMA;
        let mut h22 = SIGMA;
        let mut h21 = 0.0;
        let mut g1 = 0.0;
        let mut g2 = 0.0;

        for (&f, &t) in dec_values.iter().zip(&targets) {
            let f_apb = f * a + b;
            let (p, q) = if f_apb >= 0.0 {
                let e = (-f_apb).exp();
                (e / (1.0 + e), 1.0 / (1.0 + e))
            } else {
                let e = f_apb.exp();
                (1.0 / (1.0 + e), e / (1.0 + e))
            };
            let d2 = p * q;
            h11 += f * f * d2;
            h22 += d2;
            h21 += f * d2;
            let d1 = t - p;
            g1 += f * d1;
            g2 += d1;
        }

        if g1.abs() < SIGMOID_EPS && g2.abs() < SIGMOID_EPS {
            converged = true;
            break;
        }
        iterations += 1;

        let det = h11 * h22 - h21 * h21;
        let d_a = -(h22 * g1 - h21 * g2) / det;
        let d_b = -(-h21 * g1 + h11 * g2) / det;
        let gd = g1 * d_a + g2 * d_b;

        let mut step = 1.0;
        while step >= MIN_STEP {
            let new_a = a + step * d_a;
            let new_b = b + step * d_b;
            let new_f = objective(new_a, new_b);
            if new_f < fval + 0.0001 * step * gd {
                a = new_a;
                b = new_b;
                fval = new_f;
                break;
            }
            step /= 2.0;
        }

        if step < MIN_STEP {
            warn!("sigmoid fit: line search fails");
            break;
        }
    }

    if iterations >= SIGMOID_MAX_ITER {
        warn!("sigmoid fit: reaching maximal iterations");
    }

    SigmoidFit {
        a,
        b,
        converged,
        iterations,
    }
}

/// Evaluate the fitted sigmoid without overflowing `exp`
pub fn sigmoid_predict(decision_value: f64, a: f64, b: f64) -> f64 {
    let f_apb = decision_value * a + b;
    if f_apb >= 0.0 {
        let e = (-f_apb).exp();
        e / (1.0 + e)
    } else {
        1.0 / (1.0 + f_apb.exp())
    }
}

/// Couple pairwise probabilities `r[i][j] ≈ P(y = i | y ∈ {i, j})` into class probabilities
///
/// Two classes are solved in closed form. Otherwise the fixed-point iteration stops when
/// every entry of `Qp` is within `0.005 / k` of `pᵀQp`, or after `max(100, k)` sweeps.
pub fn multiclass_probability(k: usize, r: &[Vec<f64>]) -> CouplingResult {
    if k == 2 {
        return CouplingResult {
            probabilities: vec![r[0][1], r[1][0]],
            converged: true,
            iterations: 0,
        };
    }

    let max_iter = k.max(100);
    let eps = 0.005 / k as f64;
    let mut p = vec![1.0 / k as f64; k];
    let mut q = vec![vec![0.0; k]; k];
    let mut qp = vec![0.0; k];

    for t in 0..k {
        for j in 0..t {
            q[t][t] += r[j][t] * r[j][t];
            q[t][j] = q[j][t];
        }
        for j in t + 1..k {
            q[t][t] += r[j][t] * r[j][t];
            q[t][j] = -r[j][t] * r[t][j];
        }
    }

    let mut converged = false;
    let mut iterations = 0;
    while iterations < max_iter {
        let mut p_qp = 0.0;
        for t in 0..k {
            qp[t] = (0..k).map(|j| q[t][j] * p[j]).sum();
            p_qp += p[t] * qp[t];
        }

        let max_error = qp
            .iter()
            .map(|&v| (v - p_qp).abs())
            .fold(0.0, f64::max);
        if max_error < eps {
            converged = true;
            break;
        }

        for t in 0..k {
            let diff = (-qp[t] + p_qp) / q[t][t];
            p[t] += diff;
            p_qp = (p_qp + diff * (diff * q[t][t] + 2.0 * qp[t])) / (1.0 + diff) / (1.0 + diff);
            for j in 0..k {
                qp[j] = (qp[j] + diff * q[t][j]) / (1.0 + diff);
                p[j] /= 1.0 + diff;
            }
        }
        iterations += 1;
    }

    if !converged {
        warn!("pairwise coupling: exceeds max_iter ({max_iter})");
    }

    CouplingResult {
        probabilities: p,
        converged,
        iterations,
    }
}
