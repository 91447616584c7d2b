//! Dual problems of the five SVM formulations
//!
//! Each function builds the linear term, labels, starting point and Q matrix for one
//! formulation, runs the solver and maps the solution back to one signed coefficient
//! per training instance.

use crate::core::{Parameters, SparseVector};
use crate::qmatrix::{OneClassQ, SvcQ, SvrQ};
use crate::solver::{SMOSolver, SolutionInfo, SolverConfig, SolverVariant};
use log::info;

fn solver(variant: SolverVariant, params: &Parameters) -> SMOSolver {
    SMOSolver::new(variant, SolverConfig::from_params(params))
}

fn signs(y: &[f64]) -> Vec<i8> {
    y.iter().map(|&v| if v > 0.0 { 1 } else { -1 }).collect()
}

/// C-SVC with per-side bounds `cp` and `cn`
pub fn solve_c_svc(
    x: &[&SparseVector],
    y: &[f64],
    params: &Parameters,
    cp: f64,
    cn: f64,
) -> (Vec<f64>, SolutionInfo) {
    let l = x.len();
    let y = signs(y);
    let p = vec![-1.0; l];
    let mut alpha = vec![0.0; l];

    let mut q = SvcQ::new(x, &y, params);
    let si = solver(SolverVariant::Standard, params).solve(&mut q, &p, &y, &mut alpha, cp, cn);

    if cp == cn {
        let sum_alpha: f64 = alpha.iter().sum();
        info!("nu = {}", sum_alpha / (cp * l as f64));
    }

    for (a, &s) in alpha.iter_mut().zip(&y) {
        *a *= s as f64;
    }
    (alpha, si)
}

/// nu-SVC, solved with unit bounds and rescaled by `1 / r`
pub fn solve_nu_svc(
    x: &[&SparseVector],
    y: &[f64],
    params: &Parameters,
) -> (Vec<f64>, SolutionInfo) {
    let l = x.len();
    let y = signs(y);
    let mut sum_pos = params.nu * l as f64 / 2.0;
    let mut sum_neg = sum_pos;

    let mut alpha = Vec::with_capacity(l);
    for &s in &y {
        let remaining = if s == 1 { &mut sum_pos } else { &mut sum_neg };
        let a = remaining.min(1.0);
        *remaining -= a;
        alpha.push(a);
    }

    let p = vec![0.0; l];
    let mut q = SvcQ::new(x, &y, params);
    let mut si = solver(SolverVariant::Nu, params).solve(&mut q, &p, &y, &mut alpha, 1.0, 1.0);

    let r = si.r;
    info!("C = {}", 1.0 / r);

    for (a, &s) in alpha.iter_mut().zip(&y) {
        *a *= s as f64 / r;
    }
    si.rho /= r;
    si.obj /= r * r;
    si.upper_bound_p = 1.0 / r;
    si.upper_bound_n = 1.0 / r;
    (alpha, si)
}

/// One-class SVM; the first `floor(nu l)` multipliers start at their bound
pub fn solve_one_class(x: &[&SparseVector], params: &Parameters) -> (Vec<f64>, SolutionInfo) {
    let l = x.len();
    let total = params.nu * l as f64;
    let n = total as usize;

    let mut alpha = vec![0.0; l];
    for a in alpha.iter_mut().take(n) {
        *a = 1.0;
    }
    if n < l {
        alpha[n] = total - n as f64;
    }

    let p = vec![0.0; l];
    let y = vec![1i8; l];
    let mut q = OneClassQ::new(x, params);
    let si = solver(SolverVariant::Standard, params).solve(&mut q, &p, &y, &mut alpha, 1.0, 1.0);
    (alpha, si)
}

/// Labels of the doubled regression problem: `+1` twins first, then `-1` twins
fn twin_signs(l: usize) -> Vec<i8> {
    let mut y = vec![1i8; l];
    y.resize(2 * l, -1);
    y
}

fn fold_twins(alpha2: &[f64], l: usize) -> Vec<f64> {
    (0..l).map(|i| alpha2[i] - alpha2[i + l]).collect()
}

/// epsilon-SVR over `2l` twin variables
pub fn solve_epsilon_svr(
    x: &[&SparseVector],
    y: &[f64],
    params: &Parameters,
) -> (Vec<f64>, SolutionInfo) {
    let l = x.len();
    let mut alpha2 = vec![0.0; 2 * l];
    let mut linear_term: Vec<f64> = y.iter().map(|&v| params.p - v).collect();
    linear_term.extend(y.iter().map(|&v| params.p + v));
    let y2 = twin_signs(l);

    let mut q = SvrQ::new(x, params);
    let si = solver(SolverVariant::Standard, params).solve(
        &mut q,
        &linear_term,
        &y2,
        &mut alpha2,
        params.c,
        params.c,
    );

    let alpha = fold_twins(&alpha2, l);
    let sum_alpha: f64 = alpha.iter().map(|a| a.abs()).sum();
    info!("nu = {}", sum_alpha / (params.c * l as f64));
    (alpha, si)
}

/// nu-SVR; the tube width comes out of the solver as `-r`
pub fn solve_nu_svr(
    x: &[&SparseVector],
    y: &[f64],
    params: &Parameters,
) -> (Vec<f64>, SolutionInfo) {
    let l = x.len();
    let c = params.c;
    let mut sum = c * params.nu * l as f64 / 2.0;

    let mut alpha2 = vec![0.0; 2 * l];
    for i in 0..l {
        let a = sum.min(c);
        alpha2[i] = a;
        alpha2[i + l] = a;
        sum -= a;
    }

    let mut linear_term: Vec<f64> = y.iter().map(|&v| -v).collect();
    linear_term.extend_from_slice(y);
    let y2 = twin_signs(l);

    let mut q = SvrQ::new(x, params);
    let si = solver(SolverVariant::Nu, params).solve(&mut q, &linear_term, &y2, &mut alpha2, c, c);
    info!("epsilon = {}", -si.r);

    (fold_twins(&alpha2, l), si)
}
