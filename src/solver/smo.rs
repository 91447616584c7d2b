//! Sequential Minimal Optimization (SMO) solver
//!
//! Solves
//!
//! ```text
//! min  0.5 αᵀQα + pᵀα
//! s.t. yᵀα = Δ,  0 ≤ α_i ≤ C_i
//! ```
//!
//! by repeatedly optimizing two variables chosen with second-order working-set
//! selection (Fan, Chen and Lin, JMLR 2005). The nu variant additionally keeps the sum
//! of each class's multipliers fixed and therefore only pairs variables of equal label.

use crate::cache::Qfloat;
use crate::core::Parameters;
use crate::qmatrix::QMatrix;
use crate::solver::shrinking::ShrinkThresholds;
use log::{debug, info, warn};

/// Curvature floor for non positive-definite kernels
const TAU: f64 = 1e-12;

/// Which dual the solver optimizes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverVariant {
    /// Single equality constraint `yᵀα = Δ`
    Standard,
    /// Separate equality constraints per label
    Nu,
}

/// Position of a multiplier relative to its box
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlphaStatus {
    LowerBound,
    UpperBound,
    Free,
}

/// Solver controls
#[derive(Debug, Clone)]
pub struct SolverConfig {
    /// Stopping tolerance on the maximal KKT violation
    pub eps: f64,
    pub shrinking: bool,
    /// Iteration ceiling; `None` means `max(10_000_000, 100 * l)`
    pub max_iterations: Option<usize>,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            eps: 1e-3,
            shrinking: true,
            max_iterations: None,
        }
    }
}

impl SolverConfig {
    pub fn from_params(params: &Parameters) -> Self {
        Self {
            eps: params.eps,
            shrinking: params.shrinking,
            max_iterations: None,
        }
    }
}

/// Output of one solve
#[derive(Debug, Clone, PartialEq)]
pub struct SolutionInfo {
    /// Dual objective value
    pub obj: f64,
    /// Bias; decision values are `Σ coef_i K(x_i, x) - rho`
    pub rho: f64,
    pub upper_bound_p: f64,
    pub upper_bound_n: f64,
    /// Scale factor of the nu variant, 0 for the standard one
    pub r: f64,
    pub iterations: usize,
    /// False when the iteration ceiling stopped the solve
    pub converged: bool,
}

/// SMO solver for the SVM dual
///
/// One solver value can run any number of independent solves; all per-solve state
/// lives in the call to [`SMOSolver::solve`].
#[derive(Debug, Clone)]
pub struct SMOSolver {
    variant: SolverVariant,
    config: SolverConfig,
}

impl SMOSolver {
    pub fn new(variant: SolverVariant, config: SolverConfig) -> Self {
        Self { variant, config }
    }

    pub fn variant(&self) -> SolverVariant {
        self.variant
    }

    /// Solve the dual
    ///
    /// `alpha` holds a feasible starting point on entry and the solution on return.
    /// `y` must contain only `+1` and `-1`; `cp` and `cn` bound the multipliers of the
    /// positive and negative variables.
    pub fn solve<Q: QMatrix>(
        &self,
        q: &mut Q,
        p: &[f64],
        y: &[i8],
        alpha: &mut [f64],
        cp: f64,
        cn: f64,
    ) -> SolutionInfo {
        let l = y.len();
        debug_assert_eq!(p.len(), l);
        debug_assert_eq!(alpha.len(), l);
        debug_assert_eq!(q.diagonal().len(), l);

        let mut state = SolverState::new(q, self.variant, p, y, alpha, cp, cn, self.config.eps);
        state.initialize_gradient();

        let max_iterations = self
            .config
            .max_iterations
            .unwrap_or_else(|| l.saturating_mul(100).max(10_000_000));
        let mut counter = l.min(1000) + 1;
        let mut iterations = 0;
        let mut converged = false;

        while iterations < max_iterations {
            counter -= 1;
            if counter == 0 {
                counter = l.min(1000);
                if self.config.shrinking {
                    state.do_shrinking();
                }
            }

            let (i, j) = match state.select_working_set() {
                Some(pair) => pair,
                None => {
                    // Stale gradients of shrunk variables can fake convergence
                    state.reconstruct_gradient();
                    state.active_size = l;
                    match state.select_working_set() {
                        Some(pair) => {
                            counter = 1;
                            pair
                        }
                        None => {
                            converged = true;
                            break;
                        }
                    }
                }
            };

            iterations += 1;
            state.update_pair(i, j);
        }

        if !converged {
            if state.active_size < l {
                state.reconstruct_gradient();
                state.active_size = l;
            }
            warn!("reaching max number of iterations ({max_iterations})");
        }

        let (rho, r) = state.calculate_rho();
        let obj = (0..l)
            .map(|i| state.alpha[i] * (state.g[i] + state.p[i]))
            .sum::<f64>()
            / 2.0;

        for i in 0..l {
            alpha[state.active_set[i]] = state.alpha[i];
        }

        info!("optimization finished, #iter = {iterations}");

        SolutionInfo {
            obj,
            rho,
            upper_bound_p: cp,
            upper_bound_n: cn,
            r,
            iterations,
            converged,
        }
    }
}

/// Per-solve working arrays, all permuted together with the Q matrix
struct SolverState<'q, Q: QMatrix> {
    q: &'q mut Q,
    variant: SolverVariant,
    l: usize,
    active_size: usize,
    y: Vec<i8>,
    /// Gradient of the objective
    g: Vec<f64>,
    /// Gradient contribution of variables at their upper bound
    g_bar: Vec<f64>,
    alpha: Vec<f64>,
    status: Vec<AlphaStatus>,
    p: Vec<f64>,
    /// Original position of each permuted variable
    active_set: Vec<usize>,
    unshrink: bool,
    cp: f64,
    cn: f64,
    eps: f64,
    column: Vec<Qfloat>,
}

impl<'q, Q: QMatrix> SolverState<'q, Q> {
    #[allow(clippy::too_many_arguments)]
    fn new(
        q: &'q mut Q,
        variant: SolverVariant,
        p: &[f64],
        y: &[i8],
        alpha: &[f64],
        cp: f64,
        cn: f64,
        eps: f64,
    ) -> Self {
        let l = y.len();
        let mut state = Self {
            q,
            variant,
            l,
            active_size: l,
            y: y.to_vec(),
            g: vec![0.0; l],
            g_bar: vec![0.0; l],
            alpha: alpha.to_vec(),
            status: vec![AlphaStatus::LowerBound; l],
            p: p.to_vec(),
            active_set: (0..l).collect(),
            unshrink: false,
            cp,
            cn,
            eps,
            column: Vec::with_capacity(l),
        };
        for i in 0..l {
            state.update_status(i);
        }
        state
    }

    fn bound(&self, i: usize) -> f64 {
        if self.y[i] > 0 {
            self.cp
        } else {
            self.cn
        }
    }

    fn update_status(&mut self, i: usize) {
        self.status[i] = if self.alpha[i] >= self.bound(i) {
            AlphaStatus::UpperBound
        } else if self.alpha[i] <= 0.0 {
            AlphaStatus::LowerBound
        } else {
            AlphaStatus::Free
        };
    }

    fn is_upper(&self, i: usize) -> bool {
        self.status[i] == AlphaStatus::UpperBound
    }

    fn is_lower(&self, i: usize) -> bool {
        self.status[i] == AlphaStatus::LowerBound
    }

    fn is_free(&self, i: usize) -> bool {
        self.status[i] == AlphaStatus::Free
    }

    /// Copy the first `len` entries of column `i` into the scratch column
    fn load_column(&mut self, i: usize, len: usize) {
        self.column.clear();
        self.column.extend_from_slice(self.q.column(i, len));
    }

    fn initialize_gradient(&mut self) {
        let l = self.l;
        self.g.copy_from_slice(&self.p);
        for i in 0..l {
            if self.is_lower(i) {
                continue;
            }
            let alpha_i = self.alpha[i];
            let c_i = self.bound(i);
            let upper = self.is_upper(i);
            let q_i = self.q.column(i, l);
            for j in 0..l {
                self.g[j] += alpha_i * q_i[j] as f64;
            }
            if upper {
                for j in 0..l {
                    self.g_bar[j] += c_i * q_i[j] as f64;
                }
            }
        }
    }

    /// Swap two variables in every permuted array, the Q matrix first
    fn swap_index(&mut self, i: usize, j: usize) {
        self.q.swap_index(i, j);
        self.y.swap(i, j);
        self.g.swap(i, j);
        self.status.swap(i, j);
        self.alpha.swap(i, j);
        self.p.swap(i, j);
        self.active_set.swap(i, j);
        self.g_bar.swap(i, j);
    }

    /// Recompute the gradient of inactive variables from `g_bar` and the free ones
    fn reconstruct_gradient(&mut self) {
        let (active_size, l) = (self.active_size, self.l);
        if active_size == l {
            return;
        }

        for j in active_size..l {
            self.g[j] = self.g_bar[j] + self.p[j];
        }

        let nr_free = (0..active_size).filter(|&j| self.is_free(j)).count();
        debug!("reconstructing gradient: {nr_free} free of {active_size} active");

        if nr_free * l > 2 * active_size * (l - active_size) {
            for i in active_size..l {
                let q_i = self.q.column(i, active_size);
                for j in 0..active_size {
                    if self.status[j] == AlphaStatus::Free {
                        self.g[i] += self.alpha[j] * q_i[j] as f64;
                    }
                }
            }
        } else {
            for i in 0..active_size {
                if !self.is_free(i) {
                    continue;
                }
                let alpha_i = self.alpha[i];
                let q_i = self.q.column(i, l);
                for j in active_size..l {
                    self.g[j] += alpha_i * q_i[j] as f64;
                }
            }
        }
    }

    fn select_working_set(&mut self) -> Option<(usize, usize)> {
        match self.variant {
            SolverVariant::Standard => self.select_working_set_standard(),
            SolverVariant::Nu => self.select_working_set_nu(),
        }
    }

    /// Objective decrease of a step along `(i, j)`; more negative is better
    fn step_gain(grad_diff: f64, quad_coef: f64) -> f64 {
        let quad_coef = if quad_coef > 0.0 { quad_coef } else { TAU };
        -(grad_diff * grad_diff) / quad_coef
    }

    fn select_working_set_standard(&mut self) -> Option<(usize, usize)> {
        let active_size = self.active_size;
        let mut gmax = f64::NEG_INFINITY;
        let mut gmax2 = f64::NEG_INFINITY;
        let mut gmax_idx = None;
        let mut gmin_idx = None;
        let mut obj_diff_min = f64::INFINITY;

        for t in 0..active_size {
            if self.y[t] == 1 {
                if !self.is_upper(t) && -self.g[t] >= gmax {
                    gmax = -self.g[t];
                    gmax_idx = Some(t);
                }
            } else if !self.is_lower(t) && self.g[t] >= gmax {
                gmax = self.g[t];
                gmax_idx = Some(t);
            }
        }

        let i = gmax_idx?;
        self.load_column(i, active_size);
        let qd = self.q.diagonal();
        let yi = self.y[i] as f64;

        for j in 0..active_size {
            if self.y[j] == 1 {
                if self.status[j] != AlphaStatus::LowerBound {
                    let grad_diff = gmax + self.g[j];
                    if self.g[j] >= gmax2 {
                        gmax2 = self.g[j];
                    }
                    if grad_diff > 0.0 {
                        let quad_coef = qd[i] + qd[j] - 2.0 * yi * self.column[j] as f64;
                        let obj_diff = Self::step_gain(grad_diff, quad_coef);
                        if obj_diff <= obj_diff_min {
                            gmin_idx = Some(j);
                            obj_diff_min = obj_diff;
                        }
                    }
                }
            } else if self.status[j] != AlphaStatus::UpperBound {
                let grad_diff = gmax - self.g[j];
                if -self.g[j] >= gmax2 {
                    gmax2 = -self.g[j];
                }
                if grad_diff > 0.0 {
                    let quad_coef = qd[i] + qd[j] + 2.0 * yi * self.column[j] as f64;
                    let obj_diff = Self::step_gain(grad_diff, quad_coef);
                    if obj_diff <= obj_diff_min {
                        gmin_idx = Some(j);
                        obj_diff_min = obj_diff;
                    }
                }
            }
        }

        if gmax + gmax2 < self.eps {
            return None;
        }
        gmin_idx.map(|j| (i, j))
    }

    fn select_working_set_nu(&mut self) -> Option<(usize, usize)> {
        let active_size = self.active_size;
        let mut gmaxp = f64::NEG_INFINITY;
        let mut gmaxp2 = f64::NEG_INFINITY;
        let mut gmaxp_idx = None;
        let mut gmaxn = f64::NEG_INFINITY;
        let mut gmaxn2 = f64::NEG_INFINITY;
        let mut gmaxn_idx = None;
        let mut gmin_idx = None;
        let mut obj_diff_min = f64::INFINITY;

        for t in 0..active_size {
            if self.y[t] == 1 {
                if !self.is_upper(t) && -self.g[t] >= gmaxp {
                    gmaxp = -self.g[t];
                    gmaxp_idx = Some(t);
                }
            } else if !self.is_lower(t) && self.g[t] >= gmaxn {
                gmaxn = self.g[t];
                gmaxn_idx = Some(t);
            }
        }

        let column_p = gmaxp_idx.map(|ip| {
            self.load_column(ip, active_size);
            std::mem::take(&mut self.column)
        });
        let column_n = gmaxn_idx.map(|ineg| {
            self.load_column(ineg, active_size);
            std::mem::take(&mut self.column)
        });
        let qd = self.q.diagonal();

        for j in 0..active_size {
            if self.y[j] == 1 {
                if self.status[j] != AlphaStatus::LowerBound {
                    let grad_diff = gmaxp + self.g[j];
                    if self.g[j] >= gmaxp2 {
                        gmaxp2 = self.g[j];
                    }
                    if let (true, Some(ip), Some(q_ip)) = (grad_diff > 0.0, gmaxp_idx, &column_p) {
                        let quad_coef = qd[ip] + qd[j] - 2.0 * q_ip[j] as f64;
                        let obj_diff = Self::step_gain(grad_diff, quad_coef);
                        if obj_diff <= obj_diff_min {
                            gmin_idx = Some(j);
                            obj_diff_min = obj_diff;
                        }
                    }
                }
            } else if self.status[j] != AlphaStatus::UpperBound {
                let grad_diff = gmaxn - self.g[j];
                if -self.g[j] >= gmaxn2 {
                    gmaxn2 = -self.g[j];
                }
                if let (true, Some(ineg), Some(q_in)) = (grad_diff > 0.0, gmaxn_idx, &column_n) {
                    let quad_coef = qd[ineg] + qd[j] - 2.0 * q_in[j] as f64;
                    let obj_diff = Self::step_gain(grad_diff, quad_coef);
                    if obj_diff <= obj_diff_min {
                        gmin_idx = Some(j);
                        obj_diff_min = obj_diff;
                    }
                }
            }
        }

        if (gmaxp + gmaxp2).max(gmaxn + gmaxn2) < self.eps {
            return None;
        }
        let j = gmin_idx?;
        let i = if self.y[j] == 1 { gmaxp_idx } else { gmaxn_idx }?;
        Some((i, j))
    }

    /// Analytic two-variable step, clipped to the box, then gradient bookkeeping
    fn update_pair(&mut self, i: usize, j: usize) {
        let active_size = self.active_size;
        self.load_column(i, active_size);
        let q_ij = self.column[j] as f64;
        let (qd_i, qd_j) = {
            let qd = self.q.diagonal();
            (qd[i], qd[j])
        };

        let c_i = self.bound(i);
        let c_j = self.bound(j);
        let old_alpha_i = self.alpha[i];
        let old_alpha_j = self.alpha[j];

        if self.y[i] != self.y[j] {
            let mut quad_coef = qd_i + qd_j + 2.0 * q_ij;
            if quad_coef <= 0.0 {
                quad_coef = TAU;
            }
            let delta = (-self.g[i] - self.g[j]) / quad_coef;
            let diff = self.alpha[i] - self.alpha[j];
            self.alpha[i] += delta;
            self.alpha[j] += delta;

            if diff > 0.0 {
                if self.alpha[j] < 0.0 {
                    self.alpha[j] = 0.0;
                    self.alpha[i] = diff;
                }
            } else if self.alpha[i] < 0.0 {
                self.alpha[i] = 0.0;
                self.alpha[j] = -diff;
            }
            if diff > c_i - c_j {
                if self.alpha[i] > c_i {
                    self.alpha[i] = c_i;
                    self.alpha[j] = c_i - diff;
                }
            } else if self.alpha[j] > c_j {
                self.alpha[j] = c_j;
                self.alpha[i] = c_j + diff;
            }
        } else {
            let mut quad_coef = qd_i + qd_j - 2.0 * q_ij;
            if quad_coef <= 0.0 {
                quad_coef = TAU;
            }
            let delta = (self.g[i] - self.g[j]) / quad_coef;
            let sum = self.alpha[i] + self.alpha[j];
            self.alpha[i] -= delta;
            self.alpha[j] += delta;

            if sum > c_i {
                if self.alpha[i] > c_i {
                    self.alpha[i] = c_i;
                    self.alpha[j] = sum - c_i;
                }
            } else if self.alpha[j] < 0.0 {
                self.alpha[j] = 0.0;
                self.alpha[i] = sum;
            }
            if sum > c_j {
                if self.alpha[j] > c_j {
                    self.alpha[j] = c_j;
                    self.alpha[i] = sum - c_j;
                }
            } else if self.alpha[i] < 0.0 {
                self.alpha[i] = 0.0;
                self.alpha[j] = sum;
            }
        }

        let delta_i = self.alpha[i] - old_alpha_i;
        let delta_j = self.alpha[j] - old_alpha_j;
        {
            let q_j = self.q.column(j, active_size);
            for k in 0..active_size {
                self.g[k] += self.column[k] as f64 * delta_i + q_j[k] as f64 * delta_j;
            }
        }

        let was_upper_i = self.is_upper(i);
        let was_upper_j = self.is_upper(j);
        self.update_status(i);
        self.update_status(j);
        self.update_g_bar(i, c_i, was_upper_i);
        self.update_g_bar(j, c_j, was_upper_j);
    }

    /// Add or remove `C_k Q_k` when variable `k` enters or leaves its upper bound
    fn update_g_bar(&mut self, k: usize, c_k: f64, was_upper: bool) {
        let is_upper = self.is_upper(k);
        if was_upper == is_upper {
            return;
        }
        let l = self.l;
        let sign = if is_upper { c_k } else { -c_k };
        let q_k = self.q.column(k, l);
        for t in 0..l {
            self.g_bar[t] += sign * q_k[t] as f64;
        }
    }

    fn do_shrinking(&mut self) {
        let thresholds = ShrinkThresholds::compute(
            self.variant,
            &self.y,
            &self.g,
            &self.status,
            self.active_size,
        );

        if !self.unshrink && thresholds.max_violation() <= self.eps * 10.0 {
            self.unshrink = true;
            self.reconstruct_gradient();
            self.active_size = self.l;
            debug!("unshrinking: active set restored to {}", self.l);
        }

        let shrinkable =
            |s: &Self, k: usize| thresholds.should_shrink(s.y[k], s.g[k], s.status[k]);

        let mut i = 0;
        while i < self.active_size {
            if shrinkable(self, i) {
                self.active_size -= 1;
                while self.active_size > i {
                    if !shrinkable(self, self.active_size) {
                        self.swap_index(i, self.active_size);
                        break;
                    }
                    self.active_size -= 1;
                }
            }
            i += 1;
        }
        debug!("shrinking: {} of {} variables active", self.active_size, self.l);
    }

    fn calculate_rho(&self) -> (f64, f64) {
        match self.variant {
            SolverVariant::Standard => (self.calculate_rho_standard(), 0.0),
            SolverVariant::Nu => self.calculate_rho_nu(),
        }
    }

    fn calculate_rho_standard(&self) -> f64 {
        let mut nr_free = 0;
        let mut ub = f64::INFINITY;
        let mut lb = f64::NEG_INFINITY;
        let mut sum_free = 0.0;

        for i in 0..self.active_size {
            let yg = self.y[i] as f64 * self.g[i];
            match (self.status[i], self.y[i] == 1) {
                (AlphaStatus::UpperBound, false) | (AlphaStatus::LowerBound, true) => {
                    ub = ub.min(yg)
                }
                (AlphaStatus::UpperBound, true) | (AlphaStatus::LowerBound, false) => {
                    lb = lb.max(yg)
                }
                (AlphaStatus::Free, _) => {
                    nr_free += 1;
                    sum_free += yg;
                }
            }
        }

        if nr_free > 0 {
            sum_free / nr_free as f64
        } else {
            (ub + lb) / 2.0
        }
    }

    /// Returns `(rho, r)` from the per-label biases `r1` and `r2`
    fn calculate_rho_nu(&self) -> (f64, f64) {
        let mut nr_free = [0usize; 2];
        let mut ub = [f64::INFINITY; 2];
        let mut lb = [f64::NEG_INFINITY; 2];
        let mut sum_free = [0.0; 2];

        for i in 0..self.active_size {
            let side = if self.y[i] == 1 { 0 } else { 1 };
            match self.status[i] {
                AlphaStatus::UpperBound => lb[side] = lb[side].max(self.g[i]),
                AlphaStatus::LowerBound => ub[side] = ub[side].min(self.g[i]),
                AlphaStatus::Free => {
                    nr_free[side] += 1;
                    sum_free[side] += self.g[i];
                }
            }
        }

        let bias = |side: usize| {
            if nr_free[side] > 0 {
                sum_free[side] / nr_free[side] as f64
            } else {
                (ub[side] + lb[side]) / 2.0
            }
        };
        let (r1, r2) = (bias(0), bias(1));
        ((r1 - r2) / 2.0, (r1 + r2) / 2.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Dense Q matrix kept fully permuted, for driving the solver directly
    struct DenseQ {
        q: Vec<Vec<Qfloat>>,
        qd: Vec<f64>,
        out: Vec<Qfloat>,
    }

    impl DenseQ {
        fn from_kernel(k: &[Vec<f64>], y: &[i8]) -> Self {
            let q: Vec<Vec<Qfloat>> = k
                .iter()
                .enumerate()
                .map(|(i, row)| {
                    row.iter()
                        .enumerate()
                        .map(|(j, &v)| (y[i] as f64 * y[j] as f64 * v) as Qfloat)
                        .collect()
                })
                .collect();
            let qd = (0..k.len()).map(|i| q[i][i] as f64).collect();
            Self {
                q,
                qd,
                out: Vec::new(),
            }
        }
    }

    impl QMatrix for DenseQ {
        fn column(&mut self, i: usize, len: usize) -> &[Qfloat] {
            self.out = self.q[i][..len].to_vec();
            &self.out
        }

        fn diagonal(&self) -> &[f64] {
            &self.qd
        }

        fn swap_index(&mut self, i: usize, j: usize) {
            self.q.swap(i, j);
            for row in self.q.iter_mut() {
                row.swap(i, j);
            }
            self.qd.swap(i, j);
        }
    }

    fn linear_gram(points: &[[f64; 2]]) -> Vec<Vec<f64>> {
        points
            .iter()
            .map(|a| points.iter().map(|b| a[0] * b[0] + a[1] * b[1]).collect())
            .collect()
    }

    #[test]
    fn test_two_point_problem() {
        let y = [1i8, -1];
        let mut q = DenseQ::from_kernel(&linear_gram(&[[1.0, 1.0], [-1.0, -1.0]]), &y);
        let mut alpha = [0.0, 0.0];

        let solver = SMOSolver::new(SolverVariant::Standard, SolverConfig::default());
        let si = solver.solve(&mut q, &[-1.0, -1.0], &y, &mut alpha, 1.0, 1.0);

        assert!(si.converged);
        assert_eq!(si.iterations, 1);
        assert_relative_eq!(alpha[0], 0.25, epsilon = 1e-9);
        assert_relative_eq!(alpha[1], 0.25, epsilon = 1e-9);
        assert_relative_eq!(si.rho, 0.0, epsilon = 1e-9);
        assert_relative_eq!(si.obj, -0.25, epsilon = 1e-9);
        assert_eq!(si.upper_bound_p, 1.0);
    }

    #[test]
    fn test_box_constraint_respected() {
        let y = [1i8, -1];
        let mut q = DenseQ::from_kernel(&linear_gram(&[[1.0, 1.0], [-1.0, -1.0]]), &y);
        let mut alpha = [0.0, 0.0];

        let solver = SMOSolver::new(SolverVariant::Standard, SolverConfig::default());
        let si = solver.solve(&mut q, &[-1.0, -1.0], &y, &mut alpha, 0.1, 0.1);

        assert!(si.converged);
        assert_relative_eq!(alpha[0], 0.1, epsilon = 1e-12);
        assert_relative_eq!(alpha[1], 0.1, epsilon = 1e-12);
    }

    fn separable() -> (Vec<[f64; 2]>, Vec<i8>) {
        let points = vec![
            [2.0, 2.0],
            [1.5, 3.0],
            [3.0, 1.0],
            [2.5, 2.5],
            [-2.0, -1.0],
            [-1.0, -2.5],
            [-3.0, -3.0],
            [-1.5, -1.0],
        ];
        let y = vec![1, 1, 1, 1, -1, -1, -1, -1];
        (points, y)
    }

    fn kkt_violation(k: &[Vec<f64>], y: &[i8], alpha: &[f64], c: f64) -> f64 {
        let l = y.len();
        let grad: Vec<f64> = (0..l)
            .map(|i| {
                (0..l)
                    .map(|j| y[i] as f64 * y[j] as f64 * k[i][j] * alpha[j])
                    .sum::<f64>()
                    - 1.0
            })
            .collect();
        let mut up = f64::NEG_INFINITY;
        let mut low = f64::INFINITY;
        for i in 0..l {
            let yg = -(y[i] as f64) * grad[i];
            let can_up = (y[i] == 1 && alpha[i] < c) || (y[i] == -1 && alpha[i] > 0.0);
            let can_down = (y[i] == 1 && alpha[i] > 0.0) || (y[i] == -1 && alpha[i] < c);
            if can_up {
                up = up.max(yg);
            }
            if can_down {
                low = low.min(yg);
            }
        }
        up - low
    }

    #[test]
    fn test_shrinking_does_not_change_solution() {
        let (points, y) = separable();
        let k = linear_gram(&points);
        let p = vec![-1.0; y.len()];

        let mut results = Vec::new();
        for shrinking in [true, false] {
            let mut q = DenseQ::from_kernel(&k, &y);
            let mut alpha = vec![0.0; y.len()];
            let config = SolverConfig {
                eps: 1e-6,
                shrinking,
                max_iterations: None,
            };
            let si = SMOSolver::new(SolverVariant::Standard, config)
                .solve(&mut q, &p, &y, &mut alpha, 10.0, 10.0);
            assert!(si.converged);
            assert!(kkt_violation(&k, &y, &alpha, 10.0) < 1e-5);
            let balance: f64 = alpha.iter().zip(&y).map(|(a, &yi)| a * yi as f64).sum();
            assert_relative_eq!(balance, 0.0, epsilon = 1e-9);
            results.push((alpha, si.obj));
        }

        assert_relative_eq!(results[0].1, results[1].1, epsilon = 1e-4);
    }

    #[test]
    fn test_iteration_ceiling_is_soft() {
        let (points, y) = separable();
        let k = linear_gram(&points);
        let mut q = DenseQ::from_kernel(&k, &y);
        let mut alpha = vec![0.0; y.len()];
        let config = SolverConfig {
            eps: 1e-12,
            shrinking: true,
            max_iterations: Some(1),
        };

        let si = SMOSolver::new(SolverVariant::Standard, config).solve(
            &mut q,
            &vec![-1.0; y.len()],
            &y,
            &mut alpha,
            10.0,
            10.0,
        );
        assert!(!si.converged);
        assert_eq!(si.iterations, 1);
        assert!(si.rho.is_finite());
        assert!(alpha.iter().any(|&a| a > 0.0));
    }

    #[test]
    fn test_nu_variant_keeps_class_sums() {
        let (points, y) = separable();
        let k = linear_gram(&points);
        let mut q = DenseQ::from_kernel(&k, &y);
        // nu = 0.5 on 8 points: each class sums to nu * l / 2 = 2
        let mut alpha = vec![1.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0];

        let si = SMOSolver::new(SolverVariant::Nu, SolverConfig::default()).solve(
            &mut q,
            &vec![0.0; y.len()],
            &y,
            &mut alpha,
            1.0,
            1.0,
        );

        assert!(si.converged);
        let positive: f64 = alpha[..4].iter().sum();
        let negative: f64 = alpha[4..].iter().sum();
        assert_relative_eq!(positive, 2.0, epsilon = 1e-9);
        assert_relative_eq!(negative, 2.0, epsilon = 1e-9);
        assert!(alpha.iter().all(|&a| (0.0..=1.0).contains(&a)));
        assert!(si.r > 0.0);
    }
}
