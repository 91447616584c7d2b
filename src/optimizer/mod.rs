//! Training orchestration
//!
//! [`SVMOptimizer`] turns a [`Problem`] into a [`Model`]. One-class and regression
//! problems are a single dual solve. Classification is decomposed one-vs-one: every
//! class pair gets its own two-class solve with class-weighted bounds, and the
//! multipliers are gathered into the shared support-vector layout of [`Model`].

pub mod calibration;
pub mod cross_validation;
pub mod formulations;
pub mod grouping;

pub use self::cross_validation::{assign_folds, Folds};
pub use self::grouping::{group_classes, ClassGroups};

use crate::core::{check_parameter, Parameters, Problem, Result, SVMError, SVMType, SparseVector};
use crate::model::Model;
use log::{info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Signed multipliers and offset of one decision function
struct DecisionFunction {
    alpha: Vec<f64>,
    rho: f64,
}

/// Trains models and runs cross-validation for one set of [`Parameters`]
///
/// `gamma` is used as given; resolve a zero gamma before building the optimizer
/// (see [`crate::api::SVM`]).
#[derive(Debug, Clone)]
pub struct SVMOptimizer {
    params: Parameters,
}

impl SVMOptimizer {
    pub fn new(params: Parameters) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &Parameters {
        &self.params
    }

    /// Validate the parameters against `problem` and train a model
    pub fn train(&self, problem: &Problem) -> Result<Model> {
        check_parameter(problem, &self.params)?;

        let x: Vec<&SparseVector> = problem.x.iter().collect();
        let mut rng = StdRng::seed_from_u64(self.params.seed);
        Ok(train_model(&x, &problem.y, &self.params, &mut rng))
    }

    /// Out-of-fold prediction for every instance of `problem`
    pub fn cross_validate(&self, problem: &Problem, nr_fold: usize) -> Result<Vec<f64>> {
        check_parameter(problem, &self.params)?;
        if nr_fold < 2 {
            return Err(SVMError::InvalidParameter(
                "n-fold cross validation: n must >= 2".to_string(),
            ));
        }

        let x: Vec<&SparseVector> = problem.x.iter().collect();
        let mut rng = StdRng::seed_from_u64(self.params.seed);
        Ok(cross_validation::cross_validate_refs(
            &x,
            &problem.y,
            &self.params,
            nr_fold,
            &mut rng,
        ))
    }
}

/// Train without validation; `rng` drives the calibration shuffles
pub(crate) fn train_model(
    x: &[&SparseVector],
    y: &[f64],
    params: &Parameters,
    rng: &mut StdRng,
) -> Model {
    match params.svm_type {
        SVMType::CSvc | SVMType::NuSvc => train_one_vs_one(x, y, params, rng),
        SVMType::OneClass | SVMType::EpsilonSvr | SVMType::NuSvr => {
            train_single(x, y, params, rng)
        }
    }
}

fn train_one(
    x: &[&SparseVector],
    y: &[f64],
    params: &Parameters,
    cp: f64,
    cn: f64,
) -> DecisionFunction {
    let (alpha, si) = match params.svm_type {
        SVMType::CSvc => formulations::solve_c_svc(x, y, params, cp, cn),
        SVMType::NuSvc => formulations::solve_nu_svc(x, y, params),
        SVMType::OneClass => formulations::solve_one_class(x, params),
        SVMType::EpsilonSvr => formulations::solve_epsilon_svr(x, y, params),
        SVMType::NuSvr => formulations::solve_nu_svr(x, y, params),
    };
    info!("obj = {}, rho = {}", si.obj, si.rho);

    let mut n_sv = 0;
    let mut n_bsv = 0;
    for (a, &label) in alpha.iter().zip(y) {
        if a.abs() > 0.0 {
            n_sv += 1;
            let bound = if label > 0.0 {
                si.upper_bound_p
            } else {
                si.upper_bound_n
            };
            if a.abs() >= bound {
                n_bsv += 1;
            }
        }
    }
    info!("nSV = {n_sv}, nBSV = {n_bsv}");

    DecisionFunction {
        alpha,
        rho: si.rho,
    }
}

fn train_single(
    x: &[&SparseVector],
    y: &[f64],
    params: &Parameters,
    rng: &mut StdRng,
) -> Model {
    let prob_a = if params.probability && params.svm_type.is_regression() {
        vec![calibration::svr_probability(x, y, params, rng)]
    } else {
        Vec::new()
    };

    let f = train_one(x, y, params, 0.0, 0.0);

    let mut sv = Vec::new();
    let mut coef = Vec::new();
    let mut sv_indices = Vec::new();
    for (i, &a) in f.alpha.iter().enumerate() {
        if a != 0.0 {
            sv.push(x[i].clone());
            coef.push(a);
            sv_indices.push(i + 1);
        }
    }

    Model {
        params: params.clone(),
        nr_class: 2,
        sv,
        sv_coef: vec![coef],
        rho: vec![f.rho],
        prob_a,
        prob_b: Vec::new(),
        sv_indices,
        label: Vec::new(),
        n_sv: Vec::new(),
    }
}

/// Per-class bounds: `C` scaled by every weight whose label names that class
fn weighted_c(params: &Parameters, labels: &[i32]) -> Vec<f64> {
    let mut weighted = vec![params.c; labels.len()];
    for &(label, weight) in &params.weights {
        match labels.iter().position(|&l| l == label) {
            Some(c) => weighted[c] *= weight,
            None => warn!("class label {label} specified in weight is not found"),
        }
    }
    weighted
}

fn train_one_vs_one(
    x: &[&SparseVector],
    y: &[f64],
    params: &Parameters,
    rng: &mut StdRng,
) -> Model {
    let l = x.len();
    let groups = group_classes(y);
    let nr_class = groups.nr_class();
    if nr_class == 1 {
        warn!("training data in only one class");
    }

    let (start, count) = (&groups.start, &groups.counts);
    let xs: Vec<&SparseVector> = groups.perm.iter().map(|&i| x[i]).collect();
    let weighted = weighted_c(params, &groups.labels);

    let mut nonzero = vec![false; l];
    let mut decisions = Vec::with_capacity(nr_class * nr_class.saturating_sub(1) / 2);
    let mut prob_a = Vec::new();
    let mut prob_b = Vec::new();

    for i in 0..nr_class {
        for j in i + 1..nr_class {
            let (si, ci) = (start[i], count[i]);
            let (sj, cj) = (start[j], count[j]);

            let mut sub_x = Vec::with_capacity(ci + cj);
            sub_x.extend_from_slice(&xs[si..si + ci]);
            sub_x.extend_from_slice(&xs[sj..sj + cj]);
            let mut sub_y = vec![1.0; ci];
            sub_y.resize(ci + cj, -1.0);

            if params.probability {
                let fit = calibration::binary_svc_probability(
                    &sub_x,
                    &sub_y,
                    params,
                    weighted[i],
                    weighted[j],
                    rng,
                );
                prob_a.push(fit.a);
                prob_b.push(fit.b);
            }

            let f = train_one(&sub_x, &sub_y, params, weighted[i], weighted[j]);
            for k in 0..ci {
                if f.alpha[k] != 0.0 {
                    nonzero[si + k] = true;
                }
            }
            for k in 0..cj {
                if f.alpha[ci + k] != 0.0 {
                    nonzero[sj + k] = true;
                }
            }
            decisions.push(f);
        }
    }

    let n_sv: Vec<usize> = (0..nr_class)
        .map(|c| nonzero[start[c]..start[c] + count[c]].iter().filter(|&&nz| nz).count())
        .collect();

    let mut sv = Vec::new();
    let mut sv_indices = Vec::new();
    for (i, &nz) in nonzero.iter().enumerate() {
        if nz {
            sv.push(xs[i].clone());
            sv_indices.push(groups.perm[i] + 1);
        }
    }
    let total_sv = sv.len();
    info!("Total nSV = {total_sv}");

    let mut nz_start = vec![0; nr_class];
    for c in 1..nr_class {
        nz_start[c] = nz_start[c - 1] + n_sv[c - 1];
    }

    let mut sv_coef = vec![vec![0.0; total_sv]; nr_class.saturating_sub(1)];
    let mut p = 0;
    for i in 0..nr_class {
        for j in i + 1..nr_class {
            let f = &decisions[p];
            let (si, ci) = (start[i], count[i]);
            let (sj, cj) = (start[j], count[j]);

            let mut q = nz_start[i];
            for k in 0..ci {
                if nonzero[si + k] {
                    sv_coef[j - 1][q] = f.alpha[k];
                    q += 1;
                }
            }
            q = nz_start[j];
            for k in 0..cj {
                if nonzero[sj + k] {
                    sv_coef[i][q] = f.alpha[ci + k];
                    q += 1;
                }
            }
            p += 1;
        }
    }

    Model {
        params: params.clone(),
        nr_class,
        sv,
        sv_coef,
        rho: decisions.iter().map(|f| f.rho).collect(),
        prob_a,
        prob_b,
        sv_indices,
        label: groups.labels,
        n_sv,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::KernelType;
    use approx::assert_relative_eq;

    fn linear(svm_type: SVMType) -> Parameters {
        Parameters {
            svm_type,
            kernel_type: KernelType::Linear,
            ..Parameters::default()
        }
    }

    fn problem(points: &[(f64, f64, f64)]) -> Problem {
        let mut problem = Problem::default();
        for &(a, b, label) in points {
            problem.push(SparseVector::from_dense(&[a, b]), label);
        }
        problem
    }

    #[test]
    fn test_symmetric_pair() {
        let data = problem(&[(1.0, 1.0, 1.0), (-1.0, -1.0, -1.0)]);
        let model = SVMOptimizer::new(linear(SVMType::CSvc)).train(&data).unwrap();

        assert_eq!(model.labels(), &[1, -1]);
        assert_eq!(model.support_vector_count(), 2);
        assert_relative_eq!(model.rho[0], 0.0, epsilon = 1e-6);
        assert_relative_eq!(model.sv_coef[0][0], -model.sv_coef[0][1], epsilon = 1e-6);
        assert_eq!(model.support_vector_indices(), &[1, 2]);
    }

    #[test]
    fn test_minus_one_first_still_predicts_correctly() {
        let data = problem(&[(-1.0, -1.0, -1.0), (1.0, 1.0, 1.0)]);
        let model = SVMOptimizer::new(linear(SVMType::CSvc)).train(&data).unwrap();

        assert_eq!(model.labels(), &[1, -1]);
        assert_eq!(model.support_vector_indices(), &[2, 1]);
        assert_eq!(model.predict(&SparseVector::from_dense(&[2.0, 2.0])), 1.0);
        assert_eq!(model.predict(&SparseVector::from_dense(&[-2.0, -2.0])), -1.0);
    }

    #[test]
    fn test_three_classes_layout() {
        let data = problem(&[
            (0.0, 0.0, 1.0),
            (0.1, 0.1, 1.0),
            (5.0, 0.0, 2.0),
            (5.1, 0.1, 2.0),
            (0.0, 5.0, 3.0),
            (0.1, 5.1, 3.0),
        ]);
        let model = SVMOptimizer::new(linear(SVMType::CSvc)).train(&data).unwrap();

        assert_eq!(model.nr_class(), 3);
        assert_eq!(model.labels(), &[1, 2, 3]);
        assert_eq!(model.rho.len(), 3);
        assert_eq!(model.sv_coef.len(), 2);
        assert_eq!(model.n_sv.iter().sum::<usize>(), model.support_vector_count());
        for row in &model.sv_coef {
            assert_eq!(row.len(), model.support_vector_count());
        }
        for (x, &y) in data.x.iter().zip(&data.y) {
            assert_eq!(model.predict(x), y);
        }
    }

    #[test]
    fn test_class_weight_scales_bound() {
        let params = Parameters {
            c: 2.0,
            weights: vec![(3, 0.5), (9, 4.0)],
            ..linear(SVMType::CSvc)
        };
        assert_eq!(weighted_c(&params, &[1, 3]), vec![2.0, 1.0]);
    }

    #[test]
    fn test_single_class_predicts_that_class() {
        let data = problem(&[(0.0, 1.0, 4.0), (1.0, 0.0, 4.0)]);
        let model = SVMOptimizer::new(linear(SVMType::CSvc)).train(&data).unwrap();

        assert_eq!(model.nr_class(), 1);
        assert_eq!(model.support_vector_count(), 0);
        assert_eq!(model.predict(&SparseVector::from_dense(&[9.0, 9.0])), 4.0);
    }

    #[test]
    fn test_regression_support_vectors() {
        let data = problem(&[
            (1.0, 0.0, 1.0),
            (2.0, 0.0, 2.0),
            (3.0, 0.0, 3.0),
            (4.0, 0.0, 4.0),
        ]);
        let params = Parameters {
            c: 10.0,
            p: 0.1,
            ..linear(SVMType::EpsilonSvr)
        };
        let model = SVMOptimizer::new(params).train(&data).unwrap();

        assert!(model.labels().is_empty());
        assert_eq!(model.sv_coef.len(), 1);
        assert_eq!(model.sv_indices.len(), model.support_vector_count());
        let prediction = model.predict(&SparseVector::from_dense(&[2.5, 0.0]));
        assert!((prediction - 2.5).abs() < 0.2);
    }

    #[test]
    fn test_validation_runs_first() {
        let data = problem(&[(1.0, 1.0, 1.0)]);
        let params = Parameters {
            c: -1.0,
            ..linear(SVMType::CSvc)
        };
        assert!(SVMOptimizer::new(params).train(&data).is_err());

        let optimizer = SVMOptimizer::new(linear(SVMType::CSvc));
        assert!(matches!(
            optimizer.cross_validate(&data, 1),
            Err(SVMError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_cross_validation_covers_every_instance() {
        let mut data = Problem::default();
        for i in 0..20 {
            let v = i as f64 / 10.0;
            let (x, label) = if i % 2 == 0 { (1.0 + v, 1.0) } else { (-1.0 - v, -1.0) };
            data.push(SparseVector::from_dense(&[x]), label);
        }

        let optimizer = SVMOptimizer::new(linear(SVMType::CSvc));
        let target = optimizer.cross_validate(&data, 5).unwrap();
        assert_eq!(target.len(), 20);
        assert_eq!(target, data.y);
        assert_eq!(optimizer.cross_validate(&data, 5).unwrap(), target);
    }
}
