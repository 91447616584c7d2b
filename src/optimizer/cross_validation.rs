//! k-fold cross-validation
//!
//! Classification folds are stratified: every class is shuffled on its own and dealt
//! into the folds so that per-class fold sizes differ by at most one. Other formulations,
//! and leave-one-out, shuffle the whole set.

use crate::core::{Parameters, SparseVector};
use crate::optimizer::grouping::group_classes;
use crate::optimizer::train_model;
use log::warn;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

/// Partition of `0..l` into contiguous runs of a permutation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Folds {
    perm: Vec<usize>,
    fold_start: Vec<usize>,
}

impl Folds {
    pub fn nr_fold(&self) -> usize {
        self.fold_start.len() - 1
    }

    /// Instances held out in `fold`
    pub fn test_indices(&self, fold: usize) -> &[usize] {
        &self.perm[self.fold_start[fold]..self.fold_start[fold + 1]]
    }

    /// Instances trained on when `fold` is held out
    pub fn train_indices(&self, fold: usize) -> Vec<usize> {
        let (begin, end) = (self.fold_start[fold], self.fold_start[fold + 1]);
        self.perm[..begin]
            .iter()
            .chain(&self.perm[end..])
            .copied()
            .collect()
    }
}

/// Deal `y.len()` instances into `nr_fold` folds
///
/// `nr_fold` must be between 1 and `y.len()`.
pub fn assign_folds(y: &[f64], stratified: bool, nr_fold: usize, rng: &mut StdRng) -> Folds {
    let l = y.len();
    debug_assert!(nr_fold >= 1 && nr_fold <= l);

    if !stratified || nr_fold == l {
        let mut perm: Vec<usize> = (0..l).collect();
        perm.shuffle(rng);
        let fold_start = (0..=nr_fold).map(|i| i * l / nr_fold).collect();
        return Folds { perm, fold_start };
    }

    let groups = group_classes(y);
    let mut index = groups.perm.clone();
    for c in 0..groups.nr_class() {
        let start = groups.start[c];
        index[start..start + groups.counts[c]].shuffle(rng);
    }

    let mut fold_start = vec![0; nr_fold + 1];
    for i in 0..nr_fold {
        let fold_count: usize = groups
            .counts
            .iter()
            .map(|&count| (i + 1) * count / nr_fold - i * count / nr_fold)
            .sum();
        fold_start[i + 1] = fold_start[i] + fold_count;
    }

    let mut next = fold_start.clone();
    let mut perm = vec![0; l];
    for c in 0..groups.nr_class() {
        let (start, count) = (groups.start[c], groups.counts[c]);
        for i in 0..nr_fold {
            let begin = start + i * count / nr_fold;
            let end = start + (i + 1) * count / nr_fold;
            for &instance in &index[begin..end] {
                perm[next[i]] = instance;
                next[i] += 1;
            }
        }
    }

    Folds { perm, fold_start }
}

/// Out-of-fold predictions, one per instance
///
/// More folds than instances degrade to leave-one-out. Classification models with
/// probability enabled predict through their calibrated output.
pub(crate) fn cross_validate_refs(
    x: &[&SparseVector],
    y: &[f64],
    params: &Parameters,
    nr_fold: usize,
    rng: &mut StdRng,
) -> Vec<f64> {
    let l = x.len();
    let nr_fold = if nr_fold > l {
        warn!("# folds ({nr_fold}) > # data ({l}); using leave-one-out cross validation");
        l
    } else {
        nr_fold
    };

    let folds = assign_folds(y, params.svm_type.is_classification(), nr_fold, rng);
    let calibrated = params.probability && params.svm_type.is_classification();

    let mut target = vec![0.0; l];
    for fold in 0..folds.nr_fold() {
        let train = folds.train_indices(fold);
        // Only a single-instance problem leaves nothing to train on
        if train.is_empty() {
            continue;
        }

        let sub_x: Vec<&SparseVector> = train.iter().map(|&i| x[i]).collect();
        let sub_y: Vec<f64> = train.iter().map(|&i| y[i]).collect();
        let model = train_model(&sub_x, &sub_y, params, rng);

        for &i in folds.test_indices(fold) {
            target[i] = if calibrated {
                model.predict_probability(x[i]).0
            } else {
                model.predict(x[i])
            };
        }
    }
    target
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn check_partition(folds: &Folds, l: usize) {
        let mut seen = vec![0; l];
        for fold in 0..folds.nr_fold() {
            for &i in folds.test_indices(fold) {
                seen[i] += 1;
            }
            assert_eq!(
                folds.train_indices(fold).len() + folds.test_indices(fold).len(),
                l
            );
        }
        assert!(seen.iter().all(|&n| n == 1));
    }

    #[test]
    fn test_stratified_folds_balance_classes() {
        let y: Vec<f64> = (0..23).map(|i| if i % 3 == 0 { 2.0 } else { 5.0 }).collect();
        let mut rng = StdRng::seed_from_u64(7);
        let folds = assign_folds(&y, true, 4, &mut rng);

        assert_eq!(folds.nr_fold(), 4);
        check_partition(&folds, y.len());

        for label in [2.0, 5.0] {
            let sizes: Vec<usize> = (0..4)
                .map(|f| {
                    folds
                        .test_indices(f)
                        .iter()
                        .filter(|&&i| y[i] == label)
                        .count()
                })
                .collect();
            let max = sizes.iter().max().unwrap();
            let min = sizes.iter().min().unwrap();
            assert!(max - min <= 1, "unbalanced {sizes:?}");
        }
    }

    #[test]
    fn test_plain_folds() {
        let y = vec![0.5; 10];
        let mut rng = StdRng::seed_from_u64(1);
        let folds = assign_folds(&y, false, 3, &mut rng);

        check_partition(&folds, 10);
        let sizes: Vec<usize> = (0..3).map(|f| folds.test_indices(f).len()).collect();
        assert_eq!(sizes, vec![3, 3, 4]);
    }

    #[test]
    fn test_leave_one_out() {
        let y = vec![1.0, -1.0, 1.0, -1.0];
        let mut rng = StdRng::seed_from_u64(1);
        let folds = assign_folds(&y, true, 4, &mut rng);

        check_partition(&folds, 4);
        assert!((0..4).all(|f| folds.test_indices(f).len() == 1));
    }

    #[test]
    fn test_same_seed_same_folds() {
        let y: Vec<f64> = (0..30).map(|i| (i % 4) as f64).collect();
        let a = assign_folds(&y, true, 5, &mut StdRng::seed_from_u64(11));
        let b = assign_folds(&y, true, 5, &mut StdRng::seed_from_u64(11));
        assert_eq!(a, b);
    }
}
