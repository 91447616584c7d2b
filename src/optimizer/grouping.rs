//! Grouping of training instances by class label

/// Classes of a labelled training set in internal order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassGroups {
    /// Distinct labels, in order of first occurrence
    pub labels: Vec<i32>,
    /// Instances per class
    pub counts: Vec<usize>,
    /// Offset of each class inside `perm`
    pub start: Vec<usize>,
    /// Training indices ordered class by class, stable within a class
    pub perm: Vec<usize>,
}

impl ClassGroups {
    pub fn nr_class(&self) -> usize {
        self.labels.len()
    }

    /// Training indices of class `c`
    pub fn members(&self, c: usize) -> &[usize] {
        &self.perm[self.start[c]..self.start[c] + self.counts[c]]
    }
}

/// Group labels (truncated to integers) by first occurrence
///
/// A two-class problem whose first label is `-1` and second is `+1` is reordered so
/// that `+1` comes first, which keeps positive decision values on the `+1` side.
pub fn group_classes(y: &[f64]) -> ClassGroups {
    let mut labels: Vec<i32> = Vec::new();
    let mut counts: Vec<usize> = Vec::new();
    let mut data_label = Vec::with_capacity(y.len());

    for &value in y {
        let label = value as i32;
        let class = match labels.iter().position(|&l| l == label) {
            Some(c) => {
                counts[c] += 1;
                c
            }
            None => {
                labels.push(label);
                counts.push(1);
                labels.len() - 1
            }
        };
        data_label.push(class);
    }

    if labels == [-1, 1] {
        labels.swap(0, 1);
        counts.swap(0, 1);
        for class in data_label.iter_mut() {
            *class = 1 - *class;
        }
    }

    let mut start = vec![0; labels.len()];
    for c in 1..labels.len() {
        start[c] = start[c - 1] + counts[c - 1];
    }

    let mut next = start.clone();
    let mut perm = vec![0; y.len()];
    for (i, &class) in data_label.iter().enumerate() {
        perm[next[class]] = i;
        next[class] += 1;
    }

    ClassGroups {
        labels,
        counts,
        start,
        perm,
    }
}
