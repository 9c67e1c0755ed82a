use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::models::{Label, ReconciledRecord};

/// Indices into the record slice, each partition in ascending order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Split {
    pub train: Vec<usize>,
    pub eval: Vec<usize>,
}

/// Stratified, seeded train/eval split.
///
/// Records are ordered by identifier before shuffling, so the same records and
/// seed always give the same split regardless of input order.
pub fn stratified_split(records: &[ReconciledRecord], test_ratio: f64, seed: u64) -> Split {
    let mut order: Vec<usize> = (0..records.len()).collect();
    order.sort_by(|&a, &b| records[a].id().cmp(records[b].id()));

    let mut rng = StdRng::seed_from_u64(seed);
    let mut train = Vec::new();
    let mut eval = Vec::new();

    for label in [Label::NotObserved, Label::Exploited] {
        let mut group: Vec<usize> = order.iter().copied().filter(|&i| records[i].label == label).collect();
        group.shuffle(&mut rng);

        let n = group.len();
        let mut n_eval = (n as f64 * test_ratio).round() as usize;
        if n >= 2 {
            n_eval = n_eval.clamp(1, n - 1);
        } else {
            n_eval = 0;
        }

        eval.extend_from_slice(&group[..n_eval]);
        train.extend_from_slice(&group[n_eval..]);
    }

    train.sort_unstable();
    eval.sort_unstable();
    Split { train, eval }
}
