pub mod flow;
pub mod loader;

use crate::error::{invalid, QapResult};
use crate::matrix::{DistanceMatrix, FlowMatrix};
use std::sync::Arc;

/// Anything that can price a permutation. The evaluator fans calls out across
/// worker threads, so implementations must be pure and thread-safe.
pub trait Objective: Send + Sync {
    /// Number of symbols (and slots) an assignment must cover.
    fn size(&self) -> usize;

    fn cost(&self, assignment: &[usize]) -> f64;
}

/// QAP cost: `sum_ij D[a[i]][a[j]] * F[i][j]` over all ordered pairs,
/// self-pairs included.
#[derive(Debug, Clone)]
pub struct CostModel {
    pub distance: Arc<DistanceMatrix>,
    pub flow: Arc<FlowMatrix>,
}

impl CostModel {
    pub fn new(distance: DistanceMatrix, flow: FlowMatrix) -> QapResult<Self> {
        Self::from_shared(Arc::new(distance), Arc::new(flow))
    }

    pub fn from_shared(distance: Arc<DistanceMatrix>, flow: Arc<FlowMatrix>) -> QapResult<Self> {
        let n = distance.size();
        if n < 2 {
            return invalid(format!("at least 2 slots are required, got {}", n));
        }
        if flow.size() != n {
            return invalid(format!(
                "distance matrix is {}x{} but flow matrix is {}x{}",
                n,
                n,
                flow.size(),
                flow.size()
            ));
        }
        // `max_possible_cost` assumes non-negative entries.
        for (name, matrix) in [("distance", &distance), ("flow", &flow)] {
            let min = matrix.min_entry();
            if min < 0.0 {
                return invalid(format!("{} matrix has a negative entry ({})", name, min));
            }
        }
        Ok(Self { distance, flow })
    }

    /// The assignment must be a permutation of `0..n`; the optimizer only
    /// ever produces permutations.
    #[inline]
    pub fn cost(&self, assignment: &[usize]) -> f64 {
        let mut total = 0.0;
        for (i, &slot_i) in assignment.iter().enumerate() {
            let d_row = self.distance.row(slot_i);
            let f_row = self.flow.row(i);
            for (j, &slot_j) in assignment.iter().enumerate() {
                total += d_row[slot_j] * f_row[j];
            }
        }
        total
    }

    /// Upper bound on any assignment's cost, handy for "accept everything"
    /// thresholds.
    pub fn max_possible_cost(&self) -> f64 {
        let n = self.distance.size();
        let flow_total: f64 = (0..n).map(|i| self.flow.row(i).iter().sum::<f64>()).sum();
        flow_total * self.distance.max_entry()
    }
}

impl Objective for CostModel {
    fn size(&self) -> usize {
        self.distance.size()
    }

    fn cost(&self, assignment: &[usize]) -> f64 {
        CostModel::cost(self, assignment)
    }
}

/// Returns `true` when `assignment` holds every value of `0..n` exactly once.
pub fn is_permutation(assignment: &[usize], n: usize) -> bool {
    if assignment.len() != n {
        return false;
    }
    let mut seen = vec![false; n];
    for &v in assignment {
        if v >= n || seen[v] {
            return false;
        }
        seen[v] = true;
    }
    true
}

/// Inverse permutation: `inv[a[i]] = i`.
pub fn invert(assignment: &[usize]) -> Vec<usize> {
    let mut inv = vec![0; assignment.len()];
    for (i, &v) in assignment.iter().enumerate() {
        inv[v] = i;
    }
    inv
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::SquareMatrix;
    use proptest::prelude::*;

    fn line_model(n: usize) -> CostModel {
        let d = SquareMatrix::from_fn(n, |i, j| (i as f64 - j as f64).abs());
        let f = SquareMatrix::from_fn(n, |i, j| ((i * 7 + j * 7) % 11) as f64);
        CostModel::new(d, f).unwrap()
    }

    #[test]
    fn test_hand_computed_cost() {
        let d = SquareMatrix::from_rows(&[[0.0, 2.0], [2.0, 0.0]]).unwrap();
        let f = SquareMatrix::from_rows(&[[0.0, 3.0], [3.0, 0.0]]).unwrap();
        let model = CostModel::new(d, f).unwrap();
        // Two ordered pairs, each 2 * 3.
        assert_eq!(model.cost(&[0, 1]), 12.0);
        assert_eq!(model.cost(&[1, 0]), 12.0);
    }

    #[test]
    fn test_self_pairs_are_counted() {
        let d = SquareMatrix::from_rows(&[[1.0, 0.0], [0.0, 5.0]]).unwrap();
        let f = SquareMatrix::from_rows(&[[2.0, 0.0], [0.0, 0.0]]).unwrap();
        let model = CostModel::new(d, f).unwrap();
        assert_eq!(model.cost(&[0, 1]), 2.0);
        assert_eq!(model.cost(&[1, 0]), 10.0);
    }

    #[test]
    fn test_dimension_mismatch_rejected() {
        let d = SquareMatrix::zeros(3);
        let f = SquareMatrix::zeros(4);
        assert!(CostModel::new(d, f).is_err());
        assert!(CostModel::new(SquareMatrix::zeros(1), SquareMatrix::zeros(1)).is_err());
    }

    #[test]
    fn test_negative_entries_rejected() {
        let d = SquareMatrix::from_rows(&[[0.0, -1.0], [-1.0, 0.0]]).unwrap();
        let f = SquareMatrix::from_rows(&[[0.0, 3.0], [3.0, 0.0]]).unwrap();
        assert!(matches!(
            CostModel::new(d.clone(), f.clone()),
            Err(crate::error::QapError::InvalidConfiguration(_))
        ));
        assert!(CostModel::new(f, d).is_err());
    }

    #[test]
    fn test_permutation_check() {
        assert!(is_permutation(&[2, 0, 1], 3));
        assert!(!is_permutation(&[0, 0, 1], 3));
        assert!(!is_permutation(&[0, 1, 3], 3));
        assert!(!is_permutation(&[0, 1], 3));
    }

    #[test]
    fn test_max_possible_cost_bounds_everything() {
        let model = line_model(6);
        let bound = model.max_possible_cost();
        let mut rng = fastrand::Rng::with_seed(3);
        for _ in 0..50 {
            let mut a: Vec<usize> = (0..6).collect();
            rng.shuffle(&mut a);
            assert!(model.cost(&a) <= bound);
        }
    }

    proptest! {
        #[test]
        fn prop_cost_is_deterministic(seed in any::<u64>()) {
            let model = line_model(8);
            let mut a: Vec<usize> = (0..8).collect();
            fastrand::Rng::with_seed(seed).shuffle(&mut a);
            prop_assert_eq!(model.cost(&a), model.cost(&a));
        }

        // Relabeling identity: pricing `a` with (D, F) equals pricing the
        // inverse permutation with the roles of the matrices swapped.
        #[test]
        fn prop_cost_relabeling_identity(seed in any::<u64>()) {
            let n = 7;
            let d = SquareMatrix::from_fn(n, |i, j| ((i + j) % 4) as f64);
            let f = SquareMatrix::from_fn(n, |i, j| ((i * j) % 5) as f64);
            let forward = CostModel::new(d.clone(), f.clone()).unwrap();
            let swapped = CostModel::new(f, d).unwrap();

            let mut a: Vec<usize> = (0..n).collect();
            fastrand::Rng::with_seed(seed).shuffle(&mut a);

            prop_assert_eq!(forward.cost(&a), swapped.cost(&invert(&a)));
        }
    }
}
