use crate::error::{invalid, QapResult};
use serde::{Deserialize, Serialize};

/// Dense, row-major N×N matrix holding either problem input (slot distances
/// or symbol flows). Once built, a matrix is never mutated; share it with
/// `Arc`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SquareMatrix {
    n: usize,
    data: Vec<f64>,
}

/// Slot-to-slot placement cost.
pub type DistanceMatrix = SquareMatrix;
/// Symbol-to-symbol usage weight.
pub type FlowMatrix = SquareMatrix;

impl SquareMatrix {
    pub fn zeros(n: usize) -> Self {
        Self {
            n,
            data: vec![0.0; n * n],
        }
    }

    /// Builds a matrix from nested rows, rejecting ragged or non-finite input.
    pub fn from_rows<R: AsRef<[f64]>>(rows: &[R]) -> QapResult<Self> {
        let n = rows.len();
        let mut data = Vec::with_capacity(n * n);

        for (i, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.len() != n {
                return invalid(format!(
                    "matrix is not square: row {} has {} columns, expected {}",
                    i,
                    row.len(),
                    n
                ));
            }
            if let Some(bad) = row.iter().position(|v| !v.is_finite()) {
                return invalid(format!("matrix entry [{}][{}] is not finite", i, bad));
            }
            data.extend_from_slice(row);
        }

        Ok(Self { n, data })
    }

    pub fn from_fn(n: usize, f: impl Fn(usize, usize) -> f64) -> Self {
        let mut data = Vec::with_capacity(n * n);
        for i in 0..n {
            for j in 0..n {
                data.push(f(i, j));
            }
        }
        Self { n, data }
    }

    #[inline(always)]
    pub fn size(&self) -> usize {
        self.n
    }

    #[inline(always)]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[i * self.n + j]
    }

    pub fn set(&mut self, i: usize, j: usize, value: f64) {
        self.data[i * self.n + j] = value;
    }

    #[inline(always)]
    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i * self.n..(i + 1) * self.n]
    }

    pub fn is_symmetric(&self) -> bool {
        (0..self.n).all(|i| (i + 1..self.n).all(|j| self.get(i, j) == self.get(j, i)))
    }

    pub fn max_entry(&self) -> f64 {
        self.data.iter().cloned().fold(0.0, f64::max)
    }

    pub fn min_entry(&self) -> f64 {
        self.data.iter().cloned().fold(f64::INFINITY, f64::min)
    }

    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        self.data.chunks(self.n.max(1)).map(|r| r.to_vec()).collect()
    }
}
