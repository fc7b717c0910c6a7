use super::population::Population;
use crate::error::{QapError, QapResult};
use crate::scorer::Objective;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

/// Fans cost evaluation out over a fixed-size worker pool.
///
/// Each call is a generation barrier: it returns only once every pending
/// individual has been priced, or fails the whole batch.
pub struct Evaluator<O: Objective> {
    objective: Arc<O>,
    pool: ThreadPool,
}

impl<O: Objective> Evaluator<O> {
    pub fn new(objective: Arc<O>, workers: usize) -> QapResult<Self> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers.max(1))
            .thread_name(|i| format!("qap-eval-{}", i))
            .build()
            .map_err(|e| QapError::InvalidConfiguration(format!("worker pool: {}", e)))?;
        Ok(Self { objective, pool })
    }

    pub fn objective(&self) -> &Arc<O> {
        &self.objective
    }

    pub fn workers(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Prices every individual without a cached cost. Returns how many were
    /// evaluated. On failure no cost is written back.
    pub fn evaluate(&self, population: &mut Population) -> QapResult<usize> {
        let pending: Vec<usize> = population
            .iter()
            .enumerate()
            .filter(|(_, ind)| !ind.is_evaluated())
            .map(|(i, _)| i)
            .collect();

        if pending.is_empty() {
            return Ok(0);
        }

        let individuals = population.individuals();
        let results: Vec<QapResult<f64>> = self.pool.install(|| {
            pending
                .par_iter()
                .map(|&idx| self.price(idx, individuals[idx].genes()))
                .collect()
        });

        let costs = results.into_iter().collect::<QapResult<Vec<f64>>>()?;

        let slots = population.individuals_mut();
        for (&idx, cost) in pending.iter().zip(costs) {
            slots[idx].set_cost(cost);
        }
        Ok(pending.len())
    }

    /// Prices arbitrary assignments, in input order.
    pub fn costs(&self, assignments: &[Vec<usize>]) -> QapResult<Vec<f64>> {
        self.pool.install(|| {
            assignments
                .par_iter()
                .enumerate()
                .map(|(idx, genes)| self.price(idx, genes))
                .collect()
        })
    }

    fn price(&self, index: usize, genes: &[usize]) -> QapResult<f64> {
        let expected = self.objective.size();
        if genes.len() != expected {
            return Err(QapError::EvaluationFailure {
                index,
                reason: format!("assignment has {} genes, expected {}", genes.len(), expected),
            });
        }

        let objective = &self.objective;
        let cost = panic::catch_unwind(AssertUnwindSafe(|| objective.cost(genes))).map_err(
            |payload| QapError::EvaluationFailure {
                index,
                reason: panic_message(payload.as_ref()),
            },
        )?;

        if !cost.is_finite() {
            return Err(QapError::EvaluationFailure {
                index,
                reason: format!("cost is not finite ({})", cost),
            });
        }
        Ok(cost)
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("worker panicked: {}", s)
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("worker panicked: {}", s)
    } else {
        "worker panicked".to_string()
    }
}
