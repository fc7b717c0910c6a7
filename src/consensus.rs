//! Multi-run consensus.
//!
//! Independent GA runs are collected until enough of them beat a cost
//! threshold, then merged slot by slot through frequency voting. The vote is
//! greedy: slots are filled in ascending order, each taking the most
//! frequent symbol that no earlier slot has claimed, with ties going to the
//! lower symbol index. This is a heuristic. It is not a globally optimal
//! matching of the tally, and in degenerate tallies (e.g. all counts equal)
//! late slots simply receive whatever symbols are left.

use crate::config::ConsensusParams;
use crate::error::{invalid, QapError, QapResult};
use crate::optimizer::{CancelToken, GaSolver, ProgressCallback, RunResult};
use crate::scorer::{invert, Objective};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// `counts[slot][symbol]`: how many accepted runs put `symbol` on `slot`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotTally {
    counts: Vec<Vec<usize>>,
}

impl SlotTally {
    pub fn new(n: usize) -> Self {
        Self {
            counts: vec![vec![0; n]; n],
        }
    }

    pub fn from_assignments<'a, I>(n: usize, assignments: I) -> Self
    where
        I: IntoIterator<Item = &'a [usize]>,
    {
        let mut tally = Self::new(n);
        for a in assignments {
            tally.record(a);
        }
        tally
    }

    /// Adds one `symbol -> slot` assignment to the tally.
    pub fn record(&mut self, assignment: &[usize]) {
        for (symbol, &slot) in assignment.iter().enumerate() {
            self.counts[slot][symbol] += 1;
        }
    }

    pub fn size(&self) -> usize {
        self.counts.len()
    }

    pub fn count(&self, slot: usize, symbol: usize) -> usize {
        self.counts[slot][symbol]
    }

    /// Greedy vote; returns `symbol -> slot` like every other assignment.
    pub fn consensus(&self) -> Vec<usize> {
        let n = self.size();
        let mut used = vec![false; n];
        let mut slot_symbols = Vec::with_capacity(n);

        for slot_counts in &self.counts {
            let mut pick: Option<usize> = None;
            for (symbol, &count) in slot_counts.iter().enumerate() {
                if used[symbol] {
                    continue;
                }
                if pick.map_or(true, |p| count > slot_counts[p]) {
                    pick = Some(symbol);
                }
            }
            // n slots, n symbols: an unused symbol always remains.
            let symbol = pick.unwrap_or_default();
            used[symbol] = true;
            slot_symbols.push(symbol);
        }

        invert(&slot_symbols)
    }
}

/// Output of a consensus search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsensusOutcome {
    /// `symbol -> slot`.
    pub assignment: Vec<usize>,
    /// Accepted runs, in acceptance order.
    pub accepted: Vec<RunResult>,
    pub tally: SlotTally,
    pub attempts: usize,
    pub rejected: usize,
    pub elapsed: Duration,
}

impl ConsensusOutcome {
    /// `slot -> symbol`, convenient for rendering.
    pub fn slot_symbols(&self) -> Vec<usize> {
        invert(&self.assignment)
    }
}

pub struct ConsensusBuilder<'a, O: Objective> {
    solver: &'a GaSolver<O>,
    params: ConsensusParams,
}

impl<'a, O: Objective> ConsensusBuilder<'a, O> {
    pub fn new(solver: &'a GaSolver<O>, params: ConsensusParams) -> QapResult<Self> {
        params.validate()?;
        Ok(Self { solver, params })
    }

    /// Repeats GA runs until `target_count` of them finish strictly below
    /// the threshold. Without `max_attempts` / `max_time_secs` this loop has
    /// no bound: an unreachable threshold keeps it running until cancelled.
    pub fn run<CB: ProgressCallback + ?Sized>(
        &self,
        callback: &CB,
        cancel: &CancelToken,
    ) -> QapResult<ConsensusOutcome> {
        let params = &self.params;
        let Some(threshold) = params.cost_threshold else {
            return invalid("a cost threshold is required for consensus");
        };
        let target = params.target_count;
        let max_time = params.max_time();
        let base_seed = self.solver.params().seed;

        let start_time = Instant::now();
        let mut accepted: Vec<RunResult> = Vec::with_capacity(target);
        let mut attempts = 0usize;
        let mut rejected = 0usize;
        let mut consecutive_failures = 0usize;

        while accepted.len() < target {
            if cancel.is_cancelled() {
                return Err(QapError::Cancelled);
            }
            let out_of_attempts = params.max_attempts.is_some_and(|max| attempts >= max);
            let out_of_time = max_time.is_some_and(|limit| start_time.elapsed() >= limit);
            if out_of_attempts || out_of_time {
                warn!(
                    "Stopping after {} attempts: {}/{} solutions accepted",
                    attempts,
                    accepted.len(),
                    target
                );
                return Err(QapError::ExhaustedAttempts {
                    attempts,
                    accepted: accepted.len(),
                    target,
                });
            }

            attempts += 1;
            let seed = base_seed.map(|s| s.wrapping_add(attempts as u64 * 100));

            let result = match self.solver.run(seed, callback, cancel) {
                Ok(r) => {
                    consecutive_failures = 0;
                    r
                }
                Err(e @ QapError::EvaluationFailure { .. }) => {
                    consecutive_failures += 1;
                    warn!("Attempt #{} failed: {}", attempts, e);
                    if consecutive_failures > params.max_failures {
                        return Err(e);
                    }
                    continue;
                }
                Err(e) => return Err(e),
            };

            let is_accepted = result.cost < threshold;
            if is_accepted {
                info!(
                    "Attempt #{}: cost {:.3e} accepted ({}/{})",
                    attempts,
                    result.cost,
                    accepted.len() + 1,
                    target
                );
            } else {
                rejected += 1;
                warn!(
                    "Attempt #{}: cost {:.3e} rejected (threshold {:.3e})",
                    attempts, result.cost, threshold
                );
            }

            let keep_going =
                callback.on_run(attempts, &result, accepted.len() + usize::from(is_accepted));
            if is_accepted {
                accepted.push(result);
            }
            if !keep_going {
                return Err(QapError::Cancelled);
            }
        }

        let n = self.solver.objective().size();
        let tally = SlotTally::from_assignments(n, accepted.iter().map(|r| r.assignment.as_slice()));
        let assignment = tally.consensus();

        info!(
            "Consensus built from {} runs ({} attempts, {} rejected) in {:.2?}",
            accepted.len(),
            attempts,
            rejected,
            start_time.elapsed()
        );

        Ok(ConsensusOutcome {
            assignment,
            accepted,
            tally,
            attempts,
            rejected,
            elapsed: start_time.elapsed(),
        })
    }
}
