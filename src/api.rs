use crate::config::{ConsensusParams, GaParams};
use crate::consensus::{ConsensusBuilder, ConsensusOutcome};
use crate::error::QapResult;
use crate::matrix::{DistanceMatrix, FlowMatrix};
use crate::optimizer::{CancelToken, GaSolver, ProgressCallback, RunResult};
use crate::scorer::CostModel;
use std::sync::Arc;

/// Validates the inputs and runs the GA once.
pub fn solve_once(
    distance: DistanceMatrix,
    flow: FlowMatrix,
    params: GaParams,
) -> QapResult<RunResult> {
    let model = Arc::new(CostModel::new(distance, flow)?);
    let solver = GaSolver::new(model, params)?;
    solver.run(solver.params().seed, &(), &CancelToken::new())
}

/// Collects accepted runs and merges them into a consensus assignment.
pub fn build_consensus(
    distance: DistanceMatrix,
    flow: FlowMatrix,
    consensus: ConsensusParams,
    ga: GaParams,
) -> QapResult<ConsensusOutcome> {
    build_consensus_with(distance, flow, consensus, ga, &(), &CancelToken::new())
}

/// [`build_consensus`] with progress reporting and cancellation.
pub fn build_consensus_with<CB: ProgressCallback + ?Sized>(
    distance: DistanceMatrix,
    flow: FlowMatrix,
    consensus: ConsensusParams,
    ga: GaParams,
    callback: &CB,
    cancel: &CancelToken,
) -> QapResult<ConsensusOutcome> {
    // Fail on every configuration problem before spinning up workers.
    consensus.validate()?;
    let model = Arc::new(CostModel::new(distance, flow)?);
    let solver = GaSolver::new(model, ga)?;
    ConsensusBuilder::new(&solver, consensus)?.run(callback, cancel)
}
