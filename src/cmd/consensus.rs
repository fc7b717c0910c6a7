use crate::reports;
use crate::Problem;
use clap::Args;
use qapforge::config::Config;
use qapforge::consensus::ConsensusBuilder;
use qapforge::error::QapResult;
use qapforge::optimizer::{CancelToken, GaSolver, ProgressCallback, RunResult};
use qapforge::scorer::CostModel;
use std::sync::Arc;
use tracing::info;

#[derive(Args, Debug, Clone)]
pub struct ConsensusArgs {
    #[command(flatten)]
    pub config: Config,
}

struct AttemptLogger;

impl ProgressCallback for AttemptLogger {
    fn on_run(&self, attempt: usize, result: &RunResult, accepted: usize) -> bool {
        info!(
            "➡️  Attempt #{} | Cost: {:.3e} | {:.2?} | Accepted so far: {}",
            attempt, result.cost, result.elapsed, accepted
        );
        true
    }
}

pub fn run(config: Config, problem: &Problem) -> QapResult<()> {
    // Reject a missing threshold before building the worker pool.
    config.consensus.validate()?;

    let model = Arc::new(CostModel::new(
        problem.distance.clone(),
        problem.flow.clone(),
    )?);
    let solver = GaSolver::new(model, config.ga)?;
    let builder = ConsensusBuilder::new(&solver, config.consensus)?;

    let outcome = builder.run(&AttemptLogger, &CancelToken::new())?;

    reports::print_accepted_runs(&outcome.accepted, problem);
    reports::print_tally(&outcome, problem);
    reports::print_assignment("CONSENSUS", &outcome.assignment, problem);
    Ok(())
}
