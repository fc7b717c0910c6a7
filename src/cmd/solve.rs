use crate::reports;
use crate::Problem;
use clap::Args;
use qapforge::config::GaParams;
use qapforge::error::QapResult;
use qapforge::optimizer::{CancelToken, GaSolver, GenerationStats, ProgressCallback};
use qapforge::scorer::CostModel;
use std::sync::Arc;
use tracing::info;

#[derive(Args, Debug, Clone)]
pub struct SolveArgs {
    #[command(flatten)]
    pub ga: GaParams,
}

struct CliLogger {
    every: usize,
}

impl ProgressCallback for CliLogger {
    fn on_generation(&self, stats: &GenerationStats, best_cost: f64) -> bool {
        if stats.generation % self.every == 0 {
            info!(
                "Gen {:5} | Avg: {:.3e} | Min: {:.3e} | Best: {:.3e}",
                stats.generation, stats.mean, stats.min, best_cost
            );
        }
        true
    }
}

pub fn run(params: GaParams, problem: &Problem) -> QapResult<()> {
    let model = Arc::new(CostModel::new(
        problem.distance.clone(),
        problem.flow.clone(),
    )?);
    let solver = GaSolver::new(model, params)?;

    info!(
        "🧬 Population {} x {} generations on {} workers",
        solver.params().population_size,
        solver.params().generations,
        solver.params().worker_count()
    );

    let logger = CliLogger {
        every: (solver.params().generations / 10).max(1),
    };
    let result = solver.run(solver.params().seed, &logger, &CancelToken::new())?;

    info!("=== 🏆 FINAL RESULT ===");
    reports::print_run_summary(&result);
    reports::print_assignment("BEST", &result.assignment, problem);
    Ok(())
}
