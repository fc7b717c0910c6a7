use super::crossover::pmx;
use super::evaluator::Evaluator;
use super::mutation::shuffle_indexes;
use super::population::{GenerationStats, HallOfFame, Individual, Population};
use super::selection::select_tournament;
use crate::config::GaParams;
use crate::error::{invalid, QapError, QapResult};
use crate::scorer::{CostModel, Objective};
use fastrand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Output of one GA run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    /// `assignment[symbol] = slot`.
    pub assignment: Vec<usize>,
    pub cost: f64,
    pub elapsed: Duration,
    pub seed: Option<u64>,
    /// Generation 0 (initial population) followed by one row per generation.
    pub logbook: Vec<GenerationStats>,
}

/// Receives progress updates. Returning `false` aborts with
/// [`QapError::Cancelled`].
pub trait ProgressCallback: Send + Sync {
    fn on_generation(&self, _stats: &GenerationStats, _best_cost: f64) -> bool {
        true
    }

    fn on_run(&self, _attempt: usize, _result: &RunResult, _accepted: usize) -> bool {
        true
    }
}

impl ProgressCallback for () {}

/// Shared flag a caller can flip from another thread to stop a run or the
/// whole consensus loop at the next generation boundary.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// One generation of variation: tournament selection, pairwise PMX, then
/// per-offspring index-shuffle mutation. Offspring whose genes were touched
/// come back without a cached cost.
pub fn vary(parents: &[Individual], params: &GaParams, rng: &mut Rng) -> Vec<Individual> {
    let mut offspring = select_tournament(parents, parents.len(), params.tournament_size, rng);

    for i in (1..offspring.len()).step_by(2) {
        if rng.f64() < params.crossover_rate {
            let (c1, c2) = pmx(offspring[i - 1].genes(), offspring[i].genes(), rng);
            offspring[i - 1] = Individual::new(c1);
            offspring[i] = Individual::new(c2);
        }
    }

    for ind in offspring.iter_mut() {
        if rng.f64() < params.mutation_rate {
            *ind = Individual::new(shuffle_indexes(ind.genes(), params.indpb, rng));
        }
    }

    offspring
}

/// Runs the generational GA against one objective. The worker pool lives as
/// long as the solver, so consecutive runs reuse it.
pub struct GaSolver<O: Objective = CostModel> {
    params: GaParams,
    evaluator: Evaluator<O>,
}

impl<O: Objective> GaSolver<O> {
    pub fn new(objective: Arc<O>, params: GaParams) -> QapResult<Self> {
        params.validate()?;
        if objective.size() < 2 {
            return invalid(format!(
                "objective must cover at least 2 symbols, got {}",
                objective.size()
            ));
        }
        let evaluator = Evaluator::new(objective, params.worker_count())?;
        Ok(Self { params, evaluator })
    }

    pub fn params(&self) -> &GaParams {
        &self.params
    }

    pub fn objective(&self) -> &Arc<O> {
        self.evaluator.objective()
    }

    /// Runs exactly `generations` generations; there is no early stopping.
    pub fn run<CB: ProgressCallback + ?Sized>(
        &self,
        seed: Option<u64>,
        callback: &CB,
        cancel: &CancelToken,
    ) -> QapResult<RunResult> {
        let params = &self.params;
        let start_time = Instant::now();
        let mut rng = match seed {
            Some(s) => Rng::with_seed(s),
            None => Rng::new(),
        };

        let n = self.evaluator.objective().size();
        let mut population = Population::initialize(n, params.population_size, &mut rng)?;
        let evaluations = self.evaluator.evaluate(&mut population)?;

        let mut hall_of_fame = HallOfFame::new();
        hall_of_fame.update(&population);

        let mut logbook = Vec::with_capacity(params.generations + 1);
        logbook.push(population.stats(0, evaluations));

        for generation in 1..=params.generations {
            if cancel.is_cancelled() {
                return Err(QapError::Cancelled);
            }

            let offspring = vary(population.individuals(), params, &mut rng);
            population = Population::from_individuals(offspring);
            let evaluations = self.evaluator.evaluate(&mut population)?;

            if hall_of_fame.update(&population) {
                debug!(
                    "Gen {:4} | new best {:.6e}",
                    generation,
                    hall_of_fame.best_cost().unwrap_or(f64::NAN)
                );
            }

            let stats = population.stats(generation, evaluations);
            debug!(
                "Gen {:4} | evals {:4} | min {:.6e} | avg {:.6e}",
                generation, stats.evaluations, stats.min, stats.mean
            );

            let best_cost = hall_of_fame.best_cost().unwrap_or(f64::INFINITY);
            if !callback.on_generation(&stats, best_cost) {
                return Err(QapError::Cancelled);
            }
            logbook.push(stats);
        }

        let best = hall_of_fame
            .into_best()
            .ok_or_else(|| QapError::EvaluationFailure {
                index: 0,
                reason: "no individual was evaluated".to_string(),
            })?;
        let cost = best.cost().unwrap_or(f64::INFINITY);
        let elapsed = start_time.elapsed();

        info!(
            "GA run finished: cost {:.6e} after {} generations in {:.2?}",
            cost, params.generations, elapsed
        );

        Ok(RunResult {
            assignment: best.into_genes(),
            cost,
            elapsed,
            seed,
            logbook,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::SquareMatrix;
    use crate::scorer::is_permutation;
    use std::sync::atomic::AtomicUsize;

    fn small_params() -> GaParams {
        GaParams {
            population_size: 40,
            generations: 25,
            num_threads: Some(2),
            ..Default::default()
        }
    }

    fn model(n: usize) -> Arc<CostModel> {
        let d = SquareMatrix::from_fn(n, |i, j| i.abs_diff(j) as f64);
        let f = SquareMatrix::from_fn(n, |i, j| if i.abs_diff(j) == 1 { 10.0 } else { 1.0 });
        Arc::new(CostModel::new(d, f).unwrap())
    }

    struct CountingCallback {
        calls: AtomicUsize,
        stop_after: usize,
    }

    impl ProgressCallback for CountingCallback {
        fn on_generation(&self, _stats: &GenerationStats, _best: f64) -> bool {
            self.calls.fetch_add(1, Ordering::SeqCst) + 1 < self.stop_after
        }
    }

    #[test]
    fn test_vary_keeps_size_and_permutations() {
        let params = small_params();
        let mut rng = Rng::with_seed(3);
        let mut pop = Population::initialize(9, 41, &mut rng).unwrap();
        for (i, ind) in pop.individuals_mut().iter_mut().enumerate() {
            ind.set_cost(i as f64);
        }

        let offspring = vary(pop.individuals(), &params, &mut rng);
        assert_eq!(offspring.len(), 41);
        for ind in &offspring {
            assert!(is_permutation(ind.genes(), 9));
        }
    }

    #[test]
    fn test_no_variation_keeps_cached_costs() {
        let params = GaParams {
            crossover_rate: 0.0,
            mutation_rate: 0.0,
            ..small_params()
        };
        let mut rng = Rng::with_seed(3);
        let mut pop = Population::initialize(6, 10, &mut rng).unwrap();
        for ind in pop.individuals_mut() {
            ind.set_cost(1.0);
        }
        let offspring = vary(pop.individuals(), &params, &mut rng);
        assert!(offspring.iter().all(|i| i.is_evaluated()));
    }

    #[test]
    fn test_run_returns_consistent_result() {
        let model = model(8);
        let solver = GaSolver::new(model.clone(), small_params()).unwrap();
        let result = solver.run(Some(42), &(), &CancelToken::new()).unwrap();

        assert!(is_permutation(&result.assignment, 8));
        assert_eq!(result.cost, model.cost(&result.assignment));
        assert_eq!(result.logbook.len(), 26);
        assert_eq!(result.logbook[0].evaluations, 40);
        // The reported best can never be worse than any generation's minimum.
        for row in &result.logbook {
            assert!(result.cost <= row.min);
        }
    }

    #[test]
    fn test_seeded_runs_are_reproducible() {
        let model = model(10);
        let a = GaSolver::new(model.clone(), small_params()).unwrap();
        let b = GaSolver::new(
            model,
            GaParams {
                num_threads: Some(1),
                ..small_params()
            },
        )
        .unwrap();

        let ra = a.run(Some(7), &(), &CancelToken::new()).unwrap();
        let rb = b.run(Some(7), &(), &CancelToken::new()).unwrap();
        assert_eq!(ra.assignment, rb.assignment);
        assert_eq!(ra.cost, rb.cost);
        assert_eq!(ra.logbook, rb.logbook);
    }

    #[test]
    fn test_callback_can_abort() {
        let solver = GaSolver::new(model(6), small_params()).unwrap();
        let cb = CountingCallback {
            calls: AtomicUsize::new(0),
            stop_after: 3,
        };
        let err = solver.run(Some(1), &cb, &CancelToken::new()).unwrap_err();
        assert!(matches!(err, QapError::Cancelled));
        assert_eq!(cb.calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_cancel_token_stops_run() {
        let solver = GaSolver::new(model(6), small_params()).unwrap();
        let token = CancelToken::new();
        token.cancel();
        assert!(matches!(
            solver.run(None, &(), &token),
            Err(QapError::Cancelled)
        ));
    }

    #[test]
    fn test_invalid_params_fail_fast() {
        let params = GaParams {
            population_size: 1,
            ..Default::default()
        };
        assert!(matches!(
            GaSolver::new(model(4), params),
            Err(QapError::InvalidConfiguration(_))
        ));
    }
}
