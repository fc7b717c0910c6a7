use crate::error::{invalid, QapResult};
use fastrand::Rng;
use serde::{Deserialize, Serialize};

/// One candidate solution: `genes[symbol] = slot`.
///
/// The genes are never edited after construction. Operators build a fresh
/// `Individual`, which starts without a cached cost.
#[derive(Debug, Clone, PartialEq)]
pub struct Individual {
    genes: Vec<usize>,
    cost: Option<f64>,
}

impl Individual {
    pub fn new(genes: Vec<usize>) -> Self {
        Self { genes, cost: None }
    }

    pub fn random(n: usize, rng: &mut Rng) -> Self {
        let mut genes: Vec<usize> = (0..n).collect();
        rng.shuffle(&mut genes);
        Self::new(genes)
    }

    pub fn genes(&self) -> &[usize] {
        &self.genes
    }

    pub fn into_genes(self) -> Vec<usize> {
        self.genes
    }

    pub fn cost(&self) -> Option<f64> {
        self.cost
    }

    pub fn is_evaluated(&self) -> bool {
        self.cost.is_some()
    }

    pub(crate) fn set_cost(&mut self, cost: f64) {
        self.cost = Some(cost);
    }
}

#[derive(Debug, Clone)]
pub struct Population {
    individuals: Vec<Individual>,
}

impl Population {
    /// `size` independent uniform permutations of `0..n`. Duplicates are
    /// allowed.
    pub fn initialize(n: usize, size: usize, rng: &mut Rng) -> QapResult<Self> {
        if n < 2 {
            return invalid(format!("assignments need at least 2 symbols, got {}", n));
        }
        if size < 1 {
            return invalid("population must hold at least one individual");
        }
        let individuals = (0..size).map(|_| Individual::random(n, rng)).collect();
        Ok(Self { individuals })
    }

    pub fn from_individuals(individuals: Vec<Individual>) -> Self {
        Self { individuals }
    }

    pub fn len(&self) -> usize {
        self.individuals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.individuals.is_empty()
    }

    pub fn individuals(&self) -> &[Individual] {
        &self.individuals
    }

    pub(crate) fn individuals_mut(&mut self) -> &mut [Individual] {
        &mut self.individuals
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Individual> {
        self.individuals.iter()
    }

    pub fn unevaluated(&self) -> usize {
        self.individuals.iter().filter(|i| !i.is_evaluated()).count()
    }

    /// Lowest-cost evaluated individual; the first one wins a tie.
    pub fn best(&self) -> Option<&Individual> {
        let mut best: Option<&Individual> = None;
        for ind in &self.individuals {
            if let Some(c) = ind.cost {
                match best.and_then(|b| b.cost) {
                    Some(bc) if bc <= c => {}
                    _ => best = Some(ind),
                }
            }
        }
        best
    }

    pub fn stats(&self, generation: usize, evaluations: usize) -> GenerationStats {
        let costs: Vec<f64> = self.individuals.iter().filter_map(|i| i.cost).collect();
        GenerationStats::from_costs(generation, evaluations, &costs)
    }
}

/// Logbook row: cost summary of one generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationStats {
    pub generation: usize,
    /// Individuals that had to be (re)evaluated in this generation.
    pub evaluations: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std: f64,
}

impl GenerationStats {
    pub fn from_costs(generation: usize, evaluations: usize, costs: &[f64]) -> Self {
        if costs.is_empty() {
            return Self {
                generation,
                evaluations,
                min: f64::NAN,
                max: f64::NAN,
                mean: f64::NAN,
                std: f64::NAN,
            };
        }
        let len = costs.len() as f64;
        let mean = costs.iter().sum::<f64>() / len;
        let var = costs.iter().map(|c| (c - mean).powi(2)).sum::<f64>() / len;
        Self {
            generation,
            evaluations,
            min: costs.iter().cloned().fold(f64::INFINITY, f64::min),
            max: costs.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
            mean,
            std: var.sqrt(),
        }
    }
}

/// Best individual seen during a run (a hall of fame of size one).
#[derive(Debug, Clone, Default)]
pub struct HallOfFame {
    best: Option<Individual>,
}

impl HallOfFame {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the champion only on a strict improvement, so the recorded
    /// cost never increases. Returns `true` when it changed.
    pub fn update(&mut self, population: &Population) -> bool {
        let Some(candidate) = population.best() else {
            return false;
        };
        let improved = match (&self.best, candidate.cost) {
            (None, Some(_)) => true,
            (Some(current), Some(c)) => current.cost.is_some_and(|bc| c < bc),
            (_, None) => false,
        };
        if improved {
            self.best = Some(candidate.clone());
        }
        improved
    }

    pub fn best(&self) -> Option<&Individual> {
        self.best.as_ref()
    }

    pub fn best_cost(&self) -> Option<f64> {
        self.best.as_ref().and_then(|b| b.cost)
    }

    pub fn into_best(self) -> Option<Individual> {
        self.best
    }
}
