use super::population::Individual;
use fastrand::Rng;

/// Index of the winner of one tournament of size `k`.
///
/// Contestants are drawn uniformly with replacement. A tournament at least as
/// large as the population is resolved over the whole population, so it
/// always returns the first lowest-cost individual.
pub fn tournament_pick(pool: &[Individual], k: usize, rng: &mut Rng) -> usize {
    let len = pool.len();
    if k >= len {
        return first_best(pool, 0..len);
    }

    let mut winner = rng.usize(0..len);
    for _ in 1..k {
        let challenger = rng.usize(0..len);
        if cost_of(&pool[challenger]) < cost_of(&pool[winner]) {
            winner = challenger;
        }
    }
    winner
}

/// Fills a mating pool of `count` clones chosen by repeated tournaments.
pub fn select_tournament(
    pool: &[Individual],
    count: usize,
    k: usize,
    rng: &mut Rng,
) -> Vec<Individual> {
    if pool.is_empty() {
        return Vec::new();
    }
    (0..count)
        .map(|_| pool[tournament_pick(pool, k, rng)].clone())
        .collect()
}

fn first_best(pool: &[Individual], range: std::ops::Range<usize>) -> usize {
    let mut best = range.start;
    for i in range {
        if cost_of(&pool[i]) < cost_of(&pool[best]) {
            best = i;
        }
    }
    best
}

// Unevaluated individuals never win against evaluated ones.
#[inline(always)]
fn cost_of(ind: &Individual) -> f64 {
    ind.cost().unwrap_or(f64::INFINITY)
}
