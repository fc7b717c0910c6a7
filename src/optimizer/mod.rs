pub mod crossover;
pub mod evaluator;
pub mod mutation;
pub mod population;
pub mod runner;
pub mod selection;

pub use self::evaluator::Evaluator;
pub use self::population::{GenerationStats, HallOfFame, Individual, Population};
pub use self::runner::{CancelToken, GaSolver, ProgressCallback, RunResult};
