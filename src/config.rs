use crate::error::{invalid, QapResult};
use clap::{parser::ValueSource, ArgMatches, Args};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

#[derive(Args, Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    #[command(flatten)]
    pub ga: GaParams,
    #[command(flatten)]
    pub consensus: ConsensusParams,
}

/// Parameters of a single genetic-algorithm run.
#[derive(Args, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GaParams {
    #[arg(long, default_value_t = 400)]
    pub population_size: usize,
    #[arg(long, default_value_t = 400)]
    pub generations: usize,
    /// Probability that a mating pair is recombined with PMX.
    #[arg(long, default_value_t = 0.9)]
    pub crossover_rate: f64,
    /// Probability that an offspring goes through index-shuffle mutation.
    #[arg(long, default_value_t = 0.4)]
    pub mutation_rate: f64,
    /// Per-position swap probability inside a mutation.
    #[arg(long, default_value_t = 0.05)]
    pub indpb: f64,
    #[arg(long, default_value_t = 6)]
    pub tournament_size: usize,

    #[arg(short = 'S', long)]
    pub seed: Option<u64>,
    /// Evaluation workers; defaults to the available hardware parallelism.
    #[arg(long)]
    pub num_threads: Option<usize>,
}

impl Default for GaParams {
    fn default() -> Self {
        Self {
            population_size: 400,
            generations: 400,
            crossover_rate: 0.9,
            mutation_rate: 0.4,
            indpb: 0.05,
            tournament_size: 6,
            seed: None,
            num_threads: None,
        }
    }
}

fn check_probability(name: &str, p: f64) -> QapResult<()> {
    if !(0.0..=1.0).contains(&p) {
        return invalid(format!("{} must lie in [0, 1], got {}", name, p));
    }
    Ok(())
}

impl GaParams {
    pub fn validate(&self) -> QapResult<()> {
        if self.population_size < 2 {
            return invalid(format!(
                "population size must be at least 2, got {}",
                self.population_size
            ));
        }
        if self.generations < 1 {
            return invalid("at least one generation is required");
        }
        if self.tournament_size < 1 {
            return invalid("tournament size must be at least 1");
        }
        if self.num_threads == Some(0) {
            return invalid("num_threads must be at least 1");
        }
        check_probability("crossover_rate", self.crossover_rate)?;
        check_probability("mutation_rate", self.mutation_rate)?;
        check_probability("indpb", self.indpb)?;
        Ok(())
    }

    pub fn worker_count(&self) -> usize {
        self.num_threads.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4)
        })
    }

    pub fn merge_from_cli(&mut self, cli: &GaParams, matches: &ArgMatches) {
        macro_rules! update_if_present {
            ($field:ident) => {
                if matches.value_source(stringify!($field)) == Some(ValueSource::CommandLine) {
                    self.$field = cli.$field.clone();
                }
            };
        }

        update_if_present!(population_size);
        update_if_present!(generations);
        update_if_present!(crossover_rate);
        update_if_present!(mutation_rate);
        update_if_present!(indpb);
        update_if_present!(tournament_size);
        update_if_present!(seed);
        update_if_present!(num_threads);
    }
}

/// Parameters of the multi-run consensus loop.
#[derive(Args, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ConsensusParams {
    /// Number of accepted runs to aggregate.
    #[arg(long, default_value_t = 10)]
    pub target_count: usize,
    /// Runs must finish strictly below this cost to be accepted. JSON files
    /// may spell an infinite threshold as `"inf"`.
    #[arg(long)]
    #[serde(default, with = "threshold_serde")]
    pub cost_threshold: Option<f64>,
    #[arg(long)]
    pub max_attempts: Option<usize>,
    #[arg(long)]
    pub max_time_secs: Option<u64>,
    /// Consecutive failed runs tolerated before the error is surfaced.
    #[arg(long, default_value_t = 3)]
    pub max_failures: usize,
}

impl Default for ConsensusParams {
    fn default() -> Self {
        Self {
            target_count: 10,
            cost_threshold: None,
            max_attempts: None,
            max_time_secs: None,
            max_failures: 3,
        }
    }
}

impl ConsensusParams {
    pub fn validate(&self) -> QapResult<()> {
        if self.target_count < 1 {
            return invalid("target count must be at least 1");
        }
        match self.cost_threshold {
            None => return invalid("a cost threshold is required for consensus"),
            Some(t) if t.is_nan() => return invalid("cost threshold must be a number"),
            _ => {}
        }
        if self.max_attempts == Some(0) {
            return invalid("max_attempts must be at least 1 when set");
        }
        Ok(())
    }

    pub fn max_time(&self) -> Option<Duration> {
        self.max_time_secs.map(Duration::from_secs)
    }

    pub fn merge_from_cli(&mut self, cli: &ConsensusParams, matches: &ArgMatches) {
        macro_rules! update_if_present {
            ($field:ident) => {
                if matches.value_source(stringify!($field)) == Some(ValueSource::CommandLine) {
                    self.$field = cli.$field.clone();
                }
            };
        }

        update_if_present!(target_count);
        update_if_present!(cost_threshold);
        update_if_present!(max_attempts);
        update_if_present!(max_time_secs);
        update_if_present!(max_failures);
    }
}

/// JSON has no literal for infinity and serde_json writes it as `null`, so
/// infinite thresholds travel as the strings `"inf"` / `"-inf"`.
mod threshold_serde {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Serialize, Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Number(f64),
        Text(String),
    }

    pub fn serialize<S: Serializer>(value: &Option<f64>, s: S) -> Result<S::Ok, S::Error> {
        let repr = value.map(|t| match t {
            t if t == f64::INFINITY => Repr::Text("inf".to_string()),
            t if t == f64::NEG_INFINITY => Repr::Text("-inf".to_string()),
            t => Repr::Number(t),
        });
        repr.serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
        match Option::<Repr>::deserialize(d)? {
            None => Ok(None),
            Some(Repr::Number(t)) => Ok(Some(t)),
            Some(Repr::Text(text)) => match text.trim().to_ascii_lowercase().as_str() {
                "inf" | "+inf" | "infinity" => Ok(Some(f64::INFINITY)),
                "-inf" | "-infinity" => Ok(Some(f64::NEG_INFINITY)),
                other => other
                    .parse::<f64>()
                    .map(Some)
                    .map_err(|_| D::Error::custom(format!("invalid cost threshold '{}'", text))),
            },
        }
    }
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> QapResult<Self> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Overlays every flag the user typed on top of a file-loaded config.
    pub fn merge_from_cli(&mut self, cli: &Config, matches: &ArgMatches) {
        self.ga.merge_from_cli(&cli.ga, matches);
        self.consensus.merge_from_cli(&cli.consensus, matches);
    }
}
