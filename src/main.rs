use clap::{CommandFactory, FromArgMatches, Parser, Subcommand};
use qapforge::config::Config;
use qapforge::error::{QapError, QapResult};
use qapforge::layouts::KnownLayout;
use qapforge::matrix::{DistanceMatrix, FlowMatrix};
use qapforge::scorer::flow::build_flow_matrix;
use qapforge::scorer::loader::BigramTable;
use std::process;
use tracing::{error, info, Level};

mod cmd;
mod reports;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Tab-separated `bigram<TAB>count` table.
    #[arg(global = true, short, long, default_value = "data/count_2l.txt")]
    bigrams: String,

    /// Symbols to place, in index order.
    #[arg(global = true, short = 'A', long, default_value = "abcdefghijklmnopqrstuvwxyz")]
    alphabet: String,

    #[arg(global = true, short, long, default_value = "tile_groups")]
    layout: KnownLayout,

    /// JSON config file; flags given on the command line take precedence.
    #[arg(global = true, long)]
    config: Option<String>,

    #[arg(global = true, long, default_value_t = false)]
    debug: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the genetic algorithm once.
    Solve(cmd::solve::SolveArgs),
    /// Repeat runs until enough beat the threshold, then vote a consensus.
    Consensus(cmd::consensus::ConsensusArgs),
}

/// Everything a command needs: the symbols and both problem matrices.
pub struct Problem {
    pub alphabet: Vec<char>,
    pub layout: KnownLayout,
    pub distance: DistanceMatrix,
    pub flow: FlowMatrix,
}

fn load_problem(cli: &Cli) -> QapResult<Problem> {
    let alphabet: Vec<char> = cli.alphabet.chars().collect();
    let n = alphabet.len();

    if let Some(expected) = cli.layout.slot_count() {
        if expected != n {
            return Err(QapError::InvalidConfiguration(format!(
                "layout '{}' has {} slots but the alphabet has {} symbols",
                cli.layout, expected, n
            )));
        }
    }

    info!("📂 Loading bigrams: {}", cli.bigrams);
    let table = BigramTable::load_from_file(&cli.bigrams)?;
    let flow = build_flow_matrix(&alphabet, &table)?;
    let distance = cli.layout.distance_matrix(n);

    Ok(Problem {
        alphabet,
        layout: cli.layout,
        distance,
        flow,
    })
}

fn load_config_file(file: &Option<String>) -> QapResult<Option<Config>> {
    match file {
        Some(path) => {
            info!("⚖️  Loading config from: {}", path);
            Ok(Some(Config::load_from_file(path)?))
        }
        None => Ok(None),
    }
}

fn run(cli: Cli, matches: &clap::ArgMatches) -> QapResult<()> {
    let problem = load_problem(&cli)?;
    let file_config = load_config_file(&cli.config)?;

    match &cli.command {
        Commands::Solve(args) => {
            let sub = subcommand(matches, "solve")?;
            let ga = match file_config {
                Some(mut config) => {
                    config.ga.merge_from_cli(&args.ga, sub);
                    config.ga
                }
                None => args.ga.clone(),
            };
            cmd::solve::run(ga, &problem)
        }
        Commands::Consensus(args) => {
            let sub = subcommand(matches, "consensus")?;
            let config = match file_config {
                Some(mut config) => {
                    config.merge_from_cli(&args.config, sub);
                    config
                }
                None => args.config.clone(),
            };
            cmd::consensus::run(config, &problem)
        }
    }
}

fn subcommand<'a>(matches: &'a clap::ArgMatches, name: &str) -> QapResult<&'a clap::ArgMatches> {
    matches
        .subcommand_matches(name)
        .ok_or_else(|| QapError::InvalidConfiguration(format!("missing '{}' arguments", name)))
}

fn main() {
    let matches = Cli::command().get_matches();
    let cli = Cli::from_arg_matches(&matches).unwrap_or_else(|e| e.exit());

    let level = if cli.debug { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt().with_max_level(level).init();

    info!("🚀 Initializing QapForge...");

    if let Err(e) = run(cli, &matches) {
        error!("❌ {}", e);
        process::exit(1);
    }
}
