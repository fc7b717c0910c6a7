use qapforge::config::{Config, ConsensusParams, GaParams};
use qapforge::QapError;
use std::fs;
use tempfile::tempdir;

#[test]
fn test_partial_json_falls_back_to_defaults() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.json");
    fs::write(
        &path,
        r#"{
            "ga": { "population_size": 120, "seed": 9 },
            "consensus": { "cost_threshold": 2.15e13 }
        }"#,
    )
    .unwrap();

    let config = Config::load_from_file(&path).unwrap();

    assert_eq!(config.ga.population_size, 120);
    assert_eq!(config.ga.seed, Some(9));
    assert_eq!(config.ga.generations, 400);
    assert_eq!(config.ga.tournament_size, 6);
    assert_eq!(config.consensus.cost_threshold, Some(2.15e13));
    assert_eq!(config.consensus.target_count, 10);
    assert!(config.ga.validate().is_ok());
    assert!(config.consensus.validate().is_ok());
}

#[test]
fn test_empty_object_is_the_default_config() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("empty.json");
    fs::write(&path, "{}").unwrap();

    let config = Config::load_from_file(&path).unwrap();
    assert_eq!(config.ga, GaParams::default());
    assert_eq!(config.consensus, ConsensusParams::default());
    // Defaults alone are not enough to run a consensus.
    assert!(config.consensus.validate().is_err());
}

#[test]
fn test_malformed_json_is_reported() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("broken.json");
    fs::write(&path, r#"{ "ga": { "population_size": "many" } }"#).unwrap();

    assert!(matches!(
        Config::load_from_file(&path),
        Err(QapError::Json(_))
    ));
}

#[test]
fn test_missing_file_is_an_io_error() {
    let dir = tempdir().unwrap();
    assert!(matches!(
        Config::load_from_file(dir.path().join("nope.json")),
        Err(QapError::Io(_))
    ));
}

#[test]
fn test_config_survives_serialization() {
    let config = Config {
        ga: GaParams {
            generations: 50,
            num_threads: Some(3),
            ..Default::default()
        },
        consensus: ConsensusParams {
            cost_threshold: Some(1.0e6),
            max_attempts: Some(20),
            ..Default::default()
        },
    };
    let dir = tempdir().unwrap();
    let path = dir.path().join("roundtrip.json");
    fs::write(&path, serde_json::to_string_pretty(&config).unwrap()).unwrap();

    assert_eq!(Config::load_from_file(&path).unwrap(), config);
}

#[test]
fn test_ga_only_file_keeps_consensus_defaults() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("ga_only.json");
    fs::write(&path, r#"{ "ga": { "generations": 5 } }"#).unwrap();

    let config = Config::load_from_file(&path).unwrap();
    assert_eq!(config.ga.generations, 5);
    assert_eq!(config.ga.population_size, 400);
    assert_eq!(config.consensus, ConsensusParams::default());
}

#[test]
fn test_accept_all_threshold_survives_a_file() {
    let config = Config {
        consensus: ConsensusParams {
            cost_threshold: Some(f64::INFINITY),
            ..Default::default()
        },
        ..Default::default()
    };
    let dir = tempdir().unwrap();
    let path = dir.path().join("accept_all.json");
    fs::write(&path, serde_json::to_string(&config).unwrap()).unwrap();

    let loaded = Config::load_from_file(&path).unwrap();
    assert_eq!(loaded.consensus.cost_threshold, Some(f64::INFINITY));
    assert!(loaded.consensus.validate().is_ok());
}
