//! Loading configuration files from disk.

use std::io::Write;
use std::path::Path;

use marga::{ChunkCheck, CostModel, MargaConfig, MargaError};

#[test]
fn test_load_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
[planner]
max_cost = 120
max_iterations = 800
allow_diagonal = true
cost_model = "euclidean"
agent = {{ width = 0.6, height = 1.8 }}

[executor]
chunk_length = 5
dwell_steps = 2
chunk_check = {{ kind = "swept", sample_step = 0.5 }}

[refresh]
max_candidate_distance = 40.0
refresh_interval_steps = 3
background_thread = false
"#
    )
    .unwrap();

    let config = MargaConfig::load(file.path()).unwrap();

    assert_eq!(config.planner.max_cost, 120);
    assert_eq!(config.planner.max_iterations, 800);
    assert!(config.planner.allow_diagonal);
    assert_eq!(config.planner.cost_model, CostModel::Euclidean);
    assert_eq!(config.planner.vertical_reach, 9);
    approx::assert_relative_eq!(config.planner.agent.width, 0.6);
    assert_eq!(config.executor.chunk_length, 5);
    assert_eq!(config.executor.dwell_steps, 2);
    assert_eq!(
        config.executor.chunk_check,
        ChunkCheck::Swept { sample_step: 0.5 }
    );
    assert_eq!(config.refresh.refresh_interval_steps, 3);
    assert!(!config.refresh.background_thread);
}

#[test]
fn test_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = MargaConfig::load(&dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, MargaError::Config(_)));
}

#[test]
fn test_invalid_range_in_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[executor]\nchunk_length = 12").unwrap();

    let err = MargaConfig::load(file.path()).unwrap_err();
    assert!(err.to_string().contains("chunk_length"));
}

#[test]
fn test_shipped_simulator_config_is_valid() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../marga-sim/configs/sim.toml");
    // Unknown simulator sections are ignored by the library config
    MargaConfig::load(&path).unwrap();
}
