// Error types shared by ingestion, configuration and bracket selection.
// Only IngestError and ConfigError stop a run. Everything else is collected
// alongside the result and logged as a warning.

use serde::Serialize;
use thiserror::Error;

use crate::selector::Phase;

/// A source file could not be read at all.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("{input} is missing required column '{column}'")]
    MissingColumn { input: &'static str, column: String },
}

/// A single team row that failed validation. The row is dropped and the run
/// carries on without it.
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RecordError {
    /// `line` is the record's line in the source file.
    #[error("line {line}: could not read record: {message}")]
    Unreadable { line: u64, message: String },

    /// `row` counts merged team rows from 1.
    #[error("row {row}: missing team name")]
    MissingName { row: usize },

    #[error("{team}: missing {field}")]
    MissingField { team: String, field: &'static str },

    #[error("{team}: seed '{seed}' is not in 1..=16")]
    SeedOutOfRange { team: String, seed: String },

    #[error("{team}: unknown region '{region}'")]
    UnknownRegion { team: String, region: String },

    #[error("{team}: {column} = {value} is not a percentage in 0..=100")]
    ProbabilityOutOfRange {
        team: String,
        column: String,
        value: f64,
    },

    #[error("{team}: duplicate team name")]
    DuplicateTeam { team: String },
}

/// Seed outside the 16 slots of a region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("seed {0} has no slot in a 16-seed region")]
pub struct UnmappedSeed(pub u8);

/// Something a selection phase could not do. None of these abort the run.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SelectionIssue {
    #[error("{phase}: {team} skipped, seed {seed} has no bracket slot")]
    UnmappedSeed { phase: Phase, team: String, seed: u8 },

    #[error("{phase}: filled {filled} of {target}")]
    Underfilled {
        phase: Phase,
        target: usize,
        filled: usize,
    },

    #[error("Finals: no team eligible to face {champion}")]
    NoFinalist { champion: String },
}

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}
