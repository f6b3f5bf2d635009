//! Error types for catalog loading and route planning.

use thiserror::Error;

/// Errors raised while building or loading a version catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("duplicate {kind} name: {name}")]
    Duplicate { kind: &'static str, name: String },
    #[error("unknown producer referenced: {0}")]
    UnknownProducer(String),
    #[error("invalid {field} for '{name}': {reason}")]
    InvalidValue {
        name: String,
        field: &'static str,
        reason: String,
    },
    #[error("cannot parse {what} '{input}'")]
    Parse { what: &'static str, input: String },
    #[error("unknown built-in version: {0}")]
    UnknownVersion(String),
}

/// Failures of a planning run.
///
/// All of them are fatal: the planner never retries and never returns a
/// partial route in the `Ok` branch.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlanError {
    /// A producer, modifier or milestone name is not part of the loaded catalog.
    #[error("unknown catalog entry: {0}")]
    UnknownCatalogEntry(String),
    /// The goal can never be met, either statically or because the search got stuck.
    #[error("goal unreachable: {0}")]
    UnreachableGoal(String),
    #[error("invalid starting state: {0}")]
    InvalidStartingState(String),
    #[error("configuration error: {0}")]
    ConfigurationError(String),
    /// The caller raised the cancel flag.
    #[error("planning cancelled after {steps_completed} steps")]
    Cancelled { steps_completed: usize },
}
