//! Typed failure categories surfaced through `anyhow::Error`.
//!
//! Degenerate statistical inputs are not errors (the tester returns `None`) and
//! an empty result set is reported through [`crate::comparison::Findings`]. The
//! variants here cover caller or collaborator contract violations, raised before
//! any computation starts.

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum EngineError {
    /// A table name that is not part of the storage schema.
    UnknownTable(String),
    /// A required column is absent from a table header.
    MissingColumn { table: String, column: String },
    /// Fewer than two outcome labels are available to form a pair.
    MissingOutcomeDimension { available: Vec<String> },
    /// Rows of one (sample, compartment) group disagree on the outcome label.
    InconsistentOutcome {
        sample_identifier: String,
        compartment: String,
        first: String,
        conflicting: String,
    },
    /// A phenotype signature refers to a marker that the cells table does not carry.
    UnknownMarker { phenotype: String, marker: String },
    InvalidConfiguration(String),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::UnknownTable(name) => write!(f, "Table {} is not in the schema", name),
            EngineError::MissingColumn { table, column } => {
                write!(f, "Table {} is missing required column '{}'", table, column)
            }
            EngineError::MissingOutcomeDimension { available } => write!(
                f,
                "At least two known outcome labels are required, found {:?}",
                available
            ),
            EngineError::InconsistentOutcome {
                sample_identifier,
                compartment,
                first,
                conflicting,
            } => write!(
                f,
                "Sample {} in compartment {} has conflicting outcome labels '{}' and '{}'",
                sample_identifier, compartment, first, conflicting
            ),
            EngineError::UnknownMarker { phenotype, marker } => write!(
                f,
                "Phenotype {} refers to unknown marker '{}'",
                phenotype, marker
            ),
            EngineError::InvalidConfiguration(message) => {
                write!(f, "Invalid configuration: {}", message)
            }
        }
    }
}

impl std::error::Error for EngineError {}
