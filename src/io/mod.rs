//! Delimited-file boundary: typed readers for the input tables and writers
//! for ranked results and per-sample summaries.

pub mod export;
pub mod tables;

pub use export::{
    export_diffusion_report, export_frequency_findings, frequency_tests_filename, write_results,
};
pub use tables::{
    TableName, read_cells, read_complex_phenotypes, read_job_metadata, read_outcomes,
    read_transition_probabilities,
};
