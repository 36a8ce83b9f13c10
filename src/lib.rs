//! # spatial-outcome-stats
//!
//! Outcome-group significance testing for per-cell spatial measurements of tissue samples.
//!
//! Samples are partitioned by clinical outcome, and every pair of outcome groups is compared with
//! Welch's t-test and the Kruskal-Wallis test. Each comparison is annotated with effect magnitude,
//! direction and the most outlying sample of each group. Distributions of per-cell diffusion values
//! are also rasterized into histograms and compared through a 1-D optimal-transport distance.
//!
//! ## Core Features
//!
//! - **Phenotype Frequencies**: cell-area fractions per (sample, compartment, phenotype), with
//!   elementary and composite phenotypes held in a sparse membership matrix
//! - **Distribution Comparison**: fixed-resolution histograms and pairwise transport distance matrices
//! - **Significance Testing**: Welch t-test and Kruskal-Wallis with effect annotation, ranked for export
//! - **Delimited I/O**: typed table readers and CSV writers for results and per-sample summaries
//!
//! ## Quick Start
//!
//! Read a cells table with [`io::read_cells`] and run [`comparison::FrequencyComparison`], or join
//! transition probabilities to their jobs with [`comparison::diffusion::join_job_metadata`] and run
//! [`comparison::DiffusionComparison`]. An empty run yields [`comparison::Findings::NoFindings`].
//!
//! ## Module Organization
//!
//! - **[`aggregation`]**: Phenotype membership and normalized per-sample features
//! - **[`comparison`]**: Enumeration of outcome comparisons and ranking
//! - **[`distribution`]**: Histograms and optimal-transport distances
//! - **[`testing`]**: Statistical tests and effect annotation
//! - **[`io`]**: Input tables and result export
//! - **[`config`]**: YAML run configuration

pub mod aggregation;
pub mod comparison;
pub mod config;
pub mod distribution;
pub mod error;
pub mod io;
pub mod outcomes;
pub mod testing;

pub use comparison::Findings;
pub use config::EngineConfig;
pub use error::EngineError;
pub use outcomes::OutcomeAssignment;
