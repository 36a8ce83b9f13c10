//! Histogram rasterization of per-sample observations and optimal-transport
//! comparison of the resulting distributions.

pub mod histogram;
pub mod transport;

pub use histogram::{Histogram, HistogramBinner, HistogramConfig};
pub use transport::{DistanceMatrix, DistanceMatrixComputer, GroundCost};
