//! Optimal-transport distances between histograms on a shared 1-D bin grid.

use crate::distribution::histogram::Histogram;
use log::debug;
use ndarray::Array2;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Cost of moving unit mass between bins `i` and `j`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum GroundCost {
    /// `|i - j|`
    #[default]
    BinIndex,
    /// `(i - j)^2`
    SquaredBinIndex,
}

impl GroundCost {
    #[inline]
    fn cost(&self, i: usize, j: usize) -> f64 {
        let d = i.abs_diff(j) as f64;
        match self {
            GroundCost::BinIndex => d,
            GroundCost::SquaredBinIndex => d * d,
        }
    }
}

/// Minimal transport cost between two normalized histograms of equal length.
///
/// Both supported costs are convex in the index distance, so the monotone
/// coupling that fills target bins left to right from source bins left to
/// right is optimal and the solve is linear in the bin count.
pub fn transport_cost(source: &[f64], target: &[f64], cost: GroundCost) -> f64 {
    debug_assert_eq!(source.len(), target.len());
    const EPS: f64 = 1e-15;

    let mut total = 0.0;
    let mut i = 0;
    let mut j = 0;
    let mut supply = source.first().copied().unwrap_or(0.0);
    let mut demand = target.first().copied().unwrap_or(0.0);

    while i < source.len() && j < target.len() {
        if supply <= EPS {
            i += 1;
            supply = source.get(i).copied().unwrap_or(0.0);
            continue;
        }
        if demand <= EPS {
            j += 1;
            demand = target.get(j).copied().unwrap_or(0.0);
            continue;
        }
        let moved = supply.min(demand);
        total += moved * cost.cost(i, j);
        supply -= moved;
        demand -= moved;
    }

    total
}

/// Symmetric distance matrix indexed by ascending sample identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceMatrix {
    pub sample_identifiers: Vec<String>,
    pub values: Array2<f64>,
}

impl DistanceMatrix {
    pub fn len(&self) -> usize {
        self.sample_identifiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sample_identifiers.is_empty()
    }

    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.index_of(a)?;
        let j = self.index_of(b)?;
        Some(self.values[[i, j]])
    }

    pub fn index_of(&self, sample_identifier: &str) -> Option<usize> {
        self.sample_identifiers
            .binary_search_by(|s| s.as_str().cmp(sample_identifier))
            .ok()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DistanceMatrixComputer {
    cost: GroundCost,
}

impl DistanceMatrixComputer {
    pub fn new(cost: GroundCost) -> Self {
        DistanceMatrixComputer { cost }
    }

    /// Pairwise transport distances between sample histograms.
    ///
    /// Rows follow ascending sample identifier regardless of input order. Absent
    /// (all-zero) histograms carry no distribution and are left out of the matrix.
    pub fn pairwise_distance(
        &self,
        histograms: &[(String, Histogram)],
    ) -> anyhow::Result<DistanceMatrix> {
        let mut retained: Vec<&(String, Histogram)> = histograms
            .iter()
            .filter(|(sample, histogram)| {
                if histogram.is_absent() {
                    debug!("Excluding sample {} with no retained values", sample);
                    false
                } else {
                    true
                }
            })
            .collect();
        retained.sort_by(|a, b| a.0.cmp(&b.0));

        for pair in retained.windows(2) {
            if pair[0].0 == pair[1].0 {
                return Err(anyhow::anyhow!(
                    "Sample {} has more than one histogram",
                    pair[0].0
                ));
            }
        }

        if let Some((reference, first)) = retained.first() {
            let bins = first.len();
            if let Some((sample, other)) = retained.iter().find(|(_, h)| h.len() != bins) {
                return Err(anyhow::anyhow!(
                    "Histogram of sample {} has {} bins, expected {} as for sample {}",
                    sample,
                    other.len(),
                    bins,
                    reference
                ));
            }
        }

        let n = retained.len();
        let pairs: Vec<(usize, usize)> = (0..n)
            .flat_map(|i| ((i + 1)..n).map(move |j| (i, j)))
            .collect();

        let costs: Vec<f64> = pairs
            .par_iter()
            .map(|&(i, j)| {
                transport_cost(
                    &retained[i].1.frequencies,
                    &retained[j].1.frequencies,
                    self.cost,
                )
            })
            .collect();

        let mut values = Array2::<f64>::zeros((n, n));
        for (&(i, j), &c) in pairs.iter().zip(costs.iter()) {
            values[[i, j]] = c;
            values[[j, i]] = c;
        }

        Ok(DistanceMatrix {
            sample_identifiers: retained.iter().map(|(s, _)| s.clone()).collect(),
            values,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn histogram(frequencies: &[f64]) -> Histogram {
        Histogram {
            frequencies: frequencies.to_vec(),
        }
    }

    #[test]
    fn test_point_masses() {
        let a = [1.0, 0.0, 0.0, 0.0];
        let b = [0.0, 0.0, 0.0, 1.0];
        assert_abs_diff_eq!(transport_cost(&a, &b, GroundCost::BinIndex), 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(
            transport_cost(&a, &b, GroundCost::SquaredBinIndex),
            9.0,
            epsilon = 1e-12
        );
        assert_abs_diff_eq!(transport_cost(&a, &a, GroundCost::BinIndex), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_bin_index_cost_matches_cdf_difference() {
        let a = [0.1, 0.4, 0.2, 0.3, 0.0];
        let b = [0.3, 0.0, 0.1, 0.2, 0.4];
        let mut ca = 0.0;
        let mut cb = 0.0;
        let mut expected = 0.0;
        for k in 0..a.len() {
            ca += a[k];
            cb += b[k];
            expected += f64::abs(ca - cb);
        }
        assert_abs_diff_eq!(
            transport_cost(&a, &b, GroundCost::BinIndex),
            expected,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_split_mass() {
        // Half the mass moves one bin, the other half two bins.
        let a = [1.0, 0.0, 0.0];
        let b = [0.0, 0.5, 0.5];
        assert_abs_diff_eq!(transport_cost(&a, &b, GroundCost::BinIndex), 1.5, epsilon = 1e-12);
        assert_abs_diff_eq!(
            transport_cost(&a, &b, GroundCost::SquaredBinIndex),
            2.5,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_matrix_is_sorted_symmetric_with_zero_diagonal() {
        let computer = DistanceMatrixComputer::default();
        let input = vec![
            ("S3".to_string(), histogram(&[0.0, 0.0, 1.0])),
            ("S1".to_string(), histogram(&[1.0, 0.0, 0.0])),
            ("S2".to_string(), histogram(&[0.5, 0.5, 0.0])),
        ];
        let matrix = computer.pairwise_distance(&input).unwrap();

        assert_eq!(matrix.sample_identifiers, vec!["S1", "S2", "S3"]);
        for i in 0..3 {
            assert_eq!(matrix.values[[i, i]], 0.0);
            for j in 0..3 {
                assert_eq!(matrix.values[[i, j]], matrix.values[[j, i]]);
            }
        }
        assert_abs_diff_eq!(matrix.get("S1", "S3").unwrap(), 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(matrix.get("S1", "S2").unwrap(), 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(matrix.get("S3", "S2").unwrap(), 1.5, epsilon = 1e-12);
    }

    #[test]
    fn test_single_histogram_gives_unit_zero_matrix() {
        let computer = DistanceMatrixComputer::default();
        let matrix = computer
            .pairwise_distance(&[("only".to_string(), histogram(&[0.2, 0.8]))])
            .unwrap();
        assert_eq!(matrix.len(), 1);
        assert_eq!(matrix.values.shape(), &[1, 1]);
        assert_eq!(matrix.values[[0, 0]], 0.0);
    }

    #[test]
    fn test_absent_histograms_are_excluded() {
        let computer = DistanceMatrixComputer::default();
        let input = vec![
            ("A".to_string(), histogram(&[0.0, 0.0])),
            ("B".to_string(), histogram(&[1.0, 0.0])),
            ("C".to_string(), histogram(&[0.0, 1.0])),
        ];
        let matrix = computer.pairwise_distance(&input).unwrap();
        assert_eq!(matrix.sample_identifiers, vec!["B", "C"]);
        assert!(matrix.get("A", "B").is_none());

        let matrix = computer
            .pairwise_distance(&[("A".to_string(), histogram(&[0.0, 0.0]))])
            .unwrap();
        assert!(matrix.is_empty());
        assert_eq!(matrix.values.shape(), &[0, 0]);
    }

    #[test]
    fn test_mismatched_resolution_is_rejected() {
        let computer = DistanceMatrixComputer::default();
        let input = vec![
            ("A".to_string(), histogram(&[1.0, 0.0])),
            ("B".to_string(), histogram(&[0.0, 0.0, 1.0])),
        ];
        assert!(computer.pairwise_distance(&input).is_err());
    }

    #[test]
    fn test_duplicate_sample_is_rejected() {
        let computer = DistanceMatrixComputer::default();
        let input = vec![
            ("A".to_string(), histogram(&[1.0, 0.0])),
            ("A".to_string(), histogram(&[0.0, 1.0])),
        ];
        assert!(computer.pairwise_distance(&input).is_err());
    }
}
