//! Fixed-resolution probability histograms over a closed value range.

use crate::error::EngineError;
use single_utilities::traits::FloatOps;

/// Binning range and resolution shared by every histogram of one comparison.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistogramConfig {
    pub min_value: f64,
    pub max_value: f64,
    pub steps: usize,
}

impl Default for HistogramConfig {
    fn default() -> Self {
        HistogramConfig {
            min_value: -0.001,
            max_value: 0.05,
            steps: 50,
        }
    }
}

impl HistogramConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.steps == 0 {
            return Err(EngineError::InvalidConfiguration(
                "histogram resolution must be at least 1".to_string(),
            )
            .into());
        }
        if !self.min_value.is_finite()
            || !self.max_value.is_finite()
            || self.max_value <= self.min_value
        {
            return Err(EngineError::InvalidConfiguration(format!(
                "histogram range [{}, {}) is empty",
                self.min_value, self.max_value
            ))
            .into());
        }
        Ok(())
    }

    pub fn bin_width(&self) -> f64 {
        (self.max_value - self.min_value) / self.steps as f64
    }

    /// Lower and upper edge of bin `index`.
    pub fn bin_edges(&self, index: usize) -> (f64, f64) {
        let width = self.bin_width();
        (
            self.min_value + index as f64 * width,
            self.min_value + (index + 1) as f64 * width,
        )
    }
}

/// Discrete probability function over the ordered bin set.
///
/// Sums to one, or is all zero when no value fell inside the range.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    pub frequencies: Vec<f64>,
}

impl Histogram {
    pub fn len(&self) -> usize {
        self.frequencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frequencies.is_empty()
    }

    pub fn total(&self) -> f64 {
        self.frequencies.iter().sum()
    }

    /// True when no observation was retained; such a distribution is excluded downstream.
    pub fn is_absent(&self) -> bool {
        self.frequencies.iter().all(|&f| f == 0.0)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct HistogramBinner {
    config: HistogramConfig,
}

impl HistogramBinner {
    pub fn new(config: HistogramConfig) -> anyhow::Result<Self> {
        config.validate()?;
        Ok(HistogramBinner { config })
    }

    pub fn config(&self) -> &HistogramConfig {
        &self.config
    }

    /// Rasterize a sample into the configured bins.
    ///
    /// A value lands in bin `floor((v - min) / width)`. Values whose index falls
    /// outside `[0, steps)` are dropped rather than clamped to an edge bin, so mass
    /// below `min_value` or at/above `max_value` is discarded. Counts are divided by
    /// the number of retained values.
    pub fn bin<T>(&self, values: &[T]) -> Histogram
    where
        T: FloatOps,
    {
        let steps = self.config.steps;
        let width = self.config.bin_width();
        let mut counts = vec![0usize; steps];

        for value in values {
            if !num_traits::Float::is_finite(*value) {
                continue;
            }
            let Some(v) = value.to_f64() else {
                continue;
            };
            let index = ((v - self.config.min_value) / width).floor();
            if index.is_finite() && index >= 0.0 && index < steps as f64 {
                counts[index as usize] += 1;
            }
        }

        let retained: usize = counts.iter().sum();
        if retained == 0 {
            return Histogram {
                frequencies: vec![0.0; steps],
            };
        }

        let total = retained as f64;
        Histogram {
            frequencies: counts.into_iter().map(|c| c as f64 / total).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn default_binner() -> HistogramBinner {
        HistogramBinner::new(HistogramConfig::default()).unwrap()
    }

    #[test]
    fn test_probability_values_land_in_expected_bins() {
        let binner = default_binner();
        let histogram = binner.bin(&[0.01, 0.01, 0.01, 0.02]);

        assert_eq!(histogram.len(), 50);
        assert_abs_diff_eq!(histogram.total(), 1.0, epsilon = 1e-9);

        // width = 0.051 / 50 = 0.00102
        assert_abs_diff_eq!(histogram.frequencies[10], 0.75, epsilon = 1e-12);
        assert_abs_diff_eq!(histogram.frequencies[20], 0.25, epsilon = 1e-12);
        let elsewhere: f64 = histogram
            .frequencies
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != 10 && *i != 20)
            .map(|(_, f)| f)
            .sum();
        assert_eq!(elsewhere, 0.0);
    }

    #[test]
    fn test_out_of_range_values_are_dropped() {
        let binner = HistogramBinner::new(HistogramConfig {
            min_value: 0.0,
            max_value: 1.0,
            steps: 4,
        })
        .unwrap();

        // -0.5 is below the range, 1.0 sits on the open upper edge, 7.0 is above it.
        let histogram = binner.bin(&[-0.5, 0.1, 0.3, 1.0, 7.0]);
        assert_eq!(histogram.frequencies, vec![0.5, 0.5, 0.0, 0.0]);
    }

    #[test]
    fn test_empty_and_fully_dropped_inputs_are_absent() {
        let binner = default_binner();

        let empty: Vec<f64> = Vec::new();
        let histogram = binner.bin(&empty);
        assert!(histogram.is_absent());
        assert_eq!(histogram.total(), 0.0);
        assert_eq!(histogram.len(), 50);

        let histogram = binner.bin(&[1.0, 2.0, -3.0]);
        assert!(histogram.is_absent());
        assert_eq!(histogram.total(), 0.0);
    }

    #[test]
    fn test_non_finite_values_are_ignored() {
        let binner = default_binner();
        let histogram = binner.bin(&[f64::NAN, f64::INFINITY, 0.02]);
        assert_abs_diff_eq!(histogram.total(), 1.0, epsilon = 1e-12);
        assert_eq!(histogram.frequencies[20], 1.0);
    }

    #[test]
    fn test_order_invariance() {
        let binner = default_binner();
        let values = vec![0.003, 0.047, 0.012, -0.0005, 0.012, 0.031, 0.049, 0.0];
        let mut reversed = values.clone();
        reversed.reverse();
        let mut rotated = values.clone();
        rotated.rotate_left(3);

        let reference = binner.bin(&values);
        assert_eq!(reference, binner.bin(&reversed));
        assert_eq!(reference, binner.bin(&rotated));
    }

    #[test]
    fn test_single_precision_input() {
        let binner = default_binner();
        let values: Vec<f32> = vec![0.01, 0.02];
        let histogram = binner.bin(&values);
        assert_abs_diff_eq!(histogram.total(), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_invalid_configuration() {
        assert!(
            HistogramBinner::new(HistogramConfig {
                min_value: 0.0,
                max_value: 1.0,
                steps: 0,
            })
            .is_err()
        );
        assert!(
            HistogramBinner::new(HistogramConfig {
                min_value: 1.0,
                max_value: 1.0,
                steps: 10,
            })
            .is_err()
        );
    }

    #[test]
    fn test_bin_edges() {
        let config = HistogramConfig {
            min_value: 0.0,
            max_value: 1.0,
            steps: 4,
        };
        let (lo, hi) = config.bin_edges(2);
        assert_abs_diff_eq!(lo, 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(hi, 0.75, epsilon = 1e-12);
    }
}
