use crate::aggregation::Normalization;
use crate::comparison::diffusion::JobFilter;
use crate::distribution::histogram::HistogramConfig;
use crate::distribution::transport::GroundCost;
use crate::error::EngineError;
use anyhow::Context;
use log::debug;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::{Path, PathBuf};

/// Run-level settings, usually read from a YAML file.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EngineConfig {
    #[serde(default)]
    pub general: General,
    #[serde(default)]
    pub data: Data,
    #[serde(default)]
    pub diffusion: Diffusion,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct General {
    #[serde(default = "output_path_default")]
    pub output_path: PathBuf,
    /// Normalize phenotype areas against the whole-sample total instead of the compartment.
    #[serde(default = "false_default")]
    pub balanced: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Data {
    #[serde(default = "empty_path")]
    pub cells_file: PathBuf,
    #[serde(default = "empty_path")]
    pub outcomes_file: PathBuf,
    #[serde(default = "empty_path")]
    pub probabilities_file: PathBuf,
    #[serde(default = "empty_path")]
    pub job_metadata_file: PathBuf,
    #[serde(default = "empty_path")]
    pub complex_phenotypes_file: PathBuf,
    /// Elementary markers and the cells-table columns holding their indicators.
    #[serde(default)]
    pub phenotype_columns: Vec<PhenotypeColumn>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhenotypeColumn {
    pub name: String,
    pub column: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diffusion {
    #[serde(default = "min_probability_value_default")]
    pub min_probability_value: f64,
    #[serde(default = "max_probability_value_default")]
    pub max_probability_value: f64,
    #[serde(default = "histogram_resolution_default")]
    pub histogram_resolution: usize,
    #[serde(default = "ground_cost_default")]
    pub ground_cost: GroundCost,
    /// Only jobs run on this compartment are joined; `None` keeps every compartment.
    #[serde(default = "compartment_default")]
    pub compartment: Option<String>,
    #[serde(default = "job_status_default")]
    pub job_status: String,
}

impl Default for General {
    fn default() -> Self {
        General {
            output_path: output_path_default(),
            balanced: false_default(),
        }
    }
}

impl Default for Data {
    fn default() -> Self {
        Data {
            cells_file: empty_path(),
            outcomes_file: empty_path(),
            probabilities_file: empty_path(),
            job_metadata_file: empty_path(),
            complex_phenotypes_file: empty_path(),
            phenotype_columns: Vec::new(),
        }
    }
}

impl Default for Diffusion {
    fn default() -> Self {
        Diffusion {
            min_probability_value: min_probability_value_default(),
            max_probability_value: max_probability_value_default(),
            histogram_resolution: histogram_resolution_default(),
            ground_cost: ground_cost_default(),
            compartment: compartment_default(),
            job_status: job_status_default(),
        }
    }
}

impl EngineConfig {
    /// Read and validate a YAML configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<EngineConfig> {
        let path = path.as_ref();
        let reader = File::open(path)
            .with_context(|| format!("failed to open configuration {}", path.display()))?;
        let config: EngineConfig = serde_yaml::from_reader(reader)
            .with_context(|| format!("failed to parse configuration {}", path.display()))?;
        config.validate()?;
        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        self.histogram_config().validate()?;
        if self.diffusion.job_status.is_empty() {
            return Err(EngineError::InvalidConfiguration(
                "diffusion.job_status must not be empty".to_string(),
            )
            .into());
        }
        for phenotype in &self.data.phenotype_columns {
            if phenotype.name.is_empty() || phenotype.column.is_empty() {
                return Err(EngineError::InvalidConfiguration(format!(
                    "phenotype column entry {:?} needs both a name and a column",
                    phenotype
                ))
                .into());
            }
        }
        Ok(())
    }

    pub fn histogram_config(&self) -> HistogramConfig {
        HistogramConfig {
            min_value: self.diffusion.min_probability_value,
            max_value: self.diffusion.max_probability_value,
            steps: self.diffusion.histogram_resolution,
        }
    }

    /// Jobs whose transition probabilities enter the diffusion comparison.
    pub fn job_filter(&self) -> JobFilter {
        JobFilter {
            job_status: self.diffusion.job_status.clone(),
            compartment: self.diffusion.compartment.clone(),
        }
    }

    pub fn normalization(&self) -> Normalization {
        if self.general.balanced {
            Normalization::Balanced
        } else {
            Normalization::Compartmental
        }
    }
}

fn output_path_default() -> PathBuf {
    PathBuf::from(".")
}
fn empty_path() -> PathBuf {
    PathBuf::new()
}
fn false_default() -> bool {
    false
}
fn min_probability_value_default() -> f64 {
    -0.001
}
fn max_probability_value_default() -> f64 {
    0.05
}
fn histogram_resolution_default() -> usize {
    50
}
fn ground_cost_default() -> GroundCost {
    GroundCost::BinIndex
}
fn compartment_default() -> Option<String> {
    Some("nontumor".to_string())
}
fn job_status_default() -> String {
    "COMPLETE".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_document() {
        let config: EngineConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config.diffusion.histogram_resolution, 50);
        assert_eq!(config.diffusion.min_probability_value, -0.001);
        assert_eq!(config.diffusion.max_probability_value, 0.05);
        assert_eq!(config.diffusion.ground_cost, GroundCost::BinIndex);
        assert_eq!(config.diffusion.compartment.as_deref(), Some("nontumor"));
        assert_eq!(config.diffusion.job_status, "COMPLETE");
        assert!(!config.general.balanced);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_document() {
        let yaml = "
general:
  balanced: true
  output_path: results
diffusion:
  histogram_resolution: 20
  ground_cost: squared_bin_index
  compartment: ~
data:
  phenotype_columns:
    - name: CD3
      column: CD3 membership
";
        let config: EngineConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(config.general.balanced);
        assert_eq!(config.normalization(), Normalization::Balanced);
        assert_eq!(config.general.output_path, PathBuf::from("results"));
        assert_eq!(config.histogram_config().steps, 20);
        assert_eq!(config.diffusion.ground_cost, GroundCost::SquaredBinIndex);
        assert!(config.diffusion.compartment.is_none());
        assert_eq!(config.job_filter().compartment, None);
        assert_eq!(config.job_filter().job_status, "COMPLETE");
        assert_eq!(config.data.phenotype_columns[0].column, "CD3 membership");
    }

    #[test]
    fn test_invalid_range_rejected() {
        let yaml = "
diffusion:
  min_probability_value: 0.5
  max_probability_value: 0.1
";
        let config: EngineConfig = serde_yaml::from_str(yaml).unwrap();
        let err = config.validate().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<EngineError>(),
            Some(EngineError::InvalidConfiguration(_))
        ));
    }
}
