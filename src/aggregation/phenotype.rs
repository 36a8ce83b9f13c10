use crate::error::EngineError;
use nalgebra_sparse::{CooMatrix, CsrMatrix};
use std::collections::HashMap;

/// A cell classification defined by required positive and negative markers.
///
/// An elementary marker is the signature with a single positive marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhenotypeSignature {
    pub name: String,
    pub positive: Vec<String>,
    pub negative: Vec<String>,
}

impl PhenotypeSignature {
    pub fn elementary(marker: impl Into<String>) -> Self {
        let marker = marker.into();
        PhenotypeSignature {
            name: marker.clone(),
            positive: vec![marker],
            negative: Vec::new(),
        }
    }

    /// Composite signature; an empty `name` is derived from the markers, e.g. `CD3+ CD8+ FOXP3-`.
    pub fn composite(name: impl Into<String>, positive: Vec<String>, negative: Vec<String>) -> Self {
        let mut positive = positive;
        let mut negative = negative;
        positive.sort();
        negative.sort();
        let name = name.into();
        let name = if name.is_empty() {
            positive
                .iter()
                .map(|m| format!("{}+", m))
                .chain(negative.iter().map(|m| format!("{}-", m)))
                .collect::<Vec<_>>()
                .join(" ")
        } else {
            name
        };
        PhenotypeSignature {
            name,
            positive,
            negative,
        }
    }

    fn resolve(&self, markers: &HashMap<&str, usize>) -> anyhow::Result<(Vec<usize>, Vec<usize>)> {
        let lookup = |marker: &String| {
            markers.get(marker.as_str()).copied().ok_or_else(|| {
                EngineError::UnknownMarker {
                    phenotype: self.name.clone(),
                    marker: marker.clone(),
                }
            })
        };
        let positive = self.positive.iter().map(lookup).collect::<Result<Vec<_>, _>>()?;
        let negative = self.negative.iter().map(lookup).collect::<Result<Vec<_>, _>>()?;
        Ok((positive, negative))
    }
}

/// Sparse cells x phenotypes indicator matrix (entry 1.0 where the cell is a member).
pub fn membership_matrix(
    markers: &[String],
    indicators: &[Vec<bool>],
    signatures: &[PhenotypeSignature],
) -> anyhow::Result<CsrMatrix<f64>> {
    let marker_index: HashMap<&str, usize> = markers
        .iter()
        .enumerate()
        .map(|(i, m)| (m.as_str(), i))
        .collect();
    let resolved = signatures
        .iter()
        .map(|s| s.resolve(&marker_index))
        .collect::<anyhow::Result<Vec<_>>>()?;

    let mut coo = CooMatrix::new(indicators.len(), signatures.len());
    for (cell, row) in indicators.iter().enumerate() {
        if row.len() != markers.len() {
            return Err(anyhow::anyhow!(
                "Cell {} has {} marker indicators, expected {}",
                cell,
                row.len(),
                markers.len()
            ));
        }
        for (phenotype, (positive, negative)) in resolved.iter().enumerate() {
            if positive.iter().all(|&m| row[m]) && negative.iter().all(|&m| !row[m]) {
                coo.push(cell, phenotype, 1.0);
            }
        }
    }

    Ok(CsrMatrix::from(&coo))
}
