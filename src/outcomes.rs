use std::collections::BTreeMap;

/// Label of samples missing from the outcomes table.
pub const UNKNOWN_OUTCOME: &str = "unknown";

/// Sample identifier to outcome label.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutcomeAssignment {
    labels: BTreeMap<String, String>,
}

impl OutcomeAssignment {
    pub fn new() -> Self {
        OutcomeAssignment::default()
    }

    pub fn from_pairs<I, S, L>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, L)>,
        S: Into<String>,
        L: Into<String>,
    {
        OutcomeAssignment {
            labels: pairs
                .into_iter()
                .map(|(s, l)| (s.into(), l.into()))
                .collect(),
        }
    }

    pub fn insert(&mut self, sample_identifier: impl Into<String>, label: impl Into<String>) {
        self.labels.insert(sample_identifier.into(), label.into());
    }

    /// The sample's label, or `"unknown"` when it has none.
    pub fn label(&self, sample_identifier: &str) -> &str {
        self.labels
            .get(sample_identifier)
            .map(String::as_str)
            .unwrap_or(UNKNOWN_OUTCOME)
    }

    pub fn get(&self, sample_identifier: &str) -> Option<&str> {
        self.labels.get(sample_identifier).map(String::as_str)
    }

    pub fn is_known(&self, sample_identifier: &str) -> bool {
        self.labels.contains_key(sample_identifier)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}
