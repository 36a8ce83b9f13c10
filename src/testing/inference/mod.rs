//! Two-sample hypothesis tests used by the significance tester.
//!
//! - **[`parametric`]**: Welch's unequal-variance t-test
//! - **[`nonparametric`]**: Kruskal-Wallis H test on ranks

pub mod nonparametric;
pub mod parametric;

#[derive(Debug, Clone, PartialEq)]
pub struct InferenceResult {
    /// The test statistic value (t for the t-test, H for Kruskal-Wallis)
    pub statistic: f64,
    /// The two-sided p-value of the test
    pub p_value: f64,
    /// Degrees of freedom of the reference distribution
    pub degrees_of_freedom: Option<f64>,
}

impl InferenceResult {
    pub fn new(statistic: f64, p_value: f64) -> Self {
        InferenceResult {
            statistic,
            p_value,
            degrees_of_freedom: None,
        }
    }

    pub fn with_degrees_of_freedom(mut self, df: f64) -> Self {
        self.degrees_of_freedom = Some(df);
        self
    }

    pub fn is_significant(&self, alpha: f64) -> bool {
        self.p_value < alpha
    }
}
