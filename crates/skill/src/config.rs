//! Skill scoring configuration.

use crate::error::SkillError;

/// Configuration for correlation significance testing.
#[derive(Debug, Clone)]
pub struct SkillConfig {
    sigma: f64,
    fisher_threshold: f64,
}

impl Default for SkillConfig {
    fn default() -> Self {
        Self {
            sigma: 2.0,
            fisher_threshold: 0.5,
        }
    }
}

impl SkillConfig {
    /// Creates a configuration with a 2-sigma test and the Fisher
    /// transform applied from `|r| >= 0.5`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of standard errors a statistic must exceed.
    pub fn with_sigma(mut self, sigma: f64) -> Self {
        self.sigma = sigma;
        self
    }

    /// Set the `|r|` at which the Fisher z-transform takes over.
    pub fn with_fisher_threshold(mut self, threshold: f64) -> Self {
        self.fisher_threshold = threshold;
        self
    }

    /// Number of standard errors a correlation must exceed.
    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    /// `|r|` at which the Fisher z-transform takes over.
    pub fn fisher_threshold(&self) -> f64 {
        self.fisher_threshold
    }

    /// Checks that `sigma` is positive and the Fisher threshold lies in
    /// `[0, 1]`.
    pub fn validate(&self) -> Result<(), SkillError> {
        if !(self.sigma.is_finite() && self.sigma > 0.0) {
            return Err(SkillError::InvalidConfig {
                field: "sigma",
                reason: format!("must be positive and finite, got {}", self.sigma),
            });
        }
        if !(0.0..=1.0).contains(&self.fisher_threshold) {
            return Err(SkillError::InvalidConfig {
                field: "fisher_threshold",
                reason: format!("must be in [0, 1], got {}", self.fisher_threshold),
            });
        }
        Ok(())
    }
}
