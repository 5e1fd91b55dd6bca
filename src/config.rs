use crate::copula::CopulaFamily;
use crate::error::{LdaError, Result};

/// Copula LDA model configuration
#[derive(Debug, Clone, PartialEq)]
pub struct LdaConfig {
    /// Number of topics
    pub n_topics: usize,
    /// Document-topic prior (alpha)
    pub alpha: f64,
    /// Topic-word prior (beta)
    pub beta: f64,
    /// Copula family coupling the topic draws inside a chunk
    pub copula_family: CopulaFamily,
    /// Dependence parameter of the copula family
    pub copula_parameter: f64,
    /// Random seed for reproducibility
    pub random_seed: Option<u64>,
}

impl Default for LdaConfig {
    fn default() -> Self {
        Self {
            n_topics: 25,
            alpha: 0.5,
            beta: 0.5,
            copula_family: CopulaFamily::Frank,
            copula_parameter: 2.0,
            random_seed: None,
        }
    }
}

impl LdaConfig {
    /// Create a new configuration with specified number of topics
    pub fn new(n_topics: usize) -> Self {
        Self {
            n_topics,
            ..Default::default()
        }
    }

    /// Set alpha (document-topic prior)
    pub fn alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    /// Set beta (topic-word prior)
    pub fn beta(mut self, beta: f64) -> Self {
        self.beta = beta;
        self
    }

    /// Set copula family and its dependence parameter
    pub fn copula(mut self, family: CopulaFamily, parameter: f64) -> Self {
        self.copula_family = family;
        self.copula_parameter = parameter;
        self
    }

    /// Set random seed
    pub fn random_seed(mut self, seed: u64) -> Self {
        self.random_seed = Some(seed);
        self
    }

    /// Check the hyperparameters. The copula parameter is checked against its
    /// family's admissible range.
    pub fn validate(&self) -> Result<()> {
        if self.n_topics == 0 {
            return Err(LdaError::InvalidTopicCount);
        }
        if !(self.alpha > 0.0) || !self.alpha.is_finite() {
            return Err(LdaError::InvalidParameter(format!(
                "alpha must be positive, got {}",
                self.alpha
            )));
        }
        if !(self.beta > 0.0) || !self.beta.is_finite() {
            return Err(LdaError::InvalidParameter(format!(
                "beta must be positive, got {}",
                self.beta
            )));
        }
        self.copula_family.check_parameter(self.copula_parameter)
    }
}
