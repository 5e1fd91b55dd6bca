//! Latent Dirichlet Allocation with copula-coupled topic draws.
//!
//! Documents are sequences of chunks (sentences, noun phrases). A collapsed
//! Gibbs sweep resamples every chunk longer than one token from a single joint
//! uniform draw of an Archimedean copula, mapped to topics through the
//! probability-integral transform, so words of one chunk tend to share a
//! topic. Singleton chunks fall back to the ordinary collapsed Gibbs step.
//!
//! ```
//! use copula_lda::{CopulaFamily, CopulaLda, LdaConfig};
//!
//! let docs = vec![
//!     vec![vec![0, 1, 2], vec![1]],
//!     vec![vec![3, 4], vec![4, 5, 3]],
//! ];
//! let config = LdaConfig::new(2)
//!     .alpha(0.1)
//!     .beta(0.01)
//!     .copula(CopulaFamily::Frank, 2.0)
//!     .random_seed(42);
//! let mut lda = CopulaLda::new(config, docs, 6).unwrap();
//! lda.train(20).unwrap();
//! assert!(lda.perplexity().unwrap() > 0.0);
//! ```

extern crate log;

pub mod config;
pub mod copula;
pub mod corpus;
pub mod error;
pub mod sampler;
pub mod state;

use rand::rngs::StdRng;
use rand::SeedableRng;

pub use crate::config::LdaConfig;
pub use crate::copula::{ArchimedeanCopula, CopulaFamily, CopulaSampler};
pub use crate::corpus::{Corpus, Vocabulary};
pub use crate::error::{LdaError, Result};
pub use crate::sampler::topic_from_uniform;
pub use crate::state::{Assignments, SamplerState};

pub type WordId = usize;
pub type Topic = usize;
pub type Chunk = Vec<WordId>;
pub type Document = Vec<Chunk>;

/// Small model over raw text: three topics, sparse priors, Frank copula.
pub fn default(texts: &[&str]) -> Result<CopulaLda> {
    let corpus = Corpus::from_texts(texts);
    let config = LdaConfig::new(3)
        .alpha(0.1)
        .beta(0.01)
        .copula(CopulaFamily::Frank, 2.0)
        .random_seed(42);
    CopulaLda::new(config, corpus.documents, corpus.vocabulary.len())
}

pub struct CopulaLda {
    config: LdaConfig,
    docs: Vec<Document>,
    state: SamplerState,
    copula: Box<dyn CopulaSampler>,
    rng: StdRng,
    poisoned: bool,
}

impl CopulaLda {
    /// Build a model whose copula is the configured Archimedean family.
    pub fn new(config: LdaConfig, docs: Vec<Document>, n_words: usize) -> Result<Self> {
        config.validate()?;
        let copula = ArchimedeanCopula::new(config.copula_family, config.copula_parameter)?;
        Self::with_copula(config, docs, n_words, Box::new(copula))
    }

    /// Build a model around any copula sampler, e.g. a deterministic stub.
    /// The configured family and parameter are then informational only.
    pub fn with_copula(
        config: LdaConfig,
        docs: Vec<Document>,
        n_words: usize,
        copula: Box<dyn CopulaSampler>,
    ) -> Result<Self> {
        config.validate()?;
        let mut rng = match config.random_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let state = SamplerState::new(
            config.n_topics,
            config.alpha,
            config.beta,
            &docs,
            n_words,
            &mut rng,
        )?;
        log::info!(
            "Copula LDA: K={}, V={}, {} documents, {} tokens, {} copula (theta={})",
            config.n_topics,
            n_words,
            docs.len(),
            state.n_tokens(),
            config.copula_family,
            config.copula_parameter
        );
        Ok(Self {
            config,
            docs,
            state,
            copula,
            rng,
            poisoned: false,
        })
    }

    fn ensure_consistent(&self) -> Result<()> {
        if self.poisoned {
            Err(LdaError::CorruptedState)
        } else {
            Ok(())
        }
    }

    /// One collapsed Gibbs sweep over the whole corpus.
    ///
    /// A failure leaves the counts inconsistent; the model then refuses
    /// further sweeps and evaluations.
    pub fn run_epoch(&mut self) -> Result<()> {
        self.ensure_consistent()?;
        let result = sampler::sweep(
            &self.docs,
            &mut self.state,
            None,
            self.copula.as_mut(),
            &mut self.rng,
        );
        if let Err(err) = &result {
            log::warn!("Copula LDA epoch aborted: {err}");
            self.poisoned = true;
        }
        result
    }

    /// Run `iters` epochs.
    pub fn train(&mut self, iters: usize) -> Result<()> {
        for it in 0..iters {
            self.run_epoch()?;
            if (it + 1) % 50 == 0 {
                log::debug!("Training copula LDA: iteration {}/{}", it + 1, iters);
            }
        }
        Ok(())
    }

    /// φ: K×V, row z = n_z_t[z] / n_z[z].
    pub fn topic_word_distribution(&self) -> Vec<Vec<f64>> {
        self.state.phi()
    }

    /// docs×K, share of each document's tokens currently assigned to each
    /// topic. Empty documents get the uniform row.
    pub fn document_topic_distribution(&self) -> Vec<Vec<f64>> {
        let k = self.config.n_topics;
        let alpha = self.config.alpha;
        self.state
            .doc_topic_counts()
            .iter()
            .enumerate()
            .map(|(m, row)| match self.state.doc_length(m) {
                0 => vec![1.0 / k as f64; k],
                len => row.iter().map(|&c| (c - alpha) / len as f64).collect(),
            })
            .collect()
    }

    /// Training perplexity, exp(-Σ log p(w | d) / N).
    pub fn perplexity(&self) -> Result<f64> {
        self.ensure_consistent()?;
        perplexity(&self.docs, &self.state.phi(), &self.state.theta())
    }

    /// Perplexity of unseen documents.
    ///
    /// A separate state is initialized for `docs` and resampled `iterations`
    /// times with the topic-word statistics frozen at the trained values;
    /// only the held-out document-topic counts adapt. The trained state is
    /// left untouched, though the shared generator and copula advance.
    pub fn held_out_perplexity(&mut self, docs: &[Document], iterations: usize) -> Result<f64> {
        self.ensure_consistent()?;
        let mut held_out = SamplerState::new(
            self.config.n_topics,
            self.config.alpha,
            self.config.beta,
            docs,
            self.state.n_words(),
            &mut self.rng,
        )?;
        for _ in 0..iterations {
            sampler::sweep(
                docs,
                &mut held_out,
                Some(&self.state),
                self.copula.as_mut(),
                &mut self.rng,
            )?;
        }
        let result = perplexity(docs, &self.state.phi(), &held_out.theta());
        log::debug!(
            "Held-out perplexity over {} documents ({} tokens, {} iterations): {:?}",
            docs.len(),
            held_out.n_tokens(),
            iterations,
            result
        );
        result
    }

    /// Top `n` word ids for each topic by φ[z][w], descending.
    pub fn top_words(&self, n: usize) -> Vec<Vec<(WordId, f64)>> {
        self.state
            .phi()
            .into_iter()
            .map(|row| {
                let mut pairs: Vec<(WordId, f64)> = row.into_iter().enumerate().collect();
                pairs.sort_by(|a, b| b.1.total_cmp(&a.1));
                pairs.truncate(n);
                pairs
            })
            .collect()
    }

    /// Most probable topic of every document.
    pub fn dominant_topics(&self) -> Vec<Topic> {
        self.document_topic_distribution()
            .iter()
            .map(|row| {
                row.iter()
                    .enumerate()
                    .max_by(|a, b| a.1.total_cmp(b.1))
                    .map(|(z, _)| z)
                    .unwrap_or(0)
            })
            .collect()
    }

    /// Current topic of every token (Z).
    pub fn assignments(&self) -> &Assignments {
        self.state.assignments()
    }

    pub fn state(&self) -> &SamplerState {
        &self.state
    }

    pub fn config(&self) -> &LdaConfig {
        &self.config
    }

    pub fn documents(&self) -> &[Document] {
        &self.docs
    }

    pub fn n_tokens(&self) -> usize {
        self.state.n_tokens()
    }

    pub fn n_topics(&self) -> usize {
        self.config.n_topics
    }

    pub fn n_words(&self) -> usize {
        self.state.n_words()
    }
}

fn perplexity(docs: &[Document], phi: &[Vec<f64>], theta: &[Vec<f64>]) -> Result<f64> {
    let mut log_per = 0.0;
    let mut n = 0usize;
    for (m, doc) in docs.iter().enumerate() {
        for &w in doc.iter().flatten() {
            let p: f64 = phi
                .iter()
                .zip(&theta[m])
                .map(|(phi_z, &theta_z)| phi_z[w] * theta_z)
                .sum();
            if !(p > 0.0) || !p.is_finite() {
                return Err(LdaError::DegenerateDistribution { doc: m, word: w });
            }
            log_per -= p.ln();
            n += 1;
        }
    }
    if n == 0 {
        return Err(LdaError::EmptyCorpus);
    }
    Ok((log_per / n as f64).exp())
}
