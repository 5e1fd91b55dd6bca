use rand::Rng;

use crate::error::{LdaError, Result};
use crate::{Document, Topic, WordId};

/// Topic assignment of every token, nested as document → chunk → position.
pub type Assignments = Vec<Vec<Vec<Topic>>>;

/// Sufficient statistics of the collapsed Gibbs chain.
///
/// The count tables carry the Dirichlet pseudo-counts: `doc_topic` starts at
/// alpha, `topic_word` at beta and `topic_totals` at V·beta.
#[derive(Debug, Clone, PartialEq)]
pub struct SamplerState {
    n_topics: usize,
    n_words: usize,
    alpha: f64,
    beta: f64,

    // latent variables & counts
    z: Assignments,
    doc_topic: Vec<Vec<f64>>,   // [doc][topic]
    topic_word: Vec<Vec<f64>>,  // [topic][word]
    topic_totals: Vec<f64>,     // [topic]

    doc_lengths: Vec<usize>,
    n_tokens: usize,
}

impl SamplerState {
    /// Allocate the count tables and assign every token a uniformly random
    /// topic, in document/chunk/position order.
    pub fn new<R: Rng + ?Sized>(
        n_topics: usize,
        alpha: f64,
        beta: f64,
        docs: &[Document],
        n_words: usize,
        rng: &mut R,
    ) -> Result<Self> {
        if n_topics == 0 {
            return Err(LdaError::InvalidTopicCount);
        }
        if n_words == 0 {
            return Err(LdaError::EmptyVocabulary);
        }
        if !(alpha > 0.0) || !(beta > 0.0) {
            return Err(LdaError::InvalidParameter(format!(
                "alpha and beta must be positive, got alpha={alpha}, beta={beta}"
            )));
        }
        for (m, doc) in docs.iter().enumerate() {
            for (c, chunk) in doc.iter().enumerate() {
                if let Some(n) = chunk.iter().position(|&w| w >= n_words) {
                    return Err(LdaError::WordOutOfRange {
                        doc: m,
                        chunk: c,
                        position: n,
                        word: chunk[n],
                        n_words,
                    });
                }
            }
        }

        let mut doc_topic = vec![vec![alpha; n_topics]; docs.len()];
        let mut topic_word = vec![vec![beta; n_words]; n_topics];
        let mut topic_totals = vec![n_words as f64 * beta; n_topics];
        let mut z = Vec::with_capacity(docs.len());
        let mut doc_lengths = Vec::with_capacity(docs.len());
        let mut n_tokens = 0;

        for (m, doc) in docs.iter().enumerate() {
            let mut z_doc = Vec::with_capacity(doc.len());
            let mut length = 0;
            for chunk in doc {
                let mut z_chunk = Vec::with_capacity(chunk.len());
                for &w in chunk {
                    let topic = rng.gen_range(0..n_topics);
                    z_chunk.push(topic);
                    doc_topic[m][topic] += 1.0;
                    topic_word[topic][w] += 1.0;
                    topic_totals[topic] += 1.0;
                }
                length += chunk.len();
                z_doc.push(z_chunk);
            }
            n_tokens += length;
            doc_lengths.push(length);
            z.push(z_doc);
        }

        Ok(Self {
            n_topics,
            n_words,
            alpha,
            beta,
            z,
            doc_topic,
            topic_word,
            topic_totals,
            doc_lengths,
            n_tokens,
        })
    }

    /// Remove one token's contribution from the counts. The caller keeps `z`
    /// in step and pairs every decrement with an increment.
    #[inline]
    pub fn decrement(&mut self, doc: usize, topic: Topic, word: WordId) {
        debug_assert!(self.doc_topic[doc][topic] >= 1.0, "doc-topic count underflow");
        self.doc_topic[doc][topic] -= 1.0;
        self.topic_word[topic][word] -= 1.0;
        self.topic_totals[topic] -= 1.0;
    }

    #[inline]
    pub fn increment(&mut self, doc: usize, topic: Topic, word: WordId) {
        self.doc_topic[doc][topic] += 1.0;
        self.topic_word[topic][word] += 1.0;
        self.topic_totals[topic] += 1.0;
    }

    #[inline]
    pub fn topic(&self, doc: usize, chunk: usize, position: usize) -> Topic {
        self.z[doc][chunk][position]
    }

    #[inline]
    pub fn set_topic(&mut self, doc: usize, chunk: usize, position: usize, topic: Topic) {
        self.z[doc][chunk][position] = topic;
    }

    pub fn assignments(&self) -> &Assignments {
        &self.z
    }

    /// n_m_z: `[doc][topic]`, alpha included.
    pub fn doc_topic_counts(&self) -> &[Vec<f64>] {
        &self.doc_topic
    }

    /// n_z_t: `[topic][word]`, beta included.
    pub fn topic_word_counts(&self) -> &[Vec<f64>] {
        &self.topic_word
    }

    /// n_z: `[topic]`, V·beta included.
    pub fn topic_totals(&self) -> &[f64] {
        &self.topic_totals
    }

    pub fn doc_length(&self, doc: usize) -> usize {
        self.doc_lengths[doc]
    }

    pub fn n_docs(&self) -> usize {
        self.doc_topic.len()
    }

    pub fn n_tokens(&self) -> usize {
        self.n_tokens
    }

    pub fn n_topics(&self) -> usize {
        self.n_topics
    }

    pub fn n_words(&self) -> usize {
        self.n_words
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn beta(&self) -> f64 {
        self.beta
    }

    /// θ[m] = n_m_z[m] / (N_m + K·α), each row sums to one.
    pub fn theta(&self) -> Vec<Vec<f64>> {
        let k_alpha = self.n_topics as f64 * self.alpha;
        self.doc_topic
            .iter()
            .zip(&self.doc_lengths)
            .map(|(row, &len)| {
                let denom = len as f64 + k_alpha;
                row.iter().map(|&c| c / denom).collect()
            })
            .collect()
    }

    /// φ[z][w] = n_z_t[z][w] / n_z[z]
    pub fn phi(&self) -> Vec<Vec<f64>> {
        self.topic_word
            .iter()
            .zip(&self.topic_totals)
            .map(|(row, &total)| row.iter().map(|&c| c / total).collect())
            .collect()
    }
}
