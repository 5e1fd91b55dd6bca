use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;

use crate::copula::CopulaSampler;
use crate::error::{LdaError, Result};
use crate::state::SamplerState;
use crate::{Document, Topic, WordId};

/// Probability-integral transform: the first topic whose cumulative
/// probability reaches `u`. Rounding that leaves the total below `u` maps to
/// the last topic.
pub fn topic_from_uniform(probs: &[f64], u: f64) -> Topic {
    let mut cdf = 0.0;
    for (topic, &p) in probs.iter().enumerate() {
        cdf += p;
        if u <= cdf {
            return topic;
        }
    }
    probs.len().saturating_sub(1)
}

/// Normalized collapsed conditional of `word` over all topics:
/// p(z) ∝ n_z_t[z][w] · n_m_z[z] / n_z[z], priors already in the counts.
///
/// Returns `false` if the vector carries no usable mass.
pub(crate) fn conditional(
    doc_topic: &[f64],
    topic_word: &[Vec<f64>],
    topic_totals: &[f64],
    word: WordId,
    probs: &mut [f64],
) -> bool {
    let mut total = 0.0;
    for (z, p) in probs.iter_mut().enumerate() {
        *p = topic_word[z][word] * doc_topic[z] / topic_totals[z];
        total += *p;
    }
    if !(total > 0.0) || !total.is_finite() {
        return false;
    }
    probs.iter_mut().for_each(|p| *p /= total);
    true
}

fn check_joint_sample(u: &[f64], expected: usize) -> Result<()> {
    if u.len() != expected {
        return Err(LdaError::CopulaDimension {
            expected,
            got: u.len(),
        });
    }
    match u.iter().find(|x| !(0.0..=1.0).contains(*x)) {
        Some(&bad) => Err(LdaError::InvalidCopulaSample(bad)),
        None => Ok(()),
    }
}

/// One collapsed Gibbs sweep over `docs`, mutating `state` in place.
///
/// Topic-word statistics are read from `frozen` when given (held-out
/// evaluation against a trained model), otherwise from `state` itself.
/// Chunks longer than one token take their topics jointly from a single
/// copula draw; singletons are sampled from the categorical conditional.
///
/// On error the chunk in progress may be left decremented.
pub(crate) fn sweep(
    docs: &[Document],
    state: &mut SamplerState,
    frozen: Option<&SamplerState>,
    copula: &mut dyn CopulaSampler,
    rng: &mut StdRng,
) -> Result<()> {
    let mut probs = vec![0.0f64; state.n_topics()];

    for (m, doc) in docs.iter().enumerate() {
        for (c, chunk) in doc.iter().enumerate() {
            let joint = if chunk.len() > 1 {
                let u = copula.sample(chunk.len(), rng)?;
                check_joint_sample(&u, chunk.len())?;
                Some(u)
            } else {
                None
            };

            // drop the whole chunk before resampling any of it
            for (n, &w) in chunk.iter().enumerate() {
                let old = state.topic(m, c, n);
                state.decrement(m, old, w);
            }

            for (n, &w) in chunk.iter().enumerate() {
                let source = frozen.unwrap_or(&*state);
                if !conditional(
                    &state.doc_topic_counts()[m],
                    source.topic_word_counts(),
                    source.topic_totals(),
                    w,
                    &mut probs,
                ) {
                    return Err(LdaError::DegenerateDistribution { doc: m, word: w });
                }

                let new_topic = match &joint {
                    Some(u) => topic_from_uniform(&probs, u[n]),
                    None => WeightedIndex::new(&probs)
                        .map_err(|_| LdaError::DegenerateDistribution { doc: m, word: w })?
                        .sample(rng),
                };

                state.set_topic(m, c, n, new_topic);
                state.increment(m, new_topic, w);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{RngCore, SeedableRng};

    struct FixedCopula(Vec<f64>);

    impl CopulaSampler for FixedCopula {
        fn sample(&mut self, dimension: usize, _rng: &mut dyn RngCore) -> Result<Vec<f64>> {
            Ok(self.0.iter().copied().cycle().take(dimension).collect())
        }
    }

    struct ShortCopula;

    impl CopulaSampler for ShortCopula {
        fn sample(&mut self, dimension: usize, _rng: &mut dyn RngCore) -> Result<Vec<f64>> {
            Ok(vec![0.5; dimension - 1])
        }
    }

    #[test]
    fn test_topic_from_uniform() {
        let p = [0.2, 0.5, 0.3];
        assert_eq!(topic_from_uniform(&p, 0.55), 1);
        assert_eq!(topic_from_uniform(&p, 0.1), 0);
        assert_eq!(topic_from_uniform(&p, 1.0), 2);
        assert_eq!(topic_from_uniform(&p, 0.0), 0);
        assert_eq!(topic_from_uniform(&p, 0.7), 1);
    }

    #[test]
    fn test_topic_from_uniform_rounding_falls_to_last() {
        // cumulative sum stops short of one
        let p = [0.1, 0.1, 0.1, 0.1, 0.1, 0.1, 0.1, 0.1, 0.1, 0.0999999];
        assert_eq!(topic_from_uniform(&p, 1.0), 9);
        assert_eq!(topic_from_uniform(&[1.0], 0.3), 0);
    }

    #[test]
    fn test_conditional_normalizes() {
        let doc_topic = [1.5, 0.5];
        let topic_word = vec![vec![2.0, 1.0], vec![1.0, 3.0]];
        let totals = [3.0, 4.0];
        let mut probs = [0.0; 2];
        assert!(conditional(&doc_topic, &topic_word, &totals, 0, &mut probs));
        // unnormalized: 2*1.5/3 = 1.0, 1*0.5/4 = 0.125
        assert!((probs[0] - 1.0 / 1.125).abs() < 1e-12);
        assert!((probs[1] - 0.125 / 1.125).abs() < 1e-12);
    }

    #[test]
    fn test_conditional_detects_zero_mass() {
        let doc_topic = [1.0, 1.0];
        let topic_word = vec![vec![0.0], vec![0.0]];
        let mut probs = [0.0; 2];
        assert!(!conditional(&doc_topic, &topic_word, &[1.0, 1.0], 0, &mut probs));
    }

    #[test]
    fn test_joint_sample_checks() {
        assert!(check_joint_sample(&[0.1, 0.9], 2).is_ok());
        assert!(check_joint_sample(&[0.0, 1.0], 2).is_ok());
        assert_eq!(
            check_joint_sample(&[0.1], 2),
            Err(LdaError::CopulaDimension { expected: 2, got: 1 })
        );
        assert_eq!(
            check_joint_sample(&[0.1, 1.5], 2),
            Err(LdaError::InvalidCopulaSample(1.5))
        );
        assert!(check_joint_sample(&[f64::NAN, 0.5], 2).is_err());
    }

    #[test]
    fn test_sweep_keeps_counts_consistent() {
        let docs: Vec<Document> = vec![
            vec![vec![0, 1, 2], vec![3]],
            vec![vec![2, 2, 4, 1], vec![0]],
        ];
        let mut rng = StdRng::seed_from_u64(21);
        let mut state = SamplerState::new(3, 0.2, 0.1, &docs, 5, &mut rng).unwrap();
        let mut copula = FixedCopula(vec![0.25, 0.75, 0.5]);

        for _ in 0..10 {
            sweep(&docs, &mut state, None, &mut copula, &mut rng).unwrap();
        }

        let k_alpha = 3.0 * 0.2;
        for (m, row) in state.doc_topic_counts().iter().enumerate() {
            let expected = state.doc_length(m) as f64 + k_alpha;
            assert!((row.iter().sum::<f64>() - expected).abs() < 1e-9);
        }
        for (row, &total) in state.topic_word_counts().iter().zip(state.topic_totals()) {
            assert!((row.iter().sum::<f64>() - total).abs() < 1e-9);
        }
        assert_eq!(state.n_tokens(), 9);
    }

    fn assign_all(state: &mut SamplerState, docs: &[Document], topic_of: impl Fn(WordId) -> Topic) {
        for (m, doc) in docs.iter().enumerate() {
            for (c, chunk) in doc.iter().enumerate() {
                for (n, &w) in chunk.iter().enumerate() {
                    let old = state.topic(m, c, n);
                    state.decrement(m, old, w);
                    state.set_topic(m, c, n, topic_of(w));
                    state.increment(m, topic_of(w), w);
                }
            }
        }
    }

    #[test]
    fn test_frozen_sweep_reads_trained_topic_word_counts() {
        let mut rng = StdRng::seed_from_u64(12);
        let train_docs: Vec<Document> = (0..200).map(|d| vec![vec![d % 2]]).collect();
        let mut trained = SamplerState::new(2, 0.1, 0.001, &train_docs, 2, &mut rng).unwrap();
        // word 0 lives in topic 0, word 1 in topic 1
        assign_all(&mut trained, &train_docs, |w| w);
        let snapshot = trained.clone();

        // held-out tokens of word 0 all start in topic 1, so their own
        // n_z_t favours topic 1 while the trained one favours topic 0
        let held_docs: Vec<Document> = vec![vec![vec![0, 0]]; 20];
        let mut held = SamplerState::new(2, 0.1, 0.001, &held_docs, 2, &mut rng).unwrap();
        assign_all(&mut held, &held_docs, |_| 1);

        let mut copula = FixedCopula(vec![0.9]);
        sweep(&held_docs, &mut held, Some(&trained), &mut copula, &mut rng).unwrap();

        assert!(
            held.assignments().iter().flatten().flatten().all(|&z| z == 0),
            "{:?}",
            held.assignments()
        );
        assert_eq!(trained, snapshot);
    }

    #[test]
    fn test_identical_uniforms_share_a_topic_for_repeated_words() {
        // a chunk repeating one word sees one conditional, so equal
        // uniforms must land on the same topic
        let docs: Vec<Document> = vec![vec![vec![1, 1, 1, 1]]];
        let mut rng = StdRng::seed_from_u64(4);
        let mut state = SamplerState::new(4, 0.5, 0.5, &docs, 2, &mut rng).unwrap();
        let mut copula = FixedCopula(vec![0.6]);

        sweep(&docs, &mut state, None, &mut copula, &mut rng).unwrap();
        let topics = &state.assignments()[0][0];
        assert!(topics.iter().all(|&z| z == topics[0]), "{topics:?}");
    }

    #[test]
    fn test_dimension_mismatch_aborts_sweep() {
        let docs: Vec<Document> = vec![vec![vec![0, 1]]];
        let mut rng = StdRng::seed_from_u64(2);
        let mut state = SamplerState::new(2, 0.5, 0.5, &docs, 2, &mut rng).unwrap();
        let result = sweep(&docs, &mut state, None, &mut ShortCopula, &mut rng);
        assert_eq!(
            result,
            Err(LdaError::CopulaDimension { expected: 2, got: 1 })
        );
    }
}
