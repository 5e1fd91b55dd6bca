use thiserror::Error;

/// Errors that can occur while building or sampling a copula LDA model
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LdaError {
    #[error("Number of topics must be positive")]
    InvalidTopicCount,

    #[error("Vocabulary size must be positive")]
    EmptyVocabulary,

    #[error("Invalid hyperparameter: {0}")]
    InvalidParameter(String),

    #[error("Word id {word} at document {doc}, chunk {chunk}, position {position} is outside the vocabulary of {n_words} words")]
    WordOutOfRange {
        doc: usize,
        chunk: usize,
        position: usize,
        word: usize,
        n_words: usize,
    },

    #[error("Unsupported copula family: {0}")]
    UnknownCopulaFamily(String),

    #[error("Invalid parameter {parameter} for {family} copula: {reason}")]
    InvalidCopulaParameter {
        family: String,
        parameter: f64,
        reason: String,
    },

    #[error("Copula returned {got} values for a chunk of {expected} tokens")]
    CopulaDimension { expected: usize, got: usize },

    #[error("Copula sample is not a value in [0, 1]: {0}")]
    InvalidCopulaSample(f64),

    #[error("Copula sampling failed: {0}")]
    CopulaFailure(String),

    #[error("Topic distribution for word {word} in document {doc} has no probability mass")]
    DegenerateDistribution { doc: usize, word: usize },

    #[error("Corpus contains no tokens")]
    EmptyCorpus,

    #[error("Sampler state is inconsistent after a failed epoch; rebuild the model")]
    CorruptedState,
}

pub type Result<T> = std::result::Result<T, LdaError>;
