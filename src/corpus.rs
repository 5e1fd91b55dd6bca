//! Turning raw text into chunked word-id documents.

use std::collections::{HashMap, HashSet};

use crate::{Chunk, Document, WordId};

fn default_stopwords() -> HashSet<&'static str> {
    [
        "a","an","and","are","as","at","be","by","for","from","has","in",
        "is","it","of","on","or","that","the","to","was","were","will","with",
        "http","https","ftp","s3"
    ]
    .into_iter()
    .collect()
}

fn tokenize(text: &str, stop: &HashSet<&'static str>) -> Vec<String> {
    text.to_lowercase()
        .chars()
        .map(|c| if c.is_alphabetic() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .filter(|tok| tok.len() >= 2 && !stop.contains(*tok))
        .map(|tok| tok.to_string())
        .collect()
}

/// Sentence-like chunks of `text`, each tokenized; empty chunks are dropped.
pub fn chunk_text(text: &str) -> Vec<Vec<String>> {
    let stop = default_stopwords();
    text.split(|c| matches!(c, '.' | '!' | '?' | ';' | '\n'))
        .map(|sentence| tokenize(sentence, &stop))
        .filter(|tokens| !tokens.is_empty())
        .collect()
}

/// Word ↔ id mapping in first-seen order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Vocabulary {
    words: Vec<String>,
    word_to_id: HashMap<String, WordId>,
}

impl Vocabulary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id of `word`, adding it if unseen.
    pub fn insert(&mut self, word: &str) -> WordId {
        if let Some(&id) = self.word_to_id.get(word) {
            return id;
        }
        let id = self.words.len();
        self.words.push(word.to_string());
        self.word_to_id.insert(word.to_string(), id);
        id
    }

    pub fn id(&self, word: &str) -> Option<WordId> {
        self.word_to_id.get(word).copied()
    }

    pub fn word(&self, id: WordId) -> Option<&str> {
        self.words.get(id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Corpus {
    pub documents: Vec<Document>,
    pub vocabulary: Vocabulary,
}

impl Corpus {
    /// Tokenize and chunk every text, building the vocabulary on the way.
    pub fn from_texts(texts: &[&str]) -> Self {
        let mut vocabulary = Vocabulary::new();
        let documents = texts
            .iter()
            .map(|text| {
                chunk_text(text)
                    .into_iter()
                    .map(|tokens| tokens.iter().map(|t| vocabulary.insert(t)).collect::<Chunk>())
                    .collect::<Document>()
            })
            .collect();
        Self {
            documents,
            vocabulary,
        }
    }

    /// Encode `texts` against this vocabulary. Unknown words are skipped.
    pub fn encode(&self, texts: &[&str]) -> Vec<Document> {
        texts
            .iter()
            .map(|text| {
                chunk_text(text)
                    .into_iter()
                    .map(|tokens| {
                        tokens
                            .iter()
                            .filter_map(|t| self.vocabulary.id(t))
                            .collect::<Chunk>()
                    })
                    .filter(|chunk| !chunk.is_empty())
                    .collect()
            })
            .collect()
    }

    /// Move every `every`-th document (1-based) out as held-out data.
    pub fn split_held_out(&mut self, every: usize) -> Vec<Document> {
        if every == 0 {
            return Vec::new();
        }
        let (train, held_out): (Vec<_>, Vec<_>) = std::mem::take(&mut self.documents)
            .into_iter()
            .enumerate()
            .partition(|(i, _)| (i + 1) % every != 0);
        self.documents = train.into_iter().map(|(_, doc)| doc).collect();
        held_out.into_iter().map(|(_, doc)| doc).collect()
    }

    pub fn n_tokens(&self) -> usize {
        self.documents.iter().flatten().map(Vec::len).sum()
    }
}
