use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;
use tokio::fs;

/// Shortest word accepted unless configured otherwise
pub const DEFAULT_MIN_WORD_LENGTH: usize = 2;

#[derive(Debug, Error)]
pub enum DictionaryError {
    #[error("failed to read word list: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed word list entry on line {line}: {entry:?}")]
    MalformedEntry { line: usize, entry: String },
}

/// Immutable set of admissible words, shared read-only by every session.
#[derive(Debug, Clone)]
pub struct Dictionary {
    words: HashSet<String>,
    min_word_length: usize,
}

impl Dictionary {
    /// Load dictionary from a file
    pub async fn load<P: AsRef<Path>>(
        path: P,
        min_word_length: usize,
    ) -> Result<Self, DictionaryError> {
        let content = fs::read_to_string(path).await?;
        let dictionary = Self::parse(&content, min_word_length)?;

        tracing::info!("Loaded {} words into dictionary", dictionary.len());

        Ok(dictionary)
    }

    /// Parse a newline separated word list. Blank lines and `#` comments are skipped.
    pub fn parse(content: &str, min_word_length: usize) -> Result<Self, DictionaryError> {
        let mut words = HashSet::new();

        for (index, raw) in content.lines().enumerate() {
            let entry = raw.trim();
            if entry.is_empty() || entry.starts_with('#') {
                continue;
            }

            if !entry.chars().all(|ch| ch.is_ascii_alphabetic()) {
                return Err(DictionaryError::MalformedEntry {
                    line: index + 1,
                    entry: entry.to_string(),
                });
            }

            if entry.len() >= min_word_length {
                words.insert(entry.to_ascii_uppercase());
            }
        }

        Ok(Self {
            words,
            min_word_length,
        })
    }

    /// Build a dictionary from an in-memory list of words
    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            words: words
                .into_iter()
                .map(|word| word.as_ref().trim().to_ascii_uppercase())
                .filter(|word| word.len() >= DEFAULT_MIN_WORD_LENGTH)
                .collect(),
            min_word_length: DEFAULT_MIN_WORD_LENGTH,
        }
    }

    /// Create an empty dictionary (for testing)
    pub fn empty() -> Self {
        Self {
            words: HashSet::new(),
            min_word_length: DEFAULT_MIN_WORD_LENGTH,
        }
    }

    /// Whole-word membership, case-insensitive.
    /// Words shorter than the configured minimum are never valid.
    pub fn is_valid(&self, word: &str) -> bool {
        if word.is_empty() || word.chars().count() < self.min_word_length {
            return false;
        }

        self.words.contains(&word.to_ascii_uppercase())
    }

    pub fn min_word_length(&self) -> usize {
        self.min_word_length
    }

    /// Get the number of words in the dictionary
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Check if dictionary is empty
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}
