//! The bidirectional word map ("dictionary").
//!
//! One word per line on disk; the 1-based line number becomes the word's id. Id `0` is reserved
//! to mean "unknown word" and is never assigned to a real entry.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::DiacError;

/// Immutable bijection between word strings and word ids, built once at load time.
///
/// Both directions are O(1) expected. Words are held once, in `words`; `word_to_id` and
/// `id_to_word` (implicit via `words[id - 1]`) both index into that single arena so the strings
/// are never duplicated.
#[derive(Debug, Default)]
pub struct Dictionary {
    words: Vec<String>,
    word_to_id: HashMap<String, u32>,
}

impl Dictionary {
    /// Load a dictionary file: one word per line, trailing `\r` stripped, first line is id 1.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DiacError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| DiacError::Dictionary {
            path: path.to_path_buf(),
            source,
        })?;

        let mut words = Vec::new();
        let mut word_to_id = HashMap::new();

        for line in BufReader::new(file).lines() {
            let mut line = line.map_err(|source| DiacError::Dictionary {
                path: path.to_path_buf(),
                source,
            })?;
            if line.ends_with('\r') {
                line.pop();
            }

            let id = (words.len() + 1) as u32;
            word_to_id.insert(line.clone(), id);
            words.push(line);
        }

        Ok(Self { words, word_to_id })
    }

    /// Returns the word id for `word`, or `0` if unknown.
    pub fn word_to_id(&self, word: &str) -> u32 {
        self.word_to_id.get(word).copied().unwrap_or(0)
    }

    /// Returns the word for a non-zero id. Panics on out-of-range ids, which would indicate a
    /// model/dictionary mismatch (the invariant in §3: every id in a model record must appear in
    /// the dictionary).
    pub fn id_to_word(&self, id: u32) -> &str {
        &self.words[(id - 1) as usize]
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}
