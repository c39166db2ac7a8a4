//! The offset index: word id -> record index of that word's trigram block in the model file.
//!
//! On-disk format is alternating `key\ncount\n` lines. The loaded value for `key_i` is
//! `count_{i-1}`, not `count_i` — the *previous* entry's count, with an implicit `count_0 = 0`.
//! This off-by-one is preserved verbatim for on-disk compatibility with prepared model files (see
//! the Open Question in the design notes); it is not a bug to "fix".

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::DiacError;

#[derive(Debug, Default)]
pub struct OffsetIndex {
    offsets: HashMap<u32, u32>,
}

impl OffsetIndex {
    /// Builds an index directly from record indices, bypassing the on-disk off-by-one format.
    /// Used by tests that construct model fixtures in memory.
    #[cfg(test)]
    pub fn from_map(offsets: HashMap<u32, u32>) -> Self {
        Self { offsets }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, DiacError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| DiacError::OffsetIndex {
            path: path.to_path_buf(),
            source,
        })?;

        let map_err = |source| DiacError::OffsetIndex {
            path: path.to_path_buf(),
            source,
        };

        let mut lines = BufReader::new(file).lines();
        let mut offsets = HashMap::new();
        let mut prev_count: u32 = 0;

        loop {
            let Some(key_line) = lines.next() else {
                break;
            };
            let key_line = key_line.map_err(map_err)?;
            let Some(count_line) = lines.next() else {
                break;
            };
            let count_line = count_line.map_err(map_err)?;

            let key: u32 = key_line.trim().parse().map_err(|_| {
                DiacError::OffsetIndex {
                    path: path.to_path_buf(),
                    source: std::io::Error::new(
                        std::io::ErrorKind::InvalidData,
                        "malformed offset index key",
                    ),
                }
            })?;
            let count: u32 = count_line.trim().parse().map_err(|_| DiacError::OffsetIndex {
                path: path.to_path_buf(),
                source: std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    "malformed offset index count",
                ),
            })?;

            offsets.insert(key, prev_count);
            prev_count = count;
        }

        Ok(Self { offsets })
    }

    /// Returns the record index of the first record mentioning `mid` as the middle word, if any.
    pub fn get(&self, mid: u32) -> Option<u32> {
        self.offsets.get(&mid).copied()
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }
}
