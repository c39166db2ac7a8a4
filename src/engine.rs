//! The restoration engine: ties the dictionary, offset index, model reader and candidate
//! generation together and implements the per-token decision tree of §4.5.
//!
//! Dictionary, offset index and model filename are constructor dependencies rather than process
//! globals (§9 design notes, "Global singletons"); the conflict-prompt lock is likewise owned by
//! the engine instance, so any number of engines (e.g. in tests) never contend with each other.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::trace;

use crate::cache::PagedCache;
use crate::conflict::{prune, ConflictPrompt};
use crate::dictionary::Dictionary;
use crate::error::DiacError;
use crate::model::{lookup_pair, lookup_single, lookup_triple, Accumulator};
use crate::offset_index::OffsetIndex;
use crate::reader::BinaryReader;
use crate::variants::{has_accent_eligible_letter, variants_of};

pub struct Engine {
    dictionary: Dictionary,
    offsets: OffsetIndex,
    model_path: PathBuf,
    cache: Option<Arc<PagedCache>>,
    conflict_mode: bool,
    prompt: ConflictPrompt,
}

impl Engine {
    pub fn new(
        dictionary: Dictionary,
        offsets: OffsetIndex,
        model_path: PathBuf,
        cache: Option<Arc<PagedCache>>,
        conflict_mode: bool,
    ) -> Self {
        Self {
            dictionary,
            offsets,
            model_path,
            cache,
            conflict_mode,
            prompt: ConflictPrompt::new(),
        }
    }

    pub fn dictionary(&self) -> &Dictionary {
        &self.dictionary
    }

    fn reader(&self) -> Result<BinaryReader, DiacError> {
        match &self.cache {
            Some(cache) => Ok(BinaryReader::cached(Arc::clone(cache))),
            None => BinaryReader::open_stream(&self.model_path),
        }
    }

    /// Dictionary ids of every variant of `word`, dropping the unknown-word id 0 (§4.5 step 2).
    fn variant_ids(&self, word: &str) -> Vec<u32> {
        variants_of(&self.dictionary, word)
            .into_iter()
            .map(|variant| self.dictionary.word_to_id(&variant))
            .filter(|&id| id != 0)
            .collect()
    }

    /// Restores the middle token `s` given optional left context `p` and right context `n`.
    /// `p`/`n` are `None` at the respective ends of the stream (§4.5 edge cases).
    pub fn restore(
        &self,
        p: Option<&str>,
        s: &str,
        n: Option<&str>,
        foreign: &Mutex<HashSet<String>>,
    ) -> Result<String, DiacError> {
        if !has_accent_eligible_letter(s) {
            return Ok(s.to_string());
        }

        let mut reader = self.reader()?;
        let s_ids = self.variant_ids(s);

        let chosen_id = match (p, n) {
            (Some(p), Some(n)) => {
                let p_ids = self.variant_ids(p);
                let n_ids = self.variant_ids(n);

                let mut triple: Accumulator<u32> = Accumulator::default();
                for &p_id in &p_ids {
                    for &s_id in &s_ids {
                        for &n_id in &n_ids {
                            triple.extend(lookup_triple(&mut reader, &self.offsets, s_id, p_id, n_id));
                        }
                    }
                }

                if !triple.is_empty() {
                    self.resolve(triple, p, s, n)
                } else {
                    self.restore_via_pair_fallback(&mut reader, &p_ids, &s_ids, &n_ids, p, s, n)
                }
            }
            (Some(p), None) => {
                let p_ids = self.variant_ids(p);
                let left = self.accumulate_pair_left(&mut reader, &p_ids, &s_ids);
                if left.is_empty() {
                    self.restore_single(&mut reader, &s_ids, p, s, "")
                } else {
                    self.resolve(left, p, s, "")
                }
            }
            (None, Some(n)) => {
                let n_ids = self.variant_ids(n);
                let right = self.accumulate_pair_right(&mut reader, &s_ids, &n_ids);
                if right.is_empty() {
                    self.restore_single(&mut reader, &s_ids, "", s, n)
                } else {
                    self.resolve(right, "", s, n)
                }
            }
            (None, None) => self.restore_single(&mut reader, &s_ids, "", s, ""),
        };

        match chosen_id {
            Some(id) => Ok(self.dictionary.id_to_word(id).to_string()),
            None => {
                foreign.lock().insert(s.to_string());
                Ok(s.to_string())
            }
        }
    }

    fn accumulate_pair_left(&self, reader: &mut BinaryReader, p_ids: &[u32], s_ids: &[u32]) -> Accumulator<u32> {
        let mut acc: Accumulator<u32> = Accumulator::default();
        for &p_id in p_ids {
            for &s_id in s_ids {
                // (prev=p, mid=s): s is the mid component of the pair.
                acc.extend(lookup_pair(reader, &self.offsets, s_id, p_id).map_value(|(_p, s)| s));
            }
        }
        acc
    }

    fn accumulate_pair_right(&self, reader: &mut BinaryReader, s_ids: &[u32], n_ids: &[u32]) -> Accumulator<u32> {
        let mut acc: Accumulator<u32> = Accumulator::default();
        for &s_id in s_ids {
            for &n_id in n_ids {
                // (prev=s, mid=n): s stands in as the left-context slot, so it is the prev component.
                acc.extend(lookup_pair(reader, &self.offsets, n_id, s_id).map_value(|(s, _n)| s));
            }
        }
        acc
    }

    fn restore_via_pair_fallback(
        &self,
        reader: &mut BinaryReader,
        p_ids: &[u32],
        s_ids: &[u32],
        n_ids: &[u32],
        p: &str,
        s: &str,
        n: &str,
    ) -> Option<u32> {
        let left = self.accumulate_pair_left(reader, p_ids, s_ids);
        let right = self.accumulate_pair_right(reader, s_ids, n_ids);

        let left_top = left.best().map(|(count, _)| *count);
        let right_top = right.best().map(|(count, _)| *count);

        match (left_top, right_top) {
            (None, None) => self.restore_single(reader, s_ids, p, s, n),
            (Some(lc), Some(rc)) if rc > lc => self.resolve(right, p, s, n),
            (Some(_), _) => self.resolve(left, p, s, n),
            (None, Some(_)) => self.resolve(right, p, s, n),
        }
    }

    fn restore_single(&self, reader: &mut BinaryReader, s_ids: &[u32], p: &str, s: &str, n: &str) -> Option<u32> {
        let mut acc: Accumulator<u32> = Accumulator::default();
        for &s_id in s_ids {
            acc.extend(lookup_single(reader, &self.offsets, s_id));
        }
        if acc.is_empty() {
            trace!(p, s, n, "no model coverage at any level; treating as potentially foreign");
            None
        } else {
            self.resolve(acc, p, s, n)
        }
    }

    /// Picks the winning candidate: the best entry directly in default mode, or via the conflict
    /// prompt when conflict mode is enabled and more than one candidate survives pruning (§4.7).
    fn resolve(&self, acc: Accumulator<u32>, p: &str, s: &str, n: &str) -> Option<u32> {
        if !self.conflict_mode {
            return acc.best().map(|(_, id)| *id);
        }

        let candidates = prune(&acc);
        self.prompt.resolve(p, s, n, candidates, |id| self.dictionary.id_to_word(*id).to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn dict_with(words: &[&str]) -> Dictionary {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        for w in words {
            writeln!(f, "{w}").unwrap();
        }
        f.flush().unwrap();
        Dictionary::load(f.path()).unwrap()
    }

    fn model_with(dict: &Dictionary, records: &[(&str, &str, &str, i32)]) -> (tempfile::NamedTempFile, OffsetIndex) {
        use std::collections::HashMap;
        let resolved: Vec<(i32, i32, i32, i32)> = records
            .iter()
            .map(|(mid, prev, next, count)| {
                (
                    dict.word_to_id(mid) as i32,
                    dict.word_to_id(prev) as i32,
                    dict.word_to_id(next) as i32,
                    *count,
                )
            })
            .collect();

        let mut f = tempfile::NamedTempFile::new().unwrap();
        let mut offsets_map = HashMap::new();
        for (i, (mid, prev, next, count)) in resolved.iter().enumerate() {
            f.write_all(&mid.to_le_bytes()).unwrap();
            f.write_all(&prev.to_le_bytes()).unwrap();
            f.write_all(&next.to_le_bytes()).unwrap();
            f.write_all(&count.to_le_bytes()).unwrap();
            offsets_map.entry(*mid as u32).or_insert(i as u32);
        }
        f.flush().unwrap();
        (f, OffsetIndex::from_map(offsets_map))
    }

    #[test]
    fn restores_via_triple_lookup() {
        let dict = dict_with(&["cesky", "český", "jazyk", "."]);
        let (model, offsets) = model_with(&dict, &[("český", "cesky", "jazyk", 7)]);
        let engine = Engine::new(dict, offsets, model.path().to_path_buf(), None, false);
        let foreign = Mutex::new(HashSet::new());

        let restored = engine.restore(Some("cesky"), "cesky", Some("jazyk"), &foreign).unwrap();
        assert_eq!(restored, "český");
        assert!(foreign.lock().is_empty());
    }

    #[test]
    fn falls_back_to_single_word_mode_with_no_pair_coverage() {
        let dict = dict_with(&["mama", "máma"]);
        let (model, offsets) = model_with(&dict, &[("máma", "", "", 5)]);
        let engine = Engine::new(dict, offsets, model.path().to_path_buf(), None, false);
        let foreign = Mutex::new(HashSet::new());

        let restored = engine.restore(None, "mama", None, &foreign).unwrap();
        assert_eq!(restored, "máma");
        assert!(foreign.lock().is_empty());
    }

    #[test]
    fn no_model_or_dictionary_coverage_is_recorded_as_potentially_foreign() {
        let dict = dict_with(&["mama", "máma"]);
        let (model, offsets) = model_with(&dict, &[]);
        let engine = Engine::new(dict, offsets, model.path().to_path_buf(), None, false);
        let foreign = Mutex::new(HashSet::new());

        let restored = engine.restore(None, "emu", None, &foreign).unwrap();
        assert_eq!(restored, "emu");
        assert!(foreign.lock().contains("emu"));
    }

    #[test]
    fn no_accent_eligible_letters_short_circuits() {
        let dict = dict_with(&[]);
        let (model, offsets) = model_with(&dict, &[]);
        let engine = Engine::new(dict, offsets, model.path().to_path_buf(), None, false);
        let foreign = Mutex::new(HashSet::new());

        let restored = engine.restore(None, "123", None, &foreign).unwrap();
        assert_eq!(restored, "123");
        assert!(foreign.lock().is_empty());
    }

    #[test]
    fn last_token_uses_left_pair_mode() {
        let dict = dict_with(&["kun", "kůň"]);
        let (model, offsets) = model_with(&dict, &[("kůň", "kun", "", 3)]);
        let engine = Engine::new(dict, offsets, model.path().to_path_buf(), None, false);
        let foreign = Mutex::new(HashSet::new());

        let restored = engine.restore(Some("kun"), "kun", None, &foreign).unwrap();
        assert_eq!(restored, "kůň");
    }
}
