//! Triplet pipeline scheduler (§4.8, §5).
//!
//! One driver pass tokenizes the whole input, then dispatches one restoration task per position
//! onto rayon's global pool, each carrying its own `(p, s, n)` context by value - never a shared
//! reference, since the driver's rolling window would otherwise race with a task still reading
//! it (§9 design notes). `rayon::scope` is the wait-for-everyone barrier: it does not return
//! until every spawned task has completed, matching "the driver waits for every outstanding task
//! to complete before reassembly". rayon's fixed-size global pool is what bounds the otherwise
//! one-task-per-token concurrency the design allows.

use std::collections::HashSet;

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::engine::Engine;
use crate::tokenizer::{apply_previous_formatting, tokenize};

/// Token positions whose accumulator ended up empty at every fallback level are flagged as
/// "potentially foreign"; when they exceed this fraction of the stream, callers are expected to
/// print the §7 advisory.
pub const FOREIGN_WORD_ADVISORY_THRESHOLD: f64 = 0.25;

pub struct PipelineOutput {
    pub text: String,
    pub token_count: usize,
    pub foreign_words: HashSet<String>,
}

impl PipelineOutput {
    pub fn foreign_word_ratio(&self) -> f64 {
        if self.token_count == 0 {
            return 0.0;
        }
        self.foreign_words.len() as f64 / self.token_count as f64
    }

    pub fn exceeds_foreign_word_advisory(&self) -> bool {
        self.foreign_word_ratio() > FOREIGN_WORD_ADVISORY_THRESHOLD
    }
}

pub fn run(engine: &Engine, input: &str) -> PipelineOutput {
    let (tokens, formats) = tokenize(input);
    let token_count = tokens.len();
    debug!(token_count, "dispatching restoration pipeline");

    let results: Mutex<Vec<Option<String>>> = Mutex::new(vec![None; token_count]);
    let foreign: Mutex<HashSet<String>> = Mutex::new(HashSet::new());

    rayon::scope(|scope| {
        for i in 0..token_count {
            if tokens[i].is_pass_through() {
                // Pure punctuation or a token with no accent-eligible letter: §4.6 says the
                // model is never consulted for these, so skip dispatching a task entirely
                // rather than relying on `Engine::restore`'s own short-circuit to no-op.
                results.lock()[i] = Some(tokens[i].surface.clone());
                continue;
            }

            let p = (i > 0).then(|| tokens[i - 1].bare.clone());
            let s = tokens[i].bare.clone();
            let n = (i + 1 < token_count).then(|| tokens[i + 1].bare.clone());
            let surface = tokens[i].surface.clone();
            let results = &results;
            let foreign = &foreign;

            scope.spawn(move |_| {
                let restored = engine
                    .restore(p.as_deref(), &s, n.as_deref(), foreign)
                    .unwrap_or_else(|err| {
                        warn!(position = i, %err, "model read failed for token; emitting verbatim");
                        surface.clone()
                    });
                let formatted = apply_previous_formatting(&surface, &restored);
                results.lock()[i] = Some(formatted);
            });
        }
    });

    let results = results.into_inner();
    debug_assert!(
        results.iter().all(Option::is_some),
        "internal multithreading loss: a dispatched task never wrote its position"
    );

    let mut text = String::with_capacity(input.len());
    for (i, formatted) in results.into_iter().enumerate() {
        text.push_str(&formatted.unwrap_or_default());
        text.push_str(&formats[i]);
    }

    PipelineOutput { text, token_count, foreign_words: foreign.into_inner() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dictionary::Dictionary;
    use crate::offset_index::OffsetIndex;
    use std::collections::HashMap;
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
        let resolved: Vec<(i32, i32, i32, i32)> = records
            .iter()
            .map(|(mid, prev, next, count)| {
                (dict.word_to_id(mid) as i32, dict.word_to_id(prev) as i32, dict.word_to_id(next) as i32, *count)
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
    fn restores_a_short_sentence_end_to_end() {
        let dict = dict_with(&["cesky", "český", "jazyk", "."]);
        // mid=jazyk: its block records which prev-word most commonly precedes it, which is what
        // both the first token's pair-right lookup and the second token's triple lookup consult.
        let (model, offsets) = model_with(&dict, &[("jazyk", "český", ".", 7)]);
        let engine = crate::engine::Engine::new(dict, offsets, model.path().to_path_buf(), None, false);

        let result = run(&engine, "Cesky jazyk.");
        assert_eq!(result.text, "Český jazyk.");
    }

    #[test]
    fn empty_input_produces_empty_output() {
        let dict = dict_with(&[]);
        let (model, offsets) = model_with(&dict, &[]);
        let engine = crate::engine::Engine::new(dict, offsets, model.path().to_path_buf(), None, false);

        let result = run(&engine, "");
        assert_eq!(result.text, "");
        assert_eq!(result.token_count, 0);
        assert_eq!(result.foreign_word_ratio(), 0.0);
    }

    #[test]
    fn model_free_text_passes_through_unchanged() {
        let dict = dict_with(&[]);
        let (model, offsets) = model_with(&dict, &[]);
        let engine = crate::engine::Engine::new(dict, offsets, model.path().to_path_buf(), None, false);

        let result = run(&engine, "hi hi hi");
        assert_eq!(result.text, "hi hi hi");
    }

    #[test]
    fn digit_tokens_are_never_corrected() {
        let dict = dict_with(&["kun", "kůň"]);
        let (model, offsets) = model_with(&dict, &[("kůň", "kun", "", 1)]);
        let engine = crate::engine::Engine::new(dict, offsets, model.path().to_path_buf(), None, false);

        let result = run(&engine, "123 kun");
        assert_eq!(result.text, "123 kůň");
    }

    #[test]
    fn foreign_word_ratio_crosses_the_advisory_threshold() {
        let dict = dict_with(&[]);
        let (model, offsets) = model_with(&dict, &[]);
        let engine = crate::engine::Engine::new(dict, offsets, model.path().to_path_buf(), None, false);

        let result = run(&engine, "xxx yyy zzz");
        assert!(result.exceeds_foreign_word_advisory());
    }
}
