//! Interactive conflict resolution (§4.7).
//!
//! When the accumulator for a position has more than one plausible candidate, the user is asked
//! to pick. Interactive I/O from many concurrent restoration tasks would otherwise interleave
//! unreadably, so the prompt is serialized behind a single lock that lives on the engine, not as
//! a process-wide static (§9 design notes, "Global singletons").

use inquire::Select;
use parking_lot::Mutex;
use tracing::debug;

use crate::model::Accumulator;

pub const MAX_DISPLAYED_CANDIDATES: usize = 4;

/// Prunes an accumulator down to its count-ranked head: entries whose count exceeds the
/// count-weighted mean, capped at [`MAX_DISPLAYED_CANDIDATES`].
pub fn prune<T: Clone>(acc: &Accumulator<T>) -> Vec<(i32, T)> {
    let mean = acc.mean();
    acc.sorted_descending()
        .into_iter()
        .filter(|(count, _)| f64::from(*count) > mean)
        .take(MAX_DISPLAYED_CANDIDATES)
        .map(|(count, value)| (*count, value.clone()))
        .collect()
}

/// Owns the global prompt lock. One instance lives on the engine for the lifetime of a run.
pub struct ConflictPrompt {
    lock: Mutex<()>,
}

impl ConflictPrompt {
    pub fn new() -> Self {
        Self { lock: Mutex::new(()) }
    }

    /// Resolves a pruned candidate list for the token `s` surrounded by `p` and `n` (either side
    /// may be empty at a stream boundary). Skips the prompt entirely when only one candidate
    /// survives pruning. Returns `None` if the candidate list is empty or the prompt is cancelled.
    pub fn resolve<T: Clone>(
        &self,
        p: &str,
        s: &str,
        n: &str,
        candidates: Vec<(i32, T)>,
        render: impl Fn(&T) -> String,
    ) -> Option<T> {
        match candidates.len() {
            0 => None,
            1 => Some(candidates.into_iter().next().unwrap().1),
            _ => {
                let _guard = self.lock.lock();
                let options: Vec<String> = candidates
                    .iter()
                    .map(|(count, value)| format!("{} (count {count})", render(value)))
                    .collect();
                debug!(p, s, n, candidate_count = options.len(), "prompting for conflict resolution");

                let chosen = Select::new(&format!("{p} [{s}] {n} - choose the restored form:"), options.clone())
                    .prompt()
                    .ok()?;
                let index = options.iter().position(|o| o == &chosen)?;
                candidates.into_iter().nth(index).map(|(_, value)| value)
            }
        }
    }
}

impl Default for ConflictPrompt {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn acc_of(entries: &[(i32, &'static str)]) -> Accumulator<&'static str> {
        let mut acc = Accumulator::default();
        for (count, value) in entries {
            acc.push_for_test(*count, *value);
        }
        acc
    }

    #[test]
    fn prunes_to_entries_above_the_mean_capped_at_four() {
        let acc = acc_of(&[(10, "a"), (9, "b"), (8, "c"), (1, "d"), (1, "e"), (1, "f")]);
        let pruned = prune(&acc);
        assert!(pruned.len() <= MAX_DISPLAYED_CANDIDATES);
        assert!(pruned.iter().all(|(count, _)| *count > 1));
    }

    #[test]
    fn single_surviving_candidate_needs_no_prompt() {
        let prompt = ConflictPrompt::new();
        let result = prompt.resolve("p", "s", "n", vec![(5, "only")], |v| v.to_string());
        assert_eq!(result, Some("only"));
    }

    #[test]
    fn empty_candidates_resolve_to_none() {
        let prompt = ConflictPrompt::new();
        let result: Option<&str> = prompt.resolve("p", "s", "n", Vec::new(), |v| v.to_string());
        assert_eq!(result, None);
    }
}
