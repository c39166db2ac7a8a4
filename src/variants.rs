//! Candidate generation (variant expansion, §4.4).
//!
//! Given a lowercased, formatting-stripped surface form, enumerates every dictionary word
//! reachable by substituting zero or more of its accent-eligible letters with one of their
//! accented counterparts. The plain-letter → accented-letter table is the only
//! language-specific knowledge in this module; swapping languages means swapping this table.

use std::collections::HashSet;

use crate::dictionary::Dictionary;

/// `(plain_letter, accented_variants)`. Czech is the reference language; a different language
/// would supply its own table of this shape and nothing else in this module would change.
pub static ACCENT_TABLE: &[(char, &[char])] = &[
    ('a', &['á']),
    ('c', &['č']),
    ('d', &['ď']),
    ('e', &['é', 'ě']),
    ('i', &['í']),
    ('n', &['ň']),
    ('o', &['ó']),
    ('r', &['ř']),
    ('s', &['š']),
    ('t', &['ť']),
    ('u', &['ú', 'ů']),
    ('y', &['ý']),
    ('z', &['ž']),
];

fn accented_variants_of(c: char) -> &'static [char] {
    ACCENT_TABLE
        .iter()
        .find(|(plain, _)| *plain == c)
        .map(|(_, variants)| *variants)
        .unwrap_or(&[])
}

/// An ASCII letter is "accent-eligible"; this holds even for letters with no entry in
/// [`ACCENT_TABLE`] (they simply generate no variants), matching the source's `can_have_diacritics`.
pub fn is_accent_eligible(c: char) -> bool {
    c.is_ascii_alphabetic()
}

/// True if `word` contains at least one accent-eligible letter.
pub fn has_accent_eligible_letter(word: &str) -> bool {
    word.chars().any(is_accent_eligible)
}

/// Returns every dictionary word reachable from `word` by substituting some subset of its
/// accent-eligible letters with an accented counterpart, plus `word` itself.
pub fn variants_of(dict: &Dictionary, word: &str) -> HashSet<String> {
    let mut out = HashSet::new();
    out.insert(word.to_string());

    let chars: Vec<char> = word.chars().collect();
    let mut scratch = chars.clone();
    expand(dict, &mut scratch, 0, &mut out);
    out
}

fn expand(dict: &Dictionary, chars: &mut [char], start: usize, out: &mut HashSet<String>) {
    for i in start..chars.len() {
        if !is_accent_eligible(chars[i]) {
            continue;
        }

        for &variant in accented_variants_of(chars[i]) {
            let original = chars[i];
            chars[i] = variant;

            let candidate: String = chars.iter().collect();
            if dict.word_to_id(&candidate) != 0 {
                out.insert(candidate);
            }

            expand(dict, chars, i + 1, out);

            chars[i] = original;
        }
    }
}
