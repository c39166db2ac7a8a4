//! Tokenization and formatting preservation (§4.6).
//!
//! Splits the input into a flat sequence of tokens - ordinary words plus detached trailing
//! punctuation, which becomes its own token so it can act as model context for its neighbours -
//! alongside the whitespace run that followed each one in the original stream. Tokens and
//! whitespace runs share one index space by construction, so there is exactly one entry per
//! position in both, instead of driving them from two independently-incrementing counters.

use crate::variants::is_accent_eligible;

const FORMATTING_CHARS: &[char] = &['"', '\'', '„', '“', '…', '.', ',', ':', ';'];
const TERMINAL_PUNCTUATION: &[char] = &['.', ',', '?', '!'];

static LOWER_ACCENTED: &str = "áčďéěíňóřšťúůýž";
static UPPER_ACCENTED: &str = "ÁČĎÉĚÍŇÓŘŠŤÚŮÝŽ";

/// Lowercases `c`, additionally mapping the language's accented uppercase letters to their
/// accented lowercase counterparts (plain ASCII case folding alone would not touch those).
pub fn lower_case_char(c: char) -> char {
    if let Some(i) = UPPER_ACCENTED.chars().position(|u| u == c) {
        return LOWER_ACCENTED.chars().nth(i).unwrap();
    }
    c.to_lowercase().next().unwrap_or(c)
}

/// Inverse of [`lower_case_char`].
pub fn upper_case_char(c: char) -> char {
    if let Some(i) = LOWER_ACCENTED.chars().position(|l| l == c) {
        return UPPER_ACCENTED.chars().nth(i).unwrap();
    }
    c.to_uppercase().next().unwrap_or(c)
}

pub fn is_upper_case_char(c: char) -> bool {
    c.is_ascii_uppercase() || UPPER_ACCENTED.contains(c)
}

fn is_formatting_char(c: char) -> bool {
    FORMATTING_CHARS.contains(&c)
}

/// A token consisting *only* of formatting characters (`,` `.` `?` `!` `...` `:` `;`) is passed
/// through untouched and never consults the model for its own output.
pub fn is_formatting_string(s: &str) -> bool {
    matches!(s, "," | "." | "?" | "!" | "..." | ":" | ";")
}

/// Removes the enumerated formatting characters from `word`, unless the word is a single
/// character or consists entirely of formatting characters (both are passed through as-is).
fn delete_formatting_chars(word: &str) -> String {
    let char_count = word.chars().count();
    if char_count <= 1 {
        return word.to_string();
    }
    if word.chars().all(is_formatting_char) {
        return word.to_string();
    }
    word.chars().filter(|c| !is_formatting_char(*c)).collect()
}

/// Lowercases and strips formatting characters from `word`, producing the "bare" form used for
/// dictionary and model lookups.
fn prepare_bare_word(word: &str) -> String {
    delete_formatting_chars(word).chars().map(lower_case_char).collect()
}

/// If `word` is longer than one character and ends in a run of `. , ? !`, removes that run and
/// returns it; `word` is left with the run stripped. Returns an empty string if there is nothing
/// to detach.
fn detach_trailing_punctuation(word: &mut String) -> String {
    if word.chars().count() <= 1 {
        return String::new();
    }

    let split_at = word
        .char_indices()
        .rev()
        .take_while(|(_, c)| TERMINAL_PUNCTUATION.contains(c))
        .last()
        .map(|(i, _)| i);

    match split_at {
        Some(i) if i > 0 => {
            let punctuation = word.split_off(i);
            punctuation
        }
        _ => String::new(),
    }
}

/// One position in the token stream: a real word, or a detached run of terminal punctuation.
#[derive(Debug, Clone)]
pub struct Token {
    /// Original surface form (post punctuation-detachment, pre case/format stripping). Used to
    /// re-apply capitalization and embedded formatting to the restored word.
    pub surface: String,
    /// Lowercased, formatting-stripped form used for dictionary/model lookups.
    pub bare: String,
}

impl Token {
    fn plain(s: &str) -> Self {
        Self {
            surface: s.to_string(),
            bare: s.to_string(),
        }
    }

    /// A token the model is never consulted for directly (only as context for a neighbour): it
    /// is either pure punctuation, or has no accent-eligible letter at all.
    pub fn is_pass_through(&self) -> bool {
        is_formatting_string(&self.surface) || !self.bare.chars().any(is_accent_eligible)
    }
}

/// Splits `input` into whitespace-delimited `(token, trailing_whitespace)` pairs. Leading
/// whitespace before the first token is discarded, matching the source's stream-extraction
/// behaviour; trailing whitespace after the last token is preserved as that token's run (an
/// improvement over the source, which silently dropped it - see DESIGN.md).
fn split_with_gaps(input: &str) -> Vec<(&str, &str)> {
    let mut out = Vec::new();
    let mut rest = input;

    loop {
        let trimmed = rest.trim_start_matches(char::is_whitespace);
        if trimmed.is_empty() {
            break;
        }
        let tok_end = trimmed.find(char::is_whitespace).unwrap_or(trimmed.len());
        let (tok, after) = trimmed.split_at(tok_end);
        let ws_end = after.find(|c: char| !c.is_whitespace()).unwrap_or(after.len());
        let (ws, after2) = after.split_at(ws_end);
        out.push((tok, ws));
        rest = after2;
    }

    out
}

/// Tokenizes `input`, returning the token sequence and, for each token, the whitespace run that
/// followed it in the original stream. Both vectors are the same length; index *i* of one
/// corresponds to index *i* of the other.
pub fn tokenize(input: &str) -> (Vec<Token>, Vec<String>) {
    let mut tokens = Vec::new();
    let mut formats = Vec::new();

    for (raw, trailing_ws) in split_with_gaps(input) {
        if is_formatting_string(raw) {
            tokens.push(Token::plain(raw));
            formats.push(trailing_ws.to_string());
            continue;
        }

        let mut word = raw.to_string();
        let punctuation = detach_trailing_punctuation(&mut word);
        let bare = prepare_bare_word(&word);
        tokens.push(Token { surface: word, bare });

        if punctuation.is_empty() {
            formats.push(trailing_ws.to_string());
        } else {
            // The detached punctuation was glued to the word with no space in the original
            // stream, so the word itself gets a zero-width gap; the real trailing whitespace
            // moves to the punctuation token that now follows it.
            formats.push(String::new());
            tokens.push(Token::plain(&punctuation));
            formats.push(trailing_ws.to_string());
        }
    }

    (tokens, formats)
}

/// Re-applies the original surface form's capitalization and embedded formatting characters to
/// `restored` (the dictionary form chosen by the engine). A digit anywhere in `surface` means the
/// original token is numeric and is returned verbatim - numeric tokens are never "corrected".
pub fn apply_previous_formatting(surface: &str, restored: &str) -> String {
    if surface.chars().any(|c| c.is_ascii_digit()) {
        return surface.to_string();
    }

    let restored_chars: Vec<char> = restored.chars().collect();
    let mut out = String::with_capacity(surface.len());
    let mut j = 0usize;

    for c in surface.chars() {
        if is_formatting_char(c) {
            out.push(c);
        } else if is_upper_case_char(c) {
            let rc = restored_chars.get(j).copied().unwrap_or(c);
            out.push(upper_case_char(rc));
            j += 1;
        } else {
            let rc = restored_chars.get(j).copied().unwrap_or(c);
            out.push(rc);
            j += 1;
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenizes_plain_words() {
        let (tokens, formats) = tokenize("Cesky jazyk");
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].surface, "Cesky");
        assert_eq!(tokens[0].bare, "cesky");
        assert_eq!(formats[0], " ");
        assert_eq!(tokens[1].surface, "jazyk");
        assert_eq!(formats[1], "");
    }

    #[test]
    fn detaches_trailing_terminal_punctuation() {
        let (tokens, formats) = tokenize("Cesky jazyk.");
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[1].surface, "jazyk");
        assert_eq!(formats[1], "");
        assert_eq!(tokens[2].surface, ".");
        assert_eq!(formats[2], "");
    }

    #[test]
    fn pure_formatting_token_passes_through() {
        let (tokens, _) = tokenize("hello , world");
        assert_eq!(tokens[1].surface, ",");
        assert!(tokens[1].is_pass_through());
    }

    #[test]
    fn preserves_internal_whitespace_runs() {
        let (_, formats) = tokenize("a  b\tc");
        assert_eq!(formats[0], "  ");
        assert_eq!(formats[1], "\t");
    }

    #[test]
    fn preserves_trailing_whitespace_at_eof() {
        let (_, formats) = tokenize("a b  ");
        assert_eq!(formats[1], "  ");
    }

    #[test]
    fn apply_previous_formatting_preserves_uppercase_and_punctuation() {
        assert_eq!(apply_previous_formatting("Cesky", "český"), "Český");
        assert_eq!(apply_previous_formatting("jazyk", "jazyk"), "jazyk");
    }

    #[test]
    fn apply_previous_formatting_never_corrects_digits() {
        assert_eq!(apply_previous_formatting("123", "xyz"), "123");
    }

    #[test]
    fn round_trip_reconstructs_the_original_stream() {
        let input = "Cesky jazyk.  Ahoj\tsvete!";
        let (tokens, formats) = tokenize(input);
        let mut out = String::new();
        for (t, f) in tokens.iter().zip(formats.iter()) {
            out.push_str(&t.surface);
            out.push_str(f);
        }
        assert_eq!(out, input);
    }
}
