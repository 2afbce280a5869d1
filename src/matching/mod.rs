// src/matching/mod.rs - Approximate string matching for obfuscated spam
//
// Spam bots evade exact-string filters by inserting combining accent marks,
// zero-width characters, and homoglyphs from non-Latin scripts. The matchers
// here tolerate a bounded number of such tricks while still rejecting
// messages that differ in actual letters.

/// Collapse runs of whitespace to single spaces and lowercase.
///
/// The number of spaces per message varies between sightings of the same
/// campaign, so every rule compares against this normal form.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Remove all whitespace and lowercase.
pub fn strip_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<String>().to_lowercase()
}

/// True if `observed` begins with a tolerably-obfuscated variant of `expected`.
///
/// `observed` is whitespace-collapsed and lowercased first; `expected` is
/// assumed to already be in that form. Accepts when the positional match count
/// exceeds `expected.len() - max_mismatches`.
pub fn fuzzy_starts_with(observed: &str, expected: &str, max_mismatches: usize) -> bool {
    let observed: Vec<char> = collapse_whitespace(observed).chars().collect();
    let expected: Vec<char> = expected.chars().collect();
    fuzzy_match_at(&observed, &expected, max_mismatches)
}

/// True if any position of `observed` begins a tolerably-obfuscated variant of
/// `expected`. Same tolerance semantics as [`fuzzy_starts_with`].
pub fn fuzzy_contains(observed: &str, expected: &str, max_mismatches: usize) -> bool {
    let observed: Vec<char> = collapse_whitespace(observed).chars().collect();
    let expected: Vec<char> = expected.chars().collect();
    if expected.is_empty() {
        return true;
    }

    let mut start = 0;
    while observed.len() - start >= expected.len() {
        if fuzzy_match_at(&observed[start..], &expected, max_mismatches) {
            return true;
        }
        start += 1;
    }

    false
}

/// Positional tolerant match of `expected` against the head of `observed`.
///
/// Walks `expected` with a running `offset` into `observed`:
/// - the characters agree at the shifted position: count a match;
/// - the next observed character agrees instead: count a match and shift all
///   subsequent positions by one (an inserted character, e.g. a combining
///   accent mark riding on the previous letter);
/// - anything else: the position counts nothing and the walk continues.
fn fuzzy_match_at(observed: &[char], expected: &[char], max_mismatches: usize) -> bool {
    if observed.len() < expected.len() {
        return false;
    }

    let mut matches = 0usize;
    let mut offset = 0usize;
    for (i, &want) in expected.iter().enumerate() {
        let at = i + offset;
        if at >= observed.len() {
            break;
        }

        if observed[at] == want {
            matches += 1;
        } else if at + 1 < observed.len() && observed[at + 1] == want {
            matches += 1;
            offset += 1;
        }
    }

    matches + max_mismatches > expected.len()
}
