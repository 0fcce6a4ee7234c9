//! Small text helpers shared by the in-memory primitives.

use std::collections::HashSet;

/// Trigram similarity between two strings, 0.0..=1.0. Case-insensitive;
/// strings shorter than three characters fall back to equality/containment.
pub fn trigram_similarity(a: &str, b: &str) -> f32 {
    let a = a.to_lowercase();
    let b = b.to_lowercase();
    if a == b {
        return 1.0;
    }
    if a.len() < 3 || b.len() < 3 {
        return if !a.is_empty() && !b.is_empty() && (a.contains(&b) || b.contains(&a)) {
            0.5
        } else {
            0.0
        };
    }

    let ta = trigrams(&a);
    let tb = trigrams(&b);
    if ta.is_empty() || tb.is_empty() {
        return 0.0;
    }
    let shared = ta.intersection(&tb).count() as f32;
    let union = ta.union(&tb).count() as f32;
    shared / union
}

fn trigrams(s: &str) -> HashSet<[char; 3]> {
    let padded: Vec<char> = std::iter::repeat(' ')
        .take(2)
        .chain(s.chars())
        .chain(std::iter::once(' '))
        .collect();
    padded.windows(3).map(|w| [w[0], w[1], w[2]]).collect()
}

/// Best trigram similarity of `needle` against any word of `haystack` or
/// the haystack as a whole. Lets "pizza" score well against
/// "Pizza Margherita with fresh basil".
pub(crate) fn best_field_similarity(needle: &str, haystack: &str) -> f32 {
    let whole = trigram_similarity(needle, haystack);
    haystack
        .split_whitespace()
        .map(|word| trigram_similarity(needle, word))
        .fold(whole, f32::max)
}
