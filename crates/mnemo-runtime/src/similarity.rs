//! String and vector similarity measures used by the matchers.
//!
//! - [`sequence_ratio`] – Ratcliff/Obershelp "gestalt" ratio: `2·M / T`
//!   where `M` counts characters in recursively found longest common blocks
//!   and `T` is the combined length of both strings.
//! - [`cosine_similarity`] – cosine of two dense vectors.
//! - [`bag_cosine`] – cosine of two bags of words under term-frequency
//!   weighting.
//! - [`edit_distance`] – edit distance with transpositions, used by the spell
//!   checker.

use std::collections::HashMap;

// ─────────────────────────────────────────────────────────────────────────────
// Sequence ratio
// ─────────────────────────────────────────────────────────────────────────────

/// Similarity of `a` and `b` in `[0.0, 1.0]`.
///
/// Two empty strings are identical (`1.0`). Comparison is on `char`s and is
/// case-sensitive; callers fold case first when they want otherwise.
pub fn sequence_ratio(a: &str, b: &str) -> f32 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    2.0 * matched_chars(&a, &b) as f32 / total as f32
}

fn matched_chars(a: &[char], b: &[char]) -> usize {
    let (i, j, k) = longest_common_block(a, b);
    if k == 0 {
        return 0;
    }
    k + matched_chars(&a[..i], &b[..j]) + matched_chars(&a[i + k..], &b[j + k..])
}

/// Longest common contiguous block as `(start_in_a, start_in_b, len)`.
///
/// Ties resolve to the block starting earliest in `a`, then in `b`.
fn longest_common_block(a: &[char], b: &[char]) -> (usize, usize, usize) {
    let mut best = (0, 0, 0);
    let mut prev = vec![0usize; b.len() + 1];
    let mut cur = vec![0usize; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        for (j, cb) in b.iter().enumerate() {
            cur[j + 1] = if ca == cb { prev[j] + 1 } else { 0 };
            let k = cur[j + 1];
            if k > best.2 {
                best = (i + 1 - k, j + 1 - k, k);
            }
        }
        std::mem::swap(&mut prev, &mut cur);
    }
    best
}

// ─────────────────────────────────────────────────────────────────────────────
// Cosine similarity
// ─────────────────────────────────────────────────────────────────────────────

/// Compute the cosine similarity between two equal-length vectors.
///
/// Returns a value in `[-1.0, 1.0]`, or `0.0` if either vector has zero norm.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

/// Cosine similarity of two word bags under term-frequency weighting.
///
/// Words are compared case-insensitively. Either bag being empty yields
/// `0.0`.
pub fn bag_cosine<'a, A, B>(a: A, b: B) -> f32
where
    A: IntoIterator<Item = &'a str>,
    B: IntoIterator<Item = &'a str>,
{
    let mut index: HashMap<String, usize> = HashMap::new();
    let tf_a = term_frequencies(a, &mut index);
    let tf_b = term_frequencies(b, &mut index);

    let dims = index.len();
    let dense = |tf: &HashMap<usize, f32>| {
        let mut v = vec![0.0f32; dims];
        for (&slot, &n) in tf {
            v[slot] = n;
        }
        v
    };
    cosine_similarity(&dense(&tf_a), &dense(&tf_b))
}

fn term_frequencies<'a>(
    words: impl IntoIterator<Item = &'a str>,
    index: &mut HashMap<String, usize>,
) -> HashMap<usize, f32> {
    let mut tf = HashMap::new();
    for w in words {
        let next = index.len();
        let slot = *index.entry(w.to_lowercase()).or_insert(next);
        *tf.entry(slot).or_insert(0.0) += 1.0;
    }
    tf
}

// ─────────────────────────────────────────────────────────────────────────────
// Edit distance
// ─────────────────────────────────────────────────────────────────────────────

/// Edit distance between `a` and `b`, counted in `char`s.
///
/// Levenshtein with adjacent transpositions counted as one edit (optimal
/// string alignment), so `"teh"` is one edit from `"the"`.
pub fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }
    let mut before: Vec<usize> = vec![0; b.len() + 1];
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut cur = vec![0usize; b.len() + 1];
    for i in 0..a.len() {
        cur[0] = i + 1;
        for j in 0..b.len() {
            let cost = usize::from(a[i] != b[j]);
            cur[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(cur[j] + 1);
            if i > 0 && j > 0 && a[i] == b[j - 1] && a[i - 1] == b[j] {
                cur[j + 1] = cur[j + 1].min(before[j - 1] + 1);
            }
        }
        std::mem::swap(&mut before, &mut prev);
        std::mem::swap(&mut prev, &mut cur);
    }
    prev[b.len()]
}
