//! Approximate multi-field search over small in-memory collections.
//!
//! Every field value is matched against the whole (lower-cased) query with
//! the Bitap algorithm, allowing a bounded number of character errors and
//! penalising matches that start far from the beginning of the value.
//! Per-field scores are folded into one record score:
//!
//! ```text
//! score = Π field_score ^ (weight * norm)      norm = 1 / sqrt(tokens in value)
//! ```
//!
//! Scores are distances: `0.0` is exact, `1.0` is no match. Hits are sorted
//! ascending, ties keep insertion order.

use std::collections::HashMap;
use std::sync::Arc;

use crate::models::{Faq, MatchSpan, Project};

/// Maximum per-field Bitap distance accepted as a match.
pub const MATCH_THRESHOLD: f64 = 0.4;
/// Matched runs shorter than this do not count.
pub const MIN_MATCH_CHAR_LENGTH: usize = 2;

/// Bitap works on machine words; longer patterns are searched in chunks.
const MAX_BITS: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Title,
    Keywords,
    Description,
    TechStack,
}

impl Field {
    pub fn name(self) -> &'static str {
        match self {
            Field::Title => "title",
            Field::Keywords => "keywords",
            Field::Description => "description",
            Field::TechStack => "tech_stack",
        }
    }
}

/// Relative field weights shared by both record kinds.
pub const FIELD_WEIGHTS: [(Field, f64); 4] = [
    (Field::Title, 0.4),
    (Field::Keywords, 0.3),
    (Field::Description, 0.2),
    (Field::TechStack, 0.1),
];

pub enum FieldValue<'a> {
    Text(&'a str),
    List(&'a [String]),
    Missing,
}

/// Exposes the weighted fields of a record kind to the index.
pub trait Searchable {
    fn field(&self, field: Field) -> FieldValue<'_>;
}

impl Searchable for Project {
    fn field(&self, field: Field) -> FieldValue<'_> {
        match field {
            Field::Title => FieldValue::Text(&self.title),
            Field::Keywords => FieldValue::List(&self.keywords),
            Field::Description => FieldValue::Text(&self.description),
            Field::TechStack => FieldValue::List(&self.tech_stack),
        }
    }
}

// Question and answer are not weighted keys; FAQs are found by keywords.
impl Searchable for Faq {
    fn field(&self, field: Field) -> FieldValue<'_> {
        match field {
            Field::Keywords => FieldValue::List(&self.keywords),
            Field::Title | Field::Description | Field::TechStack => FieldValue::Missing,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FuzzyOptions {
    /// Highest accepted Bitap score for a field value
    pub threshold: f64,
    /// Character position where a match is expected to start
    pub location: usize,
    /// How far from `location` a match may drift before it costs a full 1.0
    pub distance: usize,
    pub min_match_char_length: usize,
}

impl Default for FuzzyOptions {
    fn default() -> Self {
        Self {
            threshold: MATCH_THRESHOLD,
            location: 0,
            distance: 100,
            min_match_char_length: MIN_MATCH_CHAR_LENGTH,
        }
    }
}

/// A single searchable string, pre-lowercased.
struct IndexedValue {
    original: String,
    chars: Vec<char>,
    array_index: Option<usize>,
    norm: f64,
}

struct IndexedRecord<T> {
    item: Arc<T>,
    /// One entry per key, parallel with `FuzzyIndex::keys`
    fields: Vec<Vec<IndexedValue>>,
}

/// Searchable index over one record kind.
pub struct FuzzyIndex<T> {
    keys: Vec<(Field, f64)>,
    records: Vec<IndexedRecord<T>>,
    options: FuzzyOptions,
}

#[derive(Debug, Clone)]
pub struct FuzzyHit<T> {
    pub item: Arc<T>,
    /// Insertion position of the record
    pub index: usize,
    pub score: f64,
    pub matches: Vec<MatchSpan>,
}

impl<T: Searchable> FuzzyIndex<T> {
    pub fn build(items: &[Arc<T>], weights: &[(Field, f64)], options: FuzzyOptions) -> Self {
        let total: f64 = weights.iter().map(|(_, w)| w).sum();
        let keys: Vec<(Field, f64)> = weights
            .iter()
            .map(|&(field, w)| (field, if total > 0.0 { w / total } else { 0.0 }))
            .collect();

        let records = items
            .iter()
            .map(|item| IndexedRecord {
                item: Arc::clone(item),
                fields: keys
                    .iter()
                    .map(|&(field, _)| index_field(item.field(field)))
                    .collect(),
            })
            .collect();

        Self {
            keys,
            records,
            options,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Rank every record with at least one matching field.
    pub fn search(&self, query: &str) -> Vec<FuzzyHit<T>> {
        if query.is_empty() {
            return Vec::new();
        }
        let pattern = Pattern::new(query);

        let mut hits = Vec::new();
        for (idx, record) in self.records.iter().enumerate() {
            let mut score = 1.0f64;
            let mut matches = Vec::new();

            for (&(field, weight), values) in self.keys.iter().zip(&record.fields) {
                for value in values {
                    let found = pattern.search_in(&value.chars, &self.options);
                    if !found.is_match {
                        continue;
                    }
                    let base = if found.score == 0.0 && weight > 0.0 {
                        f64::EPSILON
                    } else {
                        found.score
                    };
                    let exponent = if weight > 0.0 { weight } else { 1.0 } * value.norm;
                    score *= base.powf(exponent);
                    matches.push(MatchSpan {
                        field: field.name().to_string(),
                        value: value.original.clone(),
                        array_index: value.array_index,
                        indices: found.indices,
                    });
                }
            }

            if !matches.is_empty() {
                hits.push(FuzzyHit {
                    item: Arc::clone(&record.item),
                    index: idx,
                    score,
                    matches,
                });
            }
        }

        hits.sort_by(|a, b| {
            a.score
                .partial_cmp(&b.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.index.cmp(&b.index))
        });
        hits
    }
}

fn index_field(value: FieldValue<'_>) -> Vec<IndexedValue> {
    match value {
        FieldValue::Text(text) => indexed_value(text, None).into_iter().collect(),
        FieldValue::List(items) => items
            .iter()
            .enumerate()
            .filter_map(|(i, text)| indexed_value(text, Some(i)))
            .collect(),
        FieldValue::Missing => Vec::new(),
    }
}

fn indexed_value(text: &str, array_index: Option<usize>) -> Option<IndexedValue> {
    if text.trim().is_empty() {
        return None;
    }
    Some(IndexedValue {
        original: text.to_string(),
        chars: text.to_lowercase().chars().collect(),
        array_index,
        norm: field_norm(text),
    })
}

/// `1 / sqrt(token count)`, rounded to three decimals. Tokens are runs of
/// non-space characters.
fn field_norm(text: &str) -> f64 {
    let tokens = text.split(' ').filter(|t| !t.is_empty()).count().max(1);
    let norm = 1.0 / (tokens as f64).sqrt();
    (norm * 1000.0).round() / 1000.0
}

// ─── Bitap ───────────────────────────────────────────────

struct PatternChunk {
    chars: Vec<char>,
    alphabet: HashMap<char, u32>,
    start_index: usize,
}

struct Pattern {
    chars: Vec<char>,
    chunks: Vec<PatternChunk>,
}

#[derive(Debug, Default)]
struct BitapResult {
    is_match: bool,
    score: f64,
    indices: Vec<(usize, usize)>,
}

impl Pattern {
    fn new(query: &str) -> Self {
        let chars: Vec<char> = query.to_lowercase().chars().collect();
        let len = chars.len();

        let mut chunks = Vec::new();
        let mut add_chunk = |slice: &[char], start_index: usize| {
            chunks.push(PatternChunk {
                chars: slice.to_vec(),
                alphabet: pattern_alphabet(slice),
                start_index,
            });
        };

        if len > MAX_BITS {
            let remainder = len % MAX_BITS;
            let end = len - remainder;
            let mut i = 0;
            while i < end {
                add_chunk(&chars[i..i + MAX_BITS], i);
                i += MAX_BITS;
            }
            if remainder > 0 {
                let start = len - MAX_BITS;
                add_chunk(&chars[start..], start);
            }
        } else {
            add_chunk(&chars, 0);
        }

        Self { chars, chunks }
    }

    fn search_in(&self, text: &[char], options: &FuzzyOptions) -> BitapResult {
        if self.chars == text {
            return BitapResult {
                is_match: true,
                score: 0.0,
                indices: vec![(0, text.len().saturating_sub(1))],
            };
        }

        let mut all_indices = Vec::new();
        let mut total_score = 0.0;
        let mut has_matches = false;

        for chunk in &self.chunks {
            let result = bitap(
                text,
                &chunk.chars,
                &chunk.alphabet,
                options.location + chunk.start_index,
                options,
            );
            total_score += result.score;
            if result.is_match {
                has_matches = true;
                all_indices.extend(result.indices);
            }
        }

        BitapResult {
            is_match: has_matches,
            score: if has_matches {
                total_score / self.chunks.len() as f64
            } else {
                1.0
            },
            indices: if has_matches { all_indices } else { Vec::new() },
        }
    }
}

/// Bit mask per character: bit `len - i - 1` is set when the pattern has
/// that character at position `i`.
fn pattern_alphabet(pattern: &[char]) -> HashMap<char, u32> {
    let len = pattern.len();
    let mut mask = HashMap::new();
    for (i, &c) in pattern.iter().enumerate() {
        *mask.entry(c).or_insert(0u32) |= 1u32 << (len - i - 1);
    }
    mask
}

fn bitap_score(
    pattern_len: usize,
    errors: usize,
    current_location: usize,
    expected_location: usize,
    distance: usize,
) -> f64 {
    let accuracy = errors as f64 / pattern_len as f64;
    let proximity = current_location.abs_diff(expected_location);
    if distance == 0 {
        return if proximity > 0 { 1.0 } else { accuracy };
    }
    accuracy + proximity as f64 / distance as f64
}

fn find_from(text: &[char], pattern: &[char], from: usize) -> Option<usize> {
    if pattern.is_empty() || from > text.len() || pattern.len() > text.len() - from {
        return None;
    }
    text[from..]
        .windows(pattern.len())
        .position(|w| w == pattern)
        .map(|p| p + from)
}

fn bitap(
    text: &[char],
    pattern: &[char],
    alphabet: &HashMap<char, u32>,
    location: usize,
    options: &FuzzyOptions,
) -> BitapResult {
    let pattern_len = pattern.len();
    let text_len = text.len();
    let distance = options.distance;
    let expected_location = location.min(text_len);

    let mut current_threshold = options.threshold;
    let mut match_mask = vec![false; text_len];

    // Exact occurrences tighten the threshold before the fuzzy pass.
    let mut from = expected_location;
    while let Some(index) = find_from(text, pattern, from) {
        let score = bitap_score(pattern_len, 0, index, expected_location, distance);
        current_threshold = current_threshold.min(score);
        from = index + pattern_len;
        for flag in &mut match_mask[index..index + pattern_len] {
            *flag = true;
        }
    }

    let mut best_location: Option<usize> = None;
    let mut last_bit_arr: Vec<u32> = Vec::new();
    let mut final_score = 1.0;
    let mut bin_max = pattern_len + text_len;
    let mask = 1u32 << (pattern_len - 1);

    for errors in 0..pattern_len {
        // Widest window in which `errors` mistakes can still beat the threshold.
        let mut bin_min = 0;
        let mut bin_mid = bin_max;
        while bin_min < bin_mid {
            let score = bitap_score(
                pattern_len,
                errors,
                expected_location + bin_mid,
                expected_location,
                distance,
            );
            if score <= current_threshold {
                bin_min = bin_mid;
            } else {
                bin_max = bin_mid;
            }
            bin_mid = (bin_max - bin_min) / 2 + bin_min;
        }
        bin_max = bin_mid;

        let mut start = (expected_location + 1).saturating_sub(bin_mid).max(1);
        let finish = (expected_location + bin_mid).min(text_len) + pattern_len;

        let mut bit_arr = vec![0u32; finish + 2];
        bit_arr[finish + 1] = (1u32 << errors) - 1;

        let last = |k: usize| last_bit_arr.get(k).copied().unwrap_or(0);

        let mut j = finish;
        while j >= start {
            let current_location = j - 1;
            let char_match = text
                .get(current_location)
                .and_then(|c| alphabet.get(c))
                .copied()
                .unwrap_or(0);
            if current_location < text_len {
                match_mask[current_location] = char_match != 0;
            }

            bit_arr[j] = ((bit_arr[j + 1] << 1) | 1) & char_match;
            if errors > 0 {
                bit_arr[j] |= ((last(j + 1) | last(j)) << 1) | 1 | last(j + 1);
            }

            if bit_arr[j] & mask != 0 {
                final_score = bitap_score(
                    pattern_len,
                    errors,
                    current_location,
                    expected_location,
                    distance,
                );
                if final_score <= current_threshold {
                    current_threshold = final_score;
                    best_location = Some(current_location);
                    if current_location <= expected_location {
                        break;
                    }
                    start = (2 * expected_location).saturating_sub(current_location).max(1);
                }
            }
            j -= 1;
        }

        let next = bitap_score(
            pattern_len,
            errors + 1,
            expected_location,
            expected_location,
            distance,
        );
        if next > current_threshold {
            break;
        }
        last_bit_arr = bit_arr;
    }

    let indices = mask_to_indices(&match_mask, options.min_match_char_length);
    BitapResult {
        is_match: best_location.is_some() && !indices.is_empty(),
        score: f64::max(0.001, final_score),
        indices,
    }
}

/// Collapse a per-character match mask into inclusive runs of at least
/// `min_len` characters.
fn mask_to_indices(mask: &[bool], min_len: usize) -> Vec<(usize, usize)> {
    let mut indices = Vec::new();
    let mut start: Option<usize> = None;
    for (i, &matched) in mask.iter().enumerate() {
        match (matched, start) {
            (true, None) => start = Some(i),
            (false, Some(s)) => {
                if i - s >= min_len {
                    indices.push((s, i - 1));
                }
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        if mask.len() - s >= min_len {
            indices.push((s, mask.len() - 1));
        }
    }
    indices
}
