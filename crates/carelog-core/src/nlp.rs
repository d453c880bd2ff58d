//! Lexicon-based issue mention extraction.
//!
//! Pipeline: normalize → tokenize → greedy longest-phrase match with a
//! backward negation window → fold phrase hits by issue key.
//!
//! Matching is purely lexical; there is no statistical model anywhere in
//! this module.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::models::LexiconTerm;

/// Tokens that suppress a match when they appear in the 3 tokens
/// immediately preceding the match start.
const NEGATION_TOKENS: [&str; 5] = ["no", "not", "without", "denies", "none"];

/// How far back the negation window reaches, in tokens.
const NEGATION_WINDOW: usize = 3;

/// Longest phrase length tried at each scan position, in tokens.
const MAX_PHRASE_TOKENS: usize = 3;

/// Target evidence snippet length, in characters.
const SNIPPET_MAX_CHARS: usize = 140;

/// All mentions of one issue found in a single text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedIssueMention {
    pub issue_key: String,
    pub label: String,
    /// Term that produced the first phrase hit for this issue.
    pub term_id: String,
    pub mention_count: u32,
    pub weighted_score: f64,
    pub evidence_snippet: Option<String>,
}

/// Lowercase the text and collapse every non-alphanumeric run to one space.
///
/// Applied identically to lexicon phrases at load time and to free text at
/// extraction time.
pub fn normalize_phrase(input: &str) -> String {
    let mut replaced = String::with_capacity(input.len());
    for c in input.chars() {
        if c.is_ascii_alphanumeric() {
            replaced.push(c.to_ascii_lowercase());
        } else {
            replaced.push(' ');
        }
    }
    replaced.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalized token sequence. Empty input yields an empty sequence.
pub fn tokenize(input: &str) -> Vec<String> {
    let normalized = normalize_phrase(input);
    if normalized.is_empty() {
        return Vec::new();
    }
    normalized.split(' ').map(str::to_string).collect()
}

fn has_negation_before(tokens: &[String], start: usize) -> bool {
    let from = start.saturating_sub(NEGATION_WINDOW);
    tokens[from..start]
        .iter()
        .any(|token| NEGATION_TOKENS.contains(&token.as_str()))
}

/// Phrase map: normalized phrase → candidate terms sharing that phrase.
fn build_phrase_map(terms: &[LexiconTerm]) -> HashMap<String, Vec<&LexiconTerm>> {
    let mut map: HashMap<String, Vec<&LexiconTerm>> = HashMap::new();

    for term in terms {
        let source = if term.normalized_phrase.is_empty() {
            term.phrase.as_str()
        } else {
            term.normalized_phrase.as_str()
        };
        let normalized = normalize_phrase(source);
        if normalized.is_empty() {
            continue;
        }
        map.entry(normalized).or_default().push(term);
    }

    map
}

/// Highest weight wins a shared phrase; ties break on issue key ascending.
fn pick_best_term<'a>(candidates: &[&'a LexiconTerm]) -> &'a LexiconTerm {
    let mut sorted = candidates.to_vec();
    sorted.sort_by(|a, b| {
        b.weight
            .partial_cmp(&a.weight)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.issue_key.cmp(&b.issue_key))
    });
    sorted[0]
}

fn compact_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// A ~140-character window of the original text centred near the first
/// token of the matched phrase. Falls back to the clipped whole text.
fn snippet_around(notes: &str, phrase: &str) -> Option<String> {
    let first_token = phrase.split(' ').next().unwrap_or("");
    let lower = notes.to_lowercase();

    let Some(byte_index) = lower.find(first_token) else {
        let compact = compact_whitespace(notes);
        let clipped: String = compact.chars().take(SNIPPET_MAX_CHARS).collect();
        return if clipped.is_empty() { None } else { Some(clipped) };
    };

    // Lowercasing can change byte length for non-ASCII text; when it does,
    // cut the snippet from the lowered copy instead of the original.
    let haystack = if notes.len() == lower.len() {
        notes
    } else {
        lower.as_str()
    };
    let char_pos = lower[..byte_index].chars().count();
    let chars: Vec<char> = haystack.chars().collect();
    let from = char_pos.saturating_sub(40).min(chars.len());
    let to = (char_pos + 100).min(chars.len());
    let window: String = chars[from..to].iter().collect();
    let compact = compact_whitespace(&window);

    if compact.is_empty() {
        None
    } else {
        Some(compact)
    }
}

struct PhraseHit<'a> {
    term: &'a LexiconTerm,
    phrase: String,
}

/// Extract one aggregated mention per distinct issue key matched in `notes`.
///
/// Greedy scan: at each position phrase lengths 3, 2, 1 are tried in order
/// and the longest match wins. A match preceded by a negation token within
/// the 3-token window is discarded without consuming tokens. Results sort by
/// weighted score descending, then issue key ascending.
pub fn extract_issue_mentions(notes: &str, terms: &[LexiconTerm]) -> Vec<ExtractedIssueMention> {
    let tokens = tokenize(notes);
    if tokens.is_empty() || terms.is_empty() {
        return Vec::new();
    }

    let phrase_map = build_phrase_map(terms);
    let mut hits: Vec<PhraseHit> = Vec::new();

    let mut index = 0;
    while index < tokens.len() {
        let mut matched = false;

        for len in (1..=MAX_PHRASE_TOKENS).rev() {
            if index + len > tokens.len() {
                continue;
            }

            let phrase = tokens[index..index + len].join(" ");
            let Some(candidates) = phrase_map.get(&phrase) else {
                continue;
            };
            if candidates.is_empty() || has_negation_before(&tokens, index) {
                continue;
            }

            hits.push(PhraseHit {
                term: pick_best_term(candidates),
                phrase,
            });
            index += len;
            matched = true;
            break;
        }

        if !matched {
            index += 1;
        }
    }

    let mut by_issue: HashMap<String, ExtractedIssueMention> = HashMap::new();

    for hit in &hits {
        let entry = by_issue
            .entry(hit.term.issue_key.clone())
            .or_insert_with(|| ExtractedIssueMention {
                issue_key: hit.term.issue_key.clone(),
                label: hit.term.label.clone(),
                term_id: hit.term.id.clone(),
                mention_count: 0,
                weighted_score: 0.0,
                evidence_snippet: snippet_around(notes, &hit.phrase),
            });
        entry.mention_count += 1;
        entry.weighted_score += hit.term.weight;
    }

    let mut mentions: Vec<ExtractedIssueMention> = by_issue.into_values().collect();
    mentions.sort_by(|a, b| {
        b.weighted_score
            .partial_cmp(&a.weighted_score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.issue_key.cmp(&b.issue_key))
    });
    mentions
}
