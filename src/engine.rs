//! Query evaluation: the scoring policy and result ranking.
//!
//! Each entry is scored by the first rule that applies, in priority order:
//! exact name, fuzzy name, directory path, then document content. The score
//! bands never overlap, so `exact > fuzzy > path > content` always holds.

use std::cmp::Ordering;
use std::collections::HashSet;

use crate::config::SearchConfig;
use crate::fuzzy::FilenameMatcher;
use crate::models::{IndexEntry, MatchType, SearchOptions, SearchResult};
use crate::snippet::{extract_snippets, fold, query_tokens};

/// Hard cap on returned results.
pub const MAX_RESULTS: usize = 10;
/// Queries shorter than this after trimming return nothing.
pub const MIN_QUERY_CHARS: usize = 2;

const EXACT_SCORE: f64 = 1.0;
const FUZZY_BASE: f64 = 0.6;
const FUZZY_RANGE: f64 = 0.3;
const PATH_SCORE: f64 = 0.5;
const PHRASE_BASE: f64 = 0.3;
const PHRASE_PER_OCCURRENCE: f64 = 0.1;
const PHRASE_MAX: f64 = 0.4;
const TOKEN_BASE: f64 = 0.2;
const TOKEN_RANGE: f64 = 0.2;
const TOKEN_MAX: f64 = 0.35;
const REPRESENTATIVE_SCORE: f64 = 0.15;

fn normalize_query(query: &str) -> Option<String> {
    let trimmed = query.trim();
    if trimmed.chars().count() < MIN_QUERY_CHARS {
        return None;
    }
    Some(fold(trimmed))
}

/// `None` means no filtering; an empty or blank list behaves the same.
fn extension_filter(options: &SearchOptions) -> Option<HashSet<String>> {
    let types: HashSet<String> = options
        .file_types
        .as_deref()?
        .iter()
        .map(|ext| ext.trim().trim_start_matches('.').to_lowercase())
        .filter(|ext| !ext.is_empty())
        .collect();
    if types.is_empty() {
        None
    } else {
        Some(types)
    }
}

/// Scores document text alone, without snippets.
fn content_score(content: &str, query: &str, tokens: &[String]) -> Option<f64> {
    let lower = fold(content);

    let occurrences = lower.matches(query).count();
    if occurrences > 0 {
        return Some((PHRASE_BASE + PHRASE_PER_OCCURRENCE * occurrences as f64).min(PHRASE_MAX));
    }

    let matched = tokens.iter().filter(|token| lower.contains(token.as_str())).count();
    if matched > 0 {
        let ratio = matched as f64 / tokens.len() as f64;
        return Some((TOKEN_BASE + TOKEN_RANGE * ratio).min(TOKEN_MAX));
    }

    if content.trim().is_empty() {
        None
    } else {
        Some(REPRESENTATIVE_SCORE)
    }
}

/// A scored entry that has not had snippets attached yet.
struct Ranked<'a> {
    result: SearchResult,
    content: Option<&'a str>,
}

/// Scores every entry, then keeps the best [`MAX_RESULTS`] in order.
fn rank<'a>(
    entries: &'a [IndexEntry],
    matcher: &FilenameMatcher,
    query: &str,
    options: &SearchOptions,
    config: &SearchConfig,
) -> Vec<Ranked<'a>> {
    let filter = extension_filter(options);
    let fuzzy = matcher.candidates(query, config.fuzzy_threshold);
    let tokens = query_tokens(query);

    let mut ranked: Vec<Ranked<'a>> = Vec::new();
    for (idx, entry) in entries.iter().enumerate() {
        if let Some(types) = &filter {
            let keep = entry.extension().map_or(false, |ext| types.contains(&ext));
            if !keep {
                continue;
            }
        }

        let (score, match_type, content) = if fold(entry.stem()) == query {
            (EXACT_SCORE, MatchType::Exact, None)
        } else if let Some(distance) = fuzzy.get(&idx) {
            (FUZZY_BASE + FUZZY_RANGE * (1.0 - distance), MatchType::Fuzzy, None)
        } else if fold(entry.directory()).contains(query) {
            (PATH_SCORE, MatchType::Path, None)
        } else {
            let Some(content) = entry.content.as_deref() else {
                continue;
            };
            let Some(score) = content_score(content, query, &tokens) else {
                continue;
            };
            (score, MatchType::Content, Some(content))
        };
        ranked.push(Ranked {
            result: SearchResult::from_entry(entry, score, match_type),
            content,
        });
    }

    ranked.sort_by(|a, b| match b.result.score.total_cmp(&a.result.score) {
        Ordering::Equal => b.result.last_modified.cmp(&a.result.last_modified),
        other => other,
    });
    ranked.truncate(MAX_RESULTS);
    ranked
}

/// Runs `query` over one index generation and returns at most
/// [`MAX_RESULTS`] results, best first.
///
/// Snippets are only extracted for content matches that made the cut.
pub fn search(
    entries: &[IndexEntry],
    matcher: &FilenameMatcher,
    query: &str,
    options: &SearchOptions,
    config: &SearchConfig,
) -> Vec<SearchResult> {
    let Some(normalized) = normalize_query(query) else {
        return Vec::new();
    };

    rank(entries, matcher, &normalized, options, config)
        .into_iter()
        .map(|Ranked { mut result, content }| {
            if let Some(content) = content {
                let snippets = extract_snippets(
                    content,
                    &normalized,
                    config.max_snippets,
                    config.snippet_context,
                );
                if !snippets.is_empty() {
                    result.snippets = Some(snippets);
                }
            }
            result
        })
        .collect()
}
