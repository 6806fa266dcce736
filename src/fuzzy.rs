//! Approximate filename matching.
//!
//! Two signals feed one distance in [0, 1]: `nucleo-matcher` for queries whose
//! letters appear in order in the filename, and Damerau-Levenshtein against the
//! extension-less stem for typos and transpositions.

use nucleo_matcher::pattern::{AtomKind, CaseMatching, Normalization, Pattern};
use nucleo_matcher::{Config, Matcher, Utf32Str};
use std::collections::HashMap;

use crate::models::file_stem;
use crate::snippet::fold;

/// Most edits a query may be away from a stem and still count as a typo.
const MAX_TYPO_EDITS: usize = 2;
/// Shorter queries are too ambiguous for edit-distance matching.
const MIN_TYPO_QUERY_CHARS: usize = 4;

#[derive(Debug, Clone)]
struct Candidate {
    name: String,
    /// Folded stem with its length in chars.
    stem: String,
    stem_chars: usize,
}

/// Filenames of one index generation, addressed by entry position.
#[derive(Debug, Clone, Default)]
pub struct FilenameMatcher {
    names: Vec<Candidate>,
}

impl FilenameMatcher {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names = names
            .into_iter()
            .map(|name| {
                let name = name.into();
                let stem = fold(file_stem(&name));
                let stem_chars = stem.chars().count();
                Candidate {
                    name,
                    stem,
                    stem_chars,
                }
            })
            .collect();
        Self { names }
    }

    /// Returns `entry position -> distance` for every filename within `threshold`.
    ///
    /// 0 means as good as a perfect match, 1 means no similarity. The nucleo
    /// score is normalized against the query matched with itself; the edit
    /// distance is divided by the longer of query and stem.
    pub fn candidates(&self, query: &str, threshold: f64) -> HashMap<usize, f64> {
        let mut found = HashMap::new();
        let pattern = Pattern::new(
            query,
            CaseMatching::Ignore,
            Normalization::Smart,
            AtomKind::Fuzzy,
        );
        let mut matcher = Matcher::new(Config::DEFAULT);
        let mut buf = Vec::new();

        let best = match pattern.score(Utf32Str::new(query, &mut buf), &mut matcher) {
            Some(score) if score > 0 => Some(score as f64),
            _ => None,
        };
        let folded_query = fold(query);
        let query_chars = folded_query.chars().count();
        let typos_allowed = query_chars >= MIN_TYPO_QUERY_CHARS;

        for (idx, candidate) in self.names.iter().enumerate() {
            let subsequence = best.and_then(|best| {
                pattern
                    .score(Utf32Str::new(&candidate.name, &mut buf), &mut matcher)
                    .map(|score| 1.0 - (score as f64 / best).min(1.0))
            });

            let typo = if typos_allowed
                && query_chars.abs_diff(candidate.stem_chars) <= MAX_TYPO_EDITS
            {
                let edits = strsim::damerau_levenshtein(&folded_query, &candidate.stem);
                (edits <= MAX_TYPO_EDITS)
                    .then(|| edits as f64 / query_chars.max(candidate.stem_chars) as f64)
            } else {
                None
            };

            let distance = match (subsequence, typo) {
                (Some(a), Some(b)) => a.min(b),
                (Some(d), None) | (None, Some(d)) => d,
                (None, None) => continue,
            };
            if distance < 1.0 && distance <= threshold {
                found.insert(idx, distance);
            }
        }
        found
    }
}
