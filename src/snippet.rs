//! Locates and ranks short excerpts of a document that relate to a query.
//!
//! Three passes run in order and stop once enough snippets exist:
//! exact phrase hits, then paragraphs containing query tokens, then the
//! opening paragraphs as a representative fallback.

use crate::models::Snippet;

const ELLIPSIS: &str = "...";
const PHRASE_BONUS: f64 = 0.5;
const OCCURRENCE_WEIGHT: f64 = 0.2;
const TOKEN_WEIGHT: f64 = 0.2;
const PARAGRAPH_DECAY: f64 = 0.3;
const FALLBACK_PARAGRAPHS: usize = 3;

/// Tokens of two characters or fewer are ignored for word-level matching.
pub(crate) fn query_tokens(query: &str) -> Vec<String> {
    let mut tokens: Vec<String> = Vec::new();
    for token in query.split_whitespace() {
        let token = fold(token);
        if token.chars().count() > 2 && !tokens.contains(&token) {
            tokens.push(token);
        }
    }
    tokens
}

/// Lower-cases one char to one char so offsets stay aligned with the source.
/// Final sigma folds to `σ` so word position never changes a match.
fn fold_char(c: char) -> char {
    match c.to_lowercase().next().unwrap_or(c) {
        'ς' => 'σ',
        lower => lower,
    }
}

/// Case-folds `text` the same way for queries, names and document bodies.
pub(crate) fn fold(text: &str) -> String {
    text.chars().map(fold_char).collect()
}

fn find_from(haystack: &[char], needle: &[char], from: usize) -> Option<usize> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return None;
    }
    (from..=haystack.len() - needle.len()).find(|&i| haystack[i..i + needle.len()] == *needle)
}

fn count_occurrences(haystack: &[char], needle: &[char]) -> usize {
    let mut count = 0;
    let mut from = 0;
    while let Some(pos) = find_from(haystack, needle, from) {
        count += 1;
        from = pos + needle.len();
    }
    count
}

/// Renders `chars[start..end]`, marking truncated ends with an ellipsis.
fn excerpt(chars: &[char], start: usize, end: usize) -> String {
    let body: String = chars[start..end].iter().collect();
    let mut text = String::new();
    if start > 0 {
        text.push_str(ELLIPSIS);
    }
    text.push_str(body.trim());
    if end < chars.len() {
        text.push_str(ELLIPSIS);
    }
    text
}

struct Paragraph<'a> {
    /// Char offset of the paragraph within the whole document.
    offset: usize,
    text: &'a str,
}

/// Splits on blank lines.
fn paragraphs(content: &str) -> Vec<Paragraph<'_>> {
    let mut out = Vec::new();
    let mut byte = 0;
    let mut chars = 0;
    // (byte start, char offset, byte end)
    let mut current: Option<(usize, usize, usize)> = None;

    for line in content.split_inclusive('\n') {
        if line.trim().is_empty() {
            if let Some((start, offset, end)) = current.take() {
                out.push(Paragraph {
                    offset,
                    text: &content[start..end],
                });
            }
        } else {
            let end = byte + line.trim_end_matches(['\n', '\r']).len();
            match current.as_mut() {
                Some((_, _, current_end)) => *current_end = end,
                None => current = Some((byte, chars, end)),
            }
        }
        byte += line.len();
        chars += line.chars().count();
    }
    if let Some((start, offset, end)) = current {
        out.push(Paragraph {
            offset,
            text: &content[start..end],
        });
    }
    out
}

fn core_text(text: &str) -> &str {
    let text = text.strip_prefix(ELLIPSIS).unwrap_or(text);
    text.strip_suffix(ELLIPSIS).unwrap_or(text)
}

/// Keeps the first of any pair that is identical, or that overlaps within
/// half a context window with one text contained in the other.
fn push_unique(snippets: &mut Vec<Snippet>, candidate: Snippet, context_size: usize) -> bool {
    let window = context_size / 2;
    let candidate_core = core_text(&candidate.text);
    let duplicate = snippets.iter().any(|existing| {
        if existing.text == candidate.text {
            return true;
        }
        let existing_core = core_text(&existing.text);
        existing.position.abs_diff(candidate.position) <= window
            && (existing_core.contains(candidate_core) || candidate_core.contains(existing_core))
    });
    if !duplicate {
        snippets.push(candidate);
    }
    !duplicate
}

fn phrase_pass(
    chars: &[char],
    folded: &[char],
    phrase: &[char],
    max_snippets: usize,
    context_size: usize,
    snippets: &mut Vec<Snippet>,
) {
    let len = chars.len();
    let mut from = 0;
    while let Some(pos) = find_from(folded, phrase, from) {
        from = pos + phrase.len();

        let start = pos.saturating_sub(context_size);
        let end = (pos + phrase.len() + context_size).min(len);
        let occurrences = count_occurrences(&folded[start..end], phrase);
        let score = (1.0 - pos as f64 / len as f64)
            + OCCURRENCE_WEIGHT * occurrences as f64
            + PHRASE_BONUS;

        push_unique(
            snippets,
            Snippet {
                text: excerpt(chars, start, end),
                score,
                position: start,
            },
            context_size,
        );
        // Collect a few spares so the score sort has something to choose from.
        if snippets.len() >= max_snippets * 2 {
            break;
        }
    }
}

fn token_pass(
    paragraphs: &[Paragraph<'_>],
    tokens: &[Vec<char>],
    context_size: usize,
    snippets: &mut Vec<Snippet>,
) {
    let count = paragraphs.len();
    for (idx, paragraph) in paragraphs.iter().enumerate() {
        let chars: Vec<char> = paragraph.text.chars().collect();
        let folded: Vec<char> = chars.iter().copied().map(fold_char).collect();

        // (position of first occurrence, token length)
        let hits: Vec<(usize, usize)> = tokens
            .iter()
            .filter_map(|token| find_from(&folded, token, 0).map(|pos| (pos, token.len())))
            .collect();
        let Some(&(first, first_len)) = hits.iter().min() else {
            continue;
        };

        let score = TOKEN_WEIGHT * hits.len() as f64
            + (1.0 - PARAGRAPH_DECAY * idx as f64 / count as f64);
        let (start, end) = if chars.len() > context_size * 2 {
            (
                first.saturating_sub(context_size),
                (first + first_len + context_size).min(chars.len()),
            )
        } else {
            (0, chars.len())
        };

        push_unique(
            snippets,
            Snippet {
                text: excerpt(&chars, start, end),
                score,
                position: paragraph.offset + start,
            },
            context_size,
        );
    }
}

fn representative_pass(
    paragraphs: &[Paragraph<'_>],
    context_size: usize,
    snippets: &mut Vec<Snippet>,
) {
    let limit = context_size * 2;
    for (idx, paragraph) in paragraphs.iter().take(FALLBACK_PARAGRAPHS).enumerate() {
        let trimmed = paragraph.text.trim();
        let mut text: String = trimmed.chars().take(limit).collect();
        if trimmed.chars().count() > limit {
            text.push_str(ELLIPSIS);
        }
        push_unique(
            snippets,
            Snippet {
                text,
                score: 0.3 - 0.1 * idx as f64,
                position: paragraph.offset,
            },
            context_size,
        );
    }
}

/// Returns up to `max_snippets` excerpts of `content` ranked by relevance to
/// `query`. Deterministic for fixed inputs.
///
/// Non-empty content always yields at least one snippet: when neither the
/// phrase nor any token occurs, the opening paragraphs are returned with
/// low scores.
pub fn extract_snippets(
    content: &str,
    query: &str,
    max_snippets: usize,
    context_size: usize,
) -> Vec<Snippet> {
    let mut snippets = Vec::new();
    if content.trim().is_empty() || max_snippets == 0 {
        return snippets;
    }

    let chars: Vec<char> = content.chars().collect();
    let folded: Vec<char> = chars.iter().copied().map(fold_char).collect();
    let phrase: Vec<char> = fold(query.trim()).chars().collect();

    phrase_pass(&chars, &folded, &phrase, max_snippets, context_size, &mut snippets);

    let paragraphs = paragraphs(content);
    if snippets.len() < max_snippets {
        let tokens: Vec<Vec<char>> = query_tokens(query)
            .iter()
            .map(|token| token.chars().collect())
            .collect();
        token_pass(&paragraphs, &tokens, context_size, &mut snippets);
    }

    if snippets.is_empty() {
        representative_pass(&paragraphs, context_size, &mut snippets);
    }

    snippets.sort_by(|a, b| b.score.total_cmp(&a.score));
    snippets.truncate(max_snippets);
    snippets
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phrase_hit_gets_context_and_ellipses() {
        let content = format!("{}needle in the haystack{}", "a".repeat(50), "b".repeat(50));
        let snippets = extract_snippets(&content, "Needle", 3, 10);
        assert_eq!(snippets.len(), 1);
        let snippet = &snippets[0];
        assert!(snippet.text.starts_with("..."));
        assert!(snippet.text.ends_with("..."));
        assert!(snippet.text.contains("needle in the"));
        assert_eq!(snippet.position, 40);
        // 1 - 50/122 + 0.2 + 0.5
        let expected = 1.0 - 50.0 / 122.0 + 0.7;
        assert!((snippet.score - expected).abs() < 1e-9);
    }

    #[test]
    fn test_whole_document_snippet_has_no_ellipsis() {
        let snippets = extract_snippets("short rust note", "rust", 3, 100);
        assert_eq!(snippets.len(), 1);
        assert_eq!(snippets[0].text, "short rust note");
        assert_eq!(snippets[0].position, 0);
    }

    #[test]
    fn test_overlapping_hits_are_deduplicated() {
        // Both hits expand to the whole document, so the texts are identical.
        let snippets = extract_snippets("alpha beta alpha", "alpha", 3, 100);
        assert_eq!(snippets.len(), 1);
        // 1 - 0/16 + 0.2 * 2 + 0.5
        assert!((snippets[0].score - 1.9).abs() < 1e-9);
    }

    #[test]
    fn test_substring_within_half_window_is_duplicate() {
        let mut snippets = vec![Snippet {
            text: "...the quick brown fox jumps...".to_string(),
            score: 1.0,
            position: 10,
        }];
        let nested = Snippet {
            text: "quick brown fox".to_string(),
            score: 0.9,
            position: 14,
        };
        assert!(!push_unique(&mut snippets, nested.clone(), 20));

        let far = Snippet {
            position: 40,
            ..nested
        };
        assert!(push_unique(&mut snippets, far, 20));
        assert_eq!(snippets.len(), 2);
    }

    #[test]
    fn test_token_pass_prefers_paragraphs_with_more_tokens() {
        let content = "Cooking pasta takes time.\n\nMemory safety in Rust.\n\nRust programs and memory safety guarantees.";
        let snippets = extract_snippets(content, "rust memory safety", 3, 100);
        assert_eq!(snippets.len(), 2);
        assert_eq!(snippets[0].text, "Memory safety in Rust.");
        assert_eq!(snippets[1].text, "Rust programs and memory safety guarantees.");
        assert!(snippets[0].score > snippets[1].score);
        assert_eq!(snippets[0].position, 27);
    }

    #[test]
    fn test_long_paragraph_is_windowed_around_first_token() {
        let content = format!("{} kernel {}", "x".repeat(300), "y".repeat(300));
        let snippets = extract_snippets(&content, "linux kernel", 1, 20);
        assert_eq!(snippets.len(), 1);
        assert!(snippets[0].text.starts_with("...x"));
        assert!(snippets[0].text.contains("kernel"));
        assert!(snippets[0].text.ends_with("..."));
        assert_eq!(snippets[0].position, 281);
    }

    #[test]
    fn test_token_window_keeps_long_token_whole() {
        let content = format!("{} supercalifragilistic {}", "a".repeat(30), "b".repeat(30));
        let snippets = extract_snippets(&content, "zzz supercalifragilistic", 1, 5);
        assert_eq!(snippets.len(), 1);
        assert_eq!(snippets[0].position, 26);
        assert_eq!(snippets[0].text, "...aaaa supercalifragilistic bbbb...");
    }

    #[test]
    fn test_representative_fallback() {
        let content = "First paragraph.\n\nSecond paragraph.\n\n\nThird one.\n\nFourth is ignored.";
        let snippets = extract_snippets(content, "zebra", 5, 100);
        let texts: Vec<&str> = snippets.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts, vec!["First paragraph.", "Second paragraph.", "Third one."]);
        assert!((snippets[0].score - 0.3).abs() < 1e-9);
        assert!((snippets[2].score - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_fallback_truncates_to_twice_context() {
        let content = "z".repeat(50);
        let snippets = extract_snippets(&content, "nothing", 3, 10);
        assert_eq!(snippets[0].text, format!("{}...", "z".repeat(20)));
    }

    #[test]
    fn test_results_are_capped_and_sorted() {
        let content = (0..10)
            .map(|i| format!("entry {} mentions the word ferris", i))
            .collect::<Vec<_>>()
            .join("\n\n");
        let snippets = extract_snippets(&content, "ferris", 2, 5);
        assert_eq!(snippets.len(), 2);
        assert!(snippets[0].score >= snippets[1].score);
    }

    #[test]
    fn test_empty_content_has_no_snippets() {
        assert!(extract_snippets("   ", "query", 3, 10).is_empty());
    }

    #[test]
    fn test_non_ascii_offsets_stay_aligned() {
        let content = "Größe égal ÉTUDE finale";
        let snippets = extract_snippets(content, "étude", 1, 3);
        assert_eq!(snippets.len(), 1);
        assert_eq!(snippets[0].position, 8);
        assert!(snippets[0].text.contains("ÉTUDE"));
    }

    #[test]
    fn test_final_sigma_matches_query_sigma() {
        let content = "Intro paragraph.\n\nΗ ΟΔΟΣ είναι εδώ.";
        let snippets = extract_snippets(content, "οδος", 3, 5);
        assert!(!snippets.is_empty());
        assert!(snippets[0].text.contains("ΟΔΟΣ"));
        // Phrase hits carry the 0.5 bonus; the representative fallback tops out at 0.3.
        assert!(snippets[0].score > 1.0, "score {}", snippets[0].score);
        assert_eq!(fold("ΟΔΟΣ οδος"), "οδοσ οδοσ");
    }
}
