//! Search engine over the note collection.
//!
//! Both search modes scan every note once, in the order they are handed in,
//! and return results sorted by descending score. Equal scores keep that
//! encounter order.
use fuzzy_matcher::{skim::SkimMatcherV2, FuzzyMatcher};
use log::{debug, info, trace};

use crate::{MatchField, Note, SearchMatch, SearchResult};

pub const TITLE_SCORE: i64 = 10;
pub const CONTENT_SCORE: i64 = 5;
pub const TAG_SCORE: i64 = 3;

/// Characters of content quoted in a content match
const SNIPPET_CHARS: usize = 100;
const ELLIPSIS: &str = "...";

/// Ranks notes by case-insensitive substring matches in title, content and tags.
///
/// A title match scores 10, a content match 5 and every matching tag 3.
/// Notes without any match are left out; an empty or whitespace-only query
/// matches nothing.
pub fn search_notes<'a, I>(notes: I, query: &str) -> Vec<SearchResult>
where
    I: IntoIterator<Item = &'a Note>,
{
    if query.trim().is_empty() {
        return Vec::new();
    }

    info!("Searching notes with query: '{}'", query);
    let needle = lowercase_chars(query);
    let query_len = query.chars().count();
    let mut results = Vec::new();

    for note in notes {
        trace!("Checking note: {}", note.id);
        let mut matches = Vec::new();
        let mut score = 0;

        if let Some(start) = find_ignore_case(&note.title, &needle) {
            matches.push(SearchMatch {
                field: MatchField::Title,
                text: note.title.clone(),
                start,
                end: start + query_len,
            });
            score += TITLE_SCORE;
        }

        if let Some(start) = find_ignore_case(&note.content, &needle) {
            matches.push(SearchMatch {
                field: MatchField::Content,
                text: snippet(&note.content, start),
                start,
                end: start + query_len,
            });
            score += CONTENT_SCORE;
        }

        for tag in &note.tags {
            if lowercase_chars(tag).contains(&needle) {
                matches.push(SearchMatch {
                    field: MatchField::Tags,
                    text: tag.clone(),
                    start: 0,
                    end: tag.chars().count(),
                });
                score += TAG_SCORE;
            }
        }

        if !matches.is_empty() {
            trace!("Note matched with score {}: {}", score, note.id);
            results.push(SearchResult {
                note: note.clone(),
                matches,
                score,
            });
        }
    }

    sort_by_score(&mut results);
    debug!("Returning {} sorted search results", results.len());
    results
}

/// Ranks notes with skim-style fuzzy matching; title matches weigh double.
pub fn fuzzy_search_notes<'a, I>(notes: I, query: &str) -> Vec<SearchResult>
where
    I: IntoIterator<Item = &'a Note>,
{
    if query.trim().is_empty() {
        return Vec::new();
    }

    info!("Fuzzy searching notes with query: '{}'", query);
    let matcher = SkimMatcherV2::default();
    let mut results = Vec::new();

    for note in notes {
        let mut matches = Vec::new();
        let mut score = 0;

        if let Some((title_score, indices)) = matcher.fuzzy_indices(&note.title, query) {
            let (start, end) = span(&indices);
            matches.push(SearchMatch {
                field: MatchField::Title,
                text: note.title.clone(),
                start,
                end,
            });
            score += title_score * 2;
        }

        if let Some((content_score, indices)) = matcher.fuzzy_indices(&note.content, query) {
            let (start, end) = span(&indices);
            matches.push(SearchMatch {
                field: MatchField::Content,
                text: snippet(&note.content, start),
                start,
                end,
            });
            score += content_score;
        }

        if !matches.is_empty() {
            results.push(SearchResult {
                note: note.clone(),
                matches,
                score,
            });
        }
    }

    sort_by_score(&mut results);
    debug!("Returning {} fuzzy search results", results.len());
    results
}

// Vec::sort_by is stable, so ties keep encounter order
fn sort_by_score(results: &mut [SearchResult]) {
    results.sort_by(|a, b| b.score.cmp(&a.score));
}

fn span(indices: &[usize]) -> (usize, usize) {
    match (indices.first(), indices.last()) {
        (Some(first), Some(last)) => (*first, last + 1),
        _ => (0, 0),
    }
}

fn snippet(content: &str, start: usize) -> String {
    let mut text: String = content.chars().skip(start).take(SNIPPET_CHARS).collect();
    text.push_str(ELLIPSIS);
    text
}

/// Lowercases one char at a time so both sides of a comparison fold alike;
/// `str::to_lowercase` maps a word-final Σ to ς instead of σ.
fn lowercase_chars(text: &str) -> String {
    text.chars().flat_map(char::to_lowercase).collect()
}

/// Character offset of the first case-insensitive occurrence of `needle`,
/// which must already be folded by [`lowercase_chars`].
fn find_ignore_case(haystack: &str, needle: &str) -> Option<usize> {
    let mut lowered = String::with_capacity(haystack.len());
    // (byte offset in `lowered`, char index in `haystack`)
    let mut boundaries = Vec::with_capacity(haystack.len());

    for (char_index, ch) in haystack.chars().enumerate() {
        for lower in ch.to_lowercase() {
            boundaries.push((lowered.len(), char_index));
            lowered.push(lower);
        }
    }

    let byte = lowered.find(needle)?;
    if byte == lowered.len() {
        return Some(haystack.chars().count());
    }
    boundaries
        .binary_search_by_key(&byte, |(offset, _)| *offset)
        .ok()
        .map(|i| boundaries[i].1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NoteDraft;

    fn note(title: &str, content: &str, tags: &[&str]) -> Note {
        Note::new(NoteDraft {
            title: Some(title.to_string()),
            content: Some(content.to_string()),
            tags: Some(tags.iter().map(|t| t.to_string()).collect()),
            ..Default::default()
        })
    }

    #[test]
    fn blank_queries_match_nothing() {
        let notes = vec![note("Anything", "at all", &["x"])];
        assert!(search_notes(&notes, "").is_empty());
        assert!(search_notes(&notes, "   ").is_empty());
        assert!(fuzzy_search_notes(&notes, " ").is_empty());
    }

    #[test]
    fn title_only_match_scores_ten() {
        let notes = vec![note("Rust Ownership", "borrowing rules", &[])];
        let results = search_notes(&notes, "rust");

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].score, 10);
        let title = &results[0].matches[0];
        assert_eq!(title.field, MatchField::Title);
        assert_eq!((title.start, title.end), (0, 4));
    }

    #[test]
    fn title_and_two_tags_score_sixteen() {
        let notes = vec![note("Garden plan", "", &["garden", "gardening", "spring"])];
        let results = search_notes(&notes, "GARDEN");

        assert_eq!(results[0].score, 16);
        let fields: Vec<MatchField> = results[0].matches.iter().map(|m| m.field).collect();
        assert_eq!(
            fields,
            vec![MatchField::Title, MatchField::Tags, MatchField::Tags]
        );
    }

    #[test]
    fn content_match_quotes_up_to_hundred_chars() {
        let body = format!("intro {}", "x".repeat(300));
        let notes = vec![note("Long", &body, &[])];
        let results = search_notes(&notes, "INTRO");

        let content = &results[0].matches[0];
        assert_eq!(content.field, MatchField::Content);
        assert_eq!(content.start, 0);
        assert_eq!(content.text.chars().count(), 103);
        assert!(content.text.ends_with("..."));
        assert_eq!(results[0].score, 5);
    }

    #[test]
    fn final_sigma_matches_its_own_text() {
        let notes = vec![note("ΟΔΟΣ", "ΟΔΟΣ", &["ΟΔΟΣ"])];

        let results = search_notes(&notes, "ΟΔΟΣ");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].score, 18);
        assert_eq!((results[0].matches[0].start, results[0].matches[0].end), (0, 4));

        assert_eq!(search_notes(&notes, "οδοσ").len(), 1);
    }

    #[test]
    fn offsets_are_character_based() {
        let notes = vec![note("Café Über", "", &[])];
        let results = search_notes(&notes, "über");
        assert_eq!(results[0].matches[0].start, 5);
        assert_eq!(results[0].matches[0].end, 9);
    }

    #[test]
    fn results_sort_descending_and_ties_keep_order() {
        let notes = vec![
            note("first", "plan here", &[]),
            note("plan", "", &[]),
            note("second", "another plan", &[]),
            note("unrelated", "", &[]),
        ];
        let results = search_notes(&notes, "plan");

        let titles: Vec<&str> = results.iter().map(|r| r.note.title.as_str()).collect();
        assert_eq!(titles, vec!["plan", "first", "second"]);
        assert!(results.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn fuzzy_search_prefers_title_hits() {
        let notes = vec![
            note("Meeting notes", "agenda", &[]),
            note("Groceries", "remember meeting snacks", &[]),
        ];
        let results = fuzzy_search_notes(&notes, "mtng");

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].note.title, "Meeting notes");
    }
}
