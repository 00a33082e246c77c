//! Search filtering and ordering over the cached catalogue.
//!
//! Pure and synchronous: the same inputs always produce the same sequence.
//! Titles and the query are compared after lower-casing and stripping
//! diacritics, so "Amélie" matches "amelie".

use std::cmp::Ordering;
use std::collections::HashSet;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use crate::domain::{SortKey, SortOrder};
use crate::models::Movie;

/// Sort settings applied to a search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QueryOptions {
    pub sort_key: SortKey,
    pub sort_order: SortOrder,
}

impl QueryOptions {
    #[must_use]
    pub const fn new(sort_key: SortKey, sort_order: SortOrder) -> Self {
        Self {
            sort_key,
            sort_order,
        }
    }
}

/// How directly a query matches a title. Lower is more relevant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MatchTier {
    /// Title starts with the query.
    Prefix = 0,
    /// Query starts a word inside the title.
    WordBoundary = 1,
    /// Query only occurs mid-word.
    Interior = 2,
}

/// Lower-cases and removes combining marks after canonical decomposition.
#[must_use]
pub fn normalize(text: &str) -> String {
    text.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Tier of `needle` within `title`, both already normalized.
#[must_use]
pub fn match_tier(title: &str, needle: &str) -> Option<MatchTier> {
    if needle.is_empty() {
        return None;
    }
    if title.starts_with(needle) {
        return Some(MatchTier::Prefix);
    }

    let mut found = false;
    for (index, _) in title.match_indices(needle) {
        found = true;
        let preceded_by_word_char = title[..index]
            .chars()
            .next_back()
            .is_some_and(char::is_alphanumeric);
        if !preceded_by_word_char {
            return Some(MatchTier::WordBoundary);
        }
    }

    found.then_some(MatchTier::Interior)
}

/// Case-insensitive, accent-aware title collation.
///
/// Accents only break ties between titles that are otherwise equal, and case
/// never does.
#[must_use]
pub fn collate_titles(a: &str, b: &str) -> Ordering {
    collate(&normalize(a), a, &normalize(b), b)
}

fn collate(a_normalized: &str, a: &str, b_normalized: &str, b: &str) -> Ordering {
    a_normalized
        .cmp(b_normalized)
        .then_with(|| a.to_lowercase().cmp(&b.to_lowercase()))
}

struct Candidate<'a> {
    movie: &'a Movie,
    title: String,
    tier: MatchTier,
}

/// Filters `movies` by `search` and orders the matches.
///
/// An empty (or whitespace-only) search yields no results. Matches are
/// deduplicated by id keeping the first occurrence. Sorting is stable, and
/// the direction reverses the whole comparison including relevance tiers.
#[must_use]
pub fn query(movies: &[Movie], search: &str, sort_key: SortKey, sort_order: SortOrder) -> Vec<Movie> {
    let needle = normalize(search.trim());
    if needle.is_empty() {
        return Vec::new();
    }

    let mut seen = HashSet::new();
    let mut candidates: Vec<Candidate<'_>> = movies
        .iter()
        .filter_map(|movie| {
            let title = normalize(&movie.title);
            let tier = match_tier(&title, &needle)?;
            Some(Candidate { movie, title, tier })
        })
        .filter(|c| seen.insert(c.movie.id))
        .collect();

    candidates.sort_by(|a, b| sort_order.apply(compare(a, b, sort_key)));

    candidates.into_iter().map(|c| c.movie.clone()).collect()
}

/// [`query`] with bundled options.
#[must_use]
pub fn run_query(movies: &[Movie], search: &str, options: QueryOptions) -> Vec<Movie> {
    query(movies, search, options.sort_key, options.sort_order)
}

fn compare(a: &Candidate<'_>, b: &Candidate<'_>, sort_key: SortKey) -> Ordering {
    match sort_key {
        SortKey::Title => a
            .tier
            .cmp(&b.tier)
            .then_with(|| collate(&a.title, &a.movie.title, &b.title, &b.movie.title)),
        SortKey::Rank => a.movie.rating().total_cmp(&b.movie.rating()),
    }
}
