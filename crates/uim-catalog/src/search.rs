//! Filter and natural-language search over the catalog.
//!
//! Both paths share one pagination contract: `skip` must not be negative,
//! `limit` must be positive and is clamped to the configured maximum, and an empty page
//! at `skip == 0` means "not found" while an empty page further on is just
//! the end of the results.

use crate::error::CatalogError;
use crate::store::CatalogStore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;
use uim_core::{CatalogConfig, Intent};

const STOPWORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "by", "for", "from", "i", "in", "is", "it", "me",
    "my", "of", "on", "or", "that", "the", "this", "to", "want", "with",
];

/// Validated pagination window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub skip: u32,
    pub limit: u32,
}

impl Page {
    /// Validate raw request values. `limit` defaults to `default_limit`, must
    /// be at least 1 and is clamped to `max_limit`.
    pub fn new(
        skip: Option<i64>,
        limit: Option<i64>,
        default_limit: u32,
        max_limit: u32,
    ) -> Result<Self, CatalogError> {
        let skip = skip.unwrap_or(0);
        if skip < 0 {
            return Err(CatalogError::InvalidQuery("skip must not be negative".into()));
        }
        let limit = limit.unwrap_or(i64::from(default_limit));
        if limit < 1 {
            return Err(CatalogError::InvalidQuery("limit must be positive".into()));
        }

        let skip = u32::try_from(skip)
            .map_err(|_| CatalogError::InvalidQuery("skip is too large".into()))?;
        let limit = limit.min(i64::from(max_limit.max(1))) as u32;
        Ok(Self { skip, limit })
    }
}

/// Structured filter. Absent fields do not constrain the result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterQuery {
    /// Case-insensitive substring of the intent name.
    pub name: Option<String>,
    /// Exact intent uid.
    pub uid: Option<String>,
    /// Case-insensitive substring of the description.
    pub description: Option<String>,
    /// ANY-match over exact tag names.
    pub tags: Vec<String>,
}

impl FilterQuery {
    /// Build a filter from raw request values; blank strings are ignored and
    /// `tags` is comma-separated.
    pub fn from_params(
        name: Option<String>,
        uid: Option<String>,
        description: Option<String>,
        tags: Option<&str>,
    ) -> Self {
        let non_blank = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
        Self {
            name: non_blank(name),
            uid: non_blank(uid),
            description: non_blank(description),
            tags: tags.map(split_tags).unwrap_or_default(),
        }
    }
}

/// Split a comma-separated tag list, trimming whitespace around each name.
pub fn split_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// One page of search results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchPage {
    pub items: Vec<Intent>,
    pub skip: u32,
    pub limit: u32,
}

impl SearchPage {
    /// No matches at all, as opposed to paging past the last match.
    pub fn is_not_found(&self) -> bool {
        self.items.is_empty() && self.skip == 0
    }
}

/// Read path over a catalog store.
#[derive(Clone)]
pub struct SearchEngine {
    store: Arc<dyn CatalogStore>,
    default_limit: u32,
    max_limit: u32,
    max_candidates: u32,
}

impl SearchEngine {
    pub fn new(store: Arc<dyn CatalogStore>, config: &CatalogConfig) -> Self {
        Self {
            store,
            default_limit: config.default_page_size,
            max_limit: config.max_page_size,
            max_candidates: config.max_search_candidates,
        }
    }

    /// Validate pagination with this engine's limits.
    pub fn page(&self, skip: Option<i64>, limit: Option<i64>) -> Result<Page, CatalogError> {
        Page::new(skip, limit, self.default_limit, self.max_limit)
    }

    pub async fn filter(&self, query: &FilterQuery, page: Page) -> Result<SearchPage, CatalogError> {
        let items = self.store.filter_intents(query, page).await?;
        debug!(?query, skip = page.skip, limit = page.limit, hits = items.len(), "filter search");
        Ok(SearchPage {
            items,
            skip: page.skip,
            limit: page.limit,
        })
    }

    /// Rank intents by relevance to free text.
    ///
    /// Candidates must contain every non-stopword query term in their name or
    /// description. If any candidate's description contains the whole query
    /// as a phrase, only phrase matches are returned. Ranking is by term
    /// frequency (name hits weigh double), ties in insertion order. Only the
    /// first `max_search_candidates` matching intents are ranked.
    pub async fn natural(&self, text: &str, page: Page) -> Result<SearchPage, CatalogError> {
        let tokens = tokenize(text);
        let terms: Vec<String> = tokens
            .iter()
            .filter(|t| !STOPWORDS.contains(&t.as_str()))
            .cloned()
            .collect();

        let candidates = self.store.intents_with_terms(&terms, self.max_candidates).await?;
        if candidates.len() >= self.max_candidates as usize {
            debug!(query = text, cap = self.max_candidates, "candidate set truncated");
        }
        let phrase = tokens.join(" ");

        let mut scored: Vec<(bool, usize, Intent)> = candidates
            .into_iter()
            .map(|intent| {
                let description = tokenize(&intent.description).join(" ");
                let name = tokenize(&intent.name).join(" ");
                let is_phrase = !phrase.is_empty() && contains_phrase(&description, &phrase);
                let score = terms
                    .iter()
                    .map(|t| description.matches(t.as_str()).count() + 2 * name.matches(t.as_str()).count())
                    .sum();
                (is_phrase, score, intent)
            })
            .collect();

        if scored.iter().any(|(is_phrase, _, _)| *is_phrase) {
            scored.retain(|(is_phrase, _, _)| *is_phrase);
        }
        // Stable sort keeps insertion order among equal scores.
        scored.sort_by(|a, b| b.1.cmp(&a.1));

        let items: Vec<Intent> = scored
            .into_iter()
            .map(|(_, _, intent)| intent)
            .skip(page.skip as usize)
            .take(page.limit as usize)
            .collect();

        debug!(query = text, ?terms, hits = items.len(), "natural-language search");
        Ok(SearchPage {
            items,
            skip: page.skip,
            limit: page.limit,
        })
    }
}

/// Case folding shared by stored text and queries.
pub fn fold(text: &str) -> String {
    text.to_lowercase()
}

fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(fold)
        .collect()
}

/// Whole-word phrase containment over space-joined tokens.
fn contains_phrase(haystack: &str, phrase: &str) -> bool {
    let padded = format!(" {} ", haystack);
    padded.contains(&format!(" {} ", phrase))
}
