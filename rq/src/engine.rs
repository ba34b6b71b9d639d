//! Filter + scoring execution
//!
//! The engine holds a pre-lowered copy of every record so a query is a
//! single allocation-light pass over the slice. Rebuild cost is paid once
//! per resource refresh, not per keystroke.

use std::collections::BTreeMap;

use regex::Regex;
use tracing::debug;

use crate::aliases;
use crate::query::{SearchFilters, SearchQuery, has_wildcards, wildcard_regex};
use crate::record::Record;

/// Score assigned to every record of a filter-only query
pub const FILTER_ONLY_SCORE: i64 = 100;

const SCORE_NAME_EXACT: i64 = 1800;
const SCORE_NAME_PREFIX: i64 = 1300;
const SCORE_NAME_SUBSTRING: i64 = 800;
const SCORE_TYPE: i64 = 600;
const SCORE_GROUP: i64 = 400;
const SCORE_LOCATION: i64 = 300;
const SCORE_TAG: i64 = 200;

/// Where a result matched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchType {
    Name,
    Location,
    Type,
    ResourceGroup,
    Tag,
    Filter,
}

impl MatchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Location => "location",
            Self::Type => "type",
            Self::ResourceGroup => "resourceGroup",
            Self::Tag => "tag",
            Self::Filter => "filter",
        }
    }
}

/// One scored hit
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub resource_id: String,
    pub resource_name: String,
    pub match_type: MatchType,
    /// The field text the best match landed on
    pub match_text: String,
    /// The term or filter that produced the match
    pub match_value: String,
    pub score: i64,
}

/// Record with lowercased fields cached for matching
#[derive(Debug, Clone)]
struct Indexed {
    record: Record,
    name_lower: String,
    type_lower: String,
    group_lower: String,
    location_lower: String,
    tags_lower: BTreeMap<String, String>,
}

impl Indexed {
    fn new(record: Record) -> Self {
        let tags_lower = record
            .tags
            .iter()
            .map(|(k, v)| (k.to_lowercase(), v.to_lowercase()))
            .collect();
        Self {
            name_lower: record.name.to_lowercase(),
            type_lower: record.resource_type.to_lowercase(),
            group_lower: record.resource_group.to_lowercase(),
            location_lower: record.location.to_lowercase(),
            tags_lower,
            record,
        }
    }
}

/// The search engine. Owns its record slice; rebuilt on refresh.
#[derive(Debug, Default)]
pub struct SearchEngine {
    records: Vec<Indexed>,
}

impl SearchEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<Record>) -> Self {
        let mut engine = Self::new();
        engine.set_records(records);
        engine
    }

    /// Replace the indexed record set
    pub fn set_records(&mut self, records: Vec<Record>) {
        debug!(count = records.len(), "SearchEngine::set_records");
        self.records = records.into_iter().map(Indexed::new).collect();
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records currently indexed (original form)
    pub fn records(&self) -> impl Iterator<Item = &Record> {
        self.records.iter().map(|i| &i.record)
    }

    /// Execute a parsed query.
    ///
    /// Results are sorted by score descending, ties broken by resource
    /// name ascending. A record with score 0 never appears.
    pub fn search(&self, query: &SearchQuery) -> Vec<SearchResult> {
        if query.is_empty() {
            return Vec::new();
        }

        let term_matchers: Vec<TermMatcher> = query.terms.iter().map(|t| TermMatcher::new(t)).collect();

        let mut results: Vec<SearchResult> = Vec::new();
        for indexed in &self.records {
            if !passes_filters(indexed, &query.filters) {
                continue;
            }

            if query.is_filter_only() {
                results.push(SearchResult {
                    resource_id: indexed.record.id.clone(),
                    resource_name: indexed.record.name.clone(),
                    match_type: MatchType::Filter,
                    match_text: indexed.record.name.clone(),
                    match_value: query.to_query_string(),
                    score: FILTER_ONLY_SCORE,
                });
                continue;
            }

            if let Some(hit) = score_record(indexed, &term_matchers) {
                results.push(hit);
            }
        }

        results.sort_by(|a, b| {
            b.score
                .cmp(&a.score)
                .then_with(|| a.resource_name.to_lowercase().cmp(&b.resource_name.to_lowercase()))
                .then_with(|| a.resource_name.cmp(&b.resource_name))
        });
        results
    }
}

/// A free-text term, pre-lowered and pre-compiled when it carries wildcards
struct TermMatcher {
    raw: String,
    lower: String,
    glob: Option<Regex>,
}

impl TermMatcher {
    fn new(term: &str) -> Self {
        let glob = if has_wildcards(term) {
            wildcard_regex(term).ok()
        } else {
            None
        };
        Self {
            raw: term.to_string(),
            lower: term.to_lowercase(),
            glob,
        }
    }

    /// Best field match for this term, if any: (type, matched text, base score)
    fn best_match(&self, rec: &Indexed) -> Option<(MatchType, String, i64)> {
        if let Some(re) = &self.glob {
            return self.best_glob_match(rec, re);
        }

        if rec.name_lower == self.lower {
            return Some((MatchType::Name, rec.record.name.clone(), SCORE_NAME_EXACT));
        }
        if rec.name_lower.starts_with(&self.lower) {
            return Some((MatchType::Name, rec.record.name.clone(), SCORE_NAME_PREFIX));
        }
        if rec.name_lower.contains(&self.lower) {
            return Some((MatchType::Name, rec.record.name.clone(), SCORE_NAME_SUBSTRING));
        }
        if rec.type_lower.contains(&self.lower) {
            return Some((MatchType::Type, rec.record.resource_type.clone(), SCORE_TYPE));
        }
        if rec.group_lower.contains(&self.lower) {
            return Some((MatchType::ResourceGroup, rec.record.resource_group.clone(), SCORE_GROUP));
        }
        if rec.location_lower.contains(&self.lower) {
            return Some((MatchType::Location, rec.record.location.clone(), SCORE_LOCATION));
        }
        for (k, v) in &rec.tags_lower {
            if k.contains(&self.lower) || v.contains(&self.lower) {
                let text = rec
                    .record
                    .tags
                    .iter()
                    .find(|(rk, _)| rk.to_lowercase() == *k)
                    .map(|(rk, rv)| format!("{}={}", rk, rv))
                    .unwrap_or_else(|| k.clone());
                return Some((MatchType::Tag, text, SCORE_TAG));
            }
        }
        None
    }

    fn best_glob_match(&self, rec: &Indexed, re: &Regex) -> Option<(MatchType, String, i64)> {
        if re.is_match(&rec.name_lower) {
            return Some((MatchType::Name, rec.record.name.clone(), SCORE_NAME_SUBSTRING));
        }
        if re.is_match(&rec.type_lower) {
            return Some((MatchType::Type, rec.record.resource_type.clone(), SCORE_TYPE));
        }
        if re.is_match(&rec.group_lower) {
            return Some((MatchType::ResourceGroup, rec.record.resource_group.clone(), SCORE_GROUP));
        }
        if re.is_match(&rec.location_lower) {
            return Some((MatchType::Location, rec.record.location.clone(), SCORE_LOCATION));
        }
        for (k, v) in &rec.tags_lower {
            if re.is_match(k) || re.is_match(v) {
                return Some((MatchType::Tag, format!("{}={}", k, v), SCORE_TAG));
            }
        }
        None
    }
}

/// Shorter matched text earns a small bonus
fn brevity_bonus(match_text: &str) -> i64 {
    (40 - match_text.len() as i64).max(0)
}

fn score_record(rec: &Indexed, terms: &[TermMatcher]) -> Option<SearchResult> {
    let mut total = 0i64;
    let mut best: Option<(MatchType, String, String, i64)> = None;

    for term in terms {
        if let Some((match_type, text, base)) = term.best_match(rec) {
            let contribution = base + brevity_bonus(&text);
            total += contribution;
            let better = best.as_ref().map(|(_, _, _, s)| contribution > *s).unwrap_or(true);
            if better {
                best = Some((match_type, text, term.raw.clone(), contribution));
            }
        }
    }

    let (match_type, match_text, match_value, _) = best?;
    if total == 0 {
        return None;
    }
    Some(SearchResult {
        resource_id: rec.record.id.clone(),
        resource_name: rec.record.name.clone(),
        match_type,
        match_text,
        match_value,
        score: total,
    })
}

/// Substring match, or glob match when the token has wildcards
fn text_filter_matches(token: &str, field_lower: &str, substring: bool) -> bool {
    let token_lower = token.to_lowercase();
    if has_wildcards(&token_lower) {
        return wildcard_regex(&token_lower)
            .map(|re| re.is_match(field_lower))
            .unwrap_or(false);
    }
    if substring {
        field_lower.contains(&token_lower)
    } else {
        field_lower == token_lower
    }
}

fn passes_filters(rec: &Indexed, filters: &SearchFilters) -> bool {
    if !filters.types.is_empty() && !filters.types.iter().any(|t| aliases::matches_type(t, &rec.type_lower)) {
        return false;
    }
    if !filters.locations.is_empty()
        && !filters
            .locations
            .iter()
            .any(|l| text_filter_matches(l, &rec.location_lower, false))
    {
        return false;
    }
    if !filters.groups.is_empty()
        && !filters
            .groups
            .iter()
            .any(|g| text_filter_matches(g, &rec.group_lower, false))
    {
        return false;
    }
    if !filters.names.is_empty()
        && !filters
            .names
            .iter()
            .any(|n| text_filter_matches(n, &rec.name_lower, true))
    {
        return false;
    }
    for (key, value) in &filters.tag_equals {
        match rec.tags_lower.get(&key.to_lowercase()) {
            Some(v) if *v == value.to_lowercase() => {}
            _ => return false,
        }
    }
    for key in &filters.tag_has {
        if !rec.tags_lower.contains_key(&key.to_lowercase()) {
            return false;
        }
    }
    true
}
