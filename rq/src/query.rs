//! Query parsing
//!
//! A query is free text, structured `key:value` filters, or both.
//! Tokenization splits on whitespace honoring double-quoted substrings.
//! A token is a filter iff it matches `<key>:<value>` with a recognized
//! key; everything else is a free-text term.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use regex::Regex;
use thiserror::Error;

/// Errors produced while interpreting query syntax
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("invalid wildcard pattern '{pattern}': {source}")]
    InvalidWildcard {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// Structured filter set extracted from a query.
///
/// Values within one field are OR-joined (`type:vm type:storage` matches
/// either); the fields themselves are AND-joined.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchFilters {
    /// `type:` tokens, alias-aware
    pub types: Vec<String>,
    /// `loc:` / `location:` tokens
    pub locations: Vec<String>,
    /// `rg:` / `resourcegroup:` tokens
    pub groups: Vec<String>,
    /// `name:` tokens (substring or wildcard)
    pub names: Vec<String>,
    /// `tag:key=value` tokens - key must be present with equal value
    pub tag_equals: BTreeMap<String, String>,
    /// `tag:key` tokens - key must be present
    pub tag_has: BTreeSet<String>,
}

impl SearchFilters {
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
            && self.locations.is_empty()
            && self.groups.is_empty()
            && self.names.is_empty()
            && self.tag_equals.is_empty()
            && self.tag_has.is_empty()
    }
}

/// A parsed query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    /// Original input, untouched
    pub raw: String,
    /// Free-text terms in input order
    pub terms: Vec<String>,
    pub filters: SearchFilters,
    /// True iff at least one filter was declared
    pub is_advanced: bool,
    /// True iff any free-text term contains `*` or `?`
    pub has_wildcards: bool,
}

impl SearchQuery {
    /// Parse a raw query string.
    ///
    /// Never fails: malformed filter tokens degrade to free-text terms.
    pub fn parse(raw: &str) -> Self {
        let tokens = tokenize(raw);
        let mut terms = Vec::new();
        let mut filters = SearchFilters::default();

        for token in tokens {
            match parse_filter(&token) {
                Some(filter) => apply_filter(&mut filters, filter),
                None => terms.push(token),
            }
        }

        let is_advanced = !filters.is_empty();
        let has_wildcards = terms.iter().any(|t| has_wildcards(t));

        Self {
            raw: raw.to_string(),
            terms,
            filters,
            is_advanced,
            has_wildcards,
        }
    }

    /// True when the query carries nothing to match on
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty() && !self.is_advanced
    }

    /// Filter-only query: filters declared, no free-text terms.
    /// Wildcards inside filter values do not change this classification.
    pub fn is_filter_only(&self) -> bool {
        self.terms.is_empty() && self.is_advanced
    }

    /// Re-serialize to canonical query syntax.
    ///
    /// Parsing the result yields identical `terms`, `filters`,
    /// `is_advanced`, and `has_wildcards` (the `raw` field differs).
    pub fn to_query_string(&self) -> String {
        let mut parts: Vec<String> = Vec::new();
        for term in &self.terms {
            parts.push(quote_if_needed(term));
        }
        for t in &self.filters.types {
            parts.push(format!("type:{}", quote_if_needed(t)));
        }
        for l in &self.filters.locations {
            parts.push(format!("location:{}", quote_if_needed(l)));
        }
        for g in &self.filters.groups {
            parts.push(format!("rg:{}", quote_if_needed(g)));
        }
        for n in &self.filters.names {
            parts.push(format!("name:{}", quote_if_needed(n)));
        }
        for (k, v) in &self.filters.tag_equals {
            parts.push(format!("tag:{}={}", k, v));
        }
        for k in &self.filters.tag_has {
            parts.push(format!("tag:{}", k));
        }
        parts.join(" ")
    }
}

impl fmt::Display for SearchQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_query_string())
    }
}

/// One recognized filter token
enum Filter {
    Type(String),
    Location(String),
    Group(String),
    Name(String),
    TagEquals(String, String),
    TagHas(String),
}

fn parse_filter(token: &str) -> Option<Filter> {
    let (key, value) = token.split_once(':')?;
    if value.is_empty() {
        return None;
    }
    match key.to_lowercase().as_str() {
        "type" => Some(Filter::Type(value.to_string())),
        "loc" | "location" => Some(Filter::Location(value.to_string())),
        "rg" | "resourcegroup" => Some(Filter::Group(value.to_string())),
        "name" => Some(Filter::Name(value.to_string())),
        "tag" => match value.split_once('=') {
            Some((k, v)) if !k.is_empty() => Some(Filter::TagEquals(k.to_string(), v.to_string())),
            Some(_) => None,
            None => Some(Filter::TagHas(value.to_string())),
        },
        _ => None,
    }
}

fn apply_filter(filters: &mut SearchFilters, filter: Filter) {
    match filter {
        Filter::Type(v) => filters.types.push(v),
        Filter::Location(v) => filters.locations.push(v),
        Filter::Group(v) => filters.groups.push(v),
        Filter::Name(v) => filters.names.push(v),
        Filter::TagEquals(k, v) => {
            filters.tag_equals.insert(k, v);
        }
        Filter::TagHas(k) => {
            filters.tag_has.insert(k);
        }
    }
}

/// Split on whitespace, honoring double-quoted substrings
fn tokenize(raw: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for c in raw.chars() {
        match c {
            '"' => in_quotes = !in_quotes,
            c if c.is_whitespace() && !in_quotes => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

fn quote_if_needed(s: &str) -> String {
    if s.chars().any(char::is_whitespace) {
        format!("\"{}\"", s)
    } else {
        s.to_string()
    }
}

/// Does the token contain shell-style wildcard metacharacters?
pub fn has_wildcards(token: &str) -> bool {
    token.contains('*') || token.contains('?')
}

/// Compile a shell-glob-style pattern to an anchored, case-insensitive
/// regex: `*` matches any run, `?` exactly one character.
pub fn wildcard_regex(pattern: &str) -> Result<Regex, QueryError> {
    let mut re = String::with_capacity(pattern.len() + 8);
    re.push_str("(?i)^");
    for c in pattern.chars() {
        match c {
            '*' => re.push_str(".*"),
            '?' => re.push('.'),
            c => re.push_str(&regex::escape(&c.to_string())),
        }
    }
    re.push('$');
    Regex::new(&re).map_err(|source| QueryError::InvalidWildcard {
        pattern: pattern.to_string(),
        source,
    })
}
