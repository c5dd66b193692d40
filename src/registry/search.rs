//! Catalog filtering and ordering.

use crate::agent::AgentDescriptor;
use crate::error::ApiError;
use crate::types::Target;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortKey {
    #[default]
    Downloads,
    Rating,
    Name,
    Updated,
}

impl SortKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::Downloads => "downloads",
            SortKey::Rating => "rating",
            SortKey::Name => "name",
            SortKey::Updated => "updated",
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortKey {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "downloads" => Ok(SortKey::Downloads),
            "rating" => Ok(SortKey::Rating),
            "name" => Ok(SortKey::Name),
            "updated" | "updated-at" => Ok(SortKey::Updated),
            other => Err(ApiError::ConfigError(format!(
                "Unknown sort key '{}' (expected downloads, rating, name or updated)",
                other
            ))),
        }
    }
}

/// Search predicates. Every set field must match.
#[derive(Debug, Clone, Default)]
pub struct SearchFilters {
    pub category: Option<String>,
    /// Substring of any tag
    pub tag: Option<String>,
    /// Substring of the author
    pub author: Option<String>,
    pub target: Option<Target>,
    /// Language code with localized text present
    pub language: Option<String>,
    pub sort: SortKey,
    pub limit: Option<usize>,
}

fn contains_ci(haystack: &str, needle_lower: &str) -> bool {
    haystack.to_lowercase().contains(needle_lower)
}

fn matches_text(agent: &AgentDescriptor, query_lower: &str) -> bool {
    contains_ci(&agent.id, query_lower)
        || agent.name.values().any(|v| contains_ci(v, query_lower))
        || agent.description.values().any(|v| contains_ci(v, query_lower))
        || agent.tags.iter().any(|t| contains_ci(t, query_lower))
}

impl SearchFilters {
    pub fn matches(&self, agent: &AgentDescriptor) -> bool {
        if let Some(category) = &self.category {
            if &agent.category != category {
                return false;
            }
        }
        if let Some(tag) = &self.tag {
            let tag = tag.to_lowercase();
            if !agent.tags.iter().any(|t| contains_ci(t, &tag)) {
                return false;
            }
        }
        if let Some(author) = &self.author {
            if !contains_ci(&agent.author, &author.to_lowercase()) {
                return false;
            }
        }
        if let Some(target) = self.target {
            if !agent.supports(target) {
                return false;
            }
        }
        if let Some(language) = &self.language {
            if !agent.has_language(language) {
                return false;
            }
        }
        true
    }
}

fn compare(sort: SortKey, a: &AgentDescriptor, b: &AgentDescriptor) -> Ordering {
    match sort {
        SortKey::Downloads => b.downloads.cmp(&a.downloads),
        SortKey::Rating => b.rating.total_cmp(&a.rating),
        SortKey::Name => {
            let name_a = display_name(a);
            let name_b = display_name(b);
            name_a.cmp(name_b)
        }
        // Entries without a timestamp sort last
        SortKey::Updated => match (&a.updated_at, &b.updated_at) {
            (Some(x), Some(y)) => y.cmp(x),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        },
    }
}

fn display_name(agent: &AgentDescriptor) -> &str {
    match agent.name.preferred() {
        "" => &agent.id,
        name => name,
    }
}

/// Filter, order and truncate a catalog.
pub fn apply(
    agents: &[AgentDescriptor],
    query: Option<&str>,
    filters: &SearchFilters,
) -> Vec<AgentDescriptor> {
    let query = query
        .map(|q| q.trim().to_lowercase())
        .filter(|q| !q.is_empty());

    let mut results: Vec<AgentDescriptor> = agents
        .iter()
        .filter(|agent| filters.matches(agent))
        .filter(|agent| query.as_deref().map(|q| matches_text(agent, q)).unwrap_or(true))
        .cloned()
        .collect();

    results.sort_by(|a, b| compare(filters.sort, a, b));
    if let Some(limit) = filters.limit {
        results.truncate(limit);
    }
    results
}
