//! Registry client: catalog lookup, content download and search.

use crate::agent::{AgentDescriptor, AgentIdentity, LocalizedText};
use crate::config::RegistryConfig;
use crate::error::{ApiError, TransportError};
use crate::registry::cache::ResourceCache;
use crate::registry::search::{self, SearchFilters};
use crate::registry::transport::{CatalogTransport, HttpTransport};
use futures::future::join_all;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

const INDEX_PATH: &str = "index/main.json";
const INDEX_KEY: &str = "index";

/// Top-level catalog index.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogIndex {
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub last_updated: Option<String>,
    #[serde(default)]
    pub total_agents: u64,
    #[serde(default)]
    pub categories: BTreeMap<String, CategorySummary>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CategorySummary {
    #[serde(default)]
    pub count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default)]
    pub name: LocalizedText,
    #[serde(default)]
    pub description: LocalizedText,
}

#[derive(Debug, Deserialize)]
struct CategoryDocument {
    #[serde(default)]
    agents: Vec<AgentDescriptor>,
}

fn decode<T: DeserializeOwned>(path: &str, text: &str) -> Result<T, TransportError> {
    serde_json::from_str(text).map_err(|e| TransportError::Decode {
        path: path.to_string(),
        reason: e.to_string(),
    })
}

pub fn category_path(category: &str) -> String {
    format!("index/categories/{}.json", category)
}

pub fn content_path(author: &str, id: &str, version: &str) -> String {
    format!("agents/{}/{}/{}_v{}.md", author, id, id, version)
}

/// Read access to the remote agent catalog.
///
/// Catalog documents go through a TTL cache; agent content is always fetched.
pub struct RegistryClient {
    transport: Arc<dyn CatalogTransport>,
    index_cache: ResourceCache<Arc<CatalogIndex>>,
    category_cache: ResourceCache<Arc<Vec<AgentDescriptor>>>,
}

impl RegistryClient {
    pub fn new(transport: Arc<dyn CatalogTransport>, ttl: Duration) -> Self {
        Self {
            transport,
            index_cache: ResourceCache::new(ttl),
            category_cache: ResourceCache::new(ttl),
        }
    }

    /// HTTP-backed client for the configured registry.
    pub fn from_config(config: &RegistryConfig) -> Result<Self, ApiError> {
        let transport = HttpTransport::new(&config.url, Duration::from_secs(config.timeout))?;
        Ok(Self::new(
            Arc::new(transport),
            Duration::from_secs(config.cache_ttl),
        ))
    }

    pub async fn index(&self) -> Result<Arc<CatalogIndex>, ApiError> {
        let transport = Arc::clone(&self.transport);
        self.index_cache
            .get_or_fetch(INDEX_KEY, || async move {
                let text = transport.get_text(INDEX_PATH).await?;
                decode::<CatalogIndex>(INDEX_PATH, &text).map(Arc::new)
            })
            .await
    }

    /// Category names with their published counts.
    pub async fn categories(&self) -> Result<Vec<(String, u64)>, ApiError> {
        let index = self.index().await?;
        Ok(index
            .categories
            .iter()
            .map(|(name, summary)| (name.clone(), summary.count))
            .collect())
    }

    pub async fn category_agents(
        &self,
        category: &str,
    ) -> Result<Arc<Vec<AgentDescriptor>>, ApiError> {
        let key = format!("category:{}", category);
        let path = category_path(category);
        let transport = Arc::clone(&self.transport);
        self.category_cache
            .get_or_fetch(&key, || async move {
                let text = transport.get_text(&path).await?;
                decode::<CategoryDocument>(&path, &text).map(|doc| Arc::new(doc.agents))
            })
            .await
    }

    /// Every agent in the catalog, deduplicated by `(author, id)`.
    ///
    /// Category partitions are fetched concurrently; one that cannot be read
    /// contributes nothing.
    pub async fn all_agents(&self) -> Result<Vec<AgentDescriptor>, ApiError> {
        let index = self.index().await?;
        let names: Vec<&String> = index.categories.keys().collect();
        let partitions = join_all(names.iter().map(|name| self.category_agents(name))).await;

        let mut seen = HashSet::new();
        let mut agents = Vec::new();
        for (name, partition) in names.iter().zip(partitions) {
            match partition {
                Ok(list) => {
                    for agent in list.iter() {
                        if seen.insert((agent.author.clone(), agent.id.clone())) {
                            agents.push(agent.clone());
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(category = %name, error = %e, "Skipping unreadable category");
                }
            }
        }
        Ok(agents)
    }

    /// Resolve an identity against the catalog.
    ///
    /// With an author the `(author, id)` pair must match exactly. A bare name
    /// takes the first catalog entry with that id.
    pub async fn lookup(
        &self,
        identity: &AgentIdentity,
    ) -> Result<Option<AgentDescriptor>, ApiError> {
        let agents = self.all_agents().await?;
        if let Some(author) = &identity.author {
            return Ok(agents
                .into_iter()
                .find(|a| &a.author == author && a.id == identity.name));
        }

        let mut matches = agents.into_iter().filter(|a| a.id == identity.name);
        let first = matches.next();
        if let Some(found) = &first {
            let others: Vec<String> = matches.map(|a| a.key()).collect();
            if !others.is_empty() {
                tracing::warn!(
                    name = %identity.name,
                    chosen = %found.key(),
                    also = %others.join(", "),
                    "Agent name matches several authors, using the first"
                );
            }
        }
        Ok(first)
    }

    /// Raw markdown for one published version.
    ///
    /// Failures here belong to one agent, never to the whole catalog.
    pub async fn fetch_content(
        &self,
        agent: &AgentDescriptor,
        version: &str,
    ) -> Result<String, ApiError> {
        let path = content_path(&agent.author, &agent.id, version);
        self.transport.get_text(&path).await.map_err(|e| match e {
            TransportError::NotFound { .. } => ApiError::ContentNotFound {
                id: agent.key(),
                version: version.to_string(),
            },
            other => ApiError::ContentUnavailable {
                id: agent.key(),
                version: version.to_string(),
                reason: other.to_string(),
            },
        })
    }

    pub async fn search(
        &self,
        query: Option<&str>,
        filters: &SearchFilters,
    ) -> Result<Vec<AgentDescriptor>, ApiError> {
        let agents = match &filters.category {
            Some(category) => self.category_agents(category).await?.as_ref().clone(),
            None => self.all_agents().await?,
        };
        Ok(search::apply(&agents, query, filters))
    }

    pub fn clear_cache(&self) {
        self.index_cache.clear();
        self.category_cache.clear();
    }
}
