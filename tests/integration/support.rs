use agt::error::TransportError;
use agt::installer::{InstallLayout, Installer};
use agt::manifest::JsonManifestStore;
use agt::registry::{CatalogTransport, RegistryClient};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::json;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

/// Catalog documents served from memory.
///
/// Counts every request and can be switched into failure mode to simulate an
/// unreachable registry.
#[derive(Default)]
pub struct FakeTransport {
    bodies: Mutex<HashMap<String, String>>,
    statuses: Mutex<HashMap<String, u16>>,
    calls: AtomicUsize,
    failing: AtomicBool,
}

impl FakeTransport {
    pub fn set(&self, path: &str, body: impl Into<String>) {
        self.bodies.lock().insert(path.to_string(), body.into());
    }

    pub fn remove(&self, path: &str) {
        self.bodies.lock().remove(path);
    }

    /// Answer requests for `path` with an HTTP error status.
    pub fn fail_path(&self, path: &str, status: u16) {
        self.statuses.lock().insert(path.to_string(), status);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Publish `agents` as the whole catalog, replacing index and partitions.
    pub fn publish_catalog(&self, agents: &[CatalogEntry]) {
        let mut partitions: BTreeMap<&str, Vec<serde_json::Value>> = BTreeMap::new();
        for agent in agents {
            partitions.entry(agent.category).or_default().push(json!({
                "id": agent.id,
                "author": agent.author,
                "category": agent.category,
                "version": agent.version,
                "tags": ["review"],
                "compatibility": {"claudeCode": {"minVersion": "1.0.0"}},
                "downloads": agent.downloads,
                "rating": 4.0,
                "name": {"en": agent.id},
                "description": {"en": format!("{} by {}", agent.id, agent.author)},
            }));
        }

        let categories: serde_json::Map<String, serde_json::Value> = partitions
            .iter()
            .map(|(name, list)| (name.to_string(), json!({"count": list.len()})))
            .collect();
        self.set(
            "index/main.json",
            json!({
                "version": "1.0.0",
                "totalAgents": agents.len(),
                "categories": categories,
            })
            .to_string(),
        );
        for (name, list) in partitions {
            self.set(
                &format!("index/categories/{}.json", name),
                json!({ "agents": list }).to_string(),
            );
        }
    }

    /// Content for one published version.
    pub fn publish_content(&self, author: &str, id: &str, version: &str) {
        self.set(
            &format!("agents/{}/{}/{}_v{}.md", author, id, id, version),
            agent_body(id, version),
        );
    }
}

#[async_trait]
impl CatalogTransport for FakeTransport {
    async fn get_text(&self, path: &str) -> Result<String, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(TransportError::Network("connection refused".to_string()));
        }
        if let Some(status) = self.statuses.lock().get(path) {
            return Err(TransportError::Status {
                url: path.to_string(),
                status: *status,
            });
        }
        self.bodies
            .lock()
            .get(path)
            .cloned()
            .ok_or_else(|| TransportError::NotFound {
                url: path.to_string(),
            })
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CatalogEntry {
    pub author: &'static str,
    pub id: &'static str,
    pub version: &'static str,
    pub category: &'static str,
    pub downloads: u64,
}

pub const fn entry(
    author: &'static str,
    id: &'static str,
    version: &'static str,
    category: &'static str,
    downloads: u64,
) -> CatalogEntry {
    CatalogEntry {
        author,
        id,
        version,
        category,
        downloads,
    }
}

pub fn agent_body(id: &str, version: &str) -> String {
    format!("# {}\n\nVersion {} of the agent.\n", id, version)
}

/// Default catalog: two code-quality agents and one documentation agent.
pub fn standard_catalog() -> Arc<FakeTransport> {
    let transport = Arc::new(FakeTransport::default());
    transport.publish_catalog(&[
        entry("acme", "reviewer", "2.0.0", "code-quality", 900),
        entry("acme", "linter", "1.1.0", "code-quality", 300),
        entry("docs-co", "doc-writer", "1.0.0", "documentation", 50),
    ]);
    transport.publish_content("acme", "reviewer", "2.0.0");
    transport.publish_content("acme", "linter", "1.0.0");
    transport.publish_content("acme", "linter", "1.1.0");
    transport.publish_content("docs-co", "doc-writer", "1.0.0");
    transport
}

/// Installer wired to a fake catalog and a temp home directory.
pub struct Harness {
    pub home: TempDir,
    pub transport: Arc<FakeTransport>,
    pub registry: Arc<RegistryClient>,
    pub store: Arc<JsonManifestStore>,
    pub installer: Installer,
}

impl Harness {
    pub fn new(transport: Arc<FakeTransport>, ttl: Duration) -> Self {
        let home = TempDir::new().unwrap();
        let registry = Arc::new(RegistryClient::new(transport.clone(), ttl));
        let store = Arc::new(JsonManifestStore::new(
            home.path().join(".agents").join("installed.json"),
        ));
        let installer = Installer::new(
            registry.clone(),
            store.clone(),
            InstallLayout::new(home.path()),
        );
        Self {
            home,
            transport,
            registry,
            store,
            installer,
        }
    }

    pub fn standard() -> Self {
        Self::new(standard_catalog(), Duration::from_secs(300))
    }
}
