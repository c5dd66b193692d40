use crate::integration::support::{standard_catalog, Harness};
use agt::agent::AgentIdentity;
use agt::error::ApiError;
use agt::registry::{SearchFilters, SortKey};
use agt::types::Target;
use std::time::Duration;

fn reviewer() -> AgentIdentity {
    AgentIdentity::parse("acme/reviewer").unwrap()
}

#[tokio::test]
async fn repeated_lookups_within_ttl_hit_the_cache() {
    let h = Harness::standard();

    let first = h.registry.lookup(&reviewer()).await.unwrap().unwrap();
    let calls = h.transport.calls();
    let second = h.registry.lookup(&reviewer()).await.unwrap().unwrap();

    assert_eq!(first, second);
    assert_eq!(h.transport.calls(), calls);
}

#[tokio::test]
async fn clear_cache_forces_refetch() {
    let h = Harness::standard();
    h.registry.lookup(&reviewer()).await.unwrap();
    let calls = h.transport.calls();

    h.registry.clear_cache();
    h.registry.lookup(&reviewer()).await.unwrap();
    assert!(h.transport.calls() > calls);
}

#[tokio::test]
async fn expired_entries_fall_back_to_stale_on_failure() {
    let h = Harness::new(standard_catalog(), Duration::ZERO);
    let fresh = h.registry.lookup(&reviewer()).await.unwrap().unwrap();

    h.transport.set_failing(true);
    let calls = h.transport.calls();
    let stale = h.registry.lookup(&reviewer()).await.unwrap().unwrap();

    assert!(h.transport.calls() > calls, "expired entries are refetched");
    assert_eq!(stale, fresh);
}

#[tokio::test]
async fn cold_cache_failure_is_registry_unavailable() {
    let h = Harness::standard();
    h.transport.set_failing(true);

    let err = h.registry.lookup(&reviewer()).await.unwrap_err();
    assert!(matches!(err, ApiError::RegistryUnavailable(_)));
}

#[tokio::test]
async fn unreadable_partition_drops_only_its_agents() {
    let h = Harness::standard();
    h.transport.remove("index/categories/documentation.json");

    let agents = h.registry.all_agents().await.unwrap();
    let keys: Vec<String> = agents.iter().map(|a| a.key()).collect();
    assert!(keys.contains(&"acme/reviewer".to_string()));
    assert!(!keys.contains(&"docs-co/doc-writer".to_string()));
}

#[tokio::test]
async fn categories_come_from_the_index() {
    let h = Harness::standard();
    let categories = h.registry.categories().await.unwrap();
    assert_eq!(
        categories,
        vec![
            ("code-quality".to_string(), 2),
            ("documentation".to_string(), 1)
        ]
    );
}

#[tokio::test]
async fn search_filters_and_sorts() {
    let h = Harness::standard();

    let all = h
        .registry
        .search(None, &SearchFilters::default())
        .await
        .unwrap();
    let ids: Vec<&str> = all.iter().map(|a| a.id.as_str()).collect();
    assert_eq!(ids, vec!["reviewer", "linter", "doc-writer"]);

    let by_name = SearchFilters {
        sort: SortKey::Name,
        category: Some("code-quality".to_string()),
        ..Default::default()
    };
    let results = h.registry.search(None, &by_name).await.unwrap();
    let ids: Vec<&str> = results.iter().map(|a| a.id.as_str()).collect();
    assert_eq!(ids, vec!["linter", "reviewer"]);

    let text = h
        .registry
        .search(Some("DOCS-CO"), &SearchFilters::default())
        .await
        .unwrap();
    assert_eq!(text.len(), 1);

    let codex = SearchFilters {
        target: Some(Target::Codex),
        ..Default::default()
    };
    assert!(h.registry.search(None, &codex).await.unwrap().is_empty());
}
