use agt::error::ApiError;
use agt::publish::{LocalStaging, PublishDestination, PublishReceipt, PublishService};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn agent_file(id: &str, version: &str, category: &str) -> String {
    format!(
        "---\nid: {}\nversion: {}\ncategory: {}\nname_en: {}\ndescription_en: Helps with {}\ntags: [helper]\n---\n# {}\n\nBody.\n",
        id, version, category, id, id, id
    )
}

fn write(path: &Path, content: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn staging_service(root: &Path) -> PublishService {
    PublishService::new(
        PublishDestination::Staging(LocalStaging::new(root.join("temp-publish"))),
        Some("octo".to_string()),
    )
}

#[tokio::test]
async fn directory_publish_stages_valid_files_only() {
    let dir = TempDir::new().unwrap();
    let src = dir.path().join("agents");
    write(&src.join("sql-helper.md"), &agent_file("sql-helper", "1.0.0", "database-management"));
    write(&src.join("nested/api-designer.md"), &agent_file("api-designer", "0.2.0", "web-programming"));
    write(&src.join("broken.md"), "---\nid: broken\nversion: one\n---\n");
    write(&src.join("README.md"), "# Agents\n");
    write(&src.join("node_modules/dep/x.md"), &agent_file("x", "1.0.0", "documentation"));
    write(&src.join(".hidden/y.md"), &agent_file("y", "1.0.0", "documentation"));

    let service = staging_service(dir.path());
    let report = service.publish_dir(&src, false).await.unwrap();

    assert_eq!(report.published.len(), 2);
    assert_eq!(report.invalid.len(), 1);
    assert!(report.invalid[0].0.ends_with("broken.md"));
    assert!(matches!(report.invalid[0].1, ApiError::Validation(_)));
    assert_eq!(report.exit_code(), 0);

    let staging = LocalStaging::new(dir.path().join("temp-publish"));
    let index = staging.load_index().unwrap();
    assert_eq!(index.total_agents, 2);
    assert_eq!(index.categories.get("database-management"), Some(&1));
    assert!(index.agents.contains_key("octo/sql-helper"));
    assert!(staging
        .agent_dir("octo", "api-designer")
        .join("v0.2.0.md")
        .exists());
}

#[tokio::test]
async fn restaging_requires_update_and_keeps_counts() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("sql-helper.md");
    write(&file, &agent_file("sql-helper", "1.0.0", "database-management"));
    let service = staging_service(dir.path());

    service.publish_file(&file, false).await.unwrap();
    let err = service.publish_file(&file, false).await.unwrap_err();
    assert!(matches!(err, ApiError::AlreadyPublished(ref key) if key == "octo/sql-helper"));

    write(&file, &agent_file("sql-helper", "1.1.0", "database-management"));
    let receipt = service.publish_file(&file, true).await.unwrap();
    let PublishReceipt::Staged { directory, .. } = receipt else {
        panic!("expected staged receipt");
    };
    assert!(directory.join("v1.1.0.md").exists());

    let index = LocalStaging::new(dir.path().join("temp-publish"))
        .load_index()
        .unwrap();
    assert_eq!(index.total_agents, 1);
    assert_eq!(index.categories.get("database-management"), Some(&1));
    assert_eq!(index.agents["octo/sql-helper"].version, "1.1.0");
}

#[tokio::test]
async fn all_invalid_directory_fails() {
    let dir = TempDir::new().unwrap();
    write(&dir.path().join("a.md"), "no header at all");

    let report = staging_service(dir.path())
        .publish_dir(dir.path(), false)
        .await
        .unwrap();
    assert!(report.published.is_empty());
    assert_eq!(report.exit_code(), 1);
}
