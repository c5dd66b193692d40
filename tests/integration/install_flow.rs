use crate::integration::support::{agent_body, entry, Harness};
use agt::error::ApiError;
use agt::installer::{InstallOptions, Outcome, UpdateOptions};
use agt::manifest::InstalledStore;
use agt::types::Target;
use std::fs;

fn claude() -> InstallOptions {
    InstallOptions::new(Target::ClaudeCode)
}

#[tokio::test]
async fn install_writes_file_and_records_it() {
    let h = Harness::standard();

    let outcome = h.installer.install("acme/reviewer@2.0.0", &claude()).await.unwrap();

    let expected = h
        .home
        .path()
        .join(".claude/agents/acme_reviewer_v2.0.0.md");
    assert_eq!(fs::read_to_string(&expected).unwrap(), agent_body("reviewer", "2.0.0"));

    let records = h.store.list();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].id, "acme/reviewer");
    assert_eq!(records[0].version, "2.0.0");
    assert_eq!(records[0].target, Target::ClaudeCode);
    assert_eq!(records[0].install_path, expected);
    assert!(matches!(outcome, Outcome::Installed { previous: None, .. }));
}

#[tokio::test]
async fn bare_name_installs_catalog_latest() {
    let h = Harness::standard();
    h.installer.install("linter", &claude()).await.unwrap();

    let record = h.store.find("acme/linter", Target::ClaudeCode).unwrap();
    assert_eq!(record.version, "1.1.0");
}

#[tokio::test]
async fn second_install_needs_force_and_keeps_one_record() {
    let h = Harness::standard();
    h.installer.install("acme/reviewer", &claude()).await.unwrap();

    let err = h.installer.install("acme/reviewer", &claude()).await.unwrap_err();
    assert!(matches!(err, ApiError::AlreadyInstalled { ref version, .. } if version == "2.0.0"));

    let mut force = claude();
    force.force = true;
    let outcome = h.installer.install("acme/reviewer", &force).await.unwrap();
    assert!(matches!(outcome, Outcome::Installed { previous: Some(_), .. }));
    assert_eq!(h.store.list().len(), 1);
}

#[tokio::test]
async fn same_agent_for_two_targets_is_two_records() {
    let h = Harness::standard();
    h.installer.install("acme/reviewer", &claude()).await.unwrap();
    h.installer
        .install("acme/reviewer", &InstallOptions::new(Target::Codex))
        .await
        .unwrap();

    assert_eq!(h.store.list().len(), 2);
    assert!(h
        .home
        .path()
        .join(".codex/agents/acme_reviewer_v2.0.0.md")
        .exists());
}

#[tokio::test]
async fn dry_run_touches_nothing() {
    let h = Harness::standard();
    let mut options = claude();
    options.dry_run = true;

    let outcome = h.installer.install("acme/reviewer", &options).await.unwrap();
    let Outcome::Planned { version, install_path, existing, .. } = outcome else {
        panic!("expected a planned outcome");
    };
    assert_eq!(version, "2.0.0");
    assert_eq!(existing, None);
    assert!(!install_path.exists());
    assert!(h.store.list().is_empty());
}

#[tokio::test]
async fn batch_continues_past_a_missing_agent() {
    let h = Harness::standard();
    let refs = vec!["acme/reviewer".to_string(), "acme/ghost".to_string()];

    let report = h.installer.install_many(&refs, &claude()).await.unwrap();

    assert_eq!(report.succeeded(), 1);
    assert_eq!(report.failed(), 1);
    assert!(matches!(report.items[1].result, Err(ApiError::AgentNotFound(_))));
    assert_eq!(report.exit_code(false), 0);
    assert_eq!(report.exit_code(true), 1);
    assert_eq!(h.store.list().len(), 1);

    let single = h
        .installer
        .install_many(&["acme/ghost".to_string()], &claude())
        .await
        .unwrap();
    assert_eq!(single.exit_code(false), 1);
}

#[tokio::test]
async fn missing_version_content_is_reported_per_item() {
    let h = Harness::standard();
    let err = h
        .installer
        .install("acme/reviewer@9.9.9", &claude())
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::ContentNotFound { .. }));
    assert!(h.store.list().is_empty());
}

#[tokio::test]
async fn uninstall_removes_file_and_record() {
    let h = Harness::standard();
    h.installer.install("acme/reviewer", &claude()).await.unwrap();
    let path = h.store.list()[0].install_path.clone();

    h.installer.uninstall("reviewer", Target::ClaudeCode).await.unwrap();
    assert!(!path.exists());
    assert!(h.store.list().is_empty());

    let err = h
        .installer
        .uninstall("reviewer", Target::ClaudeCode)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::NotInstalled { .. }));
}

#[tokio::test]
async fn uninstall_bare_name_refuses_to_guess() {
    let h = Harness::standard();
    h.transport.publish_catalog(&[
        entry("acme", "reviewer", "2.0.0", "code-quality", 900),
        entry("other", "reviewer", "1.0.0", "code-quality", 10),
    ]);
    h.transport.publish_content("other", "reviewer", "1.0.0");

    h.installer.install("acme/reviewer", &claude()).await.unwrap();
    h.installer.install("other/reviewer", &claude()).await.unwrap();

    let err = h
        .installer
        .uninstall("reviewer", Target::ClaudeCode)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::AmbiguousIdentity { ref candidates, .. } if candidates.len() == 2));

    h.installer
        .uninstall("other/reviewer", Target::ClaudeCode)
        .await
        .unwrap();
    assert_eq!(h.store.list().len(), 1);
}

#[tokio::test]
async fn update_moves_to_latest_and_drops_old_file() {
    let h = Harness::standard();
    h.installer.install("acme/linter@1.0.0", &claude()).await.unwrap();
    h.installer.install("acme/reviewer", &claude()).await.unwrap();
    let old_path = h.store.find("acme/linter", Target::ClaudeCode).unwrap().install_path;

    let candidates = h.installer.check_updates(None).await.unwrap();
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].record.id, "acme/linter");
    assert_eq!(candidates[0].latest, "1.1.0");

    let report = h
        .installer
        .update(&[], &UpdateOptions::default())
        .await
        .unwrap();
    assert_eq!(report.succeeded(), 1);

    let record = h.store.find("acme/linter", Target::ClaudeCode).unwrap();
    assert_eq!(record.version, "1.1.0");
    assert!(record.install_path.exists());
    assert!(!old_path.exists());
    assert!(h.installer.check_updates(None).await.unwrap().is_empty());
}

#[tokio::test]
async fn update_dry_run_leaves_install_alone() {
    let h = Harness::standard();
    h.installer.install("acme/linter@1.0.0", &claude()).await.unwrap();

    let options = UpdateOptions {
        target: None,
        dry_run: true,
    };
    let report = h.installer.update(&[], &options).await.unwrap();
    assert!(matches!(report.items[0].result, Ok(Outcome::Planned { .. })));
    assert_eq!(
        h.store.find("acme/linter", Target::ClaudeCode).unwrap().version,
        "1.0.0"
    );
}

#[tokio::test]
async fn named_update_reports_current_and_missing() {
    let h = Harness::standard();
    h.installer.install("acme/reviewer", &claude()).await.unwrap();

    let refs = vec!["reviewer".to_string(), "doc-writer".to_string()];
    let report = h
        .installer
        .update(&refs, &UpdateOptions::default())
        .await
        .unwrap();

    assert!(matches!(report.items[0].result, Ok(Outcome::UpToDate { .. })));
    assert!(matches!(report.items[1].result, Err(ApiError::NotInstalled { .. })));
}

#[tokio::test]
async fn catalog_values_cannot_escape_the_agents_dir() {
    let h = Harness::standard();
    h.transport.publish_catalog(&[
        entry("../../../escaped", "x", "1.0.0", "code-quality", 1),
        entry("acme", "reviewer", "2.0.0", "code-quality", 900),
    ]);
    h.transport.publish_content("../../../escaped", "x", "1.0.0");

    let err = h.installer.install("x", &claude()).await.unwrap_err();
    assert!(matches!(err, ApiError::UnsafeDescriptor { field: "author", .. }));
    assert!(!h
        .home
        .path()
        .parent()
        .unwrap()
        .join("escaped_x_v1.0.0.md")
        .exists());
    assert!(h.store.list().is_empty());

    let mut options = claude();
    options.version = Some("../../../../owned".to_string());
    let err = h.installer.install("acme/reviewer", &options).await.unwrap_err();
    assert!(matches!(err, ApiError::UnsafeDescriptor { field: "version", .. }));

    let refs = vec!["x".to_string(), "acme/reviewer".to_string()];
    let report = h.installer.install_many(&refs, &claude()).await.unwrap();
    assert_eq!(report.succeeded(), 1);
    assert_eq!(report.failed(), 1);
}

#[tokio::test]
async fn content_server_error_fails_only_that_agent() {
    let h = Harness::standard();
    h.transport
        .fail_path("agents/acme/linter/linter_v1.1.0.md", 500);

    let refs = vec![
        "acme/reviewer".to_string(),
        "acme/linter".to_string(),
        "docs-co/doc-writer".to_string(),
    ];
    let report = h.installer.install_many(&refs, &claude()).await.unwrap();

    assert_eq!(report.succeeded(), 2);
    assert!(matches!(
        report.items[1].result,
        Err(ApiError::ContentUnavailable { ref id, .. }) if id == "acme/linter"
    ));
    assert!(h.store.find("docs-co/doc-writer", Target::ClaudeCode).is_some());
    assert!(h.store.find("acme/linter", Target::ClaudeCode).is_none());
    assert_eq!(report.exit_code(false), 0);
}

#[tokio::test]
async fn update_continues_past_a_content_error() {
    let h = Harness::standard();
    h.installer.install("acme/linter@1.0.0", &claude()).await.unwrap();
    h.transport.publish_catalog(&[
        entry("acme", "reviewer", "2.0.0", "code-quality", 900),
        entry("acme", "linter", "1.1.0", "code-quality", 300),
        entry("docs-co", "doc-writer", "1.1.0", "documentation", 50),
    ]);
    h.transport.publish_content("docs-co", "doc-writer", "1.1.0");
    h.installer
        .install("docs-co/doc-writer@1.0.0", &claude())
        .await
        .unwrap();
    h.registry.clear_cache();
    h.transport
        .fail_path("agents/acme/linter/linter_v1.1.0.md", 503);

    let report = h
        .installer
        .update(&[], &UpdateOptions::default())
        .await
        .unwrap();

    assert_eq!(report.items.len(), 2);
    assert_eq!(report.succeeded(), 1);
    assert_eq!(
        h.store.find("docs-co/doc-writer", Target::ClaudeCode).unwrap().version,
        "1.1.0"
    );
    assert_eq!(
        h.store.find("acme/linter", Target::ClaudeCode).unwrap().version,
        "1.0.0"
    );
}
