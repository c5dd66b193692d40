use crate::integration::support::standard_catalog;
use agt::config::{AgtPaths, ConfigLoader};
use agt::registry::{RegistryClient, SortKey};
use agt::tooling::cli::{Cli, CliContext, Commands, ConfigCommands};
use agt::types::Target;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

#[test]
fn install_flags() {
    let cli = Cli::try_parse_from([
        "agt", "install", "acme/reviewer", "linter@1.0.0", "-t", "codex", "--force", "--dry-run",
    ])
    .unwrap();
    match cli.command {
        Commands::Install {
            agents,
            target,
            force,
            dry_run,
            yes,
            strict,
            version,
        } => {
            assert_eq!(agents, vec!["acme/reviewer", "linter@1.0.0"]);
            assert_eq!(target, Some(Target::Codex));
            assert!(force && dry_run);
            assert!(!yes && !strict);
            assert_eq!(version, None);
        }
        _ => panic!("expected install"),
    }
}

#[test]
fn install_requires_an_agent_and_a_known_target() {
    assert!(Cli::try_parse_from(["agt", "install"]).is_err());
    assert!(Cli::try_parse_from(["agt", "install", "x", "--target", "vscode"]).is_err());
}

#[test]
fn search_defaults() {
    let cli = Cli::try_parse_from(["agt", "search", "review"]).unwrap();
    match cli.command {
        Commands::Search {
            query, sort, limit, json, ..
        } => {
            assert_eq!(query.as_deref(), Some("review"));
            assert_eq!(sort, SortKey::Downloads);
            assert_eq!(limit, 20);
            assert!(!json);
        }
        _ => panic!("expected search"),
    }

    let cli = Cli::try_parse_from(["agt", "search", "--sort", "rating", "-l", "5"]).unwrap();
    assert!(matches!(
        cli.command,
        Commands::Search { sort: SortKey::Rating, limit: 5, query: None, .. }
    ));
}

#[test]
fn global_flags_after_subcommand() {
    let cli = Cli::try_parse_from(["agt", "list", "--installed", "--verbose", "--config", "/tmp/c.yaml"])
        .unwrap();
    assert!(cli.verbose);
    assert_eq!(cli.config, Some(PathBuf::from("/tmp/c.yaml")));
    assert!(matches!(cli.command, Commands::List { installed: true, limit: 50, .. }));
}

#[test]
fn config_and_init_subcommands() {
    let cli = Cli::try_parse_from(["agt", "config", "use-env", "staging"]).unwrap();
    assert!(matches!(
        cli.command,
        Commands::Config { command: Some(ConfigCommands::UseEnv { ref environment }) } if environment == "staging"
    ));

    let cli = Cli::try_parse_from(["agt", "config"]).unwrap();
    assert!(matches!(cli.command, Commands::Config { command: None }));

    let cli = Cli::try_parse_from(["agt", "init"]).unwrap();
    assert!(matches!(cli.command, Commands::Init { ref filename, .. } if filename == &PathBuf::from("agent.md")));
}

#[test]
fn publish_file_and_dir_conflict() {
    assert!(Cli::try_parse_from(["agt", "publish", "a.md", "--dir", "agents"]).is_err());
    assert!(Cli::try_parse_from(["agt", "publish", "--dir", "agents", "--validate"]).is_ok());
}

fn context(home: &TempDir) -> CliContext {
    let paths = AgtPaths::with_home(home.path());
    let config = ConfigLoader::load(&paths).unwrap();
    let registry = Arc::new(RegistryClient::new(standard_catalog(), Duration::from_secs(300)));
    CliContext::with_registry(paths, config, registry)
}

#[tokio::test]
async fn install_then_list_installed_json() {
    let home = TempDir::new().unwrap();
    let ctx = context(&home);

    let install = Cli::try_parse_from(["agt", "install", "acme/reviewer", "acme/ghost", "-y"]).unwrap();
    let output = ctx.run(&install.command).await.unwrap();
    assert_eq!(output.exit_code, 0);
    assert!(output.text.contains("acme/reviewer@2.0.0 installed"));
    assert!(output.text.contains("acme/ghost"));

    let strict = Cli::try_parse_from(["agt", "install", "acme/ghost", "-y", "--strict"]).unwrap();
    assert_eq!(ctx.run(&strict.command).await.unwrap().exit_code, 1);

    let list = Cli::try_parse_from(["agt", "list", "--installed", "--json"]).unwrap();
    let output = ctx.run(&list.command).await.unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&output.text).unwrap();
    let records = parsed.as_array().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["id"], "acme/reviewer");
    assert_eq!(records[0]["target"], "claude-code");
}

#[tokio::test]
async fn update_check_reports_nothing_when_current() {
    let home = TempDir::new().unwrap();
    let ctx = context(&home);

    let install = Cli::try_parse_from(["agt", "install", "acme/linter", "-y"]).unwrap();
    ctx.run(&install.command).await.unwrap();

    let update = Cli::try_parse_from(["agt", "update"]).unwrap();
    let output = ctx.run(&update.command).await.unwrap();
    assert_eq!(output.text, "All agents are up to date.");
}
