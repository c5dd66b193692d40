//! Text and JSON rendering for command output.

use crate::agent::AgentDescriptor;
use crate::config::{AgtConfig, AgtPaths};
use crate::error::ApiError;
use crate::installer::{BatchReport, Outcome, UpdateCandidate};
use crate::manifest::InstalledAgentRecord;
use crate::publish::{DirectoryPublishReport, PreparedAgent, PublishReceipt};
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use owo_colors::OwoColorize;
use serde::Serialize;
use serde_json::json;

const DESCRIPTION_WIDTH: usize = 60;

/// Format a section heading with bold/underline.
pub fn format_section_heading(title: &str) -> String {
    format!("{}", title.bold().underline())
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let mut out: String = text.chars().take(max.saturating_sub(3)).collect();
        out.push_str("...");
        out
    }
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, ApiError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| ApiError::ConfigError(format!("Failed to render JSON: {}", e)))
}

pub fn format_agents_text(title: &str, agents: &[AgentDescriptor]) -> String {
    let mut out = format!("{}\n\n", format_section_heading(title));
    if agents.is_empty() {
        out.push_str("No agents found.\n");
        return out;
    }
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Agent", "Version", "Category", "Downloads", "Rating", "Description"]);
    for agent in agents {
        table.add_row(vec![
            agent.key(),
            agent.version.clone(),
            agent.category.clone(),
            agent.downloads.to_string(),
            format!("{:.1}", agent.rating),
            truncate(agent.description.preferred(), DESCRIPTION_WIDTH),
        ]);
    }
    out.push_str(&format!("{}\n\n", table));
    out.push_str(&format!(
        "{} agent(s). Install with: agt install <author>/<id>\n",
        agents.len()
    ));
    out
}

pub fn format_agents_json(agents: &[AgentDescriptor]) -> Result<String, ApiError> {
    to_json(agents)
}

pub fn format_categories_text(categories: &[(String, u64)]) -> String {
    let mut out = format!("{}\n\n", format_section_heading("Categories"));
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Category", "Agents"]);
    for (name, count) in categories {
        table.add_row(vec![name.clone(), count.to_string()]);
    }
    out.push_str(&format!("{}\n", table));
    out
}

pub fn format_installed_text(records: &[InstalledAgentRecord]) -> String {
    let mut out = format!("{}\n\n", format_section_heading("Installed agents"));
    if records.is_empty() {
        out.push_str("No agents installed.\n");
        return out;
    }
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Agent", "Version", "Target", "Installed", "Path"]);
    for record in records {
        table.add_row(vec![
            record.id.clone(),
            record.version.clone(),
            record.target.to_string(),
            record.installed_at.format("%Y-%m-%d %H:%M").to_string(),
            record.install_path.display().to_string(),
        ]);
    }
    out.push_str(&format!("{}\n", table));
    out
}

pub fn format_installed_json(records: &[InstalledAgentRecord]) -> Result<String, ApiError> {
    to_json(records)
}

pub fn format_updates_text(candidates: &[UpdateCandidate]) -> String {
    let mut out = format!("{}\n\n", format_section_heading("Available updates"));
    if candidates.is_empty() {
        out.push_str("All agents are up to date.\n");
        return out;
    }
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Agent", "Target", "Installed", "Latest"]);
    for candidate in candidates {
        table.add_row(vec![
            candidate.record.id.clone(),
            candidate.record.target.to_string(),
            candidate.record.version.clone(),
            candidate.latest.clone(),
        ]);
    }
    out.push_str(&format!("{}\n", table));
    out
}

pub fn format_updates_json(candidates: &[UpdateCandidate]) -> Result<String, ApiError> {
    let rows: Vec<serde_json::Value> = candidates
        .iter()
        .map(|c| {
            json!({
                "id": c.record.id,
                "target": c.record.target,
                "installed": c.record.version,
                "latest": c.latest,
            })
        })
        .collect();
    to_json(&rows)
}

pub fn format_outcome(outcome: &Outcome) -> String {
    match outcome {
        Outcome::Installed { record, previous } => match previous {
            Some(previous) if previous != &record.version => format!(
                "{}@{} ({} -> {}) for {}: {}",
                record.id,
                record.version,
                previous,
                record.version,
                record.target,
                record.install_path.display()
            ),
            Some(_) => format!(
                "{}@{} reinstalled for {}: {}",
                record.id,
                record.version,
                record.target,
                record.install_path.display()
            ),
            None => format!(
                "{}@{} installed for {}: {}",
                record.id,
                record.version,
                record.target,
                record.install_path.display()
            ),
        },
        Outcome::Planned {
            id,
            version,
            target,
            install_path,
            existing,
        } => {
            let action = match existing {
                Some(current) => format!("replace {} with", current),
                None => "install".to_string(),
            };
            format!(
                "would {} {}@{} for {} at {}",
                action,
                id,
                version,
                target,
                install_path.display()
            )
        }
        Outcome::Uninstalled(record) => format!(
            "{}@{} removed from {}",
            record.id, record.version, record.target
        ),
        Outcome::UpToDate {
            id,
            target,
            version,
        } => format!("{} is up to date ({}) for {}", id, version, target),
    }
}

/// One line per item followed by a count summary.
pub fn format_batch_report(title: &str, report: &BatchReport) -> String {
    let mut out = format!("{}\n\n", format_section_heading(title));
    for item in &report.items {
        match &item.result {
            Ok(outcome) => {
                out.push_str(&format!("  {} {}\n", "✓".green(), format_outcome(outcome)))
            }
            Err(e) => out.push_str(&format!("  {} {}: {}\n", "✗".red(), item.reference, e)),
        }
    }
    out.push_str(&format!(
        "\n{} succeeded, {} failed\n",
        report.succeeded(),
        report.failed()
    ));
    out
}

pub fn format_config_text(config: &AgtConfig, paths: &AgtPaths) -> String {
    let mut out = format!("{}\n\n", format_section_heading("Configuration"));
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Key", "Value"]);
    let token = config
        .token()
        .map(|t| format!("{}...", t.chars().take(8).collect::<String>()))
        .unwrap_or_else(|| "(not logged in)".to_string());
    let rows = vec![
        ("registry.url", config.registry.url.clone()),
        ("registry.cacheTtl", format!("{}s", config.registry.cache_ttl)),
        ("registry.timeout", format!("{}s", config.registry.timeout)),
        ("install.target", config.install.target.to_string()),
        (
            "install.directory",
            config.install_dir(paths).display().to_string(),
        ),
        ("logging.level", config.logging.level.clone()),
        ("apiUrl", config.api_url().to_string()),
        ("email", config.email.clone().unwrap_or_else(|| "-".to_string())),
        ("userName", config.user_name.clone().unwrap_or_else(|| "-".to_string())),
        ("token", token),
    ];
    for (key, value) in rows {
        table.add_row(vec![key.to_string(), value]);
    }
    out.push_str(&format!("{}\n\n", table));
    out.push_str(&format!("Config file: {}\n", paths.config_file().display()));
    out
}

pub fn format_prepared(prepared: &PreparedAgent) -> String {
    let meta = &prepared.metadata;
    let mut out = format!(
        "{} {} v{} ({})\n",
        "✓".green(),
        prepared.key(),
        meta.version,
        meta.category
    );
    let languages: Vec<&str> = meta.name.0.keys().map(String::as_str).collect();
    out.push_str(&format!("  Name: {}\n", meta.name.preferred()));
    out.push_str(&format!("  Languages: {}\n", languages.join(", ")));
    if !meta.tags.is_empty() {
        out.push_str(&format!("  Tags: {}\n", meta.tags.join(", ")));
    }
    for warning in &prepared.warnings {
        out.push_str(&format!("  {} {}\n", "!".yellow(), warning));
    }
    out
}

pub fn format_receipt(receipt: &PublishReceipt) -> String {
    match receipt {
        PublishReceipt::Remote { key, response } => {
            let mut line = format!("{} {} published", "✓".green(), key);
            if let Some(url) = &response.url {
                line.push_str(&format!(": {}", url));
            } else if let Some(message) = &response.message {
                line.push_str(&format!(": {}", message));
            }
            line
        }
        PublishReceipt::Staged { key, directory } => format!(
            "{} {} staged in {}",
            "✓".green(),
            key,
            directory.display()
        ),
    }
}

pub fn format_directory_report(report: &DirectoryPublishReport) -> String {
    let mut out = format!("{}\n\n", format_section_heading("Publish"));
    if !report.invalid.is_empty() {
        out.push_str("Validation errors:\n");
        for (path, e) in &report.invalid {
            out.push_str(&format!("  {} {}: {}\n", "✗".red(), path.display(), e));
        }
        out.push('\n');
    }
    for (_, receipt) in &report.published {
        out.push_str(&format!("  {}\n", format_receipt(receipt)));
    }
    for (path, e) in &report.failed {
        out.push_str(&format!("  {} {}: {}\n", "✗".red(), path.display(), e));
    }
    out.push_str(&format!(
        "\n{} published, {} failed, {} invalid\n",
        report.published.len(),
        report.failed.len(),
        report.invalid.len()
    ));
    out
}
