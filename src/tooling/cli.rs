//! CLI Tooling
//!
//! Command-line interface for installing, discovering and publishing agents.
//! Prompts live here only; every core operation receives its decisions as
//! options.

use crate::agent::document::{render_template, slugify, CATEGORIES};
use crate::agent::AgentIdentity;
use crate::config::{environment_url, AgtConfig, AgtPaths, ConfigLoader, ENVIRONMENTS};
use crate::error::ApiError;
use crate::hub::HubClient;
use crate::installer::{InstallLayout, InstallOptions, Installer, UpdateCandidate, UpdateOptions};
use crate::manifest::JsonManifestStore;
use crate::publish::{
    find_agent_files, LocalStaging, PublishDestination, PublishService, DEFAULT_STAGING_DIR,
};
use crate::registry::{RegistryClient, SearchFilters, SortKey};
use crate::tooling::{format, prompt};
use crate::types::Target;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// agt - package manager for AI agent definitions
#[derive(Parser)]
#[command(name = "agt", version)]
#[command(about = "Install, update and publish AI agent definitions")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path (default: ~/.agents-cli/config.yaml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Debug logging to the log file and stderr
    #[arg(long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Install one or more agents
    Install {
        /// Agent references: name, author/name or author/name@version
        #[arg(required = true)]
        agents: Vec<String>,
        /// Specific version to install
        #[arg(long)]
        version: Option<String>,
        /// Target CLI (claude-code, codex, copilot); defaults to install.target
        #[arg(short, long)]
        target: Option<Target>,
        /// Reinstall if already installed
        #[arg(short, long)]
        force: bool,
        /// Show what would be installed without installing
        #[arg(long)]
        dry_run: bool,
        /// Skip confirmation prompts
        #[arg(short, long)]
        yes: bool,
        /// Exit non-zero if any agent fails, not only when all do
        #[arg(long)]
        strict: bool,
    },
    /// Remove installed agents
    Uninstall {
        #[arg(required = true)]
        agents: Vec<String>,
        #[arg(short, long)]
        target: Option<Target>,
        #[arg(long)]
        strict: bool,
    },
    /// Update installed agents to the latest catalog version
    Update {
        /// Specific agents to update (default: all)
        agents: Vec<String>,
        /// Only update agents installed for this target
        #[arg(short, long)]
        target: Option<Target>,
        /// Only check for updates
        #[arg(long)]
        check: bool,
        /// Show what would be updated without updating
        #[arg(long)]
        dry_run: bool,
        #[arg(short, long)]
        yes: bool,
        #[arg(long)]
        strict: bool,
    },
    /// Search the catalog
    Search {
        query: Option<String>,
        #[arg(short, long)]
        category: Option<String>,
        /// Tag substring
        #[arg(short, long)]
        tag: Option<String>,
        /// Author substring
        #[arg(short, long)]
        author: Option<String>,
        /// Only agents compatible with this target
        #[arg(long)]
        compatibility: Option<Target>,
        /// Only agents with text in this language (en, zh, ja, vi)
        #[arg(long)]
        language: Option<String>,
        /// downloads, rating, name or updated
        #[arg(short, long, default_value = "downloads")]
        sort: SortKey,
        #[arg(short, long, default_value_t = 20)]
        limit: usize,
        #[arg(long)]
        json: bool,
    },
    /// List available, installed or updatable agents
    List {
        #[arg(short, long)]
        installed: bool,
        #[arg(short, long)]
        updates: bool,
        /// List catalog categories
        #[arg(long)]
        categories: bool,
        #[arg(short, long)]
        category: Option<String>,
        #[arg(short, long)]
        target: Option<Target>,
        #[arg(short, long, default_value_t = 50)]
        limit: usize,
        #[arg(long)]
        json: bool,
    },
    /// Publish an agent file to the hub, or stage it locally when not logged in
    Publish {
        /// Agent file to publish
        file: Option<PathBuf>,
        /// Publish every agent file under this directory
        #[arg(long, conflicts_with = "file")]
        dir: Option<PathBuf>,
        /// Validate only
        #[arg(long)]
        validate: bool,
        /// Replace an already staged entry
        #[arg(long)]
        update: bool,
        /// Stage locally even when logged in
        #[arg(long)]
        local: bool,
        /// Staging directory (default: ./temp-publish)
        #[arg(long)]
        staging_dir: Option<PathBuf>,
    },
    /// Log in to the hub with an emailed code
    Login {
        #[arg(long)]
        email: Option<String>,
        /// Verification code from a previous `agt login --email`
        #[arg(long)]
        code: Option<String>,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
    /// Create a new agent file from a template
    Init {
        #[arg(default_value = "agent.md")]
        filename: PathBuf,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        category: Option<String>,
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show current configuration
    Show {
        #[arg(long)]
        json: bool,
    },
    /// Set the hub API URL
    SetUrl { url: String },
    /// Switch to a named hub environment (local, production, staging)
    UseEnv { environment: String },
    /// Reset configuration to defaults
    Reset {
        #[arg(short, long)]
        yes: bool,
    },
    /// Edit configuration interactively, or in an editor
    Edit {
        #[arg(long)]
        editor: Option<String>,
    },
}

/// Rendered output plus the process exit code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub text: String,
    pub exit_code: i32,
}

impl CommandOutput {
    pub fn ok(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            exit_code: 0,
        }
    }

    pub fn with_code(text: impl Into<String>, exit_code: i32) -> Self {
        Self {
            text: text.into(),
            exit_code,
        }
    }
}

fn requires_flag(flag: &str) -> ApiError {
    ApiError::ConfigError(format!(
        "{} is required when not running interactively",
        flag
    ))
}

/// CLI context: configuration plus the components built from it.
pub struct CliContext {
    paths: AgtPaths,
    config: AgtConfig,
    registry: Arc<RegistryClient>,
    installer: Installer,
    interactive: bool,
}

impl CliContext {
    /// Load configuration and build components against the live registry.
    pub fn new(config_path: Option<PathBuf>) -> Result<Self, ApiError> {
        let mut paths = AgtPaths::from_env()?;
        if let Some(path) = config_path {
            paths = paths.with_config_file(path);
        }
        let config = ConfigLoader::load(&paths)?;
        let registry = Arc::new(RegistryClient::from_config(&config.registry)?);
        let mut context = Self::with_registry(paths, config, registry);
        context.interactive = prompt::is_interactive();
        Ok(context)
    }

    /// Build a non-interactive context around an existing registry client.
    pub fn with_registry(paths: AgtPaths, config: AgtConfig, registry: Arc<RegistryClient>) -> Self {
        let store = Arc::new(JsonManifestStore::new(config.manifest_path(&paths)));
        let installer = Installer::new(
            Arc::clone(&registry),
            store,
            InstallLayout::new(paths.home()),
        );
        Self {
            paths,
            config,
            registry,
            installer,
            interactive: false,
        }
    }

    pub fn config(&self) -> &AgtConfig {
        &self.config
    }

    pub fn paths(&self) -> &AgtPaths {
        &self.paths
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(self.config.registry.timeout)
    }

    /// Execute a CLI command on a fresh runtime.
    pub fn execute(&self, command: &Commands) -> Result<CommandOutput, ApiError> {
        let runtime = tokio::runtime::Runtime::new()
            .map_err(|e| ApiError::ConfigError(format!("Failed to create runtime: {}", e)))?;
        runtime.block_on(self.run(command))
    }

    pub async fn run(&self, command: &Commands) -> Result<CommandOutput, ApiError> {
        match command {
            Commands::Install {
                agents,
                version,
                target,
                force,
                dry_run,
                yes,
                strict,
            } => {
                let options = InstallOptions {
                    version: version.clone(),
                    target: target.unwrap_or(self.config.install.target),
                    force: *force,
                    dry_run: *dry_run,
                };
                self.handle_install(agents, &options, *yes, *strict).await
            }
            Commands::Uninstall {
                agents,
                target,
                strict,
            } => {
                let target = target.unwrap_or(self.config.install.target);
                let report = self.installer.uninstall_many(agents, target).await?;
                Ok(CommandOutput::with_code(
                    format::format_batch_report("Uninstall", &report),
                    report.exit_code(*strict),
                ))
            }
            Commands::Update {
                agents,
                target,
                check,
                dry_run,
                yes,
                strict,
            } => {
                let options = UpdateOptions {
                    target: *target,
                    dry_run: *dry_run,
                };
                self.handle_update(agents, &options, *check, *yes, *strict)
                    .await
            }
            Commands::Search {
                query,
                category,
                tag,
                author,
                compatibility,
                language,
                sort,
                limit,
                json,
            } => {
                let filters = SearchFilters {
                    category: category.clone(),
                    tag: tag.clone(),
                    author: author.clone(),
                    target: *compatibility,
                    language: language.clone(),
                    sort: *sort,
                    limit: Some(*limit),
                };
                let results = self.registry.search(query.as_deref(), &filters).await?;
                if *json {
                    return Ok(CommandOutput::ok(format::format_agents_json(&results)?));
                }
                let title = match query {
                    Some(q) => format!("Search results for '{}'", q),
                    None => "Agents".to_string(),
                };
                Ok(CommandOutput::ok(format::format_agents_text(&title, &results)))
            }
            Commands::List {
                installed,
                updates,
                categories,
                category,
                target,
                limit,
                json,
            } => {
                self.handle_list(
                    *installed,
                    *updates,
                    *categories,
                    category.as_deref(),
                    *target,
                    *limit,
                    *json,
                )
                .await
            }
            Commands::Publish {
                file,
                dir,
                validate,
                update,
                local,
                staging_dir,
            } => {
                self.handle_publish(
                    file.as_deref(),
                    dir.as_deref(),
                    *validate,
                    *update,
                    *local,
                    staging_dir.as_deref(),
                )
                .await
            }
            Commands::Login { email, code } => {
                self.handle_login(email.as_deref(), code.as_deref()).await
            }
            Commands::Config { command } => match command {
                None => self.handle_config(&ConfigCommands::Show { json: false }),
                Some(command) => self.handle_config(command),
            },
            Commands::Init {
                filename,
                name,
                description,
                category,
                force,
            } => self.handle_init(
                filename,
                name.as_deref(),
                description.as_deref(),
                category.as_deref(),
                *force,
            ),
        }
    }

    async fn handle_install(
        &self,
        agents: &[String],
        options: &InstallOptions,
        yes: bool,
        strict: bool,
    ) -> Result<CommandOutput, ApiError> {
        if self.interactive && !yes && !options.dry_run {
            let question = format!("Install {} agent(s) to {}?", agents.len(), options.target);
            if !prompt::confirm(&question, true)? {
                return Ok(CommandOutput::ok("Installation cancelled"));
            }
        }

        let report = self.installer.install_many(agents, options).await?;
        let title = if options.dry_run {
            "Install (dry run)"
        } else {
            "Install"
        };
        Ok(CommandOutput::with_code(
            format::format_batch_report(title, &report),
            report.exit_code(strict),
        ))
    }

    async fn handle_update(
        &self,
        agents: &[String],
        options: &UpdateOptions,
        check: bool,
        yes: bool,
        strict: bool,
    ) -> Result<CommandOutput, ApiError> {
        let identities: Vec<AgentIdentity> = agents
            .iter()
            .filter_map(|a| AgentIdentity::parse(a).ok())
            .collect();
        let candidates: Vec<UpdateCandidate> = self
            .installer
            .check_updates(options.target)
            .await?
            .into_iter()
            .filter(|c| identities.is_empty() || identities.iter().any(|i| i.matches_key(&c.record.id)))
            .collect();

        if check {
            return Ok(CommandOutput::ok(format::format_updates_text(&candidates)));
        }
        if agents.is_empty() && candidates.is_empty() {
            return Ok(CommandOutput::ok("All agents are up to date."));
        }

        if self.interactive && !yes && !options.dry_run && !candidates.is_empty() {
            println!("{}", format::format_updates_text(&candidates));
            let question = format!("Update {} agent(s)?", candidates.len());
            if !prompt::confirm(&question, true)? {
                return Ok(CommandOutput::ok("Update cancelled"));
            }
        }

        let report = self.installer.update(agents, options).await?;
        let title = if options.dry_run {
            "Update (dry run)"
        } else {
            "Update"
        };
        Ok(CommandOutput::with_code(
            format::format_batch_report(title, &report),
            report.exit_code(strict),
        ))
    }

    #[allow(clippy::too_many_arguments)]
    async fn handle_list(
        &self,
        installed: bool,
        updates: bool,
        categories: bool,
        category: Option<&str>,
        target: Option<Target>,
        limit: usize,
        json: bool,
    ) -> Result<CommandOutput, ApiError> {
        if categories {
            let categories = self.registry.categories().await?;
            if json {
                let map: serde_json::Map<String, serde_json::Value> = categories
                    .into_iter()
                    .map(|(name, count)| (name, serde_json::Value::from(count)))
                    .collect();
                return serde_json::to_string_pretty(&map)
                    .map(CommandOutput::ok)
                    .map_err(|e| ApiError::ConfigError(format!("Failed to render JSON: {}", e)));
            }
            return Ok(CommandOutput::ok(format::format_categories_text(&categories)));
        }

        if installed {
            let records: Vec<_> = self
                .installer
                .installed()
                .into_iter()
                .filter(|r| target.map(|t| t == r.target).unwrap_or(true))
                .collect();
            let text = if json {
                format::format_installed_json(&records)?
            } else {
                format::format_installed_text(&records)
            };
            return Ok(CommandOutput::ok(text));
        }

        if updates {
            let candidates = self.installer.check_updates(target).await?;
            let text = if json {
                format::format_updates_json(&candidates)?
            } else {
                format::format_updates_text(&candidates)
            };
            return Ok(CommandOutput::ok(text));
        }

        let filters = SearchFilters {
            category: category.map(str::to_string),
            limit: Some(limit),
            ..Default::default()
        };
        let agents = self.registry.search(None, &filters).await?;
        let text = if json {
            format::format_agents_json(&agents)?
        } else {
            format::format_agents_text("Available agents", &agents)
        };
        Ok(CommandOutput::ok(text))
    }

    fn publish_service(&self, local: bool, staging_dir: Option<&Path>) -> Result<PublishService, ApiError> {
        let destination = match (self.config.token(), local) {
            (Some(token), false) => PublishDestination::Hub(
                HubClient::new(self.config.api_url(), self.timeout())?.with_token(token),
            ),
            _ => {
                let root = staging_dir
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_STAGING_DIR));
                PublishDestination::Staging(LocalStaging::new(root))
            }
        };
        Ok(PublishService::new(destination, self.config.user_name.clone()))
    }

    async fn handle_publish(
        &self,
        file: Option<&Path>,
        dir: Option<&Path>,
        validate: bool,
        update: bool,
        local: bool,
        staging_dir: Option<&Path>,
    ) -> Result<CommandOutput, ApiError> {
        let service = self.publish_service(local, staging_dir)?;

        if let Some(dir) = dir {
            if validate {
                let mut out = String::new();
                let mut invalid = 0;
                for path in find_agent_files(dir) {
                    match service.prepare(&path) {
                        Ok(prepared) => out.push_str(&format::format_prepared(&prepared)),
                        Err(e) => {
                            invalid += 1;
                            out.push_str(&format!("✗ {}: {}\n", path.display(), e));
                        }
                    }
                }
                let code = if invalid > 0 { 1 } else { 0 };
                return Ok(CommandOutput::with_code(out, code));
            }
            let report = service.publish_dir(dir, update).await?;
            return Ok(CommandOutput::with_code(
                format::format_directory_report(&report),
                report.exit_code(),
            ));
        }

        let file = match file {
            Some(file) => file.to_path_buf(),
            None if self.interactive => PathBuf::from(prompt::required_text("Agent file to publish")?),
            None => return Err(requires_flag("An agent file or --dir")),
        };

        let prepared = service.prepare(&file)?;
        let mut out = format::format_prepared(&prepared);
        if validate {
            out.push_str("Validation passed.\n");
            return Ok(CommandOutput::ok(out));
        }

        if !service.is_remote() && !local {
            out.push_str("Not logged in: staging locally. Run `agt login` to publish to the hub.\n");
        }
        let receipt = service.publish(&prepared, update).await?;
        out.push_str(&format::format_receipt(&receipt));
        out.push('\n');
        Ok(CommandOutput::ok(out))
    }

    async fn handle_login(
        &self,
        email: Option<&str>,
        code: Option<&str>,
    ) -> Result<CommandOutput, ApiError> {
        let email = match email {
            Some(email) if email.contains('@') => email.trim().to_string(),
            Some(email) => {
                return Err(ApiError::ConfigError(format!(
                    "'{}' is not a valid email address",
                    email
                )))
            }
            None if self.interactive => prompt::email("Email")?,
            None => return Err(requires_flag("--email")),
        };

        let hub = HubClient::new(self.config.api_url(), self.timeout())?;
        let code = match code {
            Some(code) => code.trim().to_string(),
            None => {
                hub.send_code(&email).await?;
                if !self.interactive {
                    return Ok(CommandOutput::ok(format!(
                        "Verification code sent to {}. Run `agt login --email {} --code <code>` to finish.",
                        email, email
                    )));
                }
                prompt::login_code("Verification code from your email")?
            }
        };
        if code.chars().count() != 6 {
            return Err(ApiError::ConfigError(
                "Verification code must be 6 characters".to_string(),
            ));
        }

        let response = hub.login(&email, &code).await?;
        let config = ConfigLoader::update(&self.paths, |config| {
            config.token = Some(response.token.clone());
            match &response.user {
                Some(user) => {
                    config.email = Some(user.email.clone());
                    config.user_name = user.name.clone();
                }
                None => config.email = Some(email.clone()),
            }
        })?;
        tracing::info!(email = %email, "Logged in");

        let mut out = format!(
            "Logged in as {}\n",
            config.email.as_deref().unwrap_or(&email)
        );
        if let Some(expires_at) = &response.expires_at {
            out.push_str(&format!("Token valid until: {}\n", expires_at));
        }
        out.push_str("You can now publish agents with `agt publish`.");
        Ok(CommandOutput::ok(out))
    }

    fn handle_config(&self, command: &ConfigCommands) -> Result<CommandOutput, ApiError> {
        match command {
            ConfigCommands::Show { json } => {
                if *json {
                    let mut shown = self.config.clone();
                    shown.token = shown.token.map(|_| "********".to_string());
                    return serde_json::to_string_pretty(&shown)
                        .map(CommandOutput::ok)
                        .map_err(|e| {
                            ApiError::ConfigError(format!("Failed to render JSON: {}", e))
                        });
                }
                Ok(CommandOutput::ok(format::format_config_text(
                    &self.config,
                    &self.paths,
                )))
            }
            ConfigCommands::SetUrl { url } => {
                if !url.starts_with("http://") && !url.starts_with("https://") {
                    return Err(ApiError::ConfigError(format!(
                        "'{}' is not an http(s) URL",
                        url
                    )));
                }
                let config = ConfigLoader::update(&self.paths, |config| {
                    config.api_url = Some(url.trim_end_matches('/').to_string());
                })?;
                Ok(CommandOutput::ok(format!("API URL set to {}", config.api_url())))
            }
            ConfigCommands::UseEnv { environment } => {
                let url = environment_url(environment).ok_or_else(|| {
                    let names: Vec<&str> = ENVIRONMENTS.iter().map(|(name, _)| *name).collect();
                    ApiError::ConfigError(format!(
                        "Unknown environment '{}' (expected {})",
                        environment,
                        names.join(", ")
                    ))
                })?;
                ConfigLoader::update(&self.paths, |config| {
                    config.api_url = Some(url.to_string());
                })?;
                Ok(CommandOutput::ok(format!(
                    "Switched to {} ({})",
                    environment, url
                )))
            }
            ConfigCommands::Reset { yes } => {
                if self.interactive
                    && !*yes
                    && !prompt::confirm("Reset configuration to defaults? This logs you out.", false)?
                {
                    return Ok(CommandOutput::ok("Reset cancelled"));
                }
                ConfigLoader::reset(&self.paths)?;
                Ok(CommandOutput::ok(format!(
                    "Configuration reset: {}",
                    self.paths.config_file().display()
                )))
            }
            ConfigCommands::Edit { editor } => match editor {
                Some(editor) => self.edit_config_with_editor(Some(editor)),
                None if self.interactive => self.edit_config_interactive(),
                None => self.edit_config_with_editor(None),
            },
        }
    }

    fn edit_config_interactive(&self) -> Result<CommandOutput, ApiError> {
        let mut config = ConfigLoader::load_file(&self.paths)?;
        config.registry.url = prompt::text_with_default("Registry URL", &config.registry.url)?;
        config.api_url = Some(prompt::text_with_default("Hub API URL", config.api_url())?);

        let targets: Vec<&str> = Target::ALL.iter().map(|t| t.as_str()).collect();
        let current = Target::ALL
            .iter()
            .position(|t| *t == config.install.target)
            .unwrap_or(0);
        let chosen = prompt::select("Default target", &targets, current)?;
        config.install.target = Target::ALL.get(chosen).copied().unwrap_or_default();

        let ttl = prompt::text_with_default(
            "Cache TTL (seconds)",
            &config.registry.cache_ttl.to_string(),
        )?;
        config.registry.cache_ttl = ttl
            .parse()
            .map_err(|_| ApiError::ConfigError(format!("'{}' is not a number of seconds", ttl)))?;

        ConfigLoader::save(&self.paths, &config)?;
        Ok(CommandOutput::ok("Configuration saved."))
    }

    /// Edit the config file in an external editor, validating before saving.
    fn edit_config_with_editor(&self, editor: Option<&str>) -> Result<CommandOutput, ApiError> {
        use std::process::Command;

        let current = ConfigLoader::load_file(&self.paths)?;
        let content = serde_yaml::to_string(&current)
            .map_err(|e| ApiError::ConfigError(format!("Failed to serialize config: {}", e)))?;
        let temp_path = std::env::temp_dir().join(format!("agt-config-{}.yaml", std::process::id()));
        std::fs::write(&temp_path, content.as_bytes())
            .map_err(|e| ApiError::ConfigError(format!("Failed to write temp file: {}", e)))?;

        let editor_cmd = match editor {
            Some(ed) => ed.to_string(),
            None => std::env::var("EDITOR").map_err(|_| {
                ApiError::ConfigError(
                    "No editor specified and $EDITOR not set. Use --editor <editor>".to_string(),
                )
            })?,
        };

        let status = Command::new(&editor_cmd)
            .arg(&temp_path)
            .status()
            .map_err(|e| ApiError::ConfigError(format!("Failed to open editor: {}", e)))?;
        if !status.success() {
            let _ = std::fs::remove_file(&temp_path);
            return Err(ApiError::ConfigError(
                "Editor exited with non-zero status".to_string(),
            ));
        }

        let edited = std::fs::read_to_string(&temp_path)
            .map_err(|e| ApiError::ConfigError(format!("Failed to read edited file: {}", e)))?;
        let _ = std::fs::remove_file(&temp_path);
        let config: AgtConfig = serde_yaml::from_str(&edited)
            .map_err(|e| ApiError::ConfigError(format!("Invalid config after editing: {}", e)))?;

        ConfigLoader::save(&self.paths, &config)?;
        Ok(CommandOutput::ok("Configuration saved."))
    }

    fn handle_init(
        &self,
        filename: &Path,
        name: Option<&str>,
        description: Option<&str>,
        category: Option<&str>,
        force: bool,
    ) -> Result<CommandOutput, ApiError> {
        if filename.exists() && !force {
            if !self.interactive {
                return Err(ApiError::ConfigError(format!(
                    "{} already exists. Use --force to overwrite.",
                    filename.display()
                )));
            }
            let question = format!("File {} already exists. Overwrite?", filename.display());
            if !prompt::confirm(&question, false)? {
                return Ok(CommandOutput::ok("Cancelled."));
            }
        }

        let name = match name {
            Some(name) => name.to_string(),
            None if self.interactive => prompt::required_text("Agent name")?,
            None => return Err(requires_flag("--name")),
        };
        let description = match description {
            Some(description) => description.to_string(),
            None if self.interactive => prompt::required_text("Description")?,
            None => return Err(requires_flag("--description")),
        };
        let category = match category {
            Some(category) if CATEGORIES.contains(&category) => category.to_string(),
            Some(category) => {
                return Err(ApiError::Validation(vec![format!(
                    "unknown category '{}'",
                    category
                )]))
            }
            None if self.interactive => {
                let chosen = prompt::select("Category", &CATEGORIES, 0)?;
                CATEGORIES[chosen].to_string()
            }
            None => CATEGORIES[0].to_string(),
        };

        let id = slugify(&name);
        if id.is_empty() {
            return Err(ApiError::Validation(vec![format!(
                "name '{}' does not produce a usable id",
                name
            )]));
        }

        if let Some(parent) = filename.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(filename, render_template(&name, &description, &category))?;

        Ok(CommandOutput::ok(format!(
            "Created {} (id: {})\nEdit the file, then run `agt publish {}`.",
            filename.display(),
            id,
            filename.display()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::CatalogTransport;
    use crate::error::TransportError;
    use async_trait::async_trait;
    use tempfile::TempDir;

    struct OfflineTransport;

    #[async_trait]
    impl CatalogTransport for OfflineTransport {
        async fn get_text(&self, _path: &str) -> Result<String, TransportError> {
            Err(TransportError::Network("offline".to_string()))
        }
    }

    fn context(home: &TempDir) -> CliContext {
        let paths = AgtPaths::with_home(home.path());
        let config = ConfigLoader::load(&paths).unwrap();
        let registry = Arc::new(RegistryClient::new(
            Arc::new(OfflineTransport),
            Duration::from_secs(300),
        ));
        CliContext::with_registry(paths, config, registry)
    }

    #[tokio::test]
    async fn use_env_persists_api_url() {
        let home = TempDir::new().unwrap();
        let ctx = context(&home);
        let command = Commands::Config {
            command: Some(ConfigCommands::UseEnv {
                environment: "local".to_string(),
            }),
        };
        ctx.run(&command).await.unwrap();
        let reloaded = ConfigLoader::load(ctx.paths()).unwrap();
        assert_eq!(reloaded.api_url(), "http://localhost:3000");

        let bad = Commands::Config {
            command: Some(ConfigCommands::UseEnv {
                environment: "qa".to_string(),
            }),
        };
        assert!(ctx.run(&bad).await.is_err());
    }

    #[tokio::test]
    async fn config_changes_do_not_persist_environment_values() {
        let home = TempDir::new().unwrap();
        let paths = AgtPaths::with_home(home.path());
        let mut config = ConfigLoader::load(&paths).unwrap();
        config.token = Some("env-only-token".to_string());
        let registry = Arc::new(RegistryClient::new(
            Arc::new(OfflineTransport),
            Duration::from_secs(300),
        ));
        let ctx = CliContext::with_registry(paths, config, registry);

        for command in [
            ConfigCommands::UseEnv {
                environment: "local".to_string(),
            },
            ConfigCommands::SetUrl {
                url: "http://localhost:4000/".to_string(),
            },
        ] {
            ctx.run(&Commands::Config {
                command: Some(command),
            })
            .await
            .unwrap();
        }

        let on_disk = std::fs::read_to_string(ctx.paths().config_file()).unwrap();
        assert!(on_disk.contains("http://localhost:4000"));
        assert!(!on_disk.contains("env-only-token"));
    }

    #[tokio::test]
    async fn init_writes_valid_template() {
        let home = TempDir::new().unwrap();
        let ctx = context(&home);
        let file = home.path().join("agents").join("auditor.md");
        let command = Commands::Init {
            filename: file.clone(),
            name: Some("Security Auditor".to_string()),
            description: Some("Audits code".to_string()),
            category: Some("code-quality".to_string()),
            force: false,
        };
        let output = ctx.run(&command).await.unwrap();
        assert!(output.text.contains("security-auditor"));
        assert!(file.exists());
        assert!(ctx.run(&command).await.is_err(), "refuses to overwrite");
    }

    #[tokio::test]
    async fn registry_outage_is_fatal_for_install() {
        let home = TempDir::new().unwrap();
        let ctx = context(&home);
        let command = Commands::Install {
            agents: vec!["acme/reviewer".to_string()],
            version: None,
            target: None,
            force: false,
            dry_run: false,
            yes: true,
            strict: false,
        };
        let err = ctx.run(&command).await.unwrap_err();
        assert!(matches!(err, ApiError::RegistryUnavailable(_)));
    }

    #[tokio::test]
    async fn installed_list_works_offline() {
        let home = TempDir::new().unwrap();
        let ctx = context(&home);
        let command = Commands::List {
            installed: true,
            updates: false,
            categories: false,
            category: None,
            target: None,
            limit: 50,
            json: false,
        };
        let output = ctx.run(&command).await.unwrap();
        assert!(output.text.contains("No agents installed."));
    }
}
