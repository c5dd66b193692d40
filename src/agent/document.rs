//! Agent file parsing and publish-time validation.
//!
//! An agent file is markdown with an optional YAML frontmatter block. Metadata is
//! read from the frontmatter first, then from `# Key: value` header lines, then
//! from the first heading and paragraph of the body.

use crate::agent::descriptor::LocalizedText;
use crate::error::ApiError;
use crate::types::{Target, SUPPORTED_LANGUAGES};
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::OnceLock;

/// Categories the registry accepts.
pub const CATEGORIES: [&str; 20] = [
    "core-architecture",
    "web-programming",
    "systems-programming",
    "enterprise-programming",
    "ui-mobile",
    "specialized-platforms",
    "devops-deployment",
    "database-management",
    "incident-network",
    "code-quality",
    "testing-debugging",
    "performance-observability",
    "machine-learning",
    "data-analytics",
    "seo-content",
    "documentation",
    "business-finance",
    "marketing-sales",
    "support-legal",
    "specialized-domains",
];

const DESCRIPTION_FALLBACK_CHARS: usize = 200;

fn string_like<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let value = Option::<serde_yaml::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_yaml::Value::String(s)) => Some(s.trim().to_string()),
        Some(serde_yaml::Value::Number(n)) => Some(n.to_string()),
        Some(serde_yaml::Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

fn string_list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    let value = Option::<serde_yaml::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_yaml::Value::Sequence(items)) => items
            .into_iter()
            .filter_map(|item| match item {
                serde_yaml::Value::String(s) => Some(s.trim().to_string()),
                serde_yaml::Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .filter(|s| !s.is_empty())
            .collect(),
        Some(serde_yaml::Value::String(s)) => s
            .trim_matches(|c| c == '[' || c == ']')
            .split(',')
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect(),
        _ => Vec::new(),
    })
}

/// Typed frontmatter of an agent file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AgentFrontmatter {
    #[serde(default, deserialize_with = "string_like")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "string_like")]
    pub version: Option<String>,
    #[serde(default, deserialize_with = "string_like")]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "string_like")]
    pub author: Option<String>,
    #[serde(default, deserialize_with = "string_like")]
    pub license: Option<String>,
    #[serde(default, deserialize_with = "string_like")]
    pub homepage: Option<String>,
    #[serde(default, deserialize_with = "string_list")]
    pub tags: Vec<String>,
    #[serde(default, deserialize_with = "string_list")]
    pub compatibility: Vec<String>,
    /// Plain `name`/`description` are taken as English
    #[serde(default, deserialize_with = "string_like")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "string_like")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "string_like")]
    pub name_en: Option<String>,
    #[serde(default, deserialize_with = "string_like")]
    pub description_en: Option<String>,
    #[serde(default, deserialize_with = "string_like")]
    pub name_zh: Option<String>,
    #[serde(default, deserialize_with = "string_like")]
    pub description_zh: Option<String>,
    #[serde(default, deserialize_with = "string_like")]
    pub name_ja: Option<String>,
    #[serde(default, deserialize_with = "string_like")]
    pub description_ja: Option<String>,
    #[serde(default, deserialize_with = "string_like")]
    pub name_vi: Option<String>,
    #[serde(default, deserialize_with = "string_like")]
    pub description_vi: Option<String>,
    /// Keys with no typed field; surfaced as warnings
    #[serde(flatten)]
    pub unknown: BTreeMap<String, serde_yaml::Value>,
}

impl AgentFrontmatter {
    fn localized_mut(&mut self, field: &str, lang: &str) -> Option<&mut Option<String>> {
        match (field, lang) {
            ("name", "en") => Some(&mut self.name_en),
            ("name", "zh") => Some(&mut self.name_zh),
            ("name", "ja") => Some(&mut self.name_ja),
            ("name", "vi") => Some(&mut self.name_vi),
            ("description", "en") => Some(&mut self.description_en),
            ("description", "zh") => Some(&mut self.description_zh),
            ("description", "ja") => Some(&mut self.description_ja),
            ("description", "vi") => Some(&mut self.description_vi),
            _ => None,
        }
    }

    fn localized(&self, field: &str, lang: &str) -> Option<&str> {
        let value = match (field, lang) {
            ("name", "en") => &self.name_en,
            ("name", "zh") => &self.name_zh,
            ("name", "ja") => &self.name_ja,
            ("name", "vi") => &self.name_vi,
            ("description", "en") => &self.description_en,
            ("description", "zh") => &self.description_zh,
            ("description", "ja") => &self.description_ja,
            ("description", "vi") => &self.description_vi,
            _ => &None,
        };
        value.as_deref().filter(|v| !v.trim().is_empty())
    }
}

/// Validated metadata ready to be submitted or staged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentMetadata {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    pub version: String,
    pub category: String,
    pub name: LocalizedText,
    pub description: LocalizedText,
    pub tags: Vec<String>,
    pub compatibility: BTreeSet<Target>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub homepage: Option<String>,
}

/// A parsed, not yet validated, agent file.
#[derive(Debug, Clone)]
pub struct AgentDocument {
    pub frontmatter: AgentFrontmatter,
    /// Problems found while reading the header block
    pub parse_errors: Vec<String>,
    /// Full original file content
    pub content: String,
}

fn frontmatter_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\A---[ \t]*\r?\n([\s\S]*?)\r?\n---[ \t]*(?:\r?\n|\z)").unwrap())
}

fn header_patterns() -> &'static Vec<(&'static str, &'static str, Regex)> {
    static PATTERNS: OnceLock<Vec<(&'static str, &'static str, Regex)>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        let specs: [(&str, &str, &str); 13] = [
            ("id", "", r"ID|Agent ID|AgentID"),
            ("version", "", r"Version"),
            ("category", "", r"Category"),
            ("homepage", "", r"Homepage|URL|Website"),
            ("license", "", r"License"),
            ("name", "en", r"Name \(EN\)|Name \(English\)|Name-EN|NameEN"),
            ("description", "en", r"Description \(EN\)|Description \(English\)|Description-EN|DescriptionEN"),
            ("name", "zh", r"Name \(ZH\)|Name \(Chinese\)|Name-ZH|NameZH|名称"),
            ("description", "zh", r"Description \(ZH\)|Description \(Chinese\)|Description-ZH|DescriptionZH|描述"),
            ("name", "ja", r"Name \(JA\)|Name \(Japanese\)|Name-JA|NameJA|名前"),
            ("description", "ja", r"Description \(JA\)|Description \(Japanese\)|Description-JA|DescriptionJA|説明"),
            ("name", "vi", r"Name \(VI\)|Name \(Vietnamese\)|Name-VI|NameVI"),
            ("description", "vi", r"Description \(VI\)|Description \(Vietnamese\)|Description-VI|DescriptionVI"),
        ];
        specs
            .iter()
            .map(|(field, lang, labels)| {
                let pattern = format!(r"(?im)^#+\s*(?:{}):\s*(.+)$", labels);
                (*field, *lang, Regex::new(&pattern).unwrap())
            })
            .collect()
    })
}

fn first_heading_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^#+\s*(.+)$").unwrap())
}

fn first_paragraph_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^#+.+\r?\n\r?\n(.+)").unwrap())
}

fn version_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d+\.\d+\.\d+$").unwrap())
}

fn fill(slot: &mut Option<String>, value: &str) {
    if slot.as_deref().map(|s| s.trim().is_empty()).unwrap_or(true) {
        *slot = Some(value.trim().to_string());
    }
}

impl AgentDocument {
    /// Parse an agent file. Never fails; header problems are kept in `parse_errors`.
    pub fn parse(content: &str) -> Self {
        let mut parse_errors = Vec::new();
        let (mut frontmatter, body) = match frontmatter_re().captures(content) {
            Some(caps) => {
                let block = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
                let body = &content[caps.get(0).map(|m| m.end()).unwrap_or(0)..];
                let frontmatter = if block.trim().is_empty() {
                    AgentFrontmatter::default()
                } else {
                    match serde_yaml::from_str::<AgentFrontmatter>(block) {
                        Ok(fm) => fm,
                        Err(e) => {
                            parse_errors.push(format!("frontmatter is not valid YAML: {}", e));
                            AgentFrontmatter::default()
                        }
                    }
                };
                (frontmatter, body)
            }
            None => (AgentFrontmatter::default(), content),
        };

        if let Some(name) = frontmatter.name.clone() {
            fill(&mut frontmatter.name_en, &name);
        }
        if let Some(description) = frontmatter.description.clone() {
            fill(&mut frontmatter.description_en, &description);
        }

        for (field, lang, re) in header_patterns() {
            let Some(value) = re.captures(content).and_then(|c| c.get(1)) else {
                continue;
            };
            let value = value.as_str();
            match (*field, *lang) {
                ("id", _) => fill(&mut frontmatter.id, value),
                ("version", _) => fill(&mut frontmatter.version, value),
                ("category", _) => fill(&mut frontmatter.category, value),
                ("homepage", _) => fill(&mut frontmatter.homepage, value),
                ("license", _) => fill(&mut frontmatter.license, value),
                (field, lang) => {
                    if let Some(slot) = frontmatter.localized_mut(field, lang) {
                        fill(slot, value);
                    }
                }
            }
        }

        if frontmatter.localized("name", "en").is_none() {
            if let Some(heading) = first_heading_re().captures(body).and_then(|c| c.get(1)) {
                fill(&mut frontmatter.name_en, heading.as_str());
            }
        }
        if frontmatter.localized("description", "en").is_none() {
            if let Some(paragraph) = first_paragraph_re().captures(body).and_then(|c| c.get(1)) {
                let text: String = paragraph
                    .as_str()
                    .trim()
                    .chars()
                    .take(DESCRIPTION_FALLBACK_CHARS)
                    .collect();
                fill(&mut frontmatter.description_en, &text);
            }
        }

        Self {
            frontmatter,
            parse_errors,
            content: content.to_string(),
        }
    }

    /// Frontmatter keys that have no typed field.
    pub fn unknown_keys(&self) -> Vec<String> {
        self.frontmatter.unknown.keys().cloned().collect()
    }

    /// Validate required fields, collecting every violation.
    ///
    /// `file_stem` supplies the id when the file does not declare one.
    pub fn validate(&self, file_stem: Option<&str>) -> Result<AgentMetadata, ApiError> {
        let fm = &self.frontmatter;
        let mut errors = self.parse_errors.clone();

        let id = fm
            .id
            .clone()
            .filter(|id| !id.is_empty())
            .or_else(|| file_stem.map(str::to_string))
            .unwrap_or_default();
        if id.is_empty() {
            errors.push("missing id (set `id` or name the file after the agent)".to_string());
        } else if id.contains('/') || id.chars().any(char::is_whitespace) {
            errors.push(format!("id '{}' must not contain '/' or whitespace", id));
        }

        let version = fm.version.clone().unwrap_or_default();
        if version.is_empty() {
            errors.push("missing version".to_string());
        } else if !version_re().is_match(&version) {
            errors.push(format!(
                "version '{}' must be in major.minor.patch form (e.g. 1.0.0)",
                version
            ));
        }

        let category = fm.category.clone().unwrap_or_default();
        if category.is_empty() {
            errors.push("missing category".to_string());
        } else if !CATEGORIES.contains(&category.as_str()) {
            errors.push(format!("unknown category '{}'", category));
        }

        let mut name = BTreeMap::new();
        let mut description = BTreeMap::new();
        for lang in SUPPORTED_LANGUAGES {
            if let Some(n) = fm.localized("name", lang) {
                name.insert(lang.to_string(), n.to_string());
            }
            if let Some(d) = fm.localized("description", lang) {
                description.insert(lang.to_string(), d.to_string());
            }
        }
        let has_pair = SUPPORTED_LANGUAGES
            .iter()
            .any(|lang| name.contains_key(*lang) && description.contains_key(*lang));
        if !has_pair {
            errors.push(
                "at least one language needs both a name and a description (e.g. name_en and description_en)"
                    .to_string(),
            );
        }

        let mut compatibility = BTreeSet::new();
        for entry in &fm.compatibility {
            match Target::from_compat_key(entry) {
                Some(target) => {
                    compatibility.insert(target);
                }
                None => errors.push(format!("unknown compatibility target '{}'", entry)),
            }
        }
        if compatibility.is_empty() {
            compatibility.insert(Target::ClaudeCode);
        }

        if !errors.is_empty() {
            return Err(ApiError::Validation(errors));
        }

        Ok(AgentMetadata {
            id,
            author: fm.author.clone().filter(|a| !a.is_empty()),
            version,
            category,
            name: LocalizedText(name),
            description: LocalizedText(description),
            tags: fm.tags.clone(),
            compatibility,
            license: fm.license.clone(),
            homepage: fm.homepage.clone(),
        })
    }
}

/// Turn a display name into an agent id (`"My Agent!"` -> `"my-agent"`).
pub fn slugify(name: &str) -> String {
    let cleaned: String = name
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || c.is_whitespace() || *c == '-')
        .collect();
    cleaned
        .split(|c: char| c.is_whitespace() || c == '-')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

/// Render a new agent file for `agt init`.
pub fn render_template(name: &str, description: &str, category: &str) -> String {
    let id = slugify(name);
    let mut tags: Vec<String> = name
        .to_lowercase()
        .split_whitespace()
        .filter(|w| w.chars().count() > 3)
        .map(str::to_string)
        .collect();
    tags.push(category.to_string());
    tags.truncate(5);

    format!(
        "---\n\
id: {id}\n\
version: 1.0.0\n\
category: {category}\n\
name_en: {name}\n\
description_en: {description}\n\
tags: [{tags}]\n\
license: MIT\n\
---\n\
\n\
# {name}\n\
\n\
{description}\n\
\n\
## Usage\n\
\n\
[Explain how to use this agent]\n\
\n\
## Examples\n\
\n\
[Add practical examples that demonstrate the agent]\n",
        id = id,
        category = category,
        name = name,
        description = description,
        tags = tags.join(", "),
    )
}
