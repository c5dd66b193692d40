//! Registry-published agent metadata.

use crate::types::Target;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Text keyed by language code (`en`, `zh`, ...).
///
/// The registry writes either a language map or a bare string; a bare string
/// is taken as English.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct LocalizedText(pub BTreeMap<String, String>);

impl LocalizedText {
    pub fn english(text: &str) -> Self {
        let mut map = BTreeMap::new();
        map.insert("en".to_string(), text.to_string());
        Self(map)
    }

    pub fn get(&self, lang: &str) -> Option<&str> {
        self.0.get(lang).map(String::as_str)
    }

    /// Whether non-blank text exists for `lang`.
    pub fn has(&self, lang: &str) -> bool {
        self.get(lang).map(|t| !t.trim().is_empty()).unwrap_or(false)
    }

    /// English text, or the first available language.
    pub fn preferred(&self) -> &str {
        self.get("en")
            .filter(|t| !t.trim().is_empty())
            .or_else(|| self.0.values().find(|t| !t.trim().is_empty()).map(String::as_str))
            .unwrap_or("")
    }

    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.0.values().map(String::as_str)
    }
}

impl<'de> Deserialize<'de> for LocalizedText {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Plain(String),
            Map(BTreeMap<String, Option<String>>),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Plain(text) => LocalizedText::english(&text),
            Raw::Map(map) => LocalizedText(
                map.into_iter()
                    .filter_map(|(lang, text)| text.map(|t| (lang, t)))
                    .collect(),
            ),
        })
    }
}

fn deserialize_compatibility<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<BTreeSet<Target>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        List(Vec<String>),
        Map(BTreeMap<String, serde_json::Value>),
    }

    let targets = match Option::<Raw>::deserialize(deserializer)? {
        None => BTreeSet::new(),
        Some(Raw::List(names)) => names
            .iter()
            .filter_map(|name| Target::from_compat_key(name))
            .collect(),
        Some(Raw::Map(entries)) => entries
            .iter()
            .filter(|(_, value)| !matches!(value, serde_json::Value::Null | serde_json::Value::Bool(false)))
            .filter_map(|(key, _)| Target::from_compat_key(key))
            .collect(),
    };
    Ok(targets)
}

/// Snapshot of one agent as published by the registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentDescriptor {
    pub id: String,
    pub author: String,
    #[serde(default)]
    pub category: String,
    /// Latest published version
    #[serde(alias = "latest")]
    pub version: String,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default, deserialize_with = "deserialize_compatibility")]
    pub compatibility: BTreeSet<Target>,
    #[serde(default)]
    pub downloads: u64,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub name: LocalizedText,
    #[serde(default)]
    pub description: LocalizedText,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub homepage: Option<String>,
}

impl AgentDescriptor {
    /// `author/id`
    pub fn key(&self) -> String {
        format!("{}/{}", self.author, self.id)
    }

    pub fn supports(&self, target: Target) -> bool {
        self.compatibility.contains(&target)
    }

    /// Whether the agent carries name or description text in `lang`.
    pub fn has_language(&self, lang: &str) -> bool {
        self.name.has(lang) || self.description.has(lang)
    }
}
