use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::{Map, Value};

use super::defaults::default_settings;
use super::paths::AppPaths;
use super::settings::{ApiKeys, AppConfig, Settings};
use super::validation::validate_config;
use crate::core::errors::AssistantError;

const REDACT_PLACEHOLDER: &str = "****";

const SENSITIVE_PATTERNS: [&str; 8] = [
    "api_key",
    "secret",
    "password",
    "_token",
    "credential",
    "private_key",
    "access_key",
    "bearer",
];

const SENSITIVE_WHITELIST: [&str; 2] = ["max_tokens", "max_output_tokens"];

#[derive(Clone)]
pub struct ConfigService {
    paths: Arc<AppPaths>,
    explicit_path: Option<PathBuf>,
}

impl ConfigService {
    pub fn new(paths: Arc<AppPaths>) -> Self {
        Self {
            paths,
            explicit_path: None,
        }
    }

    /// Pins the settings file, bypassing discovery.
    pub fn with_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.explicit_path = Some(path.into());
        self
    }

    pub fn paths(&self) -> &AppPaths {
        &self.paths
    }

    pub fn config_path(&self) -> PathBuf {
        if let Some(path) = &self.explicit_path {
            return path.clone();
        }

        if let Ok(path) = env::var("FAQ_ASSISTANT_CONFIG_PATH") {
            return PathBuf::from(path);
        }

        let user_config = self.paths.data_dir.join("config.yml");
        if user_config.exists() {
            return user_config;
        }

        self.paths.project_root.join("config.yml")
    }

    /// Defaults merged with the settings file, validated.
    pub fn load_settings(&self) -> Result<Settings, AssistantError> {
        let path = self.config_path();
        let file_config = load_yaml_file(&path)?;
        let merged = deep_merge(&default_settings(), &file_config);
        validate_config(&merged)?;

        serde_json::from_value(merged).map_err(|err| {
            AssistantError::Config(format!("Invalid config in {}: {}", path.display(), err))
        })
    }

    /// Settings plus the API keys from the process environment.
    pub fn load(&self) -> Result<AppConfig, AssistantError> {
        let settings = self.load_settings()?;
        let keys = ApiKeys::from_env()?;
        tracing::debug!("Loaded configuration from {}", self.config_path().display());
        Ok(AppConfig { settings, keys })
    }
}

/// Effective configuration as JSON with every secret masked.
pub fn redacted_view(config: &AppConfig) -> Value {
    let mut view = serde_json::to_value(&config.settings).unwrap_or(Value::Null);
    if let Some(map) = view.as_object_mut() {
        map.insert(
            "keys".to_string(),
            serde_json::json!({
                "openai_api_key": config.keys.openai.expose(),
                "pinecone_api_key": config.keys.pinecone.expose(),
                "google_api_key": config.keys.google.expose(),
            }),
        );
    }
    redact_sensitive_values(&view)
}

fn load_yaml_file(path: &Path) -> Result<Value, AssistantError> {
    if !path.exists() {
        return Ok(Value::Object(Map::new()));
    }

    let contents = fs::read_to_string(path).map_err(|err| {
        AssistantError::Config(format!("Failed to read {}: {}", path.display(), err))
    })?;
    if contents.trim().is_empty() {
        return Ok(Value::Object(Map::new()));
    }

    let value = serde_yaml::from_str::<Value>(&contents).map_err(|err| {
        AssistantError::Config(format!("Failed to parse {}: {}", path.display(), err))
    })?;
    match value {
        Value::Object(_) => Ok(value),
        Value::Null => Ok(Value::Object(Map::new())),
        _ => Err(AssistantError::Config(format!(
            "Invalid config in {}: expected a mapping at the top level",
            path.display()
        ))),
    }
}

fn deep_merge(base: &Value, override_value: &Value) -> Value {
    match (base, override_value) {
        (Value::Object(base_map), Value::Object(override_map)) => {
            let mut merged: Map<String, Value> = base_map.clone();
            for (key, value) in override_map {
                let merged_value = match merged.get(key) {
                    Some(existing) => deep_merge(existing, value),
                    None => value.clone(),
                };
                merged.insert(key.clone(), merged_value);
            }
            Value::Object(merged)
        }
        _ => override_value.clone(),
    }
}

fn redact_sensitive_values(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut redacted = Map::new();
            for (key, val) in map {
                if is_sensitive_key(key) && !val.is_null() {
                    redacted.insert(key.clone(), Value::String(REDACT_PLACEHOLDER.to_string()));
                } else {
                    redacted.insert(key.clone(), redact_sensitive_values(val));
                }
            }
            Value::Object(redacted)
        }
        Value::Array(items) => Value::Array(items.iter().map(redact_sensitive_values).collect()),
        _ => value.clone(),
    }
}

fn is_sensitive_key(key: &str) -> bool {
    let key_lower = key.to_lowercase();
    if SENSITIVE_WHITELIST
        .iter()
        .any(|allowed| *allowed == key_lower)
    {
        return false;
    }
    SENSITIVE_PATTERNS
        .iter()
        .any(|pattern| key_lower.contains(pattern))
}
