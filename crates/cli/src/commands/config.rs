use std::env;
use std::fs;
use std::path::Path;

use mercado_core::config::{resolve_config_path, AppConfig, ConfigOverrides, LoadOptions};
use serde::Serialize;
use toml::Value;

use crate::commands::{load_config, CommandResult};

#[derive(Debug, Serialize)]
struct ConfigEntry {
    key: &'static str,
    value: String,
    source: String,
}

/// Effective configuration with the layer each value came from.
pub fn run(options: &LoadOptions) -> CommandResult {
    let config = match load_config("config", options) {
        Ok(config) => config,
        Err(failure) => return failure,
    };

    let config_file_path = resolve_config_path(options.config_path.as_deref());
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());
    let sources = Sources {
        overrides: &options.overrides,
        file_doc: config_file_doc.as_ref(),
        file_path: config_file_path.as_deref(),
    };

    CommandResult::success_with(
        "config",
        "effective config (source precedence: override > env > file > default)",
        entries(&config, &sources),
    )
}

struct Sources<'a> {
    overrides: &'a ConfigOverrides,
    file_doc: Option<&'a Value>,
    file_path: Option<&'a Path>,
}

fn entries(config: &AppConfig, sources: &Sources<'_>) -> Vec<ConfigEntry> {
    let overrides = sources.overrides;
    let entry = |key: &'static str, value: String, env_keys: &[&str], overridden: bool| {
        ConfigEntry { key, value, source: field_source(key, env_keys, overridden, sources) }
    };

    vec![
        entry(
            "database.url",
            config.database.url.clone(),
            &["MERCADO_DATABASE_URL"],
            overrides.database_url.is_some(),
        ),
        entry(
            "database.max_connections",
            config.database.max_connections.to_string(),
            &["MERCADO_DATABASE_MAX_CONNECTIONS"],
            false,
        ),
        entry(
            "database.timeout_secs",
            config.database.timeout_secs.to_string(),
            &["MERCADO_DATABASE_TIMEOUT_SECS"],
            false,
        ),
        entry(
            "logging.level",
            config.logging.level.clone(),
            &["MERCADO_LOGGING_LEVEL", "MERCADO_LOG_LEVEL"],
            overrides.log_level.is_some(),
        ),
        entry(
            "logging.format",
            format!("{:?}", config.logging.format).to_lowercase(),
            &["MERCADO_LOGGING_FORMAT", "MERCADO_LOG_FORMAT"],
            overrides.log_format.is_some(),
        ),
        entry(
            "pricing.candidate_limit",
            config.pricing.candidate_limit.to_string(),
            &["MERCADO_PRICING_CANDIDATE_LIMIT"],
            overrides.candidate_limit.is_some(),
        ),
        entry(
            "pricing.price_history_limit",
            config.pricing.price_history_limit.to_string(),
            &["MERCADO_PRICING_PRICE_HISTORY_LIMIT"],
            false,
        ),
        entry(
            "pricing.recommendation_limit",
            config.pricing.recommendation_limit.to_string(),
            &["MERCADO_PRICING_RECOMMENDATION_LIMIT"],
            false,
        ),
    ]
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    overridden: bool,
    sources: &Sources<'_>,
) -> String {
    if overridden {
        return "override".to_string();
    }

    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = sources.file_doc {
        if contains_path(doc, key_path) {
            let file_path = sources
                .file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

#[cfg(test)]
mod tests {
    use toml::Value;

    use super::contains_path;

    #[test]
    fn nested_keys_are_found_in_toml_documents() {
        let doc: Value = "[pricing]\ncandidate_limit = 12\n".parse().expect("toml");
        assert!(contains_path(&doc, "pricing.candidate_limit"));
        assert!(!contains_path(&doc, "pricing.price_history_limit"));
        assert!(!contains_path(&doc, "database.url"));
    }
}
