//! Effective-config inspection with per-field source attribution, so an
//! operator can tell which layer (default, file, env) set each value.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use toml::Value;

pub fn run(config_path: Option<PathBuf>) -> String {
    let config = match super::load_config(config_path.clone()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error:#}"),
    };

    let config_file_path = config_path.filter(|path| path.exists()).or_else(detect_config_path);
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let fields: Vec<(&str, String, &str)> = vec![
        (
            "routing.max_input_chars",
            config.routing.max_input_chars.to_string(),
            "OPSROUTE_ROUTING_MAX_INPUT_CHARS",
        ),
        (
            "routing.tool_timeout_ms",
            config.routing.tool_timeout_ms.to_string(),
            "OPSROUTE_ROUTING_TOOL_TIMEOUT_MS",
        ),
        (
            "routing.compose_timeout_ms",
            config.routing.compose_timeout_ms.to_string(),
            "OPSROUTE_ROUTING_COMPOSE_TIMEOUT_MS",
        ),
        (
            "routing.request_timeout_secs",
            config.routing.request_timeout_secs.to_string(),
            "OPSROUTE_ROUTING_REQUEST_TIMEOUT_SECS",
        ),
        (
            "routing.use_embedding_disambiguation",
            config.routing.use_embedding_disambiguation.to_string(),
            "OPSROUTE_ROUTING_USE_EMBEDDING_DISAMBIGUATION",
        ),
        (
            "routing.embedding_confidence_threshold",
            config.routing.embedding_confidence_threshold.to_string(),
            "OPSROUTE_ROUTING_EMBEDDING_CONFIDENCE_THRESHOLD",
        ),
        (
            "routing.ambiguity_margin",
            config.routing.ambiguity_margin.to_string(),
            "OPSROUTE_ROUTING_AMBIGUITY_MARGIN",
        ),
        ("ollama.base_url", config.ollama.base_url.clone(), "OPSROUTE_OLLAMA_BASE_URL"),
        ("ollama.chat_model", config.ollama.chat_model.clone(), "OPSROUTE_OLLAMA_CHAT_MODEL"),
        (
            "ollama.embedding_model",
            config.ollama.embedding_model.clone(),
            "OPSROUTE_OLLAMA_EMBEDDING_MODEL",
        ),
        (
            "ollama.http_timeout_secs",
            config.ollama.http_timeout_secs.to_string(),
            "OPSROUTE_OLLAMA_HTTP_TIMEOUT_SECS",
        ),
        ("logging.level", config.logging.level.clone(), "OPSROUTE_LOGGING_LEVEL"),
        ("logging.format", format!("{:?}", config.logging.format), "OPSROUTE_LOGGING_FORMAT"),
    ];

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for (key, value, env_key) in fields {
        let source =
            field_source(key, env_key, config_file_doc.as_ref(), config_file_path.as_deref());
        lines.push(format!("- {key} = {value} (source: {source})"));
    }

    lines.join("\n")
}

fn detect_config_path() -> Option<PathBuf> {
    [PathBuf::from("opsroute.toml"), PathBuf::from("config/opsroute.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let raw = fs::read_to_string(path?).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_key: &str,
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if env::var_os(env_key).is_some() {
        return format!("env ({env_key})");
    }
    // The logging keys also honor shorter aliases.
    if let Some(alias) = logging_alias(env_key) {
        if env::var_os(alias).is_some() {
            return format!("env ({alias})");
        }
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn logging_alias(env_key: &str) -> Option<&'static str> {
    match env_key {
        "OPSROUTE_LOGGING_LEVEL" => Some("OPSROUTE_LOG_LEVEL"),
        "OPSROUTE_LOGGING_FORMAT" => Some("OPSROUTE_LOG_FORMAT"),
        _ => None,
    }
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
