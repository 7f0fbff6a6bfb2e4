use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Effective application configuration. Precedence: defaults < config
/// file < `OPSROUTE_*` environment variables < explicit overrides.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub routing: RoutingConfig,
    pub ollama: OllamaConfig,
    pub logging: LoggingConfig,
}

/// Decision-pipeline knobs. The confidence thresholds are behavioral
/// contracts: changing them changes which layer wins a classification.
#[derive(Clone, Debug)]
pub struct RoutingConfig {
    pub max_input_chars: usize,
    pub tool_timeout_ms: u64,
    pub compose_timeout_ms: u64,
    pub request_timeout_secs: u64,
    pub use_embedding_disambiguation: bool,
    pub embedding_confidence_threshold: f64,
    pub ambiguity_margin: f64,
}

#[derive(Clone, Debug)]
pub struct OllamaConfig {
    pub base_url: String,
    pub chat_model: String,
    pub embedding_model: String,
    pub http_timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub log_level: Option<String>,
    pub ollama_base_url: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            routing: RoutingConfig {
                max_input_chars: 2000,
                tool_timeout_ms: 1500,
                compose_timeout_ms: 4000,
                request_timeout_secs: 20,
                use_embedding_disambiguation: true,
                embedding_confidence_threshold: 0.45,
                ambiguity_margin: 0.05,
            },
            ollama: OllamaConfig {
                base_url: "http://localhost:11434".to_string(),
                chat_model: "llama3.2:3b".to_string(),
                embedding_model: "nomic-embed-text:latest".to_string(),
                http_timeout_secs: 30,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("opsroute.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(routing) = patch.routing {
            if let Some(max_input_chars) = routing.max_input_chars {
                self.routing.max_input_chars = max_input_chars;
            }
            if let Some(tool_timeout_ms) = routing.tool_timeout_ms {
                self.routing.tool_timeout_ms = tool_timeout_ms;
            }
            if let Some(compose_timeout_ms) = routing.compose_timeout_ms {
                self.routing.compose_timeout_ms = compose_timeout_ms;
            }
            if let Some(request_timeout_secs) = routing.request_timeout_secs {
                self.routing.request_timeout_secs = request_timeout_secs;
            }
            if let Some(use_embeddings) = routing.use_embedding_disambiguation {
                self.routing.use_embedding_disambiguation = use_embeddings;
            }
            if let Some(threshold) = routing.embedding_confidence_threshold {
                self.routing.embedding_confidence_threshold = threshold;
            }
            if let Some(margin) = routing.ambiguity_margin {
                self.routing.ambiguity_margin = margin;
            }
        }

        if let Some(ollama) = patch.ollama {
            if let Some(base_url) = ollama.base_url {
                self.ollama.base_url = base_url;
            }
            if let Some(chat_model) = ollama.chat_model {
                self.ollama.chat_model = chat_model;
            }
            if let Some(embedding_model) = ollama.embedding_model {
                self.ollama.embedding_model = embedding_model;
            }
            if let Some(http_timeout_secs) = ollama.http_timeout_secs {
                self.ollama.http_timeout_secs = http_timeout_secs;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("OPSROUTE_ROUTING_MAX_INPUT_CHARS") {
            self.routing.max_input_chars =
                parse_usize("OPSROUTE_ROUTING_MAX_INPUT_CHARS", &value)?;
        }
        if let Some(value) = read_env("OPSROUTE_ROUTING_TOOL_TIMEOUT_MS") {
            self.routing.tool_timeout_ms = parse_u64("OPSROUTE_ROUTING_TOOL_TIMEOUT_MS", &value)?;
        }
        if let Some(value) = read_env("OPSROUTE_ROUTING_COMPOSE_TIMEOUT_MS") {
            self.routing.compose_timeout_ms =
                parse_u64("OPSROUTE_ROUTING_COMPOSE_TIMEOUT_MS", &value)?;
        }
        if let Some(value) = read_env("OPSROUTE_ROUTING_REQUEST_TIMEOUT_SECS") {
            self.routing.request_timeout_secs =
                parse_u64("OPSROUTE_ROUTING_REQUEST_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = read_env("OPSROUTE_ROUTING_USE_EMBEDDING_DISAMBIGUATION") {
            self.routing.use_embedding_disambiguation =
                parse_bool("OPSROUTE_ROUTING_USE_EMBEDDING_DISAMBIGUATION", &value)?;
        }
        if let Some(value) = read_env("OPSROUTE_ROUTING_EMBEDDING_CONFIDENCE_THRESHOLD") {
            self.routing.embedding_confidence_threshold =
                parse_f64("OPSROUTE_ROUTING_EMBEDDING_CONFIDENCE_THRESHOLD", &value)?;
        }
        if let Some(value) = read_env("OPSROUTE_ROUTING_AMBIGUITY_MARGIN") {
            self.routing.ambiguity_margin = parse_f64("OPSROUTE_ROUTING_AMBIGUITY_MARGIN", &value)?;
        }

        if let Some(value) = read_env("OPSROUTE_OLLAMA_BASE_URL") {
            self.ollama.base_url = value;
        }
        if let Some(value) = read_env("OPSROUTE_OLLAMA_CHAT_MODEL") {
            self.ollama.chat_model = value;
        }
        if let Some(value) = read_env("OPSROUTE_OLLAMA_EMBEDDING_MODEL") {
            self.ollama.embedding_model = value;
        }
        if let Some(value) = read_env("OPSROUTE_OLLAMA_HTTP_TIMEOUT_SECS") {
            self.ollama.http_timeout_secs =
                parse_u64("OPSROUTE_OLLAMA_HTTP_TIMEOUT_SECS", &value)?;
        }

        let log_level =
            read_env("OPSROUTE_LOGGING_LEVEL").or_else(|| read_env("OPSROUTE_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("OPSROUTE_LOGGING_FORMAT").or_else(|| read_env("OPSROUTE_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(base_url) = overrides.ollama_base_url {
            self.ollama.base_url = base_url;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_routing(&self.routing)?;
        validate_ollama(&self.ollama)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("opsroute.toml"), PathBuf::from("config/opsroute.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    toml::from_str::<ConfigPatch>(&raw)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn validate_routing(routing: &RoutingConfig) -> Result<(), ConfigError> {
    if routing.max_input_chars == 0 {
        return Err(ConfigError::Validation(
            "routing.max_input_chars must be greater than zero".to_string(),
        ));
    }
    if routing.tool_timeout_ms == 0 || routing.compose_timeout_ms == 0 {
        return Err(ConfigError::Validation(
            "routing tool/compose timeouts must be greater than zero".to_string(),
        ));
    }
    if routing.request_timeout_secs == 0 || routing.request_timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "routing.request_timeout_secs must be in range 1..=300".to_string(),
        ));
    }
    if !(0.0..=1.0).contains(&routing.embedding_confidence_threshold) {
        return Err(ConfigError::Validation(
            "routing.embedding_confidence_threshold must be in range 0.0..=1.0".to_string(),
        ));
    }
    if !(0.0..=1.0).contains(&routing.ambiguity_margin) {
        return Err(ConfigError::Validation(
            "routing.ambiguity_margin must be in range 0.0..=1.0".to_string(),
        ));
    }
    Ok(())
}

fn validate_ollama(ollama: &OllamaConfig) -> Result<(), ConfigError> {
    let base_url = ollama.base_url.trim();
    if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
        return Err(ConfigError::Validation(
            "ollama.base_url must start with http:// or https://".to_string(),
        ));
    }
    if ollama.chat_model.trim().is_empty() || ollama.embedding_model.trim().is_empty() {
        return Err(ConfigError::Validation(
            "ollama.chat_model and ollama.embedding_model are required".to_string(),
        ));
    }
    if ollama.http_timeout_secs == 0 || ollama.http_timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "ollama.http_timeout_secs must be in range 1..=300".to_string(),
        ));
    }
    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_usize(key: &str, value: &str) -> Result<usize, ConfigError> {
    value.parse::<usize>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_f64(key: &str, value: &str) -> Result<f64, ConfigError> {
    value.parse::<f64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    value.parse::<bool>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    routing: Option<RoutingPatch>,
    ollama: Option<OllamaPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct RoutingPatch {
    max_input_chars: Option<usize>,
    tool_timeout_ms: Option<u64>,
    compose_timeout_ms: Option<u64>,
    request_timeout_secs: Option<u64>,
    use_embedding_disambiguation: Option<bool>,
    embedding_confidence_threshold: Option<f64>,
    ambiguity_margin: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct OllamaPatch {
    base_url: Option<String>,
    chat_model: Option<String>,
    embedding_model: Option<String>,
    http_timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::fs;
    use std::sync::{Mutex, OnceLock};

    use tempfile::TempDir;

    use super::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    fn env_lock() -> &'static Mutex<()> {
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    fn clear_vars(vars: &[&str]) {
        for var in vars {
            env::remove_var(var);
        }
    }

    #[test]
    fn defaults_match_reference_deployment() {
        let _guard = env_lock().lock().expect("env lock poisoned");
        let config = AppConfig::default();

        assert_eq!(config.routing.max_input_chars, 2000);
        assert_eq!(config.routing.tool_timeout_ms, 1500);
        assert_eq!(config.routing.compose_timeout_ms, 4000);
        assert_eq!(config.routing.request_timeout_secs, 20);
        assert!(config.routing.use_embedding_disambiguation);
        assert_eq!(config.routing.embedding_confidence_threshold, 0.45);
        assert_eq!(config.routing.ambiguity_margin, 0.05);
        assert_eq!(config.ollama.base_url, "http://localhost:11434");
        assert_eq!(config.logging.format, LogFormat::Compact);
    }

    #[test]
    fn file_values_override_defaults() {
        let _guard = env_lock().lock().expect("env lock poisoned");

        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("opsroute.toml");
        fs::write(
            &path,
            r#"
[routing]
tool_timeout_ms = 900
embedding_confidence_threshold = 0.6

[ollama]
chat_model = "llama3.1:8b"

[logging]
level = "debug"
format = "json"
"#,
        )
        .expect("write config");

        let config =
            AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
                .expect("config load");

        assert_eq!(config.routing.tool_timeout_ms, 900);
        assert_eq!(config.routing.embedding_confidence_threshold, 0.6);
        assert_eq!(config.ollama.chat_model, "llama3.1:8b");
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, LogFormat::Json);
        // untouched fields keep their defaults
        assert_eq!(config.routing.compose_timeout_ms, 4000);
    }

    #[test]
    fn precedence_is_defaults_file_env_overrides() {
        let _guard = env_lock().lock().expect("env lock poisoned");
        env::set_var("OPSROUTE_OLLAMA_BASE_URL", "http://env-host:11434");
        env::set_var("OPSROUTE_LOG_LEVEL", "warn");

        let result = (|| {
            let dir = TempDir::new().expect("tempdir");
            let path = dir.path().join("opsroute.toml");
            fs::write(
                &path,
                r#"
[ollama]
base_url = "http://file-host:11434"

[logging]
level = "error"
"#,
            )
            .expect("write config");

            let config = AppConfig::load(LoadOptions {
                config_path: Some(path),
                overrides: ConfigOverrides {
                    log_level: Some("trace".to_string()),
                    ..ConfigOverrides::default()
                },
                ..LoadOptions::default()
            })
            .expect("config load");

            assert_eq!(config.ollama.base_url, "http://env-host:11434");
            assert_eq!(config.logging.level, "trace");
        })();

        clear_vars(&["OPSROUTE_OLLAMA_BASE_URL", "OPSROUTE_LOG_LEVEL"]);
        result
    }

    #[test]
    fn out_of_range_threshold_fails_validation() {
        let _guard = env_lock().lock().expect("env lock poisoned");
        env::set_var("OPSROUTE_ROUTING_EMBEDDING_CONFIDENCE_THRESHOLD", "1.5");

        let error = AppConfig::load(LoadOptions::default());
        clear_vars(&["OPSROUTE_ROUTING_EMBEDDING_CONFIDENCE_THRESHOLD"]);

        match error {
            Err(ConfigError::Validation(message)) => {
                assert!(message.contains("embedding_confidence_threshold"));
            }
            other => panic!("expected validation failure, got {other:?}"),
        }
    }

    #[test]
    fn missing_required_file_is_reported() {
        let _guard = env_lock().lock().expect("env lock poisoned");
        let missing = std::path::PathBuf::from("/nonexistent/opsroute.toml");
        let error = AppConfig::load(LoadOptions {
            config_path: Some(missing.clone()),
            require_file: true,
            ..LoadOptions::default()
        });
        assert!(matches!(error, Err(ConfigError::MissingConfigFile(path)) if path == missing));
    }

    #[test]
    fn bad_env_number_is_an_invalid_override() {
        let _guard = env_lock().lock().expect("env lock poisoned");
        env::set_var("OPSROUTE_ROUTING_TOOL_TIMEOUT_MS", "soon");

        let error = AppConfig::load(LoadOptions::default());
        clear_vars(&["OPSROUTE_ROUTING_TOOL_TIMEOUT_MS"]);

        assert!(matches!(error, Err(ConfigError::InvalidEnvOverride { key, .. })
            if key == "OPSROUTE_ROUTING_TOOL_TIMEOUT_MS"));
    }
}
