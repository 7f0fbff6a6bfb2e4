use std::env;
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};

use opsroute_cli::commands::{config, doctor};
use serde_json::Value;

static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

/// Serializes env mutation across tests and clears every `OPSROUTE_*`
/// variable before and after the closure runs.
fn with_env(vars: &[(&str, &str)], test: impl FnOnce()) {
    let _guard = ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env lock poisoned");

    clear_opsroute_vars();
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test();

    clear_opsroute_vars();
}

fn clear_opsroute_vars() {
    let keys: Vec<String> = env::vars()
        .map(|(key, _)| key)
        .filter(|key| key.starts_with("OPSROUTE_"))
        .collect();
    for key in keys {
        env::remove_var(&key);
    }
}

#[test]
fn config_reports_defaults_with_default_source() {
    with_env(&[], || {
        let output = config::run(None);

        assert!(output.starts_with("effective config"), "unexpected output: {output}");
        assert!(output.contains("- routing.max_input_chars = 2000 (source: default)"));
        assert!(output.contains("- routing.tool_timeout_ms = 1500 (source: default)"));
        assert!(output.contains("- ollama.base_url = http://localhost:11434 (source: default)"));
        assert!(output.contains("- logging.format = Compact (source: default)"));
    });
}

#[test]
fn config_attributes_env_overrides_to_their_variable() {
    with_env(&[("OPSROUTE_OLLAMA_BASE_URL", "http://probe:11434")], || {
        let output = config::run(None);

        assert!(output
            .contains("- ollama.base_url = http://probe:11434 (source: env (OPSROUTE_OLLAMA_BASE_URL))"));
        // untouched fields still read as defaults
        assert!(output.contains("- ollama.chat_model = llama3.2:3b (source: default)"));
    });
}

#[test]
fn config_reports_validation_failures() {
    with_env(&[("OPSROUTE_ROUTING_AMBIGUITY_MARGIN", "2.0")], || {
        let output = config::run(None);
        assert!(output.starts_with("config validation failed:"), "unexpected output: {output}");
    });
}

#[test]
fn config_rejects_a_missing_explicit_path() {
    with_env(&[], || {
        let output = config::run(Some(PathBuf::from("/nonexistent/opsroute.toml")));
        assert!(output.starts_with("config validation failed:"), "unexpected output: {output}");
    });
}

#[test]
fn doctor_skips_the_probe_when_config_is_invalid() {
    with_env(&[("OPSROUTE_ROUTING_TOOL_TIMEOUT_MS", "0")], || {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("runtime");
        let (output, healthy) = runtime.block_on(doctor::run(None, true));

        assert!(!healthy, "doctor must fail on invalid config");

        let report: Value = serde_json::from_str(&output).expect("doctor emits valid json");
        assert_eq!(report["overall_status"], "fail");
        assert_eq!(report["checks"][0]["name"], "config_validation");
        assert_eq!(report["checks"][0]["status"], "fail");
        assert_eq!(report["checks"][1]["name"], "ollama_connectivity");
        assert_eq!(report["checks"][1]["status"], "skipped");
    });
}
