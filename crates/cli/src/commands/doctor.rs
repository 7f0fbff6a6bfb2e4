//! Readiness checks: configuration validity and a live probe of the
//! Ollama embedding endpoint.

use std::path::PathBuf;

use serde::Serialize;

use opsroute_agent::llm::LanguageModelService;
use opsroute_agent::ollama::OllamaClient;
use opsroute_core::config::AppConfig;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub async fn run(config_path: Option<PathBuf>, json_output: bool) -> (String, bool) {
    let report = build_report(config_path).await;
    let healthy = report.overall_status == CheckStatus::Pass;

    let output = if json_output {
        serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        })
    } else {
        render_human(&report)
    };

    (output, healthy)
}

async fn build_report(config_path: Option<PathBuf>) -> DoctorReport {
    let mut checks = Vec::new();

    match super::load_config(config_path) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            checks.push(check_ollama_connectivity(&config).await);
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: format!("{error:#}"),
            });
            checks.push(DoctorCheck {
                name: "ollama_connectivity",
                status: CheckStatus::Skipped,
                details: "skipped because configuration did not load".to_string(),
            });
        }
    }

    let all_pass = checks.iter().all(|check| check.status == CheckStatus::Pass);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

async fn check_ollama_connectivity(config: &AppConfig) -> DoctorCheck {
    let client = match OllamaClient::new(config.ollama.clone()) {
        Ok(client) => client,
        Err(error) => {
            return DoctorCheck {
                name: "ollama_connectivity",
                status: CheckStatus::Fail,
                details: format!("failed to build http client: {error:#}"),
            };
        }
    };

    match client.embed("ping").await {
        Ok(vector) => DoctorCheck {
            name: "ollama_connectivity",
            status: CheckStatus::Pass,
            details: format!(
                "embedded probe with `{}` ({} dimensions)",
                config.ollama.embedding_model,
                vector.len()
            ),
        },
        Err(error) => DoctorCheck {
            name: "ollama_connectivity",
            status: CheckStatus::Fail,
            details: format!("failed to reach `{}`: {error:#}", config.ollama.base_url),
        },
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
