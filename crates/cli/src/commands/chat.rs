//! Interactive assistant loop. The model is never consulted until the
//! guard and the deterministic policy layer have both passed on a line.

use std::io::Write as _;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};

use opsroute_agent::router::IntentRouter;
use opsroute_core::config::AppConfig;
use opsroute_core::guard::validate_user_input;
use opsroute_core::policy::try_handle_deterministically;

const TIMED_OUT: &str = "Timed out. Try a simpler request.";
const FAILED_SAFELY: &str = "Something failed safely. Try again.";

pub async fn run(config_path: Option<PathBuf>) -> Result<()> {
    let config = super::load_config(config_path)?;
    super::init_logging(&config);

    tracing::info!(
        base_url = %config.ollama.base_url,
        chat_model = %config.ollama.chat_model,
        embedding_model = %config.ollama.embedding_model,
        "starting assistant"
    );

    let router = opsroute_agent::runtime::bootstrap(config.clone()).await?;

    println!("opsroute assistant ready. Ask about the time in a city, an incident, or ops practices. Type `exit` to quit.");

    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();

    loop {
        print!("You: ");
        std::io::stdout().flush().context("flushing prompt")?;

        let Some(line) = lines.next_line().await.context("reading stdin")? else {
            break;
        };
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if input.eq_ignore_ascii_case("exit") {
            break;
        }

        if let Err(error) = handle_line(&router, &config, input).await {
            tracing::error!(%error, "request handling failed");
            eprintln!("Assistant: {FAILED_SAFELY}");
        }
    }

    tracing::info!("assistant stopped");
    Ok(())
}

async fn handle_line(router: &IntentRouter, config: &AppConfig, input: &str) -> Result<()> {
    if let Err(error) = validate_user_input(input, config.routing.max_input_chars) {
        return say(&error.to_string());
    }

    if let Some(reply) = try_handle_deterministically(input) {
        return say(&reply);
    }

    let deadline = Duration::from_secs(config.routing.request_timeout_secs);
    match tokio::time::timeout(deadline, router.route_and_execute(input)).await {
        Ok(result) => {
            tracing::info!(
                intent = ?result.intent,
                confidence = result.confidence,
                path = ?result.path,
                "request routed"
            );
            say(&result.response_text)
        }
        Err(_) => {
            tracing::warn!("request hit the outer deadline");
            say(TIMED_OUT)
        }
    }
}

fn say(message: &str) -> Result<()> {
    let mut out = std::io::stdout();
    writeln!(out, "Assistant: {message}").context("writing response")?;
    Ok(())
}
