use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    opsroute_cli::run().await
}
