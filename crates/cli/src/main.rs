use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    slidesmith_cli::run().await
}
