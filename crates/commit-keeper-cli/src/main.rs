use commit_keeper_cli::run_cli;
use tracing::error;

#[tokio::main]
async fn main() {
    if let Err(e) = run_cli().await {
        // Configuration errors occur before the subscriber is installed
        error!("CLI error: {}", e);
        eprintln!("commit-keeper: {}", e);

        std::process::exit(e.exit_code());
    }
}
