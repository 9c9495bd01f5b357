mod logging;

use replybot_core::{executable_dir, ConfigBootstrap, ConfigOutcome, ErrorExt};
use std::path::Path;
use std::process::ExitCode;
use stream_watcher::{authenticate, RunOutcome, StreamWatcher};

const LOGS_DIR_NAME: &str = "logs";

#[tokio::main]
async fn main() -> ExitCode {
    let base_dir = match executable_dir() {
        Ok(dir) => dir,
        Err(e) => {
            eprintln!("Could not locate the executable directory: {}", e);
            return ExitCode::from(RunOutcome::RESTART_EXIT_CODE);
        }
    };

    let _log_guard = match logging::init(&base_dir.join(LOGS_DIR_NAME)) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Could not set up logging: {}", e);
            return ExitCode::from(RunOutcome::RESTART_EXIT_CODE);
        }
    };

    tracing::info!("Starting replybot v{}", env!("CARGO_PKG_VERSION"));
    ExitCode::from(run(&base_dir).await)
}

async fn run(base_dir: &Path) -> u8 {
    let bootstrap = ConfigBootstrap::new(base_dir);
    let settings = match bootstrap.load() {
        Ok(ConfigOutcome::Ready(settings)) => settings,
        Ok(ConfigOutcome::RestartRequired { reason }) => {
            tracing::warn!("{}", reason.user_friendly_message());
            tracing::info!(
                "Fill in {} and start the bot again",
                bootstrap.path().display()
            );
            return RunOutcome::CLEAN_EXIT_CODE;
        }
        Err(e) => {
            e.log_error();
            return RunOutcome::RESTART_EXIT_CODE;
        }
    };

    let mut stream = match authenticate(&settings).await {
        Ok(stream) => stream,
        Err(_) => return RunOutcome::RESTART_EXIT_CODE,
    };

    let mut watcher = StreamWatcher::new(&settings);
    let outcome = watcher.run(&mut stream, interrupted()).await;

    match &outcome {
        RunOutcome::CleanStop => tracing::info!("Comment stream stopped"),
        RunOutcome::RestartRequested(reason) => {
            tracing::warn!("Exiting so the supervisor can restart: {}", reason)
        }
    }
    outcome.exit_code()
}

/// Resolves on ctrl-c. If the handler can't be installed, never resolves.
async fn interrupted() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for ctrl-c: {}", e);
        std::future::pending::<()>().await;
    }
}
