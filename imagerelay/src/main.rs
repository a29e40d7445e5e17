#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

mod args;

use std::path::{Path, PathBuf};

use args::Args;
use clap::Parser;
use imagerelay_config::Config;
use imagerelay_server::Server;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env_file = load_env_file(None);
    let args = Args::parse();

    // Load configuration
    let mut config = Config::load_or_default(args.config.as_deref())?;
    if let Some(listen) = args.listen {
        config.server.listen_address = Some(listen);
    }

    // Initialize telemetry
    let _telemetry_guard = imagerelay_telemetry::init(config.telemetry.as_ref(), "info")?;

    tracing::info!(
        config_path = ?args.config,
        env_file = ?env_file,
        listen = %config.server.listen_address(),
        model = %config.provider.model,
        "starting imagerelay"
    );

    let server = Server::new(&config)?;

    // Set up graceful shutdown
    let shutdown = CancellationToken::new();
    let shutdown_clone = shutdown.clone();

    tokio::spawn(async move {
        shutdown_signal().await;
        shutdown_clone.cancel();
    });

    server.serve(shutdown).await?;

    tracing::info!("imagerelay stopped");
    Ok(())
}

/// Populate the process environment from a `.env` file
///
/// Looks for `.env` in the working directory and its parents unless `path`
/// is given. Variables already set are kept; a missing file is not an error.
fn load_env_file(path: Option<&Path>) -> Option<PathBuf> {
    match path {
        Some(path) => dotenvy::from_path(path).ok().map(|()| path.to_path_buf()),
        None => dotenvy::dotenv().ok(),
    }
}

/// Wait for a shutdown signal (`SIGINT` or `SIGTERM`)
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }

    tracing::info!("shutdown signal received");
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;

    use super::*;

    fn env_file(contents: &str) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(".env"), contents).unwrap();
        dir
    }

    #[test]
    fn env_file_feeds_configuration() {
        let dir = env_file("PORT=4321\n");

        temp_env::with_var_unset("PORT", || {
            let loaded = load_env_file(Some(&dir.path().join(".env")));
            assert_eq!(loaded, Some(dir.path().join(".env")));

            let config = Config::load_or_default(None).unwrap();
            assert_eq!(config.server.listen_address(), SocketAddr::from(([0, 0, 0, 0], 4321)));
        });
    }

    #[test]
    fn process_environment_wins_over_env_file() {
        let dir = env_file("PORT=4321\n");

        temp_env::with_var("PORT", Some("8000"), || {
            load_env_file(Some(&dir.path().join(".env")));

            let config = Config::load_or_default(None).unwrap();
            assert_eq!(config.server.listen_address().port(), 8000);
        });
    }

    #[test]
    fn missing_env_file_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_env_file(Some(&dir.path().join(".env"))).is_none());
    }
}
