use std::path::Path;

use tokio::signal;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use reverse_vector::embedder::openai::OpenAiEmbedder;
use reverse_vector::llm_client::openai::OpenAiClient;
use reverse_vector::{RunConfig, SearchLoop};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── Config ────────────────────────────────────────────────────────────────
    let config = RunConfig::from_env()?;

    // ── Tracing ───────────────────────────────────────────────────────────────
    // Keep the guard alive so the file writer flushes on exit, including the
    // interrupt path.
    let _guard = init_tracing(&config.log_path)?;

    info!("reverse-vector starting");
    info!(
        chat_model = %config.chat_model,
        embedding_model = %config.embedding_model,
        log = %config.log_path.display(),
        "configuration loaded"
    );

    // ── Clients ───────────────────────────────────────────────────────────────
    let embedder = match &config.api_base {
        Some(base) => OpenAiEmbedder::with_api_base(
            config.api_key.clone(),
            config.embedding_model.clone(),
            base.clone(),
        ),
        None => OpenAiEmbedder::new(config.api_key.clone(), config.embedding_model.clone()),
    };

    let llm = match &config.api_base {
        Some(base) => OpenAiClient::with_api_base(
            config.api_key.clone(),
            config.chat_model.clone(),
            base.clone(),
        ),
        None => OpenAiClient::new(config.api_key.clone(), config.chat_model.clone()),
    };

    // ── Search ────────────────────────────────────────────────────────────────
    let search = SearchLoop::new(embedder, llm, config.search);

    tokio::select! {
        result = search.run() => {
            let report = result?;
            info!(
                reason = %report.reason,
                best = %report.best_text,
                error = f64::from(report.best_distance),
                guesses = report.guesses_made,
                cost = report.total_cost,
                "run complete"
            );
        }
        _ = shutdown_signal() => {
            info!("interrupted, shutting down");
        }
    }

    Ok(())
}

fn init_tracing(
    log_path: &Path,
) -> anyhow::Result<tracing_appender::non_blocking::WorkerGuard> {
    let directory = match log_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let file_name = log_path.file_name().ok_or_else(|| {
        anyhow::anyhow!("LOG_PATH has no file name: {}", log_path.display())
    })?;

    let file_appender = tracing_appender::rolling::never(directory, file_name);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(file_writer)
                .with_ansi(false),
        )
        .init();

    Ok(guard)
}

/// Resolves on SIGTERM or Ctrl-C.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => { info!("received Ctrl-C"); }
        _ = terminate => { info!("received SIGTERM"); }
    }
}
