use anyhow::Context;
use clap::Parser;
use doc2pdf_api::config::ServerArgs;
use doc2pdf_api::{app, AppState, SERVICE_NAME};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = ServerArgs::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| args.log_filter().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = args.settings();
    let addr = args.socket_addr().await?;

    info!("{SERVICE_NAME} v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Converter: {} (timeout {}s)",
        settings.converter_command,
        settings.conversion_timeout.as_secs()
    );
    info!(
        "Limits: {} bytes per document, {} tags per request",
        settings.max_file_size, settings.max_replacements
    );
    if let Some(dir) = &settings.work_dir {
        info!("Working directory: {}", dir.display());
    }

    let app = app(AppState::new(settings));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    info!("{SERVICE_NAME} listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}
