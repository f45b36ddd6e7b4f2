use anyhow::Context;
use house_price_rs::serving::{load_context, router, DefaultTable, GcsObjectStore, ServerConfig};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = ServerConfig::from_env()?;
    tracing::info!(
        model_path = %config.model_path.display(),
        remote = ?config.remote,
        origins = ?config.allowed_origins,
        "starting prediction service"
    );

    // The blocking HTTP client must stay off the async workers.
    let context = {
        let config = config.clone();
        tokio::task::spawn_blocking(move || {
            let store = GcsObjectStore::new(&config.gcs_endpoint).with_token(config.gcs_token);
            load_context(
                &config.model_path,
                config.remote.as_ref(),
                &store,
                DefaultTable::ames(),
            )
        })
        .await
        .context("model loading task panicked")?
    };
    if let Some(reason) = context.degraded_reason() {
        tracing::warn!(%reason, "serving without a model, /predict will return 503");
    }

    let app = router(Arc::new(context), &config.allowed_origins);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("binding {}", config.bind_addr))?;
    tracing::info!(addr = %config.bind_addr, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
}
