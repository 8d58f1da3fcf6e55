use signaldesk::{app, config::Config, AppState};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "signaldesk=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env();
    info!("Starting SignalDesk server on {}:{}", config.host, config.port);
    let addr = format!("{}:{}", config.host, config.port);

    let state = AppState::from_config(config)?;
    state.start().await;

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("SignalDesk server listening on {}", addr);

    let shutdown_state = state.clone();
    axum::serve(listener, app(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received");
        })
        .await?;

    shutdown_state.stop();
    Ok(())
}
