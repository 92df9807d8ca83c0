use vigil_server::{AppState, Config, build_router, telemetry};
use vigil_storage::Database;
use vigil_storage::db::DatabaseLocation;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let config = Config::from_env()?;
    telemetry::init(&config);

    let location = DatabaseLocation::parse(&config.database_url)?;
    let db = Database::open(&location)?;

    let addr = config.bind_addr();
    tracing::info!(
        environment = %config.environment,
        addr = %addr,
        database = ?location,
        "starting vigil-server"
    );

    let app = build_router(AppState::new(config, db));
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("vigil-server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
