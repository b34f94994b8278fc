use civic_score::{catalog::seed_actions, ensure_parent_dir, load_data, persist_data, router, AppState, Config};
use std::net::SocketAddr;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let config = Config::from_env();
    ensure_parent_dir(&config.data_path).await?;

    let mut data = load_data(&config.data_path).await?;
    if seed_actions(&mut data) > 0 {
        persist_data(&config.data_path, &data).await?;
    }
    info!(
        path = %config.data_path.display(),
        users = data.users.len(),
        challenges = data.challenges.len(),
        admin_code = config.admin_code.is_some(),
        "state loaded"
    );

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let app = router(AppState::new(config, data));

    info!("listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutting down");
    }
}
