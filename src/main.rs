use barbershop_booking::{
    config::{get_config, init_config},
    database::pool::{create_pool, run_migrations},
    middleware::cors::api_cors,
    routes, AppState,
};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn,tower_http=info")),
        )
        .init();

    init_config()?;
    let config = get_config();

    let pool = create_pool(config).await?;
    run_migrations(&pool).await?;
    info!("database ready");

    if config.google.is_some() {
        info!(timezone = %config.calendar_timezone, "Google Calendar sync enabled");
    } else {
        info!("Google Calendar sync disabled (GOOGLE_CLIENT_ID/SECRET/REDIRECT_URI not set)");
    }

    let app_state = AppState::new(pool, config);
    let app = routes::router(app_state)
        .layer(api_cors())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = config.server_address.parse()?;
    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
