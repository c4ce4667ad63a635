use std::net::SocketAddr;
use std::sync::Arc;

use rotta_api::{app, AppState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rotta_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = rotta_api::app_config::Config::load().expect("Failed to load config");
    tracing::info!("Starting Rotta API on port {}", config.server.port);

    let client = rotta_client::FlightSearchClient::new(config.backend.clone())
        .expect("Failed to build flight-search client");

    let app_state = AppState {
        backend: Arc::new(client),
    };

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
