mod config;
mod error;
mod handlers;
mod redact;
mod soundcloud;
mod store;

use std::net::SocketAddr;
use std::sync::Arc;

use reqwest::Client;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::handlers::router;
use crate::soundcloud::{SoundCloudClient, TokenManager};
use crate::store::UpstashStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    config.log_environment();

    let http = Client::new();
    let store = UpstashStore::new(
        http.clone(),
        config.kv_rest_api_url,
        config.kv_rest_api_token,
    );
    let tokens = TokenManager::new(
        http.clone(),
        Arc::new(store),
        config.soundcloud_client_id,
        config.soundcloud_client_secret,
        config.soundcloud_token_url,
    );
    let soundcloud = SoundCloudClient::new(http, config.soundcloud_api_base, Arc::new(tokens))?;

    let app = router()
        .layer(TraceLayer::new_for_http())
        .with_state(soundcloud);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("listening on {}", addr);

    axum::serve(
        tokio::net::TcpListener::bind(addr).await?,
        app.into_make_service(),
    )
    .await?;

    Ok(())
}
