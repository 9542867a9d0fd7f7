use axum::http::{Method, header};
use sqlx::mysql::MySqlPoolOptions;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use trip_server::config::{Config, StoreBackend};
use trip_server::notify::email::LogEmailSender;
use trip_server::notify::push::PushClient;
use trip_server::repositories::DocumentStore;
use trip_server::{AppState, create_router};

fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,trip_server=debug".into());

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // .env prima del subscriber, così RUST_LOG può stare nel file
    dotenv::dotenv().ok();
    init_logging();

    let config = Config::from_env().map_err(|e| {
        error!("Invalid configuration: {}", e);
        e
    })?;
    config.print_info();

    // 1. Document store: MySQL con pool di connessioni oppure in memoria
    let store = match config.store_backend {
        StoreBackend::MySql => {
            let pool = MySqlPoolOptions::new()
                .max_connections(config.max_connections)
                .max_lifetime(Duration::from_secs(config.connection_lifetime_secs))
                .connect(&config.database_url)
                .await?;
            DocumentStore::mysql(pool)
        }
        StoreBackend::Memory => DocumentStore::in_memory(),
    };
    store.migrate().await?;

    // 2. Stato condiviso e router
    let push = PushClient::new(config.expo_push_url.clone(), config.push_timeout);
    let state = Arc::new(
        AppState::new(store, config.jwt_secret.clone(), push)
            .with_email(Arc::new(LogEmailSender), config.client_url.clone()),
    );

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .expose_headers([header::AUTHORIZATION])
        .max_age(Duration::from_secs(60 * 60));

    let app = create_router(state).layer(cors);

    // 3. Avvio del server
    let addr = format!("{}:{}", config.server_host, config.server_port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}
