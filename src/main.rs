use finwise_server::chat::ChatClient;
use finwise_server::config::Config;
use finwise_server::rest;
use finwise_server::state::AppState;
use finwise_server::store::UserStore;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "finwise_server=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Fails fast when DATABASE_URL or JWT_SECRET is absent
    let config = Config::from_env()?;

    let store = UserStore::connect(&config.database_url).await?;
    let chat = ChatClient::new(config.chat.clone())?;

    let listen_addr = config.listen_addr.clone();
    let state = AppState::new(config, store, chat);

    let app = rest::router(state);
    let listener = tokio::net::TcpListener::bind(&listen_addr).await?;
    tracing::info!("API listening on {}", listen_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
