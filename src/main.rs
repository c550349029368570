use darkroom::{
    config::{
        session::{validate_production_config, SessionConfig},
        AppConfig,
    },
    db, routes,
    services::create_email_service,
    AppState,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "darkroom=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env();
    if config.is_production() {
        validate_production_config();
    }

    let repositories = db::open_repositories(config.database_url.as_deref()).await?;

    let session_config = SessionConfig::from_env();
    let token_signer = session_config.create_signer();

    let app_state = AppState::new(
        repositories,
        create_email_service(),
        &config.public_dir,
        session_config,
        token_signer,
    );

    if let Err(e) = app_state.verification_service.cleanup_expired().await {
        tracing::warn!("Failed to clean up expired verification codes: {}", e);
    }

    let app = routes::app(app_state, &config.public_dir);

    let addr = config.socket_addr()?;
    tracing::info!(
        "Serving {} on http://{}",
        config.public_dir.display(),
        addr
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
