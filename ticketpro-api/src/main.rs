use anyhow::Context;
use std::net::SocketAddr;
use std::time::Duration;
use ticketpro_api::{
    app,
    state::{AppState, AuthConfig, Stores},
};
use ticketpro_store::{app_config::Config, DbClient};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ticketpro_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    tracing::info!("Starting TicketPro back office on port {}", config.server.port);

    let auth = AuthConfig {
        secret: config.auth.jwt_secret.clone(),
        expiration: config.auth.jwt_expiration_seconds,
    };

    let state = match &config.database.url {
        Some(url) => {
            let db = DbClient::new(url).await.context("Failed to connect to Postgres")?;
            db.migrate().await.context("Failed to run migrations")?;
            let rules = db
                .fetch_business_rules(config.business_rules.clone())
                .await
                .context("Failed to load business rules")?;
            AppState::new(Stores::postgres(&db), auth, rules, &config.backup)
        }
        None => {
            tracing::warn!("No database configured, data lives in memory only");
            AppState::in_memory(auth, config.business_rules.clone(), &config.backup)
        }
    };

    state
        .seed_admin(&config.auth.bootstrap_admin_name, &config.auth.bootstrap_admin_email)
        .await?;

    let _listener = state.spawn_notification_listener();
    let _scheduler = state
        .backups
        .spawn_scheduler(Duration::from_secs(config.backup.check_interval_seconds));

    let app = app(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
