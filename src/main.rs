use userdesk::{config::AppConfig, contacts::ContactQuery, PgStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "userdesk=debug,sqlx=warn".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let config = AppConfig::from_env()?;
    let store = PgStore::connect(&config).await?;

    // Collections and indexes must exist before any caller writes.
    store.register_schemas().await?;

    let unread = store.contacts().count(ContactQuery::new().unread()).await?;

    tracing::info!(
        max_connections = config.max_connections,
        password_hash_cost = config.password_hash_cost,
        unread,
        "userdesk schemas ready"
    );
    Ok(())
}
