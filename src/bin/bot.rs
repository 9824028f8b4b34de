use bozor_api::{
    bot,
    config::AppConfig,
    db::{create_orm_conn, create_pool},
    notify::Notifier,
    state::AppState,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,bozor_api=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;
    let pool = create_pool(&config.database_url).await?;
    let orm = create_orm_conn(&config.database_url).await?;

    // The notifier here serves buyer notifications for transitions made
    // from the bot's inline keyboards, same as the API process.
    let state = AppState {
        pool,
        orm,
        notifier: Notifier::from_env(),
    };

    bot::run(state).await
}
