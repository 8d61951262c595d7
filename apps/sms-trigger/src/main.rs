use std::sync::Arc;
use dotenv::dotenv;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use notification_cell::{AcceptanceSmsTrigger, TwilioSmsGateway};
use shared_config::AppConfig;
use shared_database::store_from_config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Loading Env Vars
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting booking SMS trigger");

    let config = AppConfig::from_env();
    let gateway = TwilioSmsGateway::new(&config)?;
    let trigger = AcceptanceSmsTrigger::new(store_from_config(&config), Arc::new(gateway));

    tokio::select! {
        result = trigger.run() => result?,
        _ = tokio::signal::ctrl_c() => warn!("Interrupted, stopping SMS trigger"),
    }

    Ok(())
}
