use anyhow::Result;
use dreamtrip_api::{build_app, ApiSettings};
use dreamtrip_integrations::IntegrationConfig;
use dreamtrip_observability::init_tracing;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("dreamtrip_api");

    let settings = ApiSettings::from_env();
    let bind = settings.bind.clone();
    let app = build_app(settings, IntegrationConfig::from_env()).await?;

    let listener = tokio::net::TcpListener::bind(&bind).await?;
    tracing::info!(bind = %bind, "dreamtrip api started");

    axum::serve(listener, app).await?;
    Ok(())
}
