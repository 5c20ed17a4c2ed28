use anyhow::Context;
use portfolio_tracker::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    portfolio_tracker::init_tracing();

    let config = AppConfig::from_env().context("failed to load configuration")?;
    portfolio_tracker::run(config)
        .await
        .context("portfolio tracker stopped with an error")?;

    Ok(())
}
