use anyhow::Result;
use market_pulse::utils::logging::init_logging;
use market_pulse::Application;

#[tokio::main]
async fn main() -> Result<()> {
    init_logging()?;

    Application::init().await?.run().await
}
