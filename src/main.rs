use anyhow::Result;
use smartcab::config::SmartCabConfig;

#[tokio::main]
async fn main() -> Result<()> {
    let config = match SmartCabConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("⚠️  {:#}, using default settings", e);
            SmartCabConfig::default()
        }
    };

    smartcab::logging::init(&config)?;

    smartcab::run(config).await
}
