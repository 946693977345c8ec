pub mod app;
pub mod apps;
pub mod automation;
pub mod compare;
pub mod config;
pub mod logging;
pub mod providers;
pub mod session;
pub mod ui;

use anyhow::Result;

use config::SmartCabConfig;

pub async fn run(config: SmartCabConfig) -> Result<()> {
    let mut app = app::Application::new(config)?;
    app.run().await
}
