use std::process::ExitCode;

use anyhow::Result;
use tg_simple_bot::app::App;
use tg_simple_bot::config::Config;
use tg_simple_bot::telemetry;
use tracing::info;

#[tokio::main]
async fn main() -> Result<ExitCode> {
  telemetry::init("info")?;
  let config = Config::from_env()?;
  info!(render_mode = %config.render_mode, link_preview_disabled = config.disable_link_preview, "starting bot");

  let app = App::new(&config);
  Ok(app.run().await)
}
