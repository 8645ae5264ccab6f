use std::sync::Arc;

use intake_core::config::Config;
use tracing::error;

#[tokio::main]
async fn main() -> Result<(), intake_core::Error> {
    intake_core::logging::init("intake")?;

    let cfg = Arc::new(Config::load()?);

    if let Err(e) = intake_telegram::router::run_polling(cfg).await {
        error!("Bot crashed with error: {e:#}");
        std::process::exit(1);
    }

    Ok(())
}
