use color_eyre::eyre::WrapErr;
use dbtui::{App, AppConfig, logging};
use tracing::info;

#[tokio::main]
async fn main() {
    // Run our real async entrypoint
    let result = async_main().await;

    // Restore the terminal state
    ratatui::restore();

    if let Err(err) = result {
        eprintln!("Application error: {:?}", err);
        std::process::exit(1);
    }
}

// Load or create the dbtui config
async fn async_main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let _log_guard = logging::init(&logging::log_dir()).wrap_err("Failed to set up logging")?;

    let config_path = AppConfig::config_path();
    let loaded = AppConfig::load().wrap_err("Fix or remove the config file and start again")?;
    let config = match loaded {
        Some(cfg) => cfg,
        None => {
            // First start: write the defaults so there is a file to edit
            let cfg = AppConfig::default();
            cfg.save()
                .wrap_err_with(|| format!("Failed to write {}", config_path.display()))?;
            info!(path = %config_path.display(), "created default config");
            cfg
        }
    };

    let mut app = App::new(config, config_path).wrap_err("Failed to set up the HTTP client")?;

    // Launching the main app
    let mut terminal = ratatui::init();
    app.run(&mut terminal).await?;
    ratatui::restore();

    info!("control panel closed");
    Ok(())
}
