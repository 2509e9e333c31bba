#![cfg(not(tarpaulin_include))]

use situation_report::app;
use situation_report::config::ReportConfig;

/// Main entry point for the web application
///
/// Reads the configuration named by `REPORT_CONFIG` (or the defaults) and
/// serves the upload form and report API on the configured address.
///
/// # Returns
/// * `Result<(), Box<dyn std::error::Error>>` - Success or error object
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = ReportConfig::load()?;
    app::run(config).await
}
