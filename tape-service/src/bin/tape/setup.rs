use log::{info, warn};
use tape_core::application::RunReport;
use tape_core::infrastructure::config::{self, AppConfig};
use tape_core::infrastructure::logging::init_logger;
use tape_core::Result;

pub fn init_logging(level: &str, log_dir: Option<&str>) -> Result<()> {
    init_logger(log_dir, level)
}

/// Loads the layered config and refuses to start on any validation problem.
pub fn load_app_config() -> Result<AppConfig> {
    config::load_app_config(None).map_err(|err| {
        warn!("config rejected: {}", err);
        err
    })
}

pub fn log_startup_banner(app_config: &AppConfig) {
    info!(
        "tape config channel={} chaincode={} endorsers={} committers={} orderers={} threshold={} policy={}",
        app_config.network.channel,
        app_config.network.chaincode,
        app_config.network.endorsers.len(),
        app_config.network.committers.len(),
        app_config.network.orderers.len(),
        app_config.run.commit_threshold,
        app_config.run.observer_error_policy
    );
    info!(
        "transport=loopback block_size={} batch_timeout_ms={}; configured node addresses are not dialed",
        app_config.loopback.block_size, app_config.loopback.batch_timeout_ms
    );
}

pub fn render_report(report: &RunReport, json: bool) -> Result<String> {
    if json {
        return Ok(serde_json::to_string(&report.to_json())?);
    }
    Ok(report.to_string())
}
