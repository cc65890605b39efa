#[path = "tape/cli.rs"]
mod cli;
#[path = "tape/setup.rs"]
mod setup;

use crate::cli::Cli;
use log::{error, info, warn};
use tape_service::service::RunFlow;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Cli::parse_args();
    setup::init_logging(&args.log_level, args.log_dir.as_deref())?;
    args.apply_to_env();
    info!("tape starting log_level={}", args.log_level);

    let app_config = setup::load_app_config()?;
    setup::log_startup_banner(&app_config);

    let flow = RunFlow::new(app_config)?;
    let shutdown = flow.shutdown_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("ctrl-c received");
            shutdown.cancel();
        }
    });

    match flow.run().await {
        Ok(report) => {
            println!("{}", setup::render_report(&report, args.json)?);
            Ok(())
        }
        Err(err) => {
            error!("run failed code={:?} error={}", err.code(), err);
            Err(err.into())
        }
    }
}
