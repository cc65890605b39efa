use clap::Parser;
use std::path::PathBuf;
use tape_core::infrastructure::config::{CONFIG_PATH_ENV, ENV_PREFIX};

#[derive(Parser, Debug)]
#[command(name = "tape")]
#[command(
    about = "Transaction load generator and commit observer for permissioned ledgers",
    long_about = "Transaction load generator and commit observer for permissioned ledgers.\n\n\
                  This build drives the in-process loopback network only. Node addresses and TLS \
                  settings in the config file are validated but no remote ledger is contacted."
)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Number of transactions to send
    #[arg(short, long)]
    pub number: Option<usize>,

    /// Burst size of the rate limiter and capacity of every pipeline channel
    #[arg(short, long)]
    pub burst: Option<usize>,

    /// Transactions per second; 0 means unlimited
    #[arg(short, long)]
    pub rate: Option<f64>,

    /// Log filter (e.g. info, tape_core=debug, root=warn)
    #[arg(short, long, default_value = "info")]
    pub log_level: String,

    /// Directory for tape.log and tape_err.log
    #[arg(long)]
    pub log_dir: Option<String>,

    /// Print the final report as JSON
    #[arg(long)]
    pub json: bool,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Flags become environment overrides so they take precedence over the config file.
    pub fn apply_to_env(&self) {
        if let Some(config_path) = &self.config {
            std::env::set_var(CONFIG_PATH_ENV, config_path);
        }
        if let Some(number) = self.number {
            std::env::set_var(format!("{ENV_PREFIX}RUN__NUMBER"), number.to_string());
        }
        if let Some(burst) = self.burst {
            std::env::set_var(format!("{ENV_PREFIX}RUN__BURST"), burst.to_string());
        }
        if let Some(rate) = self.rate {
            std::env::set_var(format!("{ENV_PREFIX}RUN__RATE"), format!("{rate:?}"));
        }
    }
}
