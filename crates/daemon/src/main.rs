// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fleet storage control-plane daemon (fsod)
//!
//! Owns the journals and runs the init and replication processors until
//! SIGINT or SIGTERM.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

use std::path::PathBuf;

use clap::Parser;
use fso_daemon::{lifecycle, setup_logging, Config};
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "fsod", version, about = "Fleet storage control-plane daemon")]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long, env = "FSOD_CONFIG")]
    config: Option<PathBuf>,

    /// Override the data directory
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Override the name of the fleet root
    #[arg(long)]
    main_name: Option<String>,

    /// Print the effective configuration and exit
    #[arg(long)]
    check: bool,
}

impl Args {
    fn into_config(self) -> Result<(Config, bool), fso_daemon::ConfigError> {
        let mut config = Config::load(self.config.as_deref())?;
        if let Some(data_dir) = self.data_dir {
            config.data_dir = data_dir;
        }
        if let Some(main_name) = self.main_name {
            config.main_name = main_name;
        }
        Ok((config, self.check))
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (config, check) = Args::parse().into_config()?;

    if check {
        print!("{}", config.to_toml()?);
        return Ok(());
    }

    let log_guard = setup_logging(&config)?;
    info!(pid = std::process::id(), "starting fsod");

    let daemon = match lifecycle::startup(&config).await {
        Ok(d) => d,
        Err(e) => {
            error!("failed to start daemon: {}", e);
            drop(log_guard);
            return Err(e.into());
        }
    };

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;
    info!("daemon ready");

    tokio::select! {
        _ = sigterm.recv() => info!("received SIGTERM, shutting down"),
        _ = sigint.recv() => info!("received SIGINT, shutting down"),
    }
    daemon.shutdown().await;

    info!("daemon stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_overrides_config() {
        let args = Args::parse_from([
            "fsod",
            "--data-dir",
            "/srv/fso",
            "--main-name",
            "fleet",
            "--check",
        ]);
        let (config, check) = args.into_config().unwrap();
        assert!(check);
        assert_eq!(config.data_dir, PathBuf::from("/srv/fso"));
        assert_eq!(config.main_name, "fleet");
    }

    #[test]
    fn args_are_consistent() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }
}
