/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

use std::net::IpAddr;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};

use sleep_server::config::{Overrides, ServerConfig};
use sleep_server::control::ControlLoop;
use sleep_server::gateway;
use sleep_server::pidfile::PidFile;
use sleep_server::system::{Backend, ShellSystemControl, SystemControl};

// ── CLI argument definition ───────────────────────────────────────────────────

/// Backend for receiving time-to-sleep signals.
///
/// Example:
///   sleep-server -p 4444 -v
///   curl http://localhost:4444/sleepApi/setGoodNightTime/1800
#[derive(Debug, Parser)]
#[command(name = "sleep-server", version, long_about = None)]
struct Cli {
    /// Networking port number.
    #[arg(short = 'p', long = "port")]
    port: Option<u16>,

    /// Address to bind the HTTP server to.
    #[arg(short = 'b', long = "bind")]
    bind: Option<IpAddr>,

    /// Path to the YAML configuration file.
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// Enable verbose (debug) logging.
    #[arg(short = 'v', long = "verbose", default_value_t = false)]
    verbose: bool,

    /// Daemon mode: write a pid file (default /tmp/sleepServerDaemon.pid).
    #[arg(short = 'd', long = "daemon", default_value_t = false)]
    daemon: bool,

    /// Pid file location; implies writing one.
    #[arg(long = "pid-file")]
    pid_file: Option<PathBuf>,

    /// Which OS commands perform sleep and volume changes.
    #[arg(long = "backend", value_enum)]
    backend: Option<Backend>,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            port: self.port,
            bind_address: self.bind,
            backend: self.backend,
            pid_file: self.pid_file.clone(),
            verbose: self.verbose,
            daemon: self.daemon,
        }
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("sleep-server: {e:#}");
            process::exit(1);
        }
    };

    // Level is controlled by the RUST_LOG env-var, falling back to the
    // verbose flag.
    let default_level = if config.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .init();

    if let Err(e) = run(config).await {
        error!("sleep server failed: {e:#}");
        process::exit(1);
    }
}

fn load_config(cli: &Cli) -> Result<ServerConfig> {
    let mut config = match &cli.config {
        Some(path) => ServerConfig::load_from_file(path)?,
        None => ServerConfig::default(),
    };
    config.apply(cli.overrides());
    config.validate()?;
    Ok(config)
}

async fn run(config: ServerConfig) -> Result<()> {
    info!(
        addr = %config.server.socket_addr(),
        backend = %config.system.backend,
        tick_interval_ms = config.timer.tick_interval_ms,
        fade_threshold_secs = config.timer.fade_threshold_secs,
        pid_file = ?config.daemon.pid_file,
        "Configuration"
    );

    let _pid_file = config
        .daemon
        .pid_file
        .as_deref()
        .map(PidFile::create)
        .transpose()?;

    let system: Arc<dyn SystemControl> = Arc::new(ShellSystemControl::new(&config.system));
    // reads the current volume through the backend's shell command
    let timer = config.timer.clone();
    let control_loop = tokio::task::spawn_blocking(move || ControlLoop::new(&timer, system))
        .await
        .context("reading the initial volume failed")?;
    let (control, control_task) = control_loop.spawn(config.timer.tick_interval());

    let addr = config.server.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Cannot bind HTTP server to {addr}"))?;
    info!(%addr, "sleep server listening");

    gateway::serve(listener, control, shutdown_signal())
        .await
        .context("HTTP server failed")?;

    // The router owned the last handle; the loop ends on its own.
    control_task.await.context("control loop panicked")?;
    info!("sleep server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("cannot listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("cannot listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_flags_become_overrides() {
        let cli = Cli::parse_from([
            "sleep-server",
            "-p",
            "5000",
            "-v",
            "-d",
            "--backend",
            "dry-run",
        ]);
        let config = load_config(&cli).unwrap();
        assert_eq!(config.server.port, 5000);
        assert!(config.verbose);
        assert_eq!(config.system.backend, Backend::DryRun);
        assert!(config.daemon.pid_file.is_some());
    }

    #[test]
    fn port_zero_is_rejected() {
        let cli = Cli::parse_from(["sleep-server", "--port", "0"]);
        assert!(load_config(&cli).is_err());
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
