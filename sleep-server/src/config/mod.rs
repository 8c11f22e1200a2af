//! Daemon configuration loading.
//!
//! All settings live in one [`ServerConfig`] that is built once at startup
//! and handed to the components that need it.  Values come from, in
//! increasing priority: built-in defaults, an optional YAML file, and
//! command-line [`Overrides`].
//!
//! The expected YAML structure is (every key optional):
//! ```yaml
//! server:
//!   bind_address: "0.0.0.0"
//!   port: 4444
//! timer:
//!   tick_interval_ms: 1000
//!   fade_threshold_secs: 600
//! system:
//!   backend: auto        # auto | macos | linux | dry-run
//! daemon:
//!   pid_file: /tmp/sleepServerDaemon.pid
//! verbose: false
//! ```

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use tracing::info;

use crate::engine::fade::DEFAULT_FADE_THRESHOLD_SECS;
use crate::system::Backend;

/// Default HTTP port.
pub const DEFAULT_PORT: u16 = 4444;

/// Pid file used in daemon mode when none is configured.
pub const DEFAULT_PID_FILE: &str = "/tmp/sleepServerDaemon.pid";

// ── Sections ──────────────────────────────────────────────────────────────────

/// Where the HTTP gateway listens.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ListenConfig {
    pub bind_address: IpAddr,
    pub port: u16,
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            bind_address: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
        }
    }
}

impl ListenConfig {
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_address, self.port)
    }
}

/// Tick period and good-night fade threshold.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TimerConfig {
    pub tick_interval_ms: u64,
    pub fade_threshold_secs: u32,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 1_000,
            fade_threshold_secs: DEFAULT_FADE_THRESHOLD_SECS,
        }
    }
}

impl TimerConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

/// OS backend selection.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SystemConfig {
    pub backend: Backend,
}

/// Daemon-mode settings.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DaemonConfig {
    /// Written on start-up when set; removed on shutdown.
    pub pid_file: Option<PathBuf>,
}

// ── ServerConfig ──────────────────────────────────────────────────────────────

/// Complete daemon configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub server: ListenConfig,
    pub timer: TimerConfig,
    pub system: SystemConfig,
    pub daemon: DaemonConfig,
    pub verbose: bool,
}

/// Command-line values that take precedence over the file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub port: Option<u16>,
    pub bind_address: Option<IpAddr>,
    pub backend: Option<Backend>,
    pub pid_file: Option<PathBuf>,
    pub verbose: bool,
    pub daemon: bool,
}

impl ServerConfig {
    /// Parse `path` as YAML.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, is not valid YAML, or
    /// contains unknown keys.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        info!("Loading configuration from: {}", path.display());

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot open configuration file: {}", path.display()))?;

        // An empty file is a valid "all defaults" configuration.
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse YAML file: {}", path.display()))
    }

    /// Apply command-line overrides on top of the loaded values.
    ///
    /// `daemon` turns on the pid file, defaulting to [`DEFAULT_PID_FILE`].
    pub fn apply(&mut self, overrides: Overrides) {
        if let Some(port) = overrides.port {
            self.server.port = port;
        }
        if let Some(addr) = overrides.bind_address {
            self.server.bind_address = addr;
        }
        if let Some(backend) = overrides.backend {
            self.system.backend = backend;
        }
        if overrides.pid_file.is_some() {
            self.daemon.pid_file = overrides.pid_file;
        } else if overrides.daemon && self.daemon.pid_file.is_none() {
            self.daemon.pid_file = Some(PathBuf::from(DEFAULT_PID_FILE));
        }
        self.verbose |= overrides.verbose;
    }

    /// Reject values the daemon cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            bail!("server.port must be non-zero");
        }
        if self.timer.tick_interval_ms == 0 {
            bail!("timer.tick_interval_ms must be non-zero");
        }
        if self.timer.fade_threshold_secs == 0 {
            bail!("timer.fade_threshold_secs must be non-zero");
        }
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
