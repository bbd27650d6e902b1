//! Process configuration (component G). Loaded once at startup from
//! environment variables, with `clap` providing CLI-flag overrides and
//! defaults in the same derive style as `wallet/src/config.rs` in the
//! codebase this crate grew out of.

use clap::Parser;

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_LOG_LEVEL: &str = "INFO";
pub const DEFAULT_GAS_MONITOR_PERIOD_MS: u64 = 5_000;
pub const DEFAULT_UPSTREAM_TIMEOUT_MS: u64 = 10_000;

/// Runtime configuration for the proxy.
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about = "JSON-RPC proxy that holds signed transactions until gas price makes broadcast worthwhile"
)]
pub struct Config {
    /// Upstream network identifier, e.g. `mainnet`, `sepolia`.
    #[clap(long, env = "NETWORK")]
    pub network: String,

    /// Authentication credential composed into the upstream URL.
    #[clap(long, env = "INFURA_PROJECT_ID")]
    pub infura_project_id: String,

    /// Local listen address.
    #[clap(long, env = "HOST", default_value = DEFAULT_HOST)]
    pub host: String,

    /// Local listen port.
    #[clap(long, env = "PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Log level: ERROR, WARN, INFO, DEBUG, or TRACE.
    #[clap(long, env = "LOG_LEVEL", default_value = DEFAULT_LOG_LEVEL)]
    pub log_level: String,

    /// How often the gas monitor polls upstream and sweeps the store.
    #[clap(long, env = "GAS_MONITOR_PERIOD_MS", default_value_t = DEFAULT_GAS_MONITOR_PERIOD_MS)]
    pub gas_monitor_period_ms: u64,

    /// Per-request timeout for upstream HTTP calls.
    #[clap(long, env = "UPSTREAM_TIMEOUT_MS", default_value_t = DEFAULT_UPSTREAM_TIMEOUT_MS)]
    pub upstream_timeout_ms: u64,
}

impl Config {
    /// `https://<network>.infura.io/v3/<infura_project_id>`.
    pub fn upstream_url(&self) -> String {
        format!(
            "https://{}.infura.io/v3/{}",
            self.network, self.infura_project_id
        )
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
