pub mod rank;

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use relayr_common::config::Config;
use relayr_core::directory::HttpDirectorySource;
use relayr_core::filter::FilterSpec;
use relayr_core::prober::ProbeMethod;

const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

#[derive(Parser, Debug)]
#[command(name = "relayr")]
#[command(version, about = "Ping every relay in the directory and rank them by latency.")]
pub struct CommandLine {
    /// Number of probes running at the same time
    #[arg(short, long, default_value_t = 25)]
    pub threads: usize,

    /// Number of results to show, -1 shows all of them
    #[arg(short, long, default_value_t = 10, allow_negative_numbers = true)]
    pub limit: i64,

    /// Hide the progress bar
    #[arg(long)]
    pub no_progress: bool,

    /// Print status messages and debug logs
    #[arg(short, long)]
    pub verbose: bool,

    /// Only relays in this country code (e.g. "se")
    #[arg(long, value_name = "CODE")]
    pub country_code: Option<String>,

    /// Only relays in this country (e.g. "Sweden")
    #[arg(long, value_name = "NAME")]
    pub country_name: Option<String>,

    /// Only relays whose active flag equals this value
    #[arg(long, value_name = "BOOL")]
    pub active: Option<bool>,

    /// Only relays whose owned flag equals this value
    #[arg(long, value_name = "BOOL")]
    pub owned: Option<bool>,

    /// Only relays with this port speed in Gbps
    #[arg(long, value_name = "GBPS")]
    pub network_port_speed: Option<u32>,

    /// Only relays offering a SOCKS5 proxy, and show it in the output
    #[arg(long)]
    pub socks: bool,

    /// Ignore the cached directory and fetch a fresh copy
    #[arg(long)]
    pub refresh: bool,

    /// Days a cached directory stays valid
    #[arg(long, value_name = "DAYS", default_value_t = 30)]
    pub cache_max_age: u64,

    /// Where to keep the cached directory
    #[arg(long, value_name = "PATH")]
    pub cache_file: Option<PathBuf>,

    /// Relay directory endpoint
    #[arg(
        long,
        value_name = "URL",
        env = "RELAYR_DIRECTORY_URL",
        default_value = HttpDirectorySource::DEFAULT_URL
    )]
    pub directory_url: String,

    /// Give up on a relay after this many milliseconds
    #[arg(long, value_name = "MS", default_value_t = 2_000)]
    pub timeout: u64,

    /// How to measure the round trip
    #[arg(long, value_enum, default_value_t = Method::Auto)]
    pub method: Method,

    /// Port used by the TCP method
    #[arg(long, value_name = "PORT", default_value_t = 443)]
    pub tcp_port: u16,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum Method {
    /// ICMP echo when privileged, TCP handshake otherwise
    Auto,
    /// ICMP echo (needs root)
    Icmp,
    /// TCP handshake
    Tcp,
}

impl From<Method> for ProbeMethod {
    fn from(method: Method) -> Self {
        match method {
            Method::Auto => ProbeMethod::Auto,
            Method::Icmp => ProbeMethod::Icmp,
            Method::Tcp => ProbeMethod::Tcp,
        }
    }
}

impl CommandLine {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    pub fn config(&self) -> Config {
        Config {
            threads: self.threads,
            limit: self.limit,
            progress: !self.no_progress,
            verbose: self.verbose,
            probe_timeout: Duration::from_millis(self.timeout),
            show_secondary: self.socks,
        }
    }

    pub fn filter_spec(&self) -> FilterSpec {
        FilterSpec {
            country_code: self.country_code.clone(),
            country_name: self.country_name.clone(),
            active: self.active,
            owned: self.owned,
            port_speed: self.network_port_speed,
            require_secondary_endpoint: self.socks,
        }
    }

    pub fn freshness(&self) -> Duration {
        Duration::from_secs(self.cache_max_age.saturating_mul(SECONDS_PER_DAY))
    }
}
