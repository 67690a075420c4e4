use std::time::Duration;

/// Run-wide settings shared between the CLI and the pipeline stages.
#[derive(Debug, Clone)]
pub struct Config {
    /// Size of the probe worker pool.
    pub threads: usize,

    /// Maximum number of ranked rows to print. Negative means "all".
    pub limit: i64,

    /// Render a progress bar while probing.
    pub progress: bool,

    /// Extra status output and `debug` level logging.
    pub verbose: bool,

    /// Upper bound for a single probe.
    pub probe_timeout: Duration,

    /// Print the SOCKS5 column. Set when the secondary endpoint was requested.
    pub show_secondary: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            threads: 25,
            limit: 10,
            progress: true,
            verbose: false,
            probe_timeout: Duration::from_millis(2_000),
            show_secondary: false,
        }
    }
}
