//! # Ranker / Reporter
//!
//! Orders measurements best-first and renders them as a fixed-width table.

use relayr_common::network::ProbeResult;

const HOSTNAME_WIDTH: usize = 20;
const ADDRESS_WIDTH: usize = 15;
const SECONDARY_WIDTH: usize = 28;

/// Sorts by latency (unreachable last) and keeps the `limit` best.
///
/// The sort is stable, so equal latencies keep the prober's order. A negative or
/// absent `limit` keeps everything.
pub fn rank(mut results: Vec<ProbeResult>, limit: Option<i64>) -> Vec<ProbeResult> {
    results.sort_by_key(|result| result.latency);

    if let Some(limit) = limit.and_then(|l| usize::try_from(l).ok()) {
        results.truncate(limit);
    }
    results
}

/// Renders a header row followed by one row per result.
///
/// `show_secondary` adds a SOCKS5 `name:port` column (`-` when a row has none).
pub fn render(results: &[ProbeResult], show_secondary: bool) -> String {
    let mut out = String::new();

    push_row(&mut out, "Hostname", "IP", show_secondary.then_some("SOCKS5"), "Delay");
    for result in results {
        let secondary: Option<String> = show_secondary.then(|| {
            result
                .secondary
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_else(|| "-".to_string())
        });
        push_row(
            &mut out,
            &result.hostname,
            &result.address.to_string(),
            secondary.as_deref(),
            &result.latency.to_string(),
        );
    }
    out
}

fn push_row(out: &mut String, hostname: &str, address: &str, secondary: Option<&str>, delay: &str) {
    out.push_str(&format!("{hostname:<HOSTNAME_WIDTH$} {address:<ADDRESS_WIDTH$} "));
    if let Some(secondary) = secondary {
        out.push_str(&format!("{secondary:<SECONDARY_WIDTH$} "));
    }
    out.push_str(delay);
    out.push('\n');
}
