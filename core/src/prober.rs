//! # Prober
//!
//! Measures one round trip per endpoint on a fixed-size worker pool.
//!
//! Workers drain a shared queue; every record is popped by exactly one worker and
//! yields exactly one [`ProbeResult`]. A probe that errors, panics, gives up, or
//! overruns the per-probe timeout is recorded as [`Latency::Unreachable`] instead of
//! failing the run. Results arrive in completion order.
//!
//! Cancellation is cooperative: workers look at the [`CancellationToken`] before
//! taking the next record and race each probe against it. The collector returns
//! as soon as the token fires and drops the pool, so in-flight probes are
//! abandoned rather than awaited.

use std::collections::VecDeque;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use relayr_common::network::{EndpointRecord, Latency, ProbeResult};
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tokio_util::task::AbortOnDropHandle;
use tracing::{debug, trace, warn};

mod icmp;
mod tcp;

pub use icmp::IcmpProbe;
pub use tcp::TcpProbe;

pub const DEFAULT_CONCURRENCY: usize = 25;
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_millis(2_000);

/// A single best-effort round-trip measurement.
#[async_trait]
pub trait Probe: Send + Sync {
    /// `Ok(None)` means the endpoint gave no answer.
    async fn probe(&self, addr: IpAddr) -> anyhow::Result<Option<Duration>>;
}

/// How to measure a round trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProbeMethod {
    /// ICMP when the process may open raw sockets, TCP otherwise.
    #[default]
    Auto,
    Icmp,
    Tcp,
}

/// Builds the probe backend for `method`. `wait` bounds how long an ICMP probe
/// keeps its socket open; `tcp_port` is the handshake target.
pub fn select_probe(method: ProbeMethod, tcp_port: u16, wait: Duration) -> Arc<dyn Probe> {
    match method {
        ProbeMethod::Icmp => Arc::new(IcmpProbe::new(wait)),
        ProbeMethod::Tcp => Arc::new(TcpProbe::new(tcp_port)),
        ProbeMethod::Auto if is_root::is_root() => {
            debug!("Running privileged, probing with ICMP echo");
            Arc::new(IcmpProbe::new(wait))
        }
        ProbeMethod::Auto => {
            debug!("Running unprivileged, probing with TCP handshakes on port {tcp_port}");
            Arc::new(TcpProbe::new(tcp_port))
        }
    }
}

/// Called with the number of probes completed so far.
pub type ProgressCallback = Box<dyn Fn(usize) + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeRun {
    /// Every input record was measured.
    Completed(Vec<ProbeResult>),
    /// The token fired first; holds whatever had been collected by then.
    Cancelled(Vec<ProbeResult>),
}

impl ProbeRun {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ProbeRun::Cancelled(_))
    }

    pub fn results(&self) -> &[ProbeResult] {
        match self {
            ProbeRun::Completed(results) | ProbeRun::Cancelled(results) => results,
        }
    }

    pub fn into_results(self) -> Vec<ProbeResult> {
        match self {
            ProbeRun::Completed(results) | ProbeRun::Cancelled(results) => results,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Prober {
    concurrency: usize,
    probe_timeout: Duration,
}

impl Default for Prober {
    fn default() -> Self {
        Self::new(DEFAULT_CONCURRENCY, DEFAULT_PROBE_TIMEOUT)
    }
}

impl Prober {
    /// A pool size of zero is bumped to one.
    pub fn new(concurrency: usize, probe_timeout: Duration) -> Self {
        Self {
            concurrency: concurrency.max(1),
            probe_timeout,
        }
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    pub async fn probe_all(
        &self,
        records: Vec<EndpointRecord>,
        probe: Arc<dyn Probe>,
        cancel: &CancellationToken,
        on_probe_done: Option<ProgressCallback>,
    ) -> ProbeRun {
        let total: usize = records.len();
        let pool_size: usize = self.concurrency.min(total);
        let queue: Arc<Mutex<VecDeque<EndpointRecord>>> = Arc::new(Mutex::new(records.into()));
        let (tx, mut rx) = mpsc::unbounded_channel::<ProbeResult>();

        debug!("Probing {total} endpoints with {pool_size} workers");

        let mut workers: JoinSet<()> = JoinSet::new();
        for _ in 0..pool_size {
            workers.spawn(worker(
                queue.clone(),
                probe.clone(),
                tx.clone(),
                cancel.clone(),
                self.probe_timeout,
            ));
        }
        drop(tx);

        let mut results: Vec<ProbeResult> = Vec::with_capacity(total);
        loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    debug!("Probing cancelled after {}/{total} results", results.len());
                    workers.abort_all();
                    return ProbeRun::Cancelled(results);
                }

                received = rx.recv() => match received {
                    Some(result) => {
                        results.push(result);
                        if let Some(callback) = &on_probe_done {
                            callback(results.len());
                        }
                    }
                    None => break,
                }
            }
        }

        // Every sender is gone, so every worker has returned.
        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                warn!("Probe worker stopped unexpectedly: {e}");
            }
        }

        ProbeRun::Completed(results)
    }
}

async fn worker(
    queue: Arc<Mutex<VecDeque<EndpointRecord>>>,
    probe: Arc<dyn Probe>,
    tx: mpsc::UnboundedSender<ProbeResult>,
    cancel: CancellationToken,
    probe_timeout: Duration,
) {
    loop {
        if cancel.is_cancelled() {
            break;
        }

        let next: Option<EndpointRecord> = queue.lock().await.pop_front();
        let Some(record) = next else {
            break;
        };

        // Separate task: a panicking backend surfaces as a JoinError here.
        let attempt = AbortOnDropHandle::new(tokio::spawn(measure(
            probe.clone(),
            record.address,
            probe_timeout,
        )));

        let latency: Latency = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            joined = attempt => joined.unwrap_or_else(|e| {
                debug!("Probe to {} did not finish: {e}", record.address);
                Latency::Unreachable
            }),
        };

        if tx.send(ProbeResult::new(&record, latency)).is_err() {
            break;
        }
    }
}

async fn measure(probe: Arc<dyn Probe>, addr: IpAddr, probe_timeout: Duration) -> Latency {
    match tokio::time::timeout(probe_timeout, probe.probe(addr)).await {
        Ok(Ok(Some(rtt))) => {
            trace!("{addr} answered in {rtt:?}");
            Latency::Reached(rtt)
        }
        Ok(Ok(None)) => {
            trace!("{addr} did not answer");
            Latency::Unreachable
        }
        Ok(Err(e)) => {
            debug!("Probe to {addr} failed: {e:#}");
            Latency::Unreachable
        }
        Err(_elapsed) => {
            trace!("Probe to {addr} timed out after {probe_timeout:?}");
            Latency::Unreachable
        }
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
