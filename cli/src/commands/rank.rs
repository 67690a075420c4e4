use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use relayr_common::config::Config;
use relayr_common::network::{DirectorySnapshot, EndpointRecord, ProbeResult};
use relayr_core::directory::{DirectoryService, FileCache, HttpDirectorySource};
use relayr_core::filter::{self, FilterSpec, Selection};
use relayr_core::prober::{self, Probe, ProbeRun, Prober, ProgressCallback};
use relayr_core::ranker;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, Span, debug, info, info_span, warn};

use crate::commands::CommandLine;
use crate::terminal::{print, progress};

pub const NO_MATCHES_MSG: &str = "No endpoints matched the given filters.";
pub const EMPTY_DIRECTORY_MSG: &str = "The relay directory is empty.";
pub const INTERRUPTED_MSG: &str = "Interrupted by user. Canceling probes...";
pub const CANCELLED_MSG: &str = "Probe cancellation completed. Exiting...";

/// How a ranking run ended.
#[derive(Debug)]
pub enum Outcome {
    NoMatches,
    EmptyDirectory,
    /// Partial measurements are dropped; nothing gets ranked.
    Cancelled,
    Ranked {
        results: Vec<ProbeResult>,
        reachable: usize,
        probed: usize,
        elapsed: Duration,
    },
}

impl Outcome {
    /// The line printed instead of a table, if any.
    pub fn message(&self) -> Option<&'static str> {
        match self {
            Outcome::NoMatches => Some(NO_MATCHES_MSG),
            Outcome::EmptyDirectory => Some(EMPTY_DIRECTORY_MSG),
            Outcome::Cancelled => Some(CANCELLED_MSG),
            Outcome::Ranked { .. } => None,
        }
    }
}

/// Load, filter, probe, rank.
pub struct Pipeline {
    directory: DirectoryService,
    probe: Arc<dyn Probe>,
    prober: Prober,
    filter: FilterSpec,
    refresh: bool,
    limit: i64,
    verbose: bool,
    progress: bool,
}

impl Pipeline {
    pub fn new(directory: DirectoryService, probe: Arc<dyn Probe>, cfg: &Config) -> Self {
        Self {
            directory,
            probe,
            prober: Prober::new(cfg.threads, cfg.probe_timeout),
            filter: FilterSpec::default(),
            refresh: false,
            limit: cfg.limit,
            verbose: cfg.verbose,
            progress: cfg.progress,
        }
    }

    /// Wires the real directory endpoint, file cache and probe backend.
    pub fn from_command(cmd: &CommandLine, cfg: &Config) -> anyhow::Result<Self> {
        let source = HttpDirectorySource::new(&cmd.directory_url, HttpDirectorySource::DEFAULT_TIMEOUT)?;
        let cache = FileCache::new(cmd.cache_file.clone().unwrap_or_else(FileCache::default_path));
        debug!(
            "Directory {} cached at {}",
            source.url(),
            cache.path().display()
        );

        let directory = DirectoryService::new(Box::new(source), Box::new(cache), cmd.freshness());
        let probe = prober::select_probe(cmd.method.into(), cmd.tcp_port, cfg.probe_timeout);

        Ok(Self::new(directory, probe, cfg)
            .with_filter(cmd.filter_spec())
            .with_refresh(cmd.refresh))
    }

    pub fn with_filter(mut self, filter: FilterSpec) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_refresh(mut self, refresh: bool) -> Self {
        self.refresh = refresh;
        self
    }

    pub async fn run(&self, cancel: &CancellationToken) -> anyhow::Result<Outcome> {
        let snapshot: DirectorySnapshot = self
            .directory
            .get_directory(self.refresh)
            .await
            .context("cannot rank relays without the relay directory")?;

        if snapshot.is_empty() {
            return Ok(Outcome::EmptyDirectory);
        }

        let records: Vec<EndpointRecord> = match filter::filter(snapshot.records(), &self.filter) {
            Selection::NoMatches => return Ok(Outcome::NoMatches),
            selection => selection.into_records(),
        };

        if self.verbose {
            info!("Loaded {} hosts. Starting to probe...", records.len());
        }

        let start_time: Instant = Instant::now();
        let probed: usize = records.len();

        match self.probe(records, cancel).await {
            ProbeRun::Cancelled(partial) => {
                debug!("Discarding {} partial results", partial.len());
                Ok(Outcome::Cancelled)
            }
            ProbeRun::Completed(results) => {
                let reachable: usize = results.iter().filter(|r| r.latency.is_reached()).count();
                Ok(Outcome::Ranked {
                    results: ranker::rank(results, Some(self.limit)),
                    reachable,
                    probed,
                    elapsed: start_time.elapsed(),
                })
            }
        }
    }

    async fn probe(&self, records: Vec<EndpointRecord>, cancel: &CancellationToken) -> ProbeRun {
        let span: Span = if self.progress {
            info_span!("probing", indicatif.pb_show = true)
        } else {
            info_span!("probing")
        };

        let on_probe_done: Option<ProgressCallback> = if self.progress {
            progress::attach(&span, records.len());
            let bar = span.clone();
            let callback: ProgressCallback = Box::new(move |_done| progress::report_probe_done(&bar));
            Some(callback)
        } else {
            None
        };

        self.prober
            .probe_all(records, self.probe.clone(), cancel, on_probe_done)
            .instrument(span)
            .await
    }
}

/// Fetch, filter, probe, rank, print.
pub async fn rank(cmd: &CommandLine, cfg: &Config) -> anyhow::Result<()> {
    let pipeline = Pipeline::from_command(cmd, cfg)?;

    let cancel = CancellationToken::new();
    let listener: JoinHandle<()> = listen_for_interrupt(cancel.clone());

    let outcome = pipeline.run(&cancel).await;
    listener.abort();

    report(&outcome?, cfg);
    Ok(())
}

fn listen_for_interrupt(cancel: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::select! {
            _ = cancel.cancelled() => {}
            signal = tokio::signal::ctrl_c() => match signal {
                Ok(()) => {
                    print::print(INTERRUPTED_MSG);
                    cancel.cancel();
                }
                Err(e) => warn!("Cannot listen for Ctrl-C: {e}"),
            }
        }
    })
}

fn report(outcome: &Outcome, cfg: &Config) {
    let Outcome::Ranked {
        results,
        reachable,
        probed,
        elapsed,
    } = outcome
    else {
        if let Some(msg) = outcome.message() {
            print::print(msg);
        }
        return;
    };

    if cfg.verbose {
        print::header("relay latency");
    }

    print::table(&ranker::render(results, cfg.show_secondary));

    if cfg.verbose {
        print::summary(*reachable, *probed, *elapsed);
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
