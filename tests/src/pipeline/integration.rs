#![cfg(test)]
use async_trait::async_trait;
use relayr_common::network::{DirectorySnapshot, Latency, ProbeResult};
use relayr_core::directory::{
    DEFAULT_FRESHNESS, DirectoryCache, DirectoryService, DirectorySource, FileCache, MemoryCache,
};
use relayr_core::error::{DirectoryError, Result};
use relayr_core::filter::{self, FilterSpec, Selection};
use relayr_core::prober::{Probe, ProbeRun, Prober};
use relayr_core::ranker;
use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant, SystemTime};
use tokio_util::sync::CancellationToken;

const DIRECTORY: &[u8] = br#"[
    {"hostname": "A", "ipv4_addr_in": "10.0.0.1", "country_code": "se", "country_name": "Sweden",
     "active": true, "owned": true, "network_port_speed": 10},
    {"hostname": "B", "ipv4_addr_in": "10.0.0.2", "country_code": "se", "country_name": "Sweden",
     "active": false, "owned": true, "network_port_speed": 10},
    {"hostname": "C", "ipv4_addr_in": "10.0.0.3", "country_code": "de", "country_name": "Germany",
     "active": true, "owned": false, "network_port_speed": 1,
     "socks_name": "de-socks5-003.relays.example", "socks_port": 1080}
]"#;

fn addr(last_octet: u8) -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(10, 0, 0, last_octet))
}

/// Serves `DIRECTORY` and counts how often it was asked to.
struct FakeDirectory {
    online: bool,
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl DirectorySource for FakeDirectory {
    async fn fetch(&self) -> Result<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.online {
            Ok(DIRECTORY.to_vec())
        } else {
            Err(DirectoryError::Unavailable("offline".into()))
        }
    }
}

fn directory_service(online: bool, cache: Box<dyn DirectoryCache>) -> (DirectoryService, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let source = FakeDirectory {
        online,
        calls: calls.clone(),
    };
    (DirectoryService::new(Box::new(source), cache, DEFAULT_FRESHNESS), calls)
}

/// Answers from a fixed table; unknown addresses never answer.
struct TableProbe {
    answers: HashMap<IpAddr, Duration>,
}

#[async_trait]
impl Probe for TableProbe {
    async fn probe(&self, addr: IpAddr) -> anyhow::Result<Option<Duration>> {
        Ok(self.answers.get(&addr).copied())
    }
}

/// Sleeps for `delay` and reports peak concurrency.
struct SlowProbe {
    delay: Duration,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

#[async_trait]
impl Probe for SlowProbe {
    async fn probe(&self, _addr: IpAddr) -> anyhow::Result<Option<Duration>> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(Some(self.delay))
    }
}

fn hostnames(results: &[ProbeResult]) -> Vec<&str> {
    results.iter().map(|r| r.hostname.as_str()).collect()
}

async fn fresh_snapshot() -> DirectorySnapshot {
    let cache = MemoryCache::with_contents(DIRECTORY, SystemTime::now());
    let (directory, _) = directory_service(false, Box::new(cache));
    directory.get_directory(false).await.unwrap()
}

#[tokio::test]
async fn fresh_cache_runs_the_whole_pipeline_offline() {
    let cache = MemoryCache::with_contents(DIRECTORY, SystemTime::now() - Duration::from_secs(3600));
    let (directory, calls) = directory_service(false, Box::new(cache));

    let snapshot = directory.get_directory(false).await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(snapshot.len(), 3);

    let records = filter::filter(snapshot.records(), &FilterSpec::default()).into_records();
    let probe = Arc::new(TableProbe {
        answers: HashMap::from([(addr(1), Duration::from_millis(50))]),
    });
    let run = Prober::default()
        .probe_all(records, probe, &CancellationToken::new(), None)
        .await;

    let ranked = ranker::rank(run.into_results(), Some(-1));
    assert_eq!(hostnames(&ranked)[0], "A");
    assert_eq!(ranked.len(), 3);
}

#[tokio::test]
async fn ranks_reachable_relays_first_and_applies_the_limit() {
    let snapshot = fresh_snapshot().await;
    let records = filter::filter(snapshot.records(), &FilterSpec::default()).into_records();

    let probe = Arc::new(TableProbe {
        answers: HashMap::from([
            (addr(1), Duration::from_millis(50)),
            (addr(3), Duration::from_millis(10)),
        ]),
    });
    let run = Prober::new(3, Duration::from_secs(1))
        .probe_all(records, probe, &CancellationToken::new(), None)
        .await;
    assert!(!run.is_cancelled());

    let ranked = ranker::rank(run.into_results(), Some(2));
    assert_eq!(hostnames(&ranked), vec!["C", "A"]);
    assert_eq!(ranked[0].latency, Latency::Reached(Duration::from_millis(10)));

    let table = ranker::render(&ranked, false);
    let lines: Vec<&str> = table.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[1].starts_with("C "));
    assert!(lines[1].ends_with("10.00 ms"));
}

#[tokio::test]
async fn active_filter_then_probe_only_touches_survivors() {
    let snapshot = fresh_snapshot().await;
    let spec = FilterSpec {
        active: Some(true),
        ..Default::default()
    };

    let selection = filter::filter(snapshot.records(), &spec);
    assert!(matches!(selection, Selection::Matched(_)));

    let probe = Arc::new(TableProbe {
        answers: HashMap::new(),
    });
    let run = Prober::default()
        .probe_all(selection.into_records(), probe, &CancellationToken::new(), None)
        .await;

    let mut probed = hostnames(run.results());
    probed.sort_unstable();
    assert_eq!(probed, vec!["A", "C"]);
    assert!(run.results().iter().all(|r| r.latency == Latency::Unreachable));
}

#[tokio::test]
async fn secondary_filter_keeps_the_proxy_for_rendering() {
    let snapshot = fresh_snapshot().await;
    let spec = FilterSpec {
        require_secondary_endpoint: true,
        ..Default::default()
    };
    let records = filter::filter(snapshot.records(), &spec).into_records();

    let probe = Arc::new(TableProbe {
        answers: HashMap::from([(addr(3), Duration::from_millis(7))]),
    });
    let run = Prober::default()
        .probe_all(records, probe, &CancellationToken::new(), None)
        .await;

    let table = ranker::render(&ranker::rank(run.into_results(), None), true);
    assert!(table.contains("de-socks5-003.relays.example:1080"));
}

#[tokio::test]
async fn unmatched_filter_selects_nothing() {
    let snapshot = fresh_snapshot().await;
    let spec = FilterSpec {
        country_code: Some("jp".into()),
        ..Default::default()
    };
    assert_eq!(filter::filter(snapshot.records(), &spec), Selection::NoMatches);
}

#[tokio::test]
async fn pool_of_two_bounds_concurrency() {
    let records = (1..=5)
        .map(|i| relayr_common::network::EndpointRecord::new(format!("relay-{i}"), addr(i)))
        .collect();
    let probe = Arc::new(SlowProbe {
        delay: Duration::from_millis(50),
        in_flight: AtomicUsize::new(0),
        peak: AtomicUsize::new(0),
    });

    let run = Prober::new(2, Duration::from_secs(1))
        .probe_all(records, probe.clone(), &CancellationToken::new(), None)
        .await;

    assert_eq!(run.results().len(), 5);
    assert!(probe.peak.load(Ordering::SeqCst) <= 2);
}

#[tokio::test]
async fn interrupt_mid_probe_returns_promptly_without_a_report() {
    let records = (1..=50)
        .map(|i| relayr_common::network::EndpointRecord::new(format!("relay-{i}"), addr(i)))
        .collect();
    let probe = Arc::new(SlowProbe {
        delay: Duration::from_secs(30),
        in_flight: AtomicUsize::new(0),
        peak: AtomicUsize::new(0),
    });

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        trigger.cancel();
    });

    let started = Instant::now();
    let run = Prober::new(25, Duration::from_secs(60))
        .probe_all(records, probe, &cancel, None)
        .await;

    assert!(run.is_cancelled());
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn file_cache_survives_between_runs() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("relays.json");

    let (first, first_calls) = directory_service(true, Box::new(FileCache::new(&path)));
    let fetched = first.get_directory(false).await.unwrap();
    assert_eq!(first_calls.load(Ordering::SeqCst), 1);
    assert!(path.exists());

    let (second, second_calls) = directory_service(false, Box::new(FileCache::new(&path)));
    let cached = second.get_directory(false).await.unwrap();
    assert_eq!(second_calls.load(Ordering::SeqCst), 0);
    assert_eq!(cached.records(), fetched.records());
}

#[tokio::test]
async fn unavailable_directory_without_cache_is_fatal() {
    let (directory, _) = directory_service(false, Box::new(MemoryCache::new()));
    let err = directory.get_directory(false).await.unwrap_err();
    assert!(err.to_string().starts_with("directory unavailable"));
}
