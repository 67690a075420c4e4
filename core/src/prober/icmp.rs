//! ICMP echo probe.
//!
//! Sends one echo request over a layer-4 raw channel and waits for the matching
//! reply. Opening the channel needs **root privileges** (or `CAP_NET_RAW`).
//!
//! Every probe opens its own channel, so concurrent probes see each other's
//! replies; a reply only counts when both the source address and the echo id
//! match.

use std::net::IpAddr;
use std::time::{Duration, Instant};

use anyhow::{Context, ensure};
use async_trait::async_trait;
use pnet::packet::icmp::IcmpPacket;
use pnet::packet::ip::IpNextHeaderProtocols;
use pnet::transport::{self, TransportChannelType, TransportProtocol};
use relayr_protocols::icmp::{self as echo, EchoId};

use super::Probe;

const TRANSPORT_BUFFER_SIZE: usize = 4096;
const CHANNEL_TYPE_ICMP: TransportChannelType =
    TransportChannelType::Layer4(TransportProtocol::Ipv4(IpNextHeaderProtocols::Icmp));
const PAYLOAD: &[u8] = b"relayr-latency-probe";

pub struct IcmpProbe {
    wait: Duration,
}

impl IcmpProbe {
    pub fn new(wait: Duration) -> Self {
        Self { wait }
    }
}

#[async_trait]
impl Probe for IcmpProbe {
    async fn probe(&self, addr: IpAddr) -> anyhow::Result<Option<Duration>> {
        let wait: Duration = self.wait;
        tokio::task::spawn_blocking(move || echo_once(addr, wait))
            .await
            .context("icmp probe task failed")?
    }
}

fn echo_once(addr: IpAddr, wait: Duration) -> anyhow::Result<Option<Duration>> {
    ensure!(addr.is_ipv4(), "ICMP probing supports IPv4 only, got {addr}");

    let (mut tx, mut rx) = transport::transport_channel(TRANSPORT_BUFFER_SIZE, CHANNEL_TYPE_ICMP)
        .context("opening raw ICMP channel")?;

    let id = EchoId {
        identifier: rand::random(),
        sequence: rand::random(),
    };
    let request: Vec<u8> = echo::create_echo_request(id, PAYLOAD)?;
    let packet = IcmpPacket::new(&request).context("wrapping echo request")?;

    let started = Instant::now();
    let deadline = started + wait;
    tx.send_to(packet, addr).context("sending echo request")?;

    let mut replies = transport::icmp_packet_iter(&mut rx);
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Ok(None);
        }

        match replies.next_with_timeout(remaining)? {
            Some((reply, source)) => {
                let rtt = started.elapsed();
                if source == addr && echo::echo_reply_id(&reply) == Some(id) {
                    return Ok(Some(rtt));
                }
            }
            None => return Ok(None),
        }
    }
}
