//! # Endpoint Record
//!
//! One entry of the relay directory, as served by the directory API.
//!
//! The wire format uses snake_case keys (`ipv4_addr_in`, `network_port_speed`,
//! `socks_name`, ...). Only `hostname` and `ipv4_addr_in` are mandatory; every
//! other attribute may be missing and a missing attribute never matches a filter.

use std::fmt;
use std::net::IpAddr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("directory body is not a valid record list: {0}")]
    Json(#[from] serde_json::Error),

    #[error("record #{index} has an empty hostname")]
    EmptyHostname { index: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointRecord {
    pub hostname: String,

    #[serde(rename = "ipv4_addr_in")]
    pub address: IpAddr,

    #[serde(default)]
    pub country_code: Option<String>,

    #[serde(default)]
    pub country_name: Option<String>,

    /// Administratively enabled.
    #[serde(default)]
    pub active: Option<bool>,

    /// Operator-owned rather than leased infrastructure.
    #[serde(default)]
    pub owned: Option<bool>,

    /// Link capacity in Gbps.
    #[serde(rename = "network_port_speed", default)]
    pub port_speed: Option<u32>,

    #[serde(rename = "socks_name", default)]
    pub proxy_name: Option<String>,

    #[serde(rename = "socks_port", default)]
    pub proxy_port: Option<u16>,
}

/// The alternate (SOCKS5) address offered by some relays.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SecondaryEndpoint {
    pub name: String,
    pub port: u16,
}

impl fmt::Display for SecondaryEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.name, self.port)
    }
}

impl EndpointRecord {
    pub fn new(hostname: impl Into<String>, address: IpAddr) -> Self {
        Self {
            hostname: hostname.into(),
            address,
            country_code: None,
            country_name: None,
            active: None,
            owned: None,
            port_speed: None,
            proxy_name: None,
            proxy_port: None,
        }
    }

    pub fn with_country(mut self, code: &str, name: &str) -> Self {
        self.country_code = Some(code.to_string());
        self.country_name = Some(name.to_string());
        self
    }

    pub fn with_active(mut self, active: bool) -> Self {
        self.active = Some(active);
        self
    }

    pub fn with_owned(mut self, owned: bool) -> Self {
        self.owned = Some(owned);
        self
    }

    pub fn with_port_speed(mut self, speed: u32) -> Self {
        self.port_speed = Some(speed);
        self
    }

    pub fn with_secondary(mut self, name: &str, port: u16) -> Self {
        self.proxy_name = Some(name.to_string());
        self.proxy_port = Some(port);
        self
    }

    /// Returns the secondary endpoint only when both halves are usable.
    pub fn secondary(&self) -> Option<SecondaryEndpoint> {
        let name = self.proxy_name.as_deref().map(str::trim).filter(|n| !n.is_empty())?;
        let port = self.proxy_port.filter(|p| *p != 0)?;
        Some(SecondaryEndpoint {
            name: name.to_string(),
            port,
        })
    }

    /// Parses a raw directory body (a JSON array of records).
    ///
    /// Fails on the first record that breaks the mandatory-field invariant, so a
    /// half-valid directory is never handed to the rest of the pipeline.
    pub fn parse_directory(body: &[u8]) -> Result<Vec<EndpointRecord>, RecordError> {
        let records: Vec<EndpointRecord> = serde_json::from_slice(body)?;
        if let Some(index) = records.iter().position(|r| r.hostname.trim().is_empty()) {
            return Err(RecordError::EmptyHostname { index });
        }
        Ok(records)
    }
}
