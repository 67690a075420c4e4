//! # Filter Engine
//!
//! A conjunction of optional predicates over directory records. Every predicate
//! is a pure function of one record, so the order they are checked in does not
//! matter and the input order is preserved.

use relayr_common::network::EndpointRecord;

/// Predicates selected for a run. `None` / `false` means "no constraint".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSpec {
    /// Case-insensitive exact match.
    pub country_code: Option<String>,
    /// Case-insensitive exact match.
    pub country_name: Option<String>,
    pub active: Option<bool>,
    pub owned: Option<bool>,
    pub port_speed: Option<u32>,
    /// Keep only records offering a usable secondary (SOCKS5) endpoint.
    pub require_secondary_endpoint: bool,
}

/// Result of running the filter engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// No predicate was supplied; every record passes.
    Unfiltered(Vec<EndpointRecord>),
    /// At least one predicate was supplied and at least one record survived.
    Matched(Vec<EndpointRecord>),
    /// Predicates were supplied and nothing survived. Probing can be skipped.
    NoMatches,
}

impl Selection {
    pub fn records(&self) -> &[EndpointRecord] {
        match self {
            Selection::Unfiltered(records) | Selection::Matched(records) => records,
            Selection::NoMatches => &[],
        }
    }

    pub fn into_records(self) -> Vec<EndpointRecord> {
        match self {
            Selection::Unfiltered(records) | Selection::Matched(records) => records,
            Selection::NoMatches => Vec::new(),
        }
    }
}

impl FilterSpec {
    pub fn is_empty(&self) -> bool {
        self.country_code.is_none()
            && self.country_name.is_none()
            && self.active.is_none()
            && self.owned.is_none()
            && self.port_speed.is_none()
            && !self.require_secondary_endpoint
    }

    /// True when `record` satisfies every supplied predicate.
    pub fn matches(&self, record: &EndpointRecord) -> bool {
        text_matches(&self.country_code, &record.country_code)
            && text_matches(&self.country_name, &record.country_name)
            && value_matches(&self.active, &record.active)
            && value_matches(&self.owned, &record.owned)
            && value_matches(&self.port_speed, &record.port_speed)
            && (!self.require_secondary_endpoint || record.secondary().is_some())
    }
}

fn text_matches(wanted: &Option<String>, actual: &Option<String>) -> bool {
    match (wanted, actual) {
        (None, _) => true,
        (Some(w), Some(a)) => w.to_lowercase() == a.to_lowercase(),
        (Some(_), None) => false,
    }
}

fn value_matches<T: PartialEq>(wanted: &Option<T>, actual: &Option<T>) -> bool {
    match wanted {
        None => true,
        Some(w) => actual.as_ref() == Some(w),
    }
}

/// Narrows `records` down to the ones matching `spec`, keeping their order.
pub fn filter(records: &[EndpointRecord], spec: &FilterSpec) -> Selection {
    if spec.is_empty() {
        return Selection::Unfiltered(records.to_vec());
    }

    let kept: Vec<EndpointRecord> = records
        .iter()
        .filter(|record| spec.matches(record))
        .cloned()
        .collect();

    if kept.is_empty() {
        Selection::NoMatches
    } else {
        Selection::Matched(kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};

    fn record(name: &str, last_octet: u8) -> EndpointRecord {
        EndpointRecord::new(name, IpAddr::V4(Ipv4Addr::new(10, 0, 0, last_octet)))
    }

    fn directory() -> Vec<EndpointRecord> {
        vec![
            record("se-got-wg-001", 1)
                .with_country("se", "Sweden")
                .with_active(true)
                .with_owned(true)
                .with_port_speed(10)
                .with_secondary("se-got-wg-socks5-001.relays.mullvad.net", 1080),
            record("de-fra-wg-002", 2)
                .with_country("de", "Germany")
                .with_active(false)
                .with_owned(false)
                .with_port_speed(1),
            record("se-sto-wg-003", 3)
                .with_country("SE", "Sweden")
                .with_active(true)
                .with_owned(false)
                .with_port_speed(10),
            record("xx-bare-004", 4),
        ]
    }

    fn names(selection: &Selection) -> Vec<&str> {
        selection.records().iter().map(|r| r.hostname.as_str()).collect()
    }

    /// Every combination of the six predicates, each either unset or set to a
    /// value taken from the fixture.
    fn all_specs() -> Vec<FilterSpec> {
        let mut specs = Vec::new();
        for mask in 0u8..64 {
            specs.push(FilterSpec {
                country_code: (mask & 1 != 0).then(|| "SE".to_string()),
                country_name: (mask & 2 != 0).then(|| "sweden".to_string()),
                active: (mask & 4 != 0).then_some(true),
                owned: (mask & 8 != 0).then_some(false),
                port_speed: (mask & 16 != 0).then_some(10),
                require_secondary_endpoint: mask & 32 != 0,
            });
        }
        specs
    }

    #[test]
    fn empty_spec_keeps_everything() {
        let records = directory();
        let selection = filter(&records, &FilterSpec::default());
        assert_eq!(selection, Selection::Unfiltered(records));
    }

    #[test]
    fn active_true_keeps_only_active_records() {
        let records = vec![record("A", 1).with_active(true), record("B", 2).with_active(false)];
        let spec = FilterSpec {
            active: Some(true),
            ..Default::default()
        };
        assert_eq!(names(&filter(&records, &spec)), vec!["A"]);
    }

    #[test]
    fn country_match_is_case_insensitive() {
        let spec = FilterSpec {
            country_code: Some("Se".into()),
            ..Default::default()
        };
        assert_eq!(
            names(&filter(&directory(), &spec)),
            vec!["se-got-wg-001", "se-sto-wg-003"]
        );
    }

    #[test]
    fn missing_attribute_never_matches() {
        let spec = FilterSpec {
            owned: Some(false),
            ..Default::default()
        };
        let selection = filter(&directory(), &spec);
        assert!(!names(&selection).contains(&"xx-bare-004"));
    }

    #[test]
    fn secondary_endpoint_requirement() {
        let spec = FilterSpec {
            require_secondary_endpoint: true,
            ..Default::default()
        };
        assert_eq!(names(&filter(&directory(), &spec)), vec!["se-got-wg-001"]);
    }

    #[test]
    fn no_survivors_is_reported_distinctly() {
        let spec = FilterSpec {
            country_code: Some("jp".into()),
            ..Default::default()
        };
        assert_eq!(filter(&directory(), &spec), Selection::NoMatches);
    }

    #[test]
    fn output_is_an_ordered_subset_respecting_every_predicate() {
        let records = directory();
        for spec in all_specs() {
            let selection = filter(&records, &spec);
            let kept = selection.records();

            let mut cursor = records.iter();
            for record in kept {
                assert!(spec.matches(record), "{spec:?} kept {}", record.hostname);
                assert!(
                    cursor.any(|r| r == record),
                    "{spec:?} reordered or invented {}",
                    record.hostname
                );
            }

            let expected = records.iter().filter(|r| spec.matches(r)).count();
            assert_eq!(kept.len(), expected, "{spec:?} dropped a matching record");
        }
    }

    #[test]
    fn filtering_is_idempotent() {
        let records = directory();
        for spec in all_specs() {
            let once = filter(&records, &spec).into_records();
            let twice = filter(&once, &spec).into_records();
            assert_eq!(once, twice, "{spec:?}");
        }
    }
}
