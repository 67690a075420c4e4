pub mod endpoint;
pub mod latency;
pub mod snapshot;

pub use endpoint::{EndpointRecord, RecordError, SecondaryEndpoint};
pub use latency::{Latency, ProbeResult};
pub use snapshot::DirectorySnapshot;
