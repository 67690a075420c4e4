//! Wire-level packet helpers used by the probe backends.

pub mod icmp;
