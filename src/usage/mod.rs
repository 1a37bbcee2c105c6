//! Disk usage
//!
//! Recursive usage aggregation for the storage root and best-effort
//! host capacity probes.

pub mod probe;
pub mod reporter;

pub use probe::{DiskProbe, DiskSpace};
pub use reporter::UsageSnapshot;
