//! Client side of the service: HTTP calls, the device pairing secret, and
//! day totals for the dashboard.

pub mod api;
pub mod pairing;
pub mod totals;

pub use api::{ApiClient, ClientError};
pub use pairing::{FileSecret, MemorySecret, PairingStore, SecretPersistence};
pub use totals::DayTotals;
