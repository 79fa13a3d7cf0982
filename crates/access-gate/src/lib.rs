//! Access Control Gate
//!
//! Decides whether a connected wallet may act as administrator and keeps
//! track of the resulting session.
//!
//! **Components:**
//! - `config`: the single credential/policy object injected at startup
//! - `gate`: address check with failed-attempt lockout
//! - `session`: the session/credential record
//! - `fingerprint`: device fingerprint for session binding
//! - `ip_lookup`: best-effort public IP lookup
//! - `store`: persisted session record (memory or Redis)
//! - `manager`: ties the above together for the dashboard

pub mod config;
pub mod fingerprint;
pub mod gate;
pub mod ip_lookup;
pub mod manager;
pub mod session;
pub mod store;

pub use config::GateConfig;
pub use fingerprint::DeviceProfile;
pub use gate::{AccessDecision, AccessGate, AccessLevel, GateStatus};
pub use ip_lookup::{IpLookup, IpifyClient, StaticIpLookup};
pub use manager::SessionManager;
pub use session::{SecurityLevel, Session};
pub use store::{CredentialStore, MemoryCredentialStore, RedisCredentialStore, CREDENTIALS_KEY};
