//! Connection lifecycle types.
//!
//! A slot moves through three states:
//!
//! ```text
//!              acquire                 release (healthy)
//!  Available ───────────▶ Busy ───────────────────────────▶ Available
//!      ▲                    │
//!      │                    │ release (connection closing)
//!      │ heartbeat ok /     ▼
//!      │ reconnect ok   Unavailable ◀──── heartbeat / empty slot
//!      └────────────────────┘
//! ```
//!
//! `Busy` slots are owned by exactly one caller and are never health-checked.
//! `Unavailable` slots are owned by their watcher, which is either probing the
//! connection or replacing it.

use std::fmt;
use std::time::Instant;

use ldap_proto::ClientError;

/// State of a pool slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    /// Idle, healthy, eligible for acquisition.
    Available,
    /// Checked out by a caller.
    Busy,
    /// Out of circulation while its watcher probes or replaces the connection.
    Unavailable,
}

impl fmt::Display for SlotState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Available => "available",
            Self::Busy => "busy",
            Self::Unavailable => "unavailable",
        };
        f.write_str(name)
    }
}

/// Identity and bookkeeping of one pooled connection.
///
/// `id` is unique for the lifetime of the pool: a replacement connection in
/// the same slot always gets a new id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionMetadata {
    /// Pool-wide connection identity.
    pub id: u64,
    /// Index of the slot holding the connection.
    pub slot: usize,
    /// When the connection was established.
    pub created_at: Instant,
    /// When the connection last passed a health check.
    pub last_checked: Option<Instant>,
}

impl ConnectionMetadata {
    pub(crate) fn new(id: u64, slot: usize) -> Self {
        Self {
            id,
            slot,
            created_at: Instant::now(),
            last_checked: None,
        }
    }

    /// Age of the connection.
    #[must_use]
    pub fn age(&self) -> std::time::Duration {
        self.created_at.elapsed()
    }
}

/// Outcome of one heartbeat.
#[derive(Debug)]
pub enum HealthCheckResult {
    /// The heartbeat succeeded.
    Healthy,
    /// The connection reported it is closing; no probe was sent.
    Closing,
    /// The heartbeat failed or did not answer in time.
    Failed(ClientError),
}

impl HealthCheckResult {
    /// Whether the connection may stay in the pool.
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        matches!(self, Self::Healthy)
    }
}
