//! # ldap-pool
//!
//! Health-checked connection pool for directory (LDAP) clients.
//!
//! The pool keeps a fixed number of long-lived connections to one directory
//! server. Every slot has a background watcher that heartbeats the idle
//! connection and replaces it in place when it has silently died, so callers
//! only ever see a bounded wait instead of a dead connection.
//!
//! ## Features
//!
//! - Fixed-size pool with FIFO hand-off of ready connections
//! - Per-slot health checks with an empty base search
//! - In-place reconnection of dead connections, bind included
//! - Deadline-bounded, cancel-safe acquisition
//! - Eager or incremental population
//! - Pass-through directory operations
//! - Status and metrics for observability
//!
//! ## Example
//!
//! ```rust,ignore
//! use ldap_pool::{Pool, PoolBuilder, PoolConfig};
//! use ldap_proto::{BindCredentials, SearchRequest};
//! use std::time::Duration;
//!
//! // Using the builder pattern
//! let pool = PoolBuilder::new()
//!     .address("ldap://ldap.example.org:389")
//!     .credentials(BindCredentials::new("cn=reader,dc=example,dc=org", "secret"))
//!     .pool_size(5)
//!     .health_check_interval(Duration::from_secs(1))
//!     .build(connector)
//!     .await?;
//!
//! // Or using PoolConfig directly
//! let config = PoolConfig::new("ldap://ldap.example.org:389").pool_size(5);
//! let pool = Pool::new(config, connector).await?;
//!
//! // Run an operation on whichever connection is ready
//! let result = pool
//!     .search(SearchRequest::new("dc=example,dc=org", "(uid=jdoe)"))
//!     .await?;
//!
//! // Or hold a connection for several operations
//! let mut conn = pool.acquire().await?;
//! // Use connection...
//! pool.release(conn);
//!
//! // Check pool status
//! let status = pool.status();
//! println!("Pool utilization: {:.1}%", status.utilization());
//!
//! pool.close().await?;
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod config;
pub mod error;
pub mod lifecycle;
mod ops;
pub mod pool;
mod registry;
mod watcher;

// Configuration
pub use config::PoolConfig;

// Error types
pub use error::PoolError;

// Pool types
pub use pool::{Pool, PoolBuilder, PoolMetrics, PoolStatus, PooledConnection};

// Lifecycle management
pub use lifecycle::{ConnectionMetadata, HealthCheckResult, SlotState};
