//! # ldap-testing
//!
//! Test infrastructure for the directory connection pool.
//!
//! [`MockDirectory`] is an in-memory stand-in for a directory server. It hands
//! out [`MockConnector`]s whose [`MockClient`]s answer every operation
//! without any I/O, and it records what the pool does with them: how many
//! connections are open, which ones were bound, how often each was
//! heartbeated and whether two operations ever overlapped on the same
//! connection.
//!
//! Failures are injected per connection id (assigned in connect order,
//! starting at 1) or for the whole directory.
//!
//! ## Example
//!
//! ```rust,ignore
//! use ldap_testing::MockDirectory;
//!
//! let directory = MockDirectory::new();
//! directory.fail_heartbeats_after(2, 1);
//!
//! let pool = Pool::new(config, directory.connector()).await?;
//! assert!(directory.max_open() <= 3);
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod mock;

pub use mock::{MockClient, MockConnector, MockDirectory};
