//! Directory client traits.
//!
//! A directory client library integrates with the pool by implementing
//! [`Connector`] (how to open a connection) and [`DirectoryClient`] (what a
//! live connection can do).

use async_trait::async_trait;

use crate::credentials::BindCredentials;
use crate::error::Result;
use crate::request::Operation;
use crate::response::Response;

/// One live connection to a directory server.
///
/// A client is only ever driven by one task at a time; the pool guarantees
/// that a checked-out connection is never health-checked concurrently.
#[async_trait]
pub trait DirectoryClient: Send + 'static {
    /// Bind the connection with the given credentials.
    async fn authenticate(&mut self, credentials: &BindCredentials) -> Result<()>;

    /// Whether the connection has started closing or is already closed.
    ///
    /// This must be cheap and must not perform I/O.
    fn is_closing(&self) -> bool;

    /// Run one operation and wait for its response.
    async fn invoke(&mut self, operation: Operation) -> Result<Response>;

    /// Close the connection. Errors during close are not reported.
    async fn close(&mut self);
}

/// Factory for directory connections.
///
/// Holds whatever application configuration is needed to dial the server
/// (TLS settings, socket options, etc.).
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    /// Connection type produced by this connector.
    type Client: DirectoryClient;

    /// Open a transport connection to `address`.
    async fn connect(&self, address: &str) -> Result<Self::Client>;
}
