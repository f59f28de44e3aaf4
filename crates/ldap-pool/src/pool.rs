//! Connection pool implementation.
//!
//! This module provides the pool manager: construction, acquisition and
//! release of pooled connections, shutdown, and the status and metrics
//! accessors. Health checking lives in [`crate::watcher`] and the directory
//! pass-through operations in [`crate::ops`].

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::future::join_all;
use ldap_proto::{ClientError, Connector, DirectoryClient, Operation, Response, SearchRequest};
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::{CancellationToken, DropGuard};
use tokio_util::task::TaskTracker;

use crate::config::PoolConfig;
use crate::error::PoolError;
use crate::lifecycle::{ConnectionMetadata, HealthCheckResult, SlotState};
use crate::registry::{CheckIn, HandOffClosed, SlotRegistry};
use crate::watcher::HealthWatcher;

/// A pool of health-checked directory connections.
///
/// The pool holds a fixed number of slots. Each slot owns at most one
/// connection and has a background watcher that heartbeats the connection
/// while it is idle and replaces it in place when it dies. Callers acquire a
/// connection, run operations on it, and release it.
///
/// `Pool` is cheap to clone; all clones share the same slots. Background
/// watchers stop when [`close`](Pool::close) is called or the last clone is
/// dropped.
///
/// # Example
///
/// ```rust,ignore
/// use ldap_pool::PoolBuilder;
///
/// let pool = PoolBuilder::new()
///     .address("ldap://ldap.example.org:389")
///     .pool_size(5)
///     .build(connector)
///     .await?;
///
/// let mut conn = pool.acquire().await?;
/// let response = conn.invoke(operation).await?;
/// pool.release(conn);
/// ```
pub struct Pool<C: Connector> {
    inner: Arc<PoolInner<C>>,
    _watchers_guard: Arc<DropGuard>,
}

impl<C: Connector> Clone for Pool<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            _watchers_guard: Arc::clone(&self._watchers_guard),
        }
    }
}

impl<C: Connector> std::fmt::Debug for Pool<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pool")
            .field("address", &self.inner.config.address)
            .field("status", &self.status())
            .field("closed", &self.is_closed())
            .finish()
    }
}

pub(crate) struct PoolInner<C: Connector> {
    /// Pool configuration.
    config: PoolConfig,

    /// Factory for new connections.
    connector: C,

    /// Slots and the hand-off queue.
    registry: SlotRegistry<C::Client>,

    /// Whether the pool is closed.
    closed: AtomicBool,

    /// Counter for generating connection IDs.
    next_connection_id: AtomicU64,

    /// When the pool was created.
    created_at: Instant,

    /// Pool metrics.
    metrics: Mutex<PoolMetricsInner>,

    /// Cancels every watcher.
    cancel: CancellationToken,

    /// Watcher tasks, joined on close.
    watchers: Mutex<Vec<JoinHandle<()>>>,

    /// Closes of connections released after shutdown started.
    closing: TaskTracker,
}

/// Internal metrics tracking.
#[derive(Debug, Default)]
struct PoolMetricsInner {
    /// Total connections created.
    connections_created: u64,
    /// Total connections closed.
    connections_closed: u64,
    /// Failed connect or bind attempts.
    connect_failures: u64,
    /// Total successful checkouts.
    checkouts_successful: u64,
    /// Total failed checkouts (timeouts, pool closed).
    checkouts_failed: u64,
    /// Total health checks performed.
    health_checks_performed: u64,
    /// Total health check failures.
    health_checks_failed: u64,
    /// Connections replaced after a failed health check.
    reconnects: u64,
}

impl<C: Connector> PoolInner<C> {
    pub(crate) fn config(&self) -> &PoolConfig {
        &self.config
    }

    pub(crate) fn registry(&self) -> &SlotRegistry<C::Client> {
        &self.registry
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn next_connection_id(&self) -> u64 {
        self.next_connection_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Connect to the configured address and bind when credentials are set,
    /// bounded by the connect timeout.
    pub(crate) async fn open_connection(
        &self,
        slot: usize,
    ) -> Result<(C::Client, ConnectionMetadata), ClientError> {
        let deadline = deadline_after(self.config.connect_timeout);
        let attempt = async {
            let connect = self.connector.connect(&self.config.address);
            let mut client = match tokio::time::timeout_at(deadline, connect).await {
                Ok(result) => result?,
                Err(_) => return Err(ClientError::Timeout),
            };
            if let Some(credentials) = &self.config.credentials {
                // The bind shares the connect deadline; a client that is
                // already open is closed on every failure.
                let bind = tokio::time::timeout_at(deadline, client.authenticate(credentials)).await;
                let bound = bind.unwrap_or(Err(ClientError::Timeout));
                if let Err(error) = bound {
                    client.close().await;
                    return Err(error);
                }
            }
            Ok(client)
        };

        match attempt.await {
            Ok(client) => {
                let metadata = ConnectionMetadata::new(self.next_connection_id(), slot);
                self.metrics.lock().connections_created += 1;
                tracing::debug!(slot, connection_id = metadata.id, "connection established");
                Ok((client, metadata))
            }
            Err(error) => {
                self.metrics.lock().connect_failures += 1;
                Err(error)
            }
        }
    }

    /// Probe a connection with the heartbeat search.
    pub(crate) async fn heartbeat(&self, client: &mut C::Client) -> HealthCheckResult {
        if client.is_closing() {
            return HealthCheckResult::Closing;
        }
        let probe = client.invoke(Operation::Search(SearchRequest::heartbeat()));
        match tokio::time::timeout(self.config.health_check_timeout, probe).await {
            Ok(Ok(_)) => HealthCheckResult::Healthy,
            Ok(Err(error)) => HealthCheckResult::Failed(error),
            Err(_) => HealthCheckResult::Failed(ClientError::Timeout),
        }
    }

    pub(crate) fn record_health_check(&self, healthy: bool) {
        let mut metrics = self.metrics.lock();
        metrics.health_checks_performed += 1;
        if !healthy {
            metrics.health_checks_failed += 1;
        }
    }

    pub(crate) fn record_connection_closed(&self) {
        self.metrics.lock().connections_closed += 1;
    }

    pub(crate) fn record_reconnect(&self) {
        self.metrics.lock().reconnects += 1;
    }

    fn record_checkout(&self, success: bool) {
        let mut metrics = self.metrics.lock();
        if success {
            metrics.checkouts_successful += 1;
        } else {
            metrics.checkouts_failed += 1;
        }
    }

    /// Take the connection out of a slot just popped from the hand-off
    /// queue, or `None` if the entry was stale.
    fn check_out(self: &Arc<Self>, index: usize) -> Option<PooledConnection<C>> {
        let slot = self.registry.slot(index)?;
        let (client, metadata) = slot.check_out()?;
        tracing::debug!(slot = index, connection_id = metadata.id, "connection acquired");
        Some(PooledConnection {
            client: Some(client),
            metadata,
            pool: Arc::clone(self),
        })
    }

    /// Hand a connection back to its slot.
    fn check_in(self: &Arc<Self>, client: C::Client, metadata: &ConnectionMetadata) {
        let Some(slot) = self.registry.slot(metadata.slot) else {
            return;
        };
        let outcome = slot.check_in(client, &self.closed);
        if matches!(outcome, CheckIn::Parked) {
            tracing::warn!(
                slot = metadata.slot,
                connection_id = metadata.id,
                "released connection is closing; leaving slot for its watcher"
            );
        }
        match self.registry.settle(metadata.slot, outcome) {
            Some(client) => {
                tracing::debug!(
                    slot = metadata.slot,
                    connection_id = metadata.id,
                    "pool closed; closing released connection"
                );
                self.close_detached(client);
            }
            None => {
                tracing::trace!(slot = metadata.slot, connection_id = metadata.id, "connection released");
            }
        }
    }

    /// Close a connection from synchronous code. The close runs on a
    /// tracked task that [`Pool::close`] waits for.
    fn close_detached(self: &Arc<Self>, mut client: C::Client) {
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let pool = Arc::clone(self);
                let close = async move {
                    client.close().await;
                    pool.record_connection_closed();
                };
                self.closing.spawn_on(close, &handle);
            }
            Err(_) => {
                drop(client);
                self.record_connection_closed();
            }
        }
    }
}

/// A deadline `timeout` from now. Timeouts too large to represent mean no
/// deadline at all.
fn deadline_after(timeout: Duration) -> tokio::time::Instant {
    // Roughly 30 years.
    const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

    let now = tokio::time::Instant::now();
    now.checked_add(timeout).unwrap_or(now + FAR_FUTURE)
}

impl<C: Connector> Pool<C> {
    /// Create a new pool with the given configuration.
    ///
    /// With `eager_connect` (the default) every slot is connected before this
    /// returns. Construction only fails if not a single connection can be
    /// opened; slots that failed are repaired by their watchers. Without
    /// `eager_connect` the pool starts empty and the watchers fill it.
    pub async fn new(config: PoolConfig, connector: C) -> Result<Self, PoolError> {
        config.validate()?;

        let size = config.pool_size;
        let cancel = CancellationToken::new();
        let inner = Arc::new(PoolInner {
            registry: SlotRegistry::new(size),
            config,
            connector,
            closed: AtomicBool::new(false),
            next_connection_id: AtomicU64::new(1),
            created_at: Instant::now(),
            metrics: Mutex::new(PoolMetricsInner::default()),
            cancel: cancel.clone(),
            watchers: Mutex::new(Vec::with_capacity(size)),
            closing: TaskTracker::new(),
        });

        if inner.config.eager_connect {
            Self::connect_all(&inner).await?;
        }

        let handles: Vec<JoinHandle<()>> = (0..size)
            .map(|index| {
                let watcher = HealthWatcher::new(index, Arc::clone(&inner), cancel.child_token());
                tokio::spawn(watcher.run())
            })
            .collect();
        *inner.watchers.lock() = handles;

        tracing::info!(
            address = %inner.config.address,
            size,
            eager = inner.config.eager_connect,
            interval = ?inner.config.health_check_interval,
            "connection pool created"
        );

        Ok(Self {
            inner,
            _watchers_guard: Arc::new(cancel.drop_guard()),
        })
    }

    async fn connect_all(inner: &Arc<PoolInner<C>>) -> Result<(), PoolError> {
        let size = inner.registry.len();
        let attempts = join_all((0..size).map(|index| inner.open_connection(index))).await;

        let mut opened = 0;
        let mut last_error = None;
        for (index, attempt) in attempts.into_iter().enumerate() {
            match attempt {
                Ok((client, metadata)) => {
                    if let Some(slot) = inner.registry.slot(index) {
                        let outcome = slot.make_available(client, metadata);
                        inner.registry.settle(index, outcome);
                        opened += 1;
                    }
                }
                Err(error) => {
                    tracing::warn!(slot = index, error = %error, "initial connect failed");
                    last_error = Some(error);
                }
            }
        }

        match last_error {
            Some(source) if opened == 0 => Err(PoolError::InitialConnect {
                attempted: size,
                source,
            }),
            _ => Ok(()),
        }
    }

    /// Get a connection from the pool, waiting up to the configured
    /// acquisition timeout.
    pub async fn acquire(&self) -> Result<PooledConnection<C>, PoolError> {
        self.acquire_timeout(self.inner.config.acquire_timeout).await
    }

    /// Get a connection from the pool, waiting up to `timeout`.
    ///
    /// Slots are handed out in the order they became available. Returns
    /// [`PoolError::AcquisitionTimeout`] if no slot becomes available in
    /// time and [`PoolError::PoolClosed`] if the pool is or gets closed.
    /// A timeout of [`Duration::MAX`] waits indefinitely. Dropping the
    /// returned future before it completes never loses a slot.
    pub async fn acquire_timeout(&self, timeout: Duration) -> Result<PooledConnection<C>, PoolError> {
        if self.inner.is_closed() {
            return Err(PoolError::PoolClosed);
        }

        tracing::trace!(?timeout, "acquiring connection from pool");
        let deadline = deadline_after(timeout);

        loop {
            let popped = tokio::time::timeout_at(deadline, self.inner.registry.hand_off().pop()).await;
            let index = match popped {
                Ok(Ok(Some(index))) => index,
                Ok(Ok(None)) => continue,
                Ok(Err(HandOffClosed)) => {
                    self.inner.record_checkout(false);
                    return Err(PoolError::PoolClosed);
                }
                Err(_) => {
                    self.inner.record_checkout(false);
                    tracing::debug!(?timeout, "timed out waiting for a connection");
                    return Err(PoolError::AcquisitionTimeout(timeout));
                }
            };

            if let Some(conn) = self.inner.check_out(index) {
                self.inner.record_checkout(true);
                return Ok(conn);
            }
            tracing::trace!(slot = index, "skipping stale hand-off entry");
        }
    }

    /// Try to get a connection without waiting.
    ///
    /// Returns `None` if no connections are immediately available.
    pub fn try_acquire(&self) -> Result<Option<PooledConnection<C>>, PoolError> {
        if self.inner.is_closed() {
            return Err(PoolError::PoolClosed);
        }

        loop {
            match self.inner.registry.hand_off().try_pop() {
                Ok(Some(index)) => {
                    if let Some(conn) = self.inner.check_out(index) {
                        self.inner.record_checkout(true);
                        return Ok(Some(conn));
                    }
                }
                Ok(None) => return Ok(None),
                Err(HandOffClosed) => return Err(PoolError::PoolClosed),
            }
        }
    }

    /// Return a connection to the pool.
    ///
    /// Equivalent to dropping it. A connection that reports it is closing is
    /// kept out of circulation until its watcher replaces it.
    pub fn release(&self, conn: PooledConnection<C>) {
        if !Arc::ptr_eq(&self.inner, &conn.pool) {
            tracing::warn!(
                slot = conn.metadata.slot,
                "connection released to a pool it was not acquired from"
            );
        }
        conn.release();
    }

    /// Get the current pool status.
    #[must_use]
    pub fn status(&self) -> PoolStatus {
        let mut status = PoolStatus {
            available: 0,
            in_use: 0,
            unavailable: 0,
            total: 0,
            max: self.inner.registry.len(),
        };
        for slot in self.inner.registry.slots() {
            match slot.state() {
                SlotState::Available => status.available += 1,
                SlotState::Busy => status.in_use += 1,
                SlotState::Unavailable => status.unavailable += 1,
            }
            if slot.is_open() {
                status.total += 1;
            }
        }
        status
    }

    /// State of every slot, by index.
    #[must_use]
    pub fn slot_states(&self) -> Vec<SlotState> {
        self.inner.registry.slots().map(|slot| slot.state()).collect()
    }

    /// Identity of the connection currently owned by slot `index`.
    #[must_use]
    pub fn connection_id(&self, index: usize) -> Option<u64> {
        self.inner.registry.slot(index)?.connection_id()
    }

    /// Get pool metrics.
    #[must_use]
    pub fn metrics(&self) -> PoolMetrics {
        let inner = self.inner.metrics.lock();
        PoolMetrics {
            connections_created: inner.connections_created,
            connections_closed: inner.connections_closed,
            connect_failures: inner.connect_failures,
            checkouts_successful: inner.checkouts_successful,
            checkouts_failed: inner.checkouts_failed,
            health_checks_performed: inner.health_checks_performed,
            health_checks_failed: inner.health_checks_failed,
            reconnects: inner.reconnects,
            uptime: self.inner.created_at.elapsed(),
        }
    }

    /// Close the pool.
    ///
    /// Stops accepting acquisitions (pending ones fail with
    /// [`PoolError::PoolClosed`]), stops every watcher and closes every
    /// connection held by a slot. A watcher in the middle of a heartbeat
    /// closes the connection it is probing; one in the middle of a reconnect
    /// finishes it and the new connection is closed here.
    ///
    /// Connections that are checked out are closed when they are released,
    /// on a background task of the current runtime. Releases that happen
    /// before this returns are waited for; later ones are not. Returns
    /// [`PoolError::PoolClosed`] if the pool was already closed.
    pub async fn close(&self) -> Result<(), PoolError> {
        if self.inner.closed.swap(true, Ordering::AcqRel) {
            return Err(PoolError::PoolClosed);
        }

        self.inner.registry.hand_off().close();
        self.inner.cancel.cancel();

        let watchers = std::mem::take(&mut *self.inner.watchers.lock());
        for watcher in watchers {
            if let Err(error) = watcher.await {
                if error.is_panic() {
                    tracing::error!(error = %error, "health watcher panicked");
                }
            }
        }

        let mut closed = 0;
        for slot in self.inner.registry.slots() {
            if let Some(mut client) = slot.take_for_close() {
                tracing::trace!(slot = slot.index(), "closing connection");
                client.close().await;
                closed += 1;
            }
        }
        self.inner.metrics.lock().connections_closed += closed;

        self.inner.closing.close();
        self.inner.closing.wait().await;

        tracing::info!(closed, "connection pool closed");
        Ok(())
    }

    /// Check if the pool is closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.inner.is_closed()
    }

    /// Get the pool configuration.
    #[must_use]
    pub fn config(&self) -> &PoolConfig {
        &self.inner.config
    }
}

/// Builder for creating a connection pool.
///
/// # Example
///
/// ```rust,ignore
/// let pool = PoolBuilder::new()
///     .address("ldap://ldap.example.org")
///     .credentials(BindCredentials::new("cn=reader,dc=example,dc=org", "secret"))
///     .pool_size(8)
///     .build(connector)
///     .await?;
/// ```
#[derive(Debug, Clone)]
pub struct PoolBuilder {
    pool_config: PoolConfig,
}

impl PoolBuilder {
    /// Create a new pool builder with default settings.
    pub fn new() -> Self {
        Self {
            pool_config: PoolConfig::default(),
        }
    }

    /// Set the pool configuration.
    #[must_use]
    pub fn pool_config(mut self, config: PoolConfig) -> Self {
        self.pool_config = config;
        self
    }

    /// Set the directory server address.
    #[must_use]
    pub fn address(mut self, address: impl Into<String>) -> Self {
        self.pool_config.address = address.into();
        self
    }

    /// Set the bind credentials.
    #[must_use]
    pub fn credentials(mut self, credentials: ldap_proto::BindCredentials) -> Self {
        self.pool_config.credentials = Some(credentials);
        self
    }

    /// Set the number of pooled connections.
    #[must_use]
    pub fn pool_size(mut self, size: usize) -> Self {
        self.pool_config.pool_size = size;
        self
    }

    /// Set the connection acquisition timeout.
    #[must_use]
    pub fn acquire_timeout(mut self, timeout: Duration) -> Self {
        self.pool_config.acquire_timeout = timeout;
        self
    }

    /// Set the health-check interval.
    #[must_use]
    pub fn health_check_interval(mut self, interval: Duration) -> Self {
        self.pool_config.health_check_interval = interval;
        self
    }

    /// Open all connections up front (default) or let the watchers fill the
    /// pool.
    #[must_use]
    pub fn eager_connect(mut self, eager: bool) -> Self {
        self.pool_config.eager_connect = eager;
        self
    }

    /// Build the pool.
    pub async fn build<C: Connector>(self, connector: C) -> Result<Pool<C>, PoolError> {
        Pool::new(self.pool_config, connector).await
    }
}

impl Default for PoolBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Status information about the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStatus {
    /// Slots ready to be acquired.
    pub available: usize,
    /// Slots checked out by callers.
    pub in_use: usize,
    /// Slots being probed or reconnected.
    pub unavailable: usize,
    /// Open connections.
    pub total: usize,
    /// Pool size.
    pub max: usize,
}

impl PoolStatus {
    /// Calculate the utilization percentage.
    #[must_use]
    pub fn utilization(&self) -> f64 {
        if self.max == 0 {
            return 0.0;
        }
        (self.in_use as f64 / self.max as f64) * 100.0
    }

    /// Check if every slot is checked out.
    #[must_use]
    pub fn is_at_capacity(&self) -> bool {
        self.in_use >= self.max
    }
}

/// Metrics collected from the pool.
#[derive(Debug, Clone)]
pub struct PoolMetrics {
    /// Total connections created since pool start.
    pub connections_created: u64,
    /// Total connections closed since pool start.
    pub connections_closed: u64,
    /// Failed connect or bind attempts.
    pub connect_failures: u64,
    /// Successful connection checkouts.
    pub checkouts_successful: u64,
    /// Failed connection checkouts (timeouts, pool closed).
    pub checkouts_failed: u64,
    /// Health checks performed.
    pub health_checks_performed: u64,
    /// Health checks that failed.
    pub health_checks_failed: u64,
    /// Connections replaced after a failed health check.
    pub reconnects: u64,
    /// Time since pool creation.
    pub uptime: Duration,
}

impl PoolMetrics {
    /// Calculate checkout success rate (0.0 to 1.0).
    #[must_use]
    pub fn checkout_success_rate(&self) -> f64 {
        let total = self.checkouts_successful + self.checkouts_failed;
        if total == 0 {
            return 1.0;
        }
        self.checkouts_successful as f64 / total as f64
    }

    /// Calculate health check success rate (0.0 to 1.0).
    #[must_use]
    pub fn health_check_success_rate(&self) -> f64 {
        if self.health_checks_performed == 0 {
            return 1.0;
        }
        let successful = self.health_checks_performed - self.health_checks_failed;
        successful as f64 / self.health_checks_performed as f64
    }
}

/// A connection retrieved from the pool.
///
/// The holder has exclusive use of the connection. When dropped, the
/// connection is returned to the pool.
pub struct PooledConnection<C: Connector> {
    /// `None` only once the connection has been handed back.
    client: Option<C::Client>,
    /// Connection metadata.
    metadata: ConnectionMetadata,
    /// Reference to the pool for returning the connection.
    pool: Arc<PoolInner<C>>,
}

impl<C: Connector> PooledConnection<C> {
    /// Get the connection metadata.
    #[must_use]
    pub fn metadata(&self) -> &ConnectionMetadata {
        &self.metadata
    }

    /// Index of the slot this connection belongs to.
    #[must_use]
    pub fn slot(&self) -> usize {
        self.metadata.slot
    }

    /// Run one operation on this connection.
    ///
    /// Errors are returned as reported by the client; the pool never retries
    /// an operation.
    pub async fn invoke(&mut self, operation: Operation) -> Result<Response, ClientError> {
        let name = operation.name();
        let slot = self.metadata.slot;
        tracing::trace!(slot, operation = name, "invoking directory operation");
        let result = self.client_mut().invoke(operation).await;
        if let Err(error) = &result {
            tracing::debug!(slot, operation = name, error = %error, "directory operation failed");
        }
        result
    }

    /// Shared access to the underlying client.
    #[must_use]
    pub fn client(&self) -> &C::Client {
        match &self.client {
            Some(client) => client,
            None => unreachable!("pooled connection used after release"),
        }
    }

    /// Exclusive access to the underlying client.
    pub fn client_mut(&mut self) -> &mut C::Client {
        match &mut self.client {
            Some(client) => client,
            None => unreachable!("pooled connection used after release"),
        }
    }

    /// Return the connection to the pool.
    pub fn release(mut self) {
        self.return_to_pool();
    }

    /// Hand the client back to its slot. Only the first call has an
    /// effect.
    fn return_to_pool(&mut self) {
        match self.client.take() {
            Some(client) => self.pool.check_in(client, &self.metadata),
            None => tracing::trace!(slot = self.metadata.slot, "connection already released"),
        }
    }
}

impl<C: Connector> std::ops::Deref for PooledConnection<C> {
    type Target = C::Client;

    fn deref(&self) -> &Self::Target {
        self.client()
    }
}

impl<C: Connector> std::ops::DerefMut for PooledConnection<C> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.client_mut()
    }
}

impl<C: Connector> std::fmt::Debug for PooledConnection<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PooledConnection")
            .field("metadata", &self.metadata)
            .field("released", &self.client.is_none())
            .finish()
    }
}

impl<C: Connector> Drop for PooledConnection<C> {
    fn drop(&mut self) {
        self.return_to_pool();
    }
}
