//! Pool configuration.

use std::time::Duration;

use ldap_proto::BindCredentials;

use crate::error::PoolError;

/// Default number of pooled connections.
pub const DEFAULT_POOL_SIZE: usize = 10;
/// Default bound on waiting for a free connection.
pub const DEFAULT_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(10);
/// Default pause between two health checks of the same slot.
pub const DEFAULT_HEALTH_CHECK_INTERVAL: Duration = Duration::from_secs(1);
/// Default bound on waiting for a connection inside a pass-through operation.
pub const DEFAULT_OPERATION_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(10);
/// Default bound on one connect-and-bind attempt.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
/// Default bound on one heartbeat.
pub const DEFAULT_HEALTH_CHECK_TIMEOUT: Duration = Duration::from_secs(5);

/// Configuration for a directory connection pool.
///
/// The configuration is immutable once the pool is built.
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use ldap_pool::PoolConfig;
///
/// let config = PoolConfig::new("ldap://ldap.example.org:389")
///     .pool_size(4)
///     .health_check_interval(Duration::from_millis(500));
///
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Address of the directory server, passed verbatim to the connector.
    pub address: String,

    /// Credentials used to bind every new connection.
    pub credentials: Option<BindCredentials>,

    /// Number of slots (connections) in the pool.
    pub pool_size: usize,

    /// Default bound on [`Pool::acquire`](crate::Pool::acquire).
    pub acquire_timeout: Duration,

    /// Pause between two health-check cycles of a slot.
    pub health_check_interval: Duration,

    /// Bound on acquiring a connection inside pass-through operations
    /// such as [`Pool::search`](crate::Pool::search).
    pub operation_acquire_timeout: Duration,

    /// Bound on a single connect-and-bind attempt made by a watcher.
    pub connect_timeout: Duration,

    /// Bound on one heartbeat; a heartbeat that does not answer in time
    /// counts as failed.
    pub health_check_timeout: Duration,

    /// Open every connection while building the pool. When disabled the
    /// pool starts empty and the watchers populate it.
    pub eager_connect: bool,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            address: String::new(),
            credentials: None,
            pool_size: DEFAULT_POOL_SIZE,
            acquire_timeout: DEFAULT_ACQUIRE_TIMEOUT,
            health_check_interval: DEFAULT_HEALTH_CHECK_INTERVAL,
            operation_acquire_timeout: DEFAULT_OPERATION_ACQUIRE_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            health_check_timeout: DEFAULT_HEALTH_CHECK_TIMEOUT,
            eager_connect: true,
        }
    }
}

impl PoolConfig {
    /// Create a configuration for `address` with default settings.
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            ..Self::default()
        }
    }

    /// Set the bind credentials.
    #[must_use]
    pub fn credentials(mut self, credentials: BindCredentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Set the number of pooled connections.
    #[must_use]
    pub fn pool_size(mut self, size: usize) -> Self {
        self.pool_size = size;
        self
    }

    /// Set the default acquisition timeout.
    #[must_use]
    pub fn acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    /// Set the health-check interval.
    #[must_use]
    pub fn health_check_interval(mut self, interval: Duration) -> Self {
        self.health_check_interval = interval;
        self
    }

    /// Set the acquisition bound used by pass-through operations.
    #[must_use]
    pub fn operation_acquire_timeout(mut self, timeout: Duration) -> Self {
        self.operation_acquire_timeout = timeout;
        self
    }

    /// Set the bound on one connect-and-bind attempt.
    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the bound on one heartbeat.
    #[must_use]
    pub fn health_check_timeout(mut self, timeout: Duration) -> Self {
        self.health_check_timeout = timeout;
        self
    }

    /// Choose between eager and incremental population.
    #[must_use]
    pub fn eager_connect(mut self, eager: bool) -> Self {
        self.eager_connect = eager;
        self
    }

    /// Check the configuration for values the pool cannot run with.
    pub fn validate(&self) -> Result<(), PoolError> {
        if self.address.trim().is_empty() {
            return Err(PoolError::Config("address must not be empty".into()));
        }
        if self.pool_size == 0 {
            return Err(PoolError::Config("pool_size must be at least 1".into()));
        }
        for (name, value) in [
            ("acquire_timeout", self.acquire_timeout),
            ("health_check_interval", self.health_check_interval),
            ("operation_acquire_timeout", self.operation_acquire_timeout),
            ("connect_timeout", self.connect_timeout),
            ("health_check_timeout", self.health_check_timeout),
        ] {
            if value.is_zero() {
                return Err(PoolError::Config(format!("{name} must be greater than zero")));
            }
        }
        Ok(())
    }
}
