//! Scripted in-memory directory.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use ldap_proto::{
    BindCredentials, ClientError, Connector, DirectoryClient, ModifyResult, Operation,
    PasswordModifyResult, Response, SearchResult,
};
use parking_lot::Mutex;

#[derive(Debug, Default)]
struct State {
    next_id: u64,
    open: usize,
    max_open: usize,
    connects: usize,
    failing_connects: usize,
    connect_down: bool,
    connect_delay: Option<Duration>,
    bind_delay: Option<Duration>,
    reject_binds: bool,
    binds: Vec<(u64, String)>,
    heartbeats: HashMap<u64, u32>,
    heartbeat_delays: HashMap<u64, Duration>,
    doomed: HashMap<u64, u32>,
    closing: HashSet<u64>,
    closed: Vec<u64>,
    dropped_open: Vec<u64>,
    dead: HashSet<u64>,
    dead_uses: usize,
    in_flight: HashSet<u64>,
    overlaps: usize,
    operations: Vec<(u64, &'static str)>,
    operation_delay: Option<Duration>,
    operation_error: Option<(u32, String)>,
    response: Option<Response>,
}

/// Shared handle to a fake directory server.
///
/// Cloning the handle shares the same state, so a test can keep one clone
/// for inspection and hand a connector to the pool.
#[derive(Debug, Clone, Default)]
pub struct MockDirectory {
    state: Arc<Mutex<State>>,
}

impl MockDirectory {
    /// Create a directory that accepts every connection and answers every
    /// operation successfully.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A connector opening connections to this directory.
    #[must_use]
    pub fn connector(&self) -> MockConnector {
        MockConnector {
            directory: self.clone(),
        }
    }

    // -- failure injection --------------------------------------------------

    /// Refuse the next `count` connection attempts.
    pub fn fail_next_connects(&self, count: usize) {
        self.state.lock().failing_connects = count;
    }

    /// Refuse every connection attempt while `down` is set.
    pub fn set_down(&self, down: bool) {
        self.state.lock().connect_down = down;
    }

    /// Delay every connection attempt.
    pub fn set_connect_delay(&self, delay: Duration) {
        self.state.lock().connect_delay = Some(delay);
    }

    /// Make every bind take `delay`.
    pub fn set_bind_delay(&self, delay: Duration) {
        self.state.lock().bind_delay = Some(delay);
    }

    /// Reject every bind.
    pub fn reject_binds(&self, reject: bool) {
        self.state.lock().reject_binds = reject;
    }

    /// Let connection `id` answer `healthy` heartbeats, then fail every
    /// later one as if the server had dropped the connection.
    pub fn fail_heartbeats_after(&self, id: u64, healthy: u32) {
        self.state.lock().doomed.insert(id, healthy);
    }

    /// Make every heartbeat sent on connection `id` take `delay` before it
    /// is answered.
    pub fn set_heartbeat_delay(&self, id: u64, delay: Duration) {
        self.state.lock().heartbeat_delays.insert(id, delay);
    }

    /// Make connection `id` report that it is closing.
    pub fn set_closing(&self, id: u64) {
        self.state.lock().closing.insert(id);
    }

    /// Fail every non-heartbeat operation with a server result code.
    pub fn fail_operations(&self, code: u32, message: impl Into<String>) {
        self.state.lock().operation_error = Some((code, message.into()));
    }

    /// Answer every non-heartbeat operation with `response`.
    pub fn respond_with(&self, response: Response) {
        self.state.lock().response = Some(response);
    }

    /// Make every non-heartbeat operation take `delay`.
    pub fn set_operation_delay(&self, delay: Duration) {
        self.state.lock().operation_delay = Some(delay);
    }

    // -- accounting ---------------------------------------------------------

    /// Connections currently open.
    #[must_use]
    pub fn open(&self) -> usize {
        self.state.lock().open
    }

    /// Highest number of connections ever open at the same time.
    #[must_use]
    pub fn max_open(&self) -> usize {
        self.state.lock().max_open
    }

    /// Successful connection attempts.
    #[must_use]
    pub fn connects(&self) -> usize {
        self.state.lock().connects
    }

    /// Ids of connections that have been closed, in close order.
    #[must_use]
    pub fn closed(&self) -> Vec<u64> {
        self.state.lock().closed.clone()
    }

    /// Ids of connections that were dropped without being closed first.
    #[must_use]
    pub fn dropped_open(&self) -> Vec<u64> {
        self.state.lock().dropped_open.clone()
    }

    /// `(connection id, username)` for every successful bind.
    #[must_use]
    pub fn binds(&self) -> Vec<(u64, String)> {
        self.state.lock().binds.clone()
    }

    /// Heartbeats received by connection `id`.
    #[must_use]
    pub fn heartbeats(&self, id: u64) -> u32 {
        self.state.lock().heartbeats.get(&id).copied().unwrap_or(0)
    }

    /// Total heartbeats received.
    #[must_use]
    pub fn total_heartbeats(&self) -> u32 {
        self.state.lock().heartbeats.values().sum()
    }

    /// `(connection id, operation name)` for every non-heartbeat operation.
    #[must_use]
    pub fn operations(&self) -> Vec<(u64, &'static str)> {
        self.state.lock().operations.clone()
    }

    /// Times an operation started on a connection that was already running
    /// one.
    #[must_use]
    pub fn overlaps(&self) -> usize {
        self.state.lock().overlaps
    }

    /// Operations started on a connection after it failed a heartbeat.
    #[must_use]
    pub fn dead_uses(&self) -> usize {
        self.state.lock().dead_uses
    }

    fn open_connection(&self) -> Result<u64, ClientError> {
        let mut state = self.state.lock();
        if state.connect_down {
            return Err(refused());
        }
        if state.failing_connects > 0 {
            state.failing_connects -= 1;
            return Err(refused());
        }
        state.next_id += 1;
        state.connects += 1;
        state.open += 1;
        state.max_open = state.max_open.max(state.open);
        Ok(state.next_id)
    }

    fn close_connection(&self, id: u64) {
        let mut state = self.state.lock();
        state.open = state.open.saturating_sub(1);
        state.closed.push(id);
    }
}

fn refused() -> ClientError {
    ClientError::Connect {
        address: "mock".into(),
        message: "connection refused".into(),
    }
}

/// Opens [`MockClient`]s against a [`MockDirectory`].
#[derive(Debug, Clone)]
pub struct MockConnector {
    directory: MockDirectory,
}

#[async_trait]
impl Connector for MockConnector {
    type Client = MockClient;

    async fn connect(&self, address: &str) -> Result<MockClient, ClientError> {
        let delay = self.directory.state.lock().connect_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let id = self.directory.open_connection()?;
        tracing::trace!(id, address, "mock connection opened");
        Ok(MockClient {
            id,
            directory: self.directory.clone(),
            closed: false,
        })
    }
}

/// One fake connection.
///
/// Dropping an open client counts as closing it, and is also recorded in
/// [`MockDirectory::dropped_open`].
#[derive(Debug)]
pub struct MockClient {
    id: u64,
    directory: MockDirectory,
    closed: bool,
}

impl MockClient {
    /// Connection id, assigned in connect order starting at 1.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    async fn heartbeat(&self) -> Result<Response, ClientError> {
        let delay = self.directory.state.lock().heartbeat_delays.get(&self.id).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.directory.state.lock();
        if state.in_flight.contains(&self.id) {
            state.overlaps += 1;
        }
        let served = state.heartbeats.entry(self.id).or_insert(0);
        *served += 1;
        let served = *served;
        match state.doomed.get(&self.id) {
            Some(&healthy) if served > healthy => {
                state.dead.insert(self.id);
                Err(ClientError::ConnectionClosed)
            }
            _ => Ok(Response::Search(SearchResult::default())),
        }
    }

    fn begin(&self, name: &'static str) {
        let mut state = self.directory.state.lock();
        if !state.in_flight.insert(self.id) {
            state.overlaps += 1;
        }
        if state.dead.contains(&self.id) {
            state.dead_uses += 1;
        }
        state.operations.push((self.id, name));
    }

    fn finish(&self, operation: &Operation) -> Result<Response, ClientError> {
        let mut state = self.directory.state.lock();
        state.in_flight.remove(&self.id);
        if let Some((code, message)) = &state.operation_error {
            return Err(ClientError::Operation {
                code: *code,
                message: message.clone(),
            });
        }
        if let Some(response) = &state.response {
            return Ok(response.clone());
        }
        Ok(default_response(operation))
    }
}

fn default_response(operation: &Operation) -> Response {
    match operation {
        Operation::Search(_) | Operation::SearchWithPaging { .. } => {
            Response::Search(SearchResult::default())
        }
        Operation::ModifyWithResult(_) => Response::Modified(ModifyResult::default()),
        Operation::PasswordModify(_) => Response::PasswordModified(PasswordModifyResult::default()),
        _ => Response::Done,
    }
}

#[async_trait]
impl DirectoryClient for MockClient {
    async fn authenticate(&mut self, credentials: &BindCredentials) -> Result<(), ClientError> {
        let delay = self.directory.state.lock().bind_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.directory.state.lock();
        if state.reject_binds {
            return Err(ClientError::Authentication("invalid credentials".into()));
        }
        state.binds.push((self.id, credentials.username().to_owned()));
        Ok(())
    }

    fn is_closing(&self) -> bool {
        self.closed || self.directory.state.lock().closing.contains(&self.id)
    }

    async fn invoke(&mut self, operation: Operation) -> Result<Response, ClientError> {
        if self.closed {
            return Err(ClientError::ConnectionClosed);
        }
        if operation.is_heartbeat() {
            return self.heartbeat().await;
        }

        self.begin(operation.name());
        let delay = self.directory.state.lock().operation_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.finish(&operation)
    }

    async fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.directory.close_connection(self.id);
            tracing::trace!(id = self.id, "mock connection closed");
        }
    }
}

impl Drop for MockClient {
    fn drop(&mut self) {
        if !self.closed {
            self.closed = true;
            self.directory.close_connection(self.id);
            self.directory.state.lock().dropped_open.push(self.id);
        }
    }
}
