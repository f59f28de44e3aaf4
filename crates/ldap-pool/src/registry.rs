//! Slot registry and hand-off queue.
//!
//! The registry is a fixed-length list of slots, one per pooled connection.
//! Each slot keeps its state and its connection behind a single lock, which
//! is never held across an `.await`.
//!
//! The hand-off queue holds the indices of slots that became available, in
//! the order they became available. It is the only place acquirers look for
//! work. An index is queued at most once at a time, so the queue never grows
//! beyond the pool size. A queued index can go stale when its watcher takes
//! the slot out of circulation for a health check; acquirers skip such
//! entries.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use ldap_proto::DirectoryClient;
use parking_lot::Mutex;
use tokio::sync::{Semaphore, TryAcquireError};

use crate::lifecycle::{ConnectionMetadata, SlotState};

/// The hand-off queue was closed by pool shutdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct HandOffClosed;

/// FIFO queue of available slot indices.
///
/// The semaphore holds one permit per queued index. Waiters on the semaphore
/// are served in arrival order, and closing it wakes every waiter.
#[derive(Debug)]
pub(crate) struct HandOff {
    queue: Mutex<VecDeque<usize>>,
    ready: Semaphore,
}

impl HandOff {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            queue: Mutex::new(VecDeque::with_capacity(capacity)),
            ready: Semaphore::new(0),
        }
    }

    pub(crate) fn push(&self, index: usize) {
        self.queue.lock().push_back(index);
        self.ready.add_permits(1);
    }

    /// Wait for the next queued index.
    ///
    /// Cancel safe: nothing is removed from the queue unless the returned
    /// future completes.
    pub(crate) async fn pop(&self) -> Result<Option<usize>, HandOffClosed> {
        let permit = self.ready.acquire().await.map_err(|_| HandOffClosed)?;
        permit.forget();
        Ok(self.queue.lock().pop_front())
    }

    /// Take the next queued index without waiting.
    pub(crate) fn try_pop(&self) -> Result<Option<usize>, HandOffClosed> {
        match self.ready.try_acquire() {
            Ok(permit) => {
                permit.forget();
                Ok(self.queue.lock().pop_front())
            }
            Err(TryAcquireError::NoPermits) => Ok(None),
            Err(TryAcquireError::Closed) => Err(HandOffClosed),
        }
    }

    pub(crate) fn close(&self) {
        self.ready.close();
        self.queue.lock().clear();
    }

    pub(crate) fn len(&self) -> usize {
        self.queue.lock().len()
    }
}

struct SlotEntry<T> {
    state: SlotState,
    client: Option<T>,
    /// Present while a connection for this slot is open, wherever it is held.
    metadata: Option<ConnectionMetadata>,
    queued: bool,
}

/// What a watcher found when it looked at its slot.
pub(crate) enum Inspection<T> {
    /// Checked out by a caller; leave it alone.
    Busy,
    /// No connection; one must be established.
    Empty,
    /// The connection, taken out of circulation for a health check.
    Check(T, ConnectionMetadata),
}

/// Result of handing a connection back to its slot.
pub(crate) enum CheckIn<T> {
    /// The slot must be pushed onto the hand-off queue.
    Enqueue,
    /// The slot is already queued.
    AlreadyQueued,
    /// The connection is closing; the slot waits for its watcher.
    Parked,
    /// The pool is closed; the caller must close the connection.
    Closed(T),
}

/// A fixed pool position holding at most one connection.
pub(crate) struct Slot<T> {
    index: usize,
    entry: Mutex<SlotEntry<T>>,
}

impl<T: DirectoryClient> Slot<T> {
    fn new(index: usize) -> Self {
        Self {
            index,
            entry: Mutex::new(SlotEntry {
                state: SlotState::Unavailable,
                client: None,
                metadata: None,
                queued: false,
            }),
        }
    }

    pub(crate) fn index(&self) -> usize {
        self.index
    }

    pub(crate) fn state(&self) -> SlotState {
        self.entry.lock().state
    }

    pub(crate) fn is_open(&self) -> bool {
        self.entry.lock().metadata.is_some()
    }

    /// Connection id currently owned by this slot, if any.
    pub(crate) fn connection_id(&self) -> Option<u64> {
        self.entry.lock().metadata.as_ref().map(|m| m.id)
    }

    /// `Available → Busy`. Called for an index just popped from the
    /// hand-off queue; returns `None` when the entry was stale.
    pub(crate) fn check_out(&self) -> Option<(T, ConnectionMetadata)> {
        let mut entry = self.entry.lock();
        entry.queued = false;
        if entry.state != SlotState::Available {
            return None;
        }
        let client = entry.client.take()?;
        let metadata = entry.metadata.clone()?;
        entry.state = SlotState::Busy;
        Some((client, metadata))
    }

    /// `Busy → Available`, or `Busy → Unavailable` when the connection is
    /// closing.
    pub(crate) fn check_in(&self, client: T, closed: &AtomicBool) -> CheckIn<T> {
        let mut entry = self.entry.lock();
        if closed.load(Ordering::Acquire) {
            entry.state = SlotState::Unavailable;
            entry.metadata = None;
            return CheckIn::Closed(client);
        }
        if client.is_closing() {
            entry.state = SlotState::Unavailable;
            entry.client = Some(client);
            return CheckIn::Parked;
        }
        entry.state = SlotState::Available;
        entry.client = Some(client);
        Self::mark_queued(&mut entry)
    }

    /// Start of a watcher cycle. A connection found in the slot is taken
    /// out and the slot becomes `Unavailable` until the watcher hands it
    /// back through [`make_available`](Self::make_available).
    pub(crate) fn inspect(&self) -> Inspection<T> {
        let mut entry = self.entry.lock();
        if entry.state == SlotState::Busy {
            return Inspection::Busy;
        }
        entry.state = SlotState::Unavailable;
        match (entry.client.take(), entry.metadata.clone()) {
            (Some(client), Some(metadata)) => Inspection::Check(client, metadata),
            (client, _) => {
                // A client without metadata cannot be handed out; let the
                // caller replace it.
                entry.client = client;
                Inspection::Empty
            }
        }
    }

    /// Install a healthy connection: `Unavailable → Available`.
    pub(crate) fn make_available(&self, client: T, metadata: ConnectionMetadata) -> CheckIn<T> {
        let mut entry = self.entry.lock();
        entry.state = SlotState::Available;
        entry.client = Some(client);
        entry.metadata = Some(metadata);
        Self::mark_queued(&mut entry)
    }

    /// Record a passed health check and put the connection back.
    pub(crate) fn restore(&self, client: T) -> CheckIn<T> {
        let mut entry = self.entry.lock();
        if let Some(metadata) = entry.metadata.as_mut() {
            metadata.last_checked = Some(Instant::now());
        }
        entry.state = SlotState::Available;
        entry.client = Some(client);
        Self::mark_queued(&mut entry)
    }

    /// Forget the current connection after it failed. The slot stays
    /// `Unavailable` and is empty until a reconnect succeeds. Returns a
    /// connection parked in the slot by a release, if any.
    pub(crate) fn clear(&self) -> Option<T> {
        let mut entry = self.entry.lock();
        entry.state = SlotState::Unavailable;
        entry.metadata = None;
        entry.client.take()
    }

    /// Take whatever connection the slot holds, for shutdown.
    pub(crate) fn take_for_close(&self) -> Option<T> {
        let mut entry = self.entry.lock();
        if entry.state != SlotState::Busy {
            entry.state = SlotState::Unavailable;
            entry.metadata = None;
        }
        entry.client.take()
    }

    fn mark_queued(entry: &mut SlotEntry<T>) -> CheckIn<T> {
        if entry.queued {
            CheckIn::AlreadyQueued
        } else {
            entry.queued = true;
            CheckIn::Enqueue
        }
    }
}

/// Fixed-size, index-addressed collection of slots plus the hand-off queue.
pub(crate) struct SlotRegistry<T> {
    slots: Vec<Slot<T>>,
    hand_off: HandOff,
}

impl<T: DirectoryClient> SlotRegistry<T> {
    pub(crate) fn new(size: usize) -> Self {
        Self {
            slots: (0..size).map(Slot::new).collect(),
            hand_off: HandOff::with_capacity(size),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }

    pub(crate) fn slot(&self, index: usize) -> Option<&Slot<T>> {
        self.slots.get(index)
    }

    pub(crate) fn slots(&self) -> impl Iterator<Item = &Slot<T>> {
        self.slots.iter()
    }

    pub(crate) fn hand_off(&self) -> &HandOff {
        &self.hand_off
    }

    /// Apply the outcome of a check-in to the hand-off queue. Returns the
    /// connection back when the pool is closed.
    pub(crate) fn settle(&self, index: usize, outcome: CheckIn<T>) -> Option<T> {
        match outcome {
            CheckIn::Enqueue => {
                self.hand_off.push(index);
                None
            }
            CheckIn::AlreadyQueued | CheckIn::Parked => None,
            CheckIn::Closed(client) => Some(client),
        }
    }
}
