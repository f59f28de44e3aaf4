//! Connection pool integration tests.
//!
//! These tests drive the pool against the in-memory directory from
//! `ldap-testing`. Most of them run on a paused clock, so health-check
//! intervals and acquisition timeouts elapse instantly and deterministically.
//!
//! ```bash
//! cargo test -p ldap-testing --test pool
//! ```

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use ldap_pool::{Pool, PoolConfig, PoolError, SlotState};
use ldap_proto::{
    AddRequest, BindCredentials, ClientError, DeleteRequest, DirectoryClient, ModifyDnRequest,
    PasswordModifyRequest, Response, SearchEntry, SearchRequest, SearchResult,
};
use ldap_testing::{MockConnector, MockDirectory};
use rand::Rng;
use tokio::time::Instant;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

fn config(size: usize, interval_ms: u64) -> PoolConfig {
    PoolConfig::new("ldap://mock:389")
        .pool_size(size)
        .health_check_interval(Duration::from_millis(interval_ms))
}

async fn pool(directory: &MockDirectory, config: PoolConfig) -> Pool<MockConnector> {
    init_tracing();
    Pool::new(config, directory.connector()).await.unwrap()
}

// =============================================================================
// Health checking and replacement
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_dead_connection_is_replaced_in_place() {
    let directory = MockDirectory::new();
    let pool = pool(&directory, config(3, 100)).await;

    // Slots are handed out in the order they were connected.
    let held: Vec<_> = futures_util::future::join_all((0..3).map(|_| pool.acquire()))
        .await
        .into_iter()
        .map(Result::unwrap)
        .collect();
    let slots: Vec<_> = held.iter().map(|conn| conn.slot()).collect();
    assert_eq!(slots, vec![0, 1, 2]);

    let doomed = held[1].id();
    let doomed_pool_id = pool.connection_id(1).unwrap();
    drop(held);

    // Slot 1 passes two health checks and fails the third.
    directory.fail_heartbeats_after(doomed, 2);
    tokio::time::sleep(Duration::from_millis(300)).await;

    // Within two intervals of the failure the slot is back.
    tokio::time::sleep(Duration::from_millis(150)).await;

    let mut seen = HashSet::new();
    let mut held = Vec::new();
    for _ in 0..3 {
        let conn = pool
            .acquire_timeout(Duration::from_millis(10))
            .await
            .unwrap();
        assert!(!conn.is_closing());
        seen.insert(conn.slot());
        if conn.slot() == 1 {
            assert_ne!(conn.id(), doomed);
        }
        held.push(conn);
    }
    assert_eq!(seen, HashSet::from([0, 1, 2]));
    assert_ne!(pool.connection_id(1), Some(doomed_pool_id));
    assert!(directory.closed().contains(&doomed));
    drop(held);

    let metrics = pool.metrics();
    assert_eq!(metrics.reconnects, 1);
    assert_eq!(metrics.health_checks_failed, 1);
    assert_eq!(metrics.connections_created, 4);
    assert!(directory.max_open() <= 3);
    assert_eq!(directory.dead_uses(), 0);

    pool.close().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_closing_connection_stays_out_until_replaced() {
    let directory = MockDirectory::new();
    let pool = pool(&directory, config(1, 100)).await;

    let conn = pool.acquire().await.unwrap();
    let old = conn.id();
    directory.set_closing(old);
    pool.release(conn);

    let status = pool.status();
    assert_eq!(status.available, 0);
    assert_eq!(status.unavailable, 1);
    assert!(pool.try_acquire().unwrap().is_none());

    tokio::time::sleep(Duration::from_millis(150)).await;

    let conn = pool.try_acquire().unwrap().expect("slot repaired");
    assert_ne!(conn.id(), old);
    assert!(directory.closed().contains(&old));
    assert_eq!(directory.open(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_busy_slot_is_not_health_checked() {
    let directory = MockDirectory::new();
    let pool = pool(&directory, config(1, 50)).await;

    let conn = pool.acquire().await.unwrap();
    let id = conn.id();
    tokio::time::sleep(Duration::from_millis(525)).await;
    assert_eq!(directory.heartbeats(id), 0);
    assert_eq!(pool.status().in_use, 1);

    drop(conn);
    tokio::time::sleep(Duration::from_millis(120)).await;
    assert_eq!(directory.heartbeats(id), 2);
    assert_eq!(directory.overlaps(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_hung_heartbeat_counts_as_failed() {
    let directory = MockDirectory::new();
    let pool = pool(
        &directory,
        config(1, 100).health_check_timeout(Duration::from_millis(50)),
    )
    .await;
    let old = pool.connection_id(0).unwrap();
    directory.set_heartbeat_delay(1, Duration::from_secs(1));

    // The heartbeat sent at 100ms is given up at 150ms and the slot is
    // reconnected right away.
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(directory.heartbeats(1), 1);
    assert_eq!(directory.closed(), vec![1]);
    assert!(directory.dropped_open().is_empty());
    assert_ne!(pool.connection_id(0), Some(old));

    let metrics = pool.metrics();
    assert_eq!(metrics.health_checks_failed, 1);
    assert_eq!(metrics.reconnects, 1);

    let conn = pool.try_acquire().unwrap().expect("slot reconnected");
    assert_eq!(conn.id(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_unreachable_server_is_retried_by_watchers() {
    let directory = MockDirectory::new();
    let pool = pool(&directory, config(2, 100)).await;

    let first = directory.connects();
    directory.set_down(true);
    directory.fail_heartbeats_after(1, 0);
    directory.fail_heartbeats_after(2, 0);

    tokio::time::sleep(Duration::from_millis(350)).await;
    let status = pool.status();
    assert_eq!(status.total, 0);
    assert_eq!(status.unavailable, 2);
    assert!(matches!(
        pool.acquire_timeout(Duration::from_millis(50)).await,
        Err(PoolError::AcquisitionTimeout(_))
    ));

    directory.set_down(false);
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(pool.status().available, 2);
    assert_eq!(directory.connects(), first + 2);
    assert!(pool.metrics().connect_failures > 0);
}

// =============================================================================
// Acquisition
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_exhausted_pool_times_out() {
    let directory = MockDirectory::new();
    let pool = pool(
        &directory,
        config(1, 1_000).acquire_timeout(Duration::from_millis(200)),
    )
    .await;

    let first = pool.acquire().await.unwrap();

    let start = Instant::now();
    let err = pool.acquire().await.unwrap_err();
    let waited = start.elapsed();
    assert!(matches!(err, PoolError::AcquisitionTimeout(d) if d == Duration::from_millis(200)));
    assert!(err.is_retryable());
    assert!(waited >= Duration::from_millis(200));
    assert!(waited < Duration::from_millis(250));

    pool.release(first);

    let start = Instant::now();
    let third = pool.acquire().await.unwrap();
    assert!(start.elapsed() < Duration::from_millis(10));
    assert_eq!(third.slot(), 0);

    let metrics = pool.metrics();
    assert_eq!(metrics.checkouts_successful, 2);
    assert_eq!(metrics.checkouts_failed, 1);
}

#[tokio::test(start_paused = true)]
async fn test_ready_slots_are_handed_out_in_order() {
    let directory = MockDirectory::new();
    let pool = pool(&directory, config(3, 1_000)).await;

    let a = pool.acquire().await.unwrap();
    let b = pool.acquire().await.unwrap();
    let c = pool.acquire().await.unwrap();
    assert_eq!(pool.status().in_use, 3);
    assert!(pool.status().is_at_capacity());

    drop(c);
    drop(a);
    drop(b);

    let order: Vec<_> = [
        pool.acquire().await.unwrap(),
        pool.acquire().await.unwrap(),
        pool.acquire().await.unwrap(),
    ]
    .iter()
    .map(|conn| conn.slot())
    .collect();
    assert_eq!(order, vec![2, 0, 1]);
}

#[tokio::test(start_paused = true)]
async fn test_waiters_are_served_in_arrival_order() {
    let directory = MockDirectory::new();
    let pool = pool(&directory, config(1, 1_000)).await;
    let held = pool.acquire().await.unwrap();

    let order = Arc::new(parking_lot::Mutex::new(Vec::new()));
    let mut waiters = Vec::new();
    for n in 0..3 {
        let pool = pool.clone();
        let order = Arc::clone(&order);
        waiters.push(tokio::spawn(async move {
            let conn = pool.acquire().await.unwrap();
            order.lock().push(n);
            tokio::time::sleep(Duration::from_millis(5)).await;
            drop(conn);
        }));
        tokio::time::sleep(Duration::from_millis(1)).await;
    }

    drop(held);
    for waiter in waiters {
        waiter.await.unwrap();
    }
    assert_eq!(*order.lock(), vec![0, 1, 2]);
}

#[tokio::test(start_paused = true)]
async fn test_abandoned_acquire_does_not_lose_a_slot() {
    let directory = MockDirectory::new();
    let pool = pool(&directory, config(1, 1_000)).await;
    let held = pool.acquire().await.unwrap();

    let mut pending = tokio_test::task::spawn(pool.acquire());
    tokio_test::assert_pending!(pending.poll());
    drop(pending);

    assert!(
        tokio::time::timeout(Duration::from_millis(20), pool.acquire())
            .await
            .is_err()
    );

    drop(held);
    assert!(pool.try_acquire().unwrap().is_some());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_connections_are_exclusive_under_load() {
    init_tracing();
    let directory = MockDirectory::new();
    directory.set_operation_delay(Duration::from_millis(1));
    let pool = Pool::new(
        config(4, 5).acquire_timeout(Duration::from_secs(5)),
        directory.connector(),
    )
    .await
    .unwrap();

    let tasks: Vec<_> = (0..32)
        .map(|task| {
            let pool = pool.clone();
            tokio::spawn(async move {
                for n in 0..20 {
                    let pause = rand::thread_rng().gen_range(0..500u64);
                    tokio::time::sleep(Duration::from_micros(pause)).await;
                    let dn = format!("cn=t{task}-{n},dc=example,dc=org");
                    pool.delete(DeleteRequest::new(dn)).await.unwrap();
                }
            })
        })
        .collect();
    for task in tasks {
        task.await.unwrap();
    }

    assert_eq!(directory.operations().len(), 32 * 20);
    assert_eq!(directory.overlaps(), 0);
    assert_eq!(directory.dead_uses(), 0);
    assert!(directory.max_open() <= 4);
    assert_eq!(pool.status().in_use, 0);

    pool.close().await.unwrap();
    assert_eq!(directory.open(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_failing_heartbeats_under_load_never_leak_dead_connections() {
    init_tracing();
    let directory = MockDirectory::new();
    directory.set_operation_delay(Duration::from_millis(1));
    for id in 1..=64 {
        directory.fail_heartbeats_after(id, 1);
    }
    let pool = Pool::new(
        config(3, 2).acquire_timeout(Duration::from_secs(5)),
        directory.connector(),
    )
    .await
    .unwrap();

    let tasks: Vec<_> = (0..12)
        .map(|_| {
            let pool = pool.clone();
            tokio::spawn(async move {
                for _ in 0..10 {
                    let pause = rand::thread_rng().gen_range(0..3_000u64);
                    tokio::time::sleep(Duration::from_micros(pause)).await;
                    let _ = pool.search(SearchRequest::new("dc=example,dc=org", "(uid=*)")).await;
                }
            })
        })
        .collect();
    for task in tasks {
        task.await.unwrap();
    }

    assert_eq!(directory.dead_uses(), 0);
    assert_eq!(directory.overlaps(), 0);
    assert!(directory.max_open() <= 3);
    pool.close().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_unbounded_acquire_timeout_waits_for_a_release() {
    let directory = MockDirectory::new();
    let pool = pool(&directory, config(1, 1_000).acquire_timeout(Duration::MAX)).await;
    let held = pool.acquire().await.unwrap();

    let mut waiting = tokio_test::task::spawn(pool.acquire_timeout(Duration::MAX));
    tokio_test::assert_pending!(waiting.poll());
    tokio::time::sleep(Duration::from_secs(3_600)).await;
    tokio_test::assert_pending!(waiting.poll());

    drop(held);
    assert!(waiting.is_woken());
    let conn = tokio_test::assert_ready_ok!(waiting.poll());
    assert_eq!(conn.slot(), 0);
}

// =============================================================================
// Construction
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_total_initial_failure_fails_construction() {
    init_tracing();
    let directory = MockDirectory::new();
    directory.set_down(true);

    let err = Pool::new(config(3, 100), directory.connector())
        .await
        .unwrap_err();
    match err {
        PoolError::InitialConnect { attempted, source } => {
            assert_eq!(attempted, 3);
            assert!(source.is_connection_error());
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(directory.open(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_partial_initial_failure_is_repaired() {
    let directory = MockDirectory::new();
    directory.fail_next_connects(1);
    let pool = pool(&directory, config(3, 100)).await;

    let status = pool.status();
    assert_eq!(status.total, 2);
    assert_eq!(status.available, 2);

    tokio::time::sleep(Duration::from_millis(10)).await;
    let status = pool.status();
    assert_eq!(status.total, 3);
    assert_eq!(status.available, 3);
    assert_eq!(pool.metrics().connect_failures, 1);
}

#[tokio::test(start_paused = true)]
async fn test_incremental_population() {
    let directory = MockDirectory::new();
    directory.set_connect_delay(Duration::from_millis(50));
    let pool = pool(&directory, config(2, 100).eager_connect(false)).await;
    assert_eq!(pool.status().total, 0);

    let start = Instant::now();
    let conn = pool.acquire().await.unwrap();
    assert!(start.elapsed() >= Duration::from_millis(50));
    assert!(start.elapsed() < Duration::from_millis(100));
    drop(conn);

    assert_eq!(pool.status().total, 2);
    assert_eq!(directory.connects(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_incremental_pool_starts_without_server() {
    let directory = MockDirectory::new();
    directory.set_down(true);
    let pool = pool(&directory, config(1, 100).eager_connect(false)).await;

    assert!(matches!(
        pool.acquire_timeout(Duration::from_millis(150)).await,
        Err(PoolError::AcquisitionTimeout(_))
    ));

    directory.set_down(false);
    assert!(pool.acquire_timeout(Duration::from_millis(150)).await.is_ok());
}

#[tokio::test(start_paused = true)]
async fn test_bind_happens_iff_credentials_are_configured() {
    let anonymous = MockDirectory::new();
    let _pool = pool(&anonymous, config(2, 1_000)).await;
    assert!(anonymous.binds().is_empty());

    let directory = MockDirectory::new();
    let credentials = BindCredentials::new("cn=reader,dc=example,dc=org", "secret");
    let _pool = pool(&directory, config(2, 1_000).credentials(credentials)).await;
    assert_eq!(
        directory.binds(),
        vec![
            (1, "cn=reader,dc=example,dc=org".to_string()),
            (2, "cn=reader,dc=example,dc=org".to_string()),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_rejected_bind_closes_the_connection() {
    init_tracing();
    let directory = MockDirectory::new();
    directory.reject_binds(true);
    let credentials = BindCredentials::new("cn=reader,dc=example,dc=org", "wrong");

    let err = Pool::new(config(2, 100).credentials(credentials), directory.connector())
        .await
        .unwrap_err();
    assert!(matches!(
        err.client_error(),
        Some(ClientError::Authentication(_))
    ));
    assert_eq!(directory.connects(), 2);
    assert_eq!(directory.open(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_slow_bind_counts_as_connect_failure() {
    let directory = MockDirectory::new();
    directory.set_bind_delay(Duration::from_millis(150));
    let credentials = BindCredentials::new("cn=reader,dc=example,dc=org", "secret");
    let pool = pool(
        &directory,
        config(1, 100)
            .credentials(credentials)
            .connect_timeout(Duration::from_millis(100))
            .eager_connect(false),
    )
    .await;

    // Attempts at 0ms and 200ms connect but run out of time binding.
    tokio::time::sleep(Duration::from_millis(250)).await;
    assert_eq!(pool.status().total, 0);
    directory.set_bind_delay(Duration::ZERO);

    // The attempt at 400ms succeeds.
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(pool.status().available, 1);
    assert_eq!(pool.metrics().connect_failures, 2);
    assert_eq!(directory.closed(), vec![1, 2]);
    assert!(directory.dropped_open().is_empty());
    assert_eq!(
        directory.binds(),
        vec![(3, "cn=reader,dc=example,dc=org".to_string())]
    );
    assert_eq!(directory.open(), 1);
}

// =============================================================================
// Shutdown
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_close_fails_pending_and_later_calls() {
    let directory = MockDirectory::new();
    let pool = pool(&directory, config(1, 100)).await;
    let held = pool.acquire().await.unwrap();

    let waiter = {
        let pool = pool.clone();
        tokio::spawn(async move { pool.acquire_timeout(Duration::from_secs(10)).await })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;

    pool.close().await.unwrap();
    assert!(matches!(waiter.await.unwrap(), Err(PoolError::PoolClosed)));
    assert!(matches!(pool.acquire().await, Err(PoolError::PoolClosed)));
    assert!(matches!(
        pool.delete(DeleteRequest::new("cn=x")).await,
        Err(PoolError::PoolClosed)
    ));
    assert!(matches!(pool.close().await, Err(PoolError::PoolClosed)));

    // The connection a caller still held is closed when released.
    assert_eq!(directory.open(), 1);
    drop(held);
    tokio::time::sleep(Duration::from_millis(1)).await;
    assert_eq!(directory.open(), 0);
    assert_eq!(pool.status().total, 0);
    assert_eq!(pool.metrics().connections_closed, 1);
    assert!(directory.dropped_open().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_close_during_heartbeat_closes_the_connection() {
    let directory = MockDirectory::new();
    let pool = pool(&directory, config(1, 100)).await;
    directory.set_heartbeat_delay(1, Duration::from_secs(2));

    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(directory.heartbeats(1), 1);

    let start = Instant::now();
    pool.close().await.unwrap();
    assert!(start.elapsed() < Duration::from_millis(10));

    assert_eq!(directory.closed(), vec![1]);
    assert!(directory.dropped_open().is_empty());
    assert_eq!(directory.open(), 0);
    assert_eq!(pool.metrics().connections_closed, 1);
    assert_eq!(pool.status().total, 0);
}

#[tokio::test(start_paused = true)]
async fn test_close_during_reconnect_closes_the_new_connection() {
    let directory = MockDirectory::new();
    let pool = pool(&directory, config(1, 100)).await;
    directory.fail_heartbeats_after(1, 0);
    directory.set_connect_delay(Duration::from_millis(200));

    // The heartbeat at 100ms fails; the replacement connects at 300ms.
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(directory.closed(), vec![1]);

    let start = Instant::now();
    pool.close().await.unwrap();
    assert!(start.elapsed() >= Duration::from_millis(150));

    assert_eq!(directory.connects(), 2);
    assert_eq!(directory.closed(), vec![1, 2]);
    assert!(directory.dropped_open().is_empty());
    assert_eq!(directory.open(), 0);
    assert_eq!(pool.metrics().connections_closed, 2);
    assert_eq!(pool.status().total, 0);
}

#[tokio::test(start_paused = true)]
async fn test_dropping_the_pool_stops_watchers() {
    let directory = MockDirectory::new();
    let pool = pool(&directory, config(2, 100)).await;

    tokio::time::sleep(Duration::from_millis(250)).await;
    let heartbeats = directory.total_heartbeats();
    assert_eq!(heartbeats, 4);

    drop(pool);
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(directory.total_heartbeats(), heartbeats);
    assert_eq!(directory.open(), 0);
}

// =============================================================================
// Pass-through operations
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_operations_pass_results_through() {
    let directory = MockDirectory::new();
    let pool = pool(&directory, config(2, 1_000)).await;

    pool.add(AddRequest::new("uid=jdoe,dc=example,dc=org").attribute("cn", ["John Doe"]))
        .await
        .unwrap();
    pool.modify_dn(ModifyDnRequest::new(
        "uid=jdoe,dc=example,dc=org",
        "uid=jd",
        true,
    ))
    .await
    .unwrap();
    let result = pool
        .search_with_paging(SearchRequest::new("dc=example,dc=org", "(uid=*)"), 100)
        .await
        .unwrap();
    assert!(result.entries.is_empty());
    let changed = pool
        .password_modify(PasswordModifyRequest::default())
        .await
        .unwrap();
    assert!(changed.generated_password.is_none());

    let mut entry = SearchEntry {
        dn: "uid=jd,dc=example,dc=org".into(),
        ..Default::default()
    };
    entry.attributes.insert("cn".into(), vec!["John Doe".into()]);
    directory.respond_with(Response::Search(SearchResult {
        entries: vec![entry.clone()],
        ..Default::default()
    }));
    let result = pool
        .search(SearchRequest::new("dc=example,dc=org", "(uid=jd)"))
        .await
        .unwrap();
    assert_eq!(result.entries, vec![entry]);

    let names: Vec<_> = directory.operations().into_iter().map(|(_, name)| name).collect();
    assert_eq!(
        names,
        vec![
            "add",
            "modify_dn",
            "search_with_paging",
            "password_modify",
            "search"
        ]
    );
    assert_eq!(pool.status().available, 2);
}

#[tokio::test(start_paused = true)]
async fn test_operation_errors_are_returned_unchanged() {
    let directory = MockDirectory::new();
    let pool = pool(&directory, config(1, 1_000)).await;
    directory.fail_operations(68, "entry already exists");

    let err = pool
        .add(AddRequest::new("uid=jdoe,dc=example,dc=org"))
        .await
        .unwrap_err();
    match &err {
        PoolError::Operation(ClientError::Operation { code, message }) => {
            assert_eq!(*code, 68);
            assert_eq!(message, "entry already exists");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(!err.is_retryable());

    // The slot is released on the error path and nothing was retried.
    assert_eq!(pool.status().available, 1);
    assert_eq!(pool.slot_states(), vec![SlotState::Available]);
    assert_eq!(directory.operations().len(), 1);
}
