//! Store-side metrics: query latency, row-lock waits and pool occupancy.

use metrics::{gauge, histogram};
use sqlx::PgPool;
use std::time::Instant;

/// Which serialization point a transaction waited on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockKind {
    /// `SELECT ... FOR UPDATE` on the event row.
    EventRow,
    /// `SELECT ... FOR UPDATE` on a registration row.
    RegistrationRow,
    /// `pg_advisory_xact_lock` on a global identity key.
    IdentityKey,
}

impl LockKind {
    fn label(self) -> &'static str {
        match self {
            LockKind::EventRow => "event_row",
            LockKind::RegistrationRow => "registration_row",
            LockKind::IdentityKey => "identity_key",
        }
    }
}

pub fn record_query_duration(query_name: &'static str, duration_secs: f64) {
    histogram!("database_query_duration_seconds", "query" => query_name).record(duration_secs);
}

/// Time spent blocked on a lock inside an admission or check-in transaction.
///
/// Under a registration rush the event row lock is the hot spot, so this is
/// the first place to look when submit latency climbs.
pub fn record_lock_wait(kind: LockKind, duration_secs: f64) {
    histogram!("database_lock_wait_seconds", "lock" => kind.label()).record(duration_secs);
}

/// Record connection pool occupancy. Called from the health endpoint.
pub fn record_pool_metrics(pool: &PgPool) {
    let size = pool.size() as usize;
    let idle = pool.num_idle();

    gauge!("database_connections_active").set(size.saturating_sub(idle) as f64);
    gauge!("database_connections_idle").set(idle as f64);
    gauge!("database_connections_total").set(size as f64);
    gauge!("database_connections_max").set(f64::from(pool.options().get_max_connections()));
}

/// Measures one repository operation from start to commit.
///
/// ```ignore
/// let timer = QueryTimer::new("cancel_registration");
/// // ... transaction ...
/// tx.commit().await?;
/// timer.record();
/// ```
///
/// Dropping the timer without calling `record` (an early `?` return) records
/// nothing, so the histogram only reflects completed operations.
pub struct QueryTimer {
    query_name: &'static str,
    start: Instant,
}

impl QueryTimer {
    pub fn new(query_name: &'static str) -> Self {
        Self {
            query_name,
            start: Instant::now(),
        }
    }

    pub fn record(self) {
        record_query_duration(self.query_name, self.start.elapsed().as_secs_f64());
    }
}

/// Measures a single lock acquisition.
pub struct LockTimer {
    kind: LockKind,
    start: Instant,
}

impl LockTimer {
    pub fn start(kind: LockKind) -> Self {
        Self {
            kind,
            start: Instant::now(),
        }
    }

    pub fn acquired(self) {
        record_lock_wait(self.kind, self.start.elapsed().as_secs_f64());
    }
}
