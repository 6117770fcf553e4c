//! Worker pool and per-plan locks
//!
//! Bounds how many subscribers of one change are processed at once and
//! keeps the classify-record-apply sequence of a plan from interleaving
//! with another change touching the same plan.

use crate::error::PoolError;
use dashmap::DashMap;
use docsync_model::PlanId;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard, OwnedSemaphorePermit, Semaphore};

/// Pool statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Permits handed out
    pub dispatched: usize,
    /// Permits currently held
    pub active: usize,
    /// Work units finished successfully
    pub completed: usize,
    /// Work units that failed
    pub failed: usize,
}

/// Bounded pool of worker slots
#[derive(Debug)]
pub struct WorkerPool {
    max_workers: usize,
    permits: Arc<Semaphore>,
    stats: Arc<Mutex<PoolStats>>,
}

impl WorkerPool {
    /// Create a pool with `max_workers` slots (at least one)
    #[must_use]
    pub fn new(max_workers: usize) -> Self {
        let max_workers = max_workers.max(1);
        Self {
            max_workers,
            permits: Arc::new(Semaphore::new(max_workers)),
            stats: Arc::new(Mutex::new(PoolStats::default())),
        }
    }

    /// Wait for a free slot
    ///
    /// # Errors
    /// `PoolError::Closed` after [`WorkerPool::close`].
    pub async fn acquire(&self) -> Result<WorkerPermit, PoolError> {
        let permit = Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .map_err(|_| PoolError::Closed)?;

        {
            let mut stats = self.stats.lock();
            stats.dispatched += 1;
            stats.active += 1;
        }

        Ok(WorkerPermit {
            _permit: permit,
            stats: Arc::clone(&self.stats),
            finished: false,
        })
    }

    /// Refuse further acquisitions
    pub fn close(&self) {
        self.permits.close();
    }

    /// Slot count
    #[inline]
    #[must_use]
    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    /// Free slots right now
    #[inline]
    #[must_use]
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    /// Get pool statistics
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        self.stats.lock().clone()
    }
}

/// A held worker slot; released on drop
#[derive(Debug)]
pub struct WorkerPermit {
    _permit: OwnedSemaphorePermit,
    stats: Arc<Mutex<PoolStats>>,
    finished: bool,
}

impl WorkerPermit {
    /// Record the outcome of the work done under this permit
    pub fn finish(mut self, success: bool) {
        {
            let mut stats = self.stats.lock();
            if success {
                stats.completed += 1;
            } else {
                stats.failed += 1;
            }
        }
        self.finished = true;
    }
}

impl Drop for WorkerPermit {
    fn drop(&mut self) {
        let mut stats = self.stats.lock();
        stats.active = stats.active.saturating_sub(1);
        // Dropped without an outcome: the task panicked or was cancelled
        if !self.finished {
            stats.failed += 1;
        }
    }
}

/// One async mutex per plan
///
/// Entries live only while a task holds or waits for the plan; the last
/// guard out removes it.
#[derive(Debug, Default)]
pub struct PlanLocks {
    locks: Arc<DashMap<PlanId, Arc<AsyncMutex<()>>>>,
}

impl PlanLocks {
    /// Create an empty lock table
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to a plan
    pub async fn lock(&self, plan_id: PlanId) -> PlanGuard {
        let mutex = Arc::clone(self.locks.entry(plan_id).or_default().value());
        let guard = mutex.lock_owned().await;
        PlanGuard {
            plan_id,
            guard: Some(guard),
            locks: Arc::clone(&self.locks),
        }
    }

    /// Number of plans currently held or awaited
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    /// Whether no plan is held or awaited
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

/// Exclusive access to one plan, released on drop
#[derive(Debug)]
pub struct PlanGuard {
    plan_id: PlanId,
    guard: Option<OwnedMutexGuard<()>>,
    locks: Arc<DashMap<PlanId, Arc<AsyncMutex<()>>>>,
}

impl Drop for PlanGuard {
    fn drop(&mut self) {
        drop(self.guard.take());
        // Waiters hold their own clone of the mutex
        self.locks
            .remove_if(&self.plan_id, |_, mutex| Arc::strong_count(mutex) == 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn pool_bounds_concurrency() {
        let pool = Arc::new(WorkerPool::new(2));
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..6 {
            let pool = Arc::clone(&pool);
            let running = Arc::clone(&running);
            let peak = Arc::clone(&peak);
            handles.push(tokio::spawn(async move {
                let permit = pool.acquire().await.unwrap();
                let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(10)).await;
                running.fetch_sub(1, Ordering::SeqCst);
                permit.finish(true);
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert!(peak.load(Ordering::SeqCst) <= 2);
        let stats = pool.stats();
        assert_eq!(stats.dispatched, 6);
        assert_eq!(stats.completed, 6);
        assert_eq!(stats.active, 0);
        assert_eq!(pool.available(), 2);
    }

    #[tokio::test]
    async fn dropped_permit_counts_as_failed() {
        let pool = WorkerPool::new(1);
        let permit = pool.acquire().await.unwrap();
        assert_eq!(pool.stats().active, 1);
        drop(permit);

        let stats = pool.stats();
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.active, 0);
    }

    #[tokio::test]
    async fn closed_pool_refuses() {
        let pool = WorkerPool::new(1);
        pool.close();
        assert!(matches!(pool.acquire().await, Err(PoolError::Closed)));
    }

    #[test]
    fn zero_workers_clamped_to_one() {
        assert_eq!(WorkerPool::new(0).max_workers(), 1);
    }

    #[tokio::test]
    async fn plan_lock_is_exclusive_per_plan() {
        let locks = PlanLocks::new();
        let plan = PlanId::new();
        let other = PlanId::new();

        let guard = locks.lock(plan).await;

        // A different plan is not blocked
        let _other_guard = locks.lock(other).await;

        let blocked = tokio::time::timeout(Duration::from_millis(20), locks.lock(plan)).await;
        assert!(blocked.is_err());

        drop(guard);
        let reacquired = tokio::time::timeout(Duration::from_millis(200), locks.lock(plan)).await;
        assert!(reacquired.is_ok());
        assert_eq!(locks.len(), 2);
    }

    #[tokio::test]
    async fn released_plan_is_evicted() {
        let locks = Arc::new(PlanLocks::new());
        let plan = PlanId::new();

        let guard = locks.lock(plan).await;
        let waiter = tokio::spawn({
            let locks = Arc::clone(&locks);
            async move {
                let _guard = locks.lock(plan).await;
            }
        });
        tokio::time::sleep(Duration::from_millis(20)).await;

        // The waiter keeps the entry alive past the first release
        drop(guard);
        assert_eq!(locks.len(), 1);

        waiter.await.unwrap();
        assert!(locks.is_empty());
    }
}
