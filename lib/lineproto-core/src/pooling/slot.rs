use std::{
    collections::VecDeque,
    fmt,
    sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError},
    time::{Duration, Instant},
};

use tracing::{debug, trace, warn};

use super::{metrics::PoolMetrics, Clearable, Exhausted, PointSource, PoolError, ReclaimStrategy, Shutdown};
use crate::data_model::{Point, PointData};

/// Sizing and timeout settings for a [`SlotPool`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SlotPoolSettings {
    capacity: usize,
    claim_timeout: Duration,
}

impl SlotPoolSettings {
    /// Creates a new `SlotPoolSettings`.
    pub const fn new(capacity: usize, claim_timeout: Duration) -> Self {
        Self {
            capacity,
            claim_timeout,
        }
    }

    /// Returns the number of items in the pool.
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns how long a claim waits for an item before failing.
    pub const fn claim_timeout(&self) -> Duration {
        self.claim_timeout
    }
}

/// A fixed-size, blocking object pool.
///
/// All items are created up front. When every item is claimed, further claims block until an item is reclaimed, or
/// fail with [`PoolError::Exhausted`] once the claim timeout passes. Reclaimed items are cleared before they can be
/// claimed again.
///
/// Cloning a `SlotPool` produces another handle to the same pool.
pub struct SlotPool<T> {
    strategy: Arc<SlotStrategy<T>>,
}

impl<T> SlotPool<T>
where
    T: Clearable + Default + Send + 'static,
{
    /// Creates a new `SlotPool` whose items are created with `T::default()`.
    pub fn new(name: impl Into<String>, settings: SlotPoolSettings) -> Self {
        Self::with_builder(name, settings, T::default)
    }
}

impl<T> SlotPool<T>
where
    T: Clearable + Send + 'static,
{
    /// Creates a new `SlotPool` whose items are created by calling `builder`.
    pub fn with_builder<B>(name: impl Into<String>, settings: SlotPoolSettings, builder: B) -> Self
    where
        B: Fn() -> T,
    {
        let name = name.into();
        let mut items = VecDeque::with_capacity(settings.capacity);
        items.extend((0..settings.capacity).map(|_| builder()));

        let metrics = PoolMetrics::new(&name);
        metrics.capacity().set(settings.capacity as f64);

        debug!(pool_name = %name, capacity = settings.capacity, claim_timeout = ?settings.claim_timeout, "Created object pool.");

        Self {
            strategy: Arc::new(SlotStrategy {
                name,
                settings,
                state: Mutex::new(SlotState { items, shutdown: false }),
                available: Condvar::new(),
                metrics,
            }),
        }
    }

    /// Claims an item, blocking until one is available.
    ///
    /// # Errors
    ///
    /// If no item becomes available within the claim timeout, [`PoolError::Exhausted`] is returned. If the pool is shut
    /// down, before or during the claim, [`PoolError::Shutdown`] is returned.
    pub fn claim(&self) -> Result<T, PoolError> {
        self.strategy.claim()
    }

    /// Returns a reclaim strategy that returns items to this pool.
    pub fn reclaimer(&self) -> Arc<dyn ReclaimStrategy<T>> {
        self.strategy.clone()
    }
}

impl<T> SlotPool<T> {
    /// Returns the name of the pool.
    pub fn name(&self) -> &str {
        &self.strategy.name
    }

    /// Returns the total number of items managed by the pool.
    pub fn capacity(&self) -> usize {
        self.strategy.settings.capacity
    }

    /// Returns the number of items currently waiting to be claimed.
    pub fn available(&self) -> usize {
        self.strategy.lock().items.len()
    }

    /// Returns `true` if the pool has been shut down.
    pub fn is_shutdown(&self) -> bool {
        self.strategy.lock().shutdown
    }

    /// Shuts down the pool.
    ///
    /// Pending and future claims fail with [`PoolError::Shutdown`], and the idle items are dropped. Items still claimed
    /// are dropped when they are reclaimed. Shutting down an already shut down pool does nothing.
    pub fn shutdown(&self) {
        let mut state = self.strategy.lock();
        if state.shutdown {
            return;
        }

        state.shutdown = true;
        state.items.clear();
        drop(state);

        self.strategy.available.notify_all();
        debug!(pool_name = %self.strategy.name, "Shut down object pool.");
    }
}

impl<T> Clone for SlotPool<T> {
    fn clone(&self) -> Self {
        Self {
            strategy: Arc::clone(&self.strategy),
        }
    }
}

impl<T> fmt::Debug for SlotPool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlotPool")
            .field("name", &self.strategy.name)
            .field("settings", &self.strategy.settings)
            .finish_non_exhaustive()
    }
}

impl PointSource for SlotPool<PointData> {
    fn acquire(&self) -> Result<Point, PoolError> {
        let data = self.claim()?;
        Ok(Point::from_data(self.reclaimer(), data))
    }
}

struct SlotState<T> {
    items: VecDeque<T>,
    shutdown: bool,
}

struct SlotStrategy<T> {
    name: String,
    settings: SlotPoolSettings,
    state: Mutex<SlotState<T>>,
    available: Condvar,
    metrics: PoolMetrics,
}

impl<T> SlotStrategy<T> {
    // A panic while holding the lock cannot leave the free list half-updated, so a poisoned lock is still usable.
    fn lock(&self) -> MutexGuard<'_, SlotState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn claim(&self) -> Result<T, PoolError> {
        // A timeout too large to represent as an instant never expires.
        let deadline = Instant::now().checked_add(self.settings.claim_timeout);
        let mut state = self.lock();

        loop {
            if state.shutdown {
                return Shutdown { pool_name: &self.name }.fail();
            }

            if let Some(item) = state.items.pop_back() {
                drop(state);

                self.metrics.acquired().increment(1);
                self.metrics.in_use().increment(1.0);
                return Ok(item);
            }

            let Some(deadline) = deadline else {
                state = self.available.wait(state).unwrap_or_else(PoisonError::into_inner);
                continue;
            };

            let now = Instant::now();
            if now >= deadline {
                drop(state);

                self.metrics.exhausted().increment(1);
                warn!(pool_name = %self.name, timeout = ?self.settings.claim_timeout, "Timed out waiting for an object pool item.");
                return Exhausted {
                    pool_name: &self.name,
                    timeout: self.settings.claim_timeout,
                }
                .fail();
            }

            state = self
                .available
                .wait_timeout(state, deadline - now)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
    }
}

impl<T: Clearable + Send> ReclaimStrategy<T> for SlotStrategy<T> {
    fn reclaim(&self, mut data: T) {
        data.clear();

        self.metrics.released().increment(1);
        self.metrics.in_use().decrement(1.0);

        let mut state = self.lock();
        if state.shutdown {
            trace!(pool_name = %self.name, "Dropping item reclaimed after shutdown.");
            return;
        }

        state.items.push_back(data);
        drop(state);

        self.available.notify_one();
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::mpsc, thread};

    use super::*;

    #[derive(Debug, Default, PartialEq)]
    struct Item(Vec<u32>);

    impl Clearable for Item {
        fn clear(&mut self) {
            self.0.clear();
        }
    }

    fn pool(capacity: usize, timeout: Duration) -> SlotPool<Item> {
        SlotPool::new("test", SlotPoolSettings::new(capacity, timeout))
    }

    #[test]
    fn claim_and_reclaim() {
        let pool = pool(2, Duration::from_millis(10));
        assert_eq!(pool.capacity(), 2);
        assert_eq!(pool.available(), 2);

        let a = pool.claim().unwrap();
        let b = pool.claim().unwrap();
        assert_eq!(pool.available(), 0);

        pool.reclaimer().reclaim(a);
        assert_eq!(pool.available(), 1);
        pool.reclaimer().reclaim(b);
        assert_eq!(pool.available(), 2);
    }

    #[test]
    fn reclaimed_items_are_cleared() {
        let pool = pool(1, Duration::from_millis(10));

        let mut item = pool.claim().unwrap();
        item.0.extend([1, 2, 3]);
        pool.reclaimer().reclaim(item);

        let item = pool.claim().unwrap();
        assert!(item.0.is_empty());
        assert!(item.0.capacity() >= 3);
    }

    #[test]
    fn exhausted_after_timeout() {
        let pool = pool(1, Duration::from_millis(20));
        let _held = pool.claim().unwrap();

        let started = Instant::now();
        match pool.claim() {
            Err(PoolError::Exhausted { pool_name, timeout }) => {
                assert_eq!(pool_name, "test");
                assert_eq!(timeout, Duration::from_millis(20));
            }
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(started.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn zero_timeout_fails_immediately() {
        let pool = pool(0, Duration::ZERO);
        assert!(matches!(pool.claim(), Err(PoolError::Exhausted { .. })));
    }

    #[test]
    fn blocked_claim_wakes_on_reclaim() {
        let pool = pool(1, Duration::from_secs(30));
        let held = pool.claim().unwrap();

        let (tx, rx) = mpsc::channel();
        let waiter = {
            let pool = pool.clone();
            thread::spawn(move || {
                tx.send(()).unwrap();
                pool.claim()
            })
        };

        rx.recv().unwrap();
        thread::sleep(Duration::from_millis(20));
        pool.reclaimer().reclaim(held);

        assert!(waiter.join().unwrap().is_ok());
    }

    #[test]
    fn shutdown_fails_pending_and_future_claims() {
        let pool = pool(1, Duration::from_secs(30));
        let held = pool.claim().unwrap();

        let waiter = {
            let pool = pool.clone();
            thread::spawn(move || pool.claim())
        };

        thread::sleep(Duration::from_millis(20));
        pool.shutdown();
        pool.shutdown();

        assert!(matches!(waiter.join().unwrap(), Err(PoolError::Shutdown { .. })));
        assert!(matches!(pool.claim(), Err(PoolError::Shutdown { .. })));
        assert!(pool.is_shutdown());

        // Late reclaims are dropped rather than refilling the pool.
        pool.reclaimer().reclaim(held);
        assert_eq!(pool.available(), 0);
    }

    #[test]
    fn items_from_builder() {
        let pool = SlotPool::with_builder("built", SlotPoolSettings::new(2, Duration::ZERO), || {
            Item(Vec::with_capacity(16))
        });
        assert_eq!(pool.name(), "built");

        let item = pool.claim().unwrap();
        assert!(item.0.capacity() >= 16);
    }
}
