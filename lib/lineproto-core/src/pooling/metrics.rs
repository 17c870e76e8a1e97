use metrics::{counter, gauge, Counter, Gauge, Label};

/// Telemetry for a single bounded pool, labelled by pool name.
#[derive(Clone)]
pub(super) struct PoolMetrics {
    acquired: Counter,
    released: Counter,
    exhausted: Counter,
    in_use: Gauge,
    capacity: Gauge,
}

impl PoolMetrics {
    pub fn new(pool_name: &str) -> Self {
        let labels = [Label::new("pool_name", pool_name.to_string())];

        Self {
            acquired: counter!("object_pool_acquired", labels.iter()),
            released: counter!("object_pool_released", labels.iter()),
            exhausted: counter!("object_pool_exhausted", labels.iter()),
            in_use: gauge!("object_pool_in_use", labels.iter()),
            capacity: gauge!("object_pool_capacity", labels.iter()),
        }
    }

    pub fn acquired(&self) -> &Counter {
        &self.acquired
    }

    pub fn released(&self) -> &Counter {
        &self.released
    }

    pub fn exhausted(&self) -> &Counter {
        &self.exhausted
    }

    pub fn in_use(&self) -> &Gauge {
        &self.in_use
    }

    pub fn capacity(&self) -> &Gauge {
        &self.capacity
    }
}

impl std::fmt::Debug for PoolMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PoolMetrics")
    }
}
