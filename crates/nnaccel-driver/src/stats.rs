//! Operation counters
//!
//! Every accelerator keeps lock-free counters of the operations it has
//! completed and the host time spent in them. Failed calls are not counted.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Operation classes tracked by [`OpCounters`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OpClass {
    Bind,
    Execute,
    VectorOp,
    Conversion,
    Prepare,
    Product,
}

/// Snapshot of an accelerator's operation counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OperationStats {
    /// Vectors bound to units
    pub binds: u64,
    /// Unit-to-unit executes
    pub executes: u64,
    /// Direct vector operations
    pub vector_ops: u64,
    /// Vector and matrix conversions
    pub conversions: u64,
    /// Matrices prepared
    pub prepares: u64,
    /// Matrix-vector products (prepared and one-shot)
    pub products: u64,
    /// Host time spent in the counted operations
    pub busy_time: Duration,
}

impl OperationStats {
    /// Sum of all counted operations
    pub fn total_ops(&self) -> u64 {
        self.binds + self.executes + self.vector_ops + self.conversions + self.prepares + self.products
    }

    /// Mean time per operation, `None` before the first one
    pub fn average_latency(&self) -> Option<Duration> {
        let total = self.total_ops();
        if total == 0 {
            return None;
        }
        let nanos = self.busy_time.as_nanos() / u128::from(total);
        Some(Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX)))
    }
}

#[derive(Debug, Default)]
pub(crate) struct OpCounters {
    binds: AtomicU64,
    executes: AtomicU64,
    vector_ops: AtomicU64,
    conversions: AtomicU64,
    prepares: AtomicU64,
    products: AtomicU64,
    busy_nanos: AtomicU64,
}

impl OpCounters {
    /// Count one completed operation started at `start`
    pub(crate) fn record(&self, class: OpClass, start: Instant) {
        let counter = match class {
            OpClass::Bind => &self.binds,
            OpClass::Execute => &self.executes,
            OpClass::VectorOp => &self.vector_ops,
            OpClass::Conversion => &self.conversions,
            OpClass::Prepare => &self.prepares,
            OpClass::Product => &self.products,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        let nanos = u64::try_from(start.elapsed().as_nanos()).unwrap_or(u64::MAX);
        self.busy_nanos.fetch_add(nanos, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> OperationStats {
        OperationStats {
            binds: self.binds.load(Ordering::Relaxed),
            executes: self.executes.load(Ordering::Relaxed),
            vector_ops: self.vector_ops.load(Ordering::Relaxed),
            conversions: self.conversions.load(Ordering::Relaxed),
            prepares: self.prepares.load(Ordering::Relaxed),
            products: self.products.load(Ordering::Relaxed),
            busy_time: Duration::from_nanos(self.busy_nanos.load(Ordering::Relaxed)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_counters_are_zero() {
        let stats = OpCounters::default().snapshot();
        assert_eq!(stats, OperationStats::default());
        assert_eq!(stats.total_ops(), 0);
        assert_eq!(stats.average_latency(), None);
    }

    #[test]
    fn record_counts_by_class() {
        let counters = OpCounters::default();
        let start = Instant::now();
        counters.record(OpClass::Execute, start);
        counters.record(OpClass::Execute, start);
        counters.record(OpClass::Product, start);
        let stats = counters.snapshot();
        assert_eq!(stats.executes, 2);
        assert_eq!(stats.products, 1);
        assert_eq!(stats.binds, 0);
        assert_eq!(stats.total_ops(), 3);
        assert!(stats.average_latency().is_some());
    }

    #[test]
    fn average_divides_busy_time() {
        let stats = OperationStats {
            executes: 4,
            busy_time: Duration::from_micros(40),
            ..OperationStats::default()
        };
        assert_eq!(stats.average_latency(), Some(Duration::from_micros(10)));
    }
}
