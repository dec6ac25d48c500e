//! A minimal in-memory metric registry.
//!
//! shardex only needs simple counters (materializations, rows processed) so
//! this is deliberately small: no export format, no histograms with
//! configurable buckets, just [`U64Counter`] behind a named [`Registry`].

use parking_lot::Mutex;
use std::{collections::BTreeMap, sync::Arc};

/// A monotonically increasing counter.
#[derive(Debug, Clone, Default)]
pub struct U64Counter {
    value: Arc<std::sync::atomic::AtomicU64>,
}

impl U64Counter {
    /// Increment the counter by one.
    pub fn inc(&self) {
        self.add(1);
    }

    /// Increment the counter by `delta`.
    pub fn add(&self, delta: u64) {
        self.value
            .fetch_add(delta, std::sync::atomic::Ordering::Relaxed);
    }

    /// Read the current value.
    pub fn get(&self) -> u64 {
        self.value.load(std::sync::atomic::Ordering::Relaxed)
    }
}

/// A named collection of counters, cheaply `Clone`-able and shared across
/// threads.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    counters: Arc<Mutex<BTreeMap<&'static str, U64Counter>>>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get or create the named counter.
    pub fn register_counter(&self, name: &'static str) -> U64Counter {
        self.counters
            .lock()
            .entry(name)
            .or_insert_with(U64Counter::default)
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_are_shared_by_name() {
        let registry = Registry::new();
        let a = registry.register_counter("loads");
        let b = registry.register_counter("loads");

        a.inc();
        b.add(4);

        assert_eq!(a.get(), 5);
        assert_eq!(b.get(), 5);
    }

    #[test]
    fn distinct_names_are_independent() {
        let registry = Registry::new();
        registry.register_counter("a").inc();
        assert_eq!(registry.register_counter("b").get(), 0);
    }
}
