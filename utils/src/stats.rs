//! Outcome counters of the classifiers and the flush.
//!
//! Each component names its counters with a small enum implementing
//! [`CounterKind`]; [`Counters`] holds one atomic per variant.

use std::fmt;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};

/// A closed set of counter names.
pub trait CounterKind: Copy + Eq + 'static {
    /// Every variant, in reporting order.
    const ALL: &'static [Self];

    fn name(self) -> &'static str;
}

/// One counter per [`CounterKind`] variant, shareable across flush threads.
pub struct Counters<K: CounterKind> {
    values: Vec<AtomicU64>,
    kind: PhantomData<K>,
}

impl<K: CounterKind> Counters<K> {
    pub fn new() -> Self {
        Self {
            values: K::ALL.iter().map(|_| AtomicU64::new(0)).collect(),
            kind: PhantomData,
        }
    }

    pub fn increment(&self, kind: K) {
        self.add(kind, 1);
    }

    pub fn add(&self, kind: K, value: u64) {
        if let Some(counter) = self.slot(kind) {
            counter.fetch_add(value, Ordering::Relaxed);
        }
    }

    pub fn get(&self, kind: K) -> u64 {
        self.slot(kind).map_or(0, |c| c.load(Ordering::Relaxed))
    }

    /// Current values in reporting order.
    pub fn snapshot(&self) -> Vec<(&'static str, u64)> {
        K::ALL.iter().map(|kind| (kind.name(), self.get(*kind))).collect()
    }

    fn slot(&self, kind: K) -> Option<&AtomicU64> {
        K::ALL
            .iter()
            .position(|k| *k == kind)
            .and_then(|i| self.values.get(i))
    }
}

impl<K: CounterKind> Default for Counters<K> {
    fn default() -> Self {
        Self::new()
    }
}

/// `name=value` pairs separated by spaces, for log lines.
impl<K: CounterKind> fmt::Display for Counters<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (name, value)) in self.snapshot().into_iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}={}", name, value)?;
        }
        Ok(())
    }
}

impl<K: CounterKind> fmt::Debug for Counters<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.snapshot()).finish()
    }
}
