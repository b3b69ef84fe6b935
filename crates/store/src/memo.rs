//! Single-entry memo cells for the selector graph.
//!
//! A cell recomputes only when its key differs from the cached one. Shared
//! branches (`Arc`) compare by pointer identity; plain values by equality.

use std::sync::Arc;

pub trait SameAs {
    fn same_as(&self, other: &Self) -> bool;
}

impl<T: ?Sized> SameAs for Arc<T> {
    fn same_as(&self, other: &Self) -> bool {
        Arc::ptr_eq(self, other)
    }
}

impl<T: SameAs> SameAs for Option<T> {
    fn same_as(&self, other: &Self) -> bool {
        match (self, other) {
            (Some(a), Some(b)) => a.same_as(b),
            (None, None) => true,
            _ => false,
        }
    }
}

macro_rules! same_by_value {
    ($($t:ty),*) => {
        $(impl SameAs for $t {
            fn same_as(&self, other: &Self) -> bool { self == other }
        })*
    };
}

same_by_value!(bool, usize, i64);

impl<A: SameAs, B: SameAs> SameAs for (A, B) {
    fn same_as(&self, other: &Self) -> bool {
        self.0.same_as(&other.0) && self.1.same_as(&other.1)
    }
}

impl<A: SameAs, B: SameAs, C: SameAs> SameAs for (A, B, C) {
    fn same_as(&self, other: &Self) -> bool {
        self.0.same_as(&other.0) && self.1.same_as(&other.1) && self.2.same_as(&other.2)
    }
}

#[derive(Debug)]
pub struct Memo<K, V> {
    cached: Option<(K, V)>,
    recomputations: usize,
}

impl<K, V> Default for Memo<K, V> {
    fn default() -> Self {
        Self { cached: None, recomputations: 0 }
    }
}

impl<K: SameAs, V: Clone> Memo<K, V> {
    pub fn get(&mut self, key: K, compute: impl FnOnce(&K) -> V) -> V {
        if let Some((cached_key, value)) = &self.cached {
            if cached_key.same_as(&key) {
                return value.clone();
            }
        }
        let value = compute(&key);
        self.recomputations += 1;
        self.cached = Some((key, value.clone()));
        value
    }

    pub fn recomputations(&self) -> usize {
        self.recomputations
    }
}
