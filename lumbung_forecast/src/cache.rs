//! Time-bounded in-memory cache for forecast results

use crate::models::ModelKind;
use crate::table::ForecastTable;
use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

/// A map whose entries expire a fixed time after insertion.
///
/// Every method has an `_at` variant taking the current instant so expiry can
/// be driven without sleeping.
#[derive(Debug, Clone)]
pub struct TtlCache<K, V> {
    ttl: Duration,
    entries: HashMap<K, (Instant, V)>,
}

impl<K: Eq + Hash, V: Clone> TtlCache<K, V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: HashMap::new(),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Cached value for `key` if it has not expired
    pub fn get(&mut self, key: &K) -> Option<V> {
        self.get_at(key, Instant::now())
    }

    pub fn get_at(&mut self, key: &K, now: Instant) -> Option<V> {
        let expired = match self.entries.get(key) {
            Some((inserted, value)) => {
                if now.saturating_duration_since(*inserted) < self.ttl {
                    return Some(value.clone());
                }
                true
            }
            None => false,
        };
        if expired {
            self.entries.remove(key);
        }
        None
    }

    pub fn insert(&mut self, key: K, value: V) {
        self.insert_at(key, value, Instant::now());
    }

    pub fn insert_at(&mut self, key: K, value: V, now: Instant) {
        self.entries.insert(key, (now, value));
    }

    /// Return the cached value or compute, store and return it.
    /// Errors are passed through and nothing is stored.
    pub fn get_or_try_insert_with<E, F>(&mut self, key: K, compute: F) -> Result<V, E>
    where
        F: FnOnce() -> Result<V, E>,
    {
        self.get_or_try_insert_with_at(key, Instant::now(), compute)
    }

    pub fn get_or_try_insert_with_at<E, F>(
        &mut self,
        key: K,
        now: Instant,
        compute: F,
    ) -> Result<V, E>
    where
        F: FnOnce() -> Result<V, E>,
    {
        if let Some(value) = self.get_at(&key, now) {
            return Ok(value);
        }
        let value = compute()?;
        self.insert_at(key, value.clone(), now);
        Ok(value)
    }

    /// Drop every expired entry, returning how many were removed
    pub fn purge_expired(&mut self) -> usize {
        self.purge_expired_at(Instant::now())
    }

    pub fn purge_expired_at(&mut self, now: Instant) -> usize {
        let before = self.entries.len();
        let ttl = self.ttl;
        self.entries
            .retain(|_, (inserted, _)| now.saturating_duration_since(*inserted) < ttl);
        before - self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of stored entries, expired ones included until purged
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Eq + Hash, V: Clone> Default for TtlCache<K, V> {
    /// One hour
    fn default() -> Self {
        Self::new(Duration::from_secs(3600))
    }
}

/// Identifies one forecast request
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ForecastKey {
    pub item_id: String,
    pub model: ModelKind,
    pub periods: usize,
}

impl ForecastKey {
    pub fn new(item_id: impl Into<String>, model: ModelKind, periods: usize) -> Self {
        Self {
            item_id: item_id.into(),
            model,
            periods,
        }
    }
}

/// Cache of forecast tables by request
pub type ForecastCache = TtlCache<ForecastKey, ForecastTable>;
