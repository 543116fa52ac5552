//! Bounded account-data cache with a time-to-live, injected into the reader.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use solana_sdk::pubkey::Pubkey;

#[derive(Default)]
struct Entries {
    data: HashMap<Pubkey, (Instant, Vec<u8>)>,
    /// Insertion order, oldest first.
    order: VecDeque<Pubkey>,
}

pub struct AccountCache {
    capacity: usize,
    ttl: Duration,
    entries: Mutex<Entries>,
}

impl AccountCache {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            capacity,
            ttl,
            entries: Mutex::new(Entries::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Entries> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Cached bytes for `address`, unless missing or older than the TTL.
    pub fn get(&self, address: &Pubkey) -> Option<Vec<u8>> {
        let mut entries = self.lock();
        let fresh = match entries.data.get(address) {
            Some((stored_at, _)) => stored_at.elapsed() < self.ttl,
            None => return None,
        };
        if fresh {
            return entries.data.get(address).map(|(_, data)| data.clone());
        }
        entries.data.remove(address);
        entries.order.retain(|a| a != address);
        None
    }

    /// Store `data`, evicting the oldest entry when full.
    pub fn insert(&self, address: Pubkey, data: Vec<u8>) {
        if self.capacity == 0 {
            return;
        }
        let mut entries = self.lock();
        if entries.data.insert(address, (Instant::now(), data)).is_some() {
            entries.order.retain(|a| *a != address);
        }
        entries.order.push_back(address);
        while entries.data.len() > self.capacity {
            match entries.order.pop_front() {
                Some(oldest) => {
                    entries.data.remove(&oldest);
                }
                None => break,
            }
        }
    }

    pub fn invalidate(&self, address: &Pubkey) {
        let mut entries = self.lock();
        entries.data.remove(address);
        entries.order.retain(|a| a != address);
    }

    pub fn len(&self) -> usize {
        self.lock().data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        let mut entries = self.lock();
        entries.data.clear();
        entries.order.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_within_ttl() {
        let cache = AccountCache::new(4, Duration::from_secs(60));
        let key = Pubkey::new_unique();
        cache.insert(key, vec![1, 2, 3]);
        assert_eq!(cache.get(&key), Some(vec![1, 2, 3]));
        assert_eq!(cache.get(&Pubkey::new_unique()), None);
    }

    #[test]
    fn test_zero_ttl_always_expires() {
        let cache = AccountCache::new(4, Duration::ZERO);
        let key = Pubkey::new_unique();
        cache.insert(key, vec![1]);
        assert_eq!(cache.get(&key), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_oldest_evicted_at_capacity() {
        let cache = AccountCache::new(2, Duration::from_secs(60));
        let (a, b, c) = (Pubkey::new_unique(), Pubkey::new_unique(), Pubkey::new_unique());
        cache.insert(a, vec![1]);
        cache.insert(b, vec![2]);
        cache.insert(a, vec![3]);
        cache.insert(c, vec![4]);
        assert_eq!(cache.len(), 2);
        // `a` was refreshed, so `b` is the oldest.
        assert_eq!(cache.get(&b), None);
        assert_eq!(cache.get(&a), Some(vec![3]));
        assert_eq!(cache.get(&c), Some(vec![4]));
    }

    #[test]
    fn test_invalidate_and_clear() {
        let cache = AccountCache::new(4, Duration::from_secs(60));
        let (a, b) = (Pubkey::new_unique(), Pubkey::new_unique());
        cache.insert(a, vec![1]);
        cache.insert(b, vec![2]);
        cache.invalidate(&a);
        assert_eq!(cache.get(&a), None);
        assert_eq!(cache.len(), 1);
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_zero_capacity_stores_nothing() {
        let cache = AccountCache::new(0, Duration::from_secs(60));
        cache.insert(Pubkey::new_unique(), vec![1]);
        assert!(cache.is_empty());
    }
}
