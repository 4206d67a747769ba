// -------------------------------------------------------------------------------------------------
//  Copyright (C) 2015-2025 Nautech Systems Pty Ltd. All rights reserved.
//  https://nautechsystems.io
//
//  Licensed under the GNU Lesser General Public License Version 3.0 (the "License");
//  You may not use this file except in compliance with the License.
//  You may obtain a copy of the License at https://www.gnu.org/licenses/lgpl-3.0.en.html
//
//  Unless required by applicable law or agreed to in writing, software
//  distributed under the License is distributed on an "AS IS" BASIS,
//  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//  See the License for the specific language governing permissions and
//  limitations under the License.
// -------------------------------------------------------------------------------------------------

//! A read-through cache with per-entry TTL and in-flight coalescing.

use std::{
    fmt::{Debug, Formatter},
    future::Future,
    hash::Hash,
    sync::Arc,
    time::Duration,
};

use dashmap::{DashMap, mapref::entry::Entry};
use tokio::{sync::OnceCell, time::Instant};

type Slot<V> = Arc<OnceCell<(V, Instant)>>;

/// A keyed read-through cache whose entries live for a fixed TTL.
///
/// Concurrent misses for the same key share one initialization: the first caller runs its
/// `init` future and the others await the same cell. A failed or cancelled initialization
/// leaves the cell empty, so the next waiter (or a later caller) runs its own `init`.
/// Expired entries are replaced by a fresh cell and never mutated in place.
pub struct TtlCache<K, V> {
    ttl: Duration,
    entries: DashMap<K, Slot<V>, ahash::RandomState>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Creates a new empty [`TtlCache`] whose entries expire after `ttl`.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: DashMap::with_hasher(ahash::RandomState::new()),
        }
    }

    /// Returns the configured time to live.
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the cached value for `key` if present and not expired.
    #[must_use]
    pub fn get(&self, key: &K) -> Option<V> {
        let slot = self.entries.get(key)?;
        match slot.get() {
            Some((value, created)) if created.elapsed() < self.ttl => Some(value.clone()),
            _ => None,
        }
    }

    /// Returns the cached value for `key`, running `init` to populate it on a miss.
    ///
    /// # Errors
    ///
    /// Returns the error of `init` when this caller's initialization fails. The entry is left
    /// empty so a later call retries.
    pub async fn get_or_try_init<F, Fut, E>(&self, key: K, init: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        let slot = self.slot_for(key);
        let (value, _) = slot
            .get_or_try_init(|| async { init().await.map(|value| (value, Instant::now())) })
            .await?;
        Ok(value.clone())
    }

    /// Removes the entry for `key`. In-flight initializations complete into a detached cell.
    pub fn invalidate(&self, key: &K) {
        self.entries.remove(key);
    }

    /// Removes every entry.
    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Removes expired entries and abandoned empty cells, returning how many were removed.
    ///
    /// Cells still awaited by an in-flight initialization are kept.
    pub fn purge_expired(&self) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|_, slot| !(is_expired(slot, self.ttl) || is_abandoned(slot)));
        before.saturating_sub(self.entries.len())
    }

    /// Returns the number of entries, including in-flight and expired ones.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns whether the cache holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn slot_for(&self, key: K) -> Slot<V> {
        // The shard guard is released before any await
        match self.entries.entry(key) {
            Entry::Occupied(mut occupied) => {
                if is_expired(occupied.get(), self.ttl) {
                    let fresh = Arc::new(OnceCell::new());
                    occupied.insert(Arc::clone(&fresh));
                    fresh
                } else {
                    Arc::clone(occupied.get())
                }
            }
            Entry::Vacant(vacant) => {
                Arc::clone(vacant.insert(Arc::new(OnceCell::new())).value())
            }
        }
    }
}

fn is_expired<V>(slot: &OnceCell<(V, Instant)>, ttl: Duration) -> bool {
    slot.get().is_some_and(|(_, created)| created.elapsed() >= ttl)
}

// Only the map holds an empty cell once its initializations failed or were dropped
fn is_abandoned<V>(slot: &Slot<V>) -> bool {
    !slot.initialized() && Arc::strong_count(slot) == 1
}

impl<K, V> Debug for TtlCache<K, V>
where
    K: Eq + Hash,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct(stringify!(TtlCache))
            .field("ttl", &self.ttl)
            .field("len", &self.entries.len())
            .finish()
    }
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use futures::future::join_all;
    use rstest::rstest;

    use super::*;

    async fn counted_init(
        calls: &AtomicUsize,
        value: u64,
        delay: Duration,
    ) -> Result<u64, String> {
        calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(delay).await;
        Ok(value)
    }

    #[rstest]
    #[tokio::test(start_paused = true)]
    async fn test_concurrent_misses_are_coalesced() {
        let cache = TtlCache::<&str, u64>::new(Duration::from_secs(60));
        let calls = AtomicUsize::new(0);

        let results = join_all((0..10).map(|_| {
            cache.get_or_try_init("weth", || counted_init(&calls, 42, Duration::from_millis(50)))
        }))
        .await;

        assert!(results.iter().all(|result| *result == Ok(42)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&"weth"), Some(42));
    }

    #[rstest]
    #[tokio::test(start_paused = true)]
    async fn test_entries_expire_after_ttl() {
        let cache = TtlCache::<&str, u64>::new(Duration::from_secs(60));
        let calls = AtomicUsize::new(0);

        let first = cache
            .get_or_try_init("weth", || counted_init(&calls, 1, Duration::ZERO))
            .await;
        tokio::time::advance(Duration::from_secs(59)).await;
        let cached = cache
            .get_or_try_init("weth", || counted_init(&calls, 2, Duration::ZERO))
            .await;
        tokio::time::advance(Duration::from_secs(1)).await;
        let refreshed = cache
            .get_or_try_init("weth", || counted_init(&calls, 3, Duration::ZERO))
            .await;

        assert_eq!(first, Ok(1));
        assert_eq!(cached, Ok(1));
        assert_eq!(refreshed, Ok(3));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[rstest]
    #[tokio::test(start_paused = true)]
    async fn test_expired_entry_is_not_returned_by_get() {
        let cache = TtlCache::<&str, u64>::new(Duration::from_millis(10));
        let _ = cache
            .get_or_try_init("weth", || async { Ok::<_, String>(7) })
            .await;
        assert_eq!(cache.get(&"weth"), Some(7));

        tokio::time::advance(Duration::from_millis(10)).await;
        assert_eq!(cache.get(&"weth"), None);
    }

    #[rstest]
    #[tokio::test]
    async fn test_failed_init_leaves_entry_empty() {
        let cache = TtlCache::<&str, u64>::new(Duration::from_secs(60));

        let failed = cache
            .get_or_try_init("weth", || async { Err::<u64, _>("rpc down".to_string()) })
            .await;
        assert_eq!(failed, Err("rpc down".to_string()));
        assert_eq!(cache.get(&"weth"), None);

        let retried = cache
            .get_or_try_init("weth", || async { Ok::<_, String>(5) })
            .await;
        assert_eq!(retried, Ok(5));
    }

    #[rstest]
    #[tokio::test(start_paused = true)]
    async fn test_cancelled_init_leaves_entry_empty() {
        let cache = TtlCache::<&str, u64>::new(Duration::from_secs(60));
        let calls = AtomicUsize::new(0);

        let cancelled = tokio::time::timeout(
            Duration::from_millis(10),
            cache.get_or_try_init("weth", || counted_init(&calls, 1, Duration::from_secs(5))),
        )
        .await;
        assert!(cancelled.is_err());
        assert_eq!(cache.get(&"weth"), None);

        let value = cache
            .get_or_try_init("weth", || counted_init(&calls, 2, Duration::ZERO))
            .await;
        assert_eq!(value, Ok(2));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[rstest]
    #[tokio::test(start_paused = true)]
    async fn test_purge_expired_keeps_fresh_and_in_flight_entries() {
        let cache = TtlCache::<&str, u64>::new(Duration::from_secs(60));
        let calls = AtomicUsize::new(0);

        let _ = cache
            .get_or_try_init("usdc", || async { Ok::<_, String>(1) })
            .await;
        tokio::time::advance(Duration::from_secs(30)).await;
        let _ = cache
            .get_or_try_init("weth", || async { Ok::<_, String>(2) })
            .await;
        let _ = cache
            .get_or_try_init("dai", || async { Err::<u64, _>("reverted".to_string()) })
            .await;
        tokio::time::advance(Duration::from_secs(30)).await;

        let pending =
            cache.get_or_try_init("link", || counted_init(&calls, 3, Duration::from_secs(5)));
        tokio::pin!(pending);
        assert!(futures::poll!(&mut pending).is_pending());

        assert_eq!(cache.len(), 4);
        assert_eq!(cache.purge_expired(), 2);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(&"weth"), Some(2));
        assert_eq!(cache.get(&"usdc"), None);

        assert_eq!(pending.await, Ok(3));
        assert_eq!(cache.get(&"link"), Some(3));
    }

    #[rstest]
    #[tokio::test]
    async fn test_invalidate_and_clear() {
        let cache = TtlCache::<&str, u64>::new(Duration::from_secs(60));
        for key in ["usdc", "weth", "dai"] {
            let _ = cache
                .get_or_try_init(key, || async { Ok::<_, String>(1) })
                .await;
        }
        assert_eq!(cache.len(), 3);

        cache.invalidate(&"usdc");
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(&"usdc"), None);

        cache.clear();
        assert!(cache.is_empty());
    }
}
