//! # Calculation Cache
//!
//! Maps a request [`Fingerprint`] to the response computed for it, for a
//! bounded time.
//!
//! ## Invariant
//!
//! An entry is never returned once its expiry has passed. Expired entries are
//! evicted lazily by the lookup that finds them; there is no background sweep.
//!
//! The cache is not tied to the rule registry. Registering a new rule version
//! does not invalidate answers computed under the old one; callers must call
//! [`CalculationCache::clear`] (as `Engine::register_rule` does).
//!
//! Each `clear` starts a new generation. A computation that began before the
//! clear stores its answer through [`CalculationCache::set_by_key_if_current`]
//! with the generation it started under, and the store is skipped if a clear
//! happened in between. This keeps an answer computed under a replaced rule
//! from reappearing after the clear.
//!
//! TTLs are capped at [`MAX_TTL`].
//!
//! Expiry uses `tokio::time::Instant` so tests can drive it with a paused
//! clock.

use std::collections::HashMap;
use std::time::Duration;

use fisc_core::{CanonicalizationError, Fingerprint, TaxCalculationRequest, TaxCalculationResponse};
use parking_lot::Mutex;
use tokio::time::Instant;

/// Default time-to-live: one hour.
pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

/// Longest TTL an entry can get: 365 days. Longer requests are clamped.
pub const MAX_TTL: Duration = Duration::from_secs(365 * 24 * 3600);

#[derive(Debug, Clone)]
struct CacheEntry {
    response: TaxCalculationResponse,
    expires_at: Instant,
}

#[derive(Debug, Default)]
struct Store {
    entries: HashMap<Fingerprint, CacheEntry>,
    generation: u64,
}

/// In-memory TTL cache of calculation responses.
#[derive(Debug)]
pub struct CalculationCache {
    store: Mutex<Store>,
    default_ttl: Duration,
}

impl Default for CalculationCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl CalculationCache {
    /// Empty cache with the given default TTL.
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            store: Mutex::new(Store::default()),
            default_ttl: default_ttl.min(MAX_TTL),
        }
    }

    /// TTL applied when `set` is called without one, after clamping to
    /// [`MAX_TTL`].
    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Cached response for `request`, if present and unexpired.
    ///
    /// # Errors
    ///
    /// Fails only if the request cannot be fingerprinted.
    pub fn get(
        &self,
        request: &TaxCalculationRequest,
    ) -> Result<Option<TaxCalculationResponse>, CanonicalizationError> {
        Ok(self.get_by_key(&request.fingerprint()?))
    }

    /// Store `response` for `request`, replacing any prior entry and resetting
    /// its expiry to `now + ttl` (or the default TTL). `ttl` is clamped to
    /// [`MAX_TTL`].
    ///
    /// # Errors
    ///
    /// Fails only if the request cannot be fingerprinted.
    pub fn set(
        &self,
        request: &TaxCalculationRequest,
        response: TaxCalculationResponse,
        ttl: Option<Duration>,
    ) -> Result<(), CanonicalizationError> {
        self.set_by_key(request.fingerprint()?, response, ttl);
        Ok(())
    }

    /// Lookup by precomputed fingerprint.
    pub fn get_by_key(&self, key: &Fingerprint) -> Option<TaxCalculationResponse> {
        let mut store = self.store.lock();
        let entries = &mut store.entries;
        match entries.get(key) {
            Some(entry) if Instant::now() < entry.expires_at => {
                tracing::debug!(fingerprint = %key, "cache hit");
                Some(entry.response.clone())
            }
            Some(_) => {
                entries.remove(key);
                tracing::debug!(fingerprint = %key, "cache entry expired; evicted");
                None
            }
            None => {
                tracing::debug!(fingerprint = %key, "cache miss");
                None
            }
        }
    }

    /// Store by precomputed fingerprint.
    pub fn set_by_key(
        &self,
        key: Fingerprint,
        response: TaxCalculationResponse,
        ttl: Option<Duration>,
    ) {
        let entry = self.entry(response, ttl);
        self.store.lock().entries.insert(key, entry);
    }

    /// Current generation; advanced by every [`clear`](Self::clear).
    pub fn generation(&self) -> u64 {
        self.store.lock().generation
    }

    /// Store by precomputed fingerprint unless the cache was cleared after
    /// `generation` was read. Returns whether the entry was stored.
    pub fn set_by_key_if_current(
        &self,
        key: Fingerprint,
        response: TaxCalculationResponse,
        ttl: Option<Duration>,
        generation: u64,
    ) -> bool {
        let entry = self.entry(response, ttl);
        let mut store = self.store.lock();
        if store.generation != generation {
            tracing::debug!(fingerprint = %key, "cache cleared during computation; not stored");
            return false;
        }
        store.entries.insert(key, entry);
        true
    }

    fn entry(&self, response: TaxCalculationResponse, ttl: Option<Duration>) -> CacheEntry {
        let ttl = ttl.unwrap_or(self.default_ttl).min(MAX_TTL);
        let now = Instant::now();
        CacheEntry {
            response,
            expires_at: now.checked_add(ttl).unwrap_or(now),
        }
    }

    /// Drop every entry and start a new generation.
    pub fn clear(&self) {
        let mut store = self.store.lock();
        let dropped = store.entries.len();
        store.entries.clear();
        store.generation = store.generation.wrapping_add(1);
        tracing::debug!(dropped, generation = store.generation, "cache cleared");
    }

    /// Stored entries, including expired ones not yet evicted.
    pub fn len(&self) -> usize {
        self.store.lock().entries.len()
    }

    /// True if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.store.lock().entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fisc_core::{Amount, Timestamp, TaxInput, WealthInput};
    use rust_decimal_macros::dec;

    fn request(net_worth: rust_decimal::Decimal) -> TaxCalculationRequest {
        TaxCalculationRequest::new(
            TaxInput::Wealth(WealthInput {
                net_worth: Amount::new(net_worth),
            }),
            2024,
        )
    }

    fn response(req: &TaxCalculationRequest, amount: rust_decimal::Decimal) -> TaxCalculationResponse {
        TaxCalculationResponse {
            amount: Amount::new(amount),
            details: req.input.clone(),
            source: "dgfip".into(),
            timestamp: Timestamp::parse("2024-03-01T10:00:00Z").unwrap(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn set_then_get_returns_identical_response() {
        let cache = CalculationCache::default();
        let req = request(dec!(1500000));
        let resp = response(&req, dec!(3900));
        cache.set(&req, resp.clone(), None).unwrap();
        assert_eq!(cache.get(&req).unwrap(), Some(resp));
    }

    #[tokio::test(start_paused = true)]
    async fn equal_requests_share_an_entry() {
        let cache = CalculationCache::default();
        let req = request(dec!(1500000));
        cache.set(&req, response(&req, dec!(3900)), None).unwrap();
        assert!(cache.get(&request(dec!(1500000.00))).unwrap().is_some());
        assert!(cache.get(&request(dec!(1500001))).unwrap().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn expires_after_default_ttl() {
        let cache = CalculationCache::default();
        let req = request(dec!(1500000));
        cache.set(&req, response(&req, dec!(3900)), None).unwrap();

        tokio::time::advance(DEFAULT_TTL - Duration::from_secs(1)).await;
        assert!(cache.get(&req).unwrap().is_some());

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(cache.get(&req).unwrap().is_none());
        assert!(cache.is_empty(), "expired entry evicted on lookup");
    }

    #[tokio::test(start_paused = true)]
    async fn explicit_ttl_overrides_default() {
        let cache = CalculationCache::default();
        let req = request(dec!(1500000));
        cache
            .set(&req, response(&req, dec!(3900)), Some(Duration::from_secs(5)))
            .unwrap();
        tokio::time::advance(Duration::from_secs(6)).await;
        assert!(cache.get(&req).unwrap().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn second_set_overwrites_and_resets_expiry() {
        let cache = CalculationCache::new(Duration::from_secs(10));
        let req = request(dec!(1500000));
        cache.set(&req, response(&req, dec!(1)), None).unwrap();
        tokio::time::advance(Duration::from_secs(8)).await;
        cache.set(&req, response(&req, dec!(2)), None).unwrap();
        tokio::time::advance(Duration::from_secs(8)).await;

        let hit = cache.get(&req).unwrap().unwrap();
        assert_eq!(hit.amount.value(), dec!(2));
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn expired_entries_are_not_swept_without_lookup() {
        let cache = CalculationCache::new(Duration::from_secs(1));
        let req = request(dec!(1500000));
        cache.set(&req, response(&req, dec!(1)), None).unwrap();
        tokio::time::advance(Duration::from_secs(5)).await;
        assert_eq!(cache.len(), 1);
        assert!(cache.get(&req).unwrap().is_none());
        assert_eq!(cache.len(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn clear_empties_store() {
        let cache = CalculationCache::default();
        let req = request(dec!(1500000));
        cache.set(&req, response(&req, dec!(3900)), None).unwrap();
        cache.clear();
        assert!(cache.get(&req).unwrap().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn oversized_ttl_is_clamped() {
        let cache = CalculationCache::default();
        let req = request(dec!(1500000));
        cache
            .set(&req, response(&req, dec!(3900)), Some(Duration::MAX))
            .unwrap();
        assert!(cache.get(&req).unwrap().is_some());

        tokio::time::advance(MAX_TTL).await;
        assert!(cache.get(&req).unwrap().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn oversized_default_ttl_is_clamped() {
        let cache = CalculationCache::new(Duration::from_secs(u64::MAX));
        assert_eq!(cache.default_ttl(), MAX_TTL);
        let req = request(dec!(1500000));
        cache.set(&req, response(&req, dec!(3900)), None).unwrap();
        assert!(cache.get(&req).unwrap().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn store_from_before_clear_is_skipped() {
        let cache = CalculationCache::default();
        let req = request(dec!(1500000));
        let key = req.fingerprint().unwrap();

        let started = cache.generation();
        cache.clear();
        assert!(!cache.set_by_key_if_current(key.clone(), response(&req, dec!(1)), None, started));
        assert!(cache.is_empty());

        let current = cache.generation();
        assert!(cache.set_by_key_if_current(key, response(&req, dec!(2)), None, current));
        assert_eq!(cache.get(&req).unwrap().unwrap().amount.value(), dec!(2));
    }
}
