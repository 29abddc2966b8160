//! # Caching Module
//!
//! Fitness caches for challenges whose scoring is expensive. Elites survive
//! unchanged from one generation to the next and mutation often leaves a
//! genome untouched, so the same genome is scored many times in a run; with
//! model-backed estimates every one of those scores costs network inference.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::marker::PhantomData;
use std::sync::{Arc, Mutex, PoisonError};

use thread_local::ThreadLocal;

use crate::evolution::{CacheType, Challenge};
use crate::phenotype::Phenotype;

/// A phenotype that can be used as a cache key.
///
/// Two individuals with the same key must score identically.
pub trait CacheKey: Phenotype {
    type Key: Eq + Hash + Clone + Debug + Send + Sync;

    fn cache_key(&self) -> Self::Key;
}

/// A challenge wrapper backed by one mutex-protected cache shared by all
/// threads.
#[derive(Debug, Clone)]
pub struct CachedChallenge<P, C>
where
    P: CacheKey,
    C: Challenge<P>,
{
    challenge: C,
    cache: Arc<Mutex<HashMap<P::Key, f64>>>,
    _marker: PhantomData<P>,
}

impl<P, C> CachedChallenge<P, C>
where
    P: CacheKey,
    C: Challenge<P>,
{
    pub fn new(challenge: C) -> Self {
        Self {
            challenge,
            cache: Arc::new(Mutex::new(HashMap::new())),
            _marker: PhantomData,
        }
    }

    pub fn inner(&self) -> &C {
        &self.challenge
    }

    pub fn cache_size(&self) -> usize {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn clear_cache(&self) {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl<P, C> Challenge<P> for CachedChallenge<P, C>
where
    P: CacheKey,
    C: Challenge<P>,
{
    fn score(&self, phenotype: &P) -> f64 {
        let key = phenotype.cache_key();

        if let Some(score) = self
            .cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
        {
            return *score;
        }

        // Scored outside the lock so parallel workers don't serialize on it.
        let score = self.challenge.score(phenotype);
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, score);

        score
    }
}

/// One fitness cache per thread.
#[derive(Debug)]
pub struct ThreadLocalCache<K>
where
    K: Eq + Hash + Send,
{
    cache: ThreadLocal<RefCell<HashMap<K, f64>>>,
}

impl<K> ThreadLocalCache<K>
where
    K: Eq + Hash + Send,
{
    pub fn new() -> Self {
        Self {
            cache: ThreadLocal::new(),
        }
    }

    fn local(&self) -> &RefCell<HashMap<K, f64>> {
        self.cache.get_or(|| RefCell::new(HashMap::new()))
    }

    pub fn get(&self, key: &K) -> Option<f64> {
        self.local()
            .try_borrow()
            .ok()
            .and_then(|cache| cache.get(key).copied())
    }

    pub fn insert(&self, key: K, value: f64) {
        if let Ok(mut cache) = self.local().try_borrow_mut() {
            cache.insert(key, value);
        }
    }

    /// Clears the cache of the calling thread.
    pub fn clear(&self) {
        if let Ok(mut cache) = self.local().try_borrow_mut() {
            cache.clear();
        }
    }

    /// Entries cached by the calling thread.
    pub fn len(&self) -> usize {
        self.local().try_borrow().map_or(0, |cache| cache.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K> Default for ThreadLocalCache<K>
where
    K: Eq + Hash + Send,
{
    fn default() -> Self {
        Self::new()
    }
}

/// A challenge wrapper with a per-thread cache; no locking on the hot path.
#[derive(Debug, Clone)]
pub struct ThreadLocalCachedChallenge<P, C>
where
    P: CacheKey,
    C: Challenge<P>,
{
    challenge: C,
    cache: Arc<ThreadLocalCache<P::Key>>,
    _marker: PhantomData<P>,
}

impl<P, C> ThreadLocalCachedChallenge<P, C>
where
    P: CacheKey,
    C: Challenge<P>,
{
    pub fn new(challenge: C) -> Self {
        Self {
            challenge,
            cache: Arc::new(ThreadLocalCache::new()),
            _marker: PhantomData,
        }
    }

    pub fn inner(&self) -> &C {
        &self.challenge
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    pub fn cache_size(&self) -> usize {
        self.cache.len()
    }
}

impl<P, C> Challenge<P> for ThreadLocalCachedChallenge<P, C>
where
    P: CacheKey,
    C: Challenge<P>,
{
    fn score(&self, phenotype: &P) -> f64 {
        let key = phenotype.cache_key();

        if let Some(score) = self.cache.get(&key) {
            return score;
        }

        let score = self.challenge.score(phenotype);
        self.cache.insert(key, score);
        score
    }
}

/// Wraps `challenge` according to `cache_type`.
pub fn with_cache<P, C>(challenge: C, cache_type: CacheType) -> Box<dyn Challenge<P>>
where
    P: CacheKey + 'static,
    C: Challenge<P> + 'static,
{
    match cache_type {
        CacheType::None => Box::new(challenge),
        CacheType::Global => Box::new(CachedChallenge::new(challenge)),
        CacheType::ThreadLocal => Box::new(ThreadLocalCachedChallenge::new(challenge)),
    }
}
