//! Caching of finished clause analyses.
//!
//! Repeated runs over the same contract, or contracts that share boilerplate
//! clauses, reuse enrichment instead of calling the provider again. Only
//! clauses whose three generators all succeeded are cached.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::time::Duration;

use covenant_core::{Clause, ClauseAnalysis, RiskLevel};
use moka::future::Cache;

use crate::config::CacheConfig;

/// Cache key: clause identity, content and assigned tier.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ClauseKey {
    clause_id: String,
    content_hash: u64,
    risk: RiskLevel,
}

impl ClauseKey {
    pub fn new(clause: &Clause) -> Self {
        let mut hasher = DefaultHasher::new();
        clause.content.hash(&mut hasher);
        clause.title.hash(&mut hasher);

        Self {
            clause_id: clause.id.clone(),
            content_hash: hasher.finish(),
            risk: clause.risk,
        }
    }
}

/// Clause analysis cache using moka.
#[derive(Clone)]
pub struct EnrichmentCache {
    cache: Cache<ClauseKey, ClauseAnalysis>,
}

impl EnrichmentCache {
    pub fn new(max_entries: u64, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_entries)
            .time_to_live(ttl)
            .build();

        Self { cache }
    }

    /// Build from config, `None` when caching is disabled.
    pub fn from_config(config: &CacheConfig) -> Option<Self> {
        config
            .enabled
            .then(|| Self::new(config.max_entries, config.ttl))
    }

    pub async fn get(&self, key: &ClauseKey) -> Option<ClauseAnalysis> {
        self.cache.get(key).await
    }

    pub async fn insert(&self, key: ClauseKey, analysis: ClauseAnalysis) {
        self.cache.insert(key, analysis).await;
    }

    pub fn invalidate_all(&self) {
        self.cache.invalidate_all();
    }

    /// Apply pending maintenance so counts reflect recent inserts.
    pub async fn sync(&self) {
        self.cache.run_pending_tasks().await;
    }

    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }
}

impl Default for EnrichmentCache {
    fn default() -> Self {
        let config = CacheConfig::default();
        Self::new(config.max_entries, config.ttl)
    }
}
