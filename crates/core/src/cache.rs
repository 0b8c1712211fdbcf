//! Transformation cache.
//!
//! Memoizes compiled replacement text keyed by the call site's source text
//! plus the option fields that influence code generation. Entries expire
//! lazily after a fixed TTL and the oldest insertion is evicted when the
//! cache is full.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::options::TransformOptions;

pub const DEFAULT_TTL: Duration = Duration::from_secs(60 * 60);
pub const DEFAULT_CAPACITY: usize = 1000;

/// The option fields that take part in the cache key. Anything else on
/// [`TransformOptions`] (callbacks, cache sizing) never does.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionsSnapshot {
    pub precompute: bool,
    pub development: bool,
    pub generate_styles: bool,
    pub import_source: String,
    pub config_path: Option<String>,
}

impl From<&TransformOptions> for OptionsSnapshot {
    fn from(options: &TransformOptions) -> Self {
        Self {
            precompute: options.precompute,
            development: options.development,
            generate_styles: options.generate_styles,
            import_source: options.import_source.clone(),
            config_path: options.config_path.clone(),
        }
    }
}

impl OptionsSnapshot {
    /// Stable text form: fields in declaration order, serialized as JSON.
    pub fn canonical(&self) -> String {
        // A struct of strings and bools always serializes.
        serde_json::to_string(self).unwrap_or_default()
    }
}

#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub input_text: String,
    pub output_text: String,
    pub timestamp: Instant,
    pub options: OptionsSnapshot,
    /// Tie-break for entries inserted within the same clock tick.
    seq: u64,
}

/// Running compile counters for one session.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Metrics {
    pub transform_count: u64,
    pub total_transform_time_ms: f64,
    pub average_transform_time_ms: f64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub errors: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub size: usize,
    pub capacity: usize,
    /// `hits / (hits + misses)`, `0` before the first lookup.
    pub hit_rate: f64,
    pub metrics: Metrics,
}

#[derive(Debug)]
pub struct TransformCache {
    entries: HashMap<String, CacheEntry>,
    capacity: usize,
    ttl: Duration,
    next_seq: u64,
    metrics: Metrics,
}

impl TransformCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            capacity,
            ttl: DEFAULT_TTL,
            next_seq: 0,
            metrics: Metrics::default(),
        }
    }

    pub fn key(source: &str, options: &TransformOptions) -> String {
        format!("{source}\0{}", OptionsSnapshot::from(options).canonical())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Change the capacity, evicting oldest entries down to the new bound.
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity;
        while self.entries.len() > self.capacity {
            self.evict_oldest();
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn set_ttl(&mut self, ttl: Duration) {
        self.ttl = ttl;
    }

    pub fn get(&mut self, source: &str, options: &TransformOptions) -> Option<String> {
        self.get_at(source, options, Instant::now())
    }

    pub fn get_at(
        &mut self,
        source: &str,
        options: &TransformOptions,
        now: Instant,
    ) -> Option<String> {
        self.get_with_at(source, options, now, |text| Some(text.to_string()))
    }

    /// Look up and decode an entry in one step. An entry `decode` rejects is
    /// corrupt: it is removed and the lookup counts as a miss.
    pub fn get_with<T>(
        &mut self,
        source: &str,
        options: &TransformOptions,
        decode: impl FnOnce(&str) -> Option<T>,
    ) -> Option<T> {
        self.get_with_at(source, options, Instant::now(), decode)
    }

    pub fn get_with_at<T>(
        &mut self,
        source: &str,
        options: &TransformOptions,
        now: Instant,
        decode: impl FnOnce(&str) -> Option<T>,
    ) -> Option<T> {
        let key = Self::key(source, options);
        let decoded = match self.entries.get(&key) {
            None => None,
            Some(entry) if now.saturating_duration_since(entry.timestamp) > self.ttl => {
                tracing::debug!(source = %entry.input_text, "cache entry expired");
                self.entries.remove(&key);
                None
            }
            Some(entry) => {
                let decoded = decode(&entry.output_text);
                if decoded.is_none() {
                    tracing::debug!(source = %entry.input_text, "dropping undecodable cache entry");
                    self.entries.remove(&key);
                }
                decoded
            }
        };

        if decoded.is_some() {
            self.metrics.cache_hits += 1;
        } else {
            self.metrics.cache_misses += 1;
        }
        decoded
    }

    pub fn set(&mut self, source: &str, output: String, options: &TransformOptions) {
        self.set_at(source, output, options, Instant::now());
    }

    pub fn set_at(&mut self, source: &str, output: String, options: &TransformOptions, now: Instant) {
        if self.capacity == 0 {
            return;
        }
        let key = Self::key(source, options);
        if !self.entries.contains_key(&key) {
            while self.entries.len() >= self.capacity {
                self.evict_oldest();
            }
        }
        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.insert(
            key,
            CacheEntry {
                input_text: source.to_string(),
                output_text: output,
                timestamp: now,
                options: options.into(),
                seq,
            },
        );
    }

    pub fn remove(&mut self, source: &str, options: &TransformOptions) -> Option<CacheEntry> {
        self.entries.remove(&Self::key(source, options))
    }

    fn evict_oldest(&mut self) {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|(_, entry)| (entry.timestamp, entry.seq))
            .map(|(key, _)| key.clone());
        if let Some(key) = oldest
            && let Some(entry) = self.entries.remove(&key)
        {
            tracing::debug!(source = %entry.input_text, "evicted oldest cache entry");
        }
    }

    /// Record one compile attempt, independent of the cache outcome.
    pub fn update_metrics(&mut self, duration_ms: f64, had_error: bool) {
        let m = &mut self.metrics;
        m.transform_count += 1;
        m.total_transform_time_ms += duration_ms;
        m.average_transform_time_ms = m.total_transform_time_ms / m.transform_count as f64;
        if had_error {
            m.errors += 1;
        }
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn reset_metrics(&mut self) {
        self.metrics = Metrics::default();
    }

    /// Drop every entry. Counters are kept.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn stats(&self) -> CacheStats {
        let lookups = self.metrics.cache_hits + self.metrics.cache_misses;
        let hit_rate = if lookups == 0 {
            0.0
        } else {
            self.metrics.cache_hits as f64 / lookups as f64
        };
        CacheStats {
            size: self.entries.len(),
            capacity: self.capacity,
            hit_rate,
            metrics: self.metrics.clone(),
        }
    }
}

impl Default for TransformCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::options::CompileFailure;

    fn opts() -> TransformOptions {
        TransformOptions::default()
    }

    #[test]
    fn roundtrip_and_counters() {
        let mut cache = TransformCache::new(4);
        assert!(cache.get("responsiveValue(24)", &opts()).is_none());
        cache.set("responsiveValue(24)", "out".into(), &opts());
        assert_eq!(cache.get("responsiveValue(24)", &opts()).as_deref(), Some("out"));

        let stats = cache.stats();
        assert_eq!(stats.size, 1);
        assert_eq!(stats.metrics.cache_hits, 1);
        assert_eq!(stats.metrics.cache_misses, 1);
        assert!((stats.hit_rate - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn hit_rate_is_zero_without_lookups() {
        let cache = TransformCache::new(4);
        assert_eq!(cache.stats().hit_rate, 0.0);
    }

    #[test]
    fn key_ignores_callbacks_and_cache_sizing() {
        let mut cache = TransformCache::new(4);
        let mut first = opts();
        first.on_error = Some(Arc::new(|_: &CompileFailure| {}));
        let mut second = opts();
        second.on_error = Some(Arc::new(|_: &CompileFailure| {}));
        second.cache_size = 7;
        second.enable_caching = false;

        cache.set("responsiveValue(24)", "out".into(), &first);
        assert_eq!(cache.get("responsiveValue(24)", &second).as_deref(), Some("out"));
        assert_eq!(
            TransformCache::key("x", &first),
            TransformCache::key("x", &second)
        );
    }

    #[test]
    fn key_tracks_codegen_options() {
        let base = opts();
        let mut dev = opts();
        dev.development = true;
        let mut other_source = opts();
        other_source.import_source = "other-runtime".into();
        let mut with_path = opts();
        with_path.config_path = Some("responsive.config.json".into());
        let mut no_styles = opts();
        no_styles.generate_styles = false;

        let key = TransformCache::key("x", &base);
        for changed in [dev, other_source, with_path, no_styles] {
            assert_ne!(TransformCache::key("x", &changed), key);
        }
        assert_ne!(TransformCache::key("y", &base), key);
    }

    #[test]
    fn evicts_oldest_insertions_first() {
        let capacity = 5;
        let extra = 3;
        let mut cache = TransformCache::new(capacity);
        for i in 0..capacity + extra {
            cache.set(&format!("src{i}"), format!("out{i}"), &opts());
        }
        assert_eq!(cache.len(), capacity);
        for i in 0..extra {
            assert!(cache.get(&format!("src{i}"), &opts()).is_none(), "src{i} should be gone");
        }
        for i in extra..capacity + extra {
            assert_eq!(cache.get(&format!("src{i}"), &opts()), Some(format!("out{i}")));
        }
    }

    #[test]
    fn eviction_ignores_access_recency() {
        let mut cache = TransformCache::new(2);
        cache.set("a", "1".into(), &opts());
        cache.set("b", "2".into(), &opts());
        // Reading "a" does not make it younger.
        assert!(cache.get("a", &opts()).is_some());
        cache.set("c", "3".into(), &opts());
        assert!(cache.get("a", &opts()).is_none());
        assert!(cache.get("b", &opts()).is_some());
    }

    #[test]
    fn overwriting_a_key_does_not_evict() {
        let mut cache = TransformCache::new(2);
        cache.set("a", "1".into(), &opts());
        cache.set("b", "2".into(), &opts());
        cache.set("a", "1b".into(), &opts());
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("a", &opts()).as_deref(), Some("1b"));
        assert_eq!(cache.get("b", &opts()).as_deref(), Some("2"));
    }

    #[test]
    fn shrinking_capacity_evicts_immediately() {
        let mut cache = TransformCache::new(4);
        for name in ["a", "b", "c", "d"] {
            cache.set(name, name.to_uppercase(), &opts());
        }
        cache.set_capacity(2);
        assert_eq!(cache.len(), 2);
        assert!(cache.get("a", &opts()).is_none());
        assert!(cache.get("b", &opts()).is_none());
        assert_eq!(cache.get("d", &opts()).as_deref(), Some("D"));
    }

    #[test]
    fn expired_entry_is_a_miss_and_is_removed() {
        let mut cache = TransformCache::new(4);
        let inserted = Instant::now();
        cache.set_at("src", "out".into(), &opts(), inserted);

        let at_ttl = inserted + cache.ttl();
        assert!(cache.get_at("src", &opts(), at_ttl).is_some());
        assert_eq!(cache.len(), 1);

        let after = inserted + cache.ttl() + Duration::from_millis(1);
        assert!(cache.get_at("src", &opts(), after).is_none());
        assert_eq!(cache.len(), 0);

        let metrics = cache.metrics();
        assert_eq!(metrics.cache_hits, 1);
        assert_eq!(metrics.cache_misses, 1);
    }

    #[test]
    fn undecodable_entry_counts_as_miss() {
        let mut cache = TransformCache::new(4);
        cache.set("src", "not json".into(), &opts());
        let decoded: Option<u32> =
            cache.get_with("src", &opts(), |text| serde_json::from_str(text).ok());
        assert!(decoded.is_none());
        assert!(cache.is_empty());
        assert_eq!(cache.metrics().cache_misses, 1);
        assert_eq!(cache.metrics().cache_hits, 0);
    }

    #[test]
    fn zero_capacity_stores_nothing() {
        let mut cache = TransformCache::new(0);
        cache.set("a", "1".into(), &opts());
        assert!(cache.is_empty());
    }

    #[test]
    fn metrics_track_compile_cost() {
        let mut cache = TransformCache::new(4);
        cache.update_metrics(2.0, false);
        cache.update_metrics(4.0, true);
        let m = cache.metrics();
        assert_eq!(m.transform_count, 2);
        assert_eq!(m.errors, 1);
        assert!((m.total_transform_time_ms - 6.0).abs() < f64::EPSILON);
        assert!((m.average_transform_time_ms - 3.0).abs() < f64::EPSILON);

        cache.reset_metrics();
        assert_eq!(cache.metrics(), &Metrics::default());
    }

    #[test]
    fn clear_keeps_counters() {
        let mut cache = TransformCache::new(4);
        cache.set("a", "1".into(), &opts());
        let _ = cache.get("a", &opts());
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.metrics().cache_hits, 1);
    }
}
