use anyhow::Result;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use crate::db::KeyValueStore;

pub const DEFAULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Storage key plus the document field the payload lives under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheNamespace {
    pub key: &'static str,
    pub field: &'static str,
}

pub const MOVIE_CACHE: CacheNamespace = CacheNamespace {
    key: "movie_cache_v1",
    field: "movieList",
};

pub const GENRE_CACHE: CacheNamespace = CacheNamespace {
    key: "genre_cache_v1",
    field: "genreList",
};

pub trait Clock: Send + Sync {
    fn now_millis(&self) -> i64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// Why a stored document was discarded. Only ever logged.
#[derive(Debug, Error)]
enum CacheCorruption {
    #[error("not valid JSON: {0}")]
    NotJson(String),

    #[error("missing or non-numeric `ts`")]
    MissingTimestamp,

    #[error("missing `{0}` payload")]
    MissingPayload(&'static str),

    #[error("payload does not match the expected shape: {0}")]
    BadPayload(String),
}

/// Key-value persistence with a freshness window.
///
/// Documents are shaped `{"ts": <epoch ms>, "<field>": <payload>}`. A
/// document older than the TTL, missing, or unreadable reads as absent.
#[derive(Clone)]
pub struct CacheRepository {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
}

impl CacheRepository {
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            clock: Arc::new(SystemClock),
            ttl: DEFAULT_TTL,
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub const fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Fresh payload for the namespace, or `None` on a cold, stale, or corrupt entry.
    pub fn read<T: DeserializeOwned>(&self, namespace: CacheNamespace) -> Option<T> {
        let (ts, payload) = self.load(namespace)?;

        let age = self.clock.now_millis().saturating_sub(ts);
        let ttl_ms = i64::try_from(self.ttl.as_millis()).unwrap_or(i64::MAX);
        if age > ttl_ms {
            debug!(key = namespace.key, age_ms = age, "Cache entry expired");
            return None;
        }

        debug!(key = namespace.key, age_ms = age, "Cache hit");
        Some(payload)
    }

    /// Payload regardless of age. Corrupt or missing entries still read as `None`.
    pub fn read_stale<T: DeserializeOwned>(&self, namespace: CacheNamespace) -> Option<T> {
        self.load(namespace).map(|(_, payload)| payload)
    }

    /// Overwrites the namespace with `payload`, stamped with the current time.
    pub fn write<T: Serialize>(&self, namespace: CacheNamespace, payload: &T) -> Result<()> {
        let mut document = Map::new();
        document.insert("ts".to_string(), Value::from(self.clock.now_millis()));
        document.insert(namespace.field.to_string(), serde_json::to_value(payload)?);

        let raw = serde_json::to_string(&Value::Object(document))?;
        self.store.set(namespace.key, &raw)?;
        debug!(key = namespace.key, bytes = raw.len(), "Cache written");
        Ok(())
    }

    fn load<T: DeserializeOwned>(&self, namespace: CacheNamespace) -> Option<(i64, T)> {
        let Some(raw) = self.store.get(namespace.key) else {
            debug!(key = namespace.key, "Cache miss");
            return None;
        };

        match decode(&raw, namespace.field) {
            Ok(entry) => Some(entry),
            Err(reason) => {
                warn!(key = namespace.key, %reason, "Discarding corrupt cache entry");
                None
            }
        }
    }
}

fn decode<T: DeserializeOwned>(raw: &str, field: &'static str) -> Result<(i64, T), CacheCorruption> {
    let mut document: Value =
        serde_json::from_str(raw).map_err(|e| CacheCorruption::NotJson(e.to_string()))?;

    let ts = document
        .get("ts")
        .and_then(Value::as_i64)
        .ok_or(CacheCorruption::MissingTimestamp)?;

    let payload = document
        .get_mut(field)
        .map(Value::take)
        .filter(|v| !v.is_null())
        .ok_or(CacheCorruption::MissingPayload(field))?;

    let payload =
        serde_json::from_value(payload).map_err(|e| CacheCorruption::BadPayload(e.to_string()))?;

    Ok((ts, payload))
}
