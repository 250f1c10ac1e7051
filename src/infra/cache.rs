//! Persistent on-disk cache for market prices with staleness tracking.

use std::{
    fmt, fs, io,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};
use tracing::{info, warn};

use crate::domain::PriceTable;

const CACHE_DIR: &str = "potion-craft-calculator";
const CACHE_FILENAME: &str = "prices_cache.json";

#[derive(Debug, Error)]
pub enum CacheError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serde(#[from] serde_json::Error),
    #[error("invalid cache timestamp: {0}")]
    Timestamp(String),
}

/// Snapshot of the price feed as written to disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceCache {
    /// RFC 3339 time of the fetch that produced `prices`.
    pub updated_at: String,
    pub prices: PriceTable,
}

impl PriceCache {
    /// Stamp a fresh snapshot with the current time.
    pub fn new(prices: PriceTable) -> Result<Self, CacheError> {
        Self::with_timestamp(prices, OffsetDateTime::now_utc())
    }

    pub fn with_timestamp(prices: PriceTable, updated_at: OffsetDateTime) -> Result<Self, CacheError> {
        let updated_at = updated_at
            .format(&Rfc3339)
            .map_err(|e| CacheError::Timestamp(e.to_string()))?;
        Ok(Self { updated_at, prices })
    }

    pub fn updated_at(&self) -> Result<OffsetDateTime, CacheError> {
        OffsetDateTime::parse(&self.updated_at, &Rfc3339)
            .map_err(|e| CacheError::Timestamp(e.to_string()))
    }

    /// Age of the snapshot; `None` when the timestamp cannot be read.
    pub fn age(&self) -> Option<Duration> {
        let updated_at = self.updated_at().ok()?;
        let elapsed = OffsetDateTime::now_utc() - updated_at;
        Some(Duration::from_secs(elapsed.whole_seconds().max(0) as u64))
    }

    /// A snapshot with an unreadable timestamp counts as expired.
    pub fn is_expired(&self, max_age: Duration) -> bool {
        self.age().map(|age| age >= max_age).unwrap_or(true)
    }

    pub fn age_string(&self) -> String {
        self.age()
            .map(format_age)
            .unwrap_or_else(|| "unknown".to_string())
    }
}

/// Freshness of the on-disk cache, for status displays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheState {
    Missing,
    Fresh { age: Duration, max_age: Duration },
    Expired { age: Duration },
    Unreadable(String),
}

impl fmt::Display for CacheState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheState::Missing => write!(f, "No price cache yet"),
            CacheState::Fresh { age, max_age } => write!(
                f,
                "Updated {} ago (~{} until refresh)",
                format_age(*age),
                format_age(max_age.saturating_sub(*age))
            ),
            CacheState::Expired { age } => write!(f, "Cache expired (updated {} ago)", format_age(*age)),
            CacheState::Unreadable(reason) => write!(f, "Cache unreadable: {reason}"),
        }
    }
}

/// Default cache location in the platform's local data directory.
pub fn default_cache_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CACHE_DIR)
        .join(CACHE_FILENAME)
}

/// Load the cache if the file exists.
pub fn load_price_cache(path: &Path) -> Result<Option<PriceCache>, CacheError> {
    if !path.exists() {
        info!("[cache] No price cache found at {}", path.display());
        return Ok(None);
    }

    let content = fs::read_to_string(path)?;
    let cache: PriceCache = serde_json::from_str(&content)?;
    info!(
        "[cache] Loaded prices for {} items from {} (age: {})",
        cache.prices.len(),
        path.display(),
        cache.age_string()
    );
    Ok(Some(cache))
}

pub fn save_price_cache(path: &Path, cache: &PriceCache) -> Result<(), CacheError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let content = serde_json::to_string_pretty(cache)?;
    fs::write(path, content)?;
    info!(
        "[cache] Saved prices for {} items to {}",
        cache.prices.len(),
        path.display()
    );
    Ok(())
}

pub fn cache_status(path: &Path, max_age: Duration) -> CacheState {
    match load_price_cache(path) {
        Ok(None) => CacheState::Missing,
        Ok(Some(cache)) => match cache.age() {
            Some(age) if age < max_age => CacheState::Fresh { age, max_age },
            Some(age) => CacheState::Expired { age },
            None => CacheState::Unreadable(format!("bad timestamp {:?}", cache.updated_at)),
        },
        Err(e) => {
            warn!("[cache] Failed to read price cache: {e}");
            CacheState::Unreadable(e.to_string())
        }
    }
}

pub(crate) fn format_age(age: Duration) -> String {
    let secs = age.as_secs();
    if secs < 60 {
        format!("{secs}s")
    } else if secs < 3600 {
        format!("{}m", secs / 60)
    } else if secs < 86400 {
        format!("{}h", secs / 3600)
    } else {
        format!("{}d", secs / 86400)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PriceQuote;

    const SIX_HOURS: Duration = Duration::from_secs(6 * 60 * 60);

    fn sample_prices() -> PriceTable {
        let mut prices = PriceTable::new();
        prices.entry("T5_EGG".to_string()).or_default().insert(
            "Martlock".to_string(),
            PriceQuote {
                sell_price_min: 42.0,
                ..PriceQuote::default()
            },
        );
        prices
    }

    fn hours_ago(hours: i64) -> OffsetDateTime {
        OffsetDateTime::now_utc() - time::Duration::hours(hours)
    }

    #[test]
    fn saved_cache_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CACHE_FILENAME);
        let cache = PriceCache::new(sample_prices()).unwrap();

        save_price_cache(&path, &cache).unwrap();
        let loaded = load_price_cache(&path).unwrap().unwrap();

        assert_eq!(loaded, cache);
        assert!(!loaded.is_expired(SIX_HOURS));
    }

    #[test]
    fn missing_file_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CACHE_FILENAME);
        assert!(load_price_cache(&path).unwrap().is_none());
        assert_eq!(cache_status(&path, SIX_HOURS), CacheState::Missing);
    }

    #[test]
    fn old_snapshot_is_expired() {
        let cache = PriceCache::with_timestamp(sample_prices(), hours_ago(7)).unwrap();
        assert!(cache.is_expired(SIX_HOURS));
        assert_eq!(cache.age_string(), "7h");

        let recent = PriceCache::with_timestamp(sample_prices(), hours_ago(2)).unwrap();
        assert!(!recent.is_expired(SIX_HOURS));
    }

    #[test]
    fn status_reports_fresh_and_expired() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CACHE_FILENAME);

        let recent = PriceCache::with_timestamp(sample_prices(), hours_ago(1)).unwrap();
        save_price_cache(&path, &recent).unwrap();
        let state = cache_status(&path, SIX_HOURS);
        assert!(matches!(state, CacheState::Fresh { .. }));
        assert!(state.to_string().starts_with("Updated 1h ago"));

        let old = PriceCache::with_timestamp(sample_prices(), hours_ago(30)).unwrap();
        save_price_cache(&path, &old).unwrap();
        let state = cache_status(&path, SIX_HOURS);
        assert!(matches!(state, CacheState::Expired { .. }));
        assert_eq!(state.to_string(), "Cache expired (updated 1d ago)");
    }

    #[test]
    fn garbage_file_is_unreadable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CACHE_FILENAME);
        fs::write(&path, "not json").unwrap();
        assert!(load_price_cache(&path).is_err());
        assert!(matches!(
            cache_status(&path, SIX_HOURS),
            CacheState::Unreadable(_)
        ));
    }

    #[test]
    fn bad_timestamp_counts_as_expired() {
        let cache = PriceCache {
            updated_at: "yesterday-ish".to_string(),
            prices: sample_prices(),
        };
        assert!(cache.age().is_none());
        assert!(cache.is_expired(SIX_HOURS));
    }
}
