//! Thin asynchronous client for the Albion Online Data Project price API.
//!
//! - Fetches current order-book quotes per item and city, in batches.
//! - Fronts the on-disk cache: fresh cache first, network second, stale cache last.

use std::{
    future::Future,
    path::Path,
    time::{Duration, SystemTime},
};

use reqwest::{Client, Url};
use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::domain::{ItemId, PriceQuote, PriceTable};
use crate::infra::cache::{format_age, load_price_cache, save_price_cache, CacheError, PriceCache};
use crate::util::config::AppConfig;
use crate::util::version::user_agent;

#[derive(Debug, Error)]
pub enum AlbionClientError {
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("http request error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("api error: {0}")]
    Api(String),
    #[error("price cache error: {0}")]
    Cache(#[from] CacheError),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CacheStatus {
    /// Just fetched from the API.
    Fresh,
    /// Served from a cache younger than the configured max age.
    Cached,
    /// The API gave nothing; an expired cache was used instead.
    Stale,
}

#[derive(Clone, Debug)]
pub struct PricesPayload {
    pub prices: PriceTable,
    pub status: CacheStatus,
    pub fetched_at: Option<SystemTime>,
}

/// Anything that can produce current quotes for a list of items.
pub trait PriceFetcher {
    fn fetch_all(
        &self,
        item_ids: &[ItemId],
    ) -> impl Future<Output = Result<PriceTable, AlbionClientError>> + Send;
}

#[derive(Clone)]
pub struct AlbionClient {
    http: Client,
    base_url: Url,
    locations: Vec<String>,
    quality: u8,
    batch_size: usize,
    batch_delay: Duration,
}

impl AlbionClient {
    pub fn new(config: &AppConfig) -> Result<Self, AlbionClientError> {
        let base_url = Url::parse(&config.api_base_url)?;
        let http = Client::builder()
            .user_agent(user_agent())
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            http,
            base_url,
            locations: config.locations.clone(),
            quality: config.quality,
            batch_size: config.batch_size.max(1),
            batch_delay: Duration::from_millis(config.batch_delay_ms),
        })
    }

    /// One request for up to `batch_size` items.
    pub async fn fetch_prices(&self, item_ids: &[ItemId]) -> Result<PriceTable, AlbionClientError> {
        if item_ids.is_empty() {
            return Ok(PriceTable::new());
        }

        let url = self.prices_url(item_ids)?;
        let records: Vec<PriceRecordDto> = self
            .http
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(price_table_from_records(records))
    }

    fn prices_url(&self, item_ids: &[ItemId]) -> Result<Url, AlbionClientError> {
        let mut url = self.base_url.join(&item_ids.join(","))?;
        url.query_pairs_mut()
            .append_pair("locations", &self.locations.join(","))
            .append_pair("qualities", &self.quality.to_string());
        Ok(url)
    }
}

impl PriceFetcher for AlbionClient {
    async fn fetch_all(&self, item_ids: &[ItemId]) -> Result<PriceTable, AlbionClientError> {
        let prices = fetch_in_batches(item_ids, self.batch_size, self.batch_delay, |batch| {
            self.fetch_prices(batch)
        })
        .await;
        Ok(prices)
    }
}

/// Runs `fetch_batch` over chunks of `batch_size` ids, pausing `delay` between chunks.
/// A failed chunk is logged and skipped; the others are merged.
async fn fetch_in_batches<'a, F, Fut>(
    item_ids: &'a [ItemId],
    batch_size: usize,
    delay: Duration,
    mut fetch_batch: F,
) -> PriceTable
where
    F: FnMut(&'a [ItemId]) -> Fut,
    Fut: Future<Output = Result<PriceTable, AlbionClientError>>,
{
    let batch_size = batch_size.max(1);
    let mut all_prices = PriceTable::new();
    let batches: Vec<&'a [ItemId]> = item_ids.chunks(batch_size).collect();

    for (index, batch) in batches.iter().enumerate() {
        let first = index * batch_size + 1;
        info!(
            "[prices] Loading items {}-{} of {}...",
            first,
            first + batch.len() - 1,
            item_ids.len()
        );
        match fetch_batch(*batch).await {
            Ok(prices) => all_prices.extend(prices),
            Err(e) => warn!("[prices] Batch starting at item {first} failed: {e}"),
        }
        if index + 1 < batches.len() {
            tokio::time::sleep(delay).await;
        }
    }

    all_prices
}

/// Cache-or-fetch: a cache younger than `max_age` wins unless `force_refresh`;
/// otherwise fetch and store, and fall back to any cache if the fetch yields nothing.
pub async fn load_prices<F: PriceFetcher>(
    fetcher: &F,
    cache_path: &Path,
    item_ids: &[ItemId],
    max_age: Duration,
    force_refresh: bool,
) -> Result<PricesPayload, AlbionClientError> {
    let cached = match load_price_cache(cache_path) {
        Ok(cache) => cache,
        Err(e) => {
            warn!("[cache] Ignoring unreadable price cache: {e}");
            None
        }
    };

    if !force_refresh {
        if let Some(cache) = cached.as_ref().filter(|c| !c.is_expired(max_age)) {
            info!("[prices] Using cached prices (age: {})", cache.age_string());
            return Ok(payload_from_cache(cache.clone(), CacheStatus::Cached));
        }
        if let Some(cache) = cached.as_ref() {
            info!("[prices] Cache expired (age: {}), refreshing...", cache.age_string());
        }
    }

    info!("[prices] Fetching prices for {} items from API...", item_ids.len());
    let fetched = match fetcher.fetch_all(item_ids).await {
        Ok(prices) => prices,
        Err(e) => {
            warn!("[prices] Price fetch failed: {e}");
            PriceTable::new()
        }
    };

    if !fetched.is_empty() {
        let snapshot = PriceCache::new(fetched)?;
        if let Err(e) = save_price_cache(cache_path, &snapshot) {
            warn!("[cache] Failed to save price cache: {e}");
        }
        info!("[prices] Updated prices for {} items", snapshot.prices.len());
        return Ok(PricesPayload {
            prices: snapshot.prices,
            status: CacheStatus::Fresh,
            fetched_at: Some(SystemTime::now()),
        });
    }

    if let Some(cache) = cached {
        warn!("[prices] No prices from API; using stale cache (age: {})", cache.age_string());
        return Ok(payload_from_cache(cache, CacheStatus::Stale));
    }

    Err(AlbionClientError::Api("no prices available".to_string()))
}

impl PricesPayload {
    /// Time since these prices left the API, when known.
    pub fn age(&self) -> Option<Duration> {
        self.fetched_at
            .and_then(|at| SystemTime::now().duration_since(at).ok())
    }

    /// One-line note on where the prices came from and how old they are.
    pub fn freshness(&self) -> String {
        let age = self
            .age()
            .map(format_age)
            .unwrap_or_else(|| "unknown".to_string());
        match self.status {
            CacheStatus::Fresh => "Prices fetched from the API just now".to_string(),
            CacheStatus::Cached => format!("Prices from cache, updated {age} ago"),
            CacheStatus::Stale => {
                format!("Warning: API returned no prices; using stale cache updated {age} ago")
            }
        }
    }
}

fn payload_from_cache(cache: PriceCache, status: CacheStatus) -> PricesPayload {
    let fetched_at = cache.age().and_then(|age| SystemTime::now().checked_sub(age));
    PricesPayload {
        prices: cache.prices,
        status,
        fetched_at,
    }
}

#[derive(Debug, Deserialize)]
struct PriceRecordDto {
    #[serde(default)]
    item_id: Option<String>,
    #[serde(default)]
    city: Option<String>,
    #[serde(default)]
    buy_price_max: Option<f64>,
    #[serde(default)]
    sell_price_min: Option<f64>,
    #[serde(default)]
    buy_price_min: Option<f64>,
    #[serde(default)]
    sell_price_max: Option<f64>,
}

impl From<&PriceRecordDto> for PriceQuote {
    fn from(dto: &PriceRecordDto) -> Self {
        Self {
            buy_price_max: dto.buy_price_max.unwrap_or(0.0),
            sell_price_min: dto.sell_price_min.unwrap_or(0.0),
            buy_price_min: dto.buy_price_min.unwrap_or(0.0),
            sell_price_max: dto.sell_price_max.unwrap_or(0.0),
        }
    }
}

fn price_table_from_records(records: Vec<PriceRecordDto>) -> PriceTable {
    let mut prices = PriceTable::new();
    for record in records {
        let quote = PriceQuote::from(&record);
        let (Some(item_id), Some(city)) = (record.item_id, record.city) else {
            continue;
        };
        if item_id.is_empty() || city.is_empty() {
            continue;
        }
        prices.entry(item_id).or_default().insert(city, quote);
    }
    prices
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    const SIX_HOURS: Duration = Duration::from_secs(6 * 60 * 60);

    struct StubFetcher {
        prices: PriceTable,
        calls: AtomicUsize,
    }

    impl StubFetcher {
        fn returning(prices: PriceTable) -> Self {
            Self {
                prices,
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl PriceFetcher for StubFetcher {
        async fn fetch_all(&self, _item_ids: &[ItemId]) -> Result<PriceTable, AlbionClientError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.prices.clone())
        }
    }

    fn table(item: &str, sell: f64) -> PriceTable {
        let mut prices = PriceTable::new();
        prices.entry(item.to_string()).or_default().insert(
            "Caerleon".to_string(),
            PriceQuote {
                sell_price_min: sell,
                ..PriceQuote::default()
            },
        );
        prices
    }

    fn ids() -> Vec<ItemId> {
        vec!["T5_EGG".to_string()]
    }

    #[test]
    fn records_group_by_item_and_city() {
        let records: Vec<PriceRecordDto> = serde_json::from_str(
            r#"[
                {"item_id": "T5_EGG", "city": "Martlock", "quality": 1,
                 "sell_price_min": 25, "sell_price_min_date": "2024-05-01T10:00:00",
                 "buy_price_max": 20},
                {"item_id": "T5_EGG", "city": "Caerleon", "sell_price_min": 30},
                {"item_id": "", "city": "Caerleon", "sell_price_min": 1},
                {"city": "Lymhurst", "sell_price_min": 1}
            ]"#,
        )
        .unwrap();

        let prices = price_table_from_records(records);
        assert_eq!(prices.len(), 1);
        let eggs = &prices["T5_EGG"];
        assert_eq!(eggs.len(), 2);
        assert_eq!(eggs["Martlock"].sell_price_min, 25.0);
        assert_eq!(eggs["Martlock"].buy_price_max, 20.0);
        assert_eq!(eggs["Martlock"].buy_price_min, 0.0);
    }

    #[test]
    fn url_lists_items_locations_and_quality() {
        let client = AlbionClient::new(&AppConfig::default()).unwrap();
        let url = client
            .prices_url(&["T5_EGG".to_string(), "T4_MILK".to_string()])
            .unwrap();
        assert!(url.path().ends_with("/prices/T5_EGG,T4_MILK"));
        let query = url.query().unwrap_or_default();
        assert!(query.contains("locations=Caerleon%2CBridgewatch"));
        assert!(query.contains("qualities=1"));
    }

    #[tokio::test]
    async fn batches_merge_around_a_failed_chunk() {
        let item_ids: Vec<ItemId> = (1..=5).map(|n| format!("T4_ITEM_{n}")).collect();
        let delay = Duration::from_millis(5);
        let mut calls = 0;
        let started = std::time::Instant::now();

        let prices = fetch_in_batches(&item_ids, 2, delay, |batch| {
            calls += 1;
            let result = if calls == 2 {
                Err(AlbionClientError::Api("batch rejected".to_string()))
            } else {
                let mut merged = PriceTable::new();
                for id in batch {
                    merged.extend(table(id, 1.0));
                }
                Ok(merged)
            };
            std::future::ready(result)
        })
        .await;

        assert_eq!(calls, 3);
        assert!(started.elapsed() >= delay * 2);
        let mut fetched: Vec<&str> = prices.keys().map(String::as_str).collect();
        fetched.sort_unstable();
        assert_eq!(fetched, ["T4_ITEM_1", "T4_ITEM_2", "T4_ITEM_5"]);
    }

    #[tokio::test]
    async fn fresh_cache_skips_the_network() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prices.json");
        save_price_cache(&path, &PriceCache::new(table("T5_EGG", 10.0)).unwrap()).unwrap();
        let fetcher = StubFetcher::returning(table("T5_EGG", 99.0));

        let payload = load_prices(&fetcher, &path, &ids(), SIX_HOURS, false)
            .await
            .unwrap();

        assert_eq!(payload.status, CacheStatus::Cached);
        assert_eq!(payload.prices["T5_EGG"]["Caerleon"].sell_price_min, 10.0);
        assert_eq!(fetcher.calls(), 0);
    }

    #[tokio::test]
    async fn cached_payload_reports_its_age() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prices.json");
        let cache = PriceCache::with_timestamp(
            table("T5_EGG", 10.0),
            time::OffsetDateTime::now_utc() - time::Duration::hours(3),
        )
        .unwrap();
        save_price_cache(&path, &cache).unwrap();
        let fetcher = StubFetcher::returning(PriceTable::new());

        let payload = load_prices(&fetcher, &path, &ids(), SIX_HOURS, false)
            .await
            .unwrap();

        assert!(payload.age().unwrap() >= Duration::from_secs(3 * 60 * 60));
        assert_eq!(payload.freshness(), "Prices from cache, updated 3h ago");
    }

    #[tokio::test]
    async fn forced_refresh_fetches_and_saves() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prices.json");
        save_price_cache(&path, &PriceCache::new(table("T5_EGG", 10.0)).unwrap()).unwrap();
        let fetcher = StubFetcher::returning(table("T5_EGG", 99.0));

        let payload = load_prices(&fetcher, &path, &ids(), SIX_HOURS, true)
            .await
            .unwrap();

        assert_eq!(payload.status, CacheStatus::Fresh);
        assert_eq!(fetcher.calls(), 1);
        assert_eq!(payload.freshness(), "Prices fetched from the API just now");
        let saved = load_price_cache(&path).unwrap().unwrap();
        assert_eq!(saved.prices["T5_EGG"]["Caerleon"].sell_price_min, 99.0);
    }

    #[tokio::test]
    async fn empty_fetch_falls_back_to_stale_cache() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prices.json");
        let old = PriceCache::with_timestamp(
            table("T5_EGG", 10.0),
            time::OffsetDateTime::now_utc() - time::Duration::hours(48),
        )
        .unwrap();
        save_price_cache(&path, &old).unwrap();
        let fetcher = StubFetcher::returning(PriceTable::new());

        let payload = load_prices(&fetcher, &path, &ids(), SIX_HOURS, false)
            .await
            .unwrap();

        assert_eq!(payload.status, CacheStatus::Stale);
        assert_eq!(payload.prices["T5_EGG"]["Caerleon"].sell_price_min, 10.0);
        assert_eq!(fetcher.calls(), 1);
        assert!(payload.freshness().starts_with("Warning: API returned no prices"));
        assert!(payload.freshness().ends_with("updated 2d ago"));
    }

    #[tokio::test]
    async fn nothing_anywhere_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prices.json");
        let fetcher = StubFetcher::returning(PriceTable::new());

        let result = load_prices(&fetcher, &path, &ids(), SIX_HOURS, false).await;
        assert!(matches!(result, Err(AlbionClientError::Api(_))));
    }
}
