use super::service::ServiceTag;
use super::store::KeyValueStore;
use crate::config::Configuration;
use crate::error::StoreError;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Per-service call counts read from the store.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageStats {
    pub google_vision: u64,
    pub amazon_rekognition: u64,
    pub openai: u64,
    pub total: u64,
}

impl UsageStats {
    pub fn count(&self, service: ServiceTag) -> u64 {
        match service {
            ServiceTag::GoogleVision => self.google_vision,
            ServiceTag::AmazonRekognition => self.amazon_rekognition,
            ServiceTag::OpenAi => self.openai,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuotaEntry {
    pub count: u64,
    pub limit: u64,
    pub remaining: u64,
    pub exhausted: bool,
}

/// Counts set against the configured limits, keyed by service name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuotaReport {
    pub services: BTreeMap<ServiceTag, QuotaEntry>,
}

/// Soft-quota bookkeeping over an injected key-value store.
///
/// Nothing is cached: every call round-trips to the store. Storage faults
/// never reach the caller except through [`UsageTracker::try_increment`].
#[derive(Clone)]
pub struct UsageTracker {
    store: Arc<dyn KeyValueStore>,
}

impl UsageTracker {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    async fn read_count(&self, service: ServiceTag) -> Result<u64, StoreError> {
        let value = self.store.get(&service.storage_key()).await?;
        Ok(parse_count(service, value.as_deref()))
    }

    /// True while the stored count is below `limit`. Fails open on read errors.
    pub async fn check_limit(&self, service: ServiceTag, limit: u64) -> bool {
        match self.read_count(service).await {
            Ok(count) => {
                debug!("{} usage {}/{}", service, count, limit);
                count < limit
            }
            Err(e) => {
                warn!("Failed to read usage for {}, allowing call: {}", service, e);
                true
            }
        }
    }

    /// Read-modify-write increment. Concurrent increments on the same
    /// service may be lost.
    pub async fn try_increment(&self, service: ServiceTag) -> Result<u64, StoreError> {
        let next = self
            .read_count(service)
            .await?
            .checked_add(1)
            .ok_or_else(|| StoreError::Backend(format!("{} usage counter overflowed", service)))?;
        self.store
            .set(&service.storage_key(), next.to_string())
            .await?;
        debug!("{} usage incremented to {}", service, next);
        Ok(next)
    }

    pub async fn increment(&self, service: ServiceTag) {
        if let Err(e) = self.try_increment(service).await {
            warn!("Failed to increment usage for {}: {}", service, e);
        }
    }

    pub async fn get_stats(&self) -> UsageStats {
        let (google_vision, amazon_rekognition, openai) = futures::join!(
            self.count_or_zero(ServiceTag::GoogleVision),
            self.count_or_zero(ServiceTag::AmazonRekognition),
            self.count_or_zero(ServiceTag::OpenAi),
        );

        UsageStats {
            google_vision,
            amazon_rekognition,
            openai,
            total: google_vision
                .saturating_add(amazon_rekognition)
                .saturating_add(openai),
        }
    }

    async fn count_or_zero(&self, service: ServiceTag) -> u64 {
        self.read_count(service).await.unwrap_or_else(|e| {
            warn!("Failed to read usage for {}: {}", service, e);
            0
        })
    }

    pub async fn reset(&self, service: ServiceTag) {
        match self.store.set(&service.storage_key(), "0".to_string()).await {
            Ok(()) => debug!("{} usage reset", service),
            Err(e) => warn!("Failed to reset usage for {}: {}", service, e),
        }
    }

    pub async fn reset_all(&self) {
        let pairs = ServiceTag::ALL
            .iter()
            .map(|service| (service.storage_key(), "0".to_string()))
            .collect();
        match self.store.multi_set(pairs).await {
            Ok(()) => debug!("All usage counters reset"),
            Err(e) => warn!("Failed to reset usage counters: {}", e),
        }
    }

    pub async fn quota_report(&self, configuration: &Configuration) -> QuotaReport {
        let stats = self.get_stats().await;
        let services = ServiceTag::ALL
            .into_iter()
            .map(|service| {
                let count = stats.count(service);
                let limit = configuration.limit_for(service);
                let entry = QuotaEntry {
                    count,
                    limit,
                    remaining: limit.saturating_sub(count),
                    exhausted: count >= limit,
                };
                (service, entry)
            })
            .collect();
        QuotaReport { services }
    }
}

fn parse_count(service: ServiceTag, value: Option<&str>) -> u64 {
    match value {
        None => 0,
        Some(raw) => raw.trim().parse::<u64>().unwrap_or_else(|_| {
            warn!("Ignoring unparseable usage value {:?} for {}", raw, service);
            0
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usage::store::MemoryStore;
    use async_trait::async_trait;

    /// Fails every operation.
    struct BrokenStore;

    #[async_trait]
    impl KeyValueStore for BrokenStore {
        async fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
            Err(StoreError::Backend("read failed".to_string()))
        }

        async fn set(&self, _key: &str, _value: String) -> Result<(), StoreError> {
            Err(StoreError::Backend("write failed".to_string()))
        }

        async fn multi_set(&self, _pairs: Vec<(String, String)>) -> Result<(), StoreError> {
            Err(StoreError::Backend("write failed".to_string()))
        }
    }

    fn tracker_with(entries: Vec<(&str, &str)>) -> (UsageTracker, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::with_entries(entries));
        (UsageTracker::new(store.clone()), store)
    }

    #[tokio::test]
    async fn test_check_limit_below_and_at_limit() {
        for n in [0u64, 1, 50, 99] {
            let value = n.to_string();
            let (tracker, _) = tracker_with(vec![("usage_googleVision", value.as_str())]);
            assert!(tracker.check_limit(ServiceTag::GoogleVision, 100).await);
        }
        for n in [100u64, 101, 5000] {
            let value = n.to_string();
            let (tracker, _) = tracker_with(vec![("usage_googleVision", value.as_str())]);
            assert!(!tracker.check_limit(ServiceTag::GoogleVision, 100).await);
        }
    }

    #[tokio::test]
    async fn test_check_limit_absent_counter() {
        let (tracker, _) = tracker_with(vec![]);
        assert!(tracker.check_limit(ServiceTag::AmazonRekognition, 1).await);
        assert!(tracker.check_limit(ServiceTag::AmazonRekognition, 1000).await);
    }

    #[tokio::test]
    async fn test_check_limit_unparseable_counts_as_zero() {
        let (tracker, _) = tracker_with(vec![("usage_openai", "lots")]);
        assert!(tracker.check_limit(ServiceTag::OpenAi, 1).await);
    }

    #[tokio::test]
    async fn test_check_limit_fails_open() {
        let tracker = UsageTracker::new(Arc::new(BrokenStore));
        assert!(tracker.check_limit(ServiceTag::GoogleVision, 1).await);
    }

    #[tokio::test]
    async fn test_increment_from_absent() {
        let (tracker, store) = tracker_with(vec![]);
        tracker.increment(ServiceTag::GoogleVision).await;
        assert_eq!(
            store.get("usage_googleVision").await.unwrap(),
            Some("1".to_string())
        );
    }

    #[tokio::test]
    async fn test_increment_existing() {
        let (tracker, store) = tracker_with(vec![("usage_amazonRekognition", "50")]);
        tracker.increment(ServiceTag::AmazonRekognition).await;
        assert_eq!(
            store.get("usage_amazonRekognition").await.unwrap(),
            Some("51".to_string())
        );
    }

    #[tokio::test]
    async fn test_increment_swallows_store_failure() {
        let tracker = UsageTracker::new(Arc::new(BrokenStore));
        tracker.increment(ServiceTag::OpenAi).await;
        assert!(tracker.try_increment(ServiceTag::OpenAi).await.is_err());
    }

    #[tokio::test]
    async fn test_get_stats_sums_counts() {
        let (tracker, _) = tracker_with(vec![
            ("usage_googleVision", "75"),
            ("usage_amazonRekognition", "25"),
            ("usage_openai", "10"),
        ]);
        let stats = tracker.get_stats().await;
        assert_eq!(
            stats,
            UsageStats {
                google_vision: 75,
                amazon_rekognition: 25,
                openai: 10,
                total: 110,
            }
        );
    }

    #[tokio::test]
    async fn test_get_stats_all_absent() {
        let (tracker, _) = tracker_with(vec![]);
        assert_eq!(tracker.get_stats().await, UsageStats::default());

        let broken = UsageTracker::new(Arc::new(BrokenStore));
        assert_eq!(broken.get_stats().await.total, 0);
    }

    #[tokio::test]
    async fn test_counts_at_u64_max_do_not_overflow() {
        let max = u64::MAX.to_string();
        let (tracker, store) = tracker_with(vec![
            ("usage_googleVision", max.as_str()),
            ("usage_amazonRekognition", "1"),
        ]);

        let stats = tracker.get_stats().await;
        assert_eq!(stats.google_vision, u64::MAX);
        assert_eq!(stats.total, u64::MAX);

        assert!(matches!(
            tracker.try_increment(ServiceTag::GoogleVision).await,
            Err(StoreError::Backend(_))
        ));
        tracker.increment(ServiceTag::GoogleVision).await;
        assert_eq!(store.get("usage_googleVision").await.unwrap(), Some(max));
        assert!(!tracker.check_limit(ServiceTag::GoogleVision, 1000).await);
    }

    #[tokio::test]
    async fn test_reset_and_reset_all() {
        let (tracker, store) = tracker_with(vec![
            ("usage_googleVision", "75"),
            ("usage_amazonRekognition", "25"),
            ("usage_openai", "10"),
        ]);

        tracker.reset(ServiceTag::GoogleVision).await;
        assert_eq!(
            store.get("usage_googleVision").await.unwrap(),
            Some("0".to_string())
        );
        assert_eq!(tracker.get_stats().await.total, 35);

        tracker.reset_all().await;
        assert_eq!(tracker.get_stats().await.total, 0);

        // Failures are logged only.
        UsageTracker::new(Arc::new(BrokenStore)).reset_all().await;
    }

    #[tokio::test]
    async fn test_quota_report() {
        let (tracker, _) = tracker_with(vec![
            ("usage_googleVision", "10"),
            ("usage_amazonRekognition", "12"),
        ]);
        let configuration = Configuration {
            google_vision_limit: 20,
            amazon_rekognition_limit: 10,
            ..Configuration::default()
        };

        let report = tracker.quota_report(&configuration).await;
        let google = &report.services[&ServiceTag::GoogleVision];
        assert_eq!(google.remaining, 10);
        assert!(!google.exhausted);

        let amazon = &report.services[&ServiceTag::AmazonRekognition];
        assert_eq!(amazon.remaining, 0);
        assert!(amazon.exhausted);

        assert_eq!(report.services[&ServiceTag::OpenAi].count, 0);
    }
}
