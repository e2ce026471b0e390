use crate::domain::model::{Offer, PriceObservation, Route};
use crate::domain::ports::{BaselineStore, OfferSource};
use crate::utils::stats::mean;
use std::collections::{BTreeMap, BTreeSet};

/// 本地歷史價格的回溯天數
pub const HISTORY_WINDOW_DAYS: u32 = 365;

/// 基準價的來源層級，依 `ORDER` 逐一嘗試
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaselineTier {
    RemoteYearly,
    StoredHistory,
    CurrentBatch,
}

impl BaselineTier {
    pub const ORDER: [BaselineTier; 3] = [
        BaselineTier::RemoteYearly,
        BaselineTier::StoredHistory,
        BaselineTier::CurrentBatch,
    ];
}

/// 本批次中同一航線報價的平均價
pub fn in_batch_mean(offers: &[Offer], route: &Route) -> Option<f64> {
    let prices: Vec<f64> = offers
        .iter()
        .filter(|o| o.origin == route.origin && o.destination == route.destination)
        .map(|o| o.price)
        .collect();
    mean(&prices)
}

pub struct BaselineResolver<'a> {
    yearly: &'a dyn OfferSource,
    store: Option<&'a dyn BaselineStore>,
    persist: bool,
}

impl<'a> BaselineResolver<'a> {
    pub fn new(yearly: &'a dyn OfferSource) -> Self {
        Self {
            yearly,
            store: None,
            persist: false,
        }
    }

    /// `persist` 為 true 時，計算完成後會把所有報價寫入歷史庫
    pub fn with_store(mut self, store: &'a dyn BaselineStore, persist: bool) -> Self {
        self.store = Some(store);
        self.persist = persist;
        self
    }

    async fn lookup(&self, tier: BaselineTier, route: &Route, offers: &[Offer]) -> Option<f64> {
        match tier {
            BaselineTier::RemoteYearly => {
                self.yearly
                    .average_price_next_year(&route.origin, &route.destination)
                    .await
            }
            BaselineTier::StoredHistory => {
                let store = self.store?;
                match store.average_price(&route.origin, &route.destination, Some(HISTORY_WINDOW_DAYS)) {
                    Ok(average) => average,
                    Err(e) => {
                        tracing::warn!("⚠️ Price history lookup failed for {}: {}", route, e);
                        None
                    }
                }
            }
            BaselineTier::CurrentBatch => in_batch_mean(offers, route),
        }
    }

    /// 回傳第一個有值的層級
    pub async fn resolve_route(&self, route: &Route, offers: &[Offer]) -> Option<(f64, BaselineTier)> {
        for tier in BaselineTier::ORDER {
            if let Some(baseline) = self.lookup(tier, route, offers).await {
                return Some((baseline, tier));
            }
        }
        None
    }

    pub async fn resolve(&self, offers: &[Offer]) -> BTreeMap<Route, f64> {
        let routes: BTreeSet<Route> = offers.iter().map(Offer::route).collect();
        let mut baselines = BTreeMap::new();

        for route in routes {
            if let Some((baseline, tier)) = self.resolve_route(&route, offers).await {
                tracing::debug!("Baseline {} = {:.2} ({:?})", route, baseline, tier);
                baselines.insert(route, baseline);
            }
        }

        if self.persist {
            self.record(offers);
        }

        baselines
    }

    fn record(&self, offers: &[Offer]) {
        let Some(store) = self.store else {
            return;
        };

        let mut failed = 0usize;
        for offer in offers {
            if let Err(e) = store.add_observation(&PriceObservation::from(offer)) {
                failed += 1;
                tracing::debug!("Skipped observation for {}: {}", offer.route(), e);
            }
        }
        tracing::debug!("Recorded {} of {} observations", offers.len() - failed, offers.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::SqliteBaselineStore;
    use crate::domain::model::SearchParams;
    use crate::utils::error::{DealError, Result};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct YearlyStub {
        averages: HashMap<(String, String), f64>,
        calls: AtomicUsize,
    }

    impl YearlyStub {
        fn with(mut self, origin: &str, destination: &str, average: f64) -> Self {
            self.averages
                .insert((origin.to_string(), destination.to_string()), average);
            self
        }
    }

    #[async_trait]
    impl OfferSource for YearlyStub {
        fn name(&self) -> &str {
            "stub"
        }

        async fn search_offers(&self, _params: &SearchParams) -> Result<Vec<Offer>> {
            Ok(Vec::new())
        }

        async fn average_price_next_year(&self, origin: &str, destination: &str) -> Option<f64> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.averages
                .get(&(origin.to_string(), destination.to_string()))
                .copied()
        }
    }

    struct BrokenStore;

    impl BaselineStore for BrokenStore {
        fn add_observation(&self, _observation: &PriceObservation) -> Result<()> {
            Err(DealError::StorageError {
                message: "disk full".to_string(),
            })
        }

        fn average_price(&self, _o: &str, _d: &str, _w: Option<u32>) -> Result<Option<f64>> {
            Err(DealError::StorageError {
                message: "database locked".to_string(),
            })
        }
    }

    fn offer(destination: &str, price: f64) -> Offer {
        Offer {
            origin: "RIX".to_string(),
            destination: destination.to_string(),
            destination_city: None,
            country_code: Some("ES".to_string()),
            date: "2025-05-01".to_string(),
            price,
            currency: "EUR".to_string(),
            provider: "tequila".to_string(),
        }
    }

    fn seeded_store(destination: &str, price: f64) -> SqliteBaselineStore {
        let store = SqliteBaselineStore::open_in_memory().unwrap();
        store
            .add_observation(&PriceObservation::from(&offer(destination, price)))
            .unwrap();
        store
    }

    #[test]
    fn test_tier_order() {
        assert_eq!(
            BaselineTier::ORDER,
            [
                BaselineTier::RemoteYearly,
                BaselineTier::StoredHistory,
                BaselineTier::CurrentBatch
            ]
        );
    }

    #[tokio::test]
    async fn test_remote_average_takes_precedence() {
        let yearly = YearlyStub::default().with("RIX", "BCN", 150.0);
        let store = seeded_store("BCN", 90.0);
        let offers = vec![offer("BCN", 100.0)];

        let resolver = BaselineResolver::new(&yearly).with_store(&store, false);
        let route = Route::new("RIX", "BCN");

        assert_eq!(
            resolver.resolve_route(&route, &offers).await,
            Some((150.0, BaselineTier::RemoteYearly))
        );
    }

    #[tokio::test]
    async fn test_stored_history_used_when_remote_is_silent() {
        let yearly = YearlyStub::default();
        let store = seeded_store("BCN", 90.0);
        let offers = vec![offer("BCN", 100.0)];

        let resolver = BaselineResolver::new(&yearly).with_store(&store, false);
        let baselines = resolver.resolve(&offers).await;

        assert_eq!(baselines.get(&Route::new("RIX", "BCN")), Some(&90.0));
    }

    #[tokio::test]
    async fn test_batch_mean_without_store() {
        let yearly = YearlyStub::default();
        let offers = vec![offer("BCN", 100.0), offer("BER", 10.0), offer("BCN", 140.0)];

        let resolver = BaselineResolver::new(&yearly);
        let route = Route::new("RIX", "BCN");

        assert_eq!(
            resolver.resolve_route(&route, &offers).await,
            Some((120.0, BaselineTier::CurrentBatch))
        );
    }

    #[tokio::test]
    async fn test_empty_store_falls_through_to_batch_mean() {
        let yearly = YearlyStub::default();
        let store = SqliteBaselineStore::open_in_memory().unwrap();
        let offers = vec![offer("BCN", 100.0), offer("BCN", 140.0)];

        let resolver = BaselineResolver::new(&yearly).with_store(&store, false);
        let baselines = resolver.resolve(&offers).await;

        assert_eq!(baselines.get(&Route::new("RIX", "BCN")), Some(&120.0));
    }

    #[tokio::test]
    async fn test_one_baseline_per_distinct_route() {
        let yearly = YearlyStub::default().with("RIX", "BER", 80.0);
        let offers = vec![
            offer("BCN", 100.0),
            offer("BER", 50.0),
            offer("BCN", 140.0),
            offer("VIE", 70.0),
            offer("BER", 55.0),
        ];

        let resolver = BaselineResolver::new(&yearly);
        let baselines = resolver.resolve(&offers).await;

        assert_eq!(baselines.len(), 3);
        assert_eq!(yearly.calls.load(Ordering::SeqCst), 3);
        assert_eq!(baselines[&Route::new("RIX", "BCN")], 120.0);
        assert_eq!(baselines[&Route::new("RIX", "BER")], 80.0);
        assert_eq!(baselines[&Route::new("RIX", "VIE")], 70.0);
    }

    #[tokio::test]
    async fn test_persist_records_every_offer() {
        let yearly = YearlyStub::default();
        let store = SqliteBaselineStore::open_in_memory().unwrap();
        let offers = vec![offer("BCN", 100.0), offer("BCN", 140.0), offer("BER", 60.0)];

        BaselineResolver::new(&yearly)
            .with_store(&store, true)
            .resolve(&offers)
            .await;

        assert_eq!(store.count().unwrap(), 3);
        assert_eq!(store.average_price("RIX", "BCN", None).unwrap(), Some(120.0));
    }

    #[tokio::test]
    async fn test_read_only_store_records_nothing() {
        let yearly = YearlyStub::default();
        let store = SqliteBaselineStore::open_in_memory().unwrap();
        let offers = vec![offer("BCN", 100.0)];

        BaselineResolver::new(&yearly)
            .with_store(&store, false)
            .resolve(&offers)
            .await;

        assert_eq!(store.count().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_store_failures_are_swallowed() {
        let yearly = YearlyStub::default();
        let store = BrokenStore;
        let offers = vec![offer("BCN", 100.0), offer("BCN", 140.0)];

        let baselines = BaselineResolver::new(&yearly)
            .with_store(&store, true)
            .resolve(&offers)
            .await;

        assert_eq!(baselines.get(&Route::new("RIX", "BCN")), Some(&120.0));
    }
}
