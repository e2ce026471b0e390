use crate::core::aggregate::aggregate_offers;
use crate::core::baseline::BaselineResolver;
use crate::core::deals::select_deals;
use crate::core::presenter::{present, render_table, to_csv};
use crate::core::{ConfigProvider, DealReport, Offer, Pipeline, Storage};
use crate::domain::ports::{BaselineStore, OfferSource};
use crate::utils::error::Result;
use std::sync::Arc;

/// 歷史價格庫及其使用方式
#[derive(Clone)]
pub struct HistoryStore {
    pub store: Arc<dyn BaselineStore>,
    pub persist: bool,
}

pub struct DealPipeline<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
    sources: Vec<Arc<dyn OfferSource>>,
    yearly: Arc<dyn OfferSource>,
    history: Option<HistoryStore>,
}

impl<S: Storage, C: ConfigProvider> DealPipeline<S, C> {
    /// `yearly` 提供未來一年的平均價，同時也是第一個報價來源
    pub fn new(storage: S, config: C, yearly: Arc<dyn OfferSource>) -> Self {
        Self {
            storage,
            config,
            sources: vec![yearly.clone()],
            yearly,
            history: None,
        }
    }

    pub fn with_source(mut self, source: Arc<dyn OfferSource>) -> Self {
        self.sources.push(source);
        self
    }

    pub fn with_history(mut self, store: Arc<dyn BaselineStore>, persist: bool) -> Self {
        self.history = Some(HistoryStore { store, persist });
        self
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for DealPipeline<S, C> {
    async fn extract(&self) -> Result<Vec<Offer>> {
        let params = self.config.search_params();
        tracing::debug!("Search parameters: {:?}", params);
        Ok(aggregate_offers(&self.sources, &params).await)
    }

    async fn transform(&self, offers: Vec<Offer>) -> Result<DealReport> {
        let mut resolver = BaselineResolver::new(self.yearly.as_ref());
        if let Some(history) = &self.history {
            resolver = resolver.with_store(history.store.as_ref(), history.persist);
        }

        let baselines = resolver.resolve(&offers).await;
        tracing::info!("📊 Resolved baselines for {} routes", baselines.len());

        let max_price = self.config.search_params().max_price.map(f64::from);
        let deals = select_deals(&offers, &baselines, self.config.threshold(), max_price);
        let rows = present(&deals, &baselines);

        Ok(DealReport {
            offers_considered: offers.len(),
            baselines,
            deals,
            rows,
        })
    }

    async fn load(&self, report: DealReport) -> Result<String> {
        println!("{}", render_table(&report.rows));

        let csv_data = to_csv(&report.rows)?;
        let csv_name = self.config.csv_name();
        tracing::debug!("Writing CSV ({} bytes) to storage", csv_data.len());
        self.storage.write_file(csv_name, &csv_data).await?;

        let output_path = std::path::Path::new(self.config.output_path())
            .join(csv_name)
            .to_string_lossy()
            .to_string();
        Ok(output_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::SqliteBaselineStore;
    use crate::core::Route;
    use crate::domain::model::SearchParams;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use tokio::sync::Mutex;

    #[derive(Clone)]
    struct MockStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    }

    impl MockStorage {
        fn new() -> Self {
            Self {
                files: Arc::new(Mutex::new(HashMap::new())),
            }
        }

        async fn get_file(&self, path: &str) -> Option<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned()
        }
    }

    impl Storage for MockStorage {
        async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            let mut files = self.files.lock().await;
            files.insert(path.to_string(), data.to_vec());
            Ok(())
        }
    }

    struct MockConfig {
        threshold: f64,
        max_price: Option<u32>,
    }

    impl ConfigProvider for MockConfig {
        fn search_params(&self) -> SearchParams {
            SearchParams {
                origin: "RIX".to_string(),
                horizon_days: 180,
                nonstop_only: false,
                max_price: self.max_price,
            }
        }

        fn threshold(&self) -> f64 {
            self.threshold
        }

        fn output_path(&self) -> &str {
            "test_output"
        }

        fn csv_name(&self) -> &str {
            "deals.csv"
        }
    }

    struct StaticSource {
        name: &'static str,
        offers: Vec<Offer>,
        yearly: HashMap<String, f64>,
    }

    #[async_trait]
    impl OfferSource for StaticSource {
        fn name(&self) -> &str {
            self.name
        }

        async fn search_offers(&self, _params: &SearchParams) -> Result<Vec<Offer>> {
            Ok(self.offers.clone())
        }

        async fn average_price_next_year(&self, _origin: &str, destination: &str) -> Option<f64> {
            self.yearly.get(destination).copied()
        }
    }

    fn offer(destination: &str, city: &str, price: f64, provider: &str) -> Offer {
        Offer {
            origin: "RIX".to_string(),
            destination: destination.to_string(),
            destination_city: Some(city.to_string()),
            country_code: Some("ES".to_string()),
            date: "2025-05-01".to_string(),
            price,
            currency: "EUR".to_string(),
            provider: provider.to_string(),
        }
    }

    fn source(name: &'static str, offers: Vec<Offer>, yearly: &[(&str, f64)]) -> Arc<dyn OfferSource> {
        Arc::new(StaticSource {
            name,
            offers,
            yearly: yearly.iter().map(|(d, p)| (d.to_string(), *p)).collect(),
        })
    }

    #[tokio::test]
    async fn test_extract_combines_sources() {
        let primary = source("primary", vec![offer("BCN", "Barcelona", 50.0, "primary")], &[]);
        let extra = source("extra", vec![offer("BCN", "Barcelona", 45.0, "extra")], &[]);

        let pipeline = DealPipeline::new(
            MockStorage::new(),
            MockConfig {
                threshold: 1.0,
                max_price: None,
            },
            primary,
        )
        .with_source(extra);

        let offers = pipeline.extract().await.unwrap();
        assert_eq!(offers.len(), 2);
        assert_eq!(offers[1].provider, "extra");
    }

    #[tokio::test]
    async fn test_transform_selects_deals_against_yearly_average() {
        let primary = source("primary", vec![], &[("BCN", 120.0), ("BER", 120.0)]);
        let pipeline = DealPipeline::new(
            MockStorage::new(),
            MockConfig {
                threshold: 0.8,
                max_price: None,
            },
            primary,
        );

        let offers = vec![
            offer("BCN", "Barcelona", 95.0, "primary"),
            offer("BER", "Berlin", 97.0, "primary"),
            offer("BCN", "Barcelona", 90.0, "primary"),
        ];
        let report = pipeline.transform(offers).await.unwrap();

        assert_eq!(report.offers_considered, 3);
        assert_eq!(report.baselines.len(), 2);
        assert_eq!(report.deals.len(), 1);
        assert_eq!(report.deals[0].price, 90.0);
        assert_eq!(report.rows[0].discount, "25%");
    }

    #[tokio::test]
    async fn test_transform_records_history_when_persisting() {
        let store = Arc::new(SqliteBaselineStore::open_in_memory().unwrap());
        let pipeline = DealPipeline::new(
            MockStorage::new(),
            MockConfig {
                threshold: 1.0,
                max_price: Some(120),
            },
            source("primary", vec![], &[]),
        )
        .with_history(store.clone(), true);

        let offers = vec![
            offer("BCN", "Barcelona", 100.0, "primary"),
            offer("BCN", "Barcelona", 140.0, "primary"),
        ];
        let report = pipeline.transform(offers).await.unwrap();

        assert_eq!(report.baselines[&Route::new("RIX", "BCN")], 120.0);
        assert_eq!(report.deals.len(), 1);
        assert_eq!(store.count().unwrap(), 2);
    }

    #[tokio::test]
    async fn test_load_writes_csv() {
        let storage = MockStorage::new();
        let pipeline = DealPipeline::new(
            storage.clone(),
            MockConfig {
                threshold: 1.0,
                max_price: None,
            },
            source("primary", vec![], &[("BCN", 120.0)]),
        );

        let report = pipeline
            .transform(vec![offer("BCN", "Barcelona", 90.0, "primary")])
            .await
            .unwrap();
        let output_path = pipeline.load(report).await.unwrap();

        assert!(output_path.ends_with("deals.csv"));
        assert!(output_path.starts_with("test_output"));

        let csv = String::from_utf8(storage.get_file("deals.csv").await.unwrap()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[1].starts_with("RIX,BCN,Barcelona,ES,2025-05-01,90 EUR,120 EUR,25%"));
    }
}
