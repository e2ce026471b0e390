use crate::domain::model::{DealReport, Offer, PriceObservation, SearchParams};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn search_params(&self) -> SearchParams;
    fn threshold(&self) -> f64;
    fn output_path(&self) -> &str;
    fn csv_name(&self) -> &str;
}

/// 航班報價來源
#[async_trait]
pub trait OfferSource: Send + Sync {
    /// 來源名稱，用於日誌與 `Offer::provider`
    fn name(&self) -> &str;

    async fn search_offers(&self, params: &SearchParams) -> Result<Vec<Offer>>;

    /// 未來一年該航線的平均價格；任何失敗都回傳 `None`
    async fn average_price_next_year(&self, origin: &str, destination: &str) -> Option<f64>;
}

/// 歷史價格觀測庫
pub trait BaselineStore: Send + Sync {
    fn add_observation(&self, observation: &PriceObservation) -> Result<()>;

    /// `window_days` 為 `None` 時取全部歷史
    fn average_price(
        &self,
        origin: &str,
        destination: &str,
        window_days: Option<u32>,
    ) -> Result<Option<f64>>;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<Vec<Offer>>;
    async fn transform(&self, offers: Vec<Offer>) -> Result<DealReport>;
    async fn load(&self, report: DealReport) -> Result<String>;
}
