use serde::{Deserialize, Serialize};
use std::fmt;

/// 單筆航班報價
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Offer {
    pub origin: String,
    pub destination: String,
    pub destination_city: Option<String>,
    pub country_code: Option<String>,
    /// 出發日期 (YYYY-MM-DD)
    pub date: String,
    pub price: f64,
    pub currency: String,
    pub provider: String,
}

impl Offer {
    pub fn route(&self) -> Route {
        Route::new(&self.origin, &self.destination)
    }
}

/// 航線：(出發地, 目的地)，同時作為報價與基準價的關聯鍵
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Route {
    pub origin: String,
    pub destination: String,
}

impl Route {
    pub fn new(origin: &str, destination: &str) -> Self {
        Self {
            origin: origin.to_string(),
            destination: destination.to_string(),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.origin, self.destination)
    }
}

/// 寫入歷史價格庫的觀測值；寫入時間由儲存端決定
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceObservation {
    pub origin: String,
    pub destination: String,
    pub date: String,
    pub price: f64,
    pub currency: String,
    pub provider: String,
}

impl From<&Offer> for PriceObservation {
    fn from(offer: &Offer) -> Self {
        Self {
            origin: offer.origin.clone(),
            destination: offer.destination.clone(),
            date: offer.date.clone(),
            price: offer.price,
            currency: offer.currency.clone(),
            provider: offer.provider.clone(),
        }
    }
}

/// 搜尋參數
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchParams {
    pub origin: String,
    pub horizon_days: u32,
    pub nonstop_only: bool,
    pub max_price: Option<u32>,
}

/// 報表中的一列，所有欄位皆已格式化
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DealRow {
    pub origin: String,
    pub destination: String,
    pub city: String,
    pub country: String,
    pub date: String,
    pub price: String,
    pub baseline: String,
    pub discount: String,
    pub provider: String,
}

/// 一次執行的轉換結果
#[derive(Debug, Clone)]
pub struct DealReport {
    pub offers_considered: usize,
    pub baselines: std::collections::BTreeMap<Route, f64>,
    pub deals: Vec<Offer>,
    pub rows: Vec<DealRow>,
}
