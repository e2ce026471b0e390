use crate::domain::model::{Offer, SearchParams};
use crate::domain::ports::OfferSource;
use crate::domain::region::is_europe_country;
use crate::utils::dates::{date_part, format_api_date, search_window};
use crate::utils::error::Result;
use crate::utils::stats::mean;
use crate::utils::validation::{self, Validate};
use async_trait::async_trait;
use chrono::{Duration, Local, NaiveDate};
use reqwest::Client;
use serde::Deserialize;

pub const DEFAULT_BASE_URL: &str = "https://tequila-api.kiwi.com";
pub const PROVIDER_NAME: &str = "tequila";

/// Tequila 連線設定；API key 由呼叫端傳入，本模組不讀環境變數
#[derive(Debug, Clone)]
pub struct TequilaConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub currency: String,
    pub market: String,
    pub timeout_secs: u64,
    pub limit: u32,
}

impl Default for TequilaConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            currency: "EUR".to_string(),
            market: "lv".to_string(),
            timeout_secs: 60,
            limit: 1000,
        }
    }
}

impl Validate for TequilaConfig {
    fn validate(&self) -> Result<()> {
        let key = validation::validate_required_field("TEQUILA_API_KEY", &self.api_key)?;
        validation::validate_non_empty_string("TEQUILA_API_KEY", key)?;
        validation::validate_url("tequila.base_url", &self.base_url)?;
        validation::validate_currency_code("tequila.currency", &self.currency)?;
        validation::validate_non_empty_string("tequila.market", &self.market)?;
        validation::validate_range("tequila.timeout_secs", self.timeout_secs, 1, 600)?;
        validation::validate_range("tequila.limit", self.limit, 1, 1000)?;
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    #[serde(rename = "flyTo")]
    fly_to: Option<String>,
    #[serde(rename = "cityTo")]
    city_to: Option<CityField>,
    #[serde(rename = "countryTo")]
    country_to: Option<CountryField>,
    local_departure: Option<String>,
    utc_departure: Option<String>,
    price: Option<f64>,
}

/// `cityTo` 有時是字串，有時是帶 `name` 的物件
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CityField {
    Name(String),
    Detailed { name: Option<String> },
}

impl CityField {
    fn into_name(self) -> Option<String> {
        match self {
            CityField::Name(name) => Some(name),
            CityField::Detailed { name } => name,
        }
        .filter(|n| !n.is_empty())
    }
}

#[derive(Debug, Deserialize)]
struct CountryField {
    code: Option<String>,
}

pub struct TequilaSource {
    config: TequilaConfig,
    api_key: String,
    client: Client,
}

impl TequilaSource {
    /// 缺少 API key 時直接失敗，不會發出任何請求
    pub fn new(config: TequilaConfig) -> Result<Self> {
        config.validate()?;
        let api_key = config.api_key.clone().unwrap_or_default();
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            config,
            api_key,
            client,
        })
    }

    pub fn config(&self) -> &TequilaConfig {
        &self.config
    }

    fn search_url(&self) -> String {
        format!("{}/v2/search", self.config.base_url.trim_end_matches('/'))
    }

    fn today() -> NaiveDate {
        Local::now().date_naive()
    }

    async fn fetch(&self, query: &[(&str, String)]) -> Result<SearchResponse> {
        tracing::debug!("Making Tequila request: {:?}", query);
        let response = self
            .client
            .get(self.search_url())
            .header("apikey", &self.api_key)
            .query(query)
            .send()
            .await?;

        tracing::debug!("Tequila response status: {}", response.status());
        let body = response.error_for_status()?.json::<SearchResponse>().await?;
        Ok(body)
    }

    fn normalize(&self, origin: &str, response: SearchResponse) -> Vec<Offer> {
        let total = response.data.len();
        let mut offers = Vec::with_capacity(total);

        for item in response.data {
            let country_code = item.country_to.and_then(|c| c.code);
            if !is_europe_country(country_code.as_deref()) {
                continue;
            }

            let Some(destination) = item.fly_to.map(|d| d.to_ascii_uppercase()) else {
                continue;
            };
            let Some(price) = item.price.filter(|p| *p >= 0.0) else {
                tracing::debug!("Skipping {} without a usable price", destination);
                continue;
            };
            if destination == origin {
                continue;
            }

            // 先取當地出發日期，沒有或無法解析才退回 UTC 日期
            let date = item
                .local_departure
                .as_deref()
                .and_then(date_part)
                .or_else(|| item.utc_departure.as_deref().and_then(date_part));
            let Some(date) = date else {
                tracing::debug!("Skipping {} without a departure date", destination);
                continue;
            };

            offers.push(Offer {
                origin: origin.to_string(),
                destination,
                destination_city: item.city_to.and_then(CityField::into_name),
                country_code,
                date,
                price,
                currency: self.config.currency.clone(),
                provider: PROVIDER_NAME.to_string(),
            });
        }

        tracing::debug!("Kept {} of {} Tequila results", offers.len(), total);
        offers
    }

    async fn fetch_route_prices(&self, origin: &str, destination: &str) -> Result<Vec<f64>> {
        let today = Self::today();
        let query = vec![
            ("fly_from", origin.to_string()),
            ("fly_to", destination.to_string()),
            ("date_from", format_api_date(today + Duration::days(1))),
            ("date_to", format_api_date(today + Duration::days(365))),
            ("curr", self.config.currency.clone()),
            ("limit", self.config.limit.to_string()),
            ("one_for_city", "0".to_string()),
            ("partner_market", self.config.market.clone()),
            ("sort", "price".to_string()),
        ];

        let response = self.fetch(&query).await?;
        Ok(response.data.iter().filter_map(|it| it.price).collect())
    }
}

#[async_trait]
impl OfferSource for TequilaSource {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    async fn search_offers(&self, params: &SearchParams) -> Result<Vec<Offer>> {
        let (date_from, date_to) = search_window(Self::today(), params.horizon_days);
        let max_stopovers = if params.nonstop_only { 0 } else { 2 };

        let mut query = vec![
            ("fly_from", params.origin.clone()),
            ("date_from", format_api_date(date_from)),
            ("date_to", format_api_date(date_to)),
            ("curr", self.config.currency.clone()),
            ("max_stopovers", max_stopovers.to_string()),
            ("one_for_city", "1".to_string()),
            ("partner_market", self.config.market.clone()),
            ("limit", self.config.limit.to_string()),
            ("sort", "price".to_string()),
            ("asc", "1".to_string()),
            ("to", "anywhere".to_string()),
        ];
        if let Some(max_price) = params.max_price.filter(|p| *p > 0) {
            query.push(("price_to", max_price.to_string()));
        }

        tracing::info!(
            "🔎 Searching {} → anywhere, {} .. {}",
            params.origin,
            date_from,
            date_to
        );
        let response = self.fetch(&query).await?;
        Ok(self.normalize(&params.origin, response))
    }

    // 只是回傳價格的平均值，並非依日曆加權的年均價
    async fn average_price_next_year(&self, origin: &str, destination: &str) -> Option<f64> {
        match self.fetch_route_prices(origin, destination).await {
            Ok(prices) => mean(&prices),
            Err(e) => {
                tracing::debug!("Yearly average for {}-{} unavailable: {}", origin, destination, e);
                None
            }
        }
    }
}
