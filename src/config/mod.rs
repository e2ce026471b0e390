pub mod cli;
pub mod toml_config;

use crate::adapters::tequila::{TequilaConfig, DEFAULT_BASE_URL};
use crate::core::ConfigProvider;
use crate::domain::model::SearchParams;
use crate::utils::error::{DealError, Result};
use crate::utils::validation::{self, Validate};
use clap::Parser;
use serde::{Deserialize, Serialize};

pub const API_KEY_VAR: &str = "TEQUILA_API_KEY";

/// 歷史價格庫設定
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistorySettings {
    pub db_path: String,
    /// 以本地歷史作為第二層基準價
    pub use_history: bool,
    /// 把本次報價寫回歷史庫 (同時隱含 use_history)
    pub persist: bool,
}

impl HistorySettings {
    pub fn enabled(&self) -> bool {
        self.use_history || self.persist
    }
}

/// 執行一次搜尋所需的完整設定，CLI 與 TOML 都實作此 trait
pub trait RunSettings: ConfigProvider + Validate {
    fn tequila_config(&self, api_key: Option<String>) -> TequilaConfig;
    fn history(&self) -> HistorySettings;
}

/// 先載入 .env，再讀取 API key；空字串視為未設定
pub fn load_api_key() -> Option<String> {
    let _ = dotenv::dotenv();
    std::env::var(API_KEY_VAR)
        .ok()
        .filter(|key| !key.trim().is_empty())
}

/// 搜尋相關欄位的共用檢查
pub(crate) fn validate_search(params: &SearchParams, threshold: f64) -> Result<()> {
    validation::validate_iata_code("origin", &params.origin)?;
    validation::validate_range("days", params.horizon_days, 1, 365)?;
    if !(threshold.is_finite() && threshold > 0.0) {
        return Err(DealError::InvalidConfigValueError {
            field: "threshold".to_string(),
            value: threshold.to_string(),
            reason: "Value must be a positive number".to_string(),
        });
    }
    if let Some(max_price) = params.max_price {
        validation::validate_range("max_price", max_price, 1, 100_000)?;
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "flight-deals")]
#[command(about = "Find European flights priced below their yearly average")]
pub struct CliConfig {
    /// Departure airport (IATA)
    #[arg(long, default_value = "RIX")]
    pub origin: String,

    /// Search horizon in days (1..365)
    #[arg(long, default_value = "180")]
    pub days: u32,

    /// Price threshold relative to the average (1.0 = below average, 0.8 = 20% below)
    #[arg(long, default_value = "1.0")]
    pub threshold: f64,

    /// Direct flights only
    #[arg(long)]
    pub nonstop: bool,

    /// Maximum price in the selected currency
    #[arg(long)]
    pub max_price: Option<u32>,

    #[arg(long, default_value = "EUR")]
    pub currency: String,

    /// Record prices into the local history database
    #[arg(long)]
    pub persist: bool,

    /// Use the local history database as a baseline without recording
    #[arg(long)]
    pub use_history: bool,

    #[arg(long, default_value = "deals.sqlite")]
    pub db_path: String,

    #[arg(long, default_value = ".")]
    pub output_path: String,

    #[arg(long, default_value = "deals.csv")]
    pub csv_name: String,

    #[arg(long, default_value = "lv")]
    pub market: String,

    #[arg(long, default_value = DEFAULT_BASE_URL)]
    pub api_url: String,

    #[arg(long, default_value = "60")]
    pub timeout_secs: u64,

    #[arg(long, default_value = "1000")]
    pub limit: u32,

    /// Load settings from a TOML file instead of the flags above
    #[arg(long)]
    pub config: Option<String>,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub log_json: bool,
}

impl ConfigProvider for CliConfig {
    fn search_params(&self) -> SearchParams {
        SearchParams {
            origin: self.origin.clone(),
            horizon_days: self.days,
            nonstop_only: self.nonstop,
            max_price: self.max_price,
        }
    }

    fn threshold(&self) -> f64 {
        self.threshold
    }

    fn output_path(&self) -> &str {
        &self.output_path
    }

    fn csv_name(&self) -> &str {
        &self.csv_name
    }
}

impl RunSettings for CliConfig {
    fn tequila_config(&self, api_key: Option<String>) -> TequilaConfig {
        TequilaConfig {
            api_key,
            base_url: self.api_url.clone(),
            currency: self.currency.clone(),
            market: self.market.clone(),
            timeout_secs: self.timeout_secs,
            limit: self.limit,
        }
    }

    fn history(&self) -> HistorySettings {
        HistorySettings {
            db_path: self.db_path.clone(),
            use_history: self.use_history,
            persist: self.persist,
        }
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validate_search(&self.search_params(), self.threshold)?;
        validation::validate_currency_code("currency", &self.currency)?;
        validation::validate_url("api_url", &self.api_url)?;
        validation::validate_non_empty_string("market", &self.market)?;
        validation::validate_range("timeout_secs", self.timeout_secs, 1, 600)?;
        validation::validate_range("limit", self.limit, 1, 1000)?;
        validation::validate_path("output_path", &self.output_path)?;
        validation::validate_path("csv_name", &self.csv_name)?;
        if self.history().enabled() {
            validation::validate_path("db_path", &self.db_path)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let config = CliConfig::parse_from(["flight-deals"]);

        assert_eq!(config.origin, "RIX");
        assert_eq!(config.days, 180);
        assert_eq!(config.threshold, 1.0);
        assert!(!config.nonstop);
        assert_eq!(config.max_price, None);
        assert_eq!(config.csv_name, "deals.csv");
        assert!(!config.history().enabled());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_cli_flags() {
        let config = CliConfig::parse_from([
            "flight-deals",
            "--origin",
            "VNO",
            "--days",
            "30",
            "--threshold",
            "0.8",
            "--nonstop",
            "--max-price",
            "120",
            "--persist",
        ]);

        let params = config.search_params();
        assert_eq!(params.origin, "VNO");
        assert_eq!(params.horizon_days, 30);
        assert!(params.nonstop_only);
        assert_eq!(params.max_price, Some(120));
        assert_eq!(config.threshold(), 0.8);
        assert!(config.history().enabled());
    }

    #[test]
    fn test_cli_validation_rejects_bad_values() {
        let bad_days = CliConfig::parse_from(["flight-deals", "--days", "400"]);
        assert!(bad_days.validate().is_err());

        let bad_origin = CliConfig::parse_from(["flight-deals", "--origin", "riga"]);
        assert!(bad_origin.validate().is_err());

        let bad_threshold = CliConfig::parse_from(["flight-deals", "--threshold", "0"]);
        assert!(bad_threshold.validate().is_err());
    }

    #[test]
    fn test_threshold_has_no_upper_bound() {
        let generous = CliConfig::parse_from(["flight-deals", "--threshold", "3.0"]);
        assert!(generous.validate().is_ok());

        let negative = CliConfig::parse_from(["flight-deals", "--threshold=-0.5"]);
        assert!(matches!(
            negative.validate(),
            Err(DealError::InvalidConfigValueError { ref field, .. }) if field == "threshold"
        ));
    }

    #[test]
    fn test_tequila_config_carries_api_key() {
        let config = CliConfig::parse_from(["flight-deals", "--currency", "USD"]);
        let tequila = config.tequila_config(Some("secret".to_string()));

        assert_eq!(tequila.api_key.as_deref(), Some("secret"));
        assert_eq!(tequila.currency, "USD");
        assert_eq!(tequila.market, "lv");
    }
}
