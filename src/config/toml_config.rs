use crate::adapters::tequila::{TequilaConfig, DEFAULT_BASE_URL};
use crate::config::{validate_search, HistorySettings, RunSettings};
use crate::core::ConfigProvider;
use crate::domain::model::SearchParams;
use crate::utils::error::{DealError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub search: SearchSection,
    pub tequila: TequilaSection,
    pub storage: StorageSection,
    pub output: OutputSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSection {
    pub origin: String,
    pub days: u32,
    pub threshold: f64,
    pub nonstop: bool,
    pub max_price: Option<u32>,
}

impl Default for SearchSection {
    fn default() -> Self {
        Self {
            origin: "RIX".to_string(),
            days: 180,
            threshold: 1.0,
            nonstop: false,
            max_price: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TequilaSection {
    pub api_key: Option<String>,
    pub base_url: String,
    pub currency: String,
    pub market: String,
    pub timeout_secs: u64,
    pub limit: u32,
}

impl Default for TequilaSection {
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

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSection {
    pub db_path: String,
    pub use_history: bool,
    pub persist: bool,
}

impl Default for StorageSection {
    fn default() -> Self {
        Self {
            db_path: "deals.sqlite".to_string(),
            use_history: false,
            persist: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSection {
    pub path: String,
    pub csv_name: String,
}

impl Default for OutputSection {
    fn default() -> Self {
        Self {
            path: ".".to_string(),
            csv_name: "deals.csv".to_string(),
        }
    }
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| DealError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${TEQUILA_API_KEY})；未設定的變數保持原樣
    fn substitute_env_vars(content: &str) -> String {
        use regex::Regex;
        use std::sync::OnceLock;

        static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
        let re = PLACEHOLDER.get_or_init(|| {
            Regex::new(r"\$\{([^}]+)\}").expect("placeholder pattern is valid")
        });

        re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .to_string()
    }

    /// 檔案中的 API key；未替換的 `${...}` 視為未設定
    pub fn api_key(&self) -> Option<String> {
        self.tequila
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty() && !key.starts_with("${"))
    }
}

impl ConfigProvider for TomlConfig {
    fn search_params(&self) -> SearchParams {
        SearchParams {
            origin: self.search.origin.clone(),
            horizon_days: self.search.days,
            nonstop_only: self.search.nonstop,
            max_price: self.search.max_price,
        }
    }

    fn threshold(&self) -> f64 {
        self.search.threshold
    }

    fn output_path(&self) -> &str {
        &self.output.path
    }

    fn csv_name(&self) -> &str {
        &self.output.csv_name
    }
}

impl RunSettings for TomlConfig {
    /// 檔案內的 key 優先於環境變數
    fn tequila_config(&self, api_key: Option<String>) -> TequilaConfig {
        TequilaConfig {
            api_key: self.api_key().or(api_key),
            base_url: self.tequila.base_url.clone(),
            currency: self.tequila.currency.clone(),
            market: self.tequila.market.clone(),
            timeout_secs: self.tequila.timeout_secs,
            limit: self.tequila.limit,
        }
    }

    fn history(&self) -> HistorySettings {
        HistorySettings {
            db_path: self.storage.db_path.clone(),
            use_history: self.storage.use_history,
            persist: self.storage.persist,
        }
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        validate_search(&self.search_params(), self.search.threshold)?;
        validation::validate_currency_code("tequila.currency", &self.tequila.currency)?;
        validation::validate_url("tequila.base_url", &self.tequila.base_url)?;
        validation::validate_non_empty_string("tequila.market", &self.tequila.market)?;
        validation::validate_range("tequila.timeout_secs", self.tequila.timeout_secs, 1, 600)?;
        validation::validate_range("tequila.limit", self.tequila.limit, 1, 1000)?;
        validation::validate_path("output.path", &self.output.path)?;
        validation::validate_path("output.csv_name", &self.output.csv_name)?;
        if self.history().enabled() {
            validation::validate_path("storage.db_path", &self.storage.db_path)?;
        }
        Ok(())
    }
}
