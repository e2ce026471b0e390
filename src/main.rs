use clap::Parser;
use flight_deals::config::{load_api_key, HistorySettings};
use flight_deals::utils::error::ErrorSeverity;
use flight_deals::utils::{logger, validation::Validate};
use flight_deals::{
    CliConfig, DealEngine, DealPipeline, LocalStorage, Result, RunOutcome, RunSettings,
    SqliteBaselineStore, TequilaSource, TomlConfig,
};
use std::sync::Arc;

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let config = CliConfig::parse();

    // 初始化日誌
    if config.log_json {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(config.verbose);
    }

    tracing::info!("Starting flight-deals CLI");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    let result = match config.config.clone() {
        Some(path) => {
            tracing::info!("📁 Loading configuration from: {}", path);
            match TomlConfig::from_file(&path) {
                Ok(file_config) => run(file_config).await,
                Err(e) => Err(e),
            }
        }
        None => run(config).await,
    };

    match result {
        Ok(RunOutcome::NoOffers) => {
            println!("No offers found. Try a longer horizon or fewer filters.");
        }
        Ok(RunOutcome::Exported { deals, output_path }) => {
            println!("✅ Found {} deals", deals);
            println!("📁 Saved to {}", output_path);
        }
        Err(e) => {
            tracing::error!(
                "❌ Run failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());

            let exit_code = match e.severity() {
                ErrorSeverity::Low => 0,
                ErrorSeverity::Medium => 2,
                ErrorSeverity::High => 1,
                ErrorSeverity::Critical => 3,
            };

            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}

async fn run<C: RunSettings + 'static>(settings: C) -> Result<RunOutcome> {
    // 驗證配置，任何網路請求前就失敗
    settings.validate()?;

    let tequila = Arc::new(TequilaSource::new(settings.tequila_config(load_api_key()))?);
    let storage = LocalStorage::new(settings.output_path());
    let history = settings.history();

    let mut pipeline = DealPipeline::new(storage, settings, tequila);
    if let Some(store) = open_history(&history) {
        pipeline = pipeline.with_history(store, history.persist);
    }

    DealEngine::new(pipeline).run().await
}

/// 歷史庫無法開啟時只記錄警告，改以其他層級計算基準價
fn open_history(history: &HistorySettings) -> Option<Arc<SqliteBaselineStore>> {
    if !history.enabled() {
        return None;
    }

    match SqliteBaselineStore::open(&history.db_path) {
        Ok(store) => {
            tracing::info!("🗄️ Using price history at {}", history.db_path);
            Some(Arc::new(store))
        }
        Err(e) => {
            tracing::warn!("⚠️ Price history unavailable ({}): {}", history.db_path, e);
            None
        }
    }
}
