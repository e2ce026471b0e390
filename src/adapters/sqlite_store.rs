use crate::domain::model::PriceObservation;
use crate::domain::ports::BaselineStore;
use crate::utils::error::{DealError, Result};
use chrono::{DateTime, Duration, Utc};
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS price_observations (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    origin TEXT NOT NULL,
    destination TEXT NOT NULL,
    date TEXT NOT NULL,
    price REAL NOT NULL,
    currency TEXT NOT NULL DEFAULT 'EUR',
    provider TEXT NOT NULL,
    recorded_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_price_observations_route
    ON price_observations (origin, destination, recorded_at);
";

/// 與 SQLite `datetime()` 相同的格式，字串比較即時間比較
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// 以 SQLite 保存的價格觀測紀錄，只會新增不會修改
pub struct SqliteBaselineStore {
    db: Mutex<Connection>,
}

impl SqliteBaselineStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        tracing::debug!("Opening price history at {}", path.display());
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(db: Connection) -> Result<Self> {
        db.execute_batch(SCHEMA)?;
        Ok(Self { db: Mutex::new(db) })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.db.lock().map_err(|_| DealError::StorageError {
            message: "price history connection lock poisoned".to_string(),
        })
    }

    /// 以指定時間寫入，用於匯入舊資料
    pub fn add_observation_at(
        &self,
        observation: &PriceObservation,
        recorded_at: DateTime<Utc>,
    ) -> Result<()> {
        self.conn()?.execute(
            "INSERT INTO price_observations (origin, destination, date, price, currency, provider, recorded_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                observation.origin,
                observation.destination,
                observation.date,
                observation.price,
                observation.currency,
                observation.provider,
                recorded_at.format(TIMESTAMP_FORMAT).to_string(),
            ],
        )?;
        Ok(())
    }

    pub fn count(&self) -> Result<usize> {
        let count: i64 =
            self.conn()?
                .query_row("SELECT COUNT(*) FROM price_observations", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

impl BaselineStore for SqliteBaselineStore {
    fn add_observation(&self, observation: &PriceObservation) -> Result<()> {
        self.add_observation_at(observation, Utc::now())
    }

    fn average_price(
        &self,
        origin: &str,
        destination: &str,
        window_days: Option<u32>,
    ) -> Result<Option<f64>> {
        let conn = self.conn()?;
        let average = match window_days {
            Some(days) => {
                let cutoff = (Utc::now() - Duration::days(i64::from(days)))
                    .format(TIMESTAMP_FORMAT)
                    .to_string();
                conn.query_row(
                    "SELECT AVG(price) FROM price_observations
                     WHERE origin = ?1 AND destination = ?2 AND recorded_at >= ?3",
                    params![origin, destination, cutoff],
                    |row| row.get::<_, Option<f64>>(0),
                )?
            }
            None => conn.query_row(
                "SELECT AVG(price) FROM price_observations WHERE origin = ?1 AND destination = ?2",
                params![origin, destination],
                |row| row.get::<_, Option<f64>>(0),
            )?,
        };
        Ok(average)
    }
}
