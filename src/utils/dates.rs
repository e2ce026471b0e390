use crate::utils::error::{DealError, Result};
use chrono::{Duration, NaiveDate};

/// 搜尋區間：明天起算，往後 `horizon_days` 天
pub fn search_window(today: NaiveDate, horizon_days: u32) -> (NaiveDate, NaiveDate) {
    let start = today + Duration::days(1);
    let end = start + Duration::days(i64::from(horizon_days));
    (start, end)
}

/// Tequila API 使用 dd/mm/YYYY
pub fn format_api_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

/// 接受 `2025-12-31` 或 `31/12/2025`
pub fn parse_date(value: &str) -> Result<NaiveDate> {
    ["%Y-%m-%d", "%d/%m/%Y"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
        .ok_or_else(|| DealError::ProcessingError {
            message: format!("Unknown date format: {}", value),
        })
}

/// 從 `2025-05-01T10:00:00.000Z` 之類的時間戳取出 ISO 日期；前 10 個字元不是日期時回傳 `None`
pub fn date_part(timestamp: &str) -> Option<String> {
    let date = parse_date(timestamp.get(..10)?).ok()?;
    Some(date.format("%Y-%m-%d").to_string())
}
