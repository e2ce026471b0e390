use crate::domain::model::{DealRow, Offer, Route};
use crate::utils::error::{DealError, Result};
use std::collections::BTreeMap;

pub const HEADERS: [&str; 9] = [
    "From",
    "To (IATA)",
    "City",
    "Country",
    "Departure",
    "Price",
    "Yearly average",
    "Below by",
    "Source",
];

/// 取整數並加上幣別；剛好 .5 時取最近的偶數
pub fn human_money(value: f64, currency: &str) -> String {
    if value.is_finite() {
        format!("{} {}", value.round_ties_even() as i64, currency)
    } else {
        format!("{} {}", value, currency)
    }
}

/// 相對基準價的折扣百分比；沒有基準價時為 0
pub fn discount_percent(price: f64, baseline: Option<f64>) -> f64 {
    match baseline {
        Some(base) if base != 0.0 => (1.0 - price / base) * 100.0,
        _ => 0.0,
    }
}

pub fn present(deals: &[Offer], baselines: &BTreeMap<Route, f64>) -> Vec<DealRow> {
    deals
        .iter()
        .map(|deal| {
            let baseline = baselines.get(&deal.route()).copied().filter(|b| *b != 0.0);
            DealRow {
                origin: deal.origin.clone(),
                destination: deal.destination.clone(),
                city: deal.destination_city.clone().unwrap_or_default(),
                country: deal.country_code.clone().unwrap_or_default(),
                date: deal.date.clone(),
                price: human_money(deal.price, &deal.currency),
                baseline: baseline
                    .map(|b| human_money(b, &deal.currency))
                    .unwrap_or_else(|| "—".to_string()),
                discount: format!("{:.0}%", discount_percent(deal.price, baseline)),
                provider: deal.provider.clone(),
            }
        })
        .collect()
}

impl DealRow {
    fn cells(&self) -> [&str; 9] {
        [
            self.origin.as_str(),
            self.destination.as_str(),
            self.city.as_str(),
            self.country.as_str(),
            self.date.as_str(),
            self.price.as_str(),
            self.baseline.as_str(),
            self.discount.as_str(),
            self.provider.as_str(),
        ]
    }
}

/// GitHub 風格的 Markdown 表格
pub fn render_table(rows: &[DealRow]) -> String {
    let mut widths: Vec<usize> = HEADERS.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row.cells()) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let format_line = |cells: &[&str]| -> String {
        let padded: Vec<String> = cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| {
                let pad = width.saturating_sub(cell.chars().count());
                format!("{}{}", cell, " ".repeat(pad))
            })
            .collect();
        format!("| {} |", padded.join(" | "))
    };

    let mut lines = Vec::with_capacity(rows.len() + 2);
    lines.push(format_line(&HEADERS[..]));
    let separator: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    lines.push(format!("|-{}-|", separator.join("-|-")));
    for row in rows {
        lines.push(format_line(&row.cells()[..]));
    }
    lines.join("\n")
}

pub fn to_csv(rows: &[DealRow]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(HEADERS)?;
    for row in rows {
        writer.write_record(row.cells())?;
    }
    writer
        .into_inner()
        .map_err(|e| DealError::ProcessingError {
            message: format!("Failed to finish CSV output: {}", e),
        })
}
