use crate::domain::model::{Offer, SearchParams};
use crate::domain::ports::OfferSource;
use std::sync::Arc;

/// 依序向每個來源查詢；單一來源失敗只記錄警告，不影響其他來源
pub async fn aggregate_offers(sources: &[Arc<dyn OfferSource>], params: &SearchParams) -> Vec<Offer> {
    let mut results = Vec::new();

    for source in sources {
        match source.search_offers(params).await {
            Ok(offers) => {
                tracing::info!("📥 {}: {} offers", source.name(), offers.len());
                results.extend(offers);
            }
            Err(e) => {
                tracing::warn!("⚠️ Provider {} did not respond: {}", source.name(), e);
            }
        }
    }

    results
}
