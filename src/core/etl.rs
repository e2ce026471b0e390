use crate::core::Pipeline;
use crate::utils::error::Result;

/// 一次執行的結果
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// 沒有任何報價，未產生輸出
    NoOffers,
    Exported { deals: usize, output_path: String },
}

pub struct DealEngine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> DealEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    pub async fn run(&self) -> Result<RunOutcome> {
        tracing::info!("🚀 Starting deal search");

        let offers = self.pipeline.extract().await?;
        tracing::info!("📥 Fetched {} offers", offers.len());
        if offers.is_empty() {
            return Ok(RunOutcome::NoOffers);
        }

        let report = self.pipeline.transform(offers).await?;
        let deals = report.deals.len();
        tracing::info!(
            "🔍 {} deals out of {} offers",
            deals,
            report.offers_considered
        );

        let output_path = self.pipeline.load(report).await?;
        tracing::info!("📁 Output saved to: {}", output_path);

        Ok(RunOutcome::Exported { deals, output_path })
    }
}
