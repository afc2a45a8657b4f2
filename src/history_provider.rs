//! Price history abstraction implemented by remote providers.

use crate::error::Result;
use crate::series::PriceSeries;
use async_trait::async_trait;
use chrono::NaiveDate;

#[async_trait]
pub trait HistoryProvider: Send + Sync {
    /// Fetch daily NAV observations for one fund over `[start, end]`
    /// (both inclusive), sorted ascending by date with duplicates removed.
    async fn fetch_history(
        &self,
        fund_name: &str,
        fund_code: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries>;
}
