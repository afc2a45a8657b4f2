//! The composed pipeline: fetch NAV history, convert to investment value,
//! optionally extend with a forecast.

use crate::error::{Error, Result};
use crate::forecast::{TrendModel, extend_with_forecast};
use crate::history_provider::HistoryProvider;
use crate::returns::calculate_investment_value;
use crate::series::CombinedSeries;
use chrono::{NaiveDate, Utc};
use futures::StreamExt;
use indicatif::ProgressBar;
use tracing::{info, warn};

/// Bounded fetch parallelism; the pricing service tolerates a handful of
/// concurrent requests, not a stampede.
pub const DEFAULT_CONCURRENT_FETCHES: usize = 4;

/// Everything needed to compute one fund's series.
#[derive(Debug, Clone)]
pub struct HistoryRequest {
    pub fund_name: String,
    pub fund_code: String,
    pub start_date: NaiveDate,
    pub initial_investment: f64,
    pub forecast: bool,
}

/// Runs the full pipeline for one fund. The window ends today.
///
/// A forecast fitting failure degrades to the plain historical series with
/// a logged warning; fetch and calculation errors always propagate.
pub async fn get_price_history(
    provider: &dyn HistoryProvider,
    model: &dyn TrendModel,
    request: &HistoryRequest,
) -> Result<CombinedSeries> {
    info!("Fetching returns for fund {}", request.fund_name);

    let end_date = Utc::now().date_naive();
    let prices = provider
        .fetch_history(
            &request.fund_name,
            &request.fund_code,
            request.start_date,
            end_date,
        )
        .await?;

    let value_series = calculate_investment_value(&prices, request.initial_investment)?;

    match extend_with_forecast(
        value_series.clone(),
        &request.fund_name,
        request.forecast,
        model,
    ) {
        Ok(combined) => Ok(combined),
        Err(Error::ForecastFitting(reason)) => {
            warn!(
                "Forecast for {} dropped, showing history only: {reason}",
                request.fund_name
            );
            Ok(value_series)
        }
        Err(e) => Err(e),
    }
}

/// Runs the pipeline for several funds with bounded concurrency.
///
/// Failures are isolated per fund: each entry of the output carries either
/// that fund's series or its error, in the order the requests were given.
pub async fn fetch_all(
    provider: &dyn HistoryProvider,
    model: &dyn TrendModel,
    requests: &[HistoryRequest],
    concurrency: usize,
    progress: ProgressBar,
) -> Vec<(String, Result<CombinedSeries>)> {
    let mut results: Vec<(usize, String, Result<CombinedSeries>)> =
        futures::stream::iter(requests.iter().enumerate().map(|(index, request)| {
            let progress = progress.clone();
            async move {
                let result = get_price_history(provider, model, request).await;
                progress.inc(1);
                (index, request.fund_name.clone(), result)
            }
        }))
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;
    progress.finish_and_clear();

    results.sort_by_key(|(index, _, _)| *index);
    results
        .into_iter()
        .map(|(_, name, result)| (name, result))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forecast::HoltTrend;
    use crate::series::{PriceObservation, PriceSeries};
    use crate::ui;
    use async_trait::async_trait;
    use chrono::Duration;
    use std::collections::HashMap;

    struct MockHistoryProvider {
        histories: HashMap<String, Vec<f64>>,
        errors: HashMap<String, String>,
    }

    impl MockHistoryProvider {
        fn new() -> Self {
            MockHistoryProvider {
                histories: HashMap::new(),
                errors: HashMap::new(),
            }
        }

        fn add_history(&mut self, code: &str, prices: Vec<f64>) {
            self.histories.insert(code.to_string(), prices);
        }

        fn add_error(&mut self, code: &str, message: &str) {
            self.errors.insert(code.to_string(), message.to_string());
        }
    }

    #[async_trait]
    impl HistoryProvider for MockHistoryProvider {
        async fn fetch_history(
            &self,
            fund_name: &str,
            fund_code: &str,
            start: NaiveDate,
            end: NaiveDate,
        ) -> Result<PriceSeries> {
            if self.errors.contains_key(fund_code) {
                return Err(Error::EmptyHistory {
                    fund: fund_name.to_string(),
                    start,
                    end,
                });
            }
            let prices = self.histories.get(fund_code).cloned().unwrap_or_default();
            Ok(PriceSeries {
                fund_name: fund_name.to_string(),
                observations: prices
                    .into_iter()
                    .enumerate()
                    .map(|(i, price)| PriceObservation {
                        date: start + Duration::days(i as i64),
                        price,
                        currency: "GBP".to_string(),
                    })
                    .collect(),
            })
        }
    }

    fn request(name: &str, code: &str, forecast: bool) -> HistoryRequest {
        HistoryRequest {
            fund_name: name.to_string(),
            fund_code: code.to_string(),
            start_date: Utc::now().date_naive() - Duration::days(30),
            initial_investment: 1000.0,
            forecast,
        }
    }

    #[tokio::test]
    async fn pipeline_produces_value_series() {
        let mut provider = MockHistoryProvider::new();
        provider.add_history("0895", vec![100.0, 110.0, 99.0]);

        let series = get_price_history(&provider, &HoltTrend::default(), &request("LS60", "0895", false))
            .await
            .unwrap();

        assert_eq!(series.len(), 2);
        assert!((series[0].value - 1100.0).abs() < 1e-9);
        assert!((series[1].value - 990.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn forecast_failure_degrades_to_history() {
        // Constant prices over > 3 years: long enough to pass the span
        // guard, but unfittable.
        let mut provider = MockHistoryProvider::new();
        provider.add_history("0895", vec![100.0; 1200]);

        let mut req = request("LS60", "0895", true);
        req.start_date = Utc::now().date_naive() - Duration::days(1300);

        let series = get_price_history(&provider, &HoltTrend::default(), &req)
            .await
            .unwrap();

        assert_eq!(series.len(), 1199);
        assert!(series.iter().all(|p| !p.label.is_forecast()));
    }

    #[tokio::test]
    async fn sibling_funds_survive_one_failure() {
        let mut provider = MockHistoryProvider::new();
        provider.add_history("0895", vec![100.0, 101.0, 102.0]);
        provider.add_error("9679", "no data");

        let requests = vec![request("LS60", "0895", false), request("Global", "9679", false)];
        let results = fetch_all(
            &provider,
            &HoltTrend::default(),
            &requests,
            DEFAULT_CONCURRENT_FETCHES,
            ui::new_progress_bar(requests.len() as u64, false),
        )
        .await;

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].0, "LS60");
        assert!(results[0].1.is_ok());
        assert_eq!(results[1].0, "Global");
        assert!(matches!(results[1].1, Err(Error::EmptyHistory { .. })));
    }
}
