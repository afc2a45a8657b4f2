//! Vanguard UK pricing service provider.
//!
//! Two endpoints are used:
//! - `POST {base}/gpx/graphql` for daily NAV history of one fund
//! - `GET {base}/api/productList/` for the fund catalog

use super::util::with_retry;
use crate::catalog::{CatalogProvider, FundCatalog, FundListing};
use crate::error::{Error, Result};
use crate::history_provider::HistoryProvider;
use crate::series::{PriceObservation, PriceSeries};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, error};

const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Only funds of this share class are comparable here; income-class units
/// pay dividends out, so their price history understates total return.
const ACCUMULATION_SHARE_CLASS: &str = "Accumulation";

/// A `limit` of 0 asks the endpoint for the full, untruncated history.
const PRICE_HISTORY_QUERY: &str = r#"
query PriceHistory($portIds: [String!]!, $startDate: String!, $endDate: String!, $limit: Float!) {
  funds(portIds: $portIds) {
    pricingDetails {
      navPrices(startDate: $startDate, endDate: $endDate, limit: $limit) {
        items {
          price
          asOfDate
          currencyCode
        }
      }
    }
  }
}"#;

#[derive(Debug, Deserialize)]
struct GraphqlResponse {
    data: Option<GraphqlData>,
}

#[derive(Debug, Deserialize)]
struct GraphqlData {
    funds: Vec<FundNode>,
}

#[derive(Debug, Deserialize)]
struct FundNode {
    #[serde(rename = "pricingDetails")]
    pricing_details: Option<PricingDetails>,
}

#[derive(Debug, Deserialize)]
struct PricingDetails {
    #[serde(rename = "navPrices")]
    nav_prices: NavPrices,
}

#[derive(Debug, Deserialize)]
struct NavPrices {
    items: Vec<NavPriceItem>,
}

#[derive(Debug, Deserialize)]
struct NavPriceItem {
    price: f64,
    #[serde(rename = "asOfDate")]
    as_of_date: String,
    #[serde(rename = "currencyCode")]
    currency_code: String,
}

#[derive(Debug, Deserialize)]
struct ProductListItem {
    name: String,
    #[serde(rename = "portId")]
    port_id: String,
    #[serde(rename = "shareClass")]
    share_class: String,
}

pub struct VanguardProvider {
    base_url: String,
    client: reqwest::Client,
}

impl VanguardProvider {
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("fundcmp/0.1")
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(VanguardProvider {
            base_url: base_url.to_string(),
            client,
        })
    }

    /// `asOfDate` carries a timestamp suffix; only the leading
    /// `YYYY-MM-DD` is significant.
    fn parse_api_date(date_str: &str) -> Result<NaiveDate> {
        let day = date_str.get(..10).ok_or_else(|| Error::DataFormat {
            detail: format!("asOfDate too short: '{date_str}'"),
        })?;
        NaiveDate::parse_from_str(day, "%Y-%m-%d").map_err(|e| Error::DataFormat {
            detail: format!("unparseable asOfDate '{date_str}': {e}"),
        })
    }
}

#[async_trait]
impl HistoryProvider for VanguardProvider {
    async fn fetch_history(
        &self,
        fund_name: &str,
        fund_code: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries> {
        let url = format!("{}/gpx/graphql", self.base_url);
        let body = serde_json::json!({
            "query": PRICE_HISTORY_QUERY,
            "variables": {
                "portIds": [fund_code],
                "startDate": start.to_string(),
                "endDate": end.to_string(),
                "limit": 0,
            },
        });
        debug!("Requesting NAV history for {fund_code} from {url}");

        let response = with_retry(
            || async {
                self.client
                    .post(&url)
                    .json(&body)
                    .send()
                    .await
                    .and_then(|r| r.error_for_status())
            },
            1,
            500,
        )
        .await
        .map_err(|e| Error::RemoteFetch {
            fund: fund_name.to_string(),
            source: e,
        })?;

        let response_text = response.text().await.map_err(|e| Error::RemoteFetch {
            fund: fund_name.to_string(),
            source: e,
        })?;

        let parsed: GraphqlResponse = match serde_json::from_str(&response_text) {
            Ok(data) => data,
            Err(e) => {
                error!(
                    error = ?e,
                    response = %response_text,
                    "Failed to parse NAV history response"
                );
                return Err(Error::DataFormat {
                    detail: format!("undecodable NAV history body: {e}"),
                });
            }
        };

        let fund_node = parsed
            .data
            .ok_or_else(|| Error::DataFormat {
                detail: "response has no data section".to_string(),
            })?
            .funds
            .into_iter()
            .next()
            .ok_or_else(|| Error::DataFormat {
                detail: format!("fund '{fund_code}' not present in response"),
            })?;

        let items = fund_node
            .pricing_details
            .ok_or_else(|| Error::DataFormat {
                detail: format!("no pricing details for fund '{fund_code}'"),
            })?
            .nav_prices
            .items;

        let mut observations = Vec::with_capacity(items.len());
        for item in items {
            let date = Self::parse_api_date(&item.as_of_date)?;
            if date < start || date > end {
                continue;
            }
            if !(item.price.is_finite() && item.price > 0.0) {
                debug!("Skipping non-positive NAV {} on {date}", item.price);
                continue;
            }
            observations.push(PriceObservation {
                date,
                price: item.price,
                currency: item.currency_code,
            });
        }

        observations.sort_by_key(|o| o.date);
        // Last observation wins when the feed repeats a date.
        observations.dedup_by(|next, kept| {
            if next.date == kept.date {
                kept.price = next.price;
                std::mem::swap(&mut kept.currency, &mut next.currency);
                true
            } else {
                false
            }
        });

        if observations.is_empty() {
            return Err(Error::EmptyHistory {
                fund: fund_name.to_string(),
                start,
                end,
            });
        }

        Ok(PriceSeries {
            fund_name: fund_name.to_string(),
            observations,
        })
    }
}

#[async_trait]
impl CatalogProvider for VanguardProvider {
    async fn fetch_catalog(&self) -> Result<FundCatalog> {
        let url = format!("{}/api/productList/", self.base_url);
        debug!("Requesting fund catalog from {url}");

        let response = with_retry(
            || async {
                self.client
                    .get(&url)
                    .send()
                    .await
                    .and_then(|r| r.error_for_status())
            },
            1,
            500,
        )
        .await
        .map_err(|e| Error::RemoteFetch {
            fund: "product list".to_string(),
            source: e,
        })?;

        let response_text = response.text().await.map_err(|e| Error::RemoteFetch {
            fund: "product list".to_string(),
            source: e,
        })?;

        let products: Vec<ProductListItem> = match serde_json::from_str(&response_text) {
            Ok(data) => data,
            Err(e) => {
                error!(
                    error = ?e,
                    response = %response_text,
                    "Failed to parse product list response"
                );
                return Err(Error::DataFormat {
                    detail: format!("undecodable product list body: {e}"),
                });
            }
        };

        let funds = products
            .into_iter()
            .filter(|p| p.share_class == ACCUMULATION_SHARE_CLASS)
            .map(|p| FundListing {
                name: p.name,
                code: p.port_id,
            })
            .collect();

        Ok(FundCatalog::new(funds))
    }
}
