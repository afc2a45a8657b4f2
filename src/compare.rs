//! The `compare` command: resolve fund selections against the catalog,
//! run the pipeline per fund, and render the results table.

use crate::catalog::CatalogProvider;
use crate::config::AppConfig;
use crate::error::Error;
use crate::forecast::{self, TrendModel};
use crate::history::{self, DEFAULT_CONCURRENT_FETCHES, HistoryRequest};
use crate::providers::vanguard::VanguardProvider;
use crate::series::SeriesPoint;
use crate::table::{format_currency, prepare_results_table};
use crate::ui;
use anyhow::{Result, bail};
use chrono::NaiveDate;
use comfy_table::Cell;
use tracing::{debug, info};

/// Which trend model backs the forecast. Both satisfy the same contract;
/// this only picks the strategy for the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelChoice {
    AutoAr,
    Holt,
}

impl ModelChoice {
    pub fn build(self) -> Box<dyn TrendModel> {
        match self {
            ModelChoice::AutoAr => Box::new(forecast::AutoAr::default()),
            ModelChoice::Holt => Box::new(forecast::HoltTrend::default()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CompareOptions {
    /// Fund name queries, matched as case-insensitive substrings.
    pub funds: Vec<String>,
    /// Investment date, `YYYY-MM-DD`.
    pub start_date: String,
    /// Initial lump sum; falls back to the configured default.
    pub lump_sum: Option<f64>,
    pub forecast: bool,
    pub model: ModelChoice,
}

pub async fn run(config_path: Option<&str>, options: CompareOptions) -> Result<()> {
    info!("Comparing fund returns...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    if options.funds.is_empty() {
        bail!("No funds selected. Pass one or more fund names, e.g. 'lifestrategy 60'.");
    }

    let start_date =
        NaiveDate::parse_from_str(&options.start_date, "%Y-%m-%d").map_err(|e| {
            Error::InvalidArgument(format!(
                "malformed investment date '{}': {e}",
                options.start_date
            ))
        })?;

    let initial_investment = options.lump_sum.unwrap_or(config.initial_investment);
    if !(initial_investment.is_finite() && initial_investment > 0.0) {
        return Err(Error::InvalidArgument(format!(
            "initial investment must be positive, got {initial_investment}"
        ))
        .into());
    }

    let provider = VanguardProvider::new(&config.provider.base_url)?;
    let model = options.model.build();

    let catalog = provider.fetch_catalog().await?;
    debug!("Catalog holds {} accumulation funds", catalog.len());

    let mut requests = Vec::new();
    let mut unmatched = Vec::new();
    for query in &options.funds {
        match catalog.resolve(query) {
            Some(listing) => requests.push(HistoryRequest {
                fund_name: listing.name.trim().to_string(),
                fund_code: listing.code.clone(),
                start_date,
                initial_investment,
                forecast: options.forecast,
            }),
            None => unmatched.push(query.clone()),
        }
    }

    for query in &unmatched {
        println!(
            "{}",
            ui::style_text(
                &format!("No fund matches '{query}', skipping it."),
                ui::StyleType::Error
            )
        );
    }
    if requests.is_empty() {
        bail!("None of the selected names matched a fund in the catalog.");
    }

    let pb = ui::new_progress_bar(requests.len() as u64, true);
    pb.set_message("Fetching fund histories...");
    let results = history::fetch_all(
        &provider,
        model.as_ref(),
        &requests,
        DEFAULT_CONCURRENT_FETCHES,
        pb,
    )
    .await;

    let mut combined: Vec<SeriesPoint> = Vec::new();
    let mut failed = 0;
    for (fund, result) in results {
        match result {
            Ok(series) => combined.extend(series),
            Err(e) => {
                failed += 1;
                println!(
                    "{}",
                    ui::style_text(&format!("{fund}: {e}"), ui::StyleType::Error)
                );
            }
        }
    }
    if combined.is_empty() {
        bail!("All {failed} selected fund(s) failed, nothing to display.");
    }

    println!(
        "\n{}\n",
        ui::style_text(
            &format!(
                "With an initial investment of {} {} on {start_date}:",
                format_currency(initial_investment),
                config.currency
            ),
            ui::StyleType::Title
        )
    );
    display_results_table(&combined, &config.currency);

    Ok(())
}

fn display_results_table(combined: &[SeriesPoint], currency: &str) {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Fund"),
        ui::header_cell(&format!("Current Value ({currency})")),
        ui::header_cell(&format!("Predicted +3y Value ({currency})")),
    ]);

    for row in prepare_results_table(combined) {
        table.add_row(vec![
            Cell::new(row.fund),
            Cell::new(row.current_value).set_alignment(comfy_table::CellAlignment::Right),
            ui::format_optional_cell(row.predicted_value, |v| v),
        ]);
    }

    println!("{table}");
}
