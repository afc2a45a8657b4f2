//! Tabular summary of a combined multi-fund result.

use crate::series::SeriesPoint;

/// One summary row: latest historical value and, when a forecast segment
/// exists, the value at the end of the forecast horizon. Monetary values
/// are pre-formatted for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultRow {
    pub fund: String,
    pub current_value: String,
    pub predicted_value: Option<String>,
}

/// Collapses a concatenated multi-fund series into one row per fund, in
/// first-appearance order. Funds without a forecast segment get an absent
/// predicted value rather than a placeholder.
pub fn prepare_results_table(combined: &[SeriesPoint]) -> Vec<ResultRow> {
    let mut order: Vec<String> = Vec::new();
    for point in combined {
        let fund = point.label.fund();
        if !order.iter().any(|f| f == fund) {
            order.push(fund.to_string());
        }
    }

    order
        .into_iter()
        .map(|fund| {
            let last_for = |forecast: bool| {
                combined
                    .iter()
                    .filter(|p| p.label.fund() == fund && p.label.is_forecast() == forecast)
                    .max_by_key(|p| p.date)
                    .map(|p| format_currency(p.value))
            };
            ResultRow {
                current_value: last_for(false).unwrap_or_else(|| "N/A".to_string()),
                predicted_value: last_for(true),
                fund,
            }
        })
        .collect()
}

/// Formats a monetary value with two decimal places and thousands
/// separators, e.g. `1234567.891 -> "1,234,567.89"`.
pub fn format_currency(value: f64) -> String {
    let raw = format!("{:.2}", value.abs());
    let (whole, cents) = raw.split_once('.').unwrap_or((raw.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if value < 0.0 { "-" } else { "" };
    format!("{sign}{grouped}.{cents}")
}
