//! Investment value calculation from a NAV history.

use crate::error::{Error, Result};
use crate::series::{PriceSeries, SeriesLabel, SeriesPoint};

/// Converts a price series into the value of `initial_investment` held
/// from the first observation onwards.
///
/// Per-step returns are compounded as successive ratios
/// (`price[i] / price[i-1]`), never summed, so the cumulative figure is
/// exact: `value[i] = initial * price[i] / price[0]`.
///
/// The day-zero anchor row equals the lump sum by construction and is
/// dropped from the output; the returned series starts at the second
/// observation. Surprising, but long-standing behaviour that callers
/// depend on, so it stays.
pub fn calculate_investment_value(
    series: &PriceSeries,
    initial_investment: f64,
) -> Result<Vec<SeriesPoint>> {
    if !(initial_investment.is_finite() && initial_investment > 0.0) {
        return Err(Error::InvalidArgument(format!(
            "initial investment must be positive, got {initial_investment}"
        )));
    }
    if series.len() < 2 {
        return Err(Error::InsufficientData(series.len()));
    }

    let base_price = series.observations[0].price;
    let label = SeriesLabel::Historical {
        fund: series.fund_name.clone(),
    };

    Ok(series
        .observations
        .iter()
        .skip(1)
        .map(|obs| SeriesPoint {
            date: obs.date,
            value: initial_investment * obs.price / base_price,
            label: label.clone(),
        })
        .collect())
}
