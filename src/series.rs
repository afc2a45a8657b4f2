//! Core series types shared by the fetcher, calculator and forecaster.

use chrono::NaiveDate;
use std::fmt::Display;

/// Legacy text marker for forecast rows. In-process code discriminates on
/// [`SeriesLabel`] directly; this prefix only survives in rendered output
/// so text consumers can still grep forecast rows apart.
pub const FORECAST_PREFIX: &str = "+3 year prediction: ";

/// A single daily NAV observation as returned by the pricing service.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceObservation {
    pub date: NaiveDate,
    pub price: f64,
    pub currency: String,
}

/// Chronologically ordered NAV history for one fund.
///
/// Invariants (upheld by the fetcher): non-empty, strictly ascending by
/// date, no duplicate dates.
#[derive(Debug, Clone)]
pub struct PriceSeries {
    pub fund_name: String,
    pub observations: Vec<PriceObservation>,
}

impl PriceSeries {
    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }
}

/// Tag distinguishing historical rows from forecast rows.
///
/// An explicit variant rather than a string prefix, so downstream table
/// building never has to slice substrings to tell the two apart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeriesLabel {
    Historical { fund: String },
    Forecast { fund: String },
}

impl SeriesLabel {
    pub fn fund(&self) -> &str {
        match self {
            SeriesLabel::Historical { fund } | SeriesLabel::Forecast { fund } => fund,
        }
    }

    pub fn is_forecast(&self) -> bool {
        matches!(self, SeriesLabel::Forecast { .. })
    }
}

impl Display for SeriesLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SeriesLabel::Historical { fund } => write!(f, "{fund}"),
            SeriesLabel::Forecast { fund } => write!(f, "{FORECAST_PREFIX}{fund}"),
        }
    }
}

/// One row of an investment-value series.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    pub value: f64,
    pub label: SeriesLabel,
}

/// Historical value series, optionally continued by a forecast segment.
/// Ordered by date across the boundary.
pub type CombinedSeries = Vec<SeriesPoint>;
