//! Forecast extension of an investment-value series.
//!
//! Two interchangeable trend models sit behind the [`TrendModel`]
//! capability: an auto-order autoregressive model on the differenced
//! series, and Holt's double exponential smoothing. Either one satisfies
//! the same output contract (1095 contiguous daily points starting the day
//! after the last historical observation, tagged as forecast rows).

use crate::error::{Error, Result};
use crate::series::{CombinedSeries, SeriesLabel, SeriesPoint};
use chrono::Duration;
use nalgebra::{DMatrix, DVector};
use tracing::debug;

/// Number of future calendar days a fitted model is asked to predict.
pub const FORECAST_HORIZON_DAYS: usize = 1095;

/// Forecasting is refused for histories spanning this many days or fewer.
/// Three years of signal is the floor for a meaningful fit; shorter input
/// passes through unchanged as a policy decision, not an error.
pub const MIN_HISTORY_SPAN_DAYS: i64 = 1096;

const MIN_FIT_POINTS: usize = 8;

/// A model fitted to one history, ready to project forward.
pub trait Forecaster {
    /// Point forecast for the next `horizon` periods, one value per period.
    fn predict(&self, horizon: usize) -> Vec<f64>;
}

/// Capability of fitting a trend model on a chronologically ordered value
/// column.
pub trait TrendModel: Send + Sync {
    fn fit(&self, history: &[f64]) -> Result<Box<dyn Forecaster>>;
}

/// Extends `series` with a [`FORECAST_HORIZON_DAYS`]-day projection when
/// `enabled` and the history is long enough; otherwise returns the input
/// unchanged.
pub fn extend_with_forecast(
    series: CombinedSeries,
    fund_name: &str,
    enabled: bool,
    model: &dyn TrendModel,
) -> Result<CombinedSeries> {
    if !enabled {
        return Ok(series);
    }

    let span_days = match (series.first(), series.last()) {
        (Some(first), Some(last)) => (last.date - first.date).num_days(),
        _ => 0,
    };
    if span_days <= MIN_HISTORY_SPAN_DAYS {
        debug!(
            "Skipping forecast for {fund_name}: {span_days} day span is below the \
             {MIN_HISTORY_SPAN_DAYS} day minimum"
        );
        return Ok(series);
    }

    let values: Vec<f64> = series.iter().map(|p| p.value).collect();
    let forecaster = model.fit(&values)?;
    let predicted = forecaster.predict(FORECAST_HORIZON_DAYS);

    let last_date = series.last().map(|p| p.date).unwrap_or_default();
    let label = SeriesLabel::Forecast {
        fund: fund_name.to_string(),
    };

    let mut combined = series;
    combined.extend(predicted.into_iter().enumerate().map(|(i, value)| {
        SeriesPoint {
            date: last_date + Duration::days(i as i64 + 1),
            value,
            label: label.clone(),
        }
    }));
    Ok(combined)
}

fn check_fittable(history: &[f64]) -> Result<()> {
    if history.len() < MIN_FIT_POINTS {
        return Err(Error::ForecastFitting(format!(
            "history too short to fit: {} points",
            history.len()
        )));
    }
    if history.iter().any(|v| !v.is_finite()) {
        return Err(Error::ForecastFitting(
            "history contains non-finite values".to_string(),
        ));
    }
    let mean = history.iter().sum::<f64>() / history.len() as f64;
    let variance =
        history.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / history.len() as f64;
    if variance <= f64::EPSILON * mean.abs().max(1.0) {
        return Err(Error::ForecastFitting(
            "history is constant, no signal to fit".to_string(),
        ));
    }
    Ok(())
}

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
/// Lagged difference columns can be nearly collinear for smooth value
/// series, so progressively looser tolerances are tried before giving up.
fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);
    for &tol in &[1e-10, 1e-8, 1e-6] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }
    None
}

fn aic(n: usize, sse: f64, k: usize) -> f64 {
    let n_f = n as f64;
    n_f * (sse / n_f).max(1e-12).ln() + 2.0 * k as f64
}

/// Auto-order autoregressive model with one order of differencing.
///
/// The value column is differenced once, an AR(p) with intercept is fitted
/// for each candidate order by least squares, and the order is chosen by
/// AIC with a preference for the simplest order within 2 points of the
/// best. Forecasts are produced on the differenced scale and integrated
/// back from the last observed value.
pub struct AutoAr {
    pub max_order: usize,
}

impl Default for AutoAr {
    fn default() -> Self {
        AutoAr { max_order: 6 }
    }
}

/// Minimum number of extra observations beyond parameter count.
const MIN_N_BUFFER: usize = 5;

impl TrendModel for AutoAr {
    fn fit(&self, history: &[f64]) -> Result<Box<dyn Forecaster>> {
        check_fittable(history)?;

        let diffs: Vec<f64> = history.windows(2).map(|w| w[1] - w[0]).collect();

        let mut best: Option<(f64, Vec<f64>)> = None;
        for p in 0..=self.max_order {
            let k = p + 1; // intercept + p lag coefficients
            let rows = diffs.len().saturating_sub(p);
            if rows < k + MIN_N_BUFFER {
                break;
            }

            let mut design = DMatrix::zeros(rows, k);
            let mut target = DVector::zeros(rows);
            for (row, t) in (p..diffs.len()).enumerate() {
                design[(row, 0)] = 1.0;
                for lag in 1..=p {
                    design[(row, lag)] = diffs[t - lag];
                }
                target[row] = diffs[t];
            }

            let Some(beta) = solve_least_squares(&design, &target) else {
                continue;
            };
            let residual = &target - &design * &beta;
            let sse = residual.norm_squared();
            let score = aic(rows, sse, k);

            // Prefer the simplest order unless a higher one is clearly
            // better (ΔAIC > 2); orders are visited smallest first.
            let improves = best
                .as_ref()
                .map(|(best_score, _)| score + 2.0 < *best_score)
                .unwrap_or(true);
            if improves {
                best = Some((score, beta.iter().copied().collect()));
            }
        }

        let (_, coefficients) = best.ok_or_else(|| {
            Error::ForecastFitting("no admissible autoregressive order".to_string())
        })?;

        let order = coefficients.len() - 1;
        // Most recent difference first, matching coefficient order.
        let recent: Vec<f64> = diffs.iter().rev().take(order).copied().collect();

        Ok(Box::new(ArForecaster {
            coefficients,
            recent,
            last_value: *history.last().unwrap_or(&0.0),
        }))
    }
}

struct ArForecaster {
    /// `[intercept, lag1, lag2, ...]`
    coefficients: Vec<f64>,
    /// Most recent differences, newest first; length = order.
    recent: Vec<f64>,
    last_value: f64,
}

impl Forecaster for ArForecaster {
    fn predict(&self, horizon: usize) -> Vec<f64> {
        let mut recent = self.recent.clone();
        let mut value = self.last_value;
        let mut out = Vec::with_capacity(horizon);

        for _ in 0..horizon {
            let mut next_diff = self.coefficients[0];
            for (lag, coef) in self.coefficients[1..].iter().enumerate() {
                next_diff += coef * recent[lag];
            }
            if !recent.is_empty() {
                recent.rotate_right(1);
                recent[0] = next_diff;
            }
            value += next_diff;
            out.push(value);
        }
        out
    }
}

/// Holt's double exponential smoothing (additive level + trend, no
/// seasonality).
pub struct HoltTrend {
    alpha: f64,
    beta: f64,
}

impl HoltTrend {
    pub fn new(alpha: f64, beta: f64) -> Result<Self> {
        for (name, v) in [("alpha", alpha), ("beta", beta)] {
            if !(v > 0.0 && v <= 1.0) {
                return Err(Error::InvalidArgument(format!(
                    "smoothing factor {name} must be in (0, 1], got {v}"
                )));
            }
        }
        Ok(HoltTrend { alpha, beta })
    }
}

impl Default for HoltTrend {
    fn default() -> Self {
        HoltTrend {
            alpha: 0.4,
            beta: 0.3,
        }
    }
}

impl TrendModel for HoltTrend {
    fn fit(&self, history: &[f64]) -> Result<Box<dyn Forecaster>> {
        check_fittable(history)?;

        let mut level = history[0];
        let mut trend = history[1] - history[0];
        for &value in &history[1..] {
            let next_level = self.alpha * value + (1.0 - self.alpha) * (level + trend);
            trend = self.beta * (next_level - level) + (1.0 - self.beta) * trend;
            level = next_level;
        }

        Ok(Box::new(HoltForecaster { level, trend }))
    }
}

struct HoltForecaster {
    level: f64,
    trend: f64,
}

impl Forecaster for HoltForecaster {
    fn predict(&self, horizon: usize) -> Vec<f64> {
        (1..=horizon)
            .map(|h| self.level + h as f64 * self.trend)
            .collect()
    }
}
