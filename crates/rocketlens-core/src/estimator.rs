//! Pure revenue and conversion math.
//!
//! No side effects and no I/O — every ambiguity (missing page views, a
//! combined sales counter spread over price-divergent options) is resolved
//! by contract here so the orchestrator and exporters can treat the results
//! as plain values.

use crate::product::OptionPrice;

/// Placeholder rendered wherever a metric cannot be computed.
pub const METRIC_PLACEHOLDER: &str = "-";

/// Conversion rate as display text: `(sales / page_views * 100)` to two
/// decimal places with a percent suffix.
///
/// Returns [`METRIC_PLACEHOLDER`] unless `page_views` is a finite positive
/// number and `sales` is finite.
#[must_use]
pub fn conversion_rate(page_views: Option<f64>, sales: Option<f64>) -> String {
    match (page_views, sales) {
        (Some(pv), Some(sales)) if pv.is_finite() && pv > 0.0 && sales.is_finite() => {
            format!("{:.2}%", sales / pv * 100.0)
        }
        _ => METRIC_PLACEHOLDER.to_owned(),
    }
}

/// Gross revenue from a single price: `sales * price`.
///
/// `None` when either argument is missing or non-finite — unknown, not zero.
#[must_use]
pub fn total_sales(sales: Option<f64>, price: Option<f64>) -> Option<f64> {
    match (sales, price) {
        (Some(s), Some(p)) if s.is_finite() && p.is_finite() => Some(s * p),
        _ => None,
    }
}

/// Weighted revenue estimate: `round(sales * Σ options[i].sale_price * ratios[i])`.
///
/// `ratios` must already be normalized to sum to 1 (see
/// [`normalized_ratios`]); missing trailing ratios count as 0.
#[must_use]
pub fn weighted_revenue(sales: f64, options: &[OptionPrice], ratios: &[f64]) -> f64 {
    let weighted_price: f64 = options
        .iter()
        .enumerate()
        .map(|(i, option)| option.sale_price * ratios.get(i).copied().unwrap_or(0.0))
        .sum();
    (sales * weighted_price).round()
}

/// Normalizes raw weights to ratios summing to 1.
///
/// All ratios are 0 when the weights sum to 0 — the caller's contract is
/// that it never feeds the resulting all-zero vector into a revenue figure
/// it presents as meaningful.
#[must_use]
pub fn normalized_ratios(weights: &[f64]) -> Vec<f64> {
    let sum: f64 = weights.iter().sum();
    if sum == 0.0 {
        return vec![0.0; weights.len()];
    }
    weights.iter().map(|w| w / sum).collect()
}

/// Default attribution weights when a price difference is first detected:
/// the option(s) tied for the lowest price get weight 1, all others 0.
///
/// Attributing all sales to the cheapest option is the conservative floor
/// estimate shown before the user adjusts the ratios.
#[must_use]
pub fn default_option_weights(options: &[OptionPrice]) -> Vec<f64> {
    let Some(lowest) = options
        .iter()
        .map(|o| o.sale_price)
        .fold(None::<f64>, |min, p| match min {
            Some(m) if m <= p => Some(m),
            _ => Some(p),
        })
    else {
        return Vec::new();
    };
    options
        .iter()
        .map(|o| if o.sale_price == lowest { 1.0 } else { 0.0 })
        .collect()
}
