//! Domain types for the product-metrics reconciliation pipeline.
//!
//! A [`ProductRecord`] is what the page parser extracts from one list item;
//! a [`ProductState`] is that record as tracked by the store, carrying the
//! reconciliation status and, once matched, the derived metrics.

use serde::{Deserialize, Serialize};

/// Reconciliation status of a single tracked product.
///
/// Transitions are driven by the orchestrator:
///
/// ```text
/// Loading --(batch/single match)-->   Complete   (terminal)
/// Loading --(batch no match)----->    Fail
/// Loading --(single no match)---->    Empty      (terminal)
/// Loading --(single error)------->    Fail
/// Fail    --(retry initiated)---->    Loading
/// ```
///
/// `Empty` and `Complete` are terminal for the automatic pipeline; only a
/// manual retry from `Fail` (or a full re-run) changes state further.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProductStatus {
    Loading,
    Complete,
    Fail,
    Empty,
}

/// Whether the list item carried the sponsored-ad marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProductKind {
    Normal,
    Sponsored,
}

/// One scraped list item, before reconciliation.
///
/// The identifier triple is parsed from the item's anchor URL and is absent
/// when the link shape is unrecognized — such records can never match a
/// vendor result and the orchestrator settles them accordingly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    /// Stable per-DOM-node identifier; synthetic (`auto-<millis>-<index>`)
    /// when the node carries none. Unique within one parse, not across.
    pub record_id: String,
    pub product_id: Option<String>,
    pub item_id: Option<String>,
    pub vendor_option_id: Option<String>,
    /// Best-effort scraped display name; empty when not found.
    pub display_name: String,
    pub kind: ProductKind,
}

/// One sibling purchase option discovered by price validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionPrice {
    pub option_item_id: String,
    pub vendor_option_id: String,
    pub sale_price: f64,
    pub option_label: Option<String>,
    pub product_url: String,
}

/// Result of the per-option price-divergence check.
///
/// `has_price_difference` is `true` iff `options` contains at least two
/// distinct `sale_price` values; `lowest_price` is the minimum among them
/// and serves as the conservative revenue floor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceValidation {
    pub has_price_difference: bool,
    pub options: Vec<OptionPrice>,
    pub lowest_price: f64,
    pub api_observed_price: f64,
}

/// Metrics derived from a matched vendor record. Present iff the state is
/// [`ProductStatus::Complete`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductMetrics {
    pub brand_name: Option<String>,
    pub page_views_28d: Option<f64>,
    pub sales_28d: Option<f64>,
    /// Formatted conversion-rate text (`"5.00%"` or the `"-"` placeholder).
    pub conversion_rate: String,
    /// Estimated 28-day revenue. Absent means unknown, never zero.
    pub estimated_revenue: Option<f64>,
    pub price_validation: Option<PriceValidation>,
}

/// A [`ProductRecord`] as tracked by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductState {
    pub record: ProductRecord,
    pub status: ProductStatus,
    pub metrics: Option<ProductMetrics>,
}

impl ProductState {
    /// Fresh state for a newly parsed record.
    #[must_use]
    pub fn loading(record: ProductRecord) -> Self {
        Self {
            record,
            status: ProductStatus::Loading,
            metrics: None,
        }
    }

    /// Transition helper: same record, new status, metrics cleared unless
    /// the target status is `Complete`.
    #[must_use]
    pub fn with_status(&self, status: ProductStatus) -> Self {
        Self {
            record: self.record.clone(),
            status,
            metrics: if status == ProductStatus::Complete {
                self.metrics.clone()
            } else {
                None
            },
        }
    }

    /// Transition helper: mark complete with the given metrics.
    #[must_use]
    pub fn completed(&self, metrics: ProductMetrics) -> Self {
        Self {
            record: self.record.clone(),
            status: ProductStatus::Complete,
            metrics: Some(metrics),
        }
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.status == ProductStatus::Complete && self.metrics.is_some()
    }
}
