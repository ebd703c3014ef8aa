//! Reconciliation orchestrator: drives a parsed listing page to a fully
//! settled store.
//!
//! The flow is batch-then-per-item: one keyword search resolves as many
//! records as it can, everything unresolved falls back to concurrent
//! single-item lookups. Batch-phase errors abort the whole run and are
//! surfaced once; retry-phase errors are contained per item — one item's
//! failure never aborts the others. Each record's own lifecycle is strictly
//! sequential (every attempt is awaited before the transition that would
//! enable the next), so no two lookups for the same key are ever in flight
//! at once.

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use thiserror::Error;

use rocketlens_core::estimator;
use rocketlens_core::product::{ProductMetrics, ProductRecord, ProductState, ProductStatus};
use rocketlens_core::ProductStore;
use rocketlens_scraper::{derive_search_keyword, parse_product_list, ParseError};
use rocketlens_wing::{RetailClient, WingClient, WingError, WingProduct};

/// Errors that abort a whole pipeline run.
#[derive(Debug, Error)]
pub enum CollectError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// No `q` parameter and no usable heading — the run stops before the
    /// batch search and tracked records stay visibly loading.
    #[error("cannot derive a search keyword from the page")]
    NoKeyword,

    /// The batch keyword search itself failed.
    #[error(transparent)]
    Wing(#[from] WingError),
}

impl CollectError {
    #[must_use]
    pub fn requires_login(&self) -> bool {
        matches!(self, CollectError::Wing(e) if e.requires_login())
    }
}

/// External surfaces the host renders for the user (login prompt, toasts).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    LoginRequired,
    RateLimited,
    Error(String),
}

/// Outcome summary of one pipeline run.
#[derive(Debug, Default)]
pub struct PipelineReport {
    pub total: usize,
    pub completed: usize,
    pub failed: usize,
    pub empty: usize,
    pub notices: Vec<Notice>,
}

pub struct Reconciler {
    store: Arc<ProductStore>,
    wing: Arc<WingClient>,
    retail: Arc<RetailClient>,
    max_concurrent_lookups: usize,
}

impl Reconciler {
    #[must_use]
    pub fn new(
        store: Arc<ProductStore>,
        wing: Arc<WingClient>,
        retail: Arc<RetailClient>,
        max_concurrent_lookups: usize,
    ) -> Self {
        Self {
            store,
            wing,
            retail,
            max_concurrent_lookups: max_concurrent_lookups.max(1),
        }
    }

    /// Runs the full reconciliation for one captured listing page.
    ///
    /// On a batch-phase error the store is left as it stands (typically all
    /// `Loading` — the accepted degraded state); the caller decides how to
    /// surface the failure.
    ///
    /// # Errors
    ///
    /// - [`CollectError::Parse`] — no recognizable product list.
    /// - [`CollectError::NoKeyword`] — no search term derivable.
    /// - [`CollectError::Wing`] — the batch keyword search failed.
    pub async fn handle_view_metrics(
        &self,
        page_url: &str,
        html: &str,
    ) -> Result<PipelineReport, CollectError> {
        let records = parse_product_list(html)?;
        let generation = self.store.set_products(records);

        let keyword = derive_search_keyword(page_url, html).ok_or(CollectError::NoKeyword)?;
        tracing::info!(keyword = %keyword, "starting batch search");

        let results = self.wing.search_by_keyword(&keyword).await?;

        // Batch phase: settle every record to Complete or Fail.
        let mut refinements = Vec::new();
        for state in self.store.get_state() {
            match match_record(&state.record, &results) {
                Some(matched) => {
                    let metrics = build_metrics(matched);
                    self.store
                        .update_product(generation, state.completed(metrics));
                    if let Some(task) =
                        self.spawn_price_refinement(generation, &state.record, matched)
                    {
                        refinements.push(task);
                    }
                }
                None => {
                    self.store
                        .update_product(generation, state.with_status(ProductStatus::Fail));
                }
            }
        }

        // Retry phase: independent single-item lookups for everything the
        // batch left in Fail.
        let unresolved: Vec<ProductState> = self
            .store
            .get_state()
            .into_iter()
            .filter(|p| p.status == ProductStatus::Fail)
            .collect();

        let notices: Vec<Option<Notice>> = stream::iter(unresolved)
            .map(|state| self.retry_record(generation, state))
            .buffer_unordered(self.max_concurrent_lookups)
            .collect()
            .await;

        // Price refinement is progressive (subscribers saw Complete long
        // ago); drain the handles so the caller gets a settled snapshot.
        for task in refinements {
            let _ = task.await;
        }

        let mut report = self.tally();
        for notice in notices.into_iter().flatten() {
            if !report.notices.contains(&notice) {
                report.notices.push(notice);
            }
        }
        Ok(report)
    }

    /// Re-attempts the single-item lookup for one record, independent of
    /// all others. Bound to the host's per-item retry affordance.
    pub async fn retry_one(&self, record_id: &str) -> Option<Notice> {
        let state = self.store.find_product(record_id)?;
        let generation = self.store.generation();
        self.retry_record(generation, state).await
    }

    /// One settle-or-fail pass for a single record: Loading, then exactly
    /// one lookup, then a terminal-or-Fail transition. Never issues a
    /// second lookup for the record while this one is in flight.
    async fn retry_record(&self, generation: u64, state: ProductState) -> Option<Notice> {
        self.store
            .update_product(generation, state.with_status(ProductStatus::Loading));

        let Some(item_id) = state.record.item_id.clone() else {
            // No identifier to search with: a match can never exist.
            self.store
                .update_product(generation, state.with_status(ProductStatus::Empty));
            return None;
        };

        match self.wing.fetch_single(&item_id).await {
            Ok(matched) => {
                let metrics = build_metrics(&matched);
                self.store
                    .update_product(generation, state.completed(metrics));
                if let (Some(product_id), Some(vendor_option_id)) = (
                    state.record.product_id.as_deref(),
                    state.record.vendor_option_id.as_deref(),
                ) {
                    apply_price_refinement(
                        &self.store,
                        &self.retail,
                        generation,
                        &state.record.record_id,
                        product_id,
                        vendor_option_id,
                        matched.sale_price,
                    )
                    .await;
                }
                None
            }
            Err(WingError::EmptyResult { .. }) => {
                self.store
                    .update_product(generation, state.with_status(ProductStatus::Empty));
                None
            }
            Err(e) if e.requires_login() => {
                self.store
                    .update_product(generation, state.with_status(ProductStatus::Fail));
                Some(Notice::LoginRequired)
            }
            Err(WingError::RateLimited { .. }) => {
                self.store
                    .update_product(generation, state.with_status(ProductStatus::Fail));
                Some(Notice::RateLimited)
            }
            Err(e) => {
                tracing::warn!(
                    record_id = %state.record.record_id,
                    item_id = %item_id,
                    error = %e,
                    "single-item lookup failed"
                );
                self.store
                    .update_product(generation, state.with_status(ProductStatus::Fail));
                Some(Notice::Error(e.to_string()))
            }
        }
    }

    /// Kicks off the asynchronous price-divergence check for a matched
    /// record. Returns `None` when the record carries no vendor option id.
    fn spawn_price_refinement(
        &self,
        generation: u64,
        record: &ProductRecord,
        matched: &WingProduct,
    ) -> Option<tokio::task::JoinHandle<()>> {
        let product_id = record.product_id.clone()?;
        let vendor_option_id = record.vendor_option_id.clone()?;
        let record_id = record.record_id.clone();
        let observed_price = matched.sale_price;
        let store = Arc::clone(&self.store);
        let retail = Arc::clone(&self.retail);

        Some(tokio::spawn(async move {
            apply_price_refinement(
                &store,
                &retail,
                generation,
                &record_id,
                &product_id,
                &vendor_option_id,
                observed_price,
            )
            .await;
        }))
    }

    fn tally(&self) -> PipelineReport {
        let mut report = PipelineReport::default();
        for state in self.store.get_state() {
            report.total += 1;
            match state.status {
                ProductStatus::Complete => report.completed += 1,
                ProductStatus::Fail => report.failed += 1,
                ProductStatus::Empty => report.empty += 1,
                ProductStatus::Loading => {}
            }
        }
        report
    }
}

/// Batch matching requires the full `(product_id, item_id)` pair — a
/// product-id-only match would cross-wire sale options of the same product.
fn match_record<'a>(record: &ProductRecord, results: &'a [WingProduct]) -> Option<&'a WingProduct> {
    let product_id = record.product_id.as_deref()?;
    let item_id = record.item_id.as_deref()?;
    results
        .iter()
        .find(|r| r.product_id.to_string() == product_id && r.item_id.to_string() == item_id)
}

fn build_metrics(matched: &WingProduct) -> ProductMetrics {
    ProductMetrics {
        brand_name: matched.brand_name.clone(),
        page_views_28d: matched.pv_last_28_day,
        sales_28d: matched.sales_last_28d,
        conversion_rate: estimator::conversion_rate(
            matched.pv_last_28_day,
            matched.sales_last_28d,
        ),
        estimated_revenue: estimator::total_sales(matched.sales_last_28d, matched.sale_price),
        price_validation: None,
    }
}

/// Applies the price-divergence refinement to an already-Complete record:
/// a detected difference rewrites the revenue estimate to the conservative
/// lowest-price default and attaches the option payload. Validation
/// failures degrade silently; a stale generation makes the final write a
/// no-op.
async fn apply_price_refinement(
    store: &ProductStore,
    retail: &RetailClient,
    generation: u64,
    record_id: &str,
    product_id: &str,
    vendor_option_id: &str,
    observed_price: Option<f64>,
) {
    let Some(validation) = retail
        .validate_option_prices(product_id, vendor_option_id, observed_price.unwrap_or(0.0))
        .await
    else {
        return;
    };

    let Some(current) = store.find_product(record_id) else {
        return;
    };
    let Some(mut metrics) = current.metrics.clone() else {
        return;
    };

    if let Some(sales) = metrics.sales_28d.filter(|s| s.is_finite()) {
        let weights = estimator::default_option_weights(&validation.options);
        let ratios = estimator::normalized_ratios(&weights);
        metrics.estimated_revenue =
            Some(estimator::weighted_revenue(sales, &validation.options, &ratios));
    }
    metrics.price_validation = Some(validation);

    store.update_product(generation, current.completed(metrics));
}

#[cfg(test)]
#[path = "collect_test.rs"]
mod tests;
