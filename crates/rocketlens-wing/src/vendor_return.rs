//! Vendor-return inventory collection.
//!
//! The WING vendor-return screen pages its item list; the collector walks
//! the pages until a short or empty page. A mid-walk failure keeps the
//! pages already fetched and marks the collection incomplete — a partial
//! inventory list is still useful for export, unlike a partial product
//! catalog.
//!
//! Satellite fulfillment centers ship their returnable stock through a
//! representative center, so [`merge_fc_quantities`] folds the satellite
//! codes' quantities into the representative `XRC*`/`CHA9*` entry before
//! export.

use serde_json::json;

use crate::client::WingClient;
use crate::error::WingError;
use crate::types::{FcQuantity, VendorReturnItem, VendorReturnPage};

const VENDOR_RETURN_ITEMS_PATH: &str = "tenants/rfm/goldfish/vendor-return/itemList";

/// Page-count guard against a paginator that never shortens.
const MAX_PAGES: u32 = 200;

/// Satellite FC codes whose quantities are folded into the representative
/// center (mirrors the merge table of the vendor-return creation screen).
const MERGED_FC_CODES: &[&str] = &[
    "SFSCH1", "INC20", "SFAYG10", "SFNYJ2", "SFCHJ1", "SFNHN1", "SFISN5", "SFGWJ1", "SFWBS2",
    "SFGMP1", "SFISN1", "SFBSN5", "SFDJN2", "SFNYJ3", "SFYAT1", "SFJEJ1", "SFNGH2", "SFWDG1",
    "SFBUC3", "SFCHA1", "SFGNP1", "SFDJN3",
];

const DEFAULT_REPRESENTATIVE_FC: &str = "CHA9";

/// Result of walking the vendor-return pages.
#[derive(Debug)]
pub struct ReturnCollection {
    pub items: Vec<VendorReturnItem>,
    /// `false` when a page failed mid-walk and the tail was abandoned.
    pub complete: bool,
}

impl WingClient {
    /// Collects all vendor-return items by walking the paged item list.
    ///
    /// The walk ends at the first empty or short page. A failure on the
    /// first page propagates; a failure later returns the pages already
    /// collected with `complete: false`.
    ///
    /// # Errors
    ///
    /// - [`WingError::Unauthenticated`] — no session token available.
    /// - First-page transport/status/parse errors, as for the search call.
    pub async fn fetch_return_items(
        &self,
        page_size: u32,
    ) -> Result<ReturnCollection, WingError> {
        self.require_token()?;

        let mut items: Vec<VendorReturnItem> = Vec::new();
        let mut page_index: u32 = 0;

        loop {
            if page_index >= MAX_PAGES {
                tracing::warn!(
                    page_index,
                    "vendor-return pagination guard hit — keeping partial collection"
                );
                return Ok(ReturnCollection {
                    items,
                    complete: false,
                });
            }

            match self.fetch_return_page(page_size, page_index).await {
                Ok(page) => {
                    let fetched = page.content.len();
                    items.extend(page.content);
                    tracing::debug!(
                        page_index,
                        fetched,
                        total = items.len(),
                        expected = page.total_elements,
                        "collected vendor-return page"
                    );
                    if fetched < page_size as usize {
                        return Ok(ReturnCollection {
                            items,
                            complete: true,
                        });
                    }
                    page_index += 1;
                }
                Err(e) if page_index == 0 => return Err(e),
                Err(e) => {
                    tracing::warn!(
                        page_index,
                        error = %e,
                        "vendor-return page fetch failed — keeping partial collection"
                    );
                    return Ok(ReturnCollection {
                        items,
                        complete: false,
                    });
                }
            }
        }
    }

    async fn fetch_return_page(
        &self,
        page_size: u32,
        page_index: u32,
    ) -> Result<VendorReturnPage, WingError> {
        let token = self.require_token()?;
        let url = self
            .base_url
            .join(VENDOR_RETURN_ITEMS_PATH)
            .map_err(|e| WingError::InvalidBaseUrl {
                url: self.base_url.to_string(),
                reason: e.to_string(),
            })?;

        let response = self
            .client
            .post(url.clone())
            .header(reqwest::header::ACCEPT, "application/json, text/plain, */*")
            .header("x-xsrf-token", token)
            .json(&json!({ "pageSize": page_size, "pageIndex": page_index }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(WingError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| WingError::Deserialize {
            context: format!("vendor-return page {page_index}"),
            source: e,
        })
    }
}

/// Folds satellite-FC quantities into each item's representative center.
///
/// Items with no satellite codes pass through untouched. When an item has
/// satellite quantities but no representative entry, a zero-quantity
/// `CHA9` entry is created to receive them. Total quantity per item is
/// conserved.
#[must_use]
pub fn merge_fc_quantities(items: Vec<VendorReturnItem>) -> Vec<VendorReturnItem> {
    items.into_iter().map(merge_item_fc_quantities).collect()
}

fn merge_item_fc_quantities(mut item: VendorReturnItem) -> VendorReturnItem {
    let has_satellite = item
        .returnable_qty_by_fc_total
        .keys()
        .any(|code| MERGED_FC_CODES.contains(&code.as_str()));
    if !has_satellite {
        return item;
    }

    let primary = item
        .returnable_qty_by_fc_total
        .keys()
        .find(|code| is_representative_fc_code(code))
        .cloned()
        .unwrap_or_else(|| {
            item.returnable_qty_by_fc_total.insert(
                DEFAULT_REPRESENTATIVE_FC.to_owned(),
                FcQuantity {
                    qty: 0,
                    fc_name: DEFAULT_REPRESENTATIVE_FC.to_owned(),
                },
            );
            DEFAULT_REPRESENTATIVE_FC.to_owned()
        });

    let mut merged_qty: i64 = 0;
    item.returnable_qty_by_fc_total.retain(|code, entry| {
        if MERGED_FC_CODES.contains(&code.as_str()) {
            merged_qty += entry.qty;
            false
        } else {
            true
        }
    });

    if let Some(entry) = item.returnable_qty_by_fc_total.get_mut(&primary) {
        entry.qty += merged_qty;
    }

    item
}

fn is_representative_fc_code(code: &str) -> bool {
    code.starts_with("XRC") || code.starts_with("CHA9")
}
