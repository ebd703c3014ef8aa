//! WING API response types.
//!
//! ## Observed shapes
//!
//! ### Pre-matching search
//! The keyword search returns an envelope with a `result` array plus paging
//! hints (`nextSearchPage`, `hasNext`). The metrics fields (`pvLast28Day`,
//! `salesLast28d`) are plain numbers but have been observed absent on
//! freshly listed products, so they are modeled as optional rather than
//! defaulting to zero — a missing counter means "unknown", and rendering it
//! as 0 would corrupt the derived conversion rate.
//!
//! ### `brandName`
//! Explicitly `null` for unbranded listings (not omitted, not `""`).
//!
//! ### Vendor-return item list
//! A classic page envelope (`content` + `totalElements`). Per-item
//! fulfillment-center quantities arrive as an object keyed by FC code; a
//! `BTreeMap` keeps downstream export rows in a deterministic order.

use std::collections::BTreeMap;

use serde::Deserialize;

/// Envelope from the pre-matching keyword search.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    #[serde(default)]
    pub result: Vec<WingProduct>,
    #[serde(default)]
    pub next_search_page: Option<i64>,
    #[serde(default)]
    pub has_next: bool,
}

/// One product row from the pre-matching search.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WingProduct {
    pub product_id: i64,
    pub item_id: i64,
    #[serde(default)]
    pub vendor_item_id: Option<i64>,
    #[serde(default)]
    pub product_name: Option<String>,
    #[serde(default)]
    pub item_name: Option<String>,
    #[serde(default)]
    pub brand_name: Option<String>,
    /// Page views over the trailing 28 days. Absent on fresh listings.
    #[serde(default)]
    pub pv_last_28_day: Option<f64>,
    /// Units sold over the trailing 28 days. Absent on fresh listings.
    #[serde(default)]
    pub sales_last_28d: Option<f64>,
    #[serde(default)]
    pub sale_price: Option<f64>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub rating_count: Option<i64>,
}

/// One page of the vendor-return item list.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VendorReturnPage {
    #[serde(default)]
    pub content: Vec<VendorReturnItem>,
    #[serde(default)]
    pub total_elements: i64,
}

/// One returnable inventory row.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VendorReturnItem {
    #[serde(default)]
    pub vendor_item_id: Option<i64>,
    #[serde(default)]
    pub vendor_inventory_id: Option<i64>,
    #[serde(default)]
    pub vendor_inventory_name: Option<String>,
    #[serde(default)]
    pub vendor_inventory_item_name: Option<String>,
    #[serde(default)]
    pub vendor_id: Option<String>,
    #[serde(default)]
    pub sku_id: Option<i64>,
    #[serde(default)]
    pub product_id: Option<i64>,
    #[serde(default)]
    pub image_url: Option<String>,
    /// CDN path fragment used to reconstruct `image_url` when absent.
    #[serde(default)]
    pub main_image_end_point: Option<String>,
    #[serde(default)]
    pub returnable_qty_total: Option<i64>,
    /// Returnable quantity per fulfillment center, keyed by FC code.
    #[serde(default, rename = "returnableQtyByFCTotal")]
    pub returnable_qty_by_fc_total: BTreeMap<String, FcQuantity>,
}

/// Quantity entry for a single fulfillment center.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FcQuantity {
    #[serde(default)]
    pub qty: i64,
    #[serde(default)]
    pub fc_name: String,
}
