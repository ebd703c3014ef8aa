//! CSV export surfaces.
//!
//! Reconciled metrics export splits Complete-status products into normal
//! and sponsored groups, one file per non-empty group; vendor-return export
//! flattens each item into one row per fulfillment center. The spreadsheet
//! container format is out of scope — CSV opens in the same tools.

use std::path::{Path, PathBuf};

use serde::Serialize;

use rocketlens_core::format::format_count;
use rocketlens_core::product::{ProductKind, ProductState};
use rocketlens_wing::VendorReturnItem;

const IMAGE_CDN_BASE: &str = "https://image1.coupangcdn.com/image";

#[derive(Debug, Serialize)]
pub struct MetricsRow {
    product_id: String,
    product_name: String,
    brand_name: String,
    page_views_28d: String,
    sales_28d: String,
    conversion_rate: String,
    estimated_revenue: String,
}

#[derive(Debug, Serialize)]
pub struct ReturnRow {
    vendor_item_id: String,
    vendor_inventory_id: String,
    vendor_inventory_name: String,
    vendor_inventory_item_name: String,
    vendor_id: String,
    sku_id: String,
    product_id: String,
    image_url: String,
    fc_code: String,
    fc_name: String,
    qty: String,
    returnable_qty_total: String,
}

/// Writes the Complete-status subset as CSV, one file per non-empty group
/// (normal / sponsored). Returns the paths written.
///
/// # Errors
///
/// Propagates file-creation and serialization failures.
pub fn export_metrics_csv(
    states: &[ProductState],
    dir: &Path,
) -> anyhow::Result<Vec<PathBuf>> {
    let stamp = timestamp();
    let mut written = Vec::new();

    for (kind, group) in [
        (ProductKind::Normal, "normal"),
        (ProductKind::Sponsored, "sponsored"),
    ] {
        let rows = metrics_rows(states, kind);
        if rows.is_empty() {
            continue;
        }
        let path = dir.join(format!("products_{group}_{stamp}.csv"));
        write_rows(&path, &rows)?;
        written.push(path);
    }

    Ok(written)
}

/// Writes the flattened vendor-return rows as CSV and returns the path.
///
/// # Errors
///
/// Propagates file-creation and serialization failures.
pub fn export_vendor_return_csv(
    items: &[VendorReturnItem],
    dir: &Path,
) -> anyhow::Result<PathBuf> {
    let path = dir.join(format!("vendor-return_{}.csv", timestamp()));
    write_rows(&path, &return_rows(items))?;
    Ok(path)
}

fn write_rows<T: Serialize>(path: &Path, rows: &[T]) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

fn metrics_rows(states: &[ProductState], kind: ProductKind) -> Vec<MetricsRow> {
    states
        .iter()
        .filter(|state| state.is_complete() && state.record.kind == kind)
        .map(|state| {
            let metrics = state.metrics.as_ref();
            MetricsRow {
                product_id: state.record.product_id.clone().unwrap_or_default(),
                product_name: state.record.display_name.clone(),
                brand_name: metrics
                    .and_then(|m| m.brand_name.clone())
                    .unwrap_or_default(),
                page_views_28d: format_count(metrics.and_then(|m| m.page_views_28d)),
                sales_28d: format_count(metrics.and_then(|m| m.sales_28d)),
                conversion_rate: metrics
                    .map(|m| m.conversion_rate.clone())
                    .unwrap_or_default(),
                estimated_revenue: format_count(metrics.and_then(|m| m.estimated_revenue)),
            }
        })
        .collect()
}

fn return_rows(items: &[VendorReturnItem]) -> Vec<ReturnRow> {
    let mut rows = Vec::new();
    for item in items {
        if item.returnable_qty_by_fc_total.is_empty() {
            rows.push(return_row(item, "", "", None));
        } else {
            for (fc_code, entry) in &item.returnable_qty_by_fc_total {
                rows.push(return_row(item, fc_code, &entry.fc_name, Some(entry.qty)));
            }
        }
    }
    rows
}

fn return_row(
    item: &VendorReturnItem,
    fc_code: &str,
    fc_name: &str,
    qty: Option<i64>,
) -> ReturnRow {
    ReturnRow {
        vendor_item_id: opt_string(item.vendor_item_id.as_ref()),
        vendor_inventory_id: opt_string(item.vendor_inventory_id.as_ref()),
        vendor_inventory_name: item.vendor_inventory_name.clone().unwrap_or_default(),
        vendor_inventory_item_name: item.vendor_inventory_item_name.clone().unwrap_or_default(),
        vendor_id: item.vendor_id.clone().unwrap_or_default(),
        sku_id: opt_string(item.sku_id.as_ref()),
        product_id: opt_string(item.product_id.as_ref()),
        image_url: item.image_url.clone().unwrap_or_else(|| {
            item.main_image_end_point
                .as_deref()
                .map(|endpoint| format!("{IMAGE_CDN_BASE}/{endpoint}"))
                .unwrap_or_default()
        }),
        fc_code: fc_code.to_owned(),
        fc_name: fc_name.to_owned(),
        qty: qty.map(|q| q.to_string()).unwrap_or_default(),
        returnable_qty_total: opt_string(item.returnable_qty_total.as_ref()),
    }
}

fn opt_string<T: ToString>(value: Option<&T>) -> String {
    value.map(ToString::to_string).unwrap_or_default()
}

fn timestamp() -> String {
    chrono::Local::now().format("%Y%m%d_%H%M%S").to_string()
}
