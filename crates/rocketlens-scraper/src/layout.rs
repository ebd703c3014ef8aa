//! Layout-strategy parser for rendered product list pages.
//!
//! The storefront has shipped several markups for the same list. Each known
//! shape is a named strategy `fn(&Html) -> Option<Vec<ProductRecord>>`
//! returning `None` when its container is absent; the parser tries the
//! strategies in order and uses the first hit. A located container with no
//! items is a valid empty parse, not a miss.

use scraper::{ElementRef, Html, Selector};

use rocketlens_core::product::{ProductKind, ProductRecord};

use crate::error::ParseError;
use crate::selectors;

struct LayoutStrategy {
    name: &'static str,
    extract: fn(&Html) -> Option<Vec<ProductRecord>>,
}

const LAYOUTS: &[LayoutStrategy] = &[
    LayoutStrategy {
        name: "search-list",
        extract: extract_search_list,
    },
    LayoutStrategy {
        name: "card-grid",
        extract: extract_card_grid,
    },
];

/// Parses the current page HTML into ordered product records (DOM order).
///
/// Re-invocation re-scrapes the given markup; records lacking a stable
/// `data-id` receive a synthetic identifier that is unique within this
/// parse but not stable across parses.
///
/// # Errors
///
/// Returns [`ParseError::NoProductList`] when no strategy locates its
/// container.
pub fn parse_product_list(html: &str) -> Result<Vec<ProductRecord>, ParseError> {
    let document = Html::parse_document(html);

    for layout in LAYOUTS {
        if let Some(records) = (layout.extract)(&document) {
            tracing::debug!(
                layout = layout.name,
                count = records.len(),
                "parsed product list"
            );
            return Ok(records);
        }
    }

    tracing::warn!("no product list container found in page");
    Err(ParseError::NoProductList)
}

fn extract_search_list(document: &Html) -> Option<Vec<ProductRecord>> {
    extract_with(
        document,
        selectors::SEARCH_LIST_ROOT,
        selectors::SEARCH_LIST_ITEM,
        selectors::SEARCH_LIST_NAME,
    )
}

fn extract_card_grid(document: &Html) -> Option<Vec<ProductRecord>> {
    extract_with(
        document,
        selectors::CARD_GRID_ROOT,
        selectors::CARD_GRID_ITEM,
        selectors::CARD_GRID_NAME,
    )
}

fn extract_with(
    document: &Html,
    root_selector: &str,
    item_selector: &str,
    name_selector: &str,
) -> Option<Vec<ProductRecord>> {
    let root_sel = Selector::parse(root_selector).expect("valid selector");
    let item_sel = Selector::parse(item_selector).expect("valid selector");

    let root = document.select(&root_sel).next()?;
    let records = root
        .select(&item_sel)
        .enumerate()
        .map(|(index, item)| record_from_item(item, index, name_selector))
        .collect();
    Some(records)
}

fn record_from_item(item: ElementRef<'_>, index: usize, name_selector: &str) -> ProductRecord {
    let record_id = item
        .value()
        .attr("data-id")
        .filter(|id| !id.is_empty() && *id != "0")
        .map_or_else(|| synthetic_record_id(index), str::to_owned);

    let href = product_anchor_href(item);
    let (product_id, item_id, vendor_option_id) =
        href.map_or((None, None, None), parse_anchor_ids);

    let display_name = element_text(item, name_selector)
        .or_else(|| element_text(item, selectors::CARD_GRID_NAME))
        .unwrap_or_default();

    let ad_sel = Selector::parse(selectors::AD_MARK).expect("valid selector");
    let kind = if item.select(&ad_sel).next().is_some() {
        ProductKind::Sponsored
    } else {
        ProductKind::Normal
    };

    ProductRecord {
        record_id,
        product_id,
        item_id,
        vendor_option_id,
        display_name,
        kind,
    }
}

/// The product anchor of an item: the dedicated `/products/` link when
/// present, otherwise the first anchor at all (older markup keeps the link
/// on the first child).
fn product_anchor_href(item: ElementRef<'_>) -> Option<&str> {
    let product_anchor = Selector::parse(selectors::PRODUCT_ANCHOR).expect("valid selector");
    if let Some(a) = item.select(&product_anchor).next() {
        return a.value().attr("href");
    }
    let any_anchor = Selector::parse("a").expect("valid selector");
    item.select(&any_anchor).next().and_then(|a| a.value().attr("href"))
}

/// Pulls `(product_id, item_id, vendor_option_id)` out of an item anchor.
///
/// The path carries the product id (`/products/<digits>`); the option and
/// vendor identifiers ride as query parameters on option-suffixed links.
/// Unrecognized shapes yield all-absent identifiers — such records can
/// never match and are settled by the orchestrator.
fn parse_anchor_ids(href: &str) -> (Option<String>, Option<String>, Option<String>) {
    let product_re = regex::Regex::new(r"products/(\d+)").expect("valid regex");
    let product_id = product_re
        .captures(href)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_owned());

    let mut item_id = None;
    let mut vendor_option_id = None;
    if let Some(query) = href.split('?').nth(1) {
        let query = query.split('#').next().unwrap_or(query);
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                "itemId" if !value.is_empty() => item_id = Some(value.into_owned()),
                "vendorItemId" if !value.is_empty() => {
                    vendor_option_id = Some(value.into_owned());
                }
                _ => {}
            }
        }
    }

    (product_id, item_id, vendor_option_id)
}

fn element_text(item: ElementRef<'_>, selector: &str) -> Option<String> {
    let sel = Selector::parse(selector).expect("valid selector");
    item.select(&sel)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_owned())
        .filter(|text| !text.is_empty())
}

/// `auto-<millis>-<index>`: unique within one parse; a re-parse assigns new
/// ids, so synthetic ids must not be used for cross-parse identity.
fn synthetic_record_id(index: usize) -> String {
    format!("auto-{}-{index}", chrono::Utc::now().timestamp_millis())
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    const SEARCH_PAGE: &str = r#"
        <html><body>
        <ul id="product-list">
            <li class="ProductUnit_productUnit__Qd6sv" data-id="7001">
                <a href="/vp/products/123?itemId=456&vendorItemId=789">
                    <div class="ProductUnit_productName__gre7e">Stainless Tumbler 600ml</div>
                </a>
            </li>
            <li class="ProductUnit_productUnit__Qd6sv" data-id="7002">
                <a href="/vp/products/124">
                    <span class="AdMark_adMark__KPMsC">AD</span>
                    <div class="ProductUnit_productName__gre7e">Tumbler Lid</div>
                </a>
            </li>
            <li class="SearchResult_banner">not a product</li>
        </ul>
        </body></html>
    "#;

    const CARD_PAGE: &str = r#"
        <html><body>
        <ul class="products-list">
            <li class="product-wrap" data-id="9001">
                <div><a href="https://shop.example.com/products/555?itemId=666">
                    <div class="name">Ceramic Mug</div>
                </a></div>
            </li>
            <li class="product-wrapper">
                <div><a href="/products/556"><div class="name">Mug Set</div></a></div>
            </li>
        </ul>
        </body></html>
    "#;

    #[test]
    fn parses_search_list_layout() {
        let records = parse_product_list(SEARCH_PAGE).unwrap();
        assert_eq!(records.len(), 2, "banner li must be filtered out");

        let first = &records[0];
        assert_eq!(first.record_id, "7001");
        assert_eq!(first.product_id.as_deref(), Some("123"));
        assert_eq!(first.item_id.as_deref(), Some("456"));
        assert_eq!(first.vendor_option_id.as_deref(), Some("789"));
        assert_eq!(first.display_name, "Stainless Tumbler 600ml");
        assert_eq!(first.kind, ProductKind::Normal);
    }

    #[test]
    fn flags_sponsored_items() {
        let records = parse_product_list(SEARCH_PAGE).unwrap();
        assert_eq!(records[1].kind, ProductKind::Sponsored);
        assert_eq!(records[1].item_id, None, "no query params on plain link");
    }

    #[test]
    fn parses_card_grid_layout() {
        let records = parse_product_list(CARD_PAGE).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].record_id, "9001");
        assert_eq!(records[0].product_id.as_deref(), Some("555"));
        assert_eq!(records[0].item_id.as_deref(), Some("666"));
        assert_eq!(records[0].display_name, "Ceramic Mug");
    }

    #[test]
    fn missing_data_id_gets_a_synthetic_unique_id() {
        let records = parse_product_list(CARD_PAGE).unwrap();
        assert!(records[1].record_id.starts_with("auto-"));

        let ids: HashSet<&str> = records.iter().map(|r| r.record_id.as_str()).collect();
        assert_eq!(ids.len(), records.len(), "record ids unique within a parse");
    }

    #[test]
    fn zero_data_id_is_treated_as_missing() {
        let html = r#"
            <ul id="product-list">
                <li class="ProductUnit_productUnit__x" data-id="0"><a href="/products/1"></a></li>
            </ul>
        "#;
        let records = parse_product_list(html).unwrap();
        assert!(records[0].record_id.starts_with("auto-"));
    }

    #[test]
    fn unrecognized_anchor_leaves_identifiers_absent() {
        let html = r#"
            <ul id="product-list">
                <li class="ProductUnit_productUnit__x" data-id="1">
                    <a href="/np/campaigns/81">campaign</a>
                </li>
            </ul>
        "#;
        let records = parse_product_list(html).unwrap();
        assert_eq!(records[0].product_id, None);
        assert_eq!(records[0].item_id, None);
        assert_eq!(records[0].display_name, "");
    }

    #[test]
    fn located_container_with_no_items_is_a_valid_empty_parse() {
        let html = r#"<ul id="product-list"><li class="other"></li></ul>"#;
        let records = parse_product_list(html).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn unrecognized_page_fails_with_no_product_list() {
        let html = "<html><body><p>maintenance page</p></body></html>";
        let result = parse_product_list(html);
        assert!(matches!(result, Err(ParseError::NoProductList)));
    }

    #[test]
    fn anchor_ids_ignore_fragment_suffix() {
        let (product, item, vendor) = parse_anchor_ids("/products/9?itemId=10#reviews");
        assert_eq!(product.as_deref(), Some("9"));
        assert_eq!(item.as_deref(), Some("10"));
        assert_eq!(vendor, None);
    }
}
