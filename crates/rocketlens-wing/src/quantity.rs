//! Price-option validation via the retail quantity-info endpoint.
//!
//! A WING search row carries one `salePrice` and one combined 28-day sales
//! counter even when the product sells under several purchase options with
//! different prices. This module fetches the retail side's option list and
//! flags the divergence so revenue estimates can fall back to a
//! conservative lowest-price floor.
//!
//! The validator is best-effort enrichment: every failure mode (network,
//! malformed body, too few options) degrades to `None` and must never block
//! the primary metrics flow.
//!
//! ## Observed response shape
//!
//! The endpoint returns either a single object or a one-element array of
//! it. `moduleData` holds heterogeneous modules; the detail-option modules
//! carry fine-grained `items` (preferred), older responses only a flat
//! `optionList`. Some items omit `itemBasicInfo` and expose the ids at the
//! top level instead. Prices are formatted strings (`"12,900원"`).

use std::time::Duration;

use reqwest::{Client, Url};
use serde::Deserialize;

use rocketlens_core::product::{OptionPrice, PriceValidation};
use rocketlens_core::AppConfig;

use crate::error::WingError;

const QUANTITY_INFO_PATH: &str = "next-api/products/quantity-info";

/// Client for the retail storefront's quantity-info endpoint.
pub struct RetailClient {
    client: Client,
    base_url: Url,
}

impl RetailClient {
    /// Creates a client pointed at the configured retail base URL.
    ///
    /// # Errors
    ///
    /// Returns [`WingError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`WingError::InvalidBaseUrl`] for an
    /// unparseable base URL.
    pub fn new(config: &AppConfig) -> Result<Self, WingError> {
        Self::with_base_url(
            &config.retail_base_url,
            config.request_timeout_secs,
            &config.user_agent,
        )
    }

    /// Creates a client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`WingError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`WingError::InvalidBaseUrl`] for an
    /// unparseable base URL.
    pub fn with_base_url(
        base_url: &str,
        timeout_secs: u64,
        user_agent: &str,
    ) -> Result<Self, WingError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;

        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| WingError::InvalidBaseUrl {
            url: base_url.to_owned(),
            reason: e.to_string(),
        })?;

        Ok(Self { client, base_url })
    }

    /// Checks whether the product's sibling purchase options carry
    /// diverging prices.
    ///
    /// Returns `None` when fewer than two valid options exist, when all
    /// prices are equal, or when the fetch/parse fails in any way.
    pub async fn validate_option_prices(
        &self,
        product_id: &str,
        vendor_option_id: &str,
        observed_price: f64,
    ) -> Option<PriceValidation> {
        match self.fetch_quantity_info(product_id, vendor_option_id).await {
            Ok(info) => build_price_validation(
                &info,
                product_id,
                observed_price,
                self.base_url.as_str().trim_end_matches('/'),
            ),
            Err(e) => {
                tracing::debug!(
                    product_id,
                    vendor_option_id,
                    error = %e,
                    "price validation skipped"
                );
                None
            }
        }
    }

    async fn fetch_quantity_info(
        &self,
        product_id: &str,
        vendor_option_id: &str,
    ) -> Result<QuantityInfoResponse, WingError> {
        let mut url = self.base_url.join(QUANTITY_INFO_PATH).map_err(|e| {
            WingError::InvalidBaseUrl {
                url: self.base_url.to_string(),
                reason: e.to_string(),
            }
        })?;
        url.query_pairs_mut()
            .append_pair("productId", product_id)
            .append_pair("vendorItemId", vendor_option_id);

        let response = self
            .client
            .get(url.clone())
            .header(reqwest::header::ACCEPT, "application/json, text/plain, */*")
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
        parse_quantity_info(&body, product_id)
    }
}

/// Parses the quantity-info body, unwrapping the one-element-array variant.
fn parse_quantity_info(body: &str, product_id: &str) -> Result<QuantityInfoResponse, WingError> {
    let value: serde_json::Value =
        serde_json::from_str(body).map_err(|e| WingError::Deserialize {
            context: format!("quantity-info for product {product_id}"),
            source: e,
        })?;

    let object = match value {
        serde_json::Value::Array(mut elements) if !elements.is_empty() => elements.remove(0),
        serde_json::Value::Array(_) => {
            return Err(WingError::Deserialize {
                context: format!("quantity-info for product {product_id}"),
                source: serde::de::Error::custom("empty array response"),
            })
        }
        other => other,
    };

    serde_json::from_value(object).map_err(|e| WingError::Deserialize {
        context: format!("quantity-info for product {product_id}"),
        source: e,
    })
}

/// Builds the validation result from a parsed response. Pure, so the
/// option-extraction rules are testable without HTTP.
fn build_price_validation(
    info: &QuantityInfoResponse,
    product_id: &str,
    observed_price: f64,
    retail_base: &str,
) -> Option<PriceValidation> {
    let mut options = extract_detail_options(info, product_id, retail_base);
    if options.is_empty() {
        options = extract_list_options(info, product_id, retail_base);
    }

    // Fewer than two priced options: nothing to compare.
    if options.len() < 2 {
        return None;
    }

    let first_price = options[0].sale_price;
    if options.iter().all(|o| o.sale_price == first_price) {
        return None;
    }

    let lowest_price = options
        .iter()
        .map(|o| o.sale_price)
        .fold(f64::INFINITY, f64::min);

    Some(PriceValidation {
        has_price_difference: true,
        options,
        lowest_price,
        api_observed_price: observed_price,
    })
}

/// Fine-grained detail items (preferred source).
fn extract_detail_options(
    info: &QuantityInfoResponse,
    product_id: &str,
    retail_base: &str,
) -> Vec<OptionPrice> {
    let mut options = Vec::new();
    for module in &info.module_data {
        for item in &module.items {
            if item.stock_info.as_ref().is_some_and(|s| s.sold_out) {
                continue;
            }
            let Some(price) = item
                .price_info
                .as_ref()
                .and_then(|p| p.final_price.as_deref())
                .and_then(parse_price_digits)
            else {
                continue;
            };

            let basic = item.item_basic_info.as_ref();
            let Some(item_id) = basic.and_then(|b| b.item_id).or(item.item_id) else {
                continue;
            };
            let Some(vendor_option_id) = basic.and_then(|b| b.vendor_item_id).or(item.vendor_item_id)
            else {
                continue;
            };

            let product_url = item
                .action
                .as_ref()
                .and_then(|a| a.event.as_ref())
                .and_then(|e| e.url.as_deref())
                .map(|path| absolutize(retail_base, path))
                .or_else(|| item.product_url.clone())
                .unwrap_or_else(|| {
                    build_product_url(retail_base, product_id, item_id, vendor_option_id)
                });

            options.push(OptionPrice {
                option_item_id: item_id.to_string(),
                vendor_option_id: vendor_option_id.to_string(),
                sale_price: price,
                option_label: basic.and_then(|b| b.item_name.clone()),
                product_url,
            });
        }
    }
    options
}

/// Flat option list (older responses).
fn extract_list_options(
    info: &QuantityInfoResponse,
    product_id: &str,
    retail_base: &str,
) -> Vec<OptionPrice> {
    let mut options = Vec::new();
    for module in &info.module_data {
        for opt in &module.option_list {
            let Some(price) = opt.final_price.as_deref().and_then(parse_price_digits) else {
                continue;
            };
            let (Some(item_id), Some(vendor_option_id)) = (opt.item_id, opt.vendor_item_id) else {
                continue;
            };

            let option_label = opt
                .option_item_name
                .clone()
                .or_else(|| opt.item_basic_info.as_ref().and_then(|b| b.item_name.clone()))
                .or_else(|| opt.title.clone())
                .or_else(|| opt.item_name.clone());

            options.push(OptionPrice {
                option_item_id: item_id.to_string(),
                vendor_option_id: vendor_option_id.to_string(),
                sale_price: price,
                option_label,
                product_url: opt.product_url.clone().unwrap_or_else(|| {
                    build_product_url(retail_base, product_id, item_id, vendor_option_id)
                }),
            });
        }
    }
    options
}

/// Strips everything but digits and parses the remainder. An empty result
/// after stripping means the string carried no price at all — the option is
/// excluded rather than failing the validation.
fn parse_price_digits(raw: &str) -> Option<f64> {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse::<f64>().ok()
}

fn absolutize(retail_base: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_owned();
    }
    if path.starts_with('/') {
        format!("{retail_base}{path}")
    } else {
        format!("{retail_base}/{path}")
    }
}

fn build_product_url(
    retail_base: &str,
    product_id: &str,
    item_id: i64,
    vendor_option_id: i64,
) -> String {
    format!(
        "{retail_base}/vp/products/{product_id}?itemId={item_id}&vendorItemId={vendor_option_id}"
    )
}

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuantityInfoResponse {
    #[serde(default)]
    pub module_data: Vec<QuantityModule>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuantityModule {
    #[serde(default)]
    pub view_type: Option<String>,
    #[serde(default)]
    pub items: Vec<DetailOptionItem>,
    #[serde(default)]
    pub option_list: Vec<ListOptionItem>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailOptionItem {
    #[serde(default)]
    pub action: Option<ItemAction>,
    #[serde(default)]
    pub price_info: Option<PriceInfo>,
    #[serde(default)]
    pub item_basic_info: Option<ItemBasicInfo>,
    #[serde(default)]
    pub stock_info: Option<StockInfo>,
    // Fallback top-level ids; some responses omit itemBasicInfo.
    #[serde(default)]
    pub item_id: Option<i64>,
    #[serde(default)]
    pub vendor_item_id: Option<i64>,
    #[serde(default)]
    pub product_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ItemAction {
    #[serde(default)]
    pub event: Option<ActionEvent>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ActionEvent {
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceInfo {
    #[serde(default)]
    pub final_price: Option<String>,
    #[serde(default)]
    pub final_unit_price: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemBasicInfo {
    #[serde(default)]
    pub item_id: Option<i64>,
    #[serde(default)]
    pub item_name: Option<String>,
    #[serde(default)]
    pub vendor_item_id: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockInfo {
    #[serde(default)]
    pub sold_out: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListOptionItem {
    #[serde(default)]
    pub item_id: Option<i64>,
    #[serde(default)]
    pub vendor_item_id: Option<i64>,
    #[serde(default)]
    pub final_price: Option<String>,
    #[serde(default)]
    pub product_url: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub item_name: Option<String>,
    #[serde(default)]
    pub option_item_name: Option<String>,
    #[serde(default)]
    pub item_basic_info: Option<ItemBasicInfo>,
}

#[cfg(test)]
#[path = "quantity_test.rs"]
mod tests;
