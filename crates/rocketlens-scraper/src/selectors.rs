//! Centralized CSS selectors for the supported page layouts.
//!
//! The storefront ships hashed utility class names (`ProductUnit_productUnit__Qd6sv`);
//! the selectors match on the stable prefix so a hash rotation does not
//! break the parser.

/// Search-result layout: table-like root with generic list items.
pub const SEARCH_LIST_ROOT: &str = "#product-list";
pub const SEARCH_LIST_ITEM: &str = r#"li[class*="ProductUnit_productUnit"]"#;
pub const SEARCH_LIST_NAME: &str = r#"[class*="ProductUnit_productName"]"#;

/// Card layout: flex cards under a dedicated list element.
pub const CARD_GRID_ROOT: &str = "ul.products-list";
pub const CARD_GRID_ITEM: &str = "li.product-wrap, li.product-wrapper";
pub const CARD_GRID_NAME: &str = ".name";

/// Sponsored-listing marker element.
pub const AD_MARK: &str = r#"[class*="AdMark_adMark"]"#;

/// Product anchor, shared by both layouts.
pub const PRODUCT_ANCHOR: &str = r#"a[href*="/products/"]"#;
