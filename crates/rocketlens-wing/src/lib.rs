pub mod client;
pub mod error;
pub mod quantity;
pub mod types;
pub mod vendor_return;

pub use client::WingClient;
pub use error::WingError;
pub use quantity::RetailClient;
pub use types::{FcQuantity, SearchResponse, VendorReturnItem, VendorReturnPage, WingProduct};
pub use vendor_return::{merge_fc_quantities, ReturnCollection};
