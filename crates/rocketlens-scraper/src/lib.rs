pub mod error;
pub mod keyword;
pub mod layout;
pub mod selectors;

pub use error::ParseError;
pub use keyword::derive_search_keyword;
pub use layout::parse_product_list;
