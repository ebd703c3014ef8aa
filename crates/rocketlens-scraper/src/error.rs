use thiserror::Error;

/// Errors from page-HTML parsing.
#[derive(Debug, Error)]
pub enum ParseError {
    /// No layout strategy could locate a product list container in the
    /// page. Distinct from a located container with zero items, which is a
    /// valid empty parse.
    #[error("no recognizable product list container in the page")]
    NoProductList,
}
