//! Search-keyword derivation from the page context.

use scraper::{Html, Selector};
use url::Url;

/// Derives the batch-search keyword for a listing page.
///
/// The explicit `q` query parameter of the page URL wins; when absent, the
/// first `h1` heading's text is the best-effort fallback. Returns `None`
/// when neither yields a non-empty keyword — the orchestrator surfaces that
/// as its no-keyword failure.
#[must_use]
pub fn derive_search_keyword(page_url: &str, html: &str) -> Option<String> {
    if let Ok(url) = Url::parse(page_url) {
        if let Some((_, value)) = url.query_pairs().find(|(key, _)| key == "q") {
            let value = value.trim();
            if !value.is_empty() {
                return Some(value.to_owned());
            }
        }
    }

    let document = Html::parse_document(html);
    let h1 = Selector::parse("h1").expect("valid selector");
    document
        .select(&h1)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_owned())
        .filter(|text| !text.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_query_parameter_wins() {
        let keyword = derive_search_keyword(
            "https://www.coupang.com/np/search?component=&q=tumbler&channel=user",
            "<h1>Something else</h1>",
        );
        assert_eq!(keyword.as_deref(), Some("tumbler"));
    }

    #[test]
    fn percent_encoded_keyword_is_decoded() {
        let keyword = derive_search_keyword(
            "https://www.coupang.com/np/search?q=%ED%85%80%EB%B8%94%EB%9F%AC",
            "",
        );
        assert_eq!(keyword.as_deref(), Some("텀블러"));
    }

    #[test]
    fn falls_back_to_first_heading() {
        let keyword = derive_search_keyword(
            "https://shop.coupang.com/brand/123",
            "<html><body><h1>  Ceramic Mugs </h1><h1>Other</h1></body></html>",
        );
        assert_eq!(keyword.as_deref(), Some("Ceramic Mugs"));
    }

    #[test]
    fn empty_q_falls_back_to_heading() {
        let keyword = derive_search_keyword(
            "https://www.coupang.com/np/search?q=",
            "<h1>Mug</h1>",
        );
        assert_eq!(keyword.as_deref(), Some("Mug"));
    }

    #[test]
    fn none_when_nothing_derivable() {
        let keyword = derive_search_keyword(
            "https://shop.coupang.com/brand/123",
            "<html><body><p>no heading</p></body></html>",
        );
        assert_eq!(keyword, None);
    }
}
