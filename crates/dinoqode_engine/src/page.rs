use scraper::{ElementRef, Html, Selector};
use url::Url;

/// A loaded page: its location plus a queryable document snapshot.
///
/// All lookups are tolerant: an invalid selector, a missing element or an
/// empty value yields `None` instead of an error.
pub struct PageContext {
    url: Url,
    document: Html,
}

impl PageContext {
    pub fn new(url: Url, html: &str) -> Self {
        Self {
            url,
            document: Html::parse_document(html),
        }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Visible text of the first match, whitespace-collapsed.
    pub fn text(&self, selector: &str) -> Option<String> {
        self.first(selector)
            .map(|el| collapse_whitespace(&el.text().collect::<String>()))
            .filter(|t| !t.is_empty())
    }

    /// Trimmed attribute value of the first match.
    pub fn attr(&self, selector: &str, name: &str) -> Option<String> {
        self.first(selector)
            .and_then(|el| el.value().attr(name))
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    /// Last non-empty path segment of the page URL.
    pub fn last_path_segment(&self) -> Option<String> {
        self.url
            .path_segments()?
            .filter(|s| !s.is_empty())
            .last()
            .map(ToOwned::to_owned)
    }

    /// Resolves a possibly relative reference against the page URL.
    pub fn resolve(&self, reference: &str) -> Option<String> {
        let trimmed = reference.trim();
        if trimmed.is_empty() {
            return None;
        }
        if let Ok(url) = Url::parse(trimmed) {
            return Some(url.into());
        }
        self.url.join(trimmed).ok().map(Into::into)
    }

    fn first(&self, selector: &str) -> Option<ElementRef<'_>> {
        let sel = Selector::parse(selector).ok()?;
        self.document.select(&sel).next()
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::PageContext;
    use url::Url;

    fn page(url: &str, html: &str) -> PageContext {
        PageContext::new(Url::parse(url).unwrap(), html)
    }

    #[test]
    fn text_is_collapsed_and_blank_is_none() {
        let p = page(
            "https://example.com/",
            "<p class='a'>  Hello \n  World </p><p class='b'>   </p>",
        );
        assert_eq!(p.text("p.a").as_deref(), Some("Hello World"));
        assert_eq!(p.text("p.b"), None);
        assert_eq!(p.text("p.missing"), None);
    }

    #[test]
    fn invalid_selector_is_none() {
        let p = page("https://example.com/", "<p>x</p>");
        assert_eq!(p.text("p[["), None);
    }

    #[test]
    fn last_segment_ignores_query_and_trailing_slash() {
        let p = page("https://open.spotify.com/album/4aaw/?si=abc", "");
        assert_eq!(p.last_path_segment().as_deref(), Some("4aaw"));
    }

    #[test]
    fn relative_reference_is_resolved() {
        let p = page("https://example.com/album/1", "");
        assert_eq!(
            p.resolve("/img/a.png").as_deref(),
            Some("https://example.com/img/a.png")
        );
        assert_eq!(
            p.resolve("//cdn.example.com/b.png").as_deref(),
            Some("https://cdn.example.com/b.png")
        );
    }
}
