//! Query string builders for site pages.

use url::Url;

/// Trait implemented by query builders. Provides URL serialization.
pub trait Query {
    /// Appends this query's parameters to the given URL, returning the modified URL.
    fn add_to_url(&self, url: &Url) -> Url;
}

/// Query for the site-wide search page (`/search/?q=...`).
#[derive(Clone, Debug, Default)]
pub struct SearchQuery {
    /// Free-text search string, sent lowercased.
    pub q: String,
}

impl SearchQuery {
    /// Builds a search for the given name. The name is trimmed and lowercased
    /// the same way the site's own search box submits it.
    pub fn for_name(name: &str) -> Self {
        Self {
            q: name.trim().to_lowercase(),
        }
    }
}

impl Query for SearchQuery {
    fn add_to_url(&self, url: &Url) -> Url {
        let mut url = url.clone();
        url.query_pairs_mut().append_pair("q", &self.q);
        url
    }
}

/// Placeholder for pages fetched without parameters.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoQuery;

impl Query for NoQuery {
    fn add_to_url(&self, url: &Url) -> Url {
        url.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_query_lowercases_and_trims() {
        let q = SearchQuery::for_name("  Jane DOE ");
        assert_eq!(q.q, "jane doe");
    }

    #[test]
    fn search_query_encodes_spaces() {
        let base = Url::parse("https://www.vpap.org/search/").unwrap();
        let url = SearchQuery::for_name("Jane Doe").add_to_url(&base);
        assert_eq!(url.as_str(), "https://www.vpap.org/search/?q=jane+doe");
    }

    #[test]
    fn no_query_leaves_url_untouched() {
        let base = Url::parse("https://www.vpap.org/candidates/1234/").unwrap();
        assert_eq!(NoQuery.add_to_url(&base), base);
    }
}
