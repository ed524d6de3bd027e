//! Canonical description of a single outbound request.

use std::fmt::Display;
use std::hash::{Hash, Hasher};

use indexmap::IndexMap;
use url::Url;

use crate::error::FetchError;

/// One request against the catalog API: an endpoint path plus query
/// parameters in the order they were added.
///
/// Descriptors are immutable once built; two descriptors built from the same
/// inputs are equal and render the same [RequestDescriptor::cache_key].
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    endpoint: String,
    params: IndexMap<String, String>,
}

impl RequestDescriptor {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            params: IndexMap::new(),
        }
    }

    /// Add a query parameter, replacing the value of an existing one in place.
    pub fn with_param(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.params.insert(name.into(), value.to_string());
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    pub fn params(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Form-urlencoded query string in insertion order.
    pub fn query_string(&self) -> String {
        url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.params.iter())
            .finish()
    }

    /// `endpoint?query`, usable as a memoization key.
    pub fn cache_key(&self) -> String {
        if self.params.is_empty() {
            self.endpoint.clone()
        } else {
            format!("{}?{}", self.endpoint, self.query_string())
        }
    }

    /// Resolve against `base`, keeping any path prefix of `base` (e.g. `/v4`).
    pub fn url(&self, base: &Url) -> Result<Url, FetchError> {
        let mut base = base.clone();
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let mut url = base
            .join(self.endpoint.trim_start_matches('/'))
            .map_err(|source| FetchError::InvalidUrl {
                endpoint: self.endpoint.clone(),
                source,
            })?;

        if !self.params.is_empty() {
            url.query_pairs_mut().extend_pairs(self.params.iter());
        }
        Ok(url)
    }
}

// Parameter order is part of the identity, `IndexMap`'s own equality ignores it.
impl PartialEq for RequestDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.endpoint == other.endpoint && self.params.iter().eq(other.params.iter())
    }
}

impl Eq for RequestDescriptor {}

impl Hash for RequestDescriptor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.endpoint.hash(state);
        for (name, value) in &self.params {
            name.hash(state);
            value.hash(state);
        }
    }
}

impl Display for RequestDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.cache_key())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn query_string_keeps_insertion_order() {
        let descriptor = RequestDescriptor::new("/anime")
            .with_param("page", 2)
            .with_param("limit", 24)
            .with_param("q", "cowboy bebop");

        assert_eq!(descriptor.query_string(), "page=2&limit=24&q=cowboy+bebop");
        assert_eq!(
            descriptor.cache_key(),
            "/anime?page=2&limit=24&q=cowboy+bebop"
        );
    }

    #[test]
    fn replacing_a_param_keeps_its_position() {
        let descriptor = RequestDescriptor::new("/anime")
            .with_param("page", 1)
            .with_param("limit", 24)
            .with_param("page", 3);

        assert_eq!(descriptor.query_string(), "page=3&limit=24");
        assert_eq!(descriptor.param("page"), Some("3"));
    }

    #[test]
    fn cache_key_without_params_is_the_endpoint() {
        let descriptor = RequestDescriptor::new("/seasons/now");
        assert_eq!(descriptor.cache_key(), "/seasons/now");
    }

    #[test]
    fn equal_descriptors_hash_equal() {
        let build = || RequestDescriptor::new("/anime/1").with_param("x", "y");
        let set: HashSet<_> = [build(), build()].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn url_keeps_base_path() {
        let base = Url::parse("https://api.jikan.moe/v4").unwrap();
        let descriptor = RequestDescriptor::new("/anime/5114/characters");
        assert_eq!(
            descriptor.url(&base).unwrap().as_str(),
            "https://api.jikan.moe/v4/anime/5114/characters"
        );

        let base = Url::parse("https://api.jikan.moe/v4/").unwrap();
        let descriptor = RequestDescriptor::new("/top/anime")
            .with_param("type", "movie")
            .with_param("limit", 10);
        assert_eq!(
            descriptor.url(&base).unwrap().as_str(),
            "https://api.jikan.moe/v4/top/anime?type=movie&limit=10"
        );
    }
}
