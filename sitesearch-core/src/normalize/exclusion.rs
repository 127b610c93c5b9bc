//! Tenant URL exclusions.
//!
//! Excluded URLs and result URLs are compared through a canonical key so
//! that equivalent spellings of one page (scheme, host case, query-parameter
//! order, fragments, trailing slashes) match.

use std::collections::HashSet;

use url::Url;
use url::form_urlencoded;

use crate::provider::RawResult;

/// Canonical comparison key for `raw`.
///
/// Applies the following transformations:
///
/// 1. Parse, assuming `http://` when no scheme is given.
/// 2. Lowercase the host and drop default ports (done by [`Url`]).
/// 3. Remove the fragment.
/// 4. Sort query parameters by key, then value.
/// 5. Remove a trailing slash from the path (unless the path is `"/"`).
/// 6. Drop the scheme, so `http` and `https` variants compare equal.
///
/// Input that cannot be parsed is trimmed and lowercased.
pub fn exclusion_key(raw: &str) -> String {
    let trimmed = raw.trim();
    let parsed = Url::parse(trimmed)
        .ok()
        .filter(Url::has_host)
        .or_else(|| Url::parse(&format!("http://{trimmed}")).ok());
    let Some(mut parsed) = parsed else {
        return trimmed.to_ascii_lowercase();
    };

    parsed.set_fragment(None);

    let mut params: Vec<(String, String)> = parsed
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    if params.is_empty() {
        parsed.set_query(None);
    } else {
        params.sort();
        let query = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(params)
            .finish();
        parsed.set_query(Some(&query));
    }

    let path = parsed.path().to_owned();
    if path.len() > 1 && path.ends_with('/') {
        parsed.set_path(&path[..path.len() - 1]);
    }

    let serialized = parsed.to_string();
    match serialized.split_once("://") {
        Some((_, rest)) => rest.to_owned(),
        None => serialized,
    }
}

/// A tenant's excluded URLs, ready for lookups.
#[derive(Debug, Clone, Default)]
pub struct ExclusionSet {
    keys: HashSet<String>,
}

impl ExclusionSet {
    /// Build the set from configured URLs. Blank entries are ignored.
    pub fn new<I, S>(urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keys = urls
            .into_iter()
            .filter(|url| !url.as_ref().trim().is_empty())
            .map(|url| exclusion_key(url.as_ref()))
            .collect();
        Self { keys }
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether `url` is excluded.
    pub fn contains(&self, url: &str) -> bool {
        !self.keys.is_empty() && self.keys.contains(&exclusion_key(url))
    }

    /// Drop excluded results in place, keeping rank order. Returns how many
    /// were dropped.
    pub fn retain(&self, results: &mut Vec<RawResult>) -> usize {
        if self.keys.is_empty() {
            return 0;
        }
        let before = results.len();
        results.retain(|result| !self.contains(&result.url));
        before - results.len()
    }
}
