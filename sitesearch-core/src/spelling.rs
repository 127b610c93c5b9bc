//! Spelling correction cleanup.
//!
//! Providers return corrections with their own decoration: highlight
//! markers, scope-id trailers and the site restrictions that were appended
//! to the query. [`resolve`] strips all of that and only returns a
//! suggestion that actually differs from what the user typed.

use crate::normalize::highlight;
use crate::request::squish;
use crate::types::SpellingSuggestion;

const SCOPE_ID_TRAILER: &str = " (scopeid";

/// Build a suggestion from a provider's raw correction.
///
/// Returns `None` when the correction is blank or, once cleaned, equal to
/// `original_query` ignoring case.
pub fn resolve(raw: Option<&str>, original_query: &str) -> Option<SpellingSuggestion> {
    let raw = raw.map(str::trim).filter(|raw| !raw.is_empty())?;

    let marked = clean(raw);
    let suggested = highlight::strip(&marked);
    if suggested.is_empty() {
        return None;
    }

    let original = squish(original_query);
    if suggested.to_lowercase() == original.to_lowercase() {
        tracing::trace!("spelling suggestion matches the query");
        return None;
    }

    Some(SpellingSuggestion {
        original,
        display: highlight::render(&marked, true),
        suggested,
    })
}

/// Remove provider decoration, keeping highlight markers.
fn clean(raw: &str) -> String {
    let text = raw.split(SCOPE_ID_TRAILER).next().unwrap_or_default();
    let kept: Vec<&str> = text
        .split_whitespace()
        .filter(|token| !is_site_operator(token))
        .collect();
    squish(&kept.join(" ").replace(['(', ')'], ""))
}

fn is_site_operator(token: &str) -> bool {
    let plain = highlight::strip(token);
    let plain = plain.trim_start_matches('(').to_ascii_lowercase();
    plain.starts_with("site:") || plain.starts_with("-site:")
}
