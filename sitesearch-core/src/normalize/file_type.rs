//! File-type detection from result URLs.

use url::Url;

use crate::types::FileType;

/// Detect the document type of `url` from its path extension.
///
/// Only extensions on the [`FileType`] allow-list are recognized; matching is
/// case-insensitive. The query string and fragment are ignored.
pub fn detect(url: &str) -> Option<FileType> {
    let path = match Url::parse(url) {
        Ok(parsed) => parsed.path().to_owned(),
        // Relative or malformed URLs: drop query and fragment by hand.
        Err(_) => url.split(['?', '#']).next().unwrap_or_default().to_owned(),
    };
    let file_name = path.rsplit('/').next()?;
    let (stem, ext) = file_name.rsplit_once('.')?;
    if stem.is_empty() {
        return None;
    }
    FileType::from_extension(&ext.to_ascii_lowercase())
}
