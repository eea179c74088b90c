//! Folds a batch response into per-file results.

use std::collections::HashMap;

use crate::{FileUrlInfo, proto};

/// Converts the response map into caller-facing results.
///
/// The output has exactly the response's keys. Requested ids the service
/// did not answer for are absent and only logged.
#[must_use]
pub fn aggregate(
    requested: &[String],
    results: HashMap<String, proto::FileUrlInfo>,
) -> HashMap<String, FileUrlInfo> {
    let missing: Vec<&str> = requested
        .iter()
        .filter(|id| !results.contains_key(id.as_str()))
        .map(String::as_str)
        .collect();
    if !missing.is_empty() {
        tracing::debug!(?missing, "batch response omitted requested files");
    }

    results
        .into_iter()
        .map(|(id, info)| (id, FileUrlInfo::from(info)))
        .collect()
}
