//! Default report file names.

use std::path::Path;

use chrono::NaiveDateTime;

/// Prefix shared by every generated report name.
pub const REPORT_PREFIX: &str = "dir_list_hash_report";

/// Build the report stem for a root and a local timestamp:
/// `dir_list_hash_report_<cleaned root>_<YYYY-MM-DD_HH-MM-SS>`.
///
/// The root is cleaned by replacing path separators, `:` and spaces with
/// `_`, then trimming `_` from both ends.
pub fn default_report_stem(root: &Path, now: &NaiveDateTime) -> String {
    let cleaned = clean_root(root);
    let timestamp = now.format("%Y-%m-%d_%H-%M-%S");

    if cleaned.is_empty() {
        format!("{REPORT_PREFIX}_{timestamp}")
    } else {
        format!("{REPORT_PREFIX}_{cleaned}_{timestamp}")
    }
}

fn clean_root(root: &Path) -> String {
    root.to_string_lossy()
        .chars()
        .map(|c| {
            if std::path::is_separator(c) || c == ':' || c == ' ' {
                '_'
            } else {
                c
            }
        })
        .collect::<String>()
        .trim_matches('_')
        .to_string()
}
