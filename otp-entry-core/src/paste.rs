// File:    paste.rs
// Author:  apezoo
// Date:    2026-10-19
//
// Description: Recovers the freshly inserted text from a cell value changed by paste or autofill.
//
// License:
// This project is licensed under the terms of the GNU AGPLv3 license.
// See the LICENSE.md file in the project root for full license information.

//! Paste and autofill resolution.
//!
//! Platforms report the full new text of a field after a paste, not the
//! inserted part. [`resolve_inserted`] reconstructs it from the value the cell
//! held before.

use log::trace;

/// Infers the substring inserted into a field that used to hold `previous`
/// and now holds `observed`.
///
/// Returns `None` when `observed` has at most one character; such edits are
/// ordinary keystrokes. When `previous` is both a prefix and a suffix of
/// `observed` the prefix occurrence is treated as the stale part, so
/// `resolve_inserted("1", "12341")` yields `"2341"` even if the user pasted
/// `"1234"` after the cursor.
///
/// # Examples
///
/// ```
/// use otp_entry_core::paste::resolve_inserted;
///
/// assert_eq!(resolve_inserted("123", "1231234"), Some("1234"));
/// assert_eq!(resolve_inserted("222", "1234222"), Some("1234"));
/// assert_eq!(resolve_inserted("", "482913"), Some("482913"));
/// assert_eq!(resolve_inserted("4", "8"), None);
/// ```
#[must_use]
pub fn resolve_inserted<'a>(previous: &str, observed: &'a str) -> Option<&'a str> {
    if observed.chars().nth(1).is_none() {
        return None;
    }
    if previous.is_empty() {
        return Some(observed);
    }

    let starts_with = observed.starts_with(previous);
    let ends_with = observed.ends_with(previous);
    let inserted = if starts_with {
        // Covers the ambiguous case too: the front occurrence is dropped.
        &observed[previous.len()..]
    } else if ends_with {
        &observed[..observed.len() - previous.len()]
    } else {
        observed
    };
    trace!(
        "resolved paste: previous={previous:?} observed={observed:?} inserted={inserted:?} (prefix={starts_with}, suffix={ends_with})"
    );
    Some(inserted)
}
