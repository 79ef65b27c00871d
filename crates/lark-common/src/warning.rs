//! Engine warnings with deduplication.
//!
//! Used by the tokenizer, tree builder and input stream to report
//! degraded behavior (encoding fallback, unsupported charsets) once per
//! unique message instead of once per occurrence. Output goes through
//! `log::warn!` so the embedder decides where it ends up.

use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

/// Global set of warnings we've already reported (to deduplicate)
static WARNED: Mutex<Option<HashSet<String>>> = Mutex::new(None);

/// Warn about degraded behavior (reported once per unique message).
///
/// Returns `true` if this call actually emitted the warning.
///
/// # Example
/// ```ignore
/// let _ = warn_once("Input", "charset 'iso-2022-kr' unsupported, using windows-1252");
/// ```
#[must_use]
pub fn warn_once(component: &str, message: &str) -> bool {
    let key = format!("[{component}] {message}");
    let first_time = WARNED
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .get_or_insert_with(HashSet::new)
        .insert(key);

    if first_time {
        log::warn!(target: "lark", "[{component}] {message}");
    }
    first_time
}

/// Forget all recorded warnings (call when starting a new document).
pub fn clear_warnings() {
    let mut guard = WARNED.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(set) = guard.as_mut() {
        set.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warn_once_deduplicates() {
        assert!(warn_once("Test", "dedup-check-message"));
        assert!(!warn_once("Test", "dedup-check-message"));
        assert!(warn_once("Other", "dedup-check-message"));
    }
}
