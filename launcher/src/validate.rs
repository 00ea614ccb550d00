//! Repository reference validation and identifier formatting

use std::sync::LazyLock;

use regex::Regex;

use crate::errors::LauncherError;

/// Number of identifier characters shown to the user
pub const DISPLAY_ID_LEN: usize = 8;

/// `https://github.com/<owner>/<name>[.git]`, ASCII word characters, dots and hyphens only.
static REPOSITORY_PATTERN: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"^https://github\.com/[A-Za-z0-9_.-]+/[A-Za-z0-9_.-]+(?:\.git)?$").ok()
});

/// Check that `input` is a public GitHub repository URL the service can deploy
pub fn is_valid_repository_reference(input: &str) -> bool {
    REPOSITORY_PATTERN
        .as_ref()
        .is_some_and(|pattern| pattern.is_match(input))
}

/// Trim `input` and require it to be a valid repository reference
pub fn require_repository_reference(input: &str) -> Result<&str, LauncherError> {
    let trimmed = input.trim();
    if is_valid_repository_reference(trimmed) {
        Ok(trimmed)
    } else {
        Err(LauncherError::ValidationError(format!(
            "not a GitHub repository URL: {:?}",
            input
        )))
    }
}

/// Shorten a container identifier for display
pub fn format_identifier(id: &str) -> &str {
    match id.char_indices().nth(DISPLAY_ID_LEN) {
        Some((end, _)) => &id[..end],
        None => id,
    }
}
