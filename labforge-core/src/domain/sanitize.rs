// labforge-core/src/domain/sanitize.rs

use regex::Regex;

use crate::domain::ports::Sanitizer;

/// Default tag sanitizer.
///
/// Every run of characters outside `[A-Za-z0-9-]` becomes a single `_`.
/// Letters, digits and hyphens pass through untouched.
pub struct CleanStringSanitizer {
    illegal: Regex,
}

impl CleanStringSanitizer {
    // Static pattern, cannot fail to compile
    #[allow(clippy::unwrap_used)]
    pub fn new() -> Self {
        Self {
            illegal: Regex::new(r"[^A-Za-z0-9-]+").unwrap(),
        }
    }
}

impl Default for CleanStringSanitizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Sanitizer for CleanStringSanitizer {
    fn clean(&self, value: &str) -> String {
        self.illegal.replace_all(value, "_").into_owned()
    }
}
