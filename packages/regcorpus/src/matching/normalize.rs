//! Title normalization.

use unicode_normalization::UnicodeNormalization;

/// Punctuation removed before titles are compared.
///
/// Covers the separators converters and editors insert inconsistently:
/// periods, middle dots, hyphens, brackets and both ASCII and full-width colons.
const IGNORED_PUNCTUATION: &[char] = &['.', '·', '-', '(', ')', '[', ']', ':', '：'];

/// Map a raw title to its comparison key.
///
/// Applies NFKC compatibility normalization, drops whitespace and
/// [`IGNORED_PUNCTUATION`], then lowercases. Empty and punctuation-only
/// input yields an empty key, which never participates in matching.
///
/// # Examples
/// ```
/// use regcorpus::matching::normalize_title;
///
/// assert_eq!(normalize_title("보수 지급 규정"), "보수지급규정");
/// assert_eq!(normalize_title("학칙 (시행-세칙)"), "학칙시행세칙");
/// assert_eq!(normalize_title(" - . "), "");
/// ```
#[must_use]
pub fn normalize_title(title: &str) -> String {
    title
        .nfkc()
        .filter(|c| !c.is_whitespace() && !IGNORED_PUNCTUATION.contains(c))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Strip a leading markup heading marker (`#`, `##`, ...) and surrounding whitespace.
#[must_use]
pub fn strip_heading_marker(line: &str) -> &str {
    let trimmed = line.trim();
    if trimmed.starts_with('#') {
        trimmed.trim_start_matches('#').trim()
    } else {
        trimmed
    }
}
