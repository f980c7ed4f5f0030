//! Content sanitizer for the documentation site renderer.
//!
//! Converted regulations contain markup the site's MDX compiler rejects:
//! inline `style` attributes (JSX expects objects), block tags glued to
//! table-cell tags, converter attribute annotations, and image references
//! into a `media/` folder that is never published.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::{Captures, Regex};

/// Upper bound on the passes that insert text; real documents settle in one.
const MAX_PASSES: usize = 16;

/// Inline style attribute with double or single quotes, inside an opening tag.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static STYLE_ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(<[A-Za-z][\w-]*(?:\s+[^>]*?)?)\s+style=(?:"[^"]*"|'[^']*')"#)
        .expect("valid regex")
});

/// Closing block tag immediately followed by a closing cell tag.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static BLOCK_END_BEFORE_CELL_END: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(</p>|</blockquote>)(</t[dh]>)").expect("valid regex"));

/// Opening cell tag (with optional attributes) immediately followed by a block tag.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static CELL_START_BEFORE_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(<t[dh](?:\s[^>]*)?>)(<p>|<p\s|<blockquote>|<blockquote\s)").expect("valid regex")
});

/// Image pointing into the converter's media folder, with optional attribute block.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static MEDIA_IMAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"!\[([^\]]*)\]\(media/[^)\s]+\)(?:\{[^}]*\})?").expect("valid regex")
});

/// Class / id attribute annotation, e.g. `{.underline}` or `{#sec .c key=v}`.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static CLASS_ANNOTATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\{[#.][\w\s="'.#-]*\}"#).expect("valid regex"));

/// Key/value attribute annotation, e.g. `{width="3in" height="1in"}`.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static KEY_VALUE_ANNOTATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\{\s*[\w-]+="[^"]*"(?:\s+[\w-]+="[^"]*")*\s*\}"#).expect("valid regex")
});

/// Table cell whose whole content is wrapped in strike, bold or italic markers.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static EMPHASIZED_CELL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<td>(?:~~(.+?)~~|\*\*(.+?)\*\*|\*([^*]+?)\*)</td>").expect("valid regex")
});

/// Table cell, spanning lines.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static TABLE_CELL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<t[dh][^>]*>.*?</t[dh]>").expect("valid regex"));

/// Rewrite content so the renderer accepts it.
///
/// The rewrite is idempotent: sanitizing already sanitized content
/// returns it unchanged.
///
/// # Examples
/// ```
/// use regcorpus::sanitize::sanitize;
///
/// let raw = r#"<td style="width: 9%"><p>가</p></td>"#;
/// assert_eq!(sanitize(raw), "<td>\n<p>가</p>\n</td>");
/// assert_eq!(sanitize(&sanitize(raw)), sanitize(raw));
/// ```
#[must_use]
pub fn sanitize(text: &str) -> String {
    let mut current = strip_markup(text.to_string());
    for _ in 0..MAX_PASSES {
        let next = strip_markup(separate_cell_blocks(&escape_tildes_in_cells(&current)));
        if next == current {
            return current;
        }
        current = next;
    }
    tracing::warn!("sanitizer did not reach a fixed point");
    current
}

/// Rewrites that consume their match without producing a new one.
const REMOVALS: [fn(&str) -> Cow<'_, str>; 5] = [
    replace_media_images,
    strip_class_annotations,
    strip_key_value_annotations,
    strip_style_attributes,
    unwrap_emphasized_cells,
];

/// Apply the removals until none of them matches. Nested annotations lose
/// one level per round, so there is no round limit.
fn strip_markup(mut text: String) -> String {
    loop {
        let mut changed = false;
        for rewrite in REMOVALS {
            let next = match rewrite(&text) {
                Cow::Owned(next) if next != text => next,
                _ => continue,
            };
            changed = true;
            text = next;
        }
        if !changed {
            return text;
        }
    }
}

fn replace_media_images(text: &str) -> Cow<'_, str> {
    MEDIA_IMAGE.replace_all(text, |caps: &Captures<'_>| {
        let alt = caps.get(1).map_or("", |m| m.as_str()).trim();
        // Keep the comment free of characters the other rewrites act on
        let alt: String = alt
            .chars()
            .filter(|c| !matches!(c, '{' | '}' | '~' | '<' | '>'))
            .collect();
        format!("<!-- 이미지: {alt} (원본 파일 누락) -->")
    })
}

fn strip_class_annotations(text: &str) -> Cow<'_, str> {
    CLASS_ANNOTATION.replace_all(text, "")
}

fn strip_key_value_annotations(text: &str) -> Cow<'_, str> {
    KEY_VALUE_ANNOTATION.replace_all(text, "")
}

fn strip_style_attributes(text: &str) -> Cow<'_, str> {
    STYLE_ATTRIBUTE.replace_all(text, "${1}")
}

fn unwrap_emphasized_cells(text: &str) -> Cow<'_, str> {
    EMPHASIZED_CELL.replace_all(text, |caps: &Captures<'_>| {
        let inner = (1..=3)
            .find_map(|i| caps.get(i))
            .map_or("", |m| m.as_str());
        format!("<td>{inner}</td>")
    })
}

fn escape_tildes_in_cells(text: &str) -> Cow<'_, str> {
    TABLE_CELL.replace_all(text, |caps: &Captures<'_>| caps[0].replace('~', "&#126;"))
}

fn separate_cell_blocks(text: &str) -> String {
    let text = BLOCK_END_BEFORE_CELL_END.replace_all(text, "$1\n$2");
    CELL_START_BEFORE_BLOCK
        .replace_all(&text, "$1\n$2")
        .into_owned()
}
