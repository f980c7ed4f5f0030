//! Side-by-side HTML diff tables.

use similar::{capture_diff_slices, group_diff_ops, Algorithm, DiffOp, DiffTag};

/// Render a side-by-side diff table of two line sequences.
///
/// Only changed regions are shown, each surrounded by `context` unchanged
/// lines. Rows carry the classes `diff_add`, `diff_sub` or `diff_chg`.
#[must_use]
pub fn render_diff_table(old_lines: &[String], new_lines: &[String], context: usize) -> String {
    let ops = capture_diff_slices(Algorithm::Myers, old_lines, new_lines);
    let groups = group_diff_ops(ops, context);

    let mut html = String::from(
        "<table class=\"diff\">\n<thead><tr><th></th><th>이전</th><th></th><th>변경</th></tr></thead>\n<tbody>\n",
    );

    if groups.is_empty() {
        html.push_str("<tr><td colspan=\"4\">줄 단위 변경 없음</td></tr>\n");
    }

    for (index, group) in groups.iter().enumerate() {
        if index > 0 {
            html.push_str("<tr class=\"diff_sep\"><td colspan=\"4\">&hellip;</td></tr>\n");
        }
        for op in group {
            push_op_rows(&mut html, op, old_lines, new_lines);
        }
    }

    html.push_str("</tbody>\n</table>\n");
    html
}

fn push_op_rows(html: &mut String, op: &DiffOp, old_lines: &[String], new_lines: &[String]) {
    let (tag, old_range, new_range) = op.as_tag_tuple();
    let class = match tag {
        DiffTag::Equal => None,
        DiffTag::Delete => Some("diff_sub"),
        DiffTag::Insert => Some("diff_add"),
        DiffTag::Replace => Some("diff_chg"),
    };

    let rows = old_range.len().max(new_range.len());
    for offset in 0..rows {
        let old = old_range
            .clone()
            .nth(offset)
            .map(|i| (i + 1, old_lines[i].as_str()));
        let new = new_range
            .clone()
            .nth(offset)
            .map(|i| (i + 1, new_lines[i].as_str()));
        push_row(html, class, old, new);
    }
}

fn push_row(
    html: &mut String,
    class: Option<&str>,
    old: Option<(usize, &str)>,
    new: Option<(usize, &str)>,
) {
    match class {
        Some(class) => html.push_str(&format!("<tr class=\"{class}\">")),
        None => html.push_str("<tr>"),
    }
    for side in [old, new] {
        match side {
            Some((number, text)) => html.push_str(&format!(
                "<td class=\"diff_next\">{number}</td><td>{}</td>",
                escape_html(text)
            )),
            None => html.push_str("<td class=\"diff_next\"></td><td></td>"),
        }
    }
    html.push_str("</tr>\n");
}

/// Escape text for HTML element content and attribute values.
#[must_use]
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
