//! Lightweight markup for chat message bodies.
//!
//! Stages run in a fixed order: escape, line breaks, links, inline spans,
//! lists. Inline spans run after escaping so markup characters typed by the
//! user can never become live tags. Inline spans never cross a line break,
//! and a leading bullet marker is never read as an emphasis delimiter.

use std::sync::LazyLock;

use regex::Regex;

/// Marker substituted for `\n` and used to split lines for list detection.
pub const LINE_BREAK: &str = "<br>";

/// CSS class of the `<ul>` wrapping a run of bullet lines.
pub const LIST_CLASS: &str = "message-list";

const BULLET_MARKERS: [char; 3] = ['•', '-', '*'];

/// Entities that end a detected URL. `&amp;` does not: it is a query separator.
const URL_TERMINATING_ENTITIES: [&str; 2] = ["&lt;", "&gt;"];

/// Convert raw user or bot text into safe, lightly marked-up HTML.
pub fn format_text(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }

    let escaped = escape_html(raw);
    let with_breaks = convert_newlines(&escaped);
    let linked = link_urls(&with_breaks);

    render_lines(parse_lines(&linked, format_inline))
}

/// Escape `&`, `<` and `>`. Every generated attribute is double-quoted and
/// URLs never contain `"`, so quotes are left as typed.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

pub fn convert_newlines(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\n', LINE_BREAK)
}

/// Wrap `http(s)://` URLs in links that open in a new context without
/// leaking the opener or referrer.
pub fn link_urls(text: &str) -> String {
    static URL_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r#"(?i)https?://[^\s<>"{}|\\^`\[\]]+"#).expect("valid regex")
    });

    URL_RE
        .replace_all(text, |caps: &regex::Captures| {
            let matched = &caps[0];
            let end = URL_TERMINATING_ENTITIES
                .iter()
                .filter_map(|entity| matched.find(entity))
                .min()
                .unwrap_or(matched.len());
            let (url, rest) = matched.split_at(end);

            let after_scheme = url.find("://").map_or(url.len(), |i| i + 3);
            if after_scheme >= url.len() {
                return matched.to_string();
            }

            format!(
                r#"<a href="{url}" target="_blank" rel="noopener noreferrer">{url}</a>{rest}"#
            )
        })
        .into_owned()
}

/// Bold, italic and inline code, in that order, on a single line.
/// Links produced by [`link_urls`] are copied through untouched, so a `*`
/// inside a URL never reaches the href. Spans do not cross a link.
pub fn format_inline(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut rest = line;
    while let Some((start, end)) = next_anchor(rest) {
        out.push_str(&format_spans(&rest[..start]));
        out.push_str(&rest[start..end]);
        rest = &rest[end..];
    }
    out.push_str(&format_spans(rest));
    out
}

fn format_spans(text: &str) -> String {
    format_inline_code(&format_italic(&format_bold(text)))
}

/// Byte range of the first `<a ...>...</a>` in `text`. Escaped input cannot
/// contain a literal `<`, so every anchor here came from `link_urls`.
fn next_anchor(text: &str) -> Option<(usize, usize)> {
    const OPEN: &str = "<a ";
    const CLOSE: &str = "</a>";
    let start = text.find(OPEN)?;
    let close = text[start..].find(CLOSE)?;
    Some((start, start + close + CLOSE.len()))
}

/// `**text**` → `<strong>text</strong>`, non-greedy. Empty pairs stay literal.
pub fn format_bold(text: &str) -> String {
    static BOLD_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\*\*(.+?)\*\*").expect("valid regex"));
    BOLD_RE
        .replace_all(text, "<strong>${1}</strong>")
        .into_owned()
}

/// `*text*` → `<em>text</em>` when neither delimiter touches another `*`.
pub fn format_italic(text: &str) -> String {
    let bytes = text.as_bytes();
    let is_lone_star = |i: usize| {
        bytes[i] == b'*'
            && (i == 0 || bytes[i - 1] != b'*')
            && bytes.get(i + 1).is_some_and(|&b| b != b'*')
    };

    let mut out = String::with_capacity(text.len());
    let mut copied = 0;
    let mut i = 0;
    while i < bytes.len() {
        if is_lone_star(i) {
            let close = bytes[i + 1..]
                .iter()
                .position(|&b| b == b'*')
                .map(|p| p + i + 1);
            if let Some(close) = close {
                if bytes.get(close + 1) != Some(&b'*') {
                    out.push_str(&text[copied..i]);
                    out.push_str("<em>");
                    out.push_str(&text[i + 1..close]);
                    out.push_str("</em>");
                    i = close + 1;
                    copied = i;
                    continue;
                }
            }
        }
        i += 1;
    }
    out.push_str(&text[copied..]);
    out
}

/// `` `code` `` → `<code>code</code>`.
pub fn format_inline_code(text: &str) -> String {
    static CODE_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"`([^`]+)`").expect("valid regex"));
    CODE_RE.replace_all(text, "<code>${1}</code>").into_owned()
}

/// Group runs of bullet lines of `<br>`-separated text into list blocks.
/// Does not apply inline spans.
pub fn format_lists(text: &str) -> String {
    render_lines(parse_lines(text, str::to_string))
}

// ═══════════════════════════════════════════
// Line handling
// ═══════════════════════════════════════════

enum Line {
    Text(String),
    Item(String),
}

fn parse_lines(text: &str, inline: impl Fn(&str) -> String) -> Vec<Line> {
    text.split(LINE_BREAK)
        .map(|line| match bullet_content(line) {
            Some(content) => Line::Item(inline(content)),
            None => Line::Text(inline(line)),
        })
        .collect()
}

/// Text after a leading bullet marker and its whitespace. A marker alone on
/// its line yields an empty item.
fn bullet_content(line: &str) -> Option<&str> {
    let trimmed = line.trim();
    let mut chars = trimmed.chars();
    let marker = chars.next()?;
    if !BULLET_MARKERS.contains(&marker) {
        return None;
    }

    let rest = chars.as_str();
    if rest.is_empty() {
        Some("")
    } else if rest.starts_with(char::is_whitespace) {
        Some(rest.trim_start())
    } else {
        None
    }
}

fn render_lines(lines: Vec<Line>) -> String {
    let mut out = String::new();
    let mut in_list = false;
    let mut after_text = false;

    for line in lines {
        match line {
            Line::Item(content) => {
                if !in_list {
                    out.push_str(&format!(r#"<ul class="{LIST_CLASS}">"#));
                    in_list = true;
                }
                out.push_str("<li>");
                out.push_str(&content);
                out.push_str("</li>");
                after_text = false;
            }
            Line::Text(text) => {
                if in_list {
                    out.push_str("</ul>");
                    in_list = false;
                } else if after_text {
                    out.push_str(LINE_BREAK);
                }
                out.push_str(&text);
                after_text = true;
            }
        }
    }

    if in_list {
        out.push_str("</ul>");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::seq::SliceRandom;
    use rand::{Rng, SeedableRng};

    // ── Escaping ───────────────────────────────────────────────

    #[test]
    fn empty_input_returns_empty() {
        assert_eq!(format_text(""), "");
    }

    #[test]
    fn whitespace_only_passes_through() {
        assert_eq!(format_text("   \t"), "   \t");
    }

    #[test]
    fn script_tags_are_escaped() {
        let out = format_text("<script>alert('x')</script>");
        assert!(!out.contains("<script"));
        assert!(out.contains("&lt;script&gt;"));
    }

    #[test]
    fn ampersand_escaped_first() {
        assert_eq!(escape_html("a & <b>"), "a &amp; &lt;b&gt;");
    }

    #[test]
    fn no_user_angle_bracket_survives() {
        let inputs = [
            "<img src=x onerror=alert(1)>",
            "**<b>bold</b>**",
            "`<i>`",
            "- <li>item</li>\n- two",
            "https://example.com/<script>",
            "*<em>*",
        ];
        for input in inputs {
            let out = format_text(input);
            assert!(!out.contains("<script"), "{input} -> {out}");
            assert!(!out.contains("<img"), "{input} -> {out}");
            assert!(!out.contains("<b>"), "{input} -> {out}");
            assert!(!out.contains("<i>"), "{input} -> {out}");
            assert!(!out.contains("<em><em>"), "{input} -> {out}");
        }
    }

    #[test]
    fn plain_text_is_idempotent() {
        let samples = [
            "Hello world",
            "How are you today?",
            "Numbers 1 2 3 and symbols like # % + = ~",
            "Don't forget the quotes \"here\"",
        ];
        for plain in samples {
            let once = format_text(plain);
            assert_eq!(format_text(&once), once, "{plain}");
        }
    }

    const ALLOWED_TAGS: [&str; 13] = [
        "<a href=\"",
        "</a>",
        "<strong>",
        "</strong>",
        "<em>",
        "</em>",
        "<code>",
        "</code>",
        "<ul class=\"message-list\">",
        "</ul>",
        "<li>",
        "</li>",
        "<br>",
    ];

    /// Concatenation of `count` random pieces.
    fn random_text(rng: &mut StdRng, pieces: &[&str], count: usize) -> String {
        (0..count)
            .map(|_| *pieces.choose(rng).unwrap())
            .collect()
    }

    #[test]
    fn generated_markup_never_leaks_tags() {
        let pieces = [
            "<", ">", "&", "*", "**", "`", "\n", "\r\n", " ", "-", "• ", "* ", "\"", "'",
            "a", "script", "<script>", "</a>", "<a href=x>", "https://", "x.io/", "&lt;",
            "&amp;", "<br>", "onerror=",
        ];
        let mut rng = StdRng::seed_from_u64(0x5eed);

        for _ in 0..2000 {
            let len = rng.gen_range(0..24);
            let input = random_text(&mut rng, &pieces, len);
            let out = format_text(&input);

            assert!(!out.contains("<script"), "{input:?} -> {out}");
            for (i, _) in out.match_indices('<') {
                assert!(
                    ALLOWED_TAGS.iter().any(|tag| out[i..].starts_with(tag)),
                    "{input:?} -> {out}"
                );
            }
            for (i, _) in out.match_indices("href=\"") {
                let href = &out[i + 6..];
                let end = href.find('"').unwrap();
                assert!(!href[..end].contains('<'), "{input:?} -> {out}");
            }
        }
    }

    #[test]
    fn generated_plain_text_is_idempotent() {
        let pieces = [
            "a", "Z", "9", " ", ".", ",", "!", "?", "#", "%", "+", "=", "~", "\"", "'", "(",
            ")", "é", "ok", "\t",
        ];
        let mut rng = StdRng::seed_from_u64(42);

        for _ in 0..2000 {
            let len = rng.gen_range(0..32);
            let plain = random_text(&mut rng, &pieces, len);
            let once = format_text(&plain);
            assert_eq!(format_text(&once), once, "{plain:?}");
        }
    }

    // ── Line breaks ───────────────────────────────────────────

    #[test]
    fn newlines_become_breaks() {
        assert_eq!(format_text("one\ntwo\nthree"), "one<br>two<br>three");
    }

    #[test]
    fn crlf_treated_as_newline() {
        assert_eq!(format_text("one\r\ntwo"), "one<br>two");
    }

    #[test]
    fn blank_lines_are_kept() {
        assert_eq!(format_text("a\n\nb"), "a<br><br>b");
    }

    #[test]
    fn text_lines_keep_indentation() {
        assert_eq!(format_text("  indented\nnext "), "  indented<br>next ");
    }

    // ── Links ─────────────────────────────────────────────────

    #[test]
    fn url_wrapped_in_safe_link() {
        let out = format_text("see https://example.com/docs now");
        assert_eq!(
            out,
            "see <a href=\"https://example.com/docs\" target=\"_blank\" \
             rel=\"noopener noreferrer\">https://example.com/docs</a> now"
        );
    }

    #[test]
    fn url_stops_at_escaped_angle_bracket() {
        let out = format_text("<https://example.com>");
        assert!(out.starts_with("&lt;<a href=\"https://example.com\""));
        assert!(out.ends_with("</a>&gt;"));
    }

    #[test]
    fn url_keeps_escaped_query_separator() {
        let out = format_text("http://x.io/?a=1&b=2");
        assert!(out.contains("href=\"http://x.io/?a=1&amp;b=2\""));
    }

    #[test]
    fn bare_scheme_not_linked() {
        assert_eq!(format_text("https://"), "https://");
    }

    #[test]
    fn uppercase_scheme_linked() {
        assert!(format_text("HTTPS://EXAMPLE.COM").contains("<a href=\"HTTPS://EXAMPLE.COM\""));
    }

    #[test]
    fn asterisks_inside_url_left_alone() {
        assert_eq!(
            format_text("see https://example.com/*draft*/page"),
            "see <a href=\"https://example.com/*draft*/page\" target=\"_blank\" \
             rel=\"noopener noreferrer\">https://example.com/*draft*/page</a>"
        );
    }

    #[test]
    fn spans_around_link_still_apply() {
        assert_eq!(
            format_text("**Docs:** https://x.io/a**b** and `cfg`"),
            "<strong>Docs:</strong> <a href=\"https://x.io/a**b**\" target=\"_blank\" \
             rel=\"noopener noreferrer\">https://x.io/a**b**</a> and <code>cfg</code>"
        );
    }

    #[test]
    fn link_in_list_item_intact() {
        let out = format_text("- https://x.io/*y*");
        assert!(out.starts_with("<ul class=\"message-list\"><li><a href=\"https://x.io/*y*\""));
        assert!(!out.contains("<em>"));
    }

    // ── Inline spans ──────────────────────────────────────────

    #[test]
    fn bold_replaces_asterisks() {
        let out = format_text("**bold**");
        assert_eq!(out, "<strong>bold</strong>");
        assert!(!out.contains('*'));
    }

    #[test]
    fn bold_is_non_greedy() {
        assert_eq!(
            format_text("**a** and **b**"),
            "<strong>a</strong> and <strong>b</strong>"
        );
    }

    #[test]
    fn italic_single_asterisks() {
        assert_eq!(format_text("an *important* word"), "an <em>important</em> word");
    }

    #[test]
    fn bold_and_italic_together() {
        assert_eq!(
            format_text("**loud** and *soft*"),
            "<strong>loud</strong> and <em>soft</em>"
        );
    }

    #[test]
    fn unmatched_delimiters_left_literal() {
        assert_eq!(format_text("**open"), "**open");
        assert_eq!(format_text("2 * 3"), "2 * 3");
        assert_eq!(format_text("`unclosed"), "`unclosed");
        assert_eq!(format_text("****"), "****");
    }

    #[test]
    fn italic_rejects_doubled_closer() {
        assert_eq!(format_italic("*a**b*"), "*a**b*");
    }

    #[test]
    fn inline_code_wrapped() {
        assert_eq!(format_text("run `cargo build`"), "run <code>cargo build</code>");
    }

    #[test]
    fn markup_inside_code_is_escaped() {
        assert_eq!(format_text("`<b>`"), "<code>&lt;b&gt;</code>");
    }

    #[test]
    fn emphasis_does_not_cross_lines() {
        assert_eq!(format_text("a *b\nc* d"), "a *b<br>c* d");
    }

    // ── Lists ─────────────────────────────────────────────────

    #[test]
    fn bullet_lines_form_single_list() {
        assert_eq!(
            format_text("• a\n• b"),
            "<ul class=\"message-list\"><li>a</li><li>b</li></ul>"
        );
    }

    #[test]
    fn dash_and_star_markers() {
        assert_eq!(
            format_text("- one\n* two"),
            "<ul class=\"message-list\"><li>one</li><li>two</li></ul>"
        );
    }

    #[test]
    fn star_bullets_are_not_italic() {
        assert_eq!(
            format_text("* a\n* b *c*"),
            "<ul class=\"message-list\"><li>a</li><li>b <em>c</em></li></ul>"
        );
    }

    #[test]
    fn list_between_text_has_no_adjacent_breaks() {
        assert_eq!(
            format_text("Intro:\n- a\n- b\nOutro"),
            "Intro:<ul class=\"message-list\"><li>a</li><li>b</li></ul>Outro"
        );
    }

    #[test]
    fn separate_runs_form_separate_lists() {
        let out = format_text("- a\ntext\n- b");
        assert_eq!(out.matches("<ul").count(), 2);
        assert_eq!(out.matches("<li>").count(), 2);
    }

    #[test]
    fn bare_marker_yields_empty_item() {
        assert_eq!(
            format_text("• a\n•"),
            "<ul class=\"message-list\"><li>a</li><li></li></ul>"
        );
    }

    #[test]
    fn hyphenated_text_is_not_a_list() {
        assert_eq!(format_text("-5 degrees"), "-5 degrees");
    }

    #[test]
    fn bold_line_starting_with_asterisks_is_not_a_list() {
        assert_eq!(format_text("**Note** here"), "<strong>Note</strong> here");
    }

    #[test]
    fn format_lists_skips_inline_spans() {
        assert_eq!(
            format_lists("- *a*"),
            "<ul class=\"message-list\"><li>*a*</li></ul>"
        );
    }

    #[test]
    fn bot_capabilities_reply_renders() {
        let reply = "I can help with:\n\n• Answering questions\n• Data analysis\n\nWhat would you like?";
        let out = format_text(reply);
        assert_eq!(
            out,
            "I can help with:<br><ul class=\"message-list\"><li>Answering questions</li>\
             <li>Data analysis</li></ul><br>What would you like?"
        );
    }
}
