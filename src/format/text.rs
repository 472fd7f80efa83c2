//! Small text helpers used around the message thread (previews, search,
//! counters).

use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};

/// Shorten to at most `max_chars` characters, ending in `...` when cut.
/// Counts characters, not bytes.
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let keep = max_chars.saturating_sub(3);
    let mut out: String = text.chars().take(keep).collect();
    out.push_str(&"..."[..max_chars.min(3)]);
    out
}

/// Wrap every case-insensitive occurrence of `term` in `<mark>`.
/// `text` is expected to be formatted (escaped) already: tags and
/// entities are copied through untouched, only the text between them
/// is searched.
pub fn highlight_text(text: &str, term: &str) -> String {
    static MARKUP_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"<[^>]*>|&(?:#[0-9]+|#x[0-9a-fA-F]+|[A-Za-z0-9]+);").expect("valid regex")
    });

    if term.is_empty() {
        return text.to_string();
    }
    let re = match RegexBuilder::new(&regex::escape(term))
        .case_insensitive(true)
        .build()
    {
        Ok(re) => re,
        Err(e) => {
            tracing::debug!(error = %e, "Highlight pattern rejected, leaving text as is");
            return text.to_string();
        }
    };

    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for markup in MARKUP_RE.find_iter(text) {
        out.push_str(&re.replace_all(&text[last..markup.start()], "<mark>${0}</mark>"));
        out.push_str(markup.as_str());
        last = markup.end();
    }
    out.push_str(&re.replace_all(&text[last..], "<mark>${0}</mark>"));
    out
}

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

pub fn character_count(text: &str, include_spaces: bool) -> usize {
    if include_spaces {
        text.chars().count()
    } else {
        text.chars().filter(|c| !c.is_whitespace()).count()
    }
}

/// `"N min read"`, rounding up.
pub fn estimate_reading_time(text: &str, words_per_minute: usize) -> String {
    let wpm = words_per_minute.max(1);
    let minutes = word_count(text).div_ceil(wpm);
    format!("{minutes} min read")
}

/// Human-readable byte size in powers of 1024, at most two decimals.
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["Bytes", "KB", "MB", "GB", "TB"];
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{} {}", trim_decimals(value, 2), UNITS[unit])
}

/// Compact notation with one decimal: `950`, `1.2K`, `3.4M`, `5B`.
pub fn format_compact_number(number: f64) -> String {
    const SUFFIXES: [&str; 5] = ["", "K", "M", "B", "T"];
    let sign = if number < 0.0 { "-" } else { "" };
    let mut value = number.abs();
    let mut tier = 0;
    while tier < SUFFIXES.len() - 1 && round_to(value, 1) >= 1000.0 {
        value /= 1000.0;
        tier += 1;
    }
    format!("{sign}{}{}", trim_decimals(value, 1), SUFFIXES[tier])
}

/// `singular` for a count of one, otherwise `plural` (default: `singular` + "s").
pub fn pluralize(count: i64, singular: &str, plural: Option<&str>) -> String {
    if count == 1 {
        singular.to_string()
    } else {
        plural.map_or_else(|| format!("{singular}s"), str::to_string)
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

fn trim_decimals(value: f64, decimals: i32) -> String {
    let rounded = round_to(value, decimals);
    let s = format!("{:.*}", decimals as usize, rounded);
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── truncate_text ─────────────────────────────────────────

    #[test]
    fn short_text_unchanged() {
        assert_eq!(truncate_text("hello", 10), "hello");
        assert_eq!(truncate_text("hello", 5), "hello");
    }

    #[test]
    fn long_text_cut_with_ellipsis() {
        assert_eq!(truncate_text("hello world", 8), "hello...");
    }

    #[test]
    fn truncation_counts_chars_not_bytes() {
        let out = truncate_text("ééééééé", 5);
        assert_eq!(out, "éé...");
        assert_eq!(out.chars().count(), 5);
    }

    #[test]
    fn tiny_limit_never_exceeds_max() {
        assert_eq!(truncate_text("hello", 2), "..");
        assert_eq!(truncate_text("hello", 0), "");
    }

    // ── highlight_text ────────────────────────────────────────

    #[test]
    fn highlight_case_insensitive() {
        assert_eq!(
            highlight_text("Hello hello", "HELLO"),
            "<mark>Hello</mark> <mark>hello</mark>"
        );
    }

    #[test]
    fn highlight_escapes_regex_chars() {
        assert_eq!(highlight_text("a.b axb", "a.b"), "<mark>a.b</mark> axb");
    }

    #[test]
    fn highlight_leaves_tags_alone() {
        assert_eq!(
            highlight_text(r#"<a href="https://a.com">a link</a>"#, "a"),
            r#"<a href="https://a.com"><mark>a</mark> link</a>"#
        );
        assert_eq!(
            highlight_text("<strong>strong</strong>", "strong"),
            "<strong><mark>strong</mark></strong>"
        );
    }

    #[test]
    fn highlight_leaves_entities_alone() {
        assert_eq!(highlight_text("a &amp; b", "amp"), "a &amp; b");
        assert_eq!(highlight_text("x &lt;y&gt; lt", "lt"), "x &lt;y&gt; <mark>lt</mark>");
    }

    #[test]
    fn highlight_formatted_message() {
        let html = crate::format::format_text("**amp** & <b>");
        assert_eq!(
            highlight_text(&html, "amp"),
            "<strong><mark>amp</mark></strong> &amp; &lt;b&gt;"
        );
    }

    #[test]
    fn highlight_empty_term_is_noop() {
        assert_eq!(highlight_text("text", ""), "text");
    }

    // ── Counters ──────────────────────────────────────────────

    #[test]
    fn counts_words_and_chars() {
        assert_eq!(word_count("  one two\nthree  "), 3);
        assert_eq!(word_count("   "), 0);
        assert_eq!(character_count("a b c", true), 5);
        assert_eq!(character_count("a b c", false), 3);
    }

    #[test]
    fn reading_time_rounds_up() {
        let words = vec!["word"; 201].join(" ");
        assert_eq!(estimate_reading_time(&words, 200), "2 min read");
        assert_eq!(estimate_reading_time("short", 200), "1 min read");
        assert_eq!(estimate_reading_time("", 200), "0 min read");
    }

    // ── Number formatting ─────────────────────────────────────

    #[test]
    fn file_sizes() {
        assert_eq!(format_file_size(0), "0 Bytes");
        assert_eq!(format_file_size(512), "512 Bytes");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(1024 * 1024), "1 MB");
    }

    #[test]
    fn compact_numbers() {
        assert_eq!(format_compact_number(950.0), "950");
        assert_eq!(format_compact_number(1234.0), "1.2K");
        assert_eq!(format_compact_number(999_999.0), "1M");
        assert_eq!(format_compact_number(-2_500_000.0), "-2.5M");
    }

    #[test]
    fn pluralize_default_and_custom() {
        assert_eq!(pluralize(1, "message", None), "message");
        assert_eq!(pluralize(3, "message", None), "messages");
        assert_eq!(pluralize(0, "reply", Some("replies")), "replies");
    }
}
