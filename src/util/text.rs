use std::borrow::Cow;

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const ELLIPSIS: char = '…';

/// Terminal columns occupied by `s`.
pub fn display_width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

/// Cut `s` so it occupies at most `max_width` columns, marking the cut with
/// a trailing `…`.
///
/// ```
/// use dailyknowledge::util::truncate_to_width;
///
/// assert_eq!(truncate_to_width("Short", 10), "Short");
/// assert_eq!(truncate_to_width("Hello World", 8), "Hello W…");
/// assert_eq!(truncate_to_width("日本語の記事", 7), "日本語…");
/// assert_eq!(truncate_to_width("Test", 0), "");
/// ```
pub fn truncate_to_width(s: &str, max_width: usize) -> Cow<'_, str> {
    if display_width(s) <= max_width {
        return Cow::Borrowed(s);
    }
    if max_width == 0 {
        return Cow::Borrowed("");
    }

    // One column is reserved for the ellipsis
    let budget = max_width - 1;
    let mut used = 0;
    let mut end = 0;
    for (idx, c) in s.char_indices() {
        let w = UnicodeWidthChar::width(c).unwrap_or(0);
        if used + w > budget {
            break;
        }
        used += w;
        end = idx + c.len_utf8();
    }

    let mut out = String::with_capacity(end + ELLIPSIS.len_utf8());
    out.push_str(s[..end].trim_end());
    out.push(ELLIPSIS);
    Cow::Owned(out)
}

/// Flatten backend-supplied text into a single safe display line.
///
/// Scraped titles and summaries may carry newlines, tabs, or terminal escape
/// sequences. Escape sequences (CSI and OSC) and other control characters
/// are dropped, and every whitespace run collapses to one space.
///
/// ```
/// use dailyknowledge::util::one_line;
///
/// assert_eq!(one_line("  Breaking:\n\tmarkets  up "), "Breaking: markets up");
/// assert_eq!(one_line("\x1b[31mred\x1b[0m alert"), "red alert");
/// assert_eq!(one_line("clean"), "clean");
/// ```
pub fn one_line(s: &str) -> Cow<'_, str> {
    let is_clean = !s.starts_with(char::is_whitespace)
        && !s.ends_with(char::is_whitespace)
        && !s.chars().any(|c| c.is_control() || c == '\u{1b}')
        && !s.contains("  ");
    if is_clean {
        return Cow::Borrowed(s);
    }

    let mut out = String::with_capacity(s.len());
    let mut pending_space = false;
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\u{1b}' => match chars.peek() {
                Some('[') => {
                    chars.next();
                    // CSI ends at the first byte in 0x40..=0x7e
                    for c in chars.by_ref() {
                        if ('\u{40}'..='\u{7e}').contains(&c) {
                            break;
                        }
                    }
                }
                Some(']') => {
                    chars.next();
                    // OSC ends at BEL or ST (ESC \)
                    while let Some(c) = chars.next() {
                        if c == '\u{07}' {
                            break;
                        }
                        if c == '\u{1b}' && chars.peek() == Some(&'\\') {
                            chars.next();
                            break;
                        }
                    }
                }
                _ => {}
            },
            c if c.is_whitespace() => pending_space = !out.is_empty(),
            c if c.is_control() => {}
            c => {
                if pending_space {
                    out.push(' ');
                    pending_space = false;
                }
                out.push(c);
            }
        }
    }

    Cow::Owned(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_truncate_fits_is_borrowed() {
        assert!(matches!(truncate_to_width("exact", 5), Cow::Borrowed("exact")));
    }

    #[test]
    fn test_truncate_respects_width() {
        for width in 1..12 {
            let out = truncate_to_width("Central bank raises rates", width);
            assert!(display_width(&out) <= width, "width {width}: {out:?}");
            assert!(out.ends_with(ELLIPSIS));
        }
    }

    #[test]
    fn test_truncate_wide_chars_never_split() {
        // Each CJK char is 2 columns; budget of 4 fits two of them
        assert_eq!(truncate_to_width("経済ニュース", 5), "経済…");
        assert_eq!(truncate_to_width("経済ニュース", 4), "経…");
    }

    #[test]
    fn test_truncate_trims_before_ellipsis() {
        assert_eq!(truncate_to_width("Hello World", 7), "Hello…");
    }

    #[test]
    fn test_one_line_strips_osc_title_sequences() {
        assert_eq!(one_line("a\x1b]0;pwned\x07b"), "ab");
        assert_eq!(one_line("a\x1b]8;;http://x\x1b\\link"), "alink");
    }

    #[test]
    fn test_one_line_drops_bare_controls() {
        assert_eq!(one_line("bell\x07 and\x00 nul\x7f"), "bell and nul");
    }

    #[test]
    fn test_one_line_keeps_unicode() {
        assert_eq!(one_line("Pénzügy:  árfolyam\r\n"), "Pénzügy: árfolyam");
    }

    #[test]
    fn test_one_line_empty_and_blank() {
        assert_eq!(one_line(""), "");
        assert_eq!(one_line(" \n\t "), "");
    }
}
