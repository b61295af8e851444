//! Adapts backend completion APIs to the notebook editor.
//!
//! The editor sends the whole paragraph buffer plus a cursor offset. Backends want the
//! text of the current line up to the cursor, and they answer with whole-line
//! suggestions that repeat that text, which the editor would insert twice.

#[cfg(windows)]
pub const LINE_SEPARATOR: &str = "\r\n";
#[cfg(not(windows))]
pub const LINE_SEPARATOR: &str = "\n";

/// Detail level requested from backends that support one.
pub const SINGLE_LEVEL_OF_DETAILS: u32 = 1;

/// Text of the cursor's line, from the line start up to the cursor.
///
/// `cursor` counts characters. Positions past the end clamp to the end of the buffer.
pub fn prefix_at(buffer: &str, cursor: usize) -> &str {
    let end = buffer
        .char_indices()
        .nth(cursor)
        .map(|(i, _)| i)
        .unwrap_or(buffer.len());
    let head = &buffer[..end];
    let start = head
        .rfind(LINE_SEPARATOR)
        .map(|i| i + LINE_SEPARATOR.len())
        .unwrap_or(0);
    &head[start..]
}

/// Removes the echoed part of `prefix` from the front of every suggestion.
///
/// The echoed part runs up to and including the last whitespace, `|` or `=` of the
/// prefix. A prefix without any of those strips nothing.
pub fn strip_echo(suggestions: Option<Vec<String>>, prefix: &str) -> Option<Vec<String>> {
    let suggestions = suggestions?;
    if prefix.trim().is_empty() {
        return Some(suggestions);
    }

    let echoed = match last_separator_index(prefix) {
        Some(i) => prefix[..=i].trim(),
        None => "",
    };

    Some(
        suggestions
            .into_iter()
            .map(|s| s.strip_prefix(echoed).unwrap_or(&s).trim().to_string())
            .collect(),
    )
}

/// Byte index of the last whitespace, `|` or `=` in `s`.
fn last_separator_index(s: &str) -> Option<usize> {
    s.char_indices()
        .rev()
        .find(|(_, c)| c.is_whitespace() || *c == '|' || *c == '=')
        .map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owned(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_prefix_single_line() {
        let buf = "012 456";
        assert_eq!(prefix_at(buf, 0), "");
        assert_eq!(prefix_at(buf, 2), "01");
        assert_eq!(prefix_at(buf, 7), "012 456");
        assert_eq!(prefix_at(buf, 8), "012 456");
        assert_eq!(prefix_at(buf, 100), "012 456");
    }

    #[test]
    fn test_prefix_multi_line() {
        let line1 = "012 456";
        let line2 = "654 210";
        let line3 = "987 564";
        let buf = [line1, line2, line3].join(LINE_SEPARATOR);
        let sep = LINE_SEPARATOR.chars().count();

        assert_eq!(prefix_at(&buf, 0), "");
        assert_eq!(prefix_at(&buf, 2), "01");
        assert_eq!(prefix_at(&buf, 7), "012 456");

        assert_eq!(prefix_at(&buf, 7 + sep), "");
        assert_eq!(prefix_at(&buf, 7 + sep + 2), "65");
        assert_eq!(prefix_at(&buf, 14 + sep), "654 210");

        assert_eq!(prefix_at(&buf, 14 + 2 * sep), "");
        assert_eq!(prefix_at(&buf, 14 + 2 * sep + 2), "98");
        assert_eq!(prefix_at(&buf, buf.chars().count()), "987 564");
    }

    #[test]
    fn test_prefix_counts_characters() {
        assert_eq!(prefix_at("héllo wörld", 7), "héllo w");
    }

    #[test]
    fn test_strip_echo_whitespace_prefix() {
        let xd = owned(&["boza one", "boza two", "boza three"]);
        assert_eq!(strip_echo(Some(xd), "boza "), Some(owned(&["one", "two", "three"])));
    }

    #[test]
    fn test_strip_echo_blank_prefix_is_passthrough() {
        let xd = owned(&["boza one", "boza two"]);
        assert_eq!(strip_echo(Some(xd.clone()), ""), Some(xd.clone()));
        assert_eq!(strip_echo(Some(xd.clone()), "   "), Some(xd));
    }

    #[test]
    fn test_strip_echo_absent_and_empty_differ() {
        assert_eq!(strip_echo(None, "fsadfasdf"), None);
        assert_eq!(strip_echo(Some(Vec::new()), "fsadfasdf"), Some(Vec::new()));
    }

    #[test]
    fn test_strip_echo_stream_pipeline() {
        let prefix = prefix_at("http | transform --", 19);
        assert_eq!(prefix, "http | transform --");
        let xd = owned(&["http | transform --expression=", "http | transform --script="]);
        assert_eq!(
            strip_echo(Some(xd), prefix),
            Some(owned(&["--expression=", "--script="]))
        );
    }

    #[test]
    fn test_strip_echo_without_separator_strips_nothing() {
        let xd = owned(&["http --port=", "http --https="]);
        assert_eq!(strip_echo(Some(xd.clone()), "http"), Some(xd));
    }

    #[test]
    fn test_strip_echo_only_strips_leading_occurrence() {
        let xd = owned(&["time | log | time"]);
        assert_eq!(strip_echo(Some(xd), "time | "), Some(owned(&["log | time"])));
    }
}
