//! Textual escaping of control characters inside TSV fields.
//!
//! Tabs, newlines, and carriage returns are written as the two-character
//! sequences `\t`, `\n`, and `\r`. Backslashes are not escaped, matching
//! existing dataset files.

/// Escapes a decoded field value for writing.
#[must_use]
pub fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            _ => out.push(c),
        }
    }
    out
}

/// Reverses [`escape`] in a single left-to-right pass.
#[must_use]
pub fn unescape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.peek() {
            Some('t') => {
                out.push('\t');
                chars.next();
            }
            Some('n') => {
                out.push('\n');
                chars.next();
            }
            Some('r') => {
                out.push('\r');
                chars.next();
            }
            _ => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_control_characters_as_text() {
        assert_eq!(escape("a\tb\nc\r\nd"), "a\\tb\\nc\\r\\nd");
        assert!(!escape("x\ty\nz").contains(['\t', '\n']));
    }

    #[test]
    fn unescape_reverses_escape() {
        let original = "一行目\n二行目\tタブ\r";
        assert_eq!(unescape(&escape(original)), original);
    }

    #[test]
    fn escape_reverses_unescape_for_existing_files() {
        for raw in ["plain", "a\\nb", "trailing\\", "\\x kept", "C:\\path"] {
            assert_eq!(escape(&unescape(raw)), raw, "{raw}");
        }
    }

    #[test]
    fn literal_backslash_n_reads_back_as_a_newline() {
        // Backslashes are not escaped, so this round trip is lossy.
        let text = "path C:\\new";
        assert_eq!(escape(text), text);
        assert_eq!(unescape(&escape(text)), "path C:\new");
    }

    #[test]
    fn lone_backslashes_are_kept() {
        assert_eq!(unescape("a\\b"), "a\\b");
        assert_eq!(unescape("end\\"), "end\\");
    }
}
