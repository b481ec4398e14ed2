//! Byte-budget truncation that never splits a UTF-8 character.

/// Marker appended when prompt input is cut to fit a budget.
pub(crate) const TRUNCATION_MARKER: &str = "\n[truncated]";

/// Clip `text` to at most `limit` bytes on a char boundary.
pub(crate) fn clip(text: &str, limit: usize) -> &str {
    if text.len() <= limit {
        return text;
    }
    let mut end = limit;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

/// Clip `text` to `limit` bytes and append the truncation marker so the
/// model knows the input was cut.
pub(crate) fn truncate_with_marker(text: &str, limit: usize) -> String {
    if text.len() <= limit {
        return text.to_string();
    }
    format!("{}{}", clip(text, limit), TRUNCATION_MARKER)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_input_is_untouched() {
        assert_eq!(truncate_with_marker("hello", 100), "hello");
        assert_eq!(clip("hello", 100), "hello");
    }

    #[test]
    fn long_input_is_cut_and_marked() {
        let text = "a".repeat(200);
        let out = truncate_with_marker(&text, 50);
        assert!(out.starts_with(&"a".repeat(50)));
        assert!(out.ends_with(TRUNCATION_MARKER));
        assert_eq!(out.len(), 50 + TRUNCATION_MARKER.len());
    }

    #[test]
    fn multibyte_chars_are_not_split() {
        // "é" is two bytes; a limit landing mid-char must back up.
        let text = "ééééé";
        let out = clip(text, 5);
        assert_eq!(out, "éé");
        assert!(out.is_char_boundary(out.len()));
    }
}
