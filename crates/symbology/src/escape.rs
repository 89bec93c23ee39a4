//! XML escaping for user-provided values embedded in SLD documents.

/// Escape the five reserved XML characters.
///
/// `&` is replaced first, then `<`, `>`, `"`, `'`, so escaping already
/// escaped output never double-escapes entity ampersands of the later
/// replacements.
pub fn escape_xml(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escapes_all_five() {
        assert_eq!(
            escape_xml(r#"a&b<c>d"e'f"#),
            "a&amp;b&lt;c&gt;d&quot;e&apos;f"
        );
    }

    #[test]
    fn test_plain_text_unchanged() {
        assert_eq!(escape_xml("watershed_area"), "watershed_area");
    }
}
