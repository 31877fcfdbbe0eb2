/// Escape `& < > " '` so untrusted text can be embedded in HTML or XML.
///
/// The core never emits markup; this is for renderers that do.
pub fn escape_markup(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escapes_script() {
        assert_eq!(
            escape_markup("<script>alert('x')</script>"),
            "&lt;script&gt;alert(&#x27;x&#x27;)&lt;/script&gt;"
        );
    }

    #[test]
    fn test_plain_text_untouched() {
        assert_eq!(escape_markup("pH 7.20 nominal"), "pH 7.20 nominal");
        assert_eq!(escape_markup("a & \"b\""), "a &amp; &quot;b&quot;");
    }
}
