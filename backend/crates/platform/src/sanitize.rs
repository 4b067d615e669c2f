//! Input sanitisation helpers.
//!
//! Database access is parameterized throughout, so there is no SQL escaping
//! here.

use uuid::Uuid;

/// Maximum length of a sanitised file name
pub const MAX_FILE_NAME_LEN: usize = 255;

/// Escape HTML-significant characters, including `'` and `/`
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            '/' => out.push_str("&#x2F;"),
            _ => out.push(c),
        }
    }
    out
}

/// Replace everything outside `[A-Za-z0-9._-]` with `_`, collapse runs of
/// dots and cap the length
pub fn sanitize_file_name(file_name: &str) -> String {
    let mut out = String::with_capacity(file_name.len());
    for c in file_name.chars() {
        let c = if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
            c
        } else {
            '_'
        };
        if c == '.' && out.ends_with('.') {
            continue;
        }
        out.push(c);
    }
    out.truncate(MAX_FILE_NAME_LEN);
    out
}

/// Hyphenated, version-4, RFC 4122 variant UUID (case-insensitive)
pub fn is_valid_uuid(s: &str) -> bool {
    if s.len() != 36 {
        return false;
    }
    match Uuid::try_parse(s) {
        Ok(id) => id.get_version_num() == 4 && id.get_variant() == uuid::Variant::RFC4122,
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<script>alert("x's")</script>"#),
            "&lt;script&gt;alert(&quot;x&#x27;s&quot;)&lt;&#x2F;script&gt;"
        );
        assert_eq!(escape_html("Tom & Jerry"), "Tom &amp; Jerry");
        assert_eq!(escape_html("plain"), "plain");
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("../../etc/passwd"), "._._etc_passwd");
        assert_eq!(sanitize_file_name("my photo (1).png"), "my_photo__1_.png");
        assert_eq!(sanitize_file_name("a....b"), "a.b");
        assert_eq!(sanitize_file_name("商品.jpg"), "__.jpg");
        assert_eq!(sanitize_file_name(&"a".repeat(300)).len(), MAX_FILE_NAME_LEN);
    }

    #[test]
    fn test_is_valid_uuid() {
        assert!(is_valid_uuid("550e8400-e29b-41d4-a716-446655440000"));
        assert!(is_valid_uuid("550E8400-E29B-41D4-A716-446655440000"));
        assert!(is_valid_uuid(&Uuid::new_v4().to_string()));

        // version 1
        assert!(!is_valid_uuid("550e8400-e29b-11d4-a716-446655440000"));
        // wrong variant
        assert!(!is_valid_uuid("550e8400-e29b-41d4-c716-446655440000"));
        // unhyphenated
        assert!(!is_valid_uuid("550e8400e29b41d4a716446655440000"));
        assert!(!is_valid_uuid("not-a-uuid"));
    }
}
