//! Security response headers.

use axum::http::{HeaderName, HeaderValue, header};

const CSP_DIRECTIVES: &[&str] = &[
    "default-src 'self'",
    "script-src 'self' 'unsafe-inline' 'unsafe-eval'",
    "style-src 'self' 'unsafe-inline'",
    "img-src 'self' data: https:",
    "font-src 'self' data:",
    "connect-src 'self' https:",
    "frame-ancestors 'none'",
    "base-uri 'self'",
    "form-action 'self'",
];

/// The fixed Content-Security-Policy for the admin frontend
pub fn content_security_policy() -> String {
    CSP_DIRECTIVES.join("; ")
}

/// Headers set on every response
pub fn security_headers() -> Vec<(HeaderName, HeaderValue)> {
    let mut headers = vec![
        (header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY")),
        (
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ),
        (
            header::REFERRER_POLICY,
            HeaderValue::from_static("strict-origin-when-cross-origin"),
        ),
    ];
    // Directives are static ASCII, so this conversion cannot fail in practice.
    if let Ok(csp) = HeaderValue::from_str(&content_security_policy()) {
        headers.push((header::CONTENT_SECURITY_POLICY, csp));
    }
    headers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csp_directives() {
        let csp = content_security_policy();
        assert!(csp.starts_with("default-src 'self'; "));
        assert!(csp.contains("frame-ancestors 'none'"));
        assert!(csp.ends_with("form-action 'self'"));
        assert_eq!(csp.split("; ").count(), 9);
    }

    #[test]
    fn test_security_headers_present() {
        let headers = security_headers();
        let get = |name: &HeaderName| {
            headers
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, v)| v.to_str().unwrap().to_string())
        };

        assert_eq!(get(&header::X_FRAME_OPTIONS).as_deref(), Some("DENY"));
        assert_eq!(
            get(&header::X_CONTENT_TYPE_OPTIONS).as_deref(),
            Some("nosniff")
        );
        assert_eq!(
            get(&header::CONTENT_SECURITY_POLICY),
            Some(content_security_policy())
        );
    }
}
