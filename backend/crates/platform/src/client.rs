//! Client identification utilities
//!
//! Derives the caller identity used to key rate limits and audit entries.
//! Forwarding headers are client-controlled unless a trusted proxy
//! overwrites them, so the result is an identity hint, not proof of origin.

use axum::http::HeaderMap;
use std::net::IpAddr;

/// Identity returned when no source yields a value
pub const UNKNOWN_CLIENT: &str = "unknown";

const X_FORWARDED_FOR: &str = "x-forwarded-for";
const X_REAL_IP: &str = "x-real-ip";
const REMOTE_ADDR: &str = "remote-addr";

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

fn forwarded_ip(headers: &HeaderMap) -> Option<String> {
    if let Some(xff) = header_str(headers, X_FORWARDED_FOR) {
        if let Some(first) = xff.split(',').next().map(str::trim).filter(|s| !s.is_empty()) {
            return Some(first.to_string());
        }
    }
    header_str(headers, X_REAL_IP).map(str::to_string)
}

/// Caller identity from request headers
///
/// Precedence: first entry of `x-forwarded-for` (trimmed), then
/// `x-real-ip`, then `remote-addr`, then `"unknown"`. A blank first
/// forwarded entry counts as absent and never yields an empty identity.
/// Values are not parsed as IP addresses.
pub fn extract_ip(headers: &HeaderMap) -> String {
    forwarded_ip(headers)
        .or_else(|| header_str(headers, REMOTE_ADDR).map(str::to_string))
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}

/// Like [`extract_ip`], with the socket peer address standing in for the
/// `remote-addr` header when the server knows it
pub fn extract_ip_or_peer(headers: &HeaderMap, peer: Option<IpAddr>) -> String {
    forwarded_ip(headers)
        .or_else(|| peer.map(|ip| ip.to_string()))
        .or_else(|| header_str(headers, REMOTE_ADDR).map(str::to_string))
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}

/// Exact-match membership in a deny list (no CIDR matching)
pub fn is_blacklisted<S: AsRef<str>>(ip: &str, blacklist: &[S]) -> bool {
    blacklist.iter().any(|entry| entry.as_ref() == ip)
}

/// Exact-match membership in an allow list (no CIDR matching)
pub fn is_whitelisted<S: AsRef<str>>(ip: &str, whitelist: &[S]) -> bool {
    whitelist.iter().any(|entry| entry.as_ref() == ip)
}
