//! Client IP extraction from request metadata
//!
//! This module picks the address a visit is attributed to:
//! - Prefers the first entry of `X-Forwarded-For`
//! - Falls back to the socket peer address
//! - Falls back to a fixed public address when neither is available
//! - Redirects IPv6 loopback to the same public address so local
//!   development still exercises a real lookup
//! - Strips the `::ffff:` prefix from IPv4-mapped IPv6 addresses

use axum::http::HeaderMap;
use std::net::SocketAddr;

/// Public address used when no client address is observable or it is loopback
pub const DEFAULT_PUBLIC_IP: &str = "8.8.8.8";

const MAPPED_IPV4_PREFIX: &str = "::ffff:";

/// Extract the client IP from HTTP headers and the peer address
///
/// # Arguments
/// * `headers` - HTTP request headers
/// * `peer_addr` - The socket remote address, when the server exposes it
///
/// # Returns
/// A non-empty address string suitable for classification and lookup
pub fn extract_client_ip(headers: &HeaderMap, peer_addr: Option<SocketAddr>) -> String {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok());
    let peer = peer_addr.map(|addr| addr.ip().to_string());

    resolve_client_ip(forwarded, peer.as_deref())
}

/// Resolve the best-guess client IP from raw metadata values
pub fn resolve_client_ip(forwarded_for: Option<&str>, connection_addr: Option<&str>) -> String {
    let candidate = forwarded_for
        .and_then(first_forwarded_entry)
        .or_else(|| connection_addr.map(str::trim).filter(|s| !s.is_empty()))
        .unwrap_or(DEFAULT_PUBLIC_IP);

    if is_loopback_signal(candidate) {
        return DEFAULT_PUBLIC_IP.to_string();
    }

    let ip = candidate
        .strip_prefix(MAPPED_IPV4_PREFIX)
        .unwrap_or(candidate);

    if ip.is_empty() {
        DEFAULT_PUBLIC_IP.to_string()
    } else {
        ip.to_string()
    }
}

/// First comma-separated entry of a forwarded list, if it is non-blank
fn first_forwarded_entry(value: &str) -> Option<&str> {
    value
        .split(',')
        .next()
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn is_loopback_signal(ip: &str) -> bool {
    ip == "::1" || ip.starts_with("::ffff:127")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_forwarded_list_uses_first_entry() {
        assert_eq!(
            resolve_client_ip(Some("203.0.113.5, 10.0.0.1"), Some("192.0.2.1")),
            "203.0.113.5"
        );
    }

    #[test]
    fn test_no_metadata_uses_default() {
        assert_eq!(resolve_client_ip(None, None), DEFAULT_PUBLIC_IP);
    }

    #[test]
    fn test_mapped_ipv4_prefix_is_stripped() {
        assert_eq!(
            resolve_client_ip(None, Some("::ffff:198.51.100.7")),
            "198.51.100.7"
        );
    }

    #[test]
    fn test_ipv6_loopback_is_redirected() {
        assert_eq!(resolve_client_ip(None, Some("::1")), DEFAULT_PUBLIC_IP);
        assert_eq!(
            resolve_client_ip(None, Some("::ffff:127.0.0.1")),
            DEFAULT_PUBLIC_IP
        );
        assert_eq!(
            resolve_client_ip(Some("::ffff:127.0.0.1, 10.0.0.1"), None),
            DEFAULT_PUBLIC_IP
        );
    }

    #[test]
    fn test_ipv4_loopback_is_kept() {
        // Only the IPv6 spellings trigger the demo address
        assert_eq!(resolve_client_ip(None, Some("127.0.0.1")), "127.0.0.1");
    }

    #[test]
    fn test_blank_forwarded_header_falls_back_to_connection() {
        assert_eq!(
            resolve_client_ip(Some("  "), Some("198.51.100.7")),
            "198.51.100.7"
        );
        assert_eq!(
            resolve_client_ip(Some(", 10.0.0.1"), Some("198.51.100.7")),
            "198.51.100.7"
        );
    }

    #[test]
    fn test_extract_prefers_header_over_peer() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.1, 198.51.100.1"),
        );
        let peer: SocketAddr = "192.168.1.1:4000".parse().unwrap();

        assert_eq!(extract_client_ip(&headers, Some(peer)), "203.0.113.1");
    }

    #[test]
    fn test_extract_uses_peer_without_header() {
        let headers = HeaderMap::new();
        let peer: SocketAddr = "[::ffff:198.51.100.7]:4000".parse().unwrap();

        assert_eq!(extract_client_ip(&headers, Some(peer)), "198.51.100.7");
        assert_eq!(extract_client_ip(&headers, None), DEFAULT_PUBLIC_IP);
    }
}
