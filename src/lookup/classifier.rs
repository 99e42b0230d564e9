//! Private/loopback address detection
//!
//! Matching is textual: `10.` and `192.168.` prefixes, `172.16.` through
//! `172.31.`, and the two loopback literals. Malformed input is public.

pub fn is_private(ip: &str) -> bool {
    ip.starts_with("10.")
        || ip.starts_with("192.168.")
        || is_private_172(ip)
        || ip == "127.0.0.1"
        || ip == "::1"
}

/// `172.16.0.0/12`: second octet written as exactly two digits in 16..=31
fn is_private_172(ip: &str) -> bool {
    let Some(rest) = ip.strip_prefix("172.") else {
        return false;
    };
    let Some((second, _)) = rest.split_once('.') else {
        return false;
    };

    second.len() == 2
        && second.bytes().all(|b| b.is_ascii_digit())
        && matches!(second.parse::<u8>(), Ok(16..=31))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rfc1918_ranges_are_private() {
        for ip in [
            "10.0.0.1",
            "10.255.255.255",
            "192.168.0.1",
            "192.168.100.42",
            "172.16.0.1",
            "172.20.5.5",
            "172.31.255.255",
        ] {
            assert!(is_private(ip), "{ip} should be private");
        }
    }

    #[test]
    fn test_loopback_literals_are_private() {
        assert!(is_private("127.0.0.1"));
        assert!(is_private("::1"));
    }

    #[test]
    fn test_172_outside_range_is_public() {
        for ip in ["172.15.0.1", "172.32.0.1", "172.1.0.1", "172.160.0.1"] {
            assert!(!is_private(ip), "{ip} should be public");
        }
    }

    #[test]
    fn test_public_addresses() {
        for ip in [
            "8.8.8.8",
            "1.1.1.1",
            "203.0.113.5",
            "100.64.0.1",
            "11.0.0.1",
            "192.169.0.1",
            "2001:4860:4860::8888",
            "::ffff:10.0.0.1",
        ] {
            assert!(!is_private(ip), "{ip} should be public");
        }
    }

    #[test]
    fn test_other_loopback_forms_are_public() {
        // Only the two exact literals count as loopback
        assert!(!is_private("127.0.0.2"));
        assert!(!is_private("0:0:0:0:0:0:0:1"));
    }

    #[test]
    fn test_malformed_input_is_public() {
        assert!(!is_private(""));
        assert!(!is_private("not an ip"));
        assert!(!is_private("172."));
        assert!(!is_private("172.16"));
    }
}
