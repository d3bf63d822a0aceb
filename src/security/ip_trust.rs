//! Trusted source classification.

use std::collections::HashSet;
use std::net::{IpAddr, Ipv6Addr};

/// Literal allowlist plus private/loopback address classification.
#[derive(Debug, Clone, Default)]
pub struct TrustedIps {
    literal: HashSet<String>,
}

impl TrustedIps {
    pub fn new<I, S>(ips: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            literal: ips.into_iter().map(Into::into).collect(),
        }
    }

    /// True for listed addresses and for any address that parses as private
    /// or loopback. Unparsable strings are not trusted.
    pub fn is_trusted(&self, ip: &str) -> bool {
        if self.literal.contains(ip) {
            return true;
        }
        match ip.trim().parse::<IpAddr>() {
            Ok(addr) => is_private_or_loopback(addr),
            Err(_) => false,
        }
    }
}

/// RFC 1918 private, loopback, IPv6 unique-local and IPv4-mapped forms.
pub fn is_private_or_loopback(addr: IpAddr) -> bool {
    match addr {
        IpAddr::V4(v4) => v4.is_private() || v4.is_loopback(),
        IpAddr::V6(v6) => match v6.to_ipv4_mapped() {
            Some(v4) => v4.is_private() || v4.is_loopback(),
            None => v6.is_loopback() || is_unique_local(&v6),
        },
    }
}

// fc00::/7
fn is_unique_local(v6: &Ipv6Addr) -> bool {
    (v6.segments()[0] & 0xfe00) == 0xfc00
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_private_and_loopback_ranges() {
        let trusted = TrustedIps::default();
        for ip in [
            "127.0.0.1",
            "127.8.9.10",
            "10.1.2.3",
            "172.16.0.1",
            "172.31.255.255",
            "192.168.1.50",
            "::1",
            "fd12:3456::1",
            "::ffff:192.168.0.1",
        ] {
            assert!(trusted.is_trusted(ip), "{ip} should be trusted");
        }
    }

    #[test]
    fn test_public_addresses_not_trusted() {
        let trusted = TrustedIps::default();
        for ip in ["1.2.3.4", "172.32.0.1", "8.8.8.8", "2001:db8::1", "::ffff:8.8.8.8"] {
            assert!(!trusted.is_trusted(ip), "{ip} should not be trusted");
        }
    }

    #[test]
    fn test_malformed_input_fails_toward_tracking() {
        let trusted = TrustedIps::default();
        for ip in ["", "localhost", "999.1.1.1", "10.0.0", "192.168.1.1; DROP"] {
            assert!(!trusted.is_trusted(ip));
        }
    }

    #[test]
    fn test_literal_list() {
        let trusted = TrustedIps::new(["203.0.113.9", "gateway"]);
        assert!(trusted.is_trusted("203.0.113.9"));
        assert!(trusted.is_trusted("gateway"));
        assert!(!trusted.is_trusted("203.0.113.10"));
    }
}
