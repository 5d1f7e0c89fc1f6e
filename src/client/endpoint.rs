use crate::client::constants::TRANSPORT_SCHEME;
use crate::client::error::ProberError;
use std::fmt;
use std::net::{SocketAddr, ToSocketAddrs};
use tracing::debug;

/// A resolved responder address.
///
/// Accepts `tcp://host:port` or a bare `host:port`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    authority: String,
    addrs: Vec<SocketAddr>,
}

impl Endpoint {
    /// Parse and resolve a responder address.
    ///
    /// The host part may be a name, an IPv4 address or a bracketed IPv6
    /// address; it is resolved once here, so later connects never hit DNS.
    ///
    /// # Arguments
    ///
    /// * `address` - `tcp://host:port` or bare `host:port`, surrounding
    ///   whitespace and a trailing `/` allowed
    ///
    /// # Errors
    ///
    /// Returns [`ProberError::InvalidAddress`] for a foreign scheme, a missing
    /// host, a missing, zero or non-numeric port, or a host that does not
    /// resolve.
    pub fn parse(address: &str) -> Result<Self, ProberError> {
        let invalid = |reason: String| ProberError::InvalidAddress {
            address: address.to_string(),
            reason,
        };

        let trimmed = address.trim();
        let authority = match trimmed.split_once("://") {
            Some((scheme, rest)) if scheme.eq_ignore_ascii_case(TRANSPORT_SCHEME) => rest,
            Some((scheme, _)) => {
                return Err(invalid(format!(
                    "unsupported scheme '{}', expected '{}'",
                    scheme, TRANSPORT_SCHEME
                )))
            }
            None => trimmed,
        };
        let authority = authority.trim_end_matches('/');

        let (host, port) = authority
            .rsplit_once(':')
            .ok_or_else(|| invalid("missing port".into()))?;
        if host.is_empty() {
            return Err(invalid("missing host".into()));
        }
        match port.parse::<u16>() {
            Ok(0) => return Err(invalid("port must be > 0".into())),
            Ok(_) => {}
            Err(e) => return Err(invalid(format!("invalid port '{}': {}", port, e))),
        }

        let addrs: Vec<SocketAddr> = authority
            .to_socket_addrs()
            .map_err(|e| invalid(format!("cannot resolve host: {}", e)))?
            .collect();
        if addrs.is_empty() {
            return Err(invalid("host resolved to no addresses".into()));
        }

        debug!(authority = authority, resolved = ?addrs, "Endpoint resolved");
        Ok(Self {
            authority: authority.to_string(),
            addrs,
        })
    }

    pub fn addrs(&self) -> &[SocketAddr] {
        &self.addrs
    }
}

impl From<SocketAddr> for Endpoint {
    fn from(addr: SocketAddr) -> Self {
        Self {
            authority: addr.to_string(),
            addrs: vec![addr],
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", TRANSPORT_SCHEME, self.authority)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reason(address: &str) -> String {
        match Endpoint::parse(address) {
            Err(ProberError::InvalidAddress { reason, .. }) => reason,
            other => panic!("expected InvalidAddress for {}, got {:?}", address, other),
        }
    }

    #[test]
    fn test_parse_with_scheme() -> Result<(), ProberError> {
        let endpoint = Endpoint::parse("tcp://127.0.0.1:8080")?;
        let expected: SocketAddr = "127.0.0.1:8080".parse().unwrap();
        assert_eq!(endpoint.addrs(), &[expected]);
        assert_eq!(endpoint.to_string(), "tcp://127.0.0.1:8080");
        Ok(())
    }

    #[test]
    fn test_parse_bare_and_ipv6() -> Result<(), ProberError> {
        let v4 = Endpoint::parse(" 127.0.0.1:9000/ ")?;
        assert_eq!(v4.addrs()[0].port(), 9000);

        let v6 = Endpoint::parse("TCP://[::1]:9001")?;
        assert!(v6.addrs()[0].is_ipv6());
        Ok(())
    }

    #[test]
    fn test_parse_rejects_foreign_scheme() {
        assert!(reason("ws://127.0.0.1:8080").contains("unsupported scheme"));
    }

    #[test]
    fn test_parse_rejects_bad_ports() {
        assert_eq!(reason("127.0.0.1"), "missing port");
        assert_eq!(reason("127.0.0.1:0"), "port must be > 0");
        assert!(reason("127.0.0.1:http").starts_with("invalid port"));
        assert!(reason("127.0.0.1:70000").starts_with("invalid port"));
        assert_eq!(reason(":8080"), "missing host");
    }

    #[test]
    fn test_from_socket_addr() {
        let addr: SocketAddr = "192.0.2.1:4000".parse().unwrap();
        let endpoint = Endpoint::from(addr);
        assert_eq!(endpoint.addrs(), &[addr]);
        assert_eq!(endpoint.to_string(), "tcp://192.0.2.1:4000");
    }
}
