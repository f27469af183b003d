//! Address resolution with ordered fallback.
//!
//! A (host, port) pair resolves to an ordered list of candidate addresses.
//! Callers walk the list front to back and take the first candidate that
//! connects or binds, so resolver order must be preserved.

use crate::error::Error;
use std::io;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use tokio::net::lookup_host;

/// Which side of the exchange is resolving.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Resolving a remote endpoint to connect to.
    Client,
    /// Resolving a local endpoint to bind.
    Server,
}

/// Resolve a (host, port) pair into an ordered candidate list.
///
/// A server with no host gets wildcard candidates covering all local
/// interfaces, IPv6 first. The list is never empty on success; failure to
/// produce any candidate is a `Resolution` error, fatal to the caller.
pub async fn resolve(
    host: Option<&str>,
    port: &str,
    role: Role,
) -> Result<Vec<SocketAddr>, Error> {
    match host {
        Some(host) => {
            // IPv6 literals need brackets before the port.
            let endpoint = if host.contains(':') {
                format!("[{host}]:{port}")
            } else {
                format!("{host}:{port}")
            };
            let candidates: Vec<SocketAddr> = lookup_host(endpoint.as_str())
                .await
                .map_err(|e| Error::Resolution(endpoint.clone(), e))?
                .collect();
            if candidates.is_empty() {
                return Err(Error::Resolution(
                    endpoint,
                    io::Error::new(io::ErrorKind::NotFound, "resolver returned no addresses"),
                ));
            }
            Ok(candidates)
        }
        None => {
            if role == Role::Client {
                return Err(Error::Resolution(
                    format!(":{port}"),
                    io::Error::new(io::ErrorKind::InvalidInput, "client requires a host"),
                ));
            }
            let port: u16 = port.parse().map_err(|_| {
                Error::Resolution(
                    format!(":{port}"),
                    io::Error::new(io::ErrorKind::InvalidInput, "invalid port"),
                )
            })?;
            Ok(vec![
                SocketAddr::from((Ipv6Addr::UNSPECIFIED, port)),
                SocketAddr::from((Ipv4Addr::UNSPECIFIED, port)),
            ])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_wildcard_candidates_ordered() {
        let candidates = resolve(None, "9034", Role::Server).await.unwrap();
        assert_eq!(candidates.len(), 2);
        assert!(candidates[0].is_ipv6());
        assert!(candidates[1].is_ipv4());
        assert_eq!(candidates[0].port(), 9034);
        assert_eq!(candidates[1].port(), 9034);
    }

    #[tokio::test]
    async fn test_loopback_resolves() {
        let candidates = resolve(Some("127.0.0.1"), "80", Role::Client)
            .await
            .unwrap();
        assert!(!candidates.is_empty());
        assert_eq!(candidates[0].port(), 80);
    }

    #[tokio::test]
    async fn test_invalid_port_is_resolution_error() {
        let err = resolve(None, "not-a-port", Role::Server).await.unwrap_err();
        assert!(matches!(err, Error::Resolution(_, _)));
    }

    #[tokio::test]
    async fn test_client_without_host_is_rejected() {
        let err = resolve(None, "9034", Role::Client).await.unwrap_err();
        assert!(matches!(err, Error::Resolution(_, _)));
    }
}
