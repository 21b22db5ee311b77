//! Endpoint addressing
//!
//! Parses the address forms accepted by both the server and the client:
//! - `host:port` or `tcp://host:port` for TCP
//! - `unix://<path>` for a Unix-domain socket

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::{CacheError, Result};

const TCP_SCHEME: &str = "tcp://";
const UNIX_SCHEME: &str = "unix://";

/// A listen or connect address
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// TCP `host:port`
    Tcp(String),

    /// Unix-domain socket at a filesystem path
    #[cfg(unix)]
    Unix(PathBuf),
}

impl Endpoint {
    /// Parse an endpoint string
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();

        if let Some(path) = s.strip_prefix(UNIX_SCHEME) {
            return Self::unix_from(path);
        }

        let addr = s.strip_prefix(TCP_SCHEME).unwrap_or(s);
        Self::tcp_from(addr)
    }

    /// Build a TCP endpoint, validating the `host:port` shape
    pub fn tcp(addr: impl Into<String>) -> Result<Self> {
        Self::tcp_from(&addr.into())
    }

    /// Build a Unix-socket endpoint
    #[cfg(unix)]
    pub fn unix(path: impl Into<PathBuf>) -> Self {
        Endpoint::Unix(path.into())
    }

    /// Whether this endpoint is served over TCP
    pub fn is_tcp(&self) -> bool {
        matches!(self, Endpoint::Tcp(_))
    }

    fn tcp_from(addr: &str) -> Result<Self> {
        let (host, port) = addr.rsplit_once(':').ok_or_else(|| {
            CacheError::Config(format!("TCP endpoint '{}' is missing a port", addr))
        })?;

        if host.is_empty() {
            return Err(CacheError::Config(format!(
                "TCP endpoint '{}' is missing a host",
                addr
            )));
        }

        port.parse::<u16>().map_err(|_| {
            CacheError::Config(format!("TCP endpoint '{}' has an invalid port", addr))
        })?;

        Ok(Endpoint::Tcp(addr.to_string()))
    }

    #[cfg(unix)]
    fn unix_from(path: &str) -> Result<Self> {
        if path.is_empty() {
            return Err(CacheError::Config(
                "Unix endpoint is missing a socket path".to_string(),
            ));
        }
        Ok(Endpoint::Unix(PathBuf::from(path)))
    }

    #[cfg(not(unix))]
    fn unix_from(path: &str) -> Result<Self> {
        Err(CacheError::Config(format!(
            "Unix-domain sockets are not supported on this platform ({})",
            path
        )))
    }
}

impl FromStr for Endpoint {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self> {
        Endpoint::parse(s)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Tcp(addr) => write!(f, "{}", addr),
            #[cfg(unix)]
            Endpoint::Unix(path) => write!(f, "{}{}", UNIX_SCHEME, path.display()),
        }
    }
}
