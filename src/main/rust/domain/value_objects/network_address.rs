use std::fmt;
use std::str::FromStr;

use crate::domain::errors::{DomainError, Result};

/// A network transport endpoint, written as `host:port`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NetworkAddress {
    host: String,
    port: u16,
}

impl NetworkAddress {
    pub fn new(host: String, port: u16) -> Result<Self> {
        if host.is_empty() || host.chars().any(char::is_whitespace) {
            return Err(DomainError::InvalidNetworkAddress(format!("{}:{}", host, port)));
        }
        if port == 0 {
            return Err(DomainError::InvalidNetworkAddress(format!("{}:{}", host, port)));
        }
        Ok(Self { host, port })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

impl FromStr for NetworkAddress {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || DomainError::InvalidNetworkAddress(s.to_string());

        let (host, port) = s.rsplit_once(':').ok_or_else(invalid)?;
        let host = host
            .strip_prefix('[')
            .and_then(|h| h.strip_suffix(']'))
            .unwrap_or(host);
        let port = port.parse::<u16>().map_err(|_| invalid())?;

        Self::new(host.to_string(), port).map_err(|_| invalid())
    }
}

impl fmt::Display for NetworkAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}
