//! Connection parameter parsing and validation.
//!
//! This module handles the server address and the database open mode.

use crate::error::AddrParseError;
use crate::transport::messages::connect;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Address of a gduck server.
///
/// Textual form is `host:port`, split on the last colon. Hosts containing a
/// colon (IPv6 literals) are rejected as ambiguous.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Addr {
    /// Host name or IPv4 address
    pub host: String,
    /// TCP port
    pub port: u16,
}

impl Addr {
    /// Create an address from its parts.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl FromStr for Addr {
    type Err = AddrParseError;

    /// Parse an address in the format `host:port`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use gduck_client::connection::Addr;
    /// let addr: Addr = "localhost:50051".parse()?;
    /// assert_eq!(addr.host, "localhost");
    /// assert_eq!(addr.port, 50051);
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();

        let (host, port) = s
            .rsplit_once(':')
            .ok_or_else(|| AddrParseError::MissingPort(s.to_string()))?;

        if host.is_empty() {
            return Err(AddrParseError::EmptyHost(s.to_string()));
        }
        if host.contains(':') {
            return Err(AddrParseError::AmbiguousHost(s.to_string()));
        }

        let port = port
            .parse::<u16>()
            .map_err(|_| AddrParseError::InvalidPort(s.to_string()))?;

        Ok(Addr::new(host, port))
    }
}

impl TryFrom<String> for Addr {
    type Error = AddrParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Addr> for String {
    fn from(addr: Addr) -> Self {
        addr.to_string()
    }
}

impl fmt::Display for Addr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// How the server opens the database file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionMode {
    /// Let the server decide
    #[default]
    Auto,
    /// Open for reading and writing
    ReadWrite,
    /// Open read-only
    ReadOnly,
}

impl ConnectionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionMode::Auto => "auto",
            ConnectionMode::ReadWrite => "read_write",
            ConnectionMode::ReadOnly => "read_only",
        }
    }
}

impl FromStr for ConnectionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "auto" => Ok(ConnectionMode::Auto),
            "read_write" => Ok(ConnectionMode::ReadWrite),
            "read_only" => Ok(ConnectionMode::ReadOnly),
            _ => Err(format!(
                "Invalid connection mode '{}': expected auto, read_write or read_only",
                s
            )),
        }
    }
}

impl fmt::Display for ConnectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<ConnectionMode> for connect::Mode {
    fn from(mode: ConnectionMode) -> Self {
        match mode {
            ConnectionMode::Auto => connect::Mode::Auto,
            ConnectionMode::ReadWrite => connect::Mode::ReadWrite,
            ConnectionMode::ReadOnly => connect::Mode::ReadOnly,
        }
    }
}

impl From<connect::Mode> for ConnectionMode {
    fn from(mode: connect::Mode) -> Self {
        match mode {
            connect::Mode::Auto => ConnectionMode::Auto,
            connect::Mode::ReadWrite => ConnectionMode::ReadWrite,
            connect::Mode::ReadOnly => ConnectionMode::ReadOnly,
        }
    }
}
