//! Network endpoint addresses.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Host name that discovered addresses are rewritten to for local networks.
pub const LOCALHOST: &str = "localhost";

/// URL scheme of an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    Grpc,
    Grpcs,
    Tcp,
}

impl Scheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Grpc => "grpc",
            Scheme::Grpcs => "grpcs",
            Scheme::Tcp => "tcp",
        }
    }

    /// Whether the profile expects trust material for this endpoint.
    pub fn is_secure(&self) -> bool {
        matches!(self, Scheme::Grpcs)
    }
}

/// A `scheme://host:port` network address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Endpoint {
    scheme: Scheme,
    host: String,
    port: u16,
}

impl Endpoint {
    pub fn new(scheme: Scheme, host: impl Into<String>, port: u16) -> Self {
        Self {
            scheme,
            host: host.into(),
            port,
        }
    }

    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// `host:port`, suitable for a socket connect.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Same endpoint with the host replaced by the loopback name.
    pub fn as_localhost(&self) -> Self {
        Self {
            scheme: self.scheme,
            host: LOCALHOST.to_string(),
            port: self.port,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}:{}", self.scheme.as_str(), self.host, self.port)
    }
}

impl FromStr for Endpoint {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = |why: &str| Error::Configuration(format!("invalid endpoint `{}`: {}", s, why));

        let (scheme, rest) = s.split_once("://").ok_or_else(|| bad("missing scheme"))?;
        let scheme = match scheme {
            "grpc" => Scheme::Grpc,
            "grpcs" => Scheme::Grpcs,
            "tcp" => Scheme::Tcp,
            _ => return Err(bad("unsupported scheme")),
        };

        let rest = rest.trim_end_matches('/');
        let (host, port) = rest.rsplit_once(':').ok_or_else(|| bad("missing port"))?;
        if host.is_empty() || host.contains('/') {
            return Err(bad("missing host"));
        }
        let port = port.parse::<u16>().map_err(|_| bad("port is not a number"))?;
        if port == 0 {
            return Err(bad("port must be non-zero"));
        }

        Ok(Self::new(scheme, host, port))
    }
}

impl TryFrom<String> for Endpoint {
    type Error = Error;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Endpoint> for String {
    fn from(endpoint: Endpoint) -> Self {
        endpoint.to_string()
    }
}

/// A named peer and where to reach it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerEndpoint {
    pub name: String,
    pub endpoint: Endpoint,
}

impl PeerEndpoint {
    pub fn new(name: impl Into<String>, endpoint: Endpoint) -> Self {
        Self {
            name: name.into(),
            endpoint,
        }
    }
}
