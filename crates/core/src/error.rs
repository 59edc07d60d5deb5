//! Error types shared by every layer of the client.
//!
//! Each variant maps to exactly one [`ErrorKind`]. The kind is what operators
//! see in the final report and what callers match on when deciding whether a
//! fresh attempt makes sense; none of these errors is recovered locally.

use std::fmt;
use std::time::Duration;

/// Result type alias for the ledger client.
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification of a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Network descriptor or local configuration is malformed or unreadable.
    Configuration,
    /// Identity is missing from the wallet or was rejected by the network.
    Authentication,
    /// No endpoint described by the network descriptor responded.
    Connectivity,
    /// Channel or contract is unknown to the network.
    NotFound,
    /// Transaction arguments were rejected, locally or by the contract.
    Argument,
    /// Endorsement was refused or endorsers disagreed.
    Endorsement,
    /// Ordering or commit validation rejected the transaction.
    Commit,
    /// No terminal outcome within the configured deadline.
    Timeout,
    /// Transport failure on an established session.
    Network,
    /// Response bytes do not match the expected encoding.
    Decode,
}

impl ErrorKind {
    /// Stable operator-facing name of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Configuration => "ConfigurationError",
            ErrorKind::Authentication => "AuthenticationError",
            ErrorKind::Connectivity => "ConnectivityError",
            ErrorKind::NotFound => "NotFoundError",
            ErrorKind::Argument => "ArgumentError",
            ErrorKind::Endorsement => "EndorsementError",
            ErrorKind::Commit => "CommitError",
            ErrorKind::Timeout => "TimeoutError",
            ErrorKind::Network => "NetworkError",
            ErrorKind::Decode => "DecodeError",
        }
    }

    /// Whether resubmitting the same request could plausibly succeed.
    ///
    /// Only transient transport conditions qualify. Endorsement and commit
    /// failures are excluded because the transaction may not be idempotent.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ErrorKind::Connectivity | ErrorKind::Timeout | ErrorKind::Network
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named network resource that a lookup can fail to find.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Channel,
    Contract,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resource::Channel => f.write_str("channel"),
            Resource::Contract => f.write_str("contract"),
        }
    }
}

/// Errors produced while connecting, submitting or decoding.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    Configuration(String),

    #[error("identity `{identity}` rejected: {reason}")]
    Authentication { identity: String, reason: String },

    #[error("no reachable endpoint: {0}")]
    Connectivity(String),

    #[error("{resource} `{name}` not found")]
    NotFound { resource: Resource, name: String },

    #[error("invalid arguments for `{transaction}`: {reason}")]
    Argument { transaction: String, reason: String },

    #[error("endorsement of `{transaction}` failed: {reason}")]
    Endorsement { transaction: String, reason: String },

    #[error("transaction {tx_id} rejected at commit: {code}")]
    Commit { tx_id: String, code: String },

    #[error("{operation} did not complete within {after:?}")]
    Timeout { operation: String, after: Duration },

    #[error("network failure: {0}")]
    Network(String),

    #[error("cannot decode response: {0}")]
    Decode(String),
}

impl Error {
    /// Classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Configuration(_) => ErrorKind::Configuration,
            Error::Authentication { .. } => ErrorKind::Authentication,
            Error::Connectivity(_) => ErrorKind::Connectivity,
            Error::NotFound { .. } => ErrorKind::NotFound,
            Error::Argument { .. } => ErrorKind::Argument,
            Error::Endorsement { .. } => ErrorKind::Endorsement,
            Error::Commit { .. } => ErrorKind::Commit,
            Error::Timeout { .. } => ErrorKind::Timeout,
            Error::Network(_) => ErrorKind::Network,
            Error::Decode(_) => ErrorKind::Decode,
        }
    }

    pub fn channel_not_found(name: impl Into<String>) -> Self {
        Error::NotFound {
            resource: Resource::Channel,
            name: name.into(),
        }
    }

    pub fn contract_not_found(name: impl Into<String>) -> Self {
        Error::NotFound {
            resource: Resource::Contract,
            name: name.into(),
        }
    }
}
