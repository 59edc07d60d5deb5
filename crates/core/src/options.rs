//! Connection options.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::wallet::Wallet;

/// Default bound on establishing the gateway connection to one peer.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default bound on a full submit round trip (endorse, order, commit).
pub const DEFAULT_SUBMIT_TIMEOUT: Duration = Duration::from_secs(60);

/// Whether live peers are discovered and how their addresses are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiscoveryPolicy {
    /// Ask the network for the channel's live endorsers instead of relying
    /// only on the static channel section of the descriptor.
    pub enabled: bool,
    /// Rewrite every discovered host to `localhost`.
    ///
    /// Only correct when the whole network runs on the local machine and
    /// advertises container host names. Off unless explicitly requested.
    pub as_localhost: bool,
}

impl DiscoveryPolicy {
    /// Discovery on, addresses used as advertised.
    pub fn enabled() -> Self {
        Self {
            enabled: true,
            as_localhost: false,
        }
    }

    /// Only statically configured peers are used.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            as_localhost: false,
        }
    }

    /// Discovery on with loopback rewriting, for single-host test networks.
    pub fn local() -> Self {
        Self {
            enabled: true,
            as_localhost: true,
        }
    }
}

impl Default for DiscoveryPolicy {
    fn default() -> Self {
        Self::enabled()
    }
}

/// Options for one connection attempt. Immutable once built.
#[derive(Clone)]
pub struct ConnectionOptions {
    identity: String,
    wallet: Arc<dyn Wallet>,
    discovery: DiscoveryPolicy,
    connect_timeout: Duration,
    submit_timeout: Duration,
}

impl ConnectionOptions {
    /// Starts building options for `identity` looked up in `wallet`.
    pub fn builder(identity: impl Into<String>, wallet: Arc<dyn Wallet>) -> ConnectionOptionsBuilder {
        ConnectionOptionsBuilder {
            options: ConnectionOptions {
                identity: identity.into(),
                wallet,
                discovery: DiscoveryPolicy::default(),
                connect_timeout: DEFAULT_CONNECT_TIMEOUT,
                submit_timeout: DEFAULT_SUBMIT_TIMEOUT,
            },
        }
    }

    /// Wallet label of the identity to connect as.
    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn wallet(&self) -> &Arc<dyn Wallet> {
        &self.wallet
    }

    pub fn discovery(&self) -> DiscoveryPolicy {
        self.discovery
    }

    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    pub fn submit_timeout(&self) -> Duration {
        self.submit_timeout
    }
}

impl fmt::Debug for ConnectionOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionOptions")
            .field("identity", &self.identity)
            .field("discovery", &self.discovery)
            .field("connect_timeout", &self.connect_timeout)
            .field("submit_timeout", &self.submit_timeout)
            .finish_non_exhaustive()
    }
}

/// Builder for [`ConnectionOptions`].
pub struct ConnectionOptionsBuilder {
    options: ConnectionOptions,
}

impl ConnectionOptionsBuilder {
    pub fn discovery(mut self, discovery: DiscoveryPolicy) -> Self {
        self.options.discovery = discovery;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.options.connect_timeout = timeout;
        self
    }

    pub fn submit_timeout(mut self, timeout: Duration) -> Self {
        self.options.submit_timeout = timeout;
        self
    }

    pub fn build(self) -> ConnectionOptions {
        self.options
    }
}
