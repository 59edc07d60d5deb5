//! Capabilities the session layer consumes.
//!
//! The network is reached only through these traits. A [`Connector`] opens a
//! [`GatewayLink`]; a link hands out channel links, which hand out contract
//! links, which submit transactions. Implementations exist for TCP gateways
//! ([`crate::tcp`]) and for scripted in-memory networks ([`crate::stub`]).
//!
//! # Thread Safety
//!
//! All capabilities are `Send + Sync` so a session can be moved across tasks,
//! even though one workflow only ever drives it from a single task.

use async_trait::async_trait;
use ledger_core::{ConnectionOptions, Identity, NetworkDescriptor, PeerEndpoint, Result, TransactionRequest};

/// Opens gateway links.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Reaches the network described by `descriptor` as `identity`.
    ///
    /// Fails with a connectivity error when no endpoint answers and with an
    /// authentication error when the network refuses the identity.
    async fn connect(
        &self,
        descriptor: &NetworkDescriptor,
        identity: &Identity,
        options: &ConnectionOptions,
    ) -> Result<Box<dyn GatewayLink>>;

    /// Name of the connector (for logging).
    fn name(&self) -> &'static str;
}

/// A live connection to the network.
#[async_trait]
pub trait GatewayLink: Send + Sync {
    /// Binds a channel, failing with not-found if the network does not know it.
    async fn channel(&self, name: &str) -> Result<Box<dyn ChannelLink>>;

    /// Releases the connection. Called at most once.
    async fn close(&mut self) -> Result<()>;
}

/// A channel reachable through a gateway link.
#[async_trait]
pub trait ChannelLink: Send + Sync {
    fn name(&self) -> &str;

    /// Peers proposals on this channel are sent to.
    fn endorsers(&self) -> &[PeerEndpoint];

    /// Binds a contract deployed on this channel.
    async fn contract(&self, name: &str) -> Result<Box<dyn ContractLink>>;
}

/// A contract reachable through a channel link.
#[async_trait]
pub trait ContractLink: Send + Sync {
    fn name(&self) -> &str;

    /// Runs one endorse, order and commit round trip and returns the
    /// committed response payload.
    async fn submit(&self, request: &TransactionRequest) -> Result<Vec<u8>>;
}
