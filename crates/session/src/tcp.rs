//! Gateway links over TCP.
//!
//! The links speak this workspace's own framed-JSON gateway protocol (see
//! [`ledger_wire::protocol`]). A compatible gateway service must listen on the
//! peer addresses of the connection profile; a network peer's gRPC gateway
//! endpoint does not understand these frames.
//!
//! The session holds one framed connection to a gateway peer of the client's
//! organization. Channel binding discovers the channel's endorsers (or reads
//! them from the descriptor when discovery is off), contract binding asks the
//! gateway whether the contract is deployed, and submission walks the gateway
//! through endorse, submit and commit-status for one transaction id.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use ledger_core::{
    ConnectionOptions, DiscoveryPolicy, Endpoint, Error, Identity, NetworkDescriptor,
    PeerEndpoint, Result, TransactionRequest,
};
use ledger_wire::protocol::{PROTOCOL_VERSION, STATUS_BAD_REQUEST, VALID};
use ledger_wire::{Connection, DiscoveredPeer, Endorsement, Lookup, Proposal, Request, Response, WireError};
use tokio::sync::Mutex;

use crate::capability::{ChannelLink, Connector, ContractLink, GatewayLink};
use crate::txid::TransactionId;

/// Connects to the first reachable gateway peer of the client organization.
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpConnector;

impl TcpConnector {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Connector for TcpConnector {
    async fn connect(
        &self,
        descriptor: &NetworkDescriptor,
        identity: &Identity,
        options: &ConnectionOptions,
    ) -> Result<Box<dyn GatewayLink>> {
        let msp_id = descriptor.msp_id()?;
        if identity.msp_id() != msp_id {
            return Err(Error::Authentication {
                identity: identity.label().to_string(),
                reason: format!(
                    "identity belongs to {}, client organization is {}",
                    identity.msp_id(),
                    msp_id
                ),
            });
        }

        let hello = Request::Hello {
            version: PROTOCOL_VERSION,
            client: identity.label().to_string(),
            msp_id: identity.msp_id().to_string(),
            certificate: identity.certificate().to_string(),
        };

        let mut failures = Vec::new();
        for peer in descriptor.gateway_peers()? {
            let addr = peer.endpoint.address();
            let mut conn = match Connection::connect(&addr, options.connect_timeout()).await {
                Ok(conn) => conn,
                Err(e) => {
                    tracing::warn!(peer = %peer.name, %addr, error = %e, "gateway peer unreachable");
                    failures.push(format!("{} ({}): {}", peer.name, addr, e));
                    continue;
                }
            };

            let reply = tokio::time::timeout(options.connect_timeout(), conn.request(&hello)).await;
            match reply {
                Ok(Ok(Response::Welcome { session })) => {
                    tracing::debug!(peer = %peer.name, %session, "gateway accepted identity");
                    return Ok(Box::new(TcpGateway {
                        shared: Arc::new(Shared {
                            conn: Mutex::new(conn),
                            gateway: peer,
                            identity: identity.clone(),
                            descriptor: descriptor.clone(),
                            discovery: options.discovery(),
                            request_timeout: options.connect_timeout(),
                            submit_timeout: options.submit_timeout(),
                        }),
                    }));
                }
                Ok(Ok(Response::Rejected { reason })) => {
                    return Err(Error::Authentication {
                        identity: identity.label().to_string(),
                        reason,
                    });
                }
                Ok(Ok(other)) => {
                    failures.push(format!("{}: unexpected {} reply to hello", peer.name, other.name()));
                }
                Ok(Err(e)) => failures.push(format!("{}: {}", peer.name, e)),
                Err(_) => failures.push(format!("{}: handshake timed out", peer.name)),
            }
        }

        Err(Error::Connectivity(if failures.is_empty() {
            "no gateway peers configured".into()
        } else {
            failures.join("; ")
        }))
    }

    fn name(&self) -> &'static str {
        "tcp"
    }
}

struct Shared {
    conn: Mutex<Connection>,
    gateway: PeerEndpoint,
    identity: Identity,
    descriptor: NetworkDescriptor,
    discovery: DiscoveryPolicy,
    /// Limit on discover and describe exchanges.
    request_timeout: Duration,
    /// Limit on each exchange of a submission.
    submit_timeout: Duration,
}

impl Shared {
    /// One request/response exchange on the gateway connection, abandoned
    /// after `limit`.
    async fn exchange(&self, request: &Request, limit: Duration) -> Result<Response> {
        let mut conn = self.conn.lock().await;
        match tokio::time::timeout(limit, conn.request(request)).await {
            Err(_) => {
                tracing::warn!(
                    gateway = %self.gateway.name,
                    request = request.name(),
                    ?limit,
                    "gateway did not answer in time"
                );
                Err(Error::Timeout {
                    operation: format!("{} on gateway {}", request.name(), self.gateway.name),
                    after: limit,
                })
            }
            Ok(Ok(Response::Error { message })) => Err(Error::Network(format!(
                "gateway {} failed: {}",
                self.gateway.name, message
            ))),
            Ok(Ok(response)) => Ok(response),
            Ok(Err(e)) => Err(network_error(&self.gateway, e)),
        }
    }

    async fn request(&self, request: &Request) -> Result<Response> {
        self.exchange(request, self.request_timeout).await
    }

    async fn submission(&self, request: &Request) -> Result<Response> {
        self.exchange(request, self.submit_timeout).await
    }
}

fn network_error(gateway: &PeerEndpoint, e: WireError) -> Error {
    Error::Network(format!("gateway {}: {}", gateway.name, e))
}

fn unexpected(expected: &str, got: &Response) -> Error {
    Error::Network(format!(
        "expected {} response, gateway sent {}",
        expected,
        got.name()
    ))
}

struct TcpGateway {
    shared: Arc<Shared>,
}

impl TcpGateway {
    async fn discover(&self, channel: &str) -> Result<Vec<PeerEndpoint>> {
        let request = Request::Discover {
            channel: channel.to_string(),
        };
        match self.shared.request(&request).await? {
            Response::Peers { peers } => {
                let endorsers = discovered_endorsers(&peers, self.shared.discovery.as_localhost)?;
                tracing::debug!(
                    channel,
                    discovered = peers.len(),
                    endorsers = endorsers.len(),
                    as_localhost = self.shared.discovery.as_localhost,
                    "discovered channel peers"
                );
                Ok(endorsers)
            }
            Response::NotFound { .. } => Err(Error::channel_not_found(channel)),
            other => Err(unexpected("peers", &other)),
        }
    }
}

/// Endorsing peers from a discovery reply, optionally rewritten to loopback.
fn discovered_endorsers(peers: &[DiscoveredPeer], as_localhost: bool) -> Result<Vec<PeerEndpoint>> {
    peers
        .iter()
        .filter(|peer| peer.endorsing)
        .map(|peer| {
            let endpoint: Endpoint = peer.url.parse().map_err(|_| {
                Error::Network(format!(
                    "discovery returned invalid address `{}` for {}",
                    peer.url, peer.name
                ))
            })?;
            let endpoint = if as_localhost {
                endpoint.as_localhost()
            } else {
                endpoint
            };
            Ok(PeerEndpoint::new(&peer.name, endpoint))
        })
        .collect()
}

#[async_trait]
impl GatewayLink for TcpGateway {
    async fn channel(&self, name: &str) -> Result<Box<dyn ChannelLink>> {
        let endorsers = if self.shared.discovery.enabled {
            self.discover(name).await?
        } else {
            self.shared
                .descriptor
                .channel_endorsers(name)?
                .ok_or_else(|| Error::channel_not_found(name))?
        };

        Ok(Box::new(TcpChannel {
            shared: Arc::clone(&self.shared),
            name: name.to_string(),
            endorsers,
        }))
    }

    async fn close(&mut self) -> Result<()> {
        let mut conn = self.shared.conn.lock().await;
        let reply = conn.request(&Request::Goodbye).await;
        let shutdown = conn.shutdown().await;
        match reply {
            Ok(Response::Bye) => {}
            Ok(other) => return Err(unexpected("bye", &other)),
            Err(e) => return Err(network_error(&self.shared.gateway, e)),
        }
        shutdown.map_err(|e| network_error(&self.shared.gateway, e))
    }
}

struct TcpChannel {
    shared: Arc<Shared>,
    name: String,
    endorsers: Vec<PeerEndpoint>,
}

#[async_trait]
impl ChannelLink for TcpChannel {
    fn name(&self) -> &str {
        &self.name
    }

    fn endorsers(&self) -> &[PeerEndpoint] {
        &self.endorsers
    }

    async fn contract(&self, name: &str) -> Result<Box<dyn ContractLink>> {
        let request = Request::Describe {
            channel: self.name.clone(),
            contract: name.to_string(),
        };
        match self.shared.request(&request).await? {
            Response::Contract { version, .. } => {
                tracing::debug!(channel = %self.name, contract = name, %version, "contract deployed");
                Ok(Box::new(TcpContract {
                    shared: Arc::clone(&self.shared),
                    channel: self.name.clone(),
                    name: name.to_string(),
                    endorsers: self
                        .endorsers
                        .iter()
                        .map(|peer| peer.endpoint.address())
                        .collect(),
                }))
            }
            Response::NotFound {
                resource: Lookup::Channel,
                ..
            } => Err(Error::channel_not_found(&self.name)),
            Response::NotFound { .. } => Err(Error::contract_not_found(name)),
            other => Err(unexpected("contract", &other)),
        }
    }
}

struct TcpContract {
    shared: Arc<Shared>,
    channel: String,
    name: String,
    endorsers: Vec<String>,
}

impl TcpContract {
    async fn endorse(&self, tx_id: &TransactionId, request: &TransactionRequest) -> Result<Vec<u8>> {
        let proposal = Request::Endorse(Proposal {
            tx_id: tx_id.to_string(),
            channel: self.channel.clone(),
            contract: self.name.clone(),
            transaction: request.name().to_string(),
            args: request.wire_args(),
            endorsers: self.endorsers.clone(),
        });

        match self.shared.submission(&proposal).await? {
            Response::Endorsed { endorsements } => agreed_payload(request.name(), endorsements),
            Response::ProposalFailed { status, message } if status == STATUS_BAD_REQUEST => {
                Err(Error::Argument {
                    transaction: request.name().to_string(),
                    reason: message,
                })
            }
            Response::ProposalFailed { status, message } => Err(Error::Endorsement {
                transaction: request.name().to_string(),
                reason: format!("status {}: {}", status, message),
            }),
            Response::NotFound {
                resource: Lookup::Channel,
                ..
            } => Err(Error::channel_not_found(&self.channel)),
            Response::NotFound { .. } => Err(Error::contract_not_found(&self.name)),
            other => Err(unexpected("endorsed", &other)),
        }
    }

    async fn order(&self, tx_id: &TransactionId) -> Result<()> {
        let request = Request::Submit {
            tx_id: tx_id.to_string(),
            channel: self.channel.clone(),
        };
        match self.shared.submission(&request).await? {
            Response::Accepted => Ok(()),
            Response::OrderingFailed { status } => Err(Error::Commit {
                tx_id: tx_id.to_string(),
                code: status,
            }),
            other => Err(unexpected("accepted", &other)),
        }
    }

    async fn await_commit(&self, tx_id: &TransactionId) -> Result<u64> {
        let request = Request::CommitStatus {
            tx_id: tx_id.to_string(),
            channel: self.channel.clone(),
        };
        match self.shared.submission(&request).await? {
            Response::Committed { code, block } if code == VALID => Ok(block),
            Response::Committed { code, .. } => Err(Error::Commit {
                tx_id: tx_id.to_string(),
                code,
            }),
            other => Err(unexpected("committed", &other)),
        }
    }
}

/// The common payload of all endorsements, or an endorsement error if there
/// are none or they disagree.
fn agreed_payload(transaction: &str, endorsements: Vec<Endorsement>) -> Result<Vec<u8>> {
    let mut endorsements = endorsements.into_iter();
    let Some(first) = endorsements.next() else {
        return Err(Error::Endorsement {
            transaction: transaction.to_string(),
            reason: "no endorsements returned".into(),
        });
    };
    for other in endorsements {
        if other.payload != first.payload {
            return Err(Error::Endorsement {
                transaction: transaction.to_string(),
                reason: format!(
                    "conflicting results from {} and {}",
                    first.peer, other.peer
                ),
            });
        }
    }
    Ok(first.payload)
}

#[async_trait]
impl ContractLink for TcpContract {
    fn name(&self) -> &str {
        &self.name
    }

    async fn submit(&self, request: &TransactionRequest) -> Result<Vec<u8>> {
        let tx_id = TransactionId::generate(&self.shared.identity);
        tracing::debug!(%tx_id, transaction = request.name(), "sending proposal");

        let payload = self.endorse(&tx_id, request).await?;
        self.order(&tx_id).await?;
        let block = self.await_commit(&tx_id).await?;

        tracing::info!(%tx_id, block, "transaction committed");
        Ok(payload)
    }
}
