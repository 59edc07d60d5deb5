//! Network descriptor (connection profile).
//!
//! Describes how to reach the network: which organization the client acts for,
//! the peers and orderers it may talk to, and optionally a static view of each
//! channel. The descriptor is loaded once, validated, and then only read.
//!
//! Profiles are JSON documents using the usual connection-profile field names:
//!
//! ```json
//! {
//!   "name": "test-network-org1",
//!   "client": { "organization": "Org1" },
//!   "organizations": { "Org1": { "mspid": "Org1MSP", "peers": ["peer0.org1.example.com"] } },
//!   "peers": { "peer0.org1.example.com": { "url": "grpcs://localhost:7051" } }
//! }
//! ```
//!
//! Unknown sections (certificate authorities, timeouts) are ignored.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::endpoint::{Endpoint, PeerEndpoint};
use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkDescriptor {
    pub name: String,
    #[serde(default)]
    pub version: Option<String>,
    pub client: ClientSection,
    #[serde(default)]
    pub organizations: BTreeMap<String, Organization>,
    #[serde(default)]
    pub peers: BTreeMap<String, NodeConfig>,
    #[serde(default)]
    pub orderers: BTreeMap<String, NodeConfig>,
    #[serde(default)]
    pub channels: BTreeMap<String, ChannelConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientSection {
    pub organization: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Organization {
    pub mspid: String,
    #[serde(default)]
    pub peers: Vec<String>,
}

/// Address and trust material of a peer or orderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeConfig {
    pub url: String,
    #[serde(default, rename = "tlsCACerts")]
    pub tls_ca_certs: Option<TlsCaCerts>,
    #[serde(default, rename = "grpcOptions")]
    pub grpc_options: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TlsCaCerts {
    #[serde(default)]
    pub pem: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
}

/// Static view of a channel, used when discovery is disabled.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChannelConfig {
    #[serde(default)]
    pub peers: BTreeMap<String, ChannelPeer>,
    #[serde(default)]
    pub orderers: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelPeer {
    #[serde(default = "enabled")]
    pub endorsing_peer: bool,
    #[serde(default = "enabled")]
    pub ledger_query: bool,
}

fn enabled() -> bool {
    true
}

impl NetworkDescriptor {
    /// Parses and validates a JSON profile.
    pub fn from_json(raw: &[u8]) -> Result<Self> {
        let descriptor: Self = serde_json::from_slice(raw)
            .map_err(|e| Error::Configuration(format!("malformed network descriptor: {}", e)))?;
        descriptor.validate()?;
        Ok(descriptor)
    }

    /// Reads, parses and validates a JSON profile from disk.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = tokio::fs::read(path).await.map_err(|e| {
            Error::Configuration(format!(
                "cannot read network descriptor {}: {}",
                path.display(),
                e
            ))
        })?;
        let descriptor = Self::from_json(&raw)?;
        tracing::debug!(
            path = %path.display(),
            name = %descriptor.name,
            peers = descriptor.peers.len(),
            "loaded network descriptor"
        );
        Ok(descriptor)
    }

    /// Checks cross references and addresses.
    pub fn validate(&self) -> Result<()> {
        let org = self.client_organization()?;
        if org.mspid.is_empty() {
            return Err(Error::Configuration(format!(
                "organization `{}` has no mspid",
                self.client.organization
            )));
        }
        if org.peers.is_empty() {
            return Err(Error::Configuration(format!(
                "organization `{}` lists no peers",
                self.client.organization
            )));
        }
        for peer in self.organizations.values().flat_map(|o| o.peers.iter()) {
            self.peer_endpoint(peer)?;
        }
        for (name, node) in &self.orderers {
            parse_url(name, &node.url)?;
        }
        for (channel, config) in &self.channels {
            for peer in config.peers.keys() {
                self.peer_endpoint(peer).map_err(|_| {
                    Error::Configuration(format!(
                        "channel `{}` references undefined peer `{}`",
                        channel, peer
                    ))
                })?;
            }
            for orderer in &config.orderers {
                if !self.orderers.contains_key(orderer) {
                    return Err(Error::Configuration(format!(
                        "channel `{}` references undefined orderer `{}`",
                        channel, orderer
                    )));
                }
            }
        }
        Ok(())
    }

    /// Organization the client acts for.
    pub fn client_organization(&self) -> Result<&Organization> {
        self.organizations
            .get(&self.client.organization)
            .ok_or_else(|| {
                Error::Configuration(format!(
                    "client organization `{}` is not defined",
                    self.client.organization
                ))
            })
    }

    /// MSP id of the client organization.
    pub fn msp_id(&self) -> Result<&str> {
        Ok(&self.client_organization()?.mspid)
    }

    /// Resolves a peer name to its endpoint.
    pub fn peer_endpoint(&self, name: &str) -> Result<PeerEndpoint> {
        let node = self.peers.get(name).ok_or_else(|| {
            Error::Configuration(format!("peer `{}` is not defined", name))
        })?;
        Ok(PeerEndpoint::new(name, parse_url(name, &node.url)?))
    }

    /// Peers of the client organization, in profile order.
    ///
    /// These are the candidates for the session's gateway connection.
    pub fn gateway_peers(&self) -> Result<Vec<PeerEndpoint>> {
        self.client_organization()?
            .peers
            .iter()
            .map(|name| self.peer_endpoint(name))
            .collect()
    }

    /// Endorsing peers statically configured for `channel`.
    ///
    /// Returns `None` if the profile has no section for the channel.
    pub fn channel_endorsers(&self, channel: &str) -> Result<Option<Vec<PeerEndpoint>>> {
        let Some(config) = self.channels.get(channel) else {
            return Ok(None);
        };
        let endorsers = config
            .peers
            .iter()
            .filter(|(_, role)| role.endorsing_peer)
            .map(|(name, _)| self.peer_endpoint(name))
            .collect::<Result<Vec<_>>>()?;
        Ok(Some(endorsers))
    }
}

fn parse_url(name: &str, url: &str) -> Result<Endpoint> {
    url.parse::<Endpoint>().map_err(|e| match e {
        Error::Configuration(msg) => Error::Configuration(format!("node `{}`: {}", name, msg)),
        other => other,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    const PROFILE: &str = r#"{
        "name": "test-network-org1",
        "version": "1.0.0",
        "client": { "organization": "Org1", "connection": { "timeout": { "peer": { "endorser": "300" } } } },
        "organizations": {
            "Org1": { "mspid": "Org1MSP", "peers": ["peer0.org1.example.com"], "certificateAuthorities": ["ca.org1.example.com"] }
        },
        "peers": {
            "peer0.org1.example.com": {
                "url": "grpcs://localhost:7051",
                "tlsCACerts": { "pem": "-----BEGIN CERTIFICATE-----" },
                "grpcOptions": { "ssl-target-name-override": "peer0.org1.example.com" }
            },
            "peer0.org2.example.com": { "url": "grpcs://localhost:9051" }
        },
        "channels": {
            "mychannel": {
                "peers": {
                    "peer0.org1.example.com": {},
                    "peer0.org2.example.com": { "endorsingPeer": false }
                }
            }
        }
    }"#;

    #[test]
    fn test_parse_profile() {
        let descriptor = NetworkDescriptor::from_json(PROFILE.as_bytes()).unwrap();
        assert_eq!(descriptor.name, "test-network-org1");
        assert_eq!(descriptor.msp_id().unwrap(), "Org1MSP");

        let gateways = descriptor.gateway_peers().unwrap();
        assert_eq!(gateways.len(), 1);
        assert_eq!(gateways[0].endpoint.address(), "localhost:7051");
    }

    #[test]
    fn test_static_channel_endorsers_skip_non_endorsing() {
        let descriptor = NetworkDescriptor::from_json(PROFILE.as_bytes()).unwrap();
        let endorsers = descriptor.channel_endorsers("mychannel").unwrap().unwrap();
        assert_eq!(endorsers.len(), 1);
        assert_eq!(endorsers[0].name, "peer0.org1.example.com");
        assert!(descriptor.channel_endorsers("other").unwrap().is_none());
    }

    #[test]
    fn test_undefined_client_org_is_configuration_error() {
        let raw = PROFILE.replace(r#""organization": "Org1""#, r#""organization": "Org9""#);
        let err = NetworkDescriptor::from_json(raw.as_bytes()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(err.to_string().contains("Org9"));
    }

    #[test]
    fn test_bad_peer_url_is_configuration_error() {
        let raw = PROFILE.replace("grpcs://localhost:7051", "localhost-7051");
        let err = NetworkDescriptor::from_json(raw.as_bytes()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn test_not_json_is_configuration_error() {
        let err = NetworkDescriptor::from_json(b"name: yaml-profile").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let err = NetworkDescriptor::load("/nonexistent/connection-org1.json")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }
}
