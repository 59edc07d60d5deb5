//! Gateway protocol messages.
//!
//! This framed-JSON protocol belongs to this workspace. It is spoken by a
//! gateway service built against this crate, not by a network peer's gRPC
//! gateway API.
//!
//! A session talks to one gateway peer. Every client [`Request`] is answered
//! by exactly one [`Response`], strictly in turn:
//!
//! 1. `Hello` → `Welcome` | `Rejected` (mandatory first exchange)
//! 2. `Discover` → `Peers` | `NotFound`
//! 3. `Describe` → `Contract` | `NotFound`
//! 4. `Endorse` → `Endorsed` | `ProposalFailed`
//! 5. `Submit` → `Accepted` | `OrderingFailed`
//! 6. `CommitStatus` → `Committed`
//! 7. `Goodbye` → `Bye`
//!
//! Any request may instead be answered by `Error` when the gateway cannot
//! process it at all.

use serde::{Deserialize, Serialize};

/// Protocol revision sent in the handshake.
pub const PROTOCOL_VERSION: u16 = 1;

/// Proposal status used when the contract rejects its arguments.
pub const STATUS_BAD_REQUEST: u16 = 400;

/// Commit validation code of a valid transaction.
pub const VALID: &str = "VALID";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Request {
    Hello {
        version: u16,
        client: String,
        msp_id: String,
        certificate: String,
    },
    Discover {
        channel: String,
    },
    Describe {
        channel: String,
        contract: String,
    },
    Endorse(Proposal),
    Submit {
        tx_id: String,
        channel: String,
    },
    CommitStatus {
        tx_id: String,
        channel: String,
    },
    Goodbye,
}

/// A transaction proposal to be endorsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    pub tx_id: String,
    pub channel: String,
    pub contract: String,
    pub transaction: String,
    pub args: Vec<String>,
    /// Endorsing peers the client wants the proposal sent to (`host:port`).
    pub endorsers: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    Welcome {
        session: String,
    },
    Rejected {
        reason: String,
    },
    Peers {
        peers: Vec<DiscoveredPeer>,
    },
    Contract {
        name: String,
        version: String,
    },
    NotFound {
        resource: Lookup,
        name: String,
    },
    Endorsed {
        endorsements: Vec<Endorsement>,
    },
    ProposalFailed {
        status: u16,
        message: String,
    },
    Accepted,
    OrderingFailed {
        status: String,
    },
    Committed {
        code: String,
        block: u64,
    },
    Error {
        message: String,
    },
    Bye,
}

impl Request {
    /// Short name of the variant, for diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            Request::Hello { .. } => "hello",
            Request::Discover { .. } => "discover",
            Request::Describe { .. } => "describe",
            Request::Endorse(_) => "endorse",
            Request::Submit { .. } => "submit",
            Request::CommitStatus { .. } => "commit_status",
            Request::Goodbye => "goodbye",
        }
    }
}

impl Response {
    /// Short name of the variant, for diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            Response::Welcome { .. } => "welcome",
            Response::Rejected { .. } => "rejected",
            Response::Peers { .. } => "peers",
            Response::Contract { .. } => "contract",
            Response::NotFound { .. } => "not_found",
            Response::Endorsed { .. } => "endorsed",
            Response::ProposalFailed { .. } => "proposal_failed",
            Response::Accepted => "accepted",
            Response::OrderingFailed { .. } => "ordering_failed",
            Response::Committed { .. } => "committed",
            Response::Error { .. } => "error",
            Response::Bye => "bye",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lookup {
    Channel,
    Contract,
}

/// A live peer of a channel as reported by discovery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveredPeer {
    pub name: String,
    pub msp_id: String,
    /// Advertised `scheme://host:port` address.
    pub url: String,
    #[serde(default = "endorsing")]
    pub endorsing: bool,
}

fn endorsing() -> bool {
    true
}

/// One peer's endorsement of a proposal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endorsement {
    pub peer: String,
    #[serde(with = "hex_bytes")]
    pub payload: Vec<u8>,
}

mod hex_bytes {
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        hex::decode(&s).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_tagging() {
        let json = serde_json::to_value(Request::Discover {
            channel: "mychannel".into(),
        })
        .unwrap();
        assert_eq!(json["type"], "discover");
        assert_eq!(json["channel"], "mychannel");
    }

    #[test]
    fn test_endorse_carries_proposal_fields() {
        let json = serde_json::to_value(Request::Endorse(Proposal {
            tx_id: "ab".into(),
            channel: "mychannel".into(),
            contract: "iothospital".into(),
            transaction: "createAsset".into(),
            args: vec!["1".into()],
            endorsers: vec![],
        }))
        .unwrap();
        assert_eq!(json["type"], "endorse");
        assert_eq!(json["transaction"], "createAsset");
    }

    #[test]
    fn test_payload_travels_as_hex() {
        let endorsement = Endorsement {
            peer: "peer0".into(),
            payload: b"{}".to_vec(),
        };
        let json = serde_json::to_value(&endorsement).unwrap();
        assert_eq!(json["payload"], "7b7d");

        let back: Endorsement = serde_json::from_value(json).unwrap();
        assert_eq!(back.payload, b"{}".to_vec());
    }

    #[test]
    fn test_bad_hex_is_rejected() {
        let raw = r#"{"peer":"peer0","payload":"zz"}"#;
        assert!(serde_json::from_str::<Endorsement>(raw).is_err());
    }
}
