//! Wire protocol between the client and a gateway peer.
//!
//! This crate provides the framing and messages for:
//! - The session handshake
//! - Channel discovery and contract lookup
//! - Proposal endorsement, ordering and commit status

pub mod codec;
pub mod connection;
pub mod error;
pub mod protocol;

pub use connection::Connection;
pub use error::{Result, WireError};
pub use protocol::{DiscoveredPeer, Endorsement, Lookup, Proposal, Request, Response};
