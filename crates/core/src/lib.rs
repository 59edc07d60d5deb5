//! Core types for the ledger asset client.
//!
//! This crate provides the pieces every other layer builds on:
//! - Error taxonomy and operator-facing error kinds
//! - Identities and the wallets that store them
//! - Network descriptor (connection profile) and endpoints
//! - Connection options and discovery policy
//! - Typed transaction requests and argument contracts
//! - Domain entities decoded from responses

pub mod descriptor;
pub mod endpoint;
pub mod entity;
pub mod error;
pub mod identity;
pub mod options;
pub mod request;
pub mod wallet;

pub use descriptor::NetworkDescriptor;
pub use endpoint::{Endpoint, PeerEndpoint};
pub use entity::{Asset, Entity};
pub use error::{Error, ErrorKind, Result};
pub use identity::Identity;
pub use options::{ConnectionOptions, DiscoveryPolicy};
pub use request::{Arg, ArgType, ContractInterface, TransactionRequest, TransactionSignature};
pub use wallet::{resolve_identity, FileSystemWallet, InMemoryWallet, Wallet};
