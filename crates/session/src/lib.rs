//! Session lifecycle and transaction workflow for the ledger asset client.
//!
//! # Architecture
//!
//! The network is reached only through the capability traits in
//! [`capability`]. A [`SessionManager`] builds sessions on top of a
//! [`Connector`] and guarantees they are closed. A [`Submitter`] sends a
//! transaction through a bound contract under a deadline, and a [`Workflow`]
//! ties connect, bind, submit and decode together for one run.
//!
//! Two connectors are provided:
//! - [`TcpConnector`] speaks the gateway protocol from `ledger-wire`
//! - [`StubNetwork`] is a scripted in-memory network for tests

pub mod capability;
pub mod session;
pub mod stub;
pub mod submit;
pub mod tcp;
pub mod txid;
pub mod workflow;

pub use capability::{ChannelLink, Connector, ContractLink, GatewayLink};
pub use session::{
    Channel, Contract, Session, SessionEvent, SessionManager, SessionObserver, SessionState,
    CLOSE_TIMEOUT,
};
pub use stub::{RecordingObserver, StubNetwork, StubStep};
pub use submit::Submitter;
pub use tcp::TcpConnector;
pub use txid::TransactionId;
pub use workflow::{Conclusion, Failure, Invocation, Outcome, Stage, Step, Workflow};
