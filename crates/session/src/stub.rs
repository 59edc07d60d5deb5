//! Scripted in-memory network for tests.
//!
//! [`StubNetwork`] implements [`Connector`] without any sockets. It knows a
//! fixed set of channels and contracts, answers every submit with a fixed
//! payload, and can be told to fail or hang at any step. It also records what
//! it was asked to do so tests can assert on it.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use ledger_core::{
    ConnectionOptions, Error, Identity, NetworkDescriptor, PeerEndpoint, Result,
    TransactionRequest,
};
use parking_lot::Mutex;

use crate::capability::{ChannelLink, Connector, ContractLink, GatewayLink};
use crate::session::{SessionEvent, SessionObserver};

/// A point in the workflow where the stub can inject a fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StubStep {
    Connect,
    BindChannel,
    BindContract,
    Submit,
}

/// What the stub does at a faulted step.
#[derive(Debug, Clone)]
pub enum Fault {
    /// Return this error.
    Fail(Error),
    /// Never complete.
    Hang,
}

#[derive(Debug, Clone, Default)]
struct Script {
    channels: BTreeMap<String, BTreeSet<String>>,
    endorsers: Vec<PeerEndpoint>,
    rejected: BTreeSet<String>,
    payload: Vec<u8>,
    faults: HashMap<StubStep, Fault>,
}

impl Script {
    async fn checkpoint(&self, step: StubStep) -> Result<()> {
        match self.faults.get(&step) {
            None => Ok(()),
            Some(Fault::Fail(error)) => Err(error.clone()),
            Some(Fault::Hang) => std::future::pending().await,
        }
    }
}

#[derive(Debug, Default)]
struct Record {
    submissions: Mutex<Vec<Submission>>,
    connects: AtomicUsize,
    link_closes: AtomicUsize,
}

/// A transaction the stub received.
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    pub channel: String,
    pub contract: String,
    pub request: TransactionRequest,
}

/// In-memory network with scripted behaviour.
///
/// Clones share what they record, so a test can hand one clone to a
/// [`crate::SessionManager`] and inspect the other.
#[derive(Debug, Clone, Default)]
pub struct StubNetwork {
    script: Script,
    record: Arc<Record>,
}

impl StubNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deploys `contracts` on `channel`.
    pub fn channel<I, S>(mut self, channel: &str, contracts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.script
            .channels
            .entry(channel.to_string())
            .or_default()
            .extend(contracts.into_iter().map(Into::into));
        self
    }

    /// Endorsers reported for every channel.
    pub fn endorsers(mut self, endorsers: Vec<PeerEndpoint>) -> Self {
        self.script.endorsers = endorsers;
        self
    }

    /// Payload every successful submit returns.
    pub fn respond_with(mut self, payload: impl Into<Vec<u8>>) -> Self {
        self.script.payload = payload.into();
        self
    }

    /// Refuses connections from identity `label`.
    pub fn reject_identity(mut self, label: &str) -> Self {
        self.script.rejected.insert(label.to_string());
        self
    }

    /// Fails `step` with `error`.
    pub fn fail_at(mut self, step: StubStep, error: Error) -> Self {
        self.script.faults.insert(step, Fault::Fail(error));
        self
    }

    /// Makes `step` never complete.
    pub fn hang_at(mut self, step: StubStep) -> Self {
        self.script.faults.insert(step, Fault::Hang);
        self
    }

    /// Transactions submitted so far.
    pub fn submissions(&self) -> Vec<Submission> {
        self.record.submissions.lock().clone()
    }

    /// Number of successful connects.
    pub fn connects(&self) -> usize {
        self.record.connects.load(Ordering::SeqCst)
    }

    /// Number of gateway links closed.
    pub fn link_closes(&self) -> usize {
        self.record.link_closes.load(Ordering::SeqCst)
    }
}

#[derive(Debug)]
struct Shared {
    script: Script,
    record: Arc<Record>,
}

#[async_trait]
impl Connector for StubNetwork {
    async fn connect(
        &self,
        _descriptor: &NetworkDescriptor,
        identity: &Identity,
        _options: &ConnectionOptions,
    ) -> Result<Box<dyn GatewayLink>> {
        self.script.checkpoint(StubStep::Connect).await?;
        if self.script.rejected.contains(identity.label()) {
            return Err(Error::Authentication {
                identity: identity.label().to_string(),
                reason: "certificate not trusted".into(),
            });
        }
        self.record.connects.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(StubGateway {
            state: Arc::new(Shared {
                script: self.script.clone(),
                record: Arc::clone(&self.record),
            }),
        }))
    }

    fn name(&self) -> &'static str {
        "stub"
    }
}

struct StubGateway {
    state: Arc<Shared>,
}

#[async_trait]
impl GatewayLink for StubGateway {
    async fn channel(&self, name: &str) -> Result<Box<dyn ChannelLink>> {
        self.state.script.checkpoint(StubStep::BindChannel).await?;
        if !self.state.script.channels.contains_key(name) {
            return Err(Error::channel_not_found(name));
        }
        Ok(Box::new(StubChannel {
            state: Arc::clone(&self.state),
            name: name.to_string(),
        }))
    }

    async fn close(&mut self) -> Result<()> {
        self.state.record.link_closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

struct StubChannel {
    state: Arc<Shared>,
    name: String,
}

#[async_trait]
impl ChannelLink for StubChannel {
    fn name(&self) -> &str {
        &self.name
    }

    fn endorsers(&self) -> &[PeerEndpoint] {
        &self.state.script.endorsers
    }

    async fn contract(&self, name: &str) -> Result<Box<dyn ContractLink>> {
        self.state.script.checkpoint(StubStep::BindContract).await?;
        let deployed = self
            .state
            .script
            .channels
            .get(&self.name)
            .is_some_and(|contracts| contracts.contains(name));
        if !deployed {
            return Err(Error::contract_not_found(name));
        }
        Ok(Box::new(StubContract {
            state: Arc::clone(&self.state),
            channel: self.name.clone(),
            name: name.to_string(),
        }))
    }
}

struct StubContract {
    state: Arc<Shared>,
    channel: String,
    name: String,
}

#[async_trait]
impl ContractLink for StubContract {
    fn name(&self) -> &str {
        &self.name
    }

    async fn submit(&self, request: &TransactionRequest) -> Result<Vec<u8>> {
        self.state.record.submissions.lock().push(Submission {
            channel: self.channel.clone(),
            contract: self.name.clone(),
            request: request.clone(),
        });
        self.state.script.checkpoint(StubStep::Submit).await?;
        Ok(self.state.script.payload.clone())
    }
}

/// Observer that records every session event.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<SessionEvent>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<SessionEvent> {
        self.events.lock().clone()
    }

    /// How many times `close` was called.
    pub fn close_requests(&self) -> usize {
        self.events
            .lock()
            .iter()
            .filter(|e| matches!(e, SessionEvent::CloseRequested(_)))
            .count()
    }

    /// How many times a session actually transitioned to closed.
    pub fn closes(&self) -> usize {
        self.events
            .lock()
            .iter()
            .filter(|e| matches!(e, SessionEvent::Closed))
            .count()
    }
}

impl SessionObserver for RecordingObserver {
    fn on_event(&self, event: SessionEvent) {
        self.events.lock().push(event);
    }
}
