//! Session lifecycle.
//!
//! # States
//!
//! ```text
//! Disconnected ──connect──▶ Connecting ──ok──▶ Connected
//!      ▲                        │                  │
//!      └────────failed──────────┘                  │
//!      │                                           │
//!      └──────────────close───────▶ Closed ◀──close┘
//! ```
//!
//! A session enters `Closed` exactly once. `close` on a closed session is a
//! no-op. Channel and contract bindings borrow the session, so none of them
//! can outlive it or survive its close.
//!
//! # Scoped acquisition
//!
//! [`SessionManager::with_session`] acquires a session, runs a body against
//! it and closes it afterwards whether the body returned `Ok`, returned
//! `Err`, or panicked.

use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use ledger_core::{
    resolve_identity, ConnectionOptions, Error, ErrorKind, NetworkDescriptor, PeerEndpoint, Result,
};

use crate::capability::{ChannelLink, Connector, ContractLink, GatewayLink};

/// Upper bound on the disconnect handshake during close.
pub const CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connecting,
    Connected,
    Closed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Disconnected => "disconnected",
            SessionState::Connecting => "connecting",
            SessionState::Connected => "connected",
            SessionState::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// Lifecycle notifications delivered to a [`SessionObserver`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    Connecting,
    Connected,
    ConnectFailed(ErrorKind),
    /// `close` was called; carries the state at the time of the call.
    CloseRequested(SessionState),
    Closed,
}

/// Receives session lifecycle events.
pub trait SessionObserver: Send + Sync {
    fn on_event(&self, event: SessionEvent);
}

/// A client's connection to the network.
pub struct Session {
    state: SessionState,
    connector: Arc<dyn Connector>,
    link: Option<Box<dyn GatewayLink>>,
    identity: Option<String>,
    observer: Option<Arc<dyn SessionObserver>>,
}

impl Session {
    fn new(connector: Arc<dyn Connector>, observer: Option<Arc<dyn SessionObserver>>) -> Self {
        Self {
            state: SessionState::Disconnected,
            connector,
            link: None,
            identity: None,
            observer,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Label of the identity the session connected as.
    pub fn identity(&self) -> Option<&str> {
        self.identity.as_deref()
    }

    fn notify(&self, event: SessionEvent) {
        if let Some(observer) = &self.observer {
            observer.on_event(event);
        }
    }

    /// Connects to the network described by `descriptor`.
    ///
    /// Only a disconnected session can connect. On failure the session is
    /// left `Disconnected`, never half-open.
    pub async fn connect(
        &mut self,
        descriptor: &NetworkDescriptor,
        options: &ConnectionOptions,
    ) -> Result<()> {
        if self.state != SessionState::Disconnected {
            return Err(Error::Configuration(format!(
                "cannot connect a session that is {}",
                self.state
            )));
        }

        self.state = SessionState::Connecting;
        self.notify(SessionEvent::Connecting);
        tracing::info!(
            network = %descriptor.name,
            identity = options.identity(),
            connector = self.connector.name(),
            "connecting to gateway"
        );

        match self.establish(descriptor, options).await {
            Ok(link) => {
                self.link = Some(link);
                self.identity = Some(options.identity().to_string());
                self.state = SessionState::Connected;
                self.notify(SessionEvent::Connected);
                tracing::debug!(network = %descriptor.name, "session connected");
                Ok(())
            }
            Err(e) => {
                self.state = SessionState::Disconnected;
                self.notify(SessionEvent::ConnectFailed(e.kind()));
                Err(e)
            }
        }
    }

    async fn establish(
        &self,
        descriptor: &NetworkDescriptor,
        options: &ConnectionOptions,
    ) -> Result<Box<dyn GatewayLink>> {
        descriptor.validate()?;
        let identity = resolve_identity(options.wallet().as_ref(), options.identity()).await?;
        self.connector.connect(descriptor, &identity, options).await
    }

    fn link(&self) -> Result<&dyn GatewayLink> {
        match (&self.link, self.state) {
            (Some(link), SessionState::Connected) => Ok(link.as_ref()),
            _ => Err(Error::Network(format!("session is {}", self.state))),
        }
    }

    /// Binds the channel `name`.
    pub async fn channel(&self, name: &str) -> Result<Channel<'_>> {
        let link = self.link()?.channel(name).await?;
        tracing::info!(channel = name, endorsers = link.endorsers().len(), "using network channel");
        Ok(Channel {
            _session: self,
            link,
        })
    }

    /// Closes the session. Idempotent.
    pub async fn close(&mut self) {
        self.notify(SessionEvent::CloseRequested(self.state));
        if self.state == SessionState::Closed {
            return;
        }

        if let Some(mut link) = self.link.take() {
            match tokio::time::timeout(CLOSE_TIMEOUT, link.close()).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => tracing::warn!(error = %e, "gateway disconnect failed"),
                Err(_) => tracing::warn!(after = ?CLOSE_TIMEOUT, "gateway disconnect timed out"),
            }
        }

        self.state = SessionState::Closed;
        self.notify(SessionEvent::Closed);
        tracing::info!("disconnected from gateway");
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("state", &self.state)
            .field("identity", &self.identity)
            .field("connector", &self.connector.name())
            .finish_non_exhaustive()
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if self.link.is_some() {
            // Sockets are released with the link, but the gateway never saw a goodbye.
            tracing::warn!(state = %self.state, "session dropped without close");
        }
    }
}

/// A channel bound through a session.
pub struct Channel<'s> {
    _session: &'s Session,
    link: Box<dyn ChannelLink>,
}

impl<'s> Channel<'s> {
    pub fn name(&self) -> &str {
        self.link.name()
    }

    pub fn endorsers(&self) -> &[PeerEndpoint] {
        self.link.endorsers()
    }

    /// Binds the contract `name` on this channel.
    pub async fn contract(&self, name: &str) -> Result<Contract<'_>> {
        let link = self.link.contract(name).await?;
        tracing::info!(channel = self.name(), contract = name, "using contract");
        Ok(Contract {
            channel: self.link.name(),
            link,
        })
    }
}

impl fmt::Debug for Channel<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Channel")
            .field("name", &self.name())
            .field("endorsers", &self.endorsers())
            .finish()
    }
}

/// A contract bound through a channel.
pub struct Contract<'c> {
    channel: &'c str,
    link: Box<dyn ContractLink>,
}

impl<'c> Contract<'c> {
    pub fn name(&self) -> &str {
        self.link.name()
    }

    pub fn channel(&self) -> &str {
        self.channel
    }

    pub(crate) fn link(&self) -> &dyn ContractLink {
        self.link.as_ref()
    }
}

impl fmt::Debug for Contract<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Contract")
            .field("channel", &self.channel)
            .field("name", &self.name())
            .finish()
    }
}

/// Creates sessions and owns their release discipline.
#[derive(Clone)]
pub struct SessionManager {
    connector: Arc<dyn Connector>,
    observer: Option<Arc<dyn SessionObserver>>,
}

impl SessionManager {
    pub fn new(connector: Arc<dyn Connector>) -> Self {
        Self {
            connector,
            observer: None,
        }
    }

    /// Delivers lifecycle events of every session to `observer`.
    pub fn with_observer(mut self, observer: Arc<dyn SessionObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// A fresh, disconnected session.
    pub fn session(&self) -> Session {
        Session::new(Arc::clone(&self.connector), self.observer.clone())
    }

    /// Opens a connected session.
    ///
    /// If connecting fails the session is closed before the error is returned.
    pub async fn connect(
        &self,
        descriptor: &NetworkDescriptor,
        options: &ConnectionOptions,
    ) -> Result<Session> {
        let mut session = self.session();
        match session.connect(descriptor, options).await {
            Ok(()) => Ok(session),
            Err(e) => {
                session.close().await;
                Err(e)
            }
        }
    }

    /// Runs `body` against a fresh session and always closes it afterwards.
    ///
    /// The body receives the session disconnected and is responsible for
    /// connecting it. A panic inside the body is resumed after the close.
    pub async fn with_session<T, E, F>(&self, body: F) -> std::result::Result<T, E>
    where
        F: for<'s> FnOnce(&'s mut Session) -> BoxFuture<'s, std::result::Result<T, E>>,
    {
        let mut session = self.session();
        let outcome = AssertUnwindSafe(body(&mut session)).catch_unwind().await;
        session.close().await;
        match outcome {
            Ok(result) => result,
            Err(panic) => std::panic::resume_unwind(panic),
        }
    }
}

impl fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionManager")
            .field("connector", &self.connector.name())
            .finish_non_exhaustive()
    }
}
