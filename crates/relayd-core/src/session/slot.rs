//! Single-slot connection lifecycle.
//!
//! The gateway keeps at most one live module session. The slot opens it
//! lazily when a write is needed, tears it down after a write failure, and
//! closes it when the request stream goes idle. Belief state lives outside
//! the slot on purpose: session churn never resets it.

use async_trait::async_trait;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tracing::{info, warn};

use crate::config::ModuleInfo;
use crate::error::{Error, Result};
use crate::session::client::{ModuleClient, SessionStatus};

/// Factory for fresh module sessions.
///
/// The seam exists so tests can hand out scripted transports instead of
/// real TCP connections.
#[async_trait]
pub trait ModuleConnector: Send {
    /// Transport the sessions run over.
    type Stream: AsyncRead + AsyncWrite + Unpin + Send;

    /// Open a transport and run the login handshake.
    async fn connect(&mut self) -> Result<ModuleClient<Self::Stream>>;
}

/// Connector for the real module over TCP.
#[derive(Debug, Clone)]
pub struct TcpConnector {
    info: ModuleInfo,
    connect_timeout: Duration,
    prompt_timeout: Duration,
}

impl TcpConnector {
    /// Create a connector with the given module info and deadlines.
    pub fn new(info: ModuleInfo, connect_timeout: Duration, prompt_timeout: Duration) -> Self {
        Self {
            info,
            connect_timeout,
            prompt_timeout,
        }
    }
}

#[async_trait]
impl ModuleConnector for TcpConnector {
    type Stream = TcpStream;

    async fn connect(&mut self) -> Result<ModuleClient<TcpStream>> {
        ModuleClient::connect(&self.info, self.connect_timeout, self.prompt_timeout).await
    }
}

/// The gateway's single module-session slot.
#[derive(Debug)]
pub struct SessionSlot<C: ModuleConnector> {
    connector: C,
    session: Option<ModuleClient<C::Stream>>,
}

impl<C: ModuleConnector> SessionSlot<C> {
    /// Create an empty slot around a connector.
    pub fn new(connector: C) -> Self {
        Self {
            connector,
            session: None,
        }
    }

    /// Hand out a `Ready` session, connecting fresh if the slot is empty
    /// or the held session is no longer usable.
    pub async fn ensure_ready(&mut self) -> Result<&mut ModuleClient<C::Stream>> {
        let held_ready = self
            .session
            .as_ref()
            .is_some_and(|s| s.status().is_ready());
        if !held_ready {
            self.drop_session().await;
            self.session = Some(self.connector.connect().await?);
        }

        match self.session.as_mut() {
            Some(session) => Ok(session),
            None => Err(Error::InvalidState {
                expected: SessionStatus::Ready.to_string(),
                actual: SessionStatus::Disconnected.to_string(),
            }),
        }
    }

    /// Tear the session down after a failed write; the next `ensure_ready`
    /// reconnects from scratch.
    pub async fn on_write_failure(&mut self) {
        warn!("dropping module session after write failure");
        self.drop_session().await;
    }

    /// Close the session after the configured inactivity window.
    pub async fn on_idle_timeout(&mut self) {
        if self.session.is_some() {
            info!("closing idle module session");
            self.drop_session().await;
        }
    }

    /// Disconnect and clear the slot. Safe to call on an empty slot.
    pub async fn drop_session(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.disconnect().await;
        }
    }

    /// Whether a session is currently held (in any state).
    pub fn is_connected(&self) -> bool {
        self.session.is_some()
    }

    /// Access to the connector, mostly for tests.
    pub fn connector(&self) -> &C {
        &self.connector
    }
}
