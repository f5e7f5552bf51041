//! The request-serving loop.
//!
//! One task serves everything: client connections are accepted and handled
//! one at a time, so the belief and the session slot need no locking. The
//! accept wait doubles as the idle clock for the upstream session; when it
//! expires with no request, the module connection is closed and the next
//! request simply reconnects.

use bytes::BytesMut;
use std::path::Path;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{UnixListener, UnixStream};
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use relayd_control::protocol;
use relayd_control::socket::prepare_socket_path;
use relayd_control::types::{Request, Response};
use relayd_core::constants::RESTART_BACKOFF;
use relayd_core::error::{Error, Result};
use relayd_core::reconcile::Reconciler;
use relayd_core::session::slot::{ModuleConnector, SessionSlot, TcpConnector};
use relayd_core::GatewayConfig;

use crate::dispatch::{self, Action};

/// Gateway context: belief, session slot, and timing policy.
pub struct Gateway<C: ModuleConnector> {
    reconciler: Reconciler,
    slot: SessionSlot<C>,
    idle_disconnect: Duration,
}

impl Gateway<TcpConnector> {
    /// Gateway for the real module over TCP.
    pub fn new(config: &GatewayConfig) -> Self {
        let connector = TcpConnector::new(
            config.module.clone(),
            config.connect_timeout,
            config.prompt_timeout,
        );
        Self::with_connector(connector, config.drift_interval, config.idle_disconnect)
    }
}

impl<C: ModuleConnector> Gateway<C> {
    /// Gateway over an arbitrary connector (tests use scripted ones).
    pub fn with_connector(
        connector: C,
        drift_interval: Duration,
        idle_disconnect: Duration,
    ) -> Self {
        Self {
            reconciler: Reconciler::new(drift_interval),
            slot: SessionSlot::new(connector),
            idle_disconnect,
        }
    }

    /// Serve requests until the listener fails.
    pub async fn serve(&mut self, listener: &UnixListener) -> Result<()> {
        loop {
            match timeout(self.idle_disconnect, listener.accept()).await {
                Err(_) => self.slot.on_idle_timeout().await,
                Ok(Err(e)) => return Err(e.into()),
                Ok(Ok((stream, _))) => self.serve_client(stream).await,
            }
        }
    }

    /// Handle one client connection until EOF, error, or idle expiry.
    async fn serve_client(&mut self, mut stream: UnixStream) {
        debug!("control client connected");
        let mut buf = BytesMut::with_capacity(4096);
        let mut chunk = [0u8; 4096];

        loop {
            loop {
                match protocol::try_decode::<Request>(&mut buf) {
                    Ok(Some(request)) => {
                        let response = self.handle(&request).await;
                        let frame = match protocol::encode(&response) {
                            Ok(frame) => frame,
                            Err(e) => {
                                warn!(error = %e, "failed to encode response");
                                return;
                            }
                        };
                        if let Err(e) = stream.write_all(&frame).await {
                            debug!(error = %e, "control client went away");
                            return;
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        warn!(error = %e, "malformed control frame, dropping client");
                        return;
                    }
                }
            }

            match timeout(self.idle_disconnect, stream.read(&mut chunk)).await {
                Err(_) => {
                    self.slot.on_idle_timeout().await;
                    return;
                }
                Ok(Ok(0)) => {
                    debug!("control client disconnected");
                    return;
                }
                Ok(Ok(n)) => buf.extend_from_slice(&chunk[..n]),
                Ok(Err(e)) => {
                    debug!(error = %e, "control client read failed");
                    return;
                }
            }
        }
    }

    /// Dispatch one request and build its response. Failures are reported
    /// to the client, never propagated; the supervising loop only restarts
    /// on listener failure.
    async fn handle(&mut self, request: &Request) -> Response {
        match dispatch::dispatch(request) {
            Ok(Action::Set(states)) => {
                match self.reconciler.handle_request(states, &mut self.slot).await {
                    Ok(wrote) => {
                        if wrote {
                            info!("module state updated");
                        }
                        Response::ok()
                    }
                    Err(e) => {
                        warn!(error = %e, "set request failed");
                        Response::failed(e.to_string())
                    }
                }
            }
            Ok(Action::Count(count)) => Response::counted(count),
            Err(e) => {
                warn!(error = %e, "request rejected");
                Response::failed(e.to_string())
            }
        }
    }

    /// Drop any held module session.
    pub async fn shutdown_session(&mut self) {
        self.slot.drop_session().await;
    }
}

/// Run the gateway against the real module, restarting the serving cycle
/// with a short backoff whenever the listener fails.
pub async fn run(config: GatewayConfig, socket: &Path) -> Result<()> {
    let mut gateway = Gateway::new(&config);

    loop {
        prepare_socket_path(socket).map_err(|e| Error::Protocol {
            message: e.to_string(),
        })?;

        let listener = match UnixListener::bind(socket) {
            Ok(listener) => listener,
            Err(e) => {
                error!(path = %socket.display(), error = %e, "failed to bind control socket");
                tokio::time::sleep(RESTART_BACKOFF).await;
                continue;
            }
        };
        info!(path = %socket.display(), "control socket ready");

        match gateway.serve(&listener).await {
            Ok(()) => info!("listener closed, restarting"),
            Err(e) => error!(error = %e, "listener failed, restarting after backoff"),
        }
        gateway.shutdown_session().await;
        drop(listener);
        tokio::time::sleep(RESTART_BACKOFF).await;
    }
}
