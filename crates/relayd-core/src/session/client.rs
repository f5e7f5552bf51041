//! Authenticated telnet session to the relay module.
//!
//! One client owns one transport. `connect` (or `login` over an existing
//! transport) runs the login handshake; a client handed back to the caller
//! is always `Ready`. Any failure along the way closes the transport, so a
//! half-open socket never leaks out.

use std::fmt;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, info};

use crate::config::ModuleInfo;
use crate::constants::{COMMAND_PROMPT, LOGIN_BANNER, PASSWORD_PROMPT, USER_PROMPT};
use crate::error::{Error, Result};
use crate::prompt::PromptScanner;
use crate::telnet::TelnetStream;

/// Session state machine.
///
/// `Ready` is the only state writes are attempted from; every failure
/// transitions straight to `Disconnected`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// No live transport.
    Disconnected,
    /// Transport connect in progress.
    Connecting,
    /// Transport open, login handshake running.
    LoggingIn,
    /// Logged in, command prompt seen.
    Ready,
}

impl SessionStatus {
    /// Check whether writes may be attempted.
    pub fn is_ready(&self) -> bool {
        matches!(self, SessionStatus::Ready)
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionStatus::Disconnected => "Disconnected",
            SessionStatus::Connecting => "Connecting",
            SessionStatus::LoggingIn => "LoggingIn",
            SessionStatus::Ready => "Ready",
        };
        f.write_str(name)
    }
}

/// One authenticated session to the relay module.
#[derive(Debug)]
pub struct ModuleClient<S> {
    telnet: TelnetStream<S>,
    status: SessionStatus,
}

impl ModuleClient<TcpStream> {
    /// Open a TCP transport to the module and log in.
    pub async fn connect(
        info: &ModuleInfo,
        connect_timeout: Duration,
        prompt_timeout: Duration,
    ) -> Result<Self> {
        info!(address = %info.address, port = info.port, "connecting to relay module");
        let stream = timeout(
            connect_timeout,
            TcpStream::connect((info.address.as_str(), info.port)),
        )
        .await
        .map_err(|_| Error::Connect {
            message: format!("connect to {}:{} timed out", info.address, info.port),
        })?
        .map_err(|e| Error::Connect {
            message: format!("connect to {}:{}: {}", info.address, info.port, e),
        })?;

        Self::login(stream, info, prompt_timeout).await
    }
}

impl<S: AsyncRead + AsyncWrite + Unpin> ModuleClient<S> {
    /// Run the login handshake over an already-open transport.
    pub async fn login(stream: S, info: &ModuleInfo, prompt_timeout: Duration) -> Result<Self> {
        let mut client = Self {
            telnet: TelnetStream::new(stream, prompt_timeout),
            status: SessionStatus::Connecting,
        };

        client.status = SessionStatus::LoggingIn;
        match client.run_login(info).await {
            Ok(()) => {
                client.status = SessionStatus::Ready;
                info!("logged in to relay module");
                Ok(client)
            }
            Err(e) => {
                client.status = SessionStatus::Disconnected;
                client.telnet.shutdown().await;
                Err(e)
            }
        }
    }

    async fn run_login(&mut self, info: &ModuleInfo) -> Result<()> {
        self.wait_for_prompt(USER_PROMPT)
            .await
            .map_err(|e| login_error("username prompt", e))?;
        self.telnet
            .write_line(&info.username)
            .await
            .map_err(|e| login_error("send username", e))?;
        self.wait_for_prompt(PASSWORD_PROMPT)
            .await
            .map_err(|e| login_error("password prompt", e))?;

        // The module interjects telnet option negotiation at this point and
        // rejects the password if the chatter goes unanswered.
        self.telnet
            .drain_negotiation()
            .await
            .map_err(|e| login_error("option negotiation", e))?;

        self.telnet
            .write_line(&info.password)
            .await
            .map_err(|e| login_error("send password", e))?;
        self.wait_for_banner(LOGIN_BANNER)
            .await
            .map_err(|e| login_error("login banner", e))?;
        self.wait_for_prompt(COMMAND_PROMPT)
            .await
            .map_err(|e| login_error("command prompt", e))?;
        Ok(())
    }

    /// Current session state.
    pub fn status(&self) -> SessionStatus {
        self.status
    }

    /// Issue the bulk-write command and wait for the prompt to come back.
    pub async fn write_all_states(&mut self, bitmask: u8) -> Result<()> {
        if !self.status.is_ready() {
            return Err(Error::InvalidState {
                expected: SessionStatus::Ready.to_string(),
                actual: self.status.to_string(),
            });
        }

        debug!(bitmask = format_args!("{:02x}", bitmask), "sending writeall command");
        let command = format!("relay writeall {:02x}", bitmask);
        let result = async {
            self.telnet.write_line(&command).await?;
            self.wait_for_prompt(COMMAND_PROMPT).await
        }
        .await;

        match result {
            Ok(()) => Ok(()),
            Err(e) => {
                self.status = SessionStatus::Disconnected;
                Err(Error::Write {
                    message: e.to_string(),
                })
            }
        }
    }

    /// Close the session. Idempotent.
    pub async fn disconnect(&mut self) {
        if self.status != SessionStatus::Disconnected {
            info!("disconnecting from relay module");
        }
        self.status = SessionStatus::Disconnected;
        self.telnet.shutdown().await;
    }

    async fn wait_for_prompt(&mut self, prompt: &str) -> Result<()> {
        let mut scanner = PromptScanner::new(prompt);
        loop {
            let byte = self.telnet.read_byte().await?;
            if scanner.feed(byte) {
                return Ok(());
            }
        }
    }

    /// Scan lines until one starts with the banner.
    async fn wait_for_banner(&mut self, banner: &str) -> Result<()> {
        loop {
            let line = self.telnet.read_line().await?;
            if line.starts_with(banner) {
                return Ok(());
            }
            debug!(line = line.as_str(), "ignoring pre-banner output");
        }
    }
}

fn login_error(step: &'static str, cause: Error) -> Error {
    Error::Login {
        step,
        message: cause.to_string(),
    }
}
