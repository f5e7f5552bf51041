//! Scripted fake relay module.
//!
//! Replays the device side of the telnet dialogue: login prompts, a burst
//! of option negotiation after the password prompt, the success banner,
//! and prompt-acknowledged `relay writeall` commands. Supports fault
//! injection for login denial and mid-write connection drops.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt, DuplexStream};

use relayd_core::error::Result;
use relayd_core::session::client::ModuleClient;
use relayd_core::session::slot::ModuleConnector;
use relayd_core::telnet::{DO, DONT, IAC, WILL};
use relayd_core::ModuleInfo;

/// Prompt deadline used for sessions against the fake module. Kept short
/// so negative tests fail fast.
pub const FAKE_PROMPT_TIMEOUT: Duration = Duration::from_millis(200);

/// How a fake module misbehaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailureMode {
    /// Normal, well-behaved module.
    #[default]
    None,
    /// Reject the login regardless of credentials.
    DenyLogin,
    /// Vanish instead of acknowledging the writeall after `after`
    /// successful writes.
    DropOnWrite { after: usize },
}

/// One scripted module session.
#[derive(Debug)]
pub struct FakeModule {
    username: String,
    password: String,
    failure: FailureMode,
    writes: Arc<Mutex<Vec<u8>>>,
}

impl FakeModule {
    /// Create a module expecting the given credentials; accepted writeall
    /// bitmasks are appended to `writes`.
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        failure: FailureMode,
        writes: Arc<Mutex<Vec<u8>>>,
    ) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            failure,
            writes,
        }
    }

    /// Run the device side of the dialogue until the peer goes away or a
    /// scripted failure fires.
    pub async fn run(self, mut stream: DuplexStream) {
        let _ = self.dialogue(&mut stream).await;
    }

    async fn dialogue(&self, stream: &mut DuplexStream) -> std::io::Result<()> {
        stream.write_all(b"\r\nUser Name: ").await?;
        let username = read_line(stream).await?;

        stream.write_all(b"Password: ").await?;
        // the real module interjects option negotiation right here
        stream.write_all(&[IAC, WILL, 1, IAC, DO, 3]).await?;
        let password = read_line(stream).await?;

        if self.failure == FailureMode::DenyLogin
            || username != self.username
            || password != self.password
        {
            stream.write_all(b"Access denied\r\n").await?;
            return Ok(());
        }

        stream
            .write_all(b"\r\nLogged in successfully\r\n\r\n>")
            .await?;

        let mut writes_seen = 0usize;
        loop {
            let line = read_line(stream).await?;
            if let Some(hex) = line.strip_prefix("relay writeall ") {
                if let Ok(bitmask) = u8::from_str_radix(hex.trim(), 16) {
                    if let FailureMode::DropOnWrite { after } = self.failure {
                        if writes_seen >= after {
                            return Ok(());
                        }
                    }
                    writes_seen += 1;
                    self.writes.lock().unwrap().push(bitmask);
                }
            }
            stream.write_all(b">").await?;
        }
    }
}

/// Read one CRLF-terminated line, skipping telnet option replies the
/// client sends in response to our negotiation.
async fn read_line<S: AsyncRead + Unpin>(stream: &mut S) -> std::io::Result<String> {
    let mut line = Vec::new();
    loop {
        let mut byte = [0u8; 1];
        stream.read_exact(&mut byte).await?;
        match byte[0] {
            IAC => {
                let mut command = [0u8; 1];
                stream.read_exact(&mut command).await?;
                if (WILL..=DONT).contains(&command[0]) {
                    let mut option = [0u8; 1];
                    stream.read_exact(&mut option).await?;
                }
            }
            b'\n' => return Ok(String::from_utf8_lossy(&line).into_owned()),
            b'\r' => {}
            data => line.push(data),
        }
    }
}

/// Connector handing out sessions against fresh fake modules.
///
/// Scripted failures are consumed one per connection, oldest first; once
/// the queue is empty every connection behaves normally.
#[derive(Debug, Clone)]
pub struct FakeConnector {
    username: String,
    password: String,
    failures: Arc<Mutex<VecDeque<FailureMode>>>,
    writes: Arc<Mutex<Vec<u8>>>,
    connects: Arc<AtomicUsize>,
}

impl FakeConnector {
    /// Create a connector whose modules expect the given credentials.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            failures: Arc::new(Mutex::new(VecDeque::new())),
            writes: Arc::new(Mutex::new(Vec::new())),
            connects: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Queue failure modes for the next connections.
    pub fn with_failures(self, failures: Vec<FailureMode>) -> Self {
        self.failures.lock().unwrap().extend(failures);
        self
    }

    /// Queue one failure mode for the next connection.
    pub fn push_failure(&self, failure: FailureMode) {
        self.failures.lock().unwrap().push_back(failure);
    }

    /// Bitmasks accepted across all connections, in order.
    pub fn written(&self) -> Vec<u8> {
        self.writes.lock().unwrap().clone()
    }

    /// Number of connection attempts so far.
    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ModuleConnector for FakeConnector {
    type Stream = DuplexStream;

    async fn connect(&mut self) -> Result<ModuleClient<DuplexStream>> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        let failure = self
            .failures
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_default();

        let (client_side, server_side) = tokio::io::duplex(1024);
        let module = FakeModule::new(
            self.username.clone(),
            self.password.clone(),
            failure,
            self.writes.clone(),
        );
        tokio::spawn(module.run(server_side));

        let info = ModuleInfo::new("fake-module", self.username.clone(), self.password.clone());
        ModuleClient::login(client_side, &info, FAKE_PROMPT_TIMEOUT).await
    }
}
