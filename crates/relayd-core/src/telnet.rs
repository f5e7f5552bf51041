//! Telnet-aware byte transport for the module session.
//!
//! The relay module speaks plain line-oriented text, but it interjects
//! telnet IAC option negotiation mid-login and refuses authentication when
//! the chatter goes unanswered. This wrapper strips negotiation out of the
//! data stream, refuses every option on the module's behalf, and puts an
//! explicit deadline on every read.

use bytes::{Buf, BytesMut};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::timeout;

use crate::error::{Error, Result};

/// Telnet "interpret as command" escape byte.
pub const IAC: u8 = 255;
/// Option refusal: demand the peer stop offering.
pub const DONT: u8 = 254;
/// Option request: ask the peer to enable.
pub const DO: u8 = 253;
/// Option refusal: we will not enable.
pub const WONT: u8 = 252;
/// Option offer: the peer will enable.
pub const WILL: u8 = 251;
/// Start of subnegotiation.
pub const SB: u8 = 250;
/// End of subnegotiation.
pub const SE: u8 = 240;

/// Negotiation parser state, carried across reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NegotiationState {
    /// Plain data bytes.
    Data,
    /// Saw IAC, expecting a command byte.
    Command,
    /// Saw IAC WILL/WONT/DO/DONT, expecting the option byte.
    Option(u8),
    /// Inside an SB ... SE subnegotiation.
    Subnegotiation,
    /// Saw IAC inside a subnegotiation.
    SubnegotiationCommand,
}

/// Byte stream with telnet negotiation filtered out.
#[derive(Debug)]
pub struct TelnetStream<S> {
    stream: S,
    read_timeout: Duration,
    /// Decoded data bytes not yet handed to the caller.
    data: BytesMut,
    state: NegotiationState,
    /// Completed option/subnegotiation sequences seen so far.
    negotiations: u64,
}

impl<S: AsyncRead + AsyncWrite + Unpin> TelnetStream<S> {
    /// Wrap a transport, applying `read_timeout` to every read.
    pub fn new(stream: S, read_timeout: Duration) -> Self {
        Self {
            stream,
            read_timeout,
            data: BytesMut::with_capacity(256),
            state: NegotiationState::Data,
            negotiations: 0,
        }
    }

    /// Next data byte, waiting at most the read timeout per transport read.
    pub async fn read_byte(&mut self) -> Result<u8> {
        loop {
            if !self.data.is_empty() {
                return Ok(self.data.get_u8());
            }
            self.fill().await?;
        }
    }

    /// Read one line, stripping CR and the terminating LF.
    pub async fn read_line(&mut self) -> Result<String> {
        let mut line = Vec::new();
        loop {
            match self.read_byte().await? {
                b'\n' => return Ok(String::from_utf8_lossy(&line).into_owned()),
                b'\r' => {}
                byte => line.push(byte),
            }
        }
    }

    /// Send a line terminated with CRLF.
    pub async fn write_line(&mut self, line: &str) -> Result<()> {
        self.stream.write_all(line.as_bytes()).await?;
        self.stream.write_all(b"\r\n").await?;
        self.stream.flush().await?;
        Ok(())
    }

    /// Consume the option chatter the module emits after the password
    /// prompt. Done once at least one complete negotiation sequence has
    /// been handled; data bytes arriving in the meantime are discarded,
    /// and any later chatter is filtered inline by the normal reads.
    pub async fn drain_negotiation(&mut self) -> Result<()> {
        while self.negotiations == 0 {
            self.data.clear();
            self.fill().await?;
        }
        self.data.clear();
        Ok(())
    }

    /// Close the transport. Safe to call more than once.
    pub async fn shutdown(&mut self) {
        let _ = self.stream.shutdown().await;
    }

    /// One transport read passed through the negotiation filter. Refusals
    /// for offered options are written back immediately. Returns the number
    /// of data bytes the read produced.
    async fn fill(&mut self) -> Result<usize> {
        let mut buf = [0u8; 256];
        let n = timeout(self.read_timeout, self.stream.read(&mut buf))
            .await
            .map_err(|_| Error::Timeout)??;
        if n == 0 {
            return Err(Error::ConnectionClosed);
        }

        let mut produced = 0;
        let mut replies = Vec::new();
        for &byte in &buf[..n] {
            match self.state {
                NegotiationState::Data => {
                    if byte == IAC {
                        self.state = NegotiationState::Command;
                    } else {
                        self.data.extend_from_slice(&[byte]);
                        produced += 1;
                    }
                }
                NegotiationState::Command => match byte {
                    WILL | WONT | DO | DONT => self.state = NegotiationState::Option(byte),
                    SB => self.state = NegotiationState::Subnegotiation,
                    IAC => {
                        // escaped 0xff data byte
                        self.data.extend_from_slice(&[IAC]);
                        produced += 1;
                        self.state = NegotiationState::Data;
                    }
                    _ => {
                        // NOP, GA and friends carry no option byte
                        self.negotiations += 1;
                        self.state = NegotiationState::Data;
                    }
                },
                NegotiationState::Option(command) => {
                    match command {
                        WILL => replies.extend_from_slice(&[IAC, DONT, byte]),
                        DO => replies.extend_from_slice(&[IAC, WONT, byte]),
                        // peer refusals need no answer
                        _ => {}
                    }
                    self.negotiations += 1;
                    self.state = NegotiationState::Data;
                }
                NegotiationState::Subnegotiation => {
                    if byte == IAC {
                        self.state = NegotiationState::SubnegotiationCommand;
                    }
                }
                NegotiationState::SubnegotiationCommand => {
                    if byte == SE {
                        self.negotiations += 1;
                        self.state = NegotiationState::Data;
                    } else {
                        self.state = NegotiationState::Subnegotiation;
                    }
                }
            }
        }

        if !replies.is_empty() {
            self.stream.write_all(&replies).await?;
            self.stream.flush().await?;
        }
        Ok(produced)
    }
}
