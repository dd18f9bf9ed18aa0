//! Contract between the session and the link-layer EAPoL engine.
//!
//! The engine owns the interface, framing and the generic EAP state machine.
//! It calls back into an [`EapHandler`] synchronously from inside
//! [`Engine::dispatch`] whenever a request arrives that needs an answer.

use crate::config::MAX_USERNAME_LEN;
use std::io;
use thiserror::Error;

/// Capacity handed to every response callback.
pub const MAX_RESPONSE_LEN: usize = 256;

const _: () = assert!(MAX_RESPONSE_LEN >= 1 + 16 + 32 + MAX_USERNAME_LEN);

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to initialize EAPoL on {interface}: {reason}")]
    Init { interface: String, reason: String },
    #[error("failed to send EAPoL start: {0}")]
    Start(String),
    #[error("dispatch failed: {0}")]
    Dispatch(String),
    #[error("authentication rejected by authenticator")]
    AuthFailure,
    #[error(transparent)]
    Io(#[from] io::Error),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BufferError {
    #[error("response needs {needed} bytes, buffer holds {capacity}")]
    Overflow { needed: usize, capacity: usize },
}

/// What the engine should do after a status-only callback.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Verdict {
    Continue,
    Terminate,
}

/// Fixed-capacity output buffer for response payloads.
#[derive(Debug, Clone)]
pub struct ResponseBuffer {
    data: [u8; MAX_RESPONSE_LEN],
    len: usize,
}

impl ResponseBuffer {
    pub fn new() -> Self {
        ResponseBuffer { data: [0; MAX_RESPONSE_LEN], len: 0 }
    }

    pub fn capacity(&self) -> usize {
        MAX_RESPONSE_LEN
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn clear(&mut self) {
        self.len = 0;
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data[..self.len]
    }

    pub fn put(&mut self, bytes: &[u8]) -> Result<(), BufferError> {
        let needed = self.len + bytes.len();
        if needed > MAX_RESPONSE_LEN {
            return Err(BufferError::Overflow { needed, capacity: MAX_RESPONSE_LEN });
        }
        self.data[self.len..needed].copy_from_slice(bytes);
        self.len = needed;
        Ok(())
    }

    pub fn put_u8(&mut self, byte: u8) -> Result<(), BufferError> {
        self.put(&[byte])
    }
}

impl Default for ResponseBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// Callback table registered with the engine.
///
/// Response callbacks clear `out`, fill it and return the payload length.
pub trait EapHandler: Send {
    fn on_identity_request(&mut self, out: &mut ResponseBuffer) -> Result<usize, BufferError>;

    fn on_md5_challenge(
        &mut self,
        id: u8,
        challenge: &[u8],
        out: &mut ResponseBuffer,
    ) -> Result<usize, BufferError>;

    fn on_vendor_challenge(
        &mut self,
        id: u8,
        challenge: &[u8],
        out: &mut ResponseBuffer,
    ) -> Result<usize, BufferError>;

    fn on_response_sent(&mut self);

    fn on_success(&mut self) -> Verdict;

    fn on_failure(&mut self) -> Verdict;

    fn on_unknown(&mut self) -> Verdict;
}

/// The link-layer authentication engine.
///
/// `dispatch` should return after each processed event (or after a short
/// receive timeout) so that shutdown requests are observed promptly. A
/// [`Verdict::Terminate`] from the handler is surfaced as
/// [`EngineError::AuthFailure`].
pub trait Engine: Send {
    fn init(&mut self, interface: &str, handler: Box<dyn EapHandler>) -> Result<(), EngineError>;

    fn start(&mut self) -> Result<(), EngineError>;

    fn dispatch(&mut self) -> Result<(), EngineError>;

    fn logoff(&mut self);

    fn cleanup(&mut self);
}
