//! Engine Module
//!
//! The command interpreter that owns the store.
//!
//! ## Responsibilities
//! - Turn one inbound buffer into exactly one response buffer
//! - Reject invalid requests without touching the store
//! - Dispatch valid commands to the AVL tree
//! - Serialize all store access through one lock
//!
//! ## Request lifecycle
//! ```text
//! ReceiveRequest ──► Validate ──┬──► Reject   (500)
//!                               └──► Dispatch (200 / 400)
//! ```

use parking_lot::Mutex;

use crate::config::Config;
use crate::error::{RediError, Result};
use crate::protocol::{
    decode_request, encode_response, Command, Request, Response, Value, ValueFraming,
};
use crate::store::{AvlTree, StoreEntry};

/// The command interpreter and its store
///
/// ## Concurrency Model
///
/// Every command holds `store` for its whole duration, so concurrent
/// get/set/delete/keys calls observe a linearizable view of the tree.
/// Frame decoding and response encoding run outside the lock.
pub struct Engine {
    /// All key/value state
    store: Mutex<AvlTree>,

    /// How GET payloads are framed on the way out
    framing: ValueFraming,

    /// Per-request diagnostic logging
    debug: bool,
}

impl Engine {
    /// Create an engine with an empty store and default framing
    pub fn new() -> Self {
        Self::with_framing(ValueFraming::default())
    }

    /// Create an engine configured for a server context
    pub fn with_config(config: &Config) -> Self {
        Self::with_framing(config.value_framing()).with_debug(config.debug_enabled)
    }

    pub fn with_framing(framing: ValueFraming) -> Self {
        Self {
            store: Mutex::new(AvlTree::new()),
            framing,
            debug: false,
        }
    }

    /// Toggle per-request diagnostic logging
    pub fn with_debug(mut self, enabled: bool) -> Self {
        self.debug = enabled;
        self
    }

    /// Handle one inbound buffer and produce the bytes to send back.
    ///
    /// The caller writes the result and closes the connection.
    pub fn handle_connection_data(&self, bytes: &[u8]) -> Vec<u8> {
        let request = decode_request(bytes);
        let response = self.respond(&request);
        encode_response(&response, self.framing)
    }

    /// Execute a request, converting any failure into an ERROR response
    pub fn respond(&self, request: &Request) -> Response {
        match self.execute(request) {
            Ok(response) => response,
            Err(e) => {
                tracing::error!("Failed to execute {} request: {}", request.cmd, e);
                Response::error()
            }
        }
    }

    /// Validate and execute a decoded request
    pub fn execute(&self, request: &Request) -> Result<Response> {
        if !request.valid {
            if self.debug {
                tracing::debug!(
                    "Rejecting {} request: {}",
                    request.cmd,
                    request.error_summary()
                );
            }
            return Ok(Response::error());
        }

        let command = request.to_command().ok_or_else(|| {
            RediError::Internal(format!("valid {} request is missing fields", request.cmd))
        })?;

        Ok(self.dispatch(command))
    }

    /// Run a well-formed command against the store
    pub fn dispatch(&self, command: Command) -> Response {
        if self.debug {
            tracing::debug!("Dispatching {}", command.kind());
        }

        match command {
            Command::Ping { .. } => Response::ok(),
            Command::Get { key } => match self.get(&key) {
                Some(entry) => Response::value(entry.value),
                None => Response::not_found(),
            },
            Command::Set { key, value } => {
                self.set(key, value);
                Response::ok()
            }
            Command::Delete { key } => {
                if self.delete(&key) {
                    Response::ok()
                } else {
                    Response::not_found()
                }
            }
            Command::Keys => Response::keys(self.keys()),
        }
    }

    /// Get the entry stored under `key`
    pub fn get(&self, key: &str) -> Option<StoreEntry> {
        self.store.lock().lookup(key).cloned()
    }

    /// Insert or replace `key`. Returns true if the key was new.
    pub fn set(&self, key: impl Into<String>, value: Value) -> bool {
        let encoding = value.encoding();
        self.store.lock().upsert(key, value, encoding)
    }

    /// Delete `key`. Returns true only if it was present.
    pub fn delete(&self, key: &str) -> bool {
        self.store.lock().remove(key)
    }

    /// All keys in ascending order
    pub fn keys(&self) -> Vec<String> {
        self.store.lock().keys()
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Number of stored keys
    pub fn len(&self) -> usize {
        self.store.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.lock().is_empty()
    }

    /// Check the store's structural invariants
    pub fn validate(&self) -> Result<()> {
        self.store.lock().validate()
    }

    /// Response framing in use
    pub fn framing(&self) -> ValueFraming {
        self.framing
    }

    /// Whether per-request diagnostics are logged
    pub fn debug_enabled(&self) -> bool {
        self.debug
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}
