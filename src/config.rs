//! Configuration for redikv
//!
//! Centralized configuration with sensible defaults.

use std::fmt;
use std::sync::Arc;

use crate::error::{RediError, Result};
use crate::protocol::{ValueFraming, DEFAULT_MAX_FRAME_SIZE};

/// Callback invoked on listener-level faults (bind/accept failures)
pub type ServerErrorHandler = Arc<dyn Fn(&RediError) + Send + Sync>;

/// Main configuration for a redikv server
#[derive(Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Network Configuration
    // -------------------------------------------------------------------------
    /// Interface to bind
    pub bind_host: String,

    /// TCP port to bind (0 picks an ephemeral port)
    pub port: u16,

    /// Number of worker threads serving connections
    pub workers: usize,

    /// Max accepted connections waiting for a worker
    pub max_connections: usize,

    /// Connection read timeout (milliseconds, 0 disables)
    pub read_timeout_ms: u64,

    /// Connection write timeout (milliseconds, 0 disables)
    pub write_timeout_ms: u64,

    // -------------------------------------------------------------------------
    // Protocol Configuration
    // -------------------------------------------------------------------------
    /// Largest request frame accepted, including the length prefix
    pub max_frame_size: u32,

    /// Write a value-length field before GET payloads.
    /// When false, responses use the legacy layout where the payload
    /// runs until the connection closes.
    pub length_prefixed_values: bool,

    // -------------------------------------------------------------------------
    // Diagnostics
    // -------------------------------------------------------------------------
    /// Toggles diagnostic (debug level) logging
    pub debug_enabled: bool,

    /// Invoked on listener-level faults
    pub on_server_error: Option<ServerErrorHandler>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_host: "127.0.0.1".to_string(),
            port: 3000,
            workers: 4,
            max_connections: 1024,
            read_timeout_ms: 5000,
            write_timeout_ms: 5000,
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
            length_prefixed_values: true,
            debug_enabled: false,
            on_server_error: None,
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("bind_host", &self.bind_host)
            .field("port", &self.port)
            .field("workers", &self.workers)
            .field("max_connections", &self.max_connections)
            .field("read_timeout_ms", &self.read_timeout_ms)
            .field("write_timeout_ms", &self.write_timeout_ms)
            .field("max_frame_size", &self.max_frame_size)
            .field("length_prefixed_values", &self.length_prefixed_values)
            .field("debug_enabled", &self.debug_enabled)
            .field("on_server_error", &self.on_server_error.is_some())
            .finish()
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// The `host:port` string handed to the listener
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind_host, self.port)
    }

    /// How GET payloads are framed in responses
    pub fn value_framing(&self) -> ValueFraming {
        ValueFraming::from_length_prefixed(self.length_prefixed_values)
    }

    /// Reject settings the server cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(RediError::Config("workers must be at least 1".to_string()));
        }
        if self.max_connections == 0 {
            return Err(RediError::Config(
                "max_connections must be at least 1".to_string(),
            ));
        }
        // The smallest meaningful frame is the length prefix plus a command length
        if self.max_frame_size < 8 {
            return Err(RediError::Config(format!(
                "max_frame_size {} is smaller than a minimal frame",
                self.max_frame_size
            )));
        }
        Ok(())
    }

    /// Forward a listener-level fault to the configured callback, if any
    pub fn report_server_error(&self, err: &RediError) {
        if let Some(handler) = &self.on_server_error {
            handler(err);
        }
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the interface to bind
    pub fn bind_host(mut self, host: impl Into<String>) -> Self {
        self.config.bind_host = host.into();
        self
    }

    /// Set the TCP port
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Set the number of worker threads
    pub fn workers(mut self, count: usize) -> Self {
        self.config.workers = count;
        self
    }

    /// Set the maximum number of queued connections
    pub fn max_connections(mut self, count: usize) -> Self {
        self.config.max_connections = count;
        self
    }

    /// Set the read timeout (in milliseconds)
    pub fn read_timeout_ms(mut self, ms: u64) -> Self {
        self.config.read_timeout_ms = ms;
        self
    }

    /// Set the write timeout (in milliseconds)
    pub fn write_timeout_ms(mut self, ms: u64) -> Self {
        self.config.write_timeout_ms = ms;
        self
    }

    /// Set the largest accepted request frame (in bytes)
    pub fn max_frame_size(mut self, size: u32) -> Self {
        self.config.max_frame_size = size;
        self
    }

    /// Choose between length-prefixed and legacy GET payloads
    pub fn length_prefixed_values(mut self, enabled: bool) -> Self {
        self.config.length_prefixed_values = enabled;
        self
    }

    /// Toggle diagnostic logging
    pub fn debug_enabled(mut self, enabled: bool) -> Self {
        self.config.debug_enabled = enabled;
        self
    }

    /// Register a callback for listener-level faults
    pub fn on_server_error<F>(mut self, handler: F) -> Self
    where
        F: Fn(&RediError) + Send + Sync + 'static,
    {
        self.config.on_server_error = Some(Arc::new(handler));
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
