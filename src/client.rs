//! Client
//!
//! Blocking client for the redikv protocol. The server answers one request
//! per connection, so every call opens a fresh TCP connection.

use std::net::TcpStream;
use std::time::Duration;

use crate::error::{RediError, Result};
use crate::protocol::{
    read_response, write_command, Command, Payload, Response, Status, Value, ValueFraming,
};

/// Client for a redikv server
#[derive(Debug, Clone)]
pub struct Client {
    addr: String,
    framing: ValueFraming,
    timeout: Option<Duration>,
}

impl Client {
    /// Create a client for `host:port`
    pub fn new(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            framing: ValueFraming::default(),
            timeout: Some(Duration::from_secs(5)),
        }
    }

    /// Match the server's GET payload framing
    pub fn with_framing(mut self, framing: ValueFraming) -> Self {
        self.framing = framing;
        self
    }

    /// Read/write timeout per request (`None` blocks forever)
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Send one command and read its response
    pub fn execute(&self, command: &Command) -> Result<Response> {
        let mut stream = TcpStream::connect(&self.addr)?;
        stream.set_read_timeout(self.timeout)?;
        stream.set_write_timeout(self.timeout)?;

        write_command(&mut stream, command)?;
        read_response(&mut stream, command.kind(), self.framing)
    }

    /// Ping the server
    pub fn ping(&self) -> Result<()> {
        self.execute_ok(&Command::Ping {
            payload: b"alive?".to_vec(),
        })?;
        Ok(())
    }

    /// Get a value by key
    pub fn get(&self, key: &str) -> Result<Option<Value>> {
        let response = self.execute(&Command::Get {
            key: key.to_string(),
        })?;
        match (response.status, response.payload) {
            (Status::Ok, Some(Payload::Value(value))) => Ok(Some(value)),
            (Status::NotFound, _) => Ok(None),
            (status, _) => Err(unexpected(status)),
        }
    }

    /// Insert or replace a value
    pub fn set(&self, key: &str, value: Value) -> Result<()> {
        self.execute_ok(&Command::Set {
            key: key.to_string(),
            value,
        })?;
        Ok(())
    }

    /// Delete a key. Returns false if it did not exist.
    pub fn delete(&self, key: &str) -> Result<bool> {
        let response = self.execute(&Command::Delete {
            key: key.to_string(),
        })?;
        match response.status {
            Status::Ok => Ok(true),
            Status::NotFound => Ok(false),
            status => Err(unexpected(status)),
        }
    }

    /// List all keys in order
    pub fn keys(&self) -> Result<Vec<String>> {
        match self.execute_ok(&Command::Keys)?.payload {
            Some(Payload::Keys(keys)) => Ok(keys),
            _ => Err(RediError::Protocol("keys response without a key list".to_string())),
        }
    }

    fn execute_ok(&self, command: &Command) -> Result<Response> {
        let response = self.execute(command)?;
        match response.status {
            Status::Ok => Ok(response),
            status => Err(unexpected(status)),
        }
    }
}

fn unexpected(status: Status) -> RediError {
    RediError::Protocol(format!("server answered with status {}", status.code()))
}
