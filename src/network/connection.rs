//! Connection Handler
//!
//! Handles individual client connections. Each connection carries exactly
//! one request: read one frame, write one response, close.

use std::io::{self, BufReader, BufWriter, Write};
use std::net::{Shutdown, TcpStream};
use std::sync::Arc;
use std::time::Duration;

use crate::engine::Engine;
use crate::error::{RediError, Result};
use crate::protocol::{encode_response, read_request, Response};

/// Handles a single client connection
pub struct Connection {
    /// TCP stream reader (buffered for efficiency)
    reader: BufReader<TcpStream>,

    /// TCP stream writer (buffered for efficiency)
    writer: BufWriter<TcpStream>,

    /// Reference to the shared engine
    engine: Arc<Engine>,

    /// Largest frame this connection will read
    max_frame_size: u32,

    /// Peer address for logging
    peer_addr: String,
}

impl Connection {
    /// Create a new connection handler
    ///
    /// Sets up buffered I/O on cloned handles of the stream
    pub fn new(stream: TcpStream, engine: Arc<Engine>, max_frame_size: u32) -> Result<Self> {
        // Get peer address for logging before we split the stream
        let peer_addr = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        // Disable Nagle's algorithm for low latency
        stream.set_nodelay(true)?;

        // Clone stream for separate read/write handles
        let read_stream = stream.try_clone()?;
        let write_stream = stream;

        Ok(Self {
            reader: BufReader::new(read_stream),
            writer: BufWriter::new(write_stream),
            engine,
            max_frame_size,
            peer_addr,
        })
    }

    /// Configure connection timeouts
    pub fn set_timeouts(&mut self, read_ms: u64, write_ms: u64) -> Result<()> {
        let read_stream = self.reader.get_ref();
        let write_stream = self.writer.get_ref();

        if read_ms > 0 {
            read_stream.set_read_timeout(Some(Duration::from_millis(read_ms)))?;
        }
        if write_ms > 0 {
            write_stream.set_write_timeout(Some(Duration::from_millis(write_ms)))?;
        }

        Ok(())
    }

    /// Serve the connection's single request, then close it.
    ///
    /// Peer disconnects and timeouts end the connection quietly; other I/O
    /// failures are returned to the caller.
    pub fn handle(mut self) -> Result<()> {
        if self.engine.debug_enabled() {
            tracing::debug!("Connection established from {}", self.peer_addr);
        }

        let frame = match read_request(&mut self.reader, self.max_frame_size) {
            Ok(frame) => frame,
            Err(RediError::Io(ref e)) if is_disconnect(e) => {
                tracing::debug!("Client {} disconnected before a full request", self.peer_addr);
                return Ok(());
            }
            Err(RediError::Io(ref e)) if is_timeout(e) => {
                tracing::debug!("Read timeout for client {}", self.peer_addr);
                return Ok(());
            }
            Err(RediError::Io(e)) => {
                tracing::warn!("Error reading from {}: {}", self.peer_addr, e);
                return Err(e.into());
            }
            Err(e) => {
                // Unreadable frame (e.g. too large): reject it and close
                tracing::warn!("Rejecting frame from {}: {}", self.peer_addr, e);
                let rejection = encode_response(&Response::error(), self.engine.framing());
                self.finish(&rejection);
                return Ok(());
            }
        };

        tracing::trace!("Received {} bytes from {}", frame.len(), self.peer_addr);

        let response = self.engine.handle_connection_data(&frame);
        self.finish(&response);
        Ok(())
    }

    /// Write the response and close both directions
    fn finish(&mut self, response: &[u8]) {
        if let Err(e) = self.send(response) {
            if is_disconnect(&e) {
                tracing::debug!(
                    "Client {} disconnected before response could be sent: {}",
                    self.peer_addr,
                    e
                );
            } else {
                tracing::warn!("Error writing to {}: {}", self.peer_addr, e);
            }
        }

        if let Err(e) = self.writer.get_ref().shutdown(Shutdown::Both) {
            if e.kind() != io::ErrorKind::NotConnected {
                tracing::debug!("Error closing connection to {}: {}", self.peer_addr, e);
            }
        }
    }

    fn send(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.writer.write_all(bytes)?;
        self.writer.flush()
    }
}

fn is_disconnect(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::UnexpectedEof
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::BrokenPipe
    )
}

// Windows reports read timeouts as TimedOut instead of WouldBlock
fn is_timeout(e: &io::Error) -> bool {
    matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut)
}
