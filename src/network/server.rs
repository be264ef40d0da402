//! TCP Server
//!
//! Accepts connections and dispatches them to worker threads.

use std::net::{SocketAddr, TcpListener, TcpStream};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam::channel::{self, Receiver};

use super::connection::Connection;
use crate::config::Config;
use crate::engine::Engine;
use crate::error::{RediError, Result};

/// How long the acceptor sleeps when no connection is pending
const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Cloneable handle that stops a running server
#[derive(Debug, Clone, Default)]
pub struct ShutdownHandle {
    flag: Arc<AtomicBool>,
}

impl ShutdownHandle {
    /// Ask the server to stop accepting and drain its workers
    pub fn shutdown(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_shutdown(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// TCP server for redikv
pub struct Server {
    config: Config,
    engine: Arc<Engine>,
    listener: TcpListener,
    shutdown: ShutdownHandle,
}

impl Server {
    /// Validate the config and bind the listener.
    ///
    /// Bind failures are also reported to `Config::on_server_error`.
    pub fn bind(config: Config, engine: Arc<Engine>) -> Result<Self> {
        config.validate()?;

        let addr = config.listen_addr();
        let listener = match TcpListener::bind(&addr) {
            Ok(listener) => listener,
            Err(e) => {
                let err = RediError::from(e);
                tracing::error!("Failed to bind {}: {}", addr, err);
                config.report_server_error(&err);
                return Err(err);
            }
        };

        // Non-blocking accept so the loop can observe shutdown
        listener.set_nonblocking(true)?;

        Ok(Self {
            config,
            engine,
            listener,
            shutdown: ShutdownHandle::default(),
        })
    }

    /// Address actually bound (resolves port 0)
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Handle for stopping the server from another thread
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    /// Signal the server to shutdown gracefully
    pub fn shutdown(&self) {
        self.shutdown.shutdown();
    }

    /// Run the accept loop until shutdown (blocking)
    pub fn run(self) -> Result<()> {
        let (tx, rx) = channel::bounded::<TcpStream>(self.config.max_connections);

        let workers = (0..self.config.workers)
            .map(|id| spawn_worker(id, rx.clone(), Arc::clone(&self.engine), self.config.clone()))
            .collect::<Result<Vec<_>>>()?;
        drop(rx);

        tracing::info!(
            "Listening on {} with {} workers",
            self.local_addr()?,
            workers.len()
        );

        while !self.shutdown.is_shutdown() {
            match self.listener.accept() {
                Ok((stream, addr)) => {
                    tracing::trace!("Accepted connection from {}", addr);

                    // Accepted sockets may inherit the listener's non-blocking mode
                    if let Err(e) = stream.set_nonblocking(false) {
                        tracing::warn!("Dropping connection from {}: {}", addr, e);
                        continue;
                    }
                    if tx.send(stream).is_err() {
                        tracing::error!("All workers have exited, stopping accept loop");
                        break;
                    }
                }
                Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    thread::sleep(ACCEPT_POLL_INTERVAL);
                }
                Err(e) => {
                    let err = RediError::from(e);
                    tracing::warn!("Failed to accept connection: {}", err);
                    self.config.report_server_error(&err);
                    // Back off on persistent faults such as EMFILE
                    thread::sleep(ACCEPT_POLL_INTERVAL);
                }
            }
        }

        // Closing the queue lets workers finish what is queued and exit
        drop(tx);
        for worker in workers {
            if worker.join().is_err() {
                tracing::error!("Worker thread panicked during shutdown");
            }
        }

        tracing::info!("Server stopped");
        Ok(())
    }
}

fn spawn_worker(
    id: usize,
    queue: Receiver<TcpStream>,
    engine: Arc<Engine>,
    config: Config,
) -> Result<JoinHandle<()>> {
    let handle = thread::Builder::new()
        .name(format!("redikv-worker-{}", id))
        .spawn(move || {
            for stream in queue.iter() {
                let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                    serve(stream, &engine, &config)
                }));
                match outcome {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => tracing::warn!("Connection failed: {}", e),
                    Err(_) => tracing::error!("Connection handler panicked"),
                }
            }
        })?;
    Ok(handle)
}

fn serve(stream: TcpStream, engine: &Arc<Engine>, config: &Config) -> Result<()> {
    let mut connection = Connection::new(stream, Arc::clone(engine), config.max_frame_size)?;
    connection.set_timeouts(config.read_timeout_ms, config.write_timeout_ms)?;
    connection.handle()
}
