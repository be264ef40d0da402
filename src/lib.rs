//! # redikv
//!
//! A minimal in-memory key-value store with:
//! - A length-prefixed binary protocol, one request per connection
//! - Typed values (string, array, number, JSON object) tagged by encoding
//! - An AVL tree holding all state with O(log n) operations
//! - A thread-pool TCP server sharing one store behind a single lock
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      TCP Server                              │
//! │            (Acceptor + Worker Thread Pool)                   │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ one buffer per connection
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                   Frame Decoder                              │
//! │              (Request + validation errors)                   │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                 Engine (Interpreter)                         │
//! │           Reject (500) / Dispatch (200, 400)                 │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │ Value Codec │          │  AVL Tree   │
//!   │  (tags)     │          │  (Mutex)    │
//!   └─────────────┘          └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;

pub mod client;
pub mod engine;
pub mod network;
pub mod protocol;
pub mod store;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use client::Client;
pub use config::Config;
pub use engine::Engine;
pub use error::{RediError, Result};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of redikv
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
