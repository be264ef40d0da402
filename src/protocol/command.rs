//! Command definitions
//!
//! `Command` is the typed form a client builds and the dispatcher executes.
//! `Request` is what the frame decoder produces from an arbitrary buffer:
//! every field optional, plus a validity flag and the reasons it failed.

use std::fmt;

use super::value::{Encoding, Value};

/// Command names accepted on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    Get,
    Set,
    Delete,
    Keys,
    Ping,
    /// Anything outside the fixed command set, including an empty name
    Unknown,
}

impl CommandKind {
    /// Parse a command token. Matching is exact and case-sensitive.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        match bytes {
            b"get" => CommandKind::Get,
            b"set" => CommandKind::Set,
            b"delete" => CommandKind::Delete,
            b"keys" => CommandKind::Keys,
            b"ping" => CommandKind::Ping,
            _ => CommandKind::Unknown,
        }
    }

    /// The wire token, `None` for `Unknown`
    pub fn as_str(&self) -> Option<&'static str> {
        match self {
            CommandKind::Get => Some("get"),
            CommandKind::Set => Some("set"),
            CommandKind::Delete => Some("delete"),
            CommandKind::Keys => Some("keys"),
            CommandKind::Ping => Some("ping"),
            CommandKind::Unknown => None,
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str().unwrap_or("unknown"))
    }
}

/// A well-formed command
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Get a value by key
    Get { key: String },

    /// Insert or replace a value
    Set { key: String, value: Value },

    /// Delete a key
    Delete { key: String },

    /// List all keys in order
    Keys,

    /// Health check; the payload is carried but never interpreted
    Ping { payload: Vec<u8> },
}

impl Command {
    /// Get the command kind
    pub fn kind(&self) -> CommandKind {
        match self {
            Command::Get { .. } => CommandKind::Get,
            Command::Set { .. } => CommandKind::Set,
            Command::Delete { .. } => CommandKind::Delete,
            Command::Keys => CommandKind::Keys,
            Command::Ping { .. } => CommandKind::Ping,
        }
    }
}

/// Symbolic reasons a request was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    CmdInvalid,
    DataInvalid,
    FrameTruncated,
    FrameMalformed,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::CmdInvalid => "cmdInvalid",
            ErrorCode::DataInvalid => "dataInvalid",
            ErrorCode::FrameTruncated => "frameTruncated",
            ErrorCode::FrameMalformed => "frameMalformed",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A decoded request.
///
/// Built once per inbound buffer by the frame decoder and never mutated
/// afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub cmd: CommandKind,
    pub key: Option<String>,
    pub value: Option<Value>,
    pub encoding: Option<Encoding>,
    pub valid: bool,
    /// Insertion ordered, no duplicates
    pub errors: Vec<ErrorCode>,
}

impl Request {
    pub(crate) fn empty() -> Self {
        Self {
            cmd: CommandKind::Unknown,
            key: None,
            value: None,
            encoding: None,
            valid: false,
            errors: Vec::new(),
        }
    }

    pub(crate) fn reject(&mut self, code: ErrorCode) {
        if !self.errors.contains(&code) {
            self.errors.push(code);
        }
    }

    /// Settle the validity flag once decoding is done
    pub(crate) fn finish(mut self) -> Self {
        if self.cmd == CommandKind::Unknown {
            self.reject(ErrorCode::CmdInvalid);
        }
        self.valid = self.errors.is_empty();
        self
    }

    /// True if decoding recorded `code`
    pub fn has_error(&self, code: ErrorCode) -> bool {
        self.errors.contains(&code)
    }

    /// Comma separated error names, for logs
    pub fn error_summary(&self) -> String {
        self.errors
            .iter()
            .map(ErrorCode::as_str)
            .collect::<Vec<_>>()
            .join(",")
    }

    /// The typed command for a valid request.
    ///
    /// Returns `None` when the request is invalid or lacks a field its
    /// command needs.
    pub fn to_command(&self) -> Option<Command> {
        if !self.valid {
            return None;
        }
        match self.cmd {
            CommandKind::Get => Some(Command::Get {
                key: self.key.clone()?,
            }),
            CommandKind::Set => {
                let value = self.value.clone()?;
                // The declared tag and the decoded shape must agree
                if self.encoding? != value.encoding() {
                    return None;
                }
                Some(Command::Set {
                    key: self.key.clone()?,
                    value,
                })
            }
            CommandKind::Delete => Some(Command::Delete {
                key: self.key.clone()?,
            }),
            CommandKind::Keys => Some(Command::Keys),
            CommandKind::Ping => Some(Command::Ping {
                payload: Vec::new(),
            }),
            CommandKind::Unknown => None,
        }
    }
}
