//! Response definitions
//!
//! Represents responses to clients.

use super::value::Value;

/// Response status codes, written as a big-endian u32
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum Status {
    Ok = 200,
    NotFound = 400,
    Error = 500,
}

impl Status {
    pub fn code(self) -> u32 {
        self as u32
    }

    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            200 => Some(Status::Ok),
            400 => Some(Status::NotFound),
            500 => Some(Status::Error),
            _ => None,
        }
    }
}

/// Body following the status of a successful response
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// GET hit
    Value(Value),

    /// KEYS listing, in key order
    Keys(Vec<String>),
}

/// A response to send to client
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    /// Status code
    pub status: Status,

    /// Optional payload (value for GET, key list for KEYS)
    pub payload: Option<Payload>,
}

impl Response {
    /// Create an OK response with no body
    pub fn ok() -> Self {
        Self {
            status: Status::Ok,
            payload: None,
        }
    }

    /// Create an OK response carrying a value
    pub fn value(value: Value) -> Self {
        Self {
            status: Status::Ok,
            payload: Some(Payload::Value(value)),
        }
    }

    /// Create an OK response carrying a key listing
    pub fn keys(keys: Vec<String>) -> Self {
        Self {
            status: Status::Ok,
            payload: Some(Payload::Keys(keys)),
        }
    }

    /// Create a NOT_FOUND response
    pub fn not_found() -> Self {
        Self {
            status: Status::NotFound,
            payload: None,
        }
    }

    /// Create an ERROR response.
    ///
    /// Error responses carry no message; the status alone tells the client
    /// the request was rejected.
    pub fn error() -> Self {
        Self {
            status: Status::Error,
            payload: None,
        }
    }
}
