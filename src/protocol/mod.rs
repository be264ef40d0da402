//! Protocol Module
//!
//! Defines the wire protocol for client-server communication.
//!
//! ## Protocol Format (length-prefixed binary, one request per connection)
//!
//! ### Request Format
//! ```text
//! ┌──────────────┬────────────┬───────────┬─────────────┬──────────────┐
//! │ TotalLen (4) │ CmdLen (4) │ Cmd bytes │ DataLen (4) │ Data         │
//! └──────────────┴────────────┴───────────┴─────────────┴──────────────┘
//! ```
//!
//! ### Commands
//! - `get`    - Data: key
//! - `set`    - Data: key + value + encoding tag
//! - `delete` - Data: key
//! - `keys`   - Data: none
//! - `ping`   - Data: ignored
//!
//! ### Response Format
//! ```text
//! ┌────────────┬──────────────────────────────┐
//! │ Status (4) │ Body (GET hit / KEYS only)    │
//! └────────────┴──────────────────────────────┘
//! ```
//!
//! ### Status Codes
//! - 200: OK
//! - 400: NOT_FOUND
//! - 500: ERROR (invalid request or internal failure)

mod codec;
mod command;
mod response;
mod value;

pub use codec::{
    decode_request, decode_response, encode_command, encode_frame, encode_response,
    read_request, read_response, write_command, write_response, ValueFraming,
    DEFAULT_MAX_FRAME_SIZE, LEN_SIZE,
};
pub use command::{Command, CommandKind, ErrorCode, Request};
pub use response::{Payload, Response, Status};
pub use value::{Encoding, Primitive, Value};
