//! Protocol Module
//!
//! RESP wire protocol: request encoding, reply decoding and the reply model.
//!
//! ## Request Format
//! Every request is an array of bulk strings, name first:
//! ```text
//! *2\r\n$3\r\nGET\r\n$3\r\nkey\r\n
//! ```
//!
//! ## Reply Types
//! - `+` status line
//! - `-` error line
//! - `:` 64-bit signed integer
//! - `$` bulk string (`$-1` = nil)
//! - `*` array of replies (`*-1` = nil, may nest)

mod builtins;
mod command;
mod codec;
mod convert;
mod response;

pub use command::{Command, Pipeline, ToArg};
pub use response::ResultValue;
pub use convert::FromResultValue;
pub use codec::{
    decode, encode_command, encode_pipeline, read_value, read_values, write_command, CRLF,
    MAX_BULK_LEN, MAX_DEPTH,
};
