//! Protocol Module
//!
//! Defines the wire protocol for client-server communication.
//!
//! ## Frame Format
//! ```text
//! ┌──────────┬─────────────────────────────┐
//! │ Len (4)  │     JSON payload            │
//! └──────────┴─────────────────────────────┘
//! ```
//!
//! ### Command payload
//! ```text
//! {"authKey": "<sha256 hex>", "command": "listAddLast",
//!  "key": "queue", "val": ["a", "b"], "ttl": 30}
//! ```
//!
//! ### Response payload
//! - `{"results": <null | bool | integer | string | [string] | stats>}`
//! - `{"error": "<message>"}`

mod command;
mod response;
mod codec;

pub use command::{CommandKind, CommandMessage, Val};
pub use response::{ResponseMessage, Stats, Value};
pub use codec::{
    decode_command, decode_response, encode_command, encode_response, frame, read_command,
    read_frame, read_response, split_frame, write_command, write_response, HEADER_SIZE,
    MAX_FRAME_SIZE,
};
