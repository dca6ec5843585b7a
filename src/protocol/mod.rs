//! X11 wire protocol: typed requests, replies, events, and errors.
//!
//! The codec is strictly byte-order aware (every multi-byte field honours
//! the order negotiated in the handshake) and strictly bounded: decoders
//! can only read the declared request body, and overruns surface as
//! `Length` errors instead of panics or stray reads.

pub mod errors;
pub mod events;
pub mod opcodes;
pub mod replies;
pub mod requests;
pub mod setup;
pub mod types;
pub mod wire;
pub mod xinput;

pub use errors::{ErrorCode, XError};
pub use events::Event;
pub use replies::Reply;
pub use requests::{decode_request, Request, RequestHeader};
pub use setup::{SetupInfo, SetupRequest, Visual};
pub use types::ByteOrder;
