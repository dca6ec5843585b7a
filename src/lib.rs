//! In-process X11 display server core.
//!
//! This crate terminates an X11 client byte stream, typically one
//! forwarded over a secure channel, and translates it into calls on an
//! abstract render front-end. It owns the wire-protocol codec, the
//! per-client request/reply/event/error state machine, the resource and
//! atom namespaces, the window tree, the input-routing engine with core
//! and XInput grabs, and the colormap arithmetic. Rasterisation, fonts,
//! and the transport live outside, behind narrow interfaces.
//!
//! ## Architecture
//!
//! - [`protocol`] - byte-order-aware codec: requests, replies, events,
//!   errors, the handshake, and the XInput sub-protocol
//! - [`resources`] - id-to-resource registry, atoms, GCs, pixmaps
//! - [`window`] - window tree, stacking, properties
//! - [`input`] - focus, grabs, motion history, event routing
//! - [`xinput`] - virtual devices, extension selections, device grabs
//! - [`color`] - colormaps and the named-colour table
//! - [`frontend`] - the capability set a render front-end implements
//! - [`server`] - connection loop, dispatcher, handlers, shared state
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use sshterm_x11::{frontend::RecordingFrontend, Server, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> sshterm_x11::Result<()> {
//!     let server = Server::new(ServerConfig::default(), Arc::new(RecordingFrontend::new()));
//!     let (stream, _peer) = tokio::net::TcpListener::bind("127.0.0.1:6001")
//!         .await?
//!         .accept()
//!         .await?;
//!     server.serve_stream(stream).await
//! }
//! ```

pub mod color;
pub mod config;
pub mod frontend;
pub mod input;
pub mod protocol;
pub mod resources;
pub mod server;
pub mod window;
pub mod xinput;

pub use config::ServerConfig;
pub use frontend::Frontend;
pub use server::{MouseEventKind, Server};

/// Common result type used throughout the library.
pub type Result<T> = std::result::Result<T, Error>;

/// Connection-level failures. Protocol violations inside a session are
/// never Rust errors; they become X error packets on the wire.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("handshake failed: {0}")]
    Handshake(#[from] protocol::setup::SetupError),

    #[error("connection table full")]
    TooManyClients,
}
