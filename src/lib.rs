//! courier: a one-request, one-reply TCP exchange
//!
//! A client resolves an address, connects, sends a single message and reads
//! a single reply. A server binds, listens, and answers each connection by
//! handing the received message to a caller-supplied callback.
//!
//! Features:
//! - Multi-candidate address resolution with ordered fallback
//! - Full-buffer transmission over a stream socket (partial writes handled)
//! - One independent task per accepted connection
//! - Configuration via CLI arguments or TOML file

pub mod config;
pub mod error;
pub mod resolver;
pub mod stream;

pub mod client;
pub mod server;

pub use client::send;
pub use config::{BACKLOG, MAX_DATA_SIZE};
pub use error::Error;
pub use server::serve;
