//! Network Module
//!
//! Socket servers and the matching client.
//!
//! ## Architecture
//! - One accept thread per endpoint (TCP or Unix-domain socket)
//! - One worker thread per connection
//! - Every worker executes commands against the same shared Engine

mod endpoint;
mod transport;
mod connection;
mod server;
mod client;

pub use endpoint::Endpoint;
pub use transport::Transport;
pub use connection::Connection;
pub use server::{Server, ServerHandle, ShutdownHandle};
pub use client::Client;
