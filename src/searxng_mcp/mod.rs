pub mod client;
pub mod error;
pub mod filters;
pub mod server;
pub mod types;

pub use client::SearXNGClient;
pub use server::SearXNGServer;
pub use types::*;
