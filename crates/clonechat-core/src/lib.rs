//! Clone Chat Core — configuration and the shared error taxonomy.

pub mod config;
pub mod error;

pub use config::{CloneChatConfig, DEFAULT_PORT};
pub use error::{Error, ErrorKind, Result};
