//! Sender that forwards payloads to the local GSE agent over its IPC socket.

mod config;
mod message;
mod sender;
mod transport;

pub use config::GseConfig;
pub use message::{GseMessage, GSE_COMMON_MSG_TYPE, GSE_HEADER_LEN};
#[cfg(unix)]
pub use sender::register_gse_sender;
pub use sender::{GseSender, DATA_ID_OPTION};
#[cfg(unix)]
pub use transport::UnixSocketTransport;
pub use transport::{GseError, GseTransport};

/// Registry key of the GSE sender.
pub const GSE_SENDER_NAME: &str = "gse";
