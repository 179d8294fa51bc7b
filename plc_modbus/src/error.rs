//! Protocol server errors.

use std::io;
use std::net::SocketAddr;

use thiserror::Error;

/// Startup or accept-loop failure of the Modbus server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The listening socket could not be bound.
    #[error("failed to bind Modbus listener on {addr}: {source}")]
    Bind {
        /// Requested address.
        addr: SocketAddr,
        /// OS error.
        #[source]
        source: io::Error,
    },

    /// Accept loop terminated with an I/O error.
    #[error("Modbus server I/O error: {0}")]
    Io(#[from] io::Error),
}
