use std::net::SocketAddr;

/// Errors raised while listening for or talking to table clients.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The listener could not claim its address.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// The OS refused to hand over the next TCP connection.
    #[error("accept failed: {0}")]
    Accept(#[source] std::io::Error),

    /// A client connected but never completed the WebSocket upgrade.
    #[error("handshake with {peer} failed: {reason}")]
    Handshake { peer: SocketAddr, reason: String },

    /// The peer is gone; nothing more can be written.
    #[error("connection closed")]
    Closed,

    /// The socket failed mid-stream.
    #[error("socket error: {0}")]
    Socket(String),
}
