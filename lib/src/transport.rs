// Copyright (c) 2024 Partisia Blockchain

//! Transports for exchanging raw APDUs with a device
//!
//! Raw exchange is provided by [ledger_lib::Exchange]. A [Session] adds the
//! abort hook required when a request is abandoned part way through, so the
//! next command is never answered with the response to an earlier one.

use async_trait::async_trait;

pub use ledger_lib::{Error as TransportError, Exchange};

#[cfg(feature = "transport_tcp")]
mod tcp;
#[cfg(feature = "transport_tcp")]
pub use tcp::TcpSession;
#[cfg(feature = "transport_tcp")]
pub use ledger_lib::transport::TcpInfo;

/// Device session over an [Exchange] transport
///
/// Requests are strictly half-duplex, callers must not issue a new command
/// until the previous one has resolved.
#[async_trait]
pub trait Session: Exchange + Send {
    /// Abandon any outstanding request
    ///
    /// On return the device has dropped any partial request state and no
    /// response to an earlier command remains to be read.
    async fn cancel(&mut self) -> Result<(), TransportError>;
}
