// Copyright (c) 2024 Partisia Blockchain

//! Speculos-style TCP sessions
//!
//! A request that fails or times out leaves an unknown amount of response
//! data in flight, so the socket is dropped and the next request reconnects.

use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};

use ledger_lib::{
    transport::{TcpDevice, TcpInfo, TcpTransport},
    Transport,
};

use super::{Exchange, Session, TransportError};

/// TCP APDU session, reconnecting after failed requests
pub struct TcpSession {
    info: TcpInfo,
    d: Option<TcpDevice>,
}

impl TcpSession {
    /// Connect to a TCP APDU socket
    pub async fn connect(info: TcpInfo) -> Result<Self, TransportError> {
        let mut s = Self { info, d: None };

        s.device().await?;

        Ok(s)
    }

    /// Check whether the session currently holds a socket
    pub fn is_connected(&self) -> bool {
        self.d.is_some()
    }

    /// Fetch the connected device, reconnecting if required
    async fn device(&mut self) -> Result<&mut TcpDevice, TransportError> {
        let d = match self.d.take() {
            Some(d) => d,
            None => {
                debug!("Connecting to {}", self.info.addr);

                let mut t = TcpTransport::new()?;
                t.connect(self.info.clone()).await?
            }
        };

        Ok(self.d.insert(d))
    }
}

#[async_trait]
impl Exchange for TcpSession {
    async fn exchange(
        &mut self,
        command: &[u8],
        timeout: Duration,
    ) -> Result<Vec<u8>, TransportError> {
        let r = self.device().await?.exchange(command, timeout).await;

        if let Err(e) = &r {
            warn!("Exchange failed ({e}), dropping connection");
            self.d = None;
        }

        r
    }
}

#[async_trait]
impl Session for TcpSession {
    async fn cancel(&mut self) -> Result<(), TransportError> {
        if self.d.take().is_some() {
            debug!("Closing connection to {}", self.info.addr);
        }

        Ok(())
    }
}
