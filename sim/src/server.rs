// Copyright (c) 2024 Partisia Blockchain

//! Speculos-style TCP APDU socket for the simulator
//!
//! Requests are read as `LEN(4, BE) || APDU`, responses written as
//! `LEN(4, BE) || DATA || SW1 || SW2` with `LEN` excluding the status word.
//! Connections are served one at a time. A pending request is abandoned
//! if the peer disconnects or sends further data before it is answered.

use std::time::Duration;

use anyhow::anyhow;
use log::{debug, info, warn};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{TcpListener, TcpStream},
};

use pbc_ledger::{Exchange, Session, TransportError};

use crate::SimDevice;

/// Serve APDU connections until the listener fails
pub async fn serve(
    listener: TcpListener,
    device: &mut SimDevice,
    user_timeout: Duration,
) -> anyhow::Result<()> {
    loop {
        let (mut s, peer) = listener.accept().await?;

        info!("APDU connection from {peer}");

        if let Err(e) = handle_connection(&mut s, device, user_timeout).await {
            debug!("Connection closed: {e}");
        }

        // Drop any partial request state with the connection
        device.cancel().await?;
    }
}

async fn handle_connection(
    s: &mut TcpStream,
    device: &mut SimDevice,
    user_timeout: Duration,
) -> anyhow::Result<()> {
    loop {
        let n = s.read_u32().await? as usize;

        let mut cmd = vec![0u8; n];
        s.read_exact(&mut cmd).await?;

        let r = tokio::select! {
            r = device.exchange(&cmd, user_timeout) => r,
            // Requests are half-duplex, any read completing here is an abort
            _ = s.read_u8() => {
                warn!("Peer aborted pending request");
                return Err(anyhow!("request aborted"));
            }
        };

        let resp = match r {
            Ok(r) => r,
            Err(TransportError::Timeout) => {
                warn!("No user response, dropping request");
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        s.write_u32((resp.len() - 2) as u32).await?;
        s.write_all(&resp).await?;
    }
}
