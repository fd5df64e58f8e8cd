// Copyright (c) 2024 Partisia Blockchain

//! Handle for connected ledger devices
//!
//! This provides methods for interacting with the device
//! and is generic over [Session] transports.

use std::{sync::Arc, time::Duration};

use encdec::DecodeOwned;
use log::{debug, trace, warn};
use tokio::sync::Mutex;

use pbc_ledger_apdu::{
    address::Address,
    app_info::{
        AppAndVersionReq, AppAndVersionResp, AppNameResp, GetAppNameReq, GetVersionReq,
        VersionResp,
    },
    chain_id::ChainId,
    chunk::{sign_tx_packets, ApduPacket},
    get_address::GetAddressReq,
    path::DerivationPath,
    signature::Signature,
    status::StatusWord,
    tx::Transaction,
    ApduError,
};

use crate::{
    config::HandleConfig,
    error::StatusError,
    pending::{FromResponse, PendingRequest},
    transport::{Session, TransportError},
    Error,
};

/// Partisia Blockchain handle for a connected ledger device.
///
/// This is generic over [Session] types to support different
/// underlying transports. Cloned handles share the same device, with
/// requests serialised through an internal lock.
pub struct DeviceHandle<T: Session> {
    /// Device handle for communication
    t: Arc<Mutex<T>>,
    /// Timeouts and chunking configuration
    cfg: HandleConfig,
}

impl<T: Session> Clone for DeviceHandle<T> {
    fn clone(&self) -> Self {
        Self {
            t: self.t.clone(),
            cfg: self.cfg.clone(),
        }
    }
}

impl<T: Session> From<T> for DeviceHandle<T> {
    fn from(t: T) -> Self {
        Self::new(t, HandleConfig::default())
    }
}

/// Name and version of the running application
#[derive(Clone, Debug, PartialEq)]
pub struct AppInfo {
    pub app_name: String,
    pub app_version: String,
}

impl<T: Session> DeviceHandle<T> {
    /// Create a new handle with the provided configuration
    pub fn new(t: T, cfg: HandleConfig) -> Self {
        Self {
            t: Arc::new(Mutex::new(t)),
            cfg,
        }
    }

    /// Fetch handle configuration
    pub fn config(&self) -> &HandleConfig {
        &self.cfg
    }

    /// Fetch the running application name and version via the BOLOS query
    pub async fn app_and_version(&self) -> Result<AppInfo, Error> {
        debug!("Requesting app and version");

        let resp: AppAndVersionResp = self.request(&AppAndVersionReq {}).await?;

        if resp.format != 1 {
            return Err(Error::UnexpectedResponse);
        }

        Ok(AppInfo {
            app_name: resp.name,
            app_version: resp.version,
        })
    }

    /// Fetch the application name
    pub async fn app_name(&self) -> Result<String, Error> {
        debug!("Requesting app name");

        let resp: AppNameResp = self.request(&GetAppNameReq {}).await?;

        Ok(resp.name)
    }

    /// Fetch the application version
    pub async fn version(&self) -> Result<VersionResp, Error> {
        debug!("Requesting app version");

        self.request(&GetVersionReq {}).await
    }

    /// Fetch the address for a derivation path without user interaction
    pub async fn address(&self, path: &DerivationPath) -> Result<Address, Error> {
        debug!("Requesting address for path: {path}");

        let req = GetAddressReq::new(path.clone(), false);
        let packet = ApduPacket::from_request(&req)?;

        let mut t = self.t.lock().await;
        let data = exchange_packet(&mut *t, &packet, self.cfg.request_timeout()).await?;

        Address::from_response(&data)
    }

    /// Request the device displays the address for a derivation path,
    /// returning a [PendingRequest] resolved once the user approves or
    /// rejects the address
    pub async fn address_with_confirmation(
        &self,
        path: &DerivationPath,
    ) -> Result<PendingRequest<T, Address>, Error> {
        debug!("Requesting address confirmation for path: {path}");

        let req = GetAddressReq::new(path.clone(), true);
        let packet = ApduPacket::from_request(&req)?;

        self.send_packets(vec![packet]).await
    }

    /// Sign a transaction for the provided chain
    ///
    /// All but the final packet are sent immediately, the returned
    /// [PendingRequest] sends the final packet and awaits user approval.
    /// The resulting signature is over [`Transaction::signing_payload`].
    pub async fn sign_tx(
        &self,
        path: &DerivationPath,
        chain_id: ChainId,
        tx: &Transaction,
    ) -> Result<PendingRequest<T, Signature>, Error> {
        debug!(
            "Signing {} transaction ({} bytes, chain: {chain_id}, path: {path})",
            tx.kind(),
            tx.encoded_len()
        );

        if tx.requires_blind_signing() {
            debug!("Transaction requires blind signing to be enabled on the device");
        }

        let packets = sign_tx_packets(path, chain_id, &tx.serialize(), self.cfg.max_chunk_len)?;

        self.send_packets(packets).await
    }

    /// Send a multi-packet request
    ///
    /// Each packet but the last is exchanged in order, the first non-success
    /// status aborts the request without sending the remaining packets. The
    /// final packet is deferred to the returned [PendingRequest].
    pub async fn send_packets<R: FromResponse>(
        &self,
        mut packets: Vec<ApduPacket>,
    ) -> Result<PendingRequest<T, R>, Error> {
        let last = packets.pop().ok_or(Error::EmptyRequest)?;

        let mut t = self.t.clone().lock_owned().await;

        let n = packets.len() + 1;
        for (i, p) in packets.iter().enumerate() {
            debug!("Sending packet {}/{n}", i + 1);

            exchange_packet(&mut *t, p, self.cfg.request_timeout()).await?;
        }

        debug!("Sending packet {n}/{n} on confirmation");

        Ok(PendingRequest::new(t, last, self.cfg.user_timeout()))
    }

    /// Issue a single-packet request and decode the response
    async fn request<REQ, RESP>(&self, req: &REQ) -> Result<RESP, Error>
    where
        REQ: pbc_ledger_apdu::ApduStatic + encdec::Encode<Error = ApduError>,
        RESP: DecodeOwned<Output = RESP, Error = ApduError>,
    {
        let packet = ApduPacket::from_request(req)?;

        let mut t = self.t.lock().await;
        let data = exchange_packet(&mut *t, &packet, self.cfg.request_timeout()).await?;

        let (resp, n) = RESP::decode_owned(&data)?;
        if n != data.len() {
            return Err(Error::UnexpectedResponse);
        }

        Ok(resp)
    }
}

/// Exchange a single packet, splitting the status word from the response
///
/// Non-success status words are returned as [Error::Status] with any
/// response data intact. A request left unanswered is cancelled on the
/// session before [Error::RequestTimeout] is returned.
pub(crate) async fn exchange_packet<T: Session>(
    t: &mut T,
    packet: &ApduPacket,
    timeout: Duration,
) -> Result<Vec<u8>, Error> {
    let cmd = packet.to_bytes();

    trace!("TX: {}", hex::encode(&cmd));

    let mut resp = match t.exchange(&cmd, timeout).await {
        Ok(r) => r,
        Err(TransportError::Timeout) => {
            warn!("No response from device, cancelling request");
            if let Err(e) = t.cancel().await {
                warn!("Failed to cancel pending request: {e}");
            }
            return Err(Error::RequestTimeout);
        }
        Err(e) => return Err(e.into()),
    };

    trace!("RX: {}", hex::encode(&resp));

    let code = StatusWord::from_response(&resp).ok_or(Error::UnexpectedResponse)?;
    resp.truncate(resp.len() - 2);

    if code != StatusWord::Ok as u16 {
        debug!("Device returned {}", StatusWord::describe(code));
        return Err(Error::Status(StatusError { code, data: resp }));
    }

    Ok(resp)
}
