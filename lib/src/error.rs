// Copyright (c) 2024 Partisia Blockchain

use std::fmt;

use pbc_ledger_apdu::{status::StatusWord, ApduError};
use tokio::time::error::Elapsed;

use crate::{transport::TransportError, verify::VerifyError};

/// Device returned a non-success status word
///
/// The status word and any response data are kept verbatim.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusError {
    /// Raw status word
    pub code: u16,
    /// Response data preceding the status word
    pub data: Vec<u8>,
}

impl StatusError {
    /// Fetch the typed status word, if recognised
    pub fn status(&self) -> Option<StatusWord> {
        StatusWord::try_from(self.code).ok()
    }
}

impl fmt::Display for StatusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", StatusWord::describe(self.code))
    }
}

/// Ledger Partisia Blockchain API Error Type
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Transport failure
    #[error("Transport error: {0}")]
    Transport(TransportError),

    /// Device returned an error status
    #[error("Device error: {0}")]
    Status(StatusError),

    /// Request timeout
    #[error("Timeout waiting for device response")]
    RequestTimeout,

    /// Timeout waiting for user
    #[error("Timeout waiting for user interaction")]
    UserTimeout,

    /// Unexpected APDU response
    #[error("Unexpected APDU response")]
    UnexpectedResponse,

    /// APDU encode / decode failure
    #[error("APDU error: {0:?}")]
    Apdu(ApduError),

    /// Invalid protocol object
    #[error(transparent)]
    Codec(#[from] pbc_ledger_apdu::Error),

    /// Signature verification failed
    #[error(transparent)]
    Verify(#[from] VerifyError),

    /// Request contained no packets
    #[error("Empty request")]
    EmptyRequest,

    /// User interaction callback failed
    #[error("User interaction failed: {0}")]
    Interaction(anyhow::Error),
}

impl Error {
    /// Fetch the device status word, if this error originated from the device
    pub fn status_word(&self) -> Option<u16> {
        match self {
            Error::Status(s) => Some(s.code),
            _ => None,
        }
    }

    /// Check whether the request was rejected by the user
    pub fn is_denied(&self) -> bool {
        self.status_word() == Some(StatusWord::Deny as u16)
    }
}

impl From<TransportError> for Error {
    fn from(e: TransportError) -> Self {
        match e {
            TransportError::Timeout => Error::RequestTimeout,
            _ => Error::Transport(e),
        }
    }
}

impl From<ApduError> for Error {
    fn from(e: ApduError) -> Self {
        Error::Apdu(e)
    }
}

impl From<Elapsed> for Error {
    fn from(_: Elapsed) -> Self {
        Error::RequestTimeout
    }
}
