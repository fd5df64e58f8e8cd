// Copyright (c) 2024 Partisia Blockchain

use ledger_proto::ApduError;

/// Construction and codec errors for protocol objects
///
/// These are raised eagerly when an object is built from untrusted input,
/// so a constructed object is always serializable.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum Error {
    /// Address is not exactly [`ADDRESS_LEN`][crate::address::ADDRESS_LEN] bytes
    #[error("invalid address length (expected 21 bytes, got {0})")]
    InvalidAddressLength(usize),

    /// Address is not valid hex
    #[error("invalid address encoding")]
    InvalidAddressEncoding,

    /// Chain identifier is not one of the recognised networks
    #[error("unrecognised chain id: {0:?}")]
    UnknownChainId(String),

    /// Variable length field exceeds the 4-byte length prefix
    #[error("payload too long ({0} bytes)")]
    PayloadTooLong(usize),

    /// Signature is not exactly 65 bytes
    #[error("malformed signature (expected 65 bytes, got {0})")]
    MalformedSignature(usize),

    /// Recovery id outside `[0, 4)`
    #[error("invalid recovery id: {0}")]
    InvalidRecoveryId(u8),

    /// Derivation path could not be parsed or is too long
    #[error("invalid derivation path: {0}")]
    InvalidPath(String),

    /// Packet payload exceeds the maximum APDU length
    #[error("packet payload too long ({0} bytes)")]
    PacketTooLong(usize),

    /// Chunk size must be in `[1, MAX_APDU_LEN]`
    #[error("invalid chunk size: {0}")]
    InvalidChunkSize(usize),

    /// Input ended before the object was complete
    #[error("unexpected end of input")]
    Truncated,

    /// Input continued after the object was complete
    #[error("{0} trailing bytes after object")]
    TrailingBytes(usize),

    /// Unrecognised payload discriminant
    #[error("unknown shortname: {0:#04x}")]
    UnknownShortname(u8),
}

impl From<Error> for ApduError {
    fn from(e: Error) -> Self {
        match e {
            Error::Truncated | Error::PacketTooLong(_) => ApduError::InvalidLength,
            _ => ApduError::InvalidEncoding,
        }
    }
}
