// Copyright (c) 2024 Partisia Blockchain

//! Protocol / APDU definitions for Partisia Blockchain app communication
//!
//! This module provides the wire encodings used between a host and the
//! hardware wallet application, as well as the canonical binary encoding of
//! the blockchain objects (addresses, transactions, signatures) that are
//! streamed to the device for signing.
//!
//! Unlike the APDU framing (which is fixed by the device), all blockchain
//! field encodings are big-endian with explicit 4-byte length prefixes for
//! variable length fields, matching the transaction binary format of the
//! chain.
//!
//! ## Signing flow
//!
//! 1. Serialize a [`Transaction`][tx::Transaction]
//! 2. Build packets with [`sign_tx_packets`][chunk::sign_tx_packets], the first
//!    packet carries the derivation path and chain id, the following packets
//!    carry the transaction in windows of at most [`MAX_APDU_LEN`] bytes
//! 3. Send all packets in order, the response to the final packet is delayed
//!    until the user approves or rejects the transaction on the device
//! 4. Decode the [`Signature`][signature::Signature] and verify it against the
//!    [signing payload][tx::Transaction::signing_payload]

pub use ledger_proto::{ApduError, ApduReq, ApduStatic};

pub mod address;
pub mod app_info;
pub mod chain_id;
pub mod chunk;
pub mod get_address;
pub mod path;
pub mod prelude;
pub mod signature;
pub mod status;
pub mod tx;

mod error;
pub use error::Error;

mod helpers;
pub use helpers::encode_vec;

/// Partisia Blockchain APDU Class
pub const PBC_APDU_CLA: u8 = 0xe0;

/// BOLOS APDU class, used for the (vendor reserved) app and version query
pub const BOLOS_APDU_CLA: u8 = 0xb0;

/// Maximum APDU payload length
pub const MAX_APDU_LEN: usize = 255;

/// Partisia Blockchain APDU instruction codes
#[derive(Copy, Clone, Debug, PartialEq, num_enum::TryFromPrimitive, strum::Display)]
#[repr(u8)]
pub enum Instruction {
    /// Fetch application version
    GetVersion = 0x03,

    /// Fetch application name
    GetAppName = 0x04,

    /// Sign a (chunked) transaction
    SignTx = 0x06,

    /// Fetch the blockchain address for a derivation path
    GetAddress = 0x07,
}

/// BOLOS instruction for fetching the name and version of the running app
pub const BOLOS_INS_GET_APP_AND_VERSION: u8 = 0x01;

/// Parameter 1 values
pub mod p1 {
    /// `SIGN_TX`: first chunk of a message
    pub const FIRST_CHUNK: u8 = 0x00;
    /// `SIGN_TX`: continuation chunk
    pub const NOT_FIRST_CHUNK: u8 = 0x01;
    /// `GET_ADDRESS`: return the address without on-screen confirmation
    pub const SILENT: u8 = 0x00;
    /// `GET_ADDRESS`: display the address and await confirmation
    pub const CONFIRM: u8 = 0x01;
}

/// Parameter 2 values
pub mod p2 {
    /// Final chunk of a message
    pub const LAST_CHUNK: u8 = 0x00;
    /// More chunks follow
    pub const NOT_LAST_CHUNK: u8 = 0x80;
}
