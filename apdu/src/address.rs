// Copyright (c) 2024 Partisia Blockchain

//! Blockchain addresses
//!
//! Addresses are 21 bytes, a one-byte type tag followed by 20 identifier
//! bytes. Account addresses are derived from a 65-byte uncompressed
//! secp256k1 public key as `0x00 || sha256(public_key)[12..32]`.

use core::{fmt, str::FromStr};

use encdec::{DecodeOwned, Encode};
use ledger_proto::ApduError;
use sha2::{Digest, Sha256};

use crate::Error;

/// Encoded address length
pub const ADDRESS_LEN: usize = 21;

/// Uncompressed secp256k1 public key length
pub const PUBLIC_KEY_LEN: usize = 65;

/// Address type tags
#[derive(Copy, Clone, Debug, PartialEq, num_enum::TryFromPrimitive, strum::Display)]
#[repr(u8)]
pub enum AddressType {
    Account = 0x00,
    SystemContract = 0x01,
    PublicContract = 0x02,
    ZkContract = 0x03,
    GovernanceContract = 0x04,
}

/// Blockchain address
///
/// ## Encoding
///
/// ```text
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |     TYPE      |                                               |
/// +-+-+-+-+-+-+-+-+                                               +
/// /                     IDENTIFIER (20 bytes)                     /
/// +               +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |               |
/// +-+-+-+-+-+-+-+-+
/// ```
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct Address([u8; ADDRESS_LEN]);

/// Address of the MPC token governance contract
pub const MPC_TOKEN_ADDRESS: Address = Address([
    0x01, 0xa4, 0x08, 0x2d, 0x9d, 0x56, 0x07, 0x49, 0xec, 0xd0, 0xff, 0xa1, 0xdc, 0xaa, 0xae,
    0xe2, 0xc2, 0xcb, 0x25, 0xd8, 0x81,
]);

impl Address {
    /// Create an address from raw bytes
    pub const fn new(raw: [u8; ADDRESS_LEN]) -> Self {
        Self(raw)
    }

    /// Derive the account address for an uncompressed public key
    pub fn from_public_key(public_key: &[u8; PUBLIC_KEY_LEN]) -> Self {
        let h = Sha256::digest(public_key);

        let mut raw = [0u8; ADDRESS_LEN];
        raw[0] = AddressType::Account as u8;
        raw[1..].copy_from_slice(&h[12..]);

        Self(raw)
    }

    /// Fetch the address type, if recognised
    pub fn address_type(&self) -> Option<AddressType> {
        AddressType::try_from(self.0[0]).ok()
    }

    /// Fetch raw address bytes
    pub fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
        &self.0
    }
}

impl From<[u8; ADDRESS_LEN]> for Address {
    fn from(raw: [u8; ADDRESS_LEN]) -> Self {
        Self(raw)
    }
}

impl TryFrom<&[u8]> for Address {
    type Error = Error;

    fn try_from(d: &[u8]) -> Result<Self, Self::Error> {
        let raw: [u8; ADDRESS_LEN] = d
            .try_into()
            .map_err(|_| Error::InvalidAddressLength(d.len()))?;
        Ok(Self(raw))
    }
}

impl AsRef<[u8]> for Address {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Parse an address from hex, with or without a `0x` prefix
impl FromStr for Address {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let d = hex::decode(s).map_err(|_| Error::InvalidAddressEncoding)?;
        Self::try_from(&d[..])
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in &self.0[..] {
            write!(f, "{b:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({self})")
    }
}

impl Encode for Address {
    type Error = ApduError;

    fn encode_len(&self) -> Result<usize, Self::Error> {
        Ok(ADDRESS_LEN)
    }

    fn encode(&self, buff: &mut [u8]) -> Result<usize, Self::Error> {
        crate::helpers::write_encoded(&self.0, buff)
    }
}

impl DecodeOwned for Address {
    type Output = Self;

    type Error = ApduError;

    fn decode_owned(buff: &[u8]) -> Result<(Self::Output, usize), Self::Error> {
        if buff.len() < ADDRESS_LEN {
            return Err(ApduError::InvalidLength);
        }

        let mut raw = [0u8; ADDRESS_LEN];
        raw.copy_from_slice(&buff[..ADDRESS_LEN]);

        Ok((Self(raw), ADDRESS_LEN))
    }
}
