// Copyright (c) 2024 Partisia Blockchain

//! Recoverable ECDSA signatures returned by `SIGN_TX`

use encdec::{DecodeOwned, Encode};
use ledger_proto::ApduError;

use crate::Error;

/// Encoded signature length
pub const SIGNATURE_LEN: usize = 65;

/// Recoverable secp256k1 signature
///
/// ## Encoding
///
/// ```text
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |  RECOVERY_ID  |                                               |
/// +-+-+-+-+-+-+-+-+                                               +
/// /                         R (32-byte BE)                        /
/// +               +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |               |                                               |
/// +-+-+-+-+-+-+-+-+                                               +
/// /                         S (32-byte BE)                        /
/// +               +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |               |
/// +-+-+-+-+-+-+-+-+
/// ```
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct Signature {
    recovery_id: u8,
    r: [u8; 32],
    s: [u8; 32],
}

impl Signature {
    /// Create a new signature, checking the recovery id is in `[0, 4)`
    pub fn new(recovery_id: u8, r: [u8; 32], s: [u8; 32]) -> Result<Self, Error> {
        if recovery_id >= 4 {
            return Err(Error::InvalidRecoveryId(recovery_id));
        }

        Ok(Self { recovery_id, r, s })
    }

    /// Recovery id, selecting the candidate public key
    pub fn recovery_id(&self) -> u8 {
        self.recovery_id
    }

    /// R scalar (big-endian)
    pub fn r(&self) -> &[u8; 32] {
        &self.r
    }

    /// S scalar (big-endian)
    pub fn s(&self) -> &[u8; 32] {
        &self.s
    }

    /// Fetch `r || s` as used by ECDSA libraries
    pub fn rs_bytes(&self) -> [u8; 64] {
        let mut b = [0u8; 64];
        b[..32].copy_from_slice(&self.r);
        b[32..].copy_from_slice(&self.s);
        b
    }

    /// Serialize to `recovery_id || r || s`
    pub fn to_bytes(&self) -> [u8; SIGNATURE_LEN] {
        let mut b = [0u8; SIGNATURE_LEN];
        b[0] = self.recovery_id;
        b[1..33].copy_from_slice(&self.r);
        b[33..].copy_from_slice(&self.s);
        b
    }
}

/// Deserialize a signature, input must be exactly [`SIGNATURE_LEN`] bytes
impl TryFrom<&[u8]> for Signature {
    type Error = Error;

    fn try_from(d: &[u8]) -> Result<Self, Self::Error> {
        if d.len() != SIGNATURE_LEN {
            return Err(Error::MalformedSignature(d.len()));
        }

        let mut r = [0u8; 32];
        r.copy_from_slice(&d[1..33]);

        let mut s = [0u8; 32];
        s.copy_from_slice(&d[33..]);

        Self::new(d[0], r, s)
    }
}

impl Encode for Signature {
    type Error = ApduError;

    fn encode_len(&self) -> Result<usize, Self::Error> {
        Ok(SIGNATURE_LEN)
    }

    fn encode(&self, buff: &mut [u8]) -> Result<usize, Self::Error> {
        crate::helpers::write_encoded(&self.to_bytes(), buff)
    }
}

impl DecodeOwned for Signature {
    type Output = Self;

    type Error = ApduError;

    fn decode_owned(buff: &[u8]) -> Result<(Self::Output, usize), Self::Error> {
        let s = Self::try_from(buff)?;
        Ok((s, SIGNATURE_LEN))
    }
}
