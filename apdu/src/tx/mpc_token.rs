// Copyright (c) 2024 Partisia Blockchain

//! MPC token transfer invocations
//!
//! Transfers are RPC payloads for the [MPC token contract][crate::address::MPC_TOKEN_ADDRESS],
//! selected by a one-byte shortname depending on the kind of memo attached.

use crate::{
    address::{Address, ADDRESS_LEN},
    helpers::{check_prefix_len, Reader, Writer},
    Error,
};

/// Shortname of a transfer without memo
pub const SHORTNAME_TRANSFER: u8 = 3;

/// Shortname of a transfer with an inline `u64` memo
pub const SHORTNAME_TRANSFER_MEMO_SMALL: u8 = 13;

/// Shortname of a transfer with a byte-blob memo
pub const SHORTNAME_TRANSFER_MEMO_LARGE: u8 = 23;

/// Transfer memo
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub enum Memo {
    #[default]
    None,
    /// Small integer memo
    Small(u64),
    /// Arbitrary length memo
    Large(Vec<u8>),
}

impl Memo {
    /// Shortname selecting the transfer variant for this memo
    pub fn shortname(&self) -> u8 {
        match self {
            Memo::None => SHORTNAME_TRANSFER,
            Memo::Small(_) => SHORTNAME_TRANSFER_MEMO_SMALL,
            Memo::Large(_) => SHORTNAME_TRANSFER_MEMO_LARGE,
        }
    }

    fn encoded_len(&self) -> usize {
        match self {
            Memo::None => 0,
            Memo::Small(_) => 8,
            Memo::Large(m) => 4 + m.len(),
        }
    }
}

impl From<u64> for Memo {
    fn from(v: u64) -> Self {
        Memo::Small(v)
    }
}

impl From<&[u8]> for Memo {
    fn from(v: &[u8]) -> Self {
        Memo::Large(v.to_vec())
    }
}

/// MPC token transfer RPC payload
///
/// ## Encoding
///
/// ```text
/// SHORTNAME(1) || RECIPIENT(21) || AMOUNT(8, BE) || MEMO
///
/// MEMO := <empty>                   (shortname 3)
///       | VALUE(8, BE)              (shortname 13)
///       | LEN(4, BE) || DATA(LEN)   (shortname 23)
/// ```
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct MpcTokenTransfer {
    recipient: Address,
    token_amount: u64,
    memo: Memo,
}

impl MpcTokenTransfer {
    /// Create a new transfer, failing if a memo is too long to encode
    pub fn new(recipient: Address, token_amount: u64, memo: impl Into<Memo>) -> Result<Self, Error> {
        let memo = memo.into();

        if let Memo::Large(m) = &memo {
            check_prefix_len(m)?;
        }

        Ok(Self {
            recipient,
            token_amount,
            memo,
        })
    }

    /// Recipient of the transferred tokens
    pub fn recipient(&self) -> &Address {
        &self.recipient
    }

    /// Number of tokens transferred
    pub fn token_amount(&self) -> u64 {
        self.token_amount
    }

    /// Attached memo
    pub fn memo(&self) -> &Memo {
        &self.memo
    }

    /// Serialized length
    pub fn encoded_len(&self) -> usize {
        1 + ADDRESS_LEN + 8 + self.memo.encoded_len()
    }

    /// Serialize the transfer invocation
    pub fn serialize(&self) -> Vec<u8> {
        let mut b = Vec::with_capacity(self.encoded_len());
        self.write(&mut Writer(&mut b));
        b
    }

    pub(crate) fn write(&self, w: &mut Writer) {
        w.u8(self.memo.shortname())
            .bytes(self.recipient.as_bytes())
            .u64(self.token_amount);

        match &self.memo {
            Memo::None => (),
            Memo::Small(v) => {
                w.u64(*v);
            }
            Memo::Large(m) => {
                w.prefixed(m);
            }
        }
    }

    /// Decode a transfer invocation, the whole input must be consumed
    pub fn decode(d: &[u8]) -> Result<Self, Error> {
        let mut r = Reader::new(d);

        let shortname = r.u8()?;
        let recipient = Address::from(r.array::<ADDRESS_LEN>()?);
        let token_amount = r.u64()?;

        let memo = match shortname {
            SHORTNAME_TRANSFER => Memo::None,
            SHORTNAME_TRANSFER_MEMO_SMALL => Memo::Small(r.u64()?),
            SHORTNAME_TRANSFER_MEMO_LARGE => Memo::Large(r.prefixed()?.to_vec()),
            _ => return Err(Error::UnknownShortname(shortname)),
        };

        r.finish()?;

        Ok(Self {
            recipient,
            token_amount,
            memo,
        })
    }
}
