// Copyright (c) 2024 Partisia Blockchain

//! Network / chain identifiers
//!
//! The chain id is appended to the signing payload (but not to the
//! serialized transaction) so signatures cannot be replayed across networks.

use core::{fmt, str::FromStr};

use encdec::{DecodeOwned, Encode};
use ledger_proto::ApduError;

use crate::{
    helpers::{write_encoded, Reader, Writer},
    Error,
};

/// Maximum chain id length accepted by the device
pub const CHAIN_ID_MAX_LEN: usize = 32;

/// Recognised chain identifiers
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash, strum::EnumIter)]
pub enum ChainId {
    /// Production network
    Mainnet,
    /// Public test network
    Testnet,
}

impl ChainId {
    /// Fetch the chain id tag as signed and sent to the device
    pub const fn as_bytes(&self) -> &'static [u8] {
        match self {
            ChainId::Mainnet => b"Partisia Blockchain",
            ChainId::Testnet => b"Partisia Blockchain Testnet",
        }
    }

    /// Write `len(chain_id)(4) || chain_id`
    pub(crate) fn write(&self, w: &mut Writer) {
        w.prefixed(self.as_bytes());
    }

    /// Read `len(chain_id)(4) || chain_id`
    pub(crate) fn read(r: &mut Reader) -> Result<Self, Error> {
        let d = r.prefixed()?;
        Self::try_from(d)
    }

    /// Encoded length including the 4-byte length prefix
    pub fn encoded_len(&self) -> usize {
        4 + self.as_bytes().len()
    }
}

/// Parse a chain id from its tag bytes
impl TryFrom<&[u8]> for ChainId {
    type Error = Error;

    fn try_from(d: &[u8]) -> Result<Self, Self::Error> {
        match d {
            b"Partisia Blockchain" => Ok(ChainId::Mainnet),
            b"Partisia Blockchain Testnet" => Ok(ChainId::Testnet),
            _ => Err(Error::UnknownChainId(
                String::from_utf8_lossy(d).into_owned(),
            )),
        }
    }
}

/// Parse a chain id from its tag or short name (`mainnet`, `testnet`)
impl FromStr for ChainId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mainnet" => Ok(ChainId::Mainnet),
            "testnet" => Ok(ChainId::Testnet),
            _ => Self::try_from(s.as_bytes()),
        }
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(self.as_bytes()))
    }
}

impl Encode for ChainId {
    type Error = ApduError;

    fn encode_len(&self) -> Result<usize, Self::Error> {
        Ok(self.encoded_len())
    }

    fn encode(&self, buff: &mut [u8]) -> Result<usize, Self::Error> {
        let mut b = Vec::with_capacity(self.encoded_len());
        self.write(&mut Writer(&mut b));
        write_encoded(&b, buff)
    }
}

impl DecodeOwned for ChainId {
    type Output = Self;

    type Error = ApduError;

    fn decode_owned(buff: &[u8]) -> Result<(Self::Output, usize), Self::Error> {
        let mut r = Reader::new(buff);
        let c = Self::read(&mut r)?;
        Ok((c, r.offset()))
    }
}

#[cfg(test)]
mod test {
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn chain_id_tags() {
        for c in ChainId::iter() {
            assert_eq!(ChainId::try_from(c.as_bytes()), Ok(c));
            assert_eq!(ChainId::from_str(&c.to_string()), Ok(c));
            assert!(c.as_bytes().len() <= CHAIN_ID_MAX_LEN);
        }

        assert_eq!(ChainId::from_str("Testnet"), Ok(ChainId::Testnet));
        assert_eq!(ChainId::from_str("MAINNET"), Ok(ChainId::Mainnet));
    }

    #[test]
    fn chain_id_unknown() {
        assert_eq!(
            ChainId::try_from(&b"Partisia Blockchain Devnet"[..]),
            Err(Error::UnknownChainId("Partisia Blockchain Devnet".to_string()))
        );
        assert!(ChainId::from_str("").is_err());
    }

    #[test]
    fn chain_id_apdu() {
        let mut buff = [0u8; 64];
        let n = crate::test::encode_decode_apdu(&mut buff, &ChainId::Testnet);
        assert_eq!(&buff[..4], &[0, 0, 0, 27]);
        assert_eq!(n, 31);
    }
}
