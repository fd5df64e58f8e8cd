// Copyright (c) 2024 Partisia Blockchain

//! Address APDUs, for fetching the blockchain address of a derivation path
//!
//! The response is the raw 21-byte [`Address`][crate::address::Address].

use encdec::{DecodeOwned, Encode};

use super::{p1, ApduError, ApduStatic, Instruction, PBC_APDU_CLA};
use crate::path::DerivationPath;

/// Address request APDU
///
/// When `confirm` is set the device displays the address and the response
/// is delayed until the user approves or rejects it.
///
/// ## Encoding:
/// ```text
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |  PATH_COUNT   |             PATH_COMPONENTS...                /
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
#[derive(Clone, PartialEq, Debug)]
pub struct GetAddressReq {
    /// Derivation path for the account key
    pub path: DerivationPath,
    /// Display the address on the device for confirmation
    pub confirm: bool,
}

impl GetAddressReq {
    /// Create a new [`GetAddressReq`] APDU
    pub fn new(path: DerivationPath, confirm: bool) -> Self {
        Self { path, confirm }
    }
}

impl ApduStatic for GetAddressReq {
    const CLA: u8 = PBC_APDU_CLA;
    const INS: u8 = Instruction::GetAddress as u8;

    fn p1(&self) -> u8 {
        match self.confirm {
            true => p1::CONFIRM,
            false => p1::SILENT,
        }
    }
}

impl Encode for GetAddressReq {
    type Error = ApduError;

    fn encode_len(&self) -> Result<usize, Self::Error> {
        self.path.encode_len()
    }

    fn encode(&self, buff: &mut [u8]) -> Result<usize, Self::Error> {
        self.path.encode(buff)
    }
}

/// Decodes the path only, `confirm` is carried by `P1`
impl DecodeOwned for GetAddressReq {
    type Output = Self;

    type Error = ApduError;

    fn decode_owned(buff: &[u8]) -> Result<(Self::Output, usize), Self::Error> {
        let (path, n) = DerivationPath::decode_owned(buff)?;
        Ok((Self::new(path, false), n))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{chunk::ApduPacket, test::encode_decode_apdu};

    #[test]
    fn get_address_req_apdu() {
        let apdu = GetAddressReq::new(DerivationPath::default(), false);

        let mut buff = [0u8; 128];
        encode_decode_apdu(&mut buff, &apdu);
    }

    #[test]
    fn get_address_req_p1() {
        let silent = ApduPacket::from_request(&GetAddressReq::new(DerivationPath::default(), false))
            .unwrap();
        assert_eq!((silent.ins, silent.p1, silent.p2), (0x07, 0x00, 0x00));

        let confirm = ApduPacket::from_request(&GetAddressReq::new(DerivationPath::default(), true))
            .unwrap();
        assert_eq!((confirm.ins, confirm.p1, confirm.p2), (0x07, 0x01, 0x00));
        assert_eq!(confirm.data().len(), 21);
    }
}
