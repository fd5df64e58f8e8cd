// Copyright (c) 2024 Partisia Blockchain

//! APDU status words returned by the application
//!
//! Each response ends with a 2-byte big-endian status word, `0x9000`
//! indicating success.

/// Application status words
#[derive(Copy, Clone, Debug, PartialEq, Eq, num_enum::TryFromPrimitive, strum::Display)]
#[repr(u16)]
pub enum StatusWord {
    /// Success
    Ok = 0x9000,
    /// Rejected by the user
    Deny = 0x6985,
    /// Incorrect P1 or P2 for the instruction
    WrongP1P2 = 0x6a86,
    /// Incorrect data length for the instruction
    WrongDataLength = 0x6a87,
    /// Unsupported instruction
    InsNotSupported = 0x6d00,
    /// Unsupported class
    ClaNotSupported = 0x6e00,
    /// Response exceeded the APDU buffer
    WrongResponseLength = 0xb000,
    /// Failed to render the derivation path
    DisplayBip32PathFail = 0xb001,
    /// Failed to render the address
    DisplayAddressFail = 0xb002,
    /// Failed to render an amount
    DisplayAmountFail = 0xb003,
    /// Transaction length mismatch
    WrongTxLength = 0xb004,
    /// Transaction could not be parsed
    TxParsingFail = 0xb005,
    /// Transaction hashing failed
    TxHashFail = 0xb006,
    /// Command not valid in the current state
    BadState = 0xb007,
    /// Signing failed
    SignatureFail = 0xb008,
    /// Failed to render the chain id
    DisplayChainIdFail = 0xb009,
    /// Transaction stream ended before the transaction was complete
    TxExpectedMore = 0xb00a,
    /// Transaction stream continued after the transaction was complete
    TxExpectedLess = 0xb00b,
    /// Chain id not recognised by the device
    InvalidChainId = 0xb00c,
}

impl StatusWord {
    /// Parse the trailing status word of a response
    pub fn from_response(resp: &[u8]) -> Option<u16> {
        match resp.len() {
            n if n >= 2 => Some(u16::from_be_bytes([resp[n - 2], resp[n - 1]])),
            _ => None,
        }
    }

    /// Describe a raw status word
    pub fn describe(code: u16) -> String {
        match Self::try_from(code) {
            Ok(s) => format!("{s} ({code:#06x})"),
            Err(_) => format!("unknown status ({code:#06x})"),
        }
    }
}

impl From<StatusWord> for u16 {
    fn from(s: StatusWord) -> Self {
        s as u16
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn status_words() {
        assert_eq!(StatusWord::try_from(0x9000).ok(), Some(StatusWord::Ok));
        assert_eq!(StatusWord::try_from(0x6985).ok(), Some(StatusWord::Deny));
        assert_eq!(
            StatusWord::try_from(0xb00b).ok(),
            Some(StatusWord::TxExpectedLess)
        );
        assert!(StatusWord::try_from(0x1234).is_err());
    }

    #[test]
    fn status_from_response() {
        assert_eq!(StatusWord::from_response(&[0x01, 0x90, 0x00]), Some(0x9000));
        assert_eq!(StatusWord::from_response(&[0x6a, 0x86]), Some(0x6a86));
        assert_eq!(StatusWord::from_response(&[0x90]), None);
    }

    #[test]
    fn status_describe() {
        assert_eq!(StatusWord::describe(0x6985), "Deny (0x6985)");
        assert_eq!(StatusWord::describe(0x1234), "unknown status (0x1234)");
    }
}
