// Copyright (c) 2024 Partisia Blockchain

//! Application Information APDUs

use encdec::{DecodeOwned, Encode};

use super::{
    ApduError, ApduStatic, Instruction, BOLOS_APDU_CLA, BOLOS_INS_GET_APP_AND_VERSION,
    PBC_APDU_CLA,
};
use crate::helpers::write_encoded;

/// Declare an empty (zero length) request APDU
macro_rules! empty_req {
    ($(#[$meta:meta])* $name:ident, $cla:expr, $ins:expr) => {
        $(#[$meta])*
        #[derive(Copy, Clone, PartialEq, Debug, Default)]
        pub struct $name {}

        impl ApduStatic for $name {
            const CLA: u8 = $cla;
            const INS: u8 = $ins;
        }

        impl Encode for $name {
            type Error = ApduError;

            fn encode_len(&self) -> Result<usize, Self::Error> {
                Ok(0)
            }

            fn encode(&self, _buff: &mut [u8]) -> Result<usize, Self::Error> {
                Ok(0)
            }
        }

        impl DecodeOwned for $name {
            type Output = Self;

            type Error = ApduError;

            fn decode_owned(_buff: &[u8]) -> Result<(Self::Output, usize), Self::Error> {
                Ok((Self {}, 0))
            }
        }
    };
}

empty_req!(
    /// Fetch application version APDU
    GetVersionReq,
    PBC_APDU_CLA,
    Instruction::GetVersion as u8
);

empty_req!(
    /// Fetch application name APDU
    GetAppNameReq,
    PBC_APDU_CLA,
    Instruction::GetAppName as u8
);

empty_req!(
    /// Fetch the name and version of the running application (BOLOS)
    AppAndVersionReq,
    BOLOS_APDU_CLA,
    BOLOS_INS_GET_APP_AND_VERSION
);

/// Application version response APDU
///
/// ## Encoding
///
/// ```text
///  0                   1                   2
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |     MAJOR     |     MINOR     |     PATCH     |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct VersionResp {
    pub major: u8,
    pub minor: u8,
    pub patch: u8,
}

impl VersionResp {
    pub fn new(major: u8, minor: u8, patch: u8) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }
}

impl core::fmt::Display for VersionResp {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl Encode for VersionResp {
    type Error = ApduError;

    fn encode_len(&self) -> Result<usize, Self::Error> {
        Ok(3)
    }

    fn encode(&self, buff: &mut [u8]) -> Result<usize, Self::Error> {
        write_encoded(&[self.major, self.minor, self.patch], buff)
    }
}

impl DecodeOwned for VersionResp {
    type Output = Self;

    type Error = ApduError;

    fn decode_owned(buff: &[u8]) -> Result<(Self::Output, usize), Self::Error> {
        if buff.len() < 3 {
            return Err(ApduError::InvalidLength);
        }

        Ok((Self::new(buff[0], buff[1], buff[2]), 3))
    }
}

/// Application name response APDU, the whole payload is the UTF-8 name
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct AppNameResp {
    pub name: String,
}

impl AppNameResp {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }
}

impl Encode for AppNameResp {
    type Error = ApduError;

    fn encode_len(&self) -> Result<usize, Self::Error> {
        Ok(self.name.len())
    }

    fn encode(&self, buff: &mut [u8]) -> Result<usize, Self::Error> {
        write_encoded(self.name.as_bytes(), buff)
    }
}

impl DecodeOwned for AppNameResp {
    type Output = Self;

    type Error = ApduError;

    fn decode_owned(buff: &[u8]) -> Result<(Self::Output, usize), Self::Error> {
        let name = core::str::from_utf8(buff).map_err(|_| ApduError::InvalidUtf8)?;
        Ok((Self::new(name), buff.len()))
    }
}

/// Application name and version response APDU (BOLOS)
///
/// ## Encoding
///
/// ```text
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |    FORMAT     |   NAME_LEN    |            NAME...            /
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |  VERSION_LEN  |                  VERSION...                   /
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |   FLAGS_LEN   |                   FLAGS...                    /
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct AppAndVersionResp {
    /// Response format (must be 1)
    pub format: u8,
    /// Application name
    pub name: String,
    /// Application version
    pub version: String,
    /// Device flags
    pub flags: Vec<u8>,
}

impl AppAndVersionResp {
    pub fn new(name: &str, version: &str, flags: &[u8]) -> Self {
        Self {
            format: 1,
            name: name.to_string(),
            version: version.to_string(),
            flags: flags.to_vec(),
        }
    }
}

impl Encode for AppAndVersionResp {
    type Error = ApduError;

    fn encode_len(&self) -> Result<usize, Self::Error> {
        Ok(4 + self.name.len() + self.version.len() + self.flags.len())
    }

    fn encode(&self, buff: &mut [u8]) -> Result<usize, Self::Error> {
        let n = self.encode_len()?;
        if buff.len() < n {
            return Err(ApduError::InvalidLength);
        }

        let mut index = 0;
        buff[index] = self.format;
        index += 1;

        for f in [self.name.as_bytes(), self.version.as_bytes(), &self.flags[..]] {
            if f.len() > u8::MAX as usize {
                return Err(ApduError::InvalidLength);
            }

            buff[index] = f.len() as u8;
            index += 1;

            buff[index..][..f.len()].copy_from_slice(f);
            index += f.len();
        }

        Ok(index)
    }
}

impl DecodeOwned for AppAndVersionResp {
    type Output = Self;

    type Error = ApduError;

    fn decode_owned(buff: &[u8]) -> Result<(Self::Output, usize), Self::Error> {
        let mut index = 0;

        let format = *buff.first().ok_or(ApduError::InvalidLength)?;
        index += 1;

        let mut fields: [&[u8]; 3] = [&[]; 3];
        for f in fields.iter_mut() {
            let n = *buff.get(index).ok_or(ApduError::InvalidLength)? as usize;
            index += 1;

            *f = buff.get(index..index + n).ok_or(ApduError::InvalidLength)?;
            index += n;
        }

        let name = core::str::from_utf8(fields[0]).map_err(|_| ApduError::InvalidUtf8)?;
        let version = core::str::from_utf8(fields[1]).map_err(|_| ApduError::InvalidUtf8)?;

        Ok((
            Self {
                format,
                name: name.to_string(),
                version: version.to_string(),
                flags: fields[2].to_vec(),
            },
            index,
        ))
    }
}
