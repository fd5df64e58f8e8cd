// Copyright (c) 2024 Partisia Blockchain

//! BIP-32 derivation paths, as sent to the device

use core::{fmt, str::FromStr};

use encdec::{DecodeOwned, Encode};
use ledger_proto::ApduError;

use crate::{
    helpers::{write_encoded, Reader, Writer},
    Error,
};

/// Maximum number of path components accepted by the device
pub const MAX_PATH_LEN: usize = 10;

/// Hardened derivation flag
pub const HARDENED: u32 = 1 << 31;

/// Default account path (`m/3757'/1'/0'/0/0`)
pub const DEFAULT_PATH: [u32; 5] = [3757 | HARDENED, 1 | HARDENED, HARDENED, 0, 0];

/// BIP-32 derivation path
///
/// ## Encoding
///
/// ```text
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |     COUNT     |          COMPONENT_0 (u32, BE)                |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |               |          COMPONENT_1 ...                      /
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct DerivationPath(Vec<u32>);

impl DerivationPath {
    /// Create a derivation path from components, at most [`MAX_PATH_LEN`] are permitted
    pub fn new(components: &[u32]) -> Result<Self, Error> {
        if components.len() > MAX_PATH_LEN {
            return Err(Error::InvalidPath(format!(
                "{} components (max {MAX_PATH_LEN})",
                components.len()
            )));
        }

        Ok(Self(components.to_vec()))
    }

    /// Fetch path components
    pub fn components(&self) -> &[u32] {
        &self.0
    }

    /// Encoded length
    pub fn encoded_len(&self) -> usize {
        1 + self.0.len() * 4
    }

    pub(crate) fn write(&self, w: &mut Writer) {
        w.u8(self.0.len() as u8);
        for c in &self.0 {
            w.u32(*c);
        }
    }

    pub(crate) fn read(r: &mut Reader) -> Result<Self, Error> {
        let n = r.u8()? as usize;
        if n > MAX_PATH_LEN {
            return Err(Error::InvalidPath(format!(
                "{n} components (max {MAX_PATH_LEN})"
            )));
        }

        let mut c = Vec::with_capacity(n);
        for _ in 0..n {
            c.push(r.u32()?);
        }

        Ok(Self(c))
    }
}

impl Default for DerivationPath {
    fn default() -> Self {
        Self(DEFAULT_PATH.to_vec())
    }
}

/// Parse a path of the form `m/44'/3757'/0'/0/0`
///
/// Hardened components may be marked with `'` or `h`.
impl FromStr for DerivationPath {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.trim().split('/');

        if parts.next() != Some("m") {
            return Err(Error::InvalidPath(s.to_string()));
        }

        let mut c = vec![];
        for p in parts {
            let (v, hardened) = match p.strip_suffix(['\'', 'h']) {
                Some(v) => (v, true),
                None => (p, false),
            };

            let v = v
                .parse::<u32>()
                .map_err(|_| Error::InvalidPath(s.to_string()))?;
            if v & HARDENED != 0 {
                return Err(Error::InvalidPath(s.to_string()));
            }

            c.push(if hardened { v | HARDENED } else { v });
        }

        Self::new(&c)
    }
}

impl fmt::Display for DerivationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "m")?;
        for c in &self.0 {
            match c & HARDENED != 0 {
                true => write!(f, "/{}'", c & !HARDENED)?,
                false => write!(f, "/{c}")?,
            }
        }
        Ok(())
    }
}

impl fmt::Debug for DerivationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DerivationPath({self})")
    }
}

impl Encode for DerivationPath {
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

impl DecodeOwned for DerivationPath {
    type Output = Self;

    type Error = ApduError;

    fn decode_owned(buff: &[u8]) -> Result<(Self::Output, usize), Self::Error> {
        let mut r = Reader::new(buff);
        let p = Self::read(&mut r)?;
        Ok((p, r.offset()))
    }
}
