// Copyright (c) 2024 Partisia Blockchain

//! Big-endian read / write helpers for the transaction binary format

use byteorder::{BigEndian, ByteOrder};
use encdec::Encode;

use crate::Error;

/// Append-only writer over a byte vector
pub(crate) struct Writer<'a>(pub &'a mut Vec<u8>);

impl<'a> Writer<'a> {
    pub fn u8(&mut self, v: u8) -> &mut Self {
        self.0.push(v);
        self
    }

    pub fn u32(&mut self, v: u32) -> &mut Self {
        let mut b = [0u8; 4];
        BigEndian::write_u32(&mut b, v);
        self.0.extend_from_slice(&b);
        self
    }

    pub fn u64(&mut self, v: u64) -> &mut Self {
        let mut b = [0u8; 8];
        BigEndian::write_u64(&mut b, v);
        self.0.extend_from_slice(&b);
        self
    }

    pub fn bytes(&mut self, d: &[u8]) -> &mut Self {
        self.0.extend_from_slice(d);
        self
    }

    /// Write a 4-byte length prefix followed by the provided data.
    ///
    /// Callers must have checked `d.len()` fits in a `u32` at construction.
    pub fn prefixed(&mut self, d: &[u8]) -> &mut Self {
        self.u32(d.len() as u32).bytes(d)
    }
}

/// Cursor over an input buffer
pub(crate) struct Reader<'a> {
    buff: &'a [u8],
    index: usize,
}

impl<'a> Reader<'a> {
    pub fn new(buff: &'a [u8]) -> Self {
        Self { buff, index: 0 }
    }

    /// Number of bytes consumed
    pub fn offset(&self) -> usize {
        self.index
    }

    /// Number of bytes remaining
    pub fn remaining(&self) -> usize {
        self.buff.len() - self.index
    }

    pub fn bytes(&mut self, n: usize) -> Result<&'a [u8], Error> {
        if self.remaining() < n {
            return Err(Error::Truncated);
        }

        let d = &self.buff[self.index..][..n];
        self.index += n;

        Ok(d)
    }

    pub fn array<const N: usize>(&mut self) -> Result<[u8; N], Error> {
        let mut d = [0u8; N];
        d.copy_from_slice(self.bytes(N)?);
        Ok(d)
    }

    pub fn u8(&mut self) -> Result<u8, Error> {
        Ok(self.bytes(1)?[0])
    }

    pub fn u32(&mut self) -> Result<u32, Error> {
        Ok(BigEndian::read_u32(self.bytes(4)?))
    }

    pub fn u64(&mut self) -> Result<u64, Error> {
        Ok(BigEndian::read_u64(self.bytes(8)?))
    }

    /// Read a 4-byte length prefix and the following data
    pub fn prefixed(&mut self) -> Result<&'a [u8], Error> {
        let n = self.u32()? as usize;
        self.bytes(n)
    }

    /// Check the whole input has been consumed
    pub fn finish(&self) -> Result<(), Error> {
        match self.remaining() {
            0 => Ok(()),
            n => Err(Error::TrailingBytes(n)),
        }
    }
}

/// Check a variable length field fits the 4-byte length prefix
pub(crate) fn check_prefix_len(d: &[u8]) -> Result<(), Error> {
    if d.len() > u32::MAX as usize {
        return Err(Error::PayloadTooLong(d.len()));
    }
    Ok(())
}

/// Copy serialized bytes into an encdec output buffer
pub(crate) fn write_encoded(d: &[u8], buff: &mut [u8]) -> Result<usize, ledger_proto::ApduError> {
    if buff.len() < d.len() {
        return Err(ledger_proto::ApduError::InvalidLength);
    }

    buff[..d.len()].copy_from_slice(d);

    Ok(d.len())
}

/// Encode an object into a newly allocated buffer
pub fn encode_vec<E: Encode>(v: &E) -> Result<Vec<u8>, E::Error> {
    let mut buff = vec![0u8; v.encode_len()?];
    let n = v.encode(&mut buff)?;
    buff.truncate(n);
    Ok(buff)
}
