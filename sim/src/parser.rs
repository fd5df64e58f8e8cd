// Copyright (c) 2024 Partisia Blockchain

//! Streaming transaction parser
//!
//! Transactions arrive over any number of `SIGN_TX` chunks. The parser
//! reads the fixed header as soon as it is available to learn the RPC
//! length, then tracks how many bytes remain so that truncated or
//! over-long streams are detected against the chunk markers.

use byteorder::{BigEndian, ByteOrder};

use pbc_ledger_apdu::tx::{Transaction, TX_HEADER_LEN};

/// Parser progress after a chunk
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum ParseStatus {
    /// More bytes are required to complete the transaction
    Continue,
    /// Transaction is complete
    Done,
}

/// Stream parsing failures
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum ParseError {
    /// Chunk carried bytes past the end of the transaction
    #[error("{0} bytes past end of transaction")]
    ExpectedLess(usize),

    /// Completed transaction did not decode
    #[error("malformed transaction: {0}")]
    Malformed(pbc_ledger_apdu::Error),
}

/// Incremental transaction parser
#[derive(Clone, Debug, Default)]
pub struct TxParser {
    buff: Vec<u8>,
    expected: Option<usize>,
}

impl TxParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total transaction length, once the header has been received
    pub fn expected_len(&self) -> Option<usize> {
        self.expected
    }

    /// Bytes received so far
    pub fn received(&self) -> usize {
        self.buff.len()
    }

    /// Feed a chunk to the parser
    pub fn update(&mut self, chunk: &[u8]) -> Result<ParseStatus, ParseError> {
        self.buff.extend_from_slice(chunk);

        if self.expected.is_none() && self.buff.len() >= TX_HEADER_LEN {
            let rpc_len = BigEndian::read_u32(&self.buff[TX_HEADER_LEN - 4..TX_HEADER_LEN]);
            self.expected = Some(TX_HEADER_LEN + rpc_len as usize);
        }

        match self.expected {
            Some(n) if self.buff.len() > n => Err(ParseError::ExpectedLess(self.buff.len() - n)),
            Some(n) if self.buff.len() == n => Ok(ParseStatus::Done),
            _ => Ok(ParseStatus::Continue),
        }
    }

    /// Decode the completed transaction
    pub fn finish(&self) -> Result<Transaction, ParseError> {
        Transaction::decode(&self.buff).map_err(ParseError::Malformed)
    }
}
