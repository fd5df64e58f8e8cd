// Copyright (c) 2024 Partisia Blockchain

//! Transactions and their canonical binary encoding
//!
//! The serialized transaction body is streamed to the device for signing,
//! the device signs the [signing payload][Transaction::signing_payload]
//! which additionally binds the [`ChainId`].
//!
//! ## Encoding
//!
//! ```text
//!  0                   1                   2                   3
//!  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                         NONCE (u64, BE)                       |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                     VALID_TO_TIME (u64, BE)                   |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                       GAS_COST (u64, BE)                      |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! /                    CONTRACT_ADDRESS (21 bytes)                /
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                        RPC_LEN (u32, BE)                      |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! /                           RPC...                              /
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! ```

use sha2::{Digest, Sha256};

use crate::{
    address::{Address, ADDRESS_LEN, MPC_TOKEN_ADDRESS},
    chain_id::ChainId,
    helpers::{check_prefix_len, Reader, Writer},
    Error,
};

mod mpc_token;
pub use mpc_token::*;

/// Length of the fixed transaction header (everything but the RPC bytes)
pub const TX_HEADER_LEN: usize = 8 + 8 + 8 + ADDRESS_LEN + 4;

/// Transaction RPC payload
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Rpc {
    /// Opaque contract invocation
    Raw(Vec<u8>),
    /// MPC token transfer
    MpcTokenTransfer(MpcTokenTransfer),
}

impl Rpc {
    /// Serialized RPC length
    pub fn encoded_len(&self) -> usize {
        match self {
            Rpc::Raw(d) => d.len(),
            Rpc::MpcTokenTransfer(t) => t.encoded_len(),
        }
    }

    /// Serialize the RPC payload (without length prefix)
    pub fn serialize(&self) -> Vec<u8> {
        match self {
            Rpc::Raw(d) => d.clone(),
            Rpc::MpcTokenTransfer(t) => t.serialize(),
        }
    }
}

impl From<Vec<u8>> for Rpc {
    fn from(d: Vec<u8>) -> Self {
        Rpc::Raw(d)
    }
}

impl From<&[u8]> for Rpc {
    fn from(d: &[u8]) -> Self {
        Rpc::Raw(d.to_vec())
    }
}

impl From<MpcTokenTransfer> for Rpc {
    fn from(t: MpcTokenTransfer) -> Self {
        Rpc::MpcTokenTransfer(t)
    }
}

/// Kind of transaction, determines how the device renders it
#[derive(Copy, Clone, PartialEq, Eq, Debug, strum::Display)]
pub enum TransactionKind {
    /// Arbitrary contract invocation, requires blind signing
    Generic,
    /// MPC token transfer, fully rendered by the device
    MpcTransfer,
}

/// Blockchain transaction
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Transaction {
    nonce: u64,
    valid_to_time: u64,
    gas_cost: u64,
    contract_address: Address,
    rpc: Rpc,
}

impl Transaction {
    /// Create a new transaction, failing if the RPC cannot be length-prefixed
    pub fn new(
        nonce: u64,
        valid_to_time: u64,
        gas_cost: u64,
        contract_address: Address,
        rpc: impl Into<Rpc>,
    ) -> Result<Self, Error> {
        let rpc = rpc.into();

        if let Rpc::Raw(d) = &rpc {
            check_prefix_len(d)?;
        }
        if rpc.encoded_len() > u32::MAX as usize {
            return Err(Error::PayloadTooLong(rpc.encoded_len()));
        }

        Ok(Self {
            nonce,
            valid_to_time,
            gas_cost,
            contract_address,
            rpc,
        })
    }

    /// Create an MPC token transfer transaction
    pub fn mpc_transfer(
        nonce: u64,
        valid_to_time: u64,
        gas_cost: u64,
        transfer: MpcTokenTransfer,
    ) -> Result<Self, Error> {
        Self::new(nonce, valid_to_time, gas_cost, MPC_TOKEN_ADDRESS, transfer)
    }

    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    pub fn valid_to_time(&self) -> u64 {
        self.valid_to_time
    }

    pub fn gas_cost(&self) -> u64 {
        self.gas_cost
    }

    pub fn contract_address(&self) -> &Address {
        &self.contract_address
    }

    pub fn rpc(&self) -> &Rpc {
        &self.rpc
    }

    /// Serialized transaction length
    pub fn encoded_len(&self) -> usize {
        TX_HEADER_LEN + self.rpc.encoded_len()
    }

    /// Serialize the transaction body, as streamed to the device
    pub fn serialize(&self) -> Vec<u8> {
        let mut b = Vec::with_capacity(self.encoded_len());
        self.write(&mut Writer(&mut b));
        b
    }

    /// Build the signing payload, `body || len(chain_id) || chain_id`
    pub fn signing_payload(&self, chain_id: ChainId) -> Vec<u8> {
        let mut b = Vec::with_capacity(self.encoded_len() + chain_id.encoded_len());

        let mut w = Writer(&mut b);
        self.write(&mut w);
        chain_id.write(&mut w);

        b
    }

    /// Compute the SHA-256 digest signed by the device
    pub fn signing_digest(&self, chain_id: ChainId) -> [u8; 32] {
        Sha256::digest(self.signing_payload(chain_id)).into()
    }

    /// Classify the transaction
    pub fn kind(&self) -> TransactionKind {
        match (&self.contract_address, &self.rpc) {
            (a, Rpc::MpcTokenTransfer(_)) if a == &MPC_TOKEN_ADDRESS => TransactionKind::MpcTransfer,
            (a, Rpc::Raw(d)) if a == &MPC_TOKEN_ADDRESS && MpcTokenTransfer::decode(d).is_ok() => {
                TransactionKind::MpcTransfer
            }
            _ => TransactionKind::Generic,
        }
    }

    /// Check whether the device will need blind signing enabled to sign this transaction
    pub fn requires_blind_signing(&self) -> bool {
        self.kind() == TransactionKind::Generic
    }

    /// Decode a serialized transaction body, the whole input must be consumed
    ///
    /// RPC payloads are returned as [`Rpc::Raw`], use [`Transaction::decode_mpc_transfer`]
    /// to interpret token transfers.
    pub fn decode(d: &[u8]) -> Result<Self, Error> {
        let mut r = Reader::new(d);
        let tx = Self::read(&mut r)?;
        r.finish()?;
        Ok(tx)
    }

    /// Decode a signing payload into the transaction and chain id
    pub fn decode_signing_payload(d: &[u8]) -> Result<(Self, ChainId), Error> {
        let mut r = Reader::new(d);
        let tx = Self::read(&mut r)?;
        let chain_id = ChainId::read(&mut r)?;
        r.finish()?;
        Ok((tx, chain_id))
    }

    /// Interpret the RPC payload as an MPC token transfer
    pub fn decode_mpc_transfer(&self) -> Option<MpcTokenTransfer> {
        if self.contract_address != MPC_TOKEN_ADDRESS {
            return None;
        }

        match &self.rpc {
            Rpc::Raw(d) => MpcTokenTransfer::decode(d).ok(),
            Rpc::MpcTokenTransfer(t) => Some(t.clone()),
        }
    }

    fn write(&self, w: &mut Writer) {
        w.u64(self.nonce)
            .u64(self.valid_to_time)
            .u64(self.gas_cost)
            .bytes(self.contract_address.as_bytes());

        match &self.rpc {
            Rpc::Raw(d) => {
                w.prefixed(d);
            }
            Rpc::MpcTokenTransfer(t) => {
                w.u32(t.encoded_len() as u32);
                t.write(w);
            }
        }
    }

    fn read(r: &mut Reader) -> Result<Self, Error> {
        let nonce = r.u64()?;
        let valid_to_time = r.u64()?;
        let gas_cost = r.u64()?;
        let contract_address = Address::from(r.array::<ADDRESS_LEN>()?);
        let rpc = Rpc::Raw(r.prefixed()?.to_vec());

        Ok(Self {
            nonce,
            valid_to_time,
            gas_cost,
            contract_address,
            rpc,
        })
    }
}
