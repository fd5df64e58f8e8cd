// Copyright (c) 2024 Partisia Blockchain

//! Transaction vectors covering chunk boundaries, blind signing and
//! every MPC transfer memo variant

use std::str::FromStr;

use pbc_ledger_apdu::{
    address::{Address, MPC_TOKEN_ADDRESS},
    path::DerivationPath,
    tx::{Memo, MpcTokenTransfer, Transaction},
};

/// Key path used by the test vectors
pub const KEY_PATH: &str = "m/3757'/1'/0'/0/0";

/// Additional paths for address derivation tests
pub const ADDRESS_PATHS: &[&str] = &[
    KEY_PATH,
    "m/3757'/0'/0/0/0",
    "m/3757'/0'/910'/0/0",
    "m/3757'/0'/255/255/255",
    "m/3757'/0'/2147483647/0/0/0/0/0/0/0",
];

/// Generic (non-token) contract used by blind signing vectors
pub const GENERIC_CONTRACT: &str = "01de0b295669a9fd93d5f28d9ec85e40f4cb697bae";

/// Recipient for token transfer vectors
pub const RECIPIENT: &str = "000000000000000000000000000000000000012345";

/// Memo long enough to force a transfer over multiple chunks
pub const LONG_MEMO: &str = "
This is a very long memo.
It will force the app client to send the serialized transaction to be sent in chunk.
As the maximum chunk size is 255 bytes we will make this memo greater than 255 characters.
Lorem ipsum dolor sit amet, consectetur adipiscing elit. Sed non risus. Suspendisse lectus tortor,
dignissim sit amet, adipiscing nec, ultricies sed, dolor. Cras elementum ultrices diam.
";

/// Transaction test vector
#[derive(Clone, Debug)]
pub struct TxVector {
    pub name: &'static str,
    pub tx: Transaction,
    /// Device should show this transaction as a blind signing request
    pub blind: bool,
}

pub fn key_path() -> DerivationPath {
    // Constant path is always valid
    DerivationPath::from_str(KEY_PATH).unwrap()
}

fn address(s: &str) -> Address {
    Address::from_str(s).unwrap()
}

fn generic(rpc: Vec<u8>) -> Transaction {
    Transaction::new(0x111, 0x222, 0x333, address(GENERIC_CONTRACT), rpc).unwrap()
}

fn transfer(base: u64, memo: impl Into<Memo>) -> Transaction {
    let t = MpcTokenTransfer::new(address(RECIPIENT), base + 0x444, memo).unwrap();
    Transaction::mpc_transfer(base + 0x111, base + 0x222, base + 0x333, t).unwrap()
}

/// Transactions shown as blind signing requests
pub fn blind_transactions() -> Vec<TxVector> {
    // Token contract call with the shortname missing from the RPC
    let mut almost = hex::decode(RECIPIENT).unwrap();
    almost.extend_from_slice(&0x333u64.to_be_bytes());

    let ridiculous = {
        let mut m = b"This is a very long memo; just you know way too long, composed almost exclusively by: ".to_vec();
        m.extend(std::iter::repeat(b'A').take(76_500));
        m
    };

    vec![
        TxVector {
            name: "generic",
            tx: generic(vec![0xde, 0xad, 0xbe, 0xef]),
            blind: true,
        },
        TxVector {
            name: "almost_an_mpc_transfer",
            tx: Transaction::new(0x111, 0x222, 0x333, MPC_TOKEN_ADDRESS, almost).unwrap(),
            blind: true,
        },
        TxVector {
            name: "generic_one_chunk",
            tx: generic(vec![0xff; 206]),
            blind: true,
        },
        TxVector {
            name: "generic_over_one_chunk",
            tx: generic(vec![0xff; 207]),
            blind: true,
        },
        TxVector {
            name: "generic_huge",
            // Large enough to span more than 300 chunks
            tx: generic(vec![0xf0; 207 + 255 * 299]),
            blind: true,
        },
        TxVector {
            name: "mpc_memo_large_just_exactly_one_chunk",
            tx: transfer(0x5000, &LONG_MEMO.as_bytes()[..172]),
            blind: true,
        },
        TxVector {
            name: "mpc_memo_large_very",
            tx: transfer(0x6000, LONG_MEMO.as_bytes()),
            blind: true,
        },
        TxVector {
            name: "mpc_memo_large_ridiculous",
            tx: transfer(0x7000, &ridiculous[..]),
            blind: true,
        },
    ]
}

/// Token transfers shown in full
pub fn mpc_transfer_transactions() -> Vec<TxVector> {
    vec![
        TxVector {
            name: "mpc_transfer",
            tx: transfer(0, Memo::None),
            blind: false,
        },
        TxVector {
            name: "mpc_memo_small",
            tx: transfer(0x1000, 1337u64),
            blind: false,
        },
        TxVector {
            name: "mpc_memo_large",
            tx: transfer(0x2000, &b"Hello World"[..]),
            blind: false,
        },
        TxVector {
            name: "mpc_memo_large_empty",
            tx: transfer(0x3000, &b""[..]),
            blind: false,
        },
        TxVector {
            name: "mpc_memo_large_small",
            tx: transfer(0x4000, &b"Hello"[..]),
            blind: false,
        },
    ]
}

/// All valid transactions
pub fn valid_transactions() -> Vec<TxVector> {
    let mut v = blind_transactions();
    v.extend(mpc_transfer_transactions());
    v
}

#[cfg(test)]
mod test {
    use pbc_ledger_apdu::{chain_id::ChainId, chunk::sign_tx_packets, tx::TransactionKind};

    use super::*;

    #[test]
    fn chunk_boundaries() {
        let path = key_path();

        // Metadata packet then transaction chunks
        let count = |tx: &Transaction| {
            sign_tx_packets(&path, ChainId::Mainnet, &tx.serialize(), 255)
                .unwrap()
                .len()
        };

        let v = blind_transactions();
        assert_eq!(v[2].tx.encoded_len(), 255);
        assert_eq!(count(&v[2].tx), 2);
        assert_eq!(count(&v[3].tx), 3);
        assert_eq!(count(&v[4].tx), 302);
    }

    #[test]
    fn transfer_kinds() {
        for v in mpc_transfer_transactions() {
            assert_eq!(v.tx.kind(), TransactionKind::MpcTransfer, "{}", v.name);
        }

        let v = blind_transactions();
        assert_eq!(v[0].tx.kind(), TransactionKind::Generic);
        assert_eq!(v[1].tx.kind(), TransactionKind::Generic);
    }
}
