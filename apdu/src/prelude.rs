// Copyright (c) 2024 Partisia Blockchain

//! Prelude to simplify downstream use of APDU objects
//!

pub use crate::{
    address::{Address, AddressType, MPC_TOKEN_ADDRESS},
    app_info::{
        AppAndVersionReq, AppAndVersionResp, AppNameResp, GetAppNameReq, GetVersionReq,
        VersionResp,
    },
    chain_id::ChainId,
    chunk::{packets_from_contents, sign_tx_packets, split_message, ApduPacket},
    get_address::GetAddressReq,
    path::DerivationPath,
    signature::Signature,
    status::StatusWord,
    tx::{Memo, MpcTokenTransfer, Rpc, Transaction, TransactionKind},
};
