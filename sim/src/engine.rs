// Copyright (c) 2024 Partisia Blockchain

//! Simulated application engine
//!
//! Handles raw APDUs the way the ledger application does, returning either
//! an immediate response or a [Prompt] that must be decided by the user
//! before the response is released.

use std::str::FromStr;

use bip32::{Language, Mnemonic, XPrv};
use encdec::DecodeOwned;
use k256::ecdsa::SigningKey;
use log::{debug, trace, warn};
use sha2::{Digest, Sha256};

use pbc_ledger_apdu::{
    address::{Address, PUBLIC_KEY_LEN},
    app_info::{AppAndVersionResp, AppNameResp, VersionResp},
    chain_id::ChainId,
    chunk::ApduPacket,
    encode_vec, p1, p2,
    path::DerivationPath,
    signature::Signature,
    status::StatusWord,
    tx::{Memo, Transaction},
    Instruction, BOLOS_APDU_CLA, BOLOS_INS_GET_APP_AND_VERSION, PBC_APDU_CLA,
};

use crate::{
    parser::{ParseError, ParseStatus, TxParser},
    Options,
};

/// Response APDU, `data || status`
#[derive(Clone, Debug, PartialEq)]
pub struct Response {
    pub data: Vec<u8>,
    pub status: StatusWord,
}

impl Response {
    fn ok(data: Vec<u8>) -> Self {
        Self {
            data,
            status: StatusWord::Ok,
        }
    }

    fn status(status: StatusWord) -> Self {
        Self {
            data: vec![],
            status,
        }
    }

    /// Encode to the raw response frame
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut b = self.data.clone();
        b.extend_from_slice(&(self.status as u16).to_be_bytes());
        b
    }
}

/// Longest memo a transfer may carry without requiring blind signing
pub const MEMO_MAX_DISPLAY_LEN: usize = 20;

/// Request awaiting a user decision
#[derive(Clone, Debug, PartialEq)]
pub enum Prompt {
    /// Confirm a derived address
    Address(Address),
    /// Sign a transaction digest
    Sign {
        chain_id: ChainId,
        digest: [u8; 32],
        /// Transaction contents cannot be shown to the user
        blind: bool,
    },
}

impl Prompt {
    /// Check whether approval requires blind signing
    pub fn is_blind(&self) -> bool {
        matches!(self, Prompt::Sign { blind: true, .. })
    }
}

/// User decision completing a [Prompt]
#[derive(Copy, Clone, Debug, PartialEq, strum::Display, strum::EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Decision {
    Approve,
    Reject,
}

/// Result of handling an APDU
#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    /// Respond immediately
    Respond(Response),
    /// Respond once the user decides
    Prompt(Prompt),
}

impl From<StatusWord> for Outcome {
    fn from(s: StatusWord) -> Self {
        Outcome::Respond(Response::status(s))
    }
}

/// Signing request in progress
struct SignContext {
    path: DerivationPath,
    chain_id: ChainId,
    parser: TxParser,
    hasher: Sha256,
}

/// Operation awaiting approval
enum Approval {
    Address(Address),
    Sign {
        path: DerivationPath,
        digest: [u8; 32],
        blind: bool,
    },
}

/// Application state
#[derive(Default)]
enum State {
    #[default]
    Idle,
    Signing(Box<SignContext>),
    Review(Approval),
}

/// Simulated application
pub struct Engine {
    opts: Options,
    seed: [u8; 64],
    state: State,
}

impl Engine {
    /// Create a new engine, deriving the wallet seed from the configured mnemonic
    pub fn new(opts: Options) -> anyhow::Result<Self> {
        let m = Mnemonic::new(opts.mnemonic.trim(), Language::English)
            .map_err(|e| anyhow::anyhow!("Invalid mnemonic: {e}"))?;
        let seed = *m.to_seed("").as_bytes();

        Ok(Self {
            opts,
            seed,
            state: State::Idle,
        })
    }

    /// Derive the signing key for a path
    pub fn signing_key(&self, path: &DerivationPath) -> anyhow::Result<SigningKey> {
        let p = bip32::DerivationPath::from_str(&path.to_string())?;
        let k = XPrv::derive_from_path(self.seed, &p)?;
        Ok(k.private_key().clone())
    }

    /// Derive the address for a path
    pub fn address(&self, path: &DerivationPath) -> anyhow::Result<Address> {
        let k = self.signing_key(path)?;

        let p = k.verifying_key().to_encoded_point(false);
        let public_key: &[u8; PUBLIC_KEY_LEN] = p.as_bytes().try_into()?;

        Ok(Address::from_public_key(public_key))
    }

    /// Abort any operation in progress
    pub fn reset(&mut self) {
        if !matches!(self.state, State::Idle) {
            debug!("Resetting engine state");
        }
        self.state = State::Idle;
    }

    /// Check whether a review is awaiting the user
    pub fn is_reviewing(&self) -> bool {
        matches!(self.state, State::Review(_))
    }

    /// Handle a raw command APDU
    pub fn handle(&mut self, command: &[u8]) -> Outcome {
        let apdu = match ApduPacket::parse(command) {
            Ok(a) => a,
            Err(e) => {
                warn!("Malformed APDU: {e}");
                return StatusWord::WrongDataLength.into();
            }
        };

        trace!(
            "APDU cla: {:#04x} ins: {:#04x} p1: {:#04x} p2: {:#04x} ({} bytes)",
            apdu.cla,
            apdu.ins,
            apdu.p1,
            apdu.p2,
            apdu.data().len()
        );

        if self.is_reviewing() {
            warn!("Command received during review, aborting review");
            self.reset();
        }

        if apdu.cla == BOLOS_APDU_CLA && apdu.ins == BOLOS_INS_GET_APP_AND_VERSION {
            return self.app_and_version();
        }

        if apdu.cla != PBC_APDU_CLA {
            return StatusWord::ClaNotSupported.into();
        }

        match Instruction::try_from(apdu.ins) {
            Ok(Instruction::GetVersion) => self.version(&apdu),
            Ok(Instruction::GetAppName) => self.app_name(&apdu),
            Ok(Instruction::GetAddress) => self.get_address(&apdu),
            Ok(Instruction::SignTx) => self.sign_tx(&apdu),
            Err(_) => StatusWord::InsNotSupported.into(),
        }
    }

    /// Complete the active review with approval
    ///
    /// Blind transactions are denied unless blind signing is enabled.
    pub fn approve(&mut self) -> Response {
        let approval = match std::mem::take(&mut self.state) {
            State::Review(a) => a,
            _ => return Response::status(StatusWord::BadState),
        };

        match approval {
            Approval::Address(a) => Response::ok(a.as_bytes().to_vec()),
            Approval::Sign { blind: true, .. } if !self.opts.allow_blind_signing => {
                warn!("Blind signing not enabled, denying request");
                Response::status(StatusWord::Deny)
            }
            Approval::Sign { path, digest, .. } => match self.sign(&path, &digest) {
                Ok(s) => Response::ok(s.to_bytes().to_vec()),
                Err(e) => {
                    warn!("Signing failed: {e:?}");
                    Response::status(StatusWord::SignatureFail)
                }
            },
        }
    }

    /// Complete the active review with rejection
    pub fn reject(&mut self) -> Response {
        match std::mem::take(&mut self.state) {
            State::Review(_) => Response::status(StatusWord::Deny),
            _ => Response::status(StatusWord::BadState),
        }
    }

    fn app_and_version(&self) -> Outcome {
        let (major, minor, patch) = self.opts.version;
        let version = format!("{major}.{minor}.{patch}");

        let resp = AppAndVersionResp::new(&self.opts.app_name, &version, &[0x00]);
        respond_with(encode_vec(&resp))
    }

    fn version(&self, apdu: &ApduPacket) -> Outcome {
        if apdu.p1 != 0 || apdu.p2 != 0 {
            return StatusWord::WrongP1P2.into();
        }

        let (major, minor, patch) = self.opts.version;
        respond_with(encode_vec(&VersionResp::new(major, minor, patch)))
    }

    fn app_name(&self, apdu: &ApduPacket) -> Outcome {
        if apdu.p1 != 0 || apdu.p2 != 0 {
            return StatusWord::WrongP1P2.into();
        }

        respond_with(encode_vec(&AppNameResp::new(&self.opts.app_name)))
    }

    fn get_address(&mut self, apdu: &ApduPacket) -> Outcome {
        if apdu.p1 > p1::CONFIRM || apdu.p2 != 0 {
            return StatusWord::WrongP1P2.into();
        }

        let path = match read_path(apdu.data()) {
            Some(p) => p,
            None => return StatusWord::WrongDataLength.into(),
        };

        let address = match self.address(&path) {
            Ok(a) => a,
            Err(e) => {
                warn!("Address derivation failed: {e:?}");
                return StatusWord::DisplayAddressFail.into();
            }
        };

        debug!("Address for {path}: {address}");

        if apdu.p1 == p1::SILENT {
            return Outcome::Respond(Response::ok(address.as_bytes().to_vec()));
        }

        self.state = State::Review(Approval::Address(address));
        Outcome::Prompt(Prompt::Address(address))
    }

    fn sign_tx(&mut self, apdu: &ApduPacket) -> Outcome {
        if apdu.p1 == p1::FIRST_CHUNK && apdu.p2 != p2::NOT_LAST_CHUNK {
            return StatusWord::WrongP1P2.into();
        }
        if apdu.p1 > p1::NOT_FIRST_CHUNK
            || (apdu.p2 != p2::LAST_CHUNK && apdu.p2 != p2::NOT_LAST_CHUNK)
        {
            return StatusWord::WrongP1P2.into();
        }
        if apdu.data().is_empty() {
            return StatusWord::WrongDataLength.into();
        }

        match apdu.is_first() {
            true => self.sign_tx_init(apdu.data()),
            false => self.sign_tx_chunk(apdu.data(), apdu.has_more()),
        }
    }

    fn sign_tx_init(&mut self, data: &[u8]) -> Outcome {
        self.reset();

        let (path, n) = match DerivationPath::decode_owned(data) {
            Ok(v) => v,
            Err(_) => return StatusWord::WrongDataLength.into(),
        };

        let chain_id = match ChainId::decode_owned(&data[n..]) {
            Ok((c, m)) if n + m == data.len() => c,
            _ => return StatusWord::InvalidChainId.into(),
        };

        debug!("Signing init (path: {path}, chain: {chain_id})");

        self.state = State::Signing(Box::new(SignContext {
            path,
            chain_id,
            parser: TxParser::new(),
            hasher: Sha256::new(),
        }));

        StatusWord::Ok.into()
    }

    fn sign_tx_chunk(&mut self, data: &[u8], more: bool) -> Outcome {
        let mut ctx = match std::mem::take(&mut self.state) {
            State::Signing(ctx) => ctx,
            _ => return StatusWord::BadState.into(),
        };

        let status = match ctx.parser.update(data) {
            Ok(s) => s,
            Err(ParseError::ExpectedLess(n)) => {
                warn!("Transaction overran by {n} bytes");
                return StatusWord::TxExpectedLess.into();
            }
            Err(e) => {
                warn!("Transaction parsing failed: {e}");
                return StatusWord::TxParsingFail.into();
            }
        };

        match (status, more) {
            (ParseStatus::Continue, false) => {
                warn!(
                    "Transaction ended early ({} of {:?} bytes)",
                    ctx.parser.received(),
                    ctx.parser.expected_len()
                );
                return StatusWord::TxExpectedMore.into();
            }
            (ParseStatus::Done, true) => {
                warn!("Transaction complete with more chunks pending");
                return StatusWord::TxExpectedLess.into();
            }
            _ => (),
        }

        ctx.hasher.update(data);

        if more {
            self.state = State::Signing(ctx);
            return StatusWord::Ok.into();
        }

        let SignContext {
            path,
            chain_id,
            parser,
            mut hasher,
        } = *ctx;

        let tx = match parser.finish() {
            Ok(tx) => tx,
            Err(e) => {
                warn!("Transaction parsing failed: {e}");
                return StatusWord::TxParsingFail.into();
            }
        };

        let chain = chain_id.as_bytes();
        hasher.update((chain.len() as u32).to_be_bytes());
        hasher.update(chain);
        let digest: [u8; 32] = hasher.finalize().into();

        debug!(
            "Transaction complete ({} tx, digest: {})",
            tx.kind(),
            hex::encode(digest)
        );

        let blind = requires_blind_signing(&tx);
        if blind {
            debug!("Transaction cannot be displayed, blind signing required");
        }

        self.state = State::Review(Approval::Sign {
            path,
            digest,
            blind,
        });

        Outcome::Prompt(Prompt::Sign {
            chain_id,
            digest,
            blind,
        })
    }

    fn sign(&self, path: &DerivationPath, digest: &[u8; 32]) -> anyhow::Result<Signature> {
        let k = self.signing_key(path)?;

        let (sig, recid) = k.sign_prehash_recoverable(digest)?;

        let b = sig.to_bytes();
        let mut r = [0u8; 32];
        r.copy_from_slice(&b[..32]);
        let mut s = [0u8; 32];
        s.copy_from_slice(&b[32..]);

        Ok(Signature::new(recid.to_byte(), r, s)?)
    }
}

/// Only token transfers with short memos can be reviewed in full
fn requires_blind_signing(tx: &Transaction) -> bool {
    match tx.decode_mpc_transfer() {
        Some(t) => matches!(t.memo(), Memo::Large(d) if d.len() > MEMO_MAX_DISPLAY_LEN),
        None => true,
    }
}

/// Read a derivation path, the whole input must be consumed
fn read_path(data: &[u8]) -> Option<DerivationPath> {
    match DerivationPath::decode_owned(data) {
        Ok((p, n)) if n == data.len() => Some(p),
        _ => None,
    }
}

fn respond_with<E>(r: Result<Vec<u8>, E>) -> Outcome {
    match r {
        Ok(d) => Outcome::Respond(Response::ok(d)),
        Err(_) => StatusWord::WrongResponseLength.into(),
    }
}
