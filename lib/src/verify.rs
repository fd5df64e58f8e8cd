// Copyright (c) 2024 Partisia Blockchain

//! Signature verification for device-produced transaction signatures
//!
//! The device signs `sha256(signing_payload)` with the secp256k1 key for
//! the requested derivation path, returning a recoverable signature.
//! Signatures may be checked against a known public key, or (when only
//! the address is trusted) by recovering the public key and comparing the
//! derived address.

use k256::ecdsa::{
    signature::hazmat::PrehashVerifier, RecoveryId, Signature as EcdsaSignature, VerifyingKey,
};
use log::debug;
use sha2::{Digest, Sha256};

use pbc_ledger_apdu::{
    address::{Address, PUBLIC_KEY_LEN},
    chain_id::ChainId,
    signature::Signature,
    tx::Transaction,
};

/// Signature verification errors
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum VerifyError {
    /// r / s are not valid scalars
    #[error("Malformed signature")]
    MalformedSignature,

    /// Public key is not a valid SEC1 encoded secp256k1 point
    #[error("Invalid public key")]
    InvalidPublicKey,

    /// No public key could be recovered from the signature
    #[error("Public key recovery failed")]
    RecoveryFailed,

    /// Signature does not match the public key and payload
    #[error("Signature mismatch")]
    SignatureMismatch,

    /// Recovered signer does not match the expected address
    #[error("Signer mismatch (expected: {expected}, actual: {actual})")]
    AddressMismatch { expected: Address, actual: Address },
}

/// Expected signer for [verify]
#[derive(Clone, Debug, PartialEq)]
pub enum Signer<'a> {
    /// SEC1 encoded public key (compressed or uncompressed)
    PublicKey(&'a [u8]),
    /// Account address, signer is recovered from the signature
    Address(&'a Address),
}

/// Verify a device signature over a transaction for the provided chain
pub fn verify_transaction(
    tx: &Transaction,
    chain_id: ChainId,
    signer: Signer,
    signature: &Signature,
) -> Result<(), VerifyError> {
    verify(&tx.signing_payload(chain_id), signer, signature)
}

/// Verify a signature over `payload` against the expected signer
pub fn verify(payload: &[u8], signer: Signer, signature: &Signature) -> Result<(), VerifyError> {
    match signer {
        Signer::PublicKey(k) => verify_with_public_key(payload, k, signature),
        Signer::Address(a) => verify_with_address(payload, a, signature),
    }
}

/// Verify a signature over `payload` using a known public key
pub fn verify_with_public_key(
    payload: &[u8],
    public_key: &[u8],
    signature: &Signature,
) -> Result<(), VerifyError> {
    let vk = VerifyingKey::from_sec1_bytes(public_key).map_err(|_| VerifyError::InvalidPublicKey)?;

    let (sig, _) = normalize(signature)?;
    let digest = Sha256::digest(payload);

    vk.verify_prehash(&digest, &sig)
        .map_err(|_| VerifyError::SignatureMismatch)
}

/// Recover the uncompressed public key that produced a signature over `payload`
pub fn recover_public_key(
    payload: &[u8],
    signature: &Signature,
) -> Result<[u8; PUBLIC_KEY_LEN], VerifyError> {
    let (sig, recovery_id) = normalize(signature)?;
    let digest = Sha256::digest(payload);

    let vk = VerifyingKey::recover_from_prehash(&digest, &sig, recovery_id)
        .map_err(|_| VerifyError::RecoveryFailed)?;

    let p = vk.to_encoded_point(false);

    let mut public_key = [0u8; PUBLIC_KEY_LEN];
    public_key.copy_from_slice(p.as_bytes());

    Ok(public_key)
}

/// Verify a signature over `payload` by recovering the signer and
/// comparing the derived address with `expected`
pub fn verify_with_address(
    payload: &[u8],
    expected: &Address,
    signature: &Signature,
) -> Result<(), VerifyError> {
    let public_key = recover_public_key(payload, signature)?;
    let actual = Address::from_public_key(&public_key);

    debug!("Recovered signer: {actual}");

    match &actual == expected {
        true => Ok(()),
        false => Err(VerifyError::AddressMismatch {
            expected: *expected,
            actual,
        }),
    }
}

/// Convert to a low-S signature, adjusting the recovery id to match
fn normalize(signature: &Signature) -> Result<(EcdsaSignature, RecoveryId), VerifyError> {
    let sig = EcdsaSignature::from_slice(&signature.rs_bytes())
        .map_err(|_| VerifyError::MalformedSignature)?;
    let id = RecoveryId::from_byte(signature.recovery_id()).ok_or(VerifyError::MalformedSignature)?;

    // Negating s flips the parity of the R point's y coordinate
    match sig.normalize_s() {
        Some(low) => Ok((low, RecoveryId::new(!id.is_y_odd(), id.is_x_reduced()))),
        None => Ok((sig, id)),
    }
}
