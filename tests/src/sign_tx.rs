// Copyright (c) 2024 Partisia Blockchain

//! Transaction signing tests
//!
//! Signatures are checked by recovering the signer from the signature and
//! comparing against the device address for the signing path.

use std::future::Future;

use log::{debug, info};
use rand::Rng;

use pbc_ledger::{
    verify::{self, Signer},
    DeviceHandle, Error, Session,
};
use pbc_ledger_apdu::{
    address::Address,
    chain_id::ChainId,
    chunk::sign_tx_packets,
    p2,
    signature::Signature,
    status::StatusWord,
    tx::{MpcTokenTransfer, Transaction},
};

use crate::vectors::{key_path, TxVector};

/// Sign a transaction vector, approving via `approve` and verifying the
/// resulting signature against the device address
pub async fn test<T, F>(
    d: &DeviceHandle<T>,
    approve: impl Fn() -> F,
    v: &TxVector,
    chain_id: ChainId,
) -> anyhow::Result<Signature>
where
    T: Session,
    F: Future<Output = anyhow::Result<()>>,
{
    info!("Signing '{}' ({chain_id})", v.name);

    sign_and_verify(d, approve, &v.tx, chain_id).await
}

/// Reject a transaction on the device, checking the request is denied
pub async fn test_reject<T, F>(
    d: &DeviceHandle<T>,
    reject: impl Fn() -> F,
    v: &TxVector,
    chain_id: ChainId,
) -> anyhow::Result<()>
where
    T: Session,
    F: Future<Output = anyhow::Result<()>>,
{
    let r = d
        .sign_tx(&key_path(), chain_id, &v.tx)
        .await?
        .confirm(reject())
        .await;

    match r {
        Err(e) if e.is_denied() => Ok(()),
        Err(e) => Err(anyhow::anyhow!("Unexpected error: {e}")),
        Ok(_) => Err(anyhow::anyhow!("Rejected transaction was signed")),
    }
}

/// Sign randomly generated token transfers
pub async fn test_random_transfers<T, F>(
    d: &DeviceHandle<T>,
    approve: impl Fn() -> F,
    n: usize,
) -> anyhow::Result<()>
where
    T: Session,
    F: Future<Output = anyhow::Result<()>>,
{
    for _ in 0..n {
        let (tx, chain_id) = random_transfer()?;

        sign_and_verify(d, &approve, &tx, chain_id).await?;
    }

    Ok(())
}

/// Send a stream that continues after the transaction is complete,
/// checking the device rejects it
pub async fn test_expected_less<T: Session>(
    d: &DeviceHandle<T>,
    v: &TxVector,
    chain_id: ChainId,
) -> anyhow::Result<()> {
    let mut packets = sign_tx_packets(
        &key_path(),
        chain_id,
        &v.tx.serialize(),
        d.config().max_chunk_len,
    )?;

    // Mark the final chunk as not-last
    if let Some(p) = packets.last_mut() {
        p.p2 = p2::NOT_LAST_CHUNK;
    }

    let r = d.send_packets::<Signature>(packets).await?.resolve().await;

    expect_status(r, &[StatusWord::TxExpectedLess])
}

/// Send a stream that ends before the transaction is complete,
/// checking the device rejects it
pub async fn test_expected_more<T: Session>(
    d: &DeviceHandle<T>,
    v: &TxVector,
    chain_id: ChainId,
) -> anyhow::Result<()> {
    let mut packets = sign_tx_packets(
        &key_path(),
        chain_id,
        &v.tx.serialize(),
        d.config().max_chunk_len,
    )?;

    // Drop the final chunk and mark the preceding one as last
    packets.pop();
    if let Some(p) = packets.last_mut() {
        p.p2 = p2::LAST_CHUNK;
    }

    let r = d.send_packets::<Signature>(packets).await?.resolve().await;

    // Single chunk transactions leave only the metadata packet, which
    // may not be the last packet
    expect_status(r, &[StatusWord::TxExpectedMore, StatusWord::WrongP1P2])
}

async fn sign_and_verify<T, F>(
    d: &DeviceHandle<T>,
    approve: impl Fn() -> F,
    tx: &Transaction,
    chain_id: ChainId,
) -> anyhow::Result<Signature>
where
    T: Session,
    F: Future<Output = anyhow::Result<()>>,
{
    let path = key_path();

    let address = d.address(&path).await?;

    let signature = d
        .sign_tx(&path, chain_id, tx)
        .await?
        .confirm(approve())
        .await?;

    debug!("Signature: {}", hex::encode(signature.to_bytes()));

    // Check signer matches the device address
    verify::verify_transaction(tx, chain_id, Signer::Address(&address), &signature)?;

    // Check the recovered key verifies directly
    let public_key = verify::recover_public_key(&tx.signing_payload(chain_id), &signature)?;
    verify::verify_transaction(tx, chain_id, Signer::PublicKey(&public_key), &signature)?;

    // Signatures are bound to the chain
    let other = match chain_id {
        ChainId::Mainnet => ChainId::Testnet,
        ChainId::Testnet => ChainId::Mainnet,
    };
    assert!(
        verify::verify_transaction(tx, other, Signer::Address(&address), &signature).is_err(),
        "signature valid for other chain"
    );

    Ok(signature)
}

/// Generate a displayable token transfer for a random chain
fn random_transfer() -> anyhow::Result<(Transaction, ChainId)> {
    let mut rng = rand::thread_rng();

    let mut recipient: [u8; 21] = rng.gen();
    recipient[0] = 0x00;

    let memo_len = rng.gen_range(0..=20);
    let memo: Vec<u8> = (0..memo_len).map(|_| rng.gen_range(b'a'..=b'z')).collect();

    let t = MpcTokenTransfer::new(Address::new(recipient), rng.gen::<u64>(), &memo[..])?;
    let tx = Transaction::mpc_transfer(rng.gen(), rng.gen(), rng.gen(), t)?;

    let chain_id = match rng.gen::<bool>() {
        true => ChainId::Mainnet,
        false => ChainId::Testnet,
    };

    Ok((tx, chain_id))
}

fn expect_status<R>(r: Result<R, Error>, expected: &[StatusWord]) -> anyhow::Result<()> {
    let code = match r {
        Err(Error::Status(s)) => s.code,
        Err(e) => return Err(anyhow::anyhow!("Unexpected error: {e}")),
        Ok(_) => return Err(anyhow::anyhow!("Malformed stream accepted")),
    };

    match expected.iter().any(|s| *s as u16 == code) {
        true => Ok(()),
        false => Err(anyhow::anyhow!(
            "Unexpected status: {}",
            StatusWord::describe(code)
        )),
    }
}
