// Copyright (c) 2024 Partisia Blockchain

use pbc_ledger::{
    apdu::{
        chunk::{packets_from_contents, sign_tx_metadata},
        prelude::*,
        Instruction,
    },
    Error,
};
use pbc_ledger_tests::{
    sign_tx,
    vectors::{key_path, valid_transactions},
};

mod helpers;
use helpers::*;

#[tokio::test]
async fn stream_continues_after_transaction() -> anyhow::Result<()> {
    let (_s, d) = setup();

    for v in valid_transactions() {
        sign_tx::test_expected_less(&d, &v, ChainId::Mainnet).await?;
    }

    Ok(())
}

#[tokio::test]
async fn stream_ends_before_transaction() -> anyhow::Result<()> {
    let (_s, d) = setup();

    for v in valid_transactions() {
        sign_tx::test_expected_more(&d, &v, ChainId::Testnet).await?;
    }

    Ok(())
}

#[tokio::test]
async fn intermediate_failure_aborts() -> anyhow::Result<()> {
    let (_s, d) = setup();

    // Continuation chunks without a metadata packet fail on the first packet
    let tx = valid_transactions()[4].tx.serialize();
    let chunks = split_message(&tx, 255)?;
    let mut packets = packets_from_contents(Instruction::SignTx, &chunks)?;
    for p in packets.iter_mut() {
        p.p1 = pbc_ledger::apdu::p1::NOT_FIRST_CHUNK;
    }

    let r = d.send_packets::<Signature>(packets).await;
    let e = match r {
        Err(e) => e,
        Ok(_) => panic!("expected failure before the final packet"),
    };
    assert_eq!(e.status_word(), Some(StatusWord::BadState as u16));

    // Device is not left mid-request
    sign_tx::test_expected_less(&d, &valid_transactions()[0], ChainId::Mainnet).await?;

    Ok(())
}

#[tokio::test]
async fn unknown_chain_id() -> anyhow::Result<()> {
    let (_s, d) = setup();

    let mut meta = sign_tx_metadata(&key_path(), ChainId::Mainnet);
    if let Some(b) = meta.last_mut() {
        *b = b'?';
    }

    let tx = valid_transactions()[0].tx.serialize();
    let packets = packets_from_contents(Instruction::SignTx, &[&meta[..], &tx[..]])?;

    let r = d.send_packets::<Signature>(packets).await;
    assert!(matches!(
        r,
        Err(Error::Status(s)) if s.status() == Some(StatusWord::InvalidChainId)
    ));

    Ok(())
}

#[tokio::test]
async fn empty_request() {
    let (_s, d) = setup();

    let r = d.send_packets::<Signature>(vec![]).await;
    assert!(matches!(r, Err(Error::EmptyRequest)));
}
