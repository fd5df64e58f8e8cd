// Copyright (c) 2024 Partisia Blockchain

//! Chunk splitting and APDU packet framing for multi-packet messages
//!
//! Messages longer than [`MAX_APDU_LEN`] are cut into fixed size windows,
//! each sent as one APDU with `P1` / `P2` markers describing the position of
//! the chunk within the message.

use encdec::Encode;
use ledger_proto::{ApduError, ApduStatic};

use crate::{
    chain_id::ChainId,
    helpers::Writer,
    p1, p2,
    path::DerivationPath,
    Error, Instruction, MAX_APDU_LEN, PBC_APDU_CLA,
};

/// Split a message into windows of at most `max` bytes
///
/// Every chunk is exactly `max` bytes except the last, an empty message
/// yields a single empty chunk so a first-chunk marker is still sent.
pub fn split_message(msg: &[u8], max: usize) -> Result<Vec<&[u8]>, Error> {
    if max == 0 || max > MAX_APDU_LEN {
        return Err(Error::InvalidChunkSize(max));
    }

    if msg.is_empty() {
        return Ok(vec![msg]);
    }

    Ok(msg.chunks(max).collect())
}

/// Single wire-level APDU packet
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ApduPacket {
    pub cla: u8,
    pub ins: u8,
    pub p1: u8,
    pub p2: u8,
    data: Vec<u8>,
}

impl ApduPacket {
    /// Create a new packet, failing if the payload exceeds [`MAX_APDU_LEN`]
    pub fn new(cla: u8, ins: u8, p1: u8, p2: u8, data: Vec<u8>) -> Result<Self, Error> {
        if data.len() > MAX_APDU_LEN {
            return Err(Error::PacketTooLong(data.len()));
        }

        Ok(Self {
            cla,
            ins,
            p1,
            p2,
            data,
        })
    }

    /// Build a packet from an encodable APDU request object
    pub fn from_request<R: ApduStatic + Encode<Error = ApduError>>(
        req: &R,
    ) -> Result<Self, ApduError> {
        let mut data = vec![0u8; req.encode_len()?];
        let n = req.encode(&mut data)?;
        data.truncate(n);

        Self::new(R::CLA, R::INS, req.p1(), req.p2(), data).map_err(ApduError::from)
    }

    /// Packet payload
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Serialize to `CLA || INS || P1 || P2 || LC || DATA`
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut b = Vec::with_capacity(5 + self.data.len());
        b.extend_from_slice(&[self.cla, self.ins, self.p1, self.p2, self.data.len() as u8]);
        b.extend_from_slice(&self.data);
        b
    }

    /// Parse a serialized packet
    pub fn parse(d: &[u8]) -> Result<Self, Error> {
        if d.len() < 5 {
            return Err(Error::Truncated);
        }

        let n = d[4] as usize;
        match d.len() - 5 {
            m if m < n => return Err(Error::Truncated),
            m if m > n => return Err(Error::TrailingBytes(m - n)),
            _ => (),
        }

        Self::new(d[0], d[1], d[2], d[3], d[5..].to_vec())
    }

    /// Check whether this is the first chunk of a message
    pub fn is_first(&self) -> bool {
        self.p1 == p1::FIRST_CHUNK
    }

    /// Check whether more chunks follow this one
    pub fn has_more(&self) -> bool {
        self.p2 == p2::NOT_LAST_CHUNK
    }
}

/// Frame an ordered sequence of contents as one multi-packet message
///
/// The first packet is marked [`p1::FIRST_CHUNK`], the rest
/// [`p1::NOT_FIRST_CHUNK`]. All but the final packet are marked
/// [`p2::NOT_LAST_CHUNK`].
pub fn packets_from_contents<T: AsRef<[u8]>>(
    ins: Instruction,
    contents: &[T],
) -> Result<Vec<ApduPacket>, Error> {
    let n = contents.len();

    contents
        .iter()
        .enumerate()
        .map(|(i, c)| {
            let p1 = match i {
                0 => p1::FIRST_CHUNK,
                _ => p1::NOT_FIRST_CHUNK,
            };
            let p2 = match i + 1 == n {
                true => p2::LAST_CHUNK,
                false => p2::NOT_LAST_CHUNK,
            };

            ApduPacket::new(PBC_APDU_CLA, ins as u8, p1, p2, c.as_ref().to_vec())
        })
        .collect()
}

/// Build the metadata packet contents for a signing request,
/// `path || len(chain_id) || chain_id`
pub fn sign_tx_metadata(path: &DerivationPath, chain_id: ChainId) -> Vec<u8> {
    let mut b = Vec::with_capacity(path.encoded_len() + chain_id.encoded_len());

    let mut w = Writer(&mut b);
    path.write(&mut w);
    chain_id.write(&mut w);

    b
}

/// Build the full packet sequence for a signing request
///
/// The first packet carries only the derivation path and chain id, the
/// serialized transaction follows in windows of `max_chunk_len` bytes.
pub fn sign_tx_packets(
    path: &DerivationPath,
    chain_id: ChainId,
    tx: &[u8],
    max_chunk_len: usize,
) -> Result<Vec<ApduPacket>, Error> {
    let metadata = sign_tx_metadata(path, chain_id);

    let mut contents = vec![&metadata[..]];
    contents.extend(split_message(tx, max_chunk_len)?);

    #[cfg(feature = "log")]
    log::trace!(
        "sign_tx: {} byte transaction in {} packets",
        tx.len(),
        contents.len()
    );

    packets_from_contents(Instruction::SignTx, &contents)
}
