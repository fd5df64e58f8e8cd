// Copyright (c) 2024 Partisia Blockchain

//! Requests awaiting user interaction on the device
//!
//! A [PendingRequest] holds exclusive access to the device until it is
//! resolved (or dropped), so no other command can be interleaved while the
//! device waits on the user.

use std::{future::Future, marker::PhantomData, time::Duration};

use log::{debug, warn};
use tokio::sync::OwnedMutexGuard;

use pbc_ledger_apdu::{address::Address, chunk::ApduPacket, signature::Signature};

use crate::{handle::exchange_packet, transport::Session, Error};

/// Decode a typed response from APDU response data
pub trait FromResponse: Sized {
    fn from_response(data: &[u8]) -> Result<Self, Error>;
}

/// Raw response data
impl FromResponse for Vec<u8> {
    fn from_response(data: &[u8]) -> Result<Self, Error> {
        Ok(data.to_vec())
    }
}

impl FromResponse for Address {
    fn from_response(data: &[u8]) -> Result<Self, Error> {
        Ok(Address::try_from(data)?)
    }
}

impl FromResponse for Signature {
    fn from_response(data: &[u8]) -> Result<Self, Error> {
        Ok(Signature::try_from(data)?)
    }
}

/// Request awaiting user approval on the device
///
/// The final packet of the request is sent on [PendingRequest::confirm] or
/// [PendingRequest::resolve], the device response is returned once the user
/// has approved or rejected the operation.
pub struct PendingRequest<T: Session, R> {
    t: OwnedMutexGuard<T>,
    packet: ApduPacket,
    user_timeout: Duration,
    _r: PhantomData<R>,
}

impl<T: Session, R: FromResponse> PendingRequest<T, R> {
    pub(crate) fn new(t: OwnedMutexGuard<T>, packet: ApduPacket, user_timeout: Duration) -> Self {
        Self {
            t,
            packet,
            user_timeout,
            _r: PhantomData,
        }
    }

    /// Send the final packet and run `interact` (eg. UI automation or user
    /// prompts) while awaiting the device outcome
    ///
    /// The device outcome takes precedence over the interaction result, an
    /// interaction failure is only returned when the device did not respond
    /// within the user timeout. An interaction still running when the device
    /// responds (eg. on a parsing failure) is dropped.
    pub async fn confirm<F>(self, interact: F) -> Result<R, Error>
    where
        F: Future<Output = anyhow::Result<()>>,
    {
        let Self {
            mut t,
            packet,
            user_timeout,
            ..
        } = self;

        debug!("Awaiting user interaction (timeout: {user_timeout:?})");

        let (resp, interaction) = {
            let exchange = exchange_packet(&mut *t, &packet, user_timeout);
            futures::pin_mut!(exchange, interact);

            // Interaction is abandoned if the device resolves first
            let mut interaction = None;
            let resp = loop {
                tokio::select! {
                    r = &mut exchange => break r,
                    i = &mut interact, if interaction.is_none() => {
                        if let Err(e) = &i {
                            warn!("User interaction failed: {e:?}");
                        }
                        interaction = Some(i);
                    }
                }
            };

            (resp, interaction)
        };

        let data = match resp {
            Ok(d) => d,
            Err(Error::RequestTimeout) => {
                // Interaction failures explain the missing response
                return match interaction {
                    Some(Err(e)) => Err(Error::Interaction(e)),
                    _ => Err(Error::UserTimeout),
                };
            }
            Err(e) => return Err(e),
        };

        R::from_response(&data)
    }

    /// Send the final packet and await the device outcome
    pub async fn resolve(self) -> Result<R, Error> {
        self.confirm(async { Ok(()) }).await
    }
}
