// Copyright (c) 2024 Partisia Blockchain

//! Address derivation and confirmation tests

use std::{future::Future, str::FromStr};

use log::debug;

use pbc_ledger::{DeviceHandle, Session};
use pbc_ledger_apdu::{
    address::{Address, AddressType},
    path::DerivationPath,
};

use crate::vectors::ADDRESS_PATHS;

/// Fetch addresses for each test path without user interaction
///
/// Returns the derived addresses so callers may compare against a reference
/// derivation.
pub async fn test_silent<T: Session>(
    d: &DeviceHandle<T>,
) -> anyhow::Result<Vec<(DerivationPath, Address)>> {
    let mut addresses = vec![];

    for p in ADDRESS_PATHS {
        let path = DerivationPath::from_str(p)?;

        let a = d.address(&path).await?;
        debug!("Address for {path}: {a}");

        assert_eq!(a.address_type(), Some(AddressType::Account));

        // Derivation is stable
        assert_eq!(d.address(&path).await?, a, "address derivation unstable");

        addresses.push((path, a));
    }

    // Distinct paths yield distinct addresses
    for (i, (_, a)) in addresses.iter().enumerate() {
        for (_, b) in &addresses[i + 1..] {
            assert_ne!(a, b, "address collision");
        }
    }

    Ok(addresses)
}

/// Confirm an address on the device, checking it matches the silent derivation
pub async fn test_confirm<T, F>(
    d: &DeviceHandle<T>,
    approve: impl Fn() -> F,
    path: &DerivationPath,
) -> anyhow::Result<()>
where
    T: Session,
    F: Future<Output = anyhow::Result<()>>,
{
    let expected = d.address(path).await?;

    let a = d
        .address_with_confirmation(path)
        .await?
        .confirm(approve())
        .await?;

    assert_eq!(a, expected, "confirmed address mismatch");

    Ok(())
}

/// Reject an address on the device, checking the request is denied
pub async fn test_reject<T, F>(
    d: &DeviceHandle<T>,
    reject: impl Fn() -> F,
    path: &DerivationPath,
) -> anyhow::Result<()>
where
    T: Session,
    F: Future<Output = anyhow::Result<()>>,
{
    let r = d
        .address_with_confirmation(path)
        .await?
        .confirm(reject())
        .await;

    match r {
        Err(e) if e.is_denied() => Ok(()),
        Err(e) => Err(anyhow::anyhow!("Unexpected error: {e}")),
        Ok(a) => Err(anyhow::anyhow!("Rejected address returned: {a}")),
    }
}
