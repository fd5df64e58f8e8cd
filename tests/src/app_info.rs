// Copyright (c) 2024 Partisia Blockchain

//! Application name and version tests

use log::debug;

use pbc_ledger::{DeviceHandle, Session};

/// Expected application information
pub struct AppExpectation<'a> {
    pub name: &'a str,
    pub version: &'a str,
}

impl<'a> Default for AppExpectation<'a> {
    fn default() -> Self {
        Self {
            name: "Partisia Blockchain",
            version: "1.0.0",
        }
    }
}

/// Check app name and version via both the application and BOLOS commands
pub async fn test<T: Session>(d: &DeviceHandle<T>, e: &AppExpectation<'_>) -> anyhow::Result<()> {
    let name = d.app_name().await?;
    assert_eq!(name, e.name, "app name mismatch");

    let version = d.version().await?;
    assert_eq!(version.to_string(), e.version, "app version mismatch");

    let info = d.app_and_version().await?;
    debug!("App info: {info:?}");

    assert_eq!(info.app_name, e.name, "BOLOS app name mismatch");
    assert_eq!(info.app_version, e.version, "BOLOS app version mismatch");

    Ok(())
}
