// Copyright (c) 2024 Partisia Blockchain

//! Device handle configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

use pbc_ledger_apdu::MAX_APDU_LEN;

/// Configuration for a [DeviceHandle][crate::DeviceHandle]
///
/// Missing fields take their default values, so partial configurations
/// may be loaded from a file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HandleConfig {
    /// Timeout for plain APDU requests (seconds)
    pub request_timeout_s: u64,

    /// Timeout for requests awaiting user interaction (seconds)
    pub user_timeout_s: u64,

    /// Transaction chunk length, in `[1, 255]`
    pub max_chunk_len: usize,
}

impl Default for HandleConfig {
    fn default() -> Self {
        Self {
            request_timeout_s: 2,
            user_timeout_s: 30,
            max_chunk_len: MAX_APDU_LEN,
        }
    }
}

impl HandleConfig {
    /// Helper to fetch APDU request timeout
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_s)
    }

    /// Helper to fetch user interaction timeout
    pub fn user_timeout(&self) -> Duration {
        Duration::from_secs(self.user_timeout_s)
    }
}
