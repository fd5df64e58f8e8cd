// Copyright (c) 2024 Partisia Blockchain

//! Tests for Partisia Blockchain wallet integration.
//!
//! Generic over [pbc_ledger::Session] for reuse against the simulator
//! or a physical device.
//!

pub mod vectors;

pub mod app_info;

pub mod address;

pub mod sign_tx;
