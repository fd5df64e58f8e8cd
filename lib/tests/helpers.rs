// Copyright (c) 2024 Partisia Blockchain

use std::str::FromStr;

use log::LevelFilter;
use simplelog::SimpleLogger;

use pbc_ledger::{DeviceHandle, HandleConfig};
use pbc_ledger_sim::{Options, SimDevice, SimHandle};

/// Setup logging and an in-process simulator with default options
#[allow(unused)]
pub fn setup() -> (SimHandle, DeviceHandle<SimDevice>) {
    setup_with(Options::default(), HandleConfig::default())
}

/// Setup logging and an in-process simulator
pub fn setup_with(opts: Options, cfg: HandleConfig) -> (SimHandle, DeviceHandle<SimDevice>) {
    // Setup logging
    let log_level = match std::env::var("LOG_LEVEL").map(|v| LevelFilter::from_str(&v)) {
        Ok(Ok(l)) => l,
        _ => LevelFilter::Debug,
    };

    let _ = SimpleLogger::init(log_level, simplelog::Config::default());

    // Launch simulator
    let (s, d) = pbc_ledger_sim::new(opts).expect("Simulator setup failed");

    (s, DeviceHandle::new(d, cfg))
}
