// Copyright (c) 2024 Partisia Blockchain

use std::net::SocketAddr;

use clap::Parser;
use log::{debug, info, LevelFilter};
use strum::{Display, EnumString, EnumVariantNames};

use pbc_ledger::{apdu::chain_id::ChainId, DeviceHandle, HandleConfig, Session};
use pbc_ledger_tests::{address, app_info, sign_tx, vectors};

/// Test CLI arguments
#[derive(Clone, Debug, Parser)]
pub struct Opts {
    #[clap(subcommand)]
    pub test: Tests,

    /// Target for test execution
    #[clap(long, value_enum, default_value = "sim", env)]
    pub target: Target,

    /// APDU socket address for TCP targets
    #[clap(long, default_value = "127.0.0.1:9999", env)]
    pub addr: SocketAddr,

    /// Chain for signing tests
    #[clap(long, default_value = "testnet")]
    pub chain_id: ChainId,

    /// Log level
    #[clap(long, default_value = "debug", env)]
    pub log_level: LevelFilter,
}

/// Test modes
#[derive(Clone, PartialEq, Debug, Parser, Display)]
pub enum Tests {
    /// Test application name and version
    AppInfo,
    /// Test address derivation
    Address,
    /// Test signing of the transaction vectors
    SignTx {
        /// Run only the named vector
        #[clap(long)]
        name: Option<String>,
    },
    /// Test signing of random token transfers
    Random {
        /// Number of transfers to sign
        #[clap(long, default_value = "16")]
        n: usize,
    },
}

/// Test target connection
#[derive(Clone, PartialEq, Debug, clap::ValueEnum, Display, EnumString, EnumVariantNames)]
#[strum(serialize_all = "snake_case")]
#[non_exhaustive]
pub enum Target {
    /// In-process simulator (auto-approving)
    Sim,
    /// TCP connection for speculos-style simulators
    Tcp,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load command line options
    let opts = Opts::parse();

    // Setup logging
    let _ = simplelog::SimpleLogger::init(opts.log_level, simplelog::Config::default());

    debug!("options: {:?}", opts);

    info!("Running test '{}' via {}", opts.test, opts.target);

    // Connect to target and execute test
    match opts.target {
        Target::Sim => {
            let sim_opts = pbc_ledger_sim::Options {
                auto_approve: true,
                ..Default::default()
            };
            let (_s, t) = pbc_ledger_sim::new(sim_opts)?;

            execute(t, opts).await?;
        }
        #[cfg(feature = "transport_tcp")]
        Target::Tcp => {
            use pbc_ledger::transport::{TcpInfo, TcpSession};

            let t = TcpSession::connect(TcpInfo { addr: opts.addr }).await?;

            execute(t, opts).await?;
        }
        #[cfg(not(feature = "transport_tcp"))]
        _ => {
            return Err(anyhow::anyhow!(
                "transport: {} feature not enabled",
                opts.target
            ));
        }
    };

    info!("Test OK!");

    Ok(())
}

/// Execute a test with the provided transport
async fn execute<T: Session>(t: T, opts: Opts) -> anyhow::Result<()> {
    let d = DeviceHandle::new(t, HandleConfig::default());

    // Approval happens on the device
    let approve = || async {
        info!("Review and approve on device");
        Ok::<_, anyhow::Error>(())
    };

    match opts.test {
        Tests::AppInfo => app_info::test(&d, &Default::default()).await?,
        Tests::Address => {
            address::test_silent(&d).await?;
            address::test_confirm(&d, approve, &vectors::key_path()).await?;
        }
        Tests::SignTx { name } => {
            for v in vectors::valid_transactions() {
                if matches!(&name, Some(n) if n != v.name) {
                    continue;
                }

                sign_tx::test(&d, approve, &v, opts.chain_id).await?;
            }
        }
        Tests::Random { n } => sign_tx::test_random_transfers(&d, approve, n).await?,
    }

    Ok(())
}
