// Copyright (c) 2024 Partisia Blockchain

use std::{net::SocketAddr, str::FromStr, time::Duration};

use clap::Parser;
use log::{info, warn, LevelFilter};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    net::TcpListener,
};

use pbc_ledger_sim::*;

/// Partisia Blockchain ledger application simulator
///
/// Serves the simulated application over a Speculos-style TCP APDU
/// socket, decisions (`approve` or `reject`) for pending requests are read
/// from stdin.
#[derive(Clone, Debug, PartialEq, Parser)]
pub struct Args {
    #[clap(flatten)]
    sim_opts: Options,

    /// APDU socket address
    #[clap(long, default_value = "127.0.0.1:9999")]
    listen: SocketAddr,

    /// Timeout for user interaction (seconds)
    #[clap(long, default_value = "30")]
    user_timeout_s: u64,

    /// Log level
    #[clap(long, default_value = "debug")]
    log_level: LevelFilter,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Setup logging
    let _ = simplelog::SimpleLogger::init(args.log_level, simplelog::Config::default());

    let (h, mut d) = pbc_ledger_sim::new(args.sim_opts.clone())?;

    let listener = TcpListener::bind(args.listen).await?;
    info!("Listening on {}", args.listen);

    // Forward stdin decisions to the device
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        while let Ok(Some(l)) = lines.next_line().await {
            let d = match Decision::from_str(l.trim()) {
                Ok(d) => d,
                Err(_) => {
                    warn!("Unrecognised decision: {l}");
                    continue;
                }
            };

            match h.pending() {
                Some(p) => info!("{d}: {p:?}"),
                None => {
                    warn!("No pending request");
                    continue;
                }
            }

            if h.decide(d).is_err() {
                break;
            }
        }
    });

    // Serve until exit signal
    tokio::select!(
        r = serve(listener, &mut d, Duration::from_secs(args.user_timeout_s)) => {
            r?;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Exit!");
        },
    );

    Ok(())
}
