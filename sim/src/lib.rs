// Copyright (c) 2024 Partisia Blockchain

//! In-process simulator for the Partisia Blockchain ledger application
//!
//! [new] returns a [SimDevice], implementing [Session] for use with
//! [pbc_ledger::DeviceHandle], and a [SimHandle] for approving or
//! rejecting pending requests from tests.
//!
//! ```no_run
//! # async fn example() -> anyhow::Result<()> {
//! use pbc_ledger::{apdu::prelude::*, DeviceHandle};
//!
//! let (s, d) = pbc_ledger_sim::new(Default::default())?;
//! let d = DeviceHandle::from(d);
//!
//! let address = d
//!     .address_with_confirmation(&DerivationPath::default())
//!     .await?
//!     .confirm(s.approve())
//!     .await?;
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use anyhow::anyhow;
use async_trait::async_trait;
use log::{debug, warn};
use serde::Deserialize;
use tokio::sync::{mpsc, watch};

use pbc_ledger::{Exchange, Session, TransportError};

mod engine;
pub use engine::{Decision, Engine, Outcome, Prompt, Response, MEMO_MAX_DISPLAY_LEN};

mod parser;
pub use parser::{ParseError, ParseStatus, TxParser};

mod server;
pub use server::serve;

/// Default simulator mnemonic
pub const DEFAULT_MNEMONIC: &str = "glory promote mansion idle axis finger extra february uncover one trip resource lawn turtle enact monster seven myth punch hobby comfort wild raise skin";

/// Simulator options
#[derive(Clone, Debug, PartialEq, clap::Parser, Deserialize)]
#[serde(default)]
pub struct Options {
    /// BIP-39 mnemonic for key derivation
    #[clap(long, env = "SIM_MNEMONIC", default_value = DEFAULT_MNEMONIC)]
    pub mnemonic: String,

    /// Application name reported by the device
    #[clap(long, default_value = "Partisia Blockchain")]
    pub app_name: String,

    /// Application version reported by the device
    #[clap(skip = (1, 0, 0))]
    pub version: (u8, u8, u8),

    /// Approve all requests without user interaction
    #[clap(long)]
    pub auto_approve: bool,

    /// Allow approval of transactions that cannot be displayed
    #[clap(long, action = clap::ArgAction::Set, default_value_t = true)]
    pub allow_blind_signing: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            mnemonic: DEFAULT_MNEMONIC.to_string(),
            app_name: "Partisia Blockchain".to_string(),
            version: (1, 0, 0),
            auto_approve: false,
            allow_blind_signing: true,
        }
    }
}

/// Create a simulated device and a handle for deciding its prompts
pub fn new(opts: Options) -> anyhow::Result<(SimHandle, SimDevice)> {
    let auto_approve = opts.auto_approve;
    let engine = Engine::new(opts)?;

    let (decisions_tx, decisions_rx) = mpsc::unbounded_channel();
    let (prompt_tx, prompt_rx) = watch::channel(None);

    let h = SimHandle {
        decisions: decisions_tx,
        prompt: prompt_rx,
    };

    let d = SimDevice {
        engine,
        auto_approve,
        decisions: decisions_rx,
        prompt: prompt_tx,
    };

    Ok((h, d))
}

/// Simulated device, connected to the host via [Exchange]
pub struct SimDevice {
    engine: Engine,
    auto_approve: bool,
    decisions: mpsc::UnboundedReceiver<Decision>,
    prompt: watch::Sender<Option<Prompt>>,
}

impl SimDevice {
    /// Access the underlying application engine
    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Publish a prompt and wait for the user decision
    ///
    /// Dropping all [SimHandle]s rejects the prompt.
    async fn await_decision(&mut self, prompt: Prompt) -> Decision {
        // Discard decisions made before the prompt was shown
        while self.decisions.try_recv().is_ok() {}

        self.prompt.send_replace(Some(prompt));

        self.decisions.recv().await.unwrap_or(Decision::Reject)
    }
}

#[async_trait]
impl Exchange for SimDevice {
    async fn exchange(
        &mut self,
        command: &[u8],
        timeout: Duration,
    ) -> Result<Vec<u8>, TransportError> {
        let prompt = match self.engine.handle(command) {
            Outcome::Respond(r) => return Ok(r.to_bytes()),
            Outcome::Prompt(p) => p,
        };

        debug!("Prompt: {prompt:?}");

        let decision = match self.auto_approve {
            true => Decision::Approve,
            false => {
                let d = tokio::time::timeout(timeout, self.await_decision(prompt)).await;
                self.prompt.send_replace(None);

                match d {
                    Ok(d) => d,
                    Err(_) => {
                        warn!("Prompt timed out");
                        self.engine.reset();
                        return Err(TransportError::Timeout);
                    }
                }
            }
        };

        let resp = match decision {
            Decision::Approve => self.engine.approve(),
            Decision::Reject => self.engine.reject(),
        };

        debug!("Decision: {decision} ({})", resp.status);

        Ok(resp.to_bytes())
    }
}

#[async_trait]
impl Session for SimDevice {
    async fn cancel(&mut self) -> Result<(), TransportError> {
        self.engine.reset();
        self.prompt.send_replace(None);
        Ok(())
    }
}

/// Handle for deciding prompts on the simulated device
#[derive(Clone)]
pub struct SimHandle {
    decisions: mpsc::UnboundedSender<Decision>,
    prompt: watch::Receiver<Option<Prompt>>,
}

impl SimHandle {
    /// Submit a decision for the pending prompt
    pub fn decide(&self, d: Decision) -> anyhow::Result<()> {
        self.decisions
            .send(d)
            .map_err(|_| anyhow!("Simulator disconnected"))
    }

    /// Fetch the pending prompt, if any
    pub fn pending(&self) -> Option<Prompt> {
        self.prompt.borrow().clone()
    }

    /// Wait for a prompt to be raised
    pub async fn prompt(&self) -> anyhow::Result<Prompt> {
        let mut rx = self.prompt.clone();

        let p = rx.wait_for(Option::is_some).await?;

        p.clone().ok_or_else(|| anyhow!("No pending prompt"))
    }

    /// Wait for a prompt then approve it
    pub async fn approve(&self) -> anyhow::Result<()> {
        let p = self.prompt().await?;
        debug!("Approve: {p:?}");
        self.decide(Decision::Approve)
    }

    /// Wait for a prompt then reject it
    pub async fn reject(&self) -> anyhow::Result<()> {
        let p = self.prompt().await?;
        debug!("Reject: {p:?}");
        self.decide(Decision::Reject)
    }
}
