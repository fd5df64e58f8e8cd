// Copyright (c) 2024 Partisia Blockchain

//! Ledger Partisia Blockchain API Library
//!
//! Provides a [DeviceHandle] for issuing requests to the Partisia Blockchain
//! ledger application over any [Session] transport, along with signature
//! [verification][verify] for device-produced transaction signatures.
//!
//! ```no_run
//! # use pbc_ledger::{*, apdu::prelude::*};
//! # async fn example<T: Session>(d: DeviceHandle<T>) -> Result<(), Error> {
//! let path = DerivationPath::default();
//! let address = d.address(&path).await?;
//!
//! let tx = Transaction::new(1, 1_700_000_000_000, 10_000, MPC_TOKEN_ADDRESS, vec![0u8; 4])?;
//!
//! let signature = d
//!     .sign_tx(&path, ChainId::Testnet, &tx)
//!     .await?
//!     .resolve()
//!     .await?;
//!
//! verify::verify_transaction(&tx, ChainId::Testnet, verify::Signer::Address(&address), &signature)?;
//! # Ok(())
//! # }
//! ```

/// Transport abstraction and implementations
pub mod transport;
pub use transport::{Exchange, Session, TransportError};

/// Re-export `pbc-ledger-apdu` for consumers
pub use pbc_ledger_apdu::{self as apdu};

mod config;
pub use config::HandleConfig;

mod handle;
pub use handle::{AppInfo, DeviceHandle};

mod pending;
pub use pending::{FromResponse, PendingRequest};

mod error;
pub use error::{Error, StatusError};

pub mod verify;
pub use verify::VerifyError;
