// Copyright (c) 2022-2023 Ledger SAS

//! Bitcoin / Liquid hardware wallet interface library
//!
//! Host-side support for driving a Bitcoin application with Liquid
//! (Elements / Confidential Transactions) extensions on a hardware wallet:
//! a transaction codec for the on-chain encodings the device understands
//! ([tx]), and the multi-pass signing protocol that streams inputs, outputs,
//! issuance data and commitment requests to the device ([sign]).
//!
//! The physical link is abstract: anything implementing
//! [Exchange][transport::Exchange] can carry the raw streamed commands, and
//! the five opaque command encoders the orchestrator consumes are bound
//! through [DeviceCommands][device::DeviceCommands].

/// Re-export `ledger-btc-apdu` for consumers
pub use ledger_btc_apdu::{self as apdu};

pub mod constants;

mod error;
pub use error::Error;

pub mod transport;
pub use transport::Exchange;

pub mod device;
pub use device::{DeviceCommands, TrustedInput, WalletPublicKey};

pub mod script;

pub mod tx;
pub use tx::{ParseOptions, Transaction, TransactionInput, TransactionOutput};

pub mod sign;
pub use sign::{create_liquid_transaction, LiquidSignRequest, SignEvents};
