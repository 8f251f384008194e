// Copyright (c) 2022-2023 Ledger SAS

//! Device command boundary for the signing orchestrator
//!
//! The orchestrator consumes these five commands opaquely: each wraps a
//! request / response encoder for the wallet application, and their exact
//! wire formats are owned by the implementor. The device accumulates state
//! across them, so the orchestrator's call order is a hard protocol contract.

use async_trait::async_trait;

use ledger_btc_apdu::Features;

use crate::{transport::Exchange, tx::Transaction, Error};

/// Device-issued trusted-input token plus the sequence number the
/// orchestrator normalised for the matching input
#[derive(Clone, Debug, PartialEq)]
pub struct TrustedInput {
    /// Opaque token binding the input's prevout / value
    pub value: Vec<u8>,
    /// Wire-order sequence bytes
    pub sequence: [u8; 4],
}

/// Wallet public key response
#[derive(Clone, Debug, PartialEq)]
pub struct WalletPublicKey {
    /// Uncompressed (or already compressed) SECP256k1 public key
    pub public_key: Vec<u8>,
}

/// Opaque command collaborators used by the signing orchestrator
#[async_trait]
pub trait DeviceCommands: Exchange {
    /// Request a trusted-input token for one output of a source transaction
    async fn get_trusted_input(
        &self,
        output_index: u32,
        transaction: &[u8],
        features: Features,
    ) -> Result<Vec<u8>, Error<Self::Error>>;

    /// Fetch the wallet public key for a derivation path
    async fn get_wallet_public_key(&self, path: &str)
        -> Result<WalletPublicKey, Error<Self::Error>>;

    /// Declare the change derivation path for the transaction being built
    async fn provide_change_path(&self, path: &str) -> Result<(), Error<Self::Error>>;

    /// Stream a (possibly pseudo) transaction into the device hashing context
    async fn start_untrusted_hash_tx_input(
        &self,
        new_transaction: bool,
        transaction: &Transaction,
        trusted_inputs: &[TrustedInput],
        bip143: bool,
        overwinter: bool,
        features: Features,
    ) -> Result<(), Error<Self::Error>>;

    /// Request the signature for the previously streamed input
    async fn sign_transaction(
        &self,
        path: &str,
        lock_time: u32,
        sig_hash_type: u8,
        extra: Option<&[u8]>,
        tweak: Option<&[u8]>,
        features: Features,
    ) -> Result<Vec<u8>, Error<Self::Error>>;
}
