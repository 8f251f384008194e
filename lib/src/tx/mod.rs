// Copyright (c) 2022-2023 Ledger SAS

//! Transaction codec and canonical model
//!
//! [`Transaction::parse`] decodes the heterogeneous on-chain encodings the
//! device understands (legacy, segwit-marked, Overwinter, Decred, Liquid
//! confidential) into one model; [`Transaction::serialize`] re-encodes it.

use core::fmt;

pub mod confidential;
pub mod varint;

mod parse;
pub use parse::ParseOptions;

/// Transaction codec errors. All are terminal: no partial transaction is
/// ever returned.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum Error {
    /// A varint or field read would run past the end of the buffer
    #[error("transaction truncated ({needed} bytes needed at offset {offset})")]
    MalformedEncoding { offset: usize, needed: usize },

    /// Unknown confidential data version tag
    #[error("unsupported confidential data version {0:#04x}")]
    UnsupportedConfidentialVersion(u8),

    /// Null (version 0) confidential data in a field that forbids it
    #[error("invalid null confidential data")]
    InvalidNullConfidentialData,

    /// Liquid marker byte other than 1
    #[error("unsupported liquid transaction version {0}")]
    UnsupportedLiquidVersion(u8),

    /// Decred witness count differs from the input count
    #[error("witness count {actual} does not match input count {expected}")]
    WitnessCountMismatch { expected: u64, actual: u64 },
}

/// Asset issuance fields of one input. Either all four are present or the
/// input carries no issuance data.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct InputIssuance {
    /// 32-byte issuance nonce
    pub nonce: Vec<u8>,
    /// 32-byte issuance entropy
    pub entropy: Vec<u8>,
    /// Confidential-encoded issuance amount
    pub issuance_amount: Vec<u8>,
    /// Confidential-encoded inflation keys amount
    pub inflation_keys: Vec<u8>,
}

/// One transaction input
#[derive(Clone, Debug, PartialEq, Default)]
pub struct TransactionInput {
    /// 36-byte previous output reference (32-byte hash plus 4-byte index)
    /// when parsed; empty for protocol placeholder inputs. For Liquid the
    /// issuance flag bit of the index is masked off during parsing.
    pub prevout: Vec<u8>,
    /// Signature / redeem script (empty where the format carries scripts in
    /// a trailing witness section)
    pub script: Vec<u8>,
    /// Wire-order sequence bytes
    pub sequence: [u8; 4],
    /// Decred tree marker, carried in place of an inline script
    pub tree: Option<u8>,
    /// Issuance data, present only when the prevout issuance bit was set
    pub issuance: Option<InputIssuance>,
}

/// One transaction output
#[derive(Clone, Debug, PartialEq, Default)]
pub struct TransactionOutput {
    /// 8-byte amount, or the confidential value commitment for Liquid
    pub amount: Vec<u8>,
    /// Output script
    pub script: Vec<u8>,
    /// Confidential asset commitment (Liquid only)
    pub asset_commitment: Option<Vec<u8>>,
    /// Ephemeral range-proof public key (Liquid only)
    pub nonce: Option<Vec<u8>>,
}

/// Canonical decoded transaction
#[derive(Clone, Debug, PartialEq, Default)]
pub struct Transaction {
    /// 4-byte version field, endianness preserved as on the wire
    pub version: [u8; 4],
    pub inputs: Vec<TransactionInput>,
    pub outputs: Vec<TransactionOutput>,
    pub locktime: Option<[u8; 4]>,
    /// Raw witness payload for witness-bearing formats
    pub witness: Option<Vec<u8>>,
    /// 4-byte timestamp (Peercoin-style chains)
    pub timestamp: Option<[u8; 4]>,
    /// Overwinter version group id
    pub version_group_id: Option<[u8; 4]>,
    /// Overwinter / Decred expiry height
    pub expiry_height: Option<[u8; 4]>,
    /// Trailing chain-specific data, captured verbatim
    pub extra_data: Option<Vec<u8>>,
    /// Confidential-layout semantics for inputs and outputs
    pub liquid: bool,
}

/// Hex dump of the decoded fields, one line per input / output
impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "version {}", hex::encode(self.version))?;

        for (i, input) in self.inputs.iter().enumerate() {
            writeln!(
                f,
                "input {} prevout {} script {} sequence {}",
                i,
                hex::encode(&input.prevout),
                hex::encode(&input.script),
                hex::encode(input.sequence),
            )?;

            if let Some(issuance) = &input.issuance {
                writeln!(
                    f,
                    "input {} nonce {} entropy {} issuance amount {} inflation keys {}",
                    i,
                    hex::encode(&issuance.nonce),
                    hex::encode(&issuance.entropy),
                    hex::encode(&issuance.issuance_amount),
                    hex::encode(&issuance.inflation_keys),
                )?;
            }
        }

        for (i, output) in self.outputs.iter().enumerate() {
            if self.liquid {
                writeln!(
                    f,
                    "output {} asset commitment {} value commitment {} nonce {} script {}",
                    i,
                    hex::encode(output.asset_commitment.as_deref().unwrap_or_default()),
                    hex::encode(&output.amount),
                    hex::encode(output.nonce.as_deref().unwrap_or_default()),
                    hex::encode(&output.script),
                )?;
            } else {
                writeln!(
                    f,
                    "output {} amount {} script {}",
                    i,
                    hex::encode(&output.amount),
                    hex::encode(&output.script),
                )?;
            }
        }

        if let Some(locktime) = &self.locktime {
            writeln!(f, "locktime {}", hex::encode(locktime))?;
        }

        Ok(())
    }
}
