// Copyright (c) 2022-2023 Ledger SAS

//! Protocol / APDU definitions for Bitcoin / Liquid hardware wallet communication
//!
//! This crate provides the command set shared between the host library and the
//! wallet application: class / instruction bytes, the command frame handed to
//! transports, feature flags, chunking rules for streamed payloads and the
//! structured Liquid commitment request / response encodings.
//!
//! Payload encodings are raw byte concatenations as consumed by the device;
//! multi-byte integers are little-endian on the wire unless a field is
//! explicitly documented as big-endian.

#![no_std]

use num_enum::TryFromPrimitive;

pub mod features;
pub use features::Features;

pub mod liquid;

/// APDU class for the Bitcoin / Liquid application
pub const BTC_APDU_CLA: u8 = 0xe0;

/// Maximum payload size for one chunk of a streamed script / issuance buffer
pub const MAX_SCRIPT_BLOCK: usize = 50;

/// P1 value for a chunk with further chunks outstanding
pub const P1_MORE_BLOCKS: u8 = 0x00;

/// P1 value marking the final chunk of a streamed buffer
pub const P1_LAST_BLOCK: u8 = 0x80;

/// Status word appended to every successful device response
pub const SW_OK: u16 = 0x9000;

/// Bitcoin / Liquid APDU instruction codes
#[derive(Copy, Clone, Debug, PartialEq, strum::Display, TryFromPrimitive)]
#[repr(u8)]
pub enum Instruction {
    /// Fetch the wallet public key for a derivation path
    GetWalletPublicKey = 0x40,

    /// Compute a trusted-input token for one prevout
    GetTrustedInput = 0x42,

    /// Stream a (possibly pseudo) transaction into the device hashing context
    UntrustedHashTxInputStart = 0x44,

    /// Request a signature over the current hashing context
    UntrustedHashSign = 0x48,

    /// Stream outputs (count, commitments, nonces, chunked scripts)
    UntrustedHashTxInputFinalizeFull = 0x4a,

    /// Request asset / value blinding commitments for one output
    LiquidGetCommitments = 0xe0,

    /// Provide per-input issuance information
    LiquidProvideIssuanceInformation = 0xe6,
}

/// APDU command frame: header plus payload, as handed to a transport.
///
/// ## Encoding:
/// ```text
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |      CLA      |      INS      |       P1      |       P2      |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |      LEN      |                     DATA                      /
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ApduCommand<'a> {
    pub cla: u8,
    pub ins: u8,
    pub p1: u8,
    pub p2: u8,
    pub data: &'a [u8],
}

impl<'a> ApduCommand<'a> {
    /// Create a command frame for the Bitcoin / Liquid application class
    pub fn new(ins: Instruction, p1: u8, data: &'a [u8]) -> Self {
        Self {
            cla: BTC_APDU_CLA,
            ins: ins as u8,
            p1,
            p2: 0x00,
            data,
        }
    }
}

/// APDU encode / decode errors
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum ApduError {
    /// Provided buffer too short for the encoded object
    InvalidLength,
    /// Object constraints violated or unparseable payload
    InvalidEncoding,
}

impl core::fmt::Display for ApduError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ApduError::InvalidLength => write!(f, "invalid length"),
            ApduError::InvalidEncoding => write!(f, "invalid encoding"),
        }
    }
}

impl From<encdec::Error> for ApduError {
    fn from(err: encdec::Error) -> Self {
        match err {
            encdec::Error::Length => ApduError::InvalidLength,
            encdec::Error::Utf8 => ApduError::InvalidEncoding,
        }
    }
}

/// Split a streamed payload into device-sized blocks.
///
/// Yields `(block, is_last)` pairs with blocks capped at `block_size` bytes;
/// an empty payload yields nothing. Callers map `is_last` onto the P1
/// final-chunk marker.
pub fn blocks(data: &[u8], block_size: usize) -> impl Iterator<Item = (&[u8], bool)> {
    let count = (data.len() + block_size - 1) / block_size;

    data.chunks(block_size)
        .enumerate()
        .map(move |(i, c)| (c, i + 1 == count))
}
