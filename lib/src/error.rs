// Copyright (c) 2022-2023 Ledger SAS

use core::fmt::{Debug, Display};

use ledger_btc_apdu::ApduError;

use crate::tx;

/// Bitcoin / Liquid host API error type, generic over the transport error
#[derive(Debug, thiserror::Error)]
pub enum Error<E: Display + Debug> {
    /// Transport failure (connection loss, framing error, ...)
    #[error("transport error {0}")]
    Transport(E),

    /// Device reported a non-OK status word (user rejection, device-side
    /// validation failure, ...)
    #[error("device returned status word {0:#06x}")]
    Status(u16),

    /// Response shorter than the mandatory status word
    #[error("unexpected APDU response")]
    UnexpectedResponse,

    /// Transaction codec failure
    #[error(transparent)]
    Tx(#[from] tx::Error),

    /// APDU encode / decode failure
    #[error("APDU encoding failed: {0}")]
    Apdu(ApduError),

    /// Malformed hex in a caller-supplied field
    #[error("invalid hex in field '{field}'")]
    Hex {
        field: &'static str,
        #[source]
        source: hex::FromHexError,
    },

    /// Device returned a public key with an unknown prefix
    #[error("invalid public key returned by device")]
    InvalidPublicKey,

    /// Caller-supplied request rejected before any device exchange
    #[error("invalid request: {0}")]
    InvalidRequest(&'static str),
}

impl<E: Display + Debug> From<ApduError> for Error<E> {
    fn from(e: ApduError) -> Self {
        Self::Apdu(e)
    }
}
