// Copyright (c) 2022-2023 Ledger SAS

//! Transport abstraction for device exchanges
//!
//! Concrete links (HID, TCP, simulator) live outside this crate; anything
//! able to round-trip an [`ApduCommand`] can drive the signing protocol.

use core::fmt::{Debug, Display};

use async_trait::async_trait;
use log::trace;

pub use ledger_btc_apdu::ApduCommand;
use ledger_btc_apdu::SW_OK;

use crate::Error;

/// Exchange trait for APDU transports.
///
/// The returned buffer is the raw device response and still carries the
/// trailing 2-byte status word; use [`exchange_check`] to verify and strip it.
#[async_trait]
pub trait Exchange {
    type Error: Display + Debug + Send;

    /// Execute one command / response exchange with the device
    async fn exchange(&self, command: ApduCommand<'_>) -> Result<Vec<u8>, Self::Error>;
}

/// Helper to execute an exchange and check the trailing status word,
/// returning the response payload with the status word stripped.
pub(crate) async fn exchange_check<T: Exchange + Sync>(
    t: &T,
    command: ApduCommand<'_>,
) -> Result<Vec<u8>, Error<T::Error>> {
    trace!(
        "apdu > ins: {:#04x} p1: {:#04x} ({} byte payload)",
        command.ins,
        command.p1,
        command.data.len()
    );

    let mut resp = t.exchange(command).await.map_err(Error::Transport)?;

    if resp.len() < 2 {
        return Err(Error::UnexpectedResponse);
    }

    let sw = u16::from_be_bytes([resp[resp.len() - 2], resp[resp.len() - 1]]);
    if sw != SW_OK {
        return Err(Error::Status(sw));
    }

    resp.truncate(resp.len() - 2);

    trace!("apdu < {} byte payload", resp.len());

    Ok(resp)
}
