// Copyright (c) 2022-2023 Ledger SAS

//! Blinding commitment requests

use encdec::Decode;
use log::debug;

use ledger_btc_apdu::liquid::{LiquidCommitmentsReq, LiquidCommitmentsResp};

use crate::{
    transport::{exchange_check, Exchange},
    Error,
};

/// Device-computed (or verified) blinding data for one output
#[derive(Clone, Debug, PartialEq)]
pub struct Commitments {
    /// Asset blinding factor
    pub asset_blind_factor: [u8; 32],
    /// Value blinding factor
    pub value_blind_factor: [u8; 32],
    /// Concatenated asset and value commitment
    pub commitment: Vec<u8>,
}

/// Request the asset / value commitment pair for one output.
///
/// Blinding factors supplied by the caller are forwarded for the device to
/// use; otherwise the device picks them and returns its choices.
pub async fn get_commitments<T: Exchange + Sync>(
    t: &T,
    asset_tag: &[u8; 32],
    value: &[u8; 32],
    output_index: u32,
    vbf: Option<&[u8; 32]>,
    abf: Option<&[u8; 32]>,
) -> Result<Commitments, Error<T::Error>> {
    let req = LiquidCommitmentsReq::new(asset_tag, value, output_index, vbf, abf)?;

    debug!("requesting commitments for output {}", output_index);

    let mut buff = [0u8; 256];
    let resp = exchange_check(t, req.apdu(&mut buff)?).await?;

    let (r, _) = LiquidCommitmentsResp::decode(&resp)?;

    Ok(Commitments {
        asset_blind_factor: r.abf,
        value_blind_factor: r.vbf,
        commitment: r.commitment.to_vec(),
    })
}
