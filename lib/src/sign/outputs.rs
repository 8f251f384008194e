// Copyright (c) 2022-2023 Ledger SAS

//! Confidential output streaming

use log::debug;

use ledger_btc_apdu::{
    blocks, ApduCommand, Instruction, MAX_SCRIPT_BLOCK, P1_LAST_BLOCK, P1_MORE_BLOCKS,
};

use crate::{
    transport::{exchange_check, Exchange},
    tx::varint,
    Error,
};

/// One output ready to stream to the device
#[derive(Clone, Debug, PartialEq, Default)]
pub struct LiquidOutputData {
    /// Concatenated asset and value commitment
    pub asset_value_commitments: Vec<u8>,
    /// Ephemeral range-proof public key, or the blinding-key-folded nonce
    pub nonce: Vec<u8>,
    /// Remote blinding key, absent when already folded into the nonce or
    /// when the output was supplied pre-blinded
    pub remote_blinding_key: Option<Vec<u8>>,
    /// Output script
    pub script: Vec<u8>,
}

/// Stream the full output set to the device.
///
/// Sends the output count, then per output the commitment pair, the nonce,
/// the remote blinding key where one is supplied, and the length-prefixed
/// script in device-sized chunks. The final chunk of the final output is
/// flagged so the device knows no further output data follows. The length
/// prefix is part of the first chunk by construction.
pub async fn provide_outputs<T: Exchange + Sync>(
    t: &T,
    outputs: &[LiquidOutputData],
) -> Result<(), Error<T::Error>> {
    let ins = Instruction::UntrustedHashTxInputFinalizeFull;

    debug!("streaming {} outputs", outputs.len());

    let count = varint::write_varint(outputs.len() as u64);
    exchange_check(t, ApduCommand::new(ins, P1_MORE_BLOCKS, &count)).await?;

    for (i, output) in outputs.iter().enumerate() {
        exchange_check(
            t,
            ApduCommand::new(ins, P1_MORE_BLOCKS, &output.asset_value_commitments),
        )
        .await?;

        exchange_check(t, ApduCommand::new(ins, P1_MORE_BLOCKS, &output.nonce)).await?;

        if let Some(key) = &output.remote_blinding_key {
            exchange_check(t, ApduCommand::new(ins, P1_MORE_BLOCKS, key)).await?;
        }

        let mut script = varint::write_varint(output.script.len() as u64);
        script.extend_from_slice(&output.script);

        let last_output = i + 1 == outputs.len();
        for (block, last) in blocks(&script, MAX_SCRIPT_BLOCK) {
            let p1 = match last && last_output {
                true => P1_LAST_BLOCK,
                false => P1_MORE_BLOCKS,
            };
            exchange_check(t, ApduCommand::new(ins, p1, block)).await?;
        }
    }

    Ok(())
}
