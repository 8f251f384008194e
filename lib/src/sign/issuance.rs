// Copyright (c) 2022-2023 Ledger SAS

//! Per-input issuance information provisioning

use log::debug;

use ledger_btc_apdu::{
    blocks, ApduCommand, Instruction, MAX_SCRIPT_BLOCK, P1_LAST_BLOCK, P1_MORE_BLOCKS,
};

use crate::{
    transport::{exchange_check, Exchange},
    tx::InputIssuance,
    Error,
};

/// Build the issuance buffer for a set of inputs.
///
/// Inputs carrying issuance data contribute their reversed nonce and entropy
/// followed by the confidential amount fields verbatim; all other inputs
/// contribute a single zero placeholder byte.
pub fn build_issuance_information<'a>(
    inputs: impl IntoIterator<Item = Option<&'a InputIssuance>>,
) -> Vec<u8> {
    let mut buffer = Vec::new();

    for issuance in inputs {
        match issuance {
            Some(data) => {
                buffer.extend(data.nonce.iter().rev());
                buffer.extend(data.entropy.iter().rev());
                buffer.extend_from_slice(&data.issuance_amount);
                buffer.extend_from_slice(&data.inflation_keys);
            }
            None => buffer.push(0x00),
        }
    }

    buffer
}

/// Send the issuance buffer to the device in device-sized chunks, flagging
/// the final chunk
pub async fn provide_issuance_information<T: Exchange + Sync>(
    t: &T,
    information: &[u8],
) -> Result<(), Error<T::Error>> {
    debug!("providing {} bytes of issuance information", information.len());

    for (block, last) in blocks(information, MAX_SCRIPT_BLOCK) {
        let p1 = match last {
            true => P1_LAST_BLOCK,
            false => P1_MORE_BLOCKS,
        };
        exchange_check(
            t,
            ApduCommand::new(Instruction::LiquidProvideIssuanceInformation, p1, block),
        )
        .await?;
    }

    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn issuance_buffer_layout() {
        let issuance = InputIssuance {
            nonce: vec![0x01, 0x02, 0x03],
            entropy: vec![0x0a, 0x0b, 0x0c],
            issuance_amount: vec![0x01, 0xff],
            inflation_keys: vec![0x00],
        };

        let buffer = build_issuance_information([Some(&issuance), None]);

        assert_eq!(
            buffer,
            vec![0x03, 0x02, 0x01, 0x0c, 0x0b, 0x0a, 0x01, 0xff, 0x00, 0x00]
        );
    }

    #[test]
    fn issuance_buffer_placeholders_only() {
        let buffer = build_issuance_information([None, None, None]);
        assert_eq!(buffer, vec![0x00, 0x00, 0x00]);
    }
}
