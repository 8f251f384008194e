// Copyright (c) 2022-2023 Ledger SAS

//! Liquid blinding commitment APDUs

use byteorder::{BigEndian, ByteOrder};
use encdec::{Decode, Encode};

use crate::{ApduCommand, ApduError, Instruction};

/// P1 value when the device picks both blinding factors
pub const P1_NO_BLINDING_FACTORS: u8 = 0x00;

/// P1 value when the caller supplies the value blinding factor only
pub const P1_VALUE_BLINDING_FACTOR: u8 = 0x02;

/// P1 value when the caller supplies both blinding factors
pub const P1_BOTH_BLINDING_FACTORS: u8 = 0x03;

/// Liquid commitment request APDU.
///
/// Asks the device to compute (or validate) the asset / value commitment pair
/// for one output. P1 encodes which blinding factors the caller supplied; an
/// asset blinding factor may only be supplied together with a value blinding
/// factor.
///
/// ## Encoding:
/// ```text
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                                                               |
/// /                           ASSET_TAG                           /
/// /                           (32-byte)                           /
/// |                                                               |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                                                               |
/// /                             VALUE                             /
/// /                           (32-byte)                           /
/// |                                                               |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                 OUTPUT_INDEX (u32, big-endian)                |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                                                               |
/// /              VALUE_BLINDING_FACTOR (32-byte, opt)             /
/// |                                                               |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                                                               |
/// /              ASSET_BLINDING_FACTOR (32-byte, opt)             /
/// |                                                               |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LiquidCommitmentsReq<'a> {
    asset_tag: &'a [u8; 32],
    value: &'a [u8; 32],
    output_index: u32,
    vbf: Option<&'a [u8; 32]>,
    abf: Option<&'a [u8; 32]>,
}

impl<'a> LiquidCommitmentsReq<'a> {
    /// Create a new [`LiquidCommitmentsReq`] APDU.
    ///
    /// Fails with [`ApduError::InvalidEncoding`] if an asset blinding factor
    /// is supplied without a value blinding factor, as P1 cannot express it.
    pub fn new(
        asset_tag: &'a [u8; 32],
        value: &'a [u8; 32],
        output_index: u32,
        vbf: Option<&'a [u8; 32]>,
        abf: Option<&'a [u8; 32]>,
    ) -> Result<Self, ApduError> {
        if abf.is_some() && vbf.is_none() {
            return Err(ApduError::InvalidEncoding);
        }

        Ok(Self {
            asset_tag,
            value,
            output_index,
            vbf,
            abf,
        })
    }

    /// P1 selector for the supplied blinding factors
    pub fn p1(&self) -> u8 {
        match (self.vbf, self.abf) {
            (Some(_), Some(_)) => P1_BOTH_BLINDING_FACTORS,
            (Some(_), None) => P1_VALUE_BLINDING_FACTOR,
            _ => P1_NO_BLINDING_FACTORS,
        }
    }

    /// Encode into `buff` and frame as an [`ApduCommand`]
    pub fn apdu<'b>(&self, buff: &'b mut [u8]) -> Result<ApduCommand<'b>, ApduError> {
        let n = self.encode(buff)?;

        Ok(ApduCommand {
            cla: crate::BTC_APDU_CLA,
            ins: Instruction::LiquidGetCommitments as u8,
            p1: self.p1(),
            p2: 0x00,
            data: &buff[..n],
        })
    }
}

impl Encode for LiquidCommitmentsReq<'_> {
    type Error = ApduError;

    fn encode_len(&self) -> Result<usize, ApduError> {
        let mut n = 32 + 32 + 4;
        if self.vbf.is_some() {
            n += 32;
        }
        if self.abf.is_some() {
            n += 32;
        }
        Ok(n)
    }

    fn encode(&self, buff: &mut [u8]) -> Result<usize, ApduError> {
        if buff.len() < self.encode_len()? {
            return Err(ApduError::InvalidLength);
        }

        let mut index = 0;

        buff[index..][..32].copy_from_slice(self.asset_tag);
        index += 32;

        buff[index..][..32].copy_from_slice(self.value);
        index += 32;

        BigEndian::write_u32(&mut buff[index..][..4], self.output_index);
        index += 4;

        if let Some(vbf) = self.vbf {
            buff[index..][..32].copy_from_slice(vbf);
            index += 32;
        }

        if let Some(abf) = self.abf {
            buff[index..][..32].copy_from_slice(abf);
            index += 32;
        }

        Ok(index)
    }
}

/// Liquid commitment response, parsed positionally from the response payload
/// (transport status word already stripped).
///
/// ## Encoding:
/// ```text
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                                                               |
/// /                 ASSET_BLINDING_FACTOR (32-byte)               /
/// |                                                               |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                                                               |
/// /                 VALUE_BLINDING_FACTOR (32-byte)               /
/// |                                                               |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                                                               |
/// /                  COMMITMENT (variable length)                 /
/// |                                                               |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LiquidCommitmentsResp<'a> {
    /// Asset blinding factor selected by the device (or echoed back)
    pub abf: [u8; 32],
    /// Value blinding factor selected by the device (or echoed back)
    pub vbf: [u8; 32],
    /// Concatenated asset and value commitment
    pub commitment: &'a [u8],
}

impl<'a> Decode<'a> for LiquidCommitmentsResp<'a> {
    type Output = Self;
    type Error = ApduError;

    fn decode(buff: &'a [u8]) -> Result<(Self, usize), ApduError> {
        if buff.len() < 64 {
            return Err(ApduError::InvalidLength);
        }

        let mut abf = [0u8; 32];
        abf.copy_from_slice(&buff[..32]);

        let mut vbf = [0u8; 32];
        vbf.copy_from_slice(&buff[32..64]);

        Ok((
            Self {
                abf,
                vbf,
                commitment: &buff[64..],
            },
            buff.len(),
        ))
    }
}
