// Copyright (c) 2022-2023 Ledger SAS

//! Transaction decoding and re-encoding
//!
//! The supported formats are self-describing only through a combination of
//! the version constant, one or two sniffed bytes and caller-supplied hints,
//! so decoding is a single forward pass where every branch must consume
//! exactly the bytes its format defines.

use ledger_btc_apdu::Features;

use super::{
    confidential::confidential_data_size, varint, Error, InputIssuance, Transaction,
    TransactionInput, TransactionOutput,
};

/// Zcash Overwinter version field
const OVERWINTER_VERSION: [u8; 4] = [0x03, 0x00, 0x00, 0x80];

/// Zcash Sapling version field
const SAPLING_VERSION: [u8; 4] = [0x04, 0x00, 0x00, 0x80];

/// Decode options for [`Transaction::parse`]
#[derive(Copy, Clone, Debug, PartialEq, Default)]
pub struct ParseOptions {
    /// Sniff for a segwit marker after the version field
    pub segwit_supported: bool,
    /// Format carries a 4-byte timestamp after the version
    pub has_timestamp: bool,
    /// Capture trailing chain-specific bytes verbatim
    pub has_extra_data: bool,
    /// Format flags; `LIQUID` and `DECRED` select their layouts
    pub flags: Features,
}

/// Bounds-checked forward cursor over the raw transaction
struct Reader<'a> {
    buf: &'a [u8],
    offset: usize,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, offset: 0 }
    }

    fn offset(&self) -> usize {
        self.offset
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], Error> {
        let end = self.offset.checked_add(n).ok_or(Error::MalformedEncoding {
            offset: self.offset,
            needed: n,
        })?;

        let d = self.buf.get(self.offset..end).ok_or(Error::MalformedEncoding {
            offset: self.offset,
            needed: n,
        })?;

        self.offset = end;
        Ok(d)
    }

    fn take_array<const N: usize>(&mut self) -> Result<[u8; N], Error> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    fn take_u8(&mut self) -> Result<u8, Error> {
        Ok(self.take(1)?[0])
    }

    fn skip(&mut self, n: usize) -> Result<(), Error> {
        self.take(n).map(|_| ())
    }

    fn peek(&self) -> Result<u8, Error> {
        self.buf
            .get(self.offset)
            .copied()
            .ok_or(Error::MalformedEncoding {
                offset: self.offset,
                needed: 1,
            })
    }

    fn peek2(&self) -> Option<(u8, u8)> {
        match (self.buf.get(self.offset), self.buf.get(self.offset + 1)) {
            (Some(a), Some(b)) => Some((*a, *b)),
            _ => None,
        }
    }

    fn varint(&mut self) -> Result<u64, Error> {
        let (value, consumed) = varint::read_varint(self.buf, self.offset)?;
        self.offset += consumed;
        Ok(value)
    }

    /// Remaining bytes, without consuming them
    fn rest(&self) -> &'a [u8] {
        &self.buf[self.offset..]
    }
}

impl Transaction {
    /// Decode a raw transaction byte stream into the canonical model.
    ///
    /// Fails without returning a partial transaction if any read runs past
    /// the end of the stream or a format marker is invalid.
    pub fn parse(raw: &[u8], opts: &ParseOptions) -> Result<Transaction, Error> {
        let decred = opts.flags.contains(Features::DECRED);
        let liquid = opts.flags.contains(Features::LIQUID);

        let mut r = Reader::new(raw);
        let mut witness = false;

        let version: [u8; 4] = r.take_array()?;
        let overwinter = version == OVERWINTER_VERSION || version == SAPLING_VERSION;

        if liquid {
            let marker = r.take_u8()?;
            if marker != 1 {
                return Err(Error::UnsupportedLiquidVersion(marker));
            }
            witness = true;
        } else if !opts.has_timestamp && opts.segwit_supported {
            if let Some((0, flag)) = r.peek2() {
                if flag != 0 {
                    r.skip(2)?;
                    witness = true;
                }
            }
        }

        let timestamp = match opts.has_timestamp {
            true => Some(r.take_array::<4>()?),
            false => None,
        };

        let version_group_id = match overwinter {
            true => Some(r.take_array::<4>()?),
            false => None,
        };

        let input_count = r.varint()?;
        let mut inputs = Vec::new();
        for _ in 0..input_count {
            let mut prevout = r.take(36)?.to_vec();

            let mut script = Vec::new();
            let mut tree = None;
            if !decred {
                let n = r.varint()? as usize;
                script = r.take(n)?.to_vec();
            } else {
                // Decred carries scripts in the trailing witness section
                tree = Some(r.take_u8()?);
            }

            let sequence: [u8; 4] = r.take_array()?;

            let mut issuance = None;
            if liquid && prevout[35] & 0x80 != 0 {
                prevout[35] &= 0x7f;

                let nonce = r.take(32)?.to_vec();
                let entropy = r.take(32)?.to_vec();

                let n = confidential_data_size(r.peek()?, true, false)?;
                let issuance_amount = r.take(n)?.to_vec();

                let n = confidential_data_size(r.peek()?, false, true)?;
                let inflation_keys = r.take(n)?.to_vec();

                issuance = Some(InputIssuance {
                    nonce,
                    entropy,
                    issuance_amount,
                    inflation_keys,
                });
            }

            inputs.push(TransactionInput {
                prevout,
                script,
                sequence,
                tree,
                issuance,
            });
        }

        let output_count = r.varint()?;
        let mut outputs = Vec::new();
        for _ in 0..output_count {
            let (amount, asset_commitment, nonce) = if liquid {
                let n = confidential_data_size(r.peek()?, false, false)?;
                let asset_commitment = r.take(n)?.to_vec();

                let n = confidential_data_size(r.peek()?, true, false)?;
                let amount = r.take(n)?.to_vec();

                let n = confidential_data_size(r.peek()?, false, true)?;
                let nonce = r.take(n)?.to_vec();

                (amount, Some(asset_commitment), Some(nonce))
            } else {
                (r.take(8)?.to_vec(), None, None)
            };

            if decred {
                // Script version
                r.skip(2)?;
            }

            let n = r.varint()? as usize;
            let script = r.take(n)?.to_vec();

            outputs.push(TransactionOutput {
                amount,
                script,
                asset_commitment,
                nonce,
            });
        }

        let mut witness_data = None;
        let locktime: [u8; 4];
        if witness {
            if liquid {
                locktime = r.take_array()?;
                witness_data = Some(r.rest().to_vec());
            } else {
                // Witness payload runs to the last 4 bytes; the locktime is
                // taken from the absolute end of the stream
                let end = raw.len() - 4;
                let ws = match r.offset() <= end {
                    true => raw[r.offset()..end].to_vec(),
                    false => Vec::new(),
                };
                witness_data = Some(ws);

                let mut lt = [0u8; 4];
                lt.copy_from_slice(&raw[end..]);
                locktime = lt;

                r.skip(4)?;
            }
        } else {
            locktime = r.take_array()?;
        }

        let expiry_height = match overwinter || decred {
            true => Some(r.take_array::<4>()?),
            false => None,
        };

        let extra_data = match opts.has_extra_data {
            true => Some(r.rest().to_vec()),
            false => None,
        };

        if decred {
            let witness_count = r.varint()?;
            if witness_count != input_count {
                return Err(Error::WitnessCountMismatch {
                    expected: input_count,
                    actual: witness_count,
                });
            }

            for input in inputs.iter_mut() {
                // Amount, block height, block index
                r.skip(16)?;

                let n = r.varint()? as usize;
                input.script = r.take(n)?.to_vec();
            }
        }

        Ok(Transaction {
            version,
            inputs,
            outputs,
            locktime: Some(locktime),
            witness: witness_data,
            timestamp,
            version_group_id,
            expiry_height,
            extra_data,
            liquid,
        })
    }

    /// Re-encode the model in the layout [`Transaction::parse`] consumes.
    ///
    /// The segwit marker flag byte is normalised to 0x01; Decred's trailing
    /// witness section and per-output script-version columns are not
    /// reproduced.
    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::new();

        out.extend_from_slice(&self.version);

        if self.liquid {
            out.push(0x01);
        } else if self.witness.is_some() {
            out.extend_from_slice(&[0x00, 0x01]);
        }

        if let Some(timestamp) = &self.timestamp {
            out.extend_from_slice(timestamp);
        }
        if let Some(version_group_id) = &self.version_group_id {
            out.extend_from_slice(version_group_id);
        }

        out.extend_from_slice(&varint::write_varint(self.inputs.len() as u64));
        for input in &self.inputs {
            // Parsing masks the issuance flag off the prevout index; restore
            // it for inputs carrying issuance data
            if self.liquid && input.issuance.is_some() && input.prevout.len() == 36 {
                let mut prevout = input.prevout.clone();
                prevout[35] |= 0x80;
                out.extend_from_slice(&prevout);
            } else {
                out.extend_from_slice(&input.prevout);
            }

            match input.tree {
                Some(tree) => out.push(tree),
                None => {
                    out.extend_from_slice(&varint::write_varint(input.script.len() as u64));
                    out.extend_from_slice(&input.script);
                }
            }

            out.extend_from_slice(&input.sequence);

            if let Some(issuance) = &input.issuance {
                out.extend_from_slice(&issuance.nonce);
                out.extend_from_slice(&issuance.entropy);
                out.extend_from_slice(&issuance.issuance_amount);
                out.extend_from_slice(&issuance.inflation_keys);
            }
        }

        out.extend_from_slice(&varint::write_varint(self.outputs.len() as u64));
        for output in &self.outputs {
            if self.liquid {
                if let Some(asset_commitment) = &output.asset_commitment {
                    out.extend_from_slice(asset_commitment);
                }
                out.extend_from_slice(&output.amount);
                if let Some(nonce) = &output.nonce {
                    out.extend_from_slice(nonce);
                }
            } else {
                out.extend_from_slice(&output.amount);
            }

            out.extend_from_slice(&varint::write_varint(output.script.len() as u64));
            out.extend_from_slice(&output.script);
        }

        match (self.liquid, &self.witness) {
            (true, witness) => {
                if let Some(locktime) = &self.locktime {
                    out.extend_from_slice(locktime);
                }
                if let Some(witness) = witness {
                    out.extend_from_slice(witness);
                }
            }
            (false, Some(witness)) => {
                out.extend_from_slice(witness);
                if let Some(locktime) = &self.locktime {
                    out.extend_from_slice(locktime);
                }
            }
            (false, None) => {
                if let Some(locktime) = &self.locktime {
                    out.extend_from_slice(locktime);
                }
            }
        }

        if let Some(expiry_height) = &self.expiry_height {
            out.extend_from_slice(expiry_height);
        }
        if let Some(extra_data) = &self.extra_data {
            out.extend_from_slice(extra_data);
        }

        out
    }
}
