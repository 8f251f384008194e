// Copyright (c) 2022-2023 Ledger SAS

//! Liquid transaction signing orchestration
//!
//! [`create_liquid_transaction`] drives the full device protocol for one
//! signing operation: trusted-input acquisition, public key collection, two
//! streaming passes over the inputs, output and issuance provisioning and
//! per-input signature collection. Phases are strictly sequential because
//! each exchange depends on state the device accumulated from the previous
//! one; a failed exchange aborts the whole attempt and any device-side state
//! must be rebuilt from the first phase on retry.

use log::debug;
use serde::{Deserialize, Serialize};

use ledger_btc_apdu::Features;

use crate::{
    constants::{DEFAULT_LOCKTIME, DEFAULT_SEQUENCE, DEFAULT_VERSION, OP_RETURN, SIGHASH_ALL},
    device::{DeviceCommands, TrustedInput},
    script::{compress_public_key, hash_public_key, p2pkh_script},
    tx::{InputIssuance, Transaction, TransactionInput},
    Error,
};

mod commitments;
pub use commitments::{get_commitments, Commitments};

mod issuance;
pub use issuance::{build_issuance_information, provide_issuance_information};

mod outputs;
pub use outputs::{provide_outputs, LiquidOutputData};

/// Issuance fields for one input, hex encoded. Either all four are supplied
/// or the input carries no issuance data.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuanceData {
    /// 32-byte issuance nonce
    pub nonce: String,
    /// 32-byte issuance entropy
    pub entropy: String,
    /// Confidential-encoded issuance amount
    pub issuance_amount: String,
    /// Confidential-encoded inflation keys amount
    pub inflation_keys: String,
}

/// One input of a signing request
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInput {
    /// Raw source transaction, hex encoded
    pub transaction: String,
    /// Index of the output being spent
    pub output_index: u32,
    /// Redeem script overriding the default pay-to-pubkey-hash spend
    #[serde(default)]
    pub redeem_script: Option<String>,
    /// Sequence number, defaulting to [`DEFAULT_SEQUENCE`]
    #[serde(default)]
    pub sequence: Option<u32>,
    /// Signature tweak value forwarded with the signature request
    #[serde(default)]
    pub tweak: Option<String>,
    /// Issuance data when this input declares an asset issuance
    #[serde(default)]
    pub issuance: Option<IssuanceData>,
}

/// One output of a signing request, hex encoded throughout
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignOutput {
    /// Cleartext asset tag
    pub asset: String,
    /// Cleartext value
    pub value: String,
    /// Output script
    pub script: String,
    /// Remote blinding key
    pub blinding_key: String,
    /// Ephemeral range-proof public key
    pub nonce: String,
    /// Value blinding factor to use for this output
    #[serde(default)]
    pub vbf: Option<String>,
    /// Asset blinding factor to use for this output
    #[serde(default)]
    pub abf: Option<String>,
    /// Externally computed asset commitment (pre-blinded outputs)
    #[serde(default)]
    pub asset_commitment: Option<String>,
    /// Externally computed value commitment (pre-blinded outputs)
    #[serde(default)]
    pub value_commitment: Option<String>,
}

/// Signing options with their chain defaults
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SignOptions {
    /// Transaction lock time
    pub lock_time: u32,
    /// Signature hash type
    pub sig_hash_type: u8,
    /// Feature flag strings; "liquid" is added if absent
    pub additionals: Vec<String>,
}

impl Default for SignOptions {
    fn default() -> Self {
        Self {
            lock_time: DEFAULT_LOCKTIME,
            sig_hash_type: SIGHASH_ALL,
            additionals: Vec::new(),
        }
    }
}

/// Caller-facing signing request
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiquidSignRequest {
    pub inputs: Vec<SignInput>,
    /// Derivation path per input; empty or absent means do not sign
    pub associated_keysets: Vec<String>,
    /// Change derivation path, declared after the first streaming pass
    #[serde(default)]
    pub change_path: Option<String>,
    pub outputs: Vec<SignOutput>,
    #[serde(flatten)]
    pub options: SignOptions,
}

/// Input streaming progress, reported across both passes
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct StreamingProgress {
    /// Monotonic 0..=1 progression
    pub progress: f32,
    /// Completed step index
    pub index: usize,
    /// Total step count over both passes
    pub total: usize,
}

/// Lifecycle hooks for one signing operation.
///
/// Invoked synchronously inline with the phase that triggers them; they must
/// not block or they stall the whole protocol.
pub trait SignEvents {
    /// Input streaming progress; suppressed for fewer than 3 inputs
    fn on_device_streaming(&self, _progress: StreamingProgress) {}
    /// The device is about to be asked for user confirmation
    fn on_device_signature_requested(&self) {}
    /// The device granted signing, fired before the first signature request
    fn on_device_signature_granted(&self) {}
}

/// No-op event sink
#[derive(Copy, Clone, Debug, Default)]
pub struct NoEvents;

impl SignEvents for NoEvents {}

/// Validated input, all hex decoded
struct PreparedInput {
    raw_tx: Vec<u8>,
    output_index: u32,
    redeem_script: Option<Vec<u8>>,
    sequence: u32,
    tweak: Option<Vec<u8>>,
    issuance: Option<InputIssuance>,
}

/// Validated output, all hex decoded
struct PreparedOutput {
    asset: Vec<u8>,
    value: Vec<u8>,
    script: Vec<u8>,
    blinding_key: Vec<u8>,
    nonce: Vec<u8>,
    vbf: Option<Vec<u8>>,
    abf: Option<Vec<u8>>,
    /// Externally supplied `(asset_commitment, value_commitment)` pair
    direct: Option<(Vec<u8>, Vec<u8>)>,
}

fn hex_field<E: core::fmt::Display + core::fmt::Debug>(
    field: &'static str,
    value: &str,
) -> Result<Vec<u8>, Error<E>> {
    hex::decode(value).map_err(|source| Error::Hex { field, source })
}

fn opt_hex_field<E: core::fmt::Display + core::fmt::Debug>(
    field: &'static str,
    value: &Option<String>,
) -> Result<Option<Vec<u8>>, Error<E>> {
    value.as_deref().map(|v| hex_field(field, v)).transpose()
}

fn prepare_inputs<E: core::fmt::Display + core::fmt::Debug>(
    inputs: &[SignInput],
) -> Result<Vec<PreparedInput>, Error<E>> {
    inputs
        .iter()
        .map(|input| {
            let issuance = match &input.issuance {
                Some(data) => Some(InputIssuance {
                    nonce: hex_field("issuance.nonce", &data.nonce)?,
                    entropy: hex_field("issuance.entropy", &data.entropy)?,
                    issuance_amount: hex_field("issuance.issuanceAmount", &data.issuance_amount)?,
                    inflation_keys: hex_field("issuance.inflationKeys", &data.inflation_keys)?,
                }),
                None => None,
            };

            Ok(PreparedInput {
                raw_tx: hex_field("transaction", &input.transaction)?,
                output_index: input.output_index,
                redeem_script: opt_hex_field("redeemScript", &input.redeem_script)?,
                sequence: input.sequence.unwrap_or(DEFAULT_SEQUENCE),
                tweak: opt_hex_field("tweak", &input.tweak)?,
                issuance,
            })
        })
        .collect()
}

fn prepare_outputs<E: core::fmt::Display + core::fmt::Debug>(
    outputs: &[SignOutput],
) -> Result<Vec<PreparedOutput>, Error<E>> {
    outputs
        .iter()
        .map(|output| {
            let direct = match (&output.asset_commitment, &output.value_commitment) {
                (Some(ac), Some(vc)) => Some((
                    hex_field("assetCommitment", ac)?,
                    hex_field("valueCommitment", vc)?,
                )),
                _ => None,
            };

            let prepared = PreparedOutput {
                asset: hex_field("asset", &output.asset)?,
                value: hex_field("value", &output.value)?,
                script: hex_field("script", &output.script)?,
                blinding_key: hex_field("blindingKey", &output.blinding_key)?,
                nonce: hex_field("nonce", &output.nonce)?,
                vbf: opt_hex_field("vbf", &output.vbf)?,
                abf: opt_hex_field("abf", &output.abf)?,
                direct,
            };

            // Outputs needing a commitment request must be fully specified
            // before any device exchange is issued
            if prepared.direct.is_none() && needs_commitments(&prepared.script) {
                if prepared.asset.len() != 32 {
                    return Err(Error::InvalidRequest("output asset tag must be 32 bytes"));
                }
                if prepared.value.len() != 32 {
                    return Err(Error::InvalidRequest("output value must be 32 bytes"));
                }
                match (&prepared.vbf, &prepared.abf) {
                    (Some(vbf), Some(abf)) if vbf.len() == 32 && abf.len() == 32 => (),
                    (Some(_), Some(_)) => {
                        return Err(Error::InvalidRequest("blinding factors must be 32 bytes"))
                    }
                    _ => {
                        return Err(Error::InvalidRequest(
                            "output requires value and asset blinding factors",
                        ))
                    }
                }
            }

            Ok(prepared)
        })
        .collect()
}

/// A commitment request is needed unless the script marks the output
/// unspendable
fn needs_commitments(script: &[u8]) -> bool {
    !script.is_empty() && script[0] != OP_RETURN
}

/// Synthetic commitment encoding for unspendable (null-data) outputs
fn null_commitments(asset: &[u8], value: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(asset.len() + value.len() + 2);
    out.push(0x01);
    out.extend(value.iter().rev());
    out.push(0x01);
    out.extend_from_slice(asset);
    out
}

/// Sign a Liquid transaction with the device.
///
/// Returns one lowercase hex signature per input, with an empty string for
/// inputs whose associated keyset is empty or absent. Any failure aborts the
/// whole attempt; no partial signature list is returned.
pub async fn create_liquid_transaction<D, V>(
    device: &D,
    request: &LiquidSignRequest,
    events: &V,
) -> Result<Vec<String>, Error<D::Error>>
where
    D: DeviceCommands + Sync,
    V: SignEvents + ?Sized,
{
    // Validate and decode the whole request up front so malformed caller
    // input cannot leave the device half-initialised
    let inputs = prepare_inputs(&request.inputs)?;
    let outputs = prepare_outputs(&request.outputs)?;

    let features =
        Features::from_additionals(&request.options.additionals) | Features::LIQUID;

    let n = inputs.len();
    let notify = |pass: usize, step: usize| {
        // Not enough significant events to be worth notifying
        if n < 3 {
            return;
        }
        let index = n * pass + step;
        let total = 2 * n;
        events.on_device_streaming(StreamingProgress {
            progress: index as f32 / total as f32,
            index,
            total,
        });
    };

    let keyset = |i: usize| {
        request
            .associated_keysets
            .get(i)
            .map(String::as_str)
            .unwrap_or("")
    };

    // Device-side working transaction: placeholder inputs, individualised
    // per input during the second pass
    let mut target = Transaction {
        version: DEFAULT_VERSION.to_le_bytes(),
        inputs: inputs
            .iter()
            .map(|input| TransactionInput {
                sequence: input.sequence.to_le_bytes(),
                ..Default::default()
            })
            .collect(),
        liquid: true,
        ..Default::default()
    };

    notify(0, 0);

    // Trusted-input phase
    let mut trusted_inputs = Vec::with_capacity(n);
    for input in &inputs {
        let mut f = features;
        if input.issuance.is_some() {
            f |= Features::ISSUANCE;
        }

        debug!("requesting trusted input for prevout index {}", input.output_index);

        let token = device
            .get_trusted_input(input.output_index, &input.raw_tx, f)
            .await?;

        trusted_inputs.push(TrustedInput {
            value: token,
            sequence: input.sequence.to_le_bytes(),
        });
    }

    // Key-collection phase
    let mut responses = Vec::with_capacity(n);
    for i in 0..n {
        let r = device.get_wallet_public_key(keyset(i)).await?;
        notify(0, i + 1);
        responses.push(r);
    }

    let mut public_keys = Vec::with_capacity(n);
    for r in &responses {
        let key = compress_public_key(&r.public_key).ok_or(Error::InvalidPublicKey)?;
        public_keys.push(key);
    }

    events.on_device_signature_requested();

    // First streaming pass establishes the device's working context
    debug!("streaming transaction context ({} inputs)", n);
    device
        .start_untrusted_hash_tx_input(true, &target, &trusted_inputs, true, false, features)
        .await?;

    if let Some(change_path) = &request.change_path {
        device.provide_change_path(change_path).await?;
    }

    // Output construction
    let mut liquid_outputs = Vec::with_capacity(outputs.len());
    for (i, output) in outputs.iter().enumerate() {
        let data = if let Some((asset_commitment, value_commitment)) = &output.direct {
            // Pre-blinded output: commitments are used verbatim and no
            // blinding key is declared
            LiquidOutputData {
                asset_value_commitments: [asset_commitment.clone(), value_commitment.clone()]
                    .concat(),
                nonce: output.nonce.clone(),
                remote_blinding_key: None,
                script: output.script.clone(),
            }
        } else if needs_commitments(&output.script) {
            // Lengths are pre-validated, so these conversions cannot fail
            let asset: &[u8; 32] = output.asset.as_slice().try_into()
                .map_err(|_| Error::InvalidRequest("output asset tag must be 32 bytes"))?;
            let value: &[u8; 32] = output.value.as_slice().try_into()
                .map_err(|_| Error::InvalidRequest("output value must be 32 bytes"))?;
            let vbf: &[u8; 32] = output.vbf.as_deref().and_then(|v| v.try_into().ok())
                .ok_or(Error::InvalidRequest("output requires value and asset blinding factors"))?;
            let abf: &[u8; 32] = output.abf.as_deref().and_then(|v| v.try_into().ok())
                .ok_or(Error::InvalidRequest("output requires value and asset blinding factors"))?;

            let c = get_commitments(device, asset, value, i as u32, Some(vbf), Some(abf)).await?;

            LiquidOutputData {
                asset_value_commitments: c.commitment,
                nonce: output.nonce.clone(),
                remote_blinding_key: Some(output.blinding_key.clone()),
                script: output.script.clone(),
            }
        } else {
            LiquidOutputData {
                asset_value_commitments: null_commitments(&output.asset, &output.value),
                nonce: output.nonce.clone(),
                remote_blinding_key: Some(output.blinding_key.clone()),
                script: output.script.clone(),
            }
        };

        liquid_outputs.push(data);
    }

    provide_outputs(device, &liquid_outputs).await?;

    // Issuance phase
    let information = build_issuance_information(inputs.iter().map(|i| i.issuance.as_ref()));
    provide_issuance_information(device, &information).await?;

    // Second pass: individualise and sign each input
    let mut signatures = Vec::with_capacity(n);
    let mut first_run = true;
    for (i, input) in inputs.iter().enumerate() {
        let path = keyset(i);
        if path.is_empty() {
            signatures.push(String::new());
            continue;
        }

        let script = match &input.redeem_script {
            Some(redeem_script) => redeem_script.clone(),
            None => p2pkh_script(&hash_public_key(&public_keys[i])),
        };

        let mut pseudo_input = target.inputs[i].clone();
        pseudo_input.script = script;
        if let Some(issuance) = &input.issuance {
            pseudo_input.issuance = Some(InputIssuance {
                nonce: issuance.nonce.iter().rev().copied().collect(),
                entropy: issuance.entropy.iter().rev().copied().collect(),
                issuance_amount: issuance.issuance_amount.clone(),
                inflation_keys: issuance.inflation_keys.clone(),
            });
        }

        let mut pseudo = target.clone();
        pseudo.inputs = vec![pseudo_input];

        debug!("streaming individualised context for input {}", i);

        device
            .start_untrusted_hash_tx_input(
                false,
                &pseudo,
                core::slice::from_ref(&trusted_inputs[i]),
                true,
                false,
                features,
            )
            .await?;

        if first_run {
            events.on_device_signature_granted();
            notify(1, 0);
        }

        let signature = device
            .sign_transaction(
                path,
                request.options.lock_time,
                request.options.sig_hash_type,
                None,
                input.tweak.as_deref(),
                features,
            )
            .await?;
        notify(1, i + 1);

        signatures.push(hex::encode(signature));
        target.inputs[i].script = Vec::new();
        first_run = false;
    }

    Ok(signatures)
}
