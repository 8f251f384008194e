#![allow(unused)]

use std::sync::Mutex;

use async_trait::async_trait;
use log::debug;

use ledger_btc::{
    apdu::{ApduCommand, Features, Instruction, SW_OK},
    device::{DeviceCommands, TrustedInput, WalletPublicKey},
    sign::{IssuanceData, SignEvents, SignInput, SignOutput, StreamingProgress},
    transport::Exchange,
    tx::Transaction,
    Error,
};

/// Initialise test logging (safe to call repeatedly)
pub fn setup() {
    let _ = simplelog::SimpleLogger::init(log::LevelFilter::Debug, simplelog::Config::default());
}

/// Raw APDU exchange captured by the mock
#[derive(Clone, Debug, PartialEq)]
pub struct RecordedApdu {
    pub cla: u8,
    pub ins: u8,
    pub p1: u8,
    pub p2: u8,
    pub data: Vec<u8>,
}

/// Device command invocation captured by the mock
#[derive(Clone, Debug)]
pub enum Call {
    TrustedInput {
        output_index: u32,
        transaction: Vec<u8>,
        features: Features,
    },
    WalletPublicKey {
        path: String,
    },
    ChangePath {
        path: String,
    },
    StartUntrusted {
        new_transaction: bool,
        transaction: Transaction,
        trusted_inputs: Vec<TrustedInput>,
    },
    Sign {
        path: String,
        lock_time: u32,
        sig_hash_type: u8,
        tweak: Option<Vec<u8>>,
    },
}

/// Scripted in-memory device, standing in for a transport plus wallet app
pub struct MockDevice {
    pub calls: Mutex<Vec<Call>>,
    pub exchanges: Mutex<Vec<RecordedApdu>>,
    /// Commitment pair returned for commitment requests
    pub commitment: Vec<u8>,
    /// Uncompressed public key returned for every key request
    pub public_key: Vec<u8>,
    /// Signature returned for every signature request
    pub signature: Vec<u8>,
    /// Trusted-input token returned for every trusted-input request
    pub trusted_input: Vec<u8>,
}

impl Default for MockDevice {
    fn default() -> Self {
        let mut public_key = vec![0x04];
        public_key.extend_from_slice(&[0x11; 32]);
        public_key.extend_from_slice(&[0x22; 32]);

        Self {
            calls: Mutex::new(Vec::new()),
            exchanges: Mutex::new(Vec::new()),
            commitment: [vec![0x0a; 33], vec![0x0b; 33]].concat(),
            public_key,
            signature: vec![0x30, 0x44, 0x02, 0x20, 0x99],
            trusted_input: vec![0x33; 56],
        }
    }
}

impl MockDevice {
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn exchanges(&self) -> Vec<RecordedApdu> {
        self.exchanges.lock().unwrap().clone()
    }

    /// Recorded exchanges for one instruction
    pub fn exchanges_for(&self, ins: Instruction) -> Vec<RecordedApdu> {
        self.exchanges()
            .into_iter()
            .filter(|e| e.ins == ins as u8)
            .collect()
    }
}

#[async_trait]
impl Exchange for MockDevice {
    type Error = anyhow::Error;

    async fn exchange(&self, command: ApduCommand<'_>) -> Result<Vec<u8>, Self::Error> {
        debug!(
            "exchange ins: {:#04x} p1: {:#04x} ({} bytes)",
            command.ins,
            command.p1,
            command.data.len()
        );

        let ins = command.ins;
        self.exchanges.lock().unwrap().push(RecordedApdu {
            cla: command.cla,
            ins: command.ins,
            p1: command.p1,
            p2: command.p2,
            data: command.data.to_vec(),
        });

        let mut resp = Vec::new();
        if ins == Instruction::LiquidGetCommitments as u8 {
            // abf, vbf, then the commitment pair
            resp.extend_from_slice(&[0xaa; 32]);
            resp.extend_from_slice(&[0xbb; 32]);
            resp.extend_from_slice(&self.commitment);
        }
        resp.extend_from_slice(&SW_OK.to_be_bytes());

        Ok(resp)
    }
}

#[async_trait]
impl DeviceCommands for MockDevice {
    async fn get_trusted_input(
        &self,
        output_index: u32,
        transaction: &[u8],
        features: Features,
    ) -> Result<Vec<u8>, Error<Self::Error>> {
        self.calls.lock().unwrap().push(Call::TrustedInput {
            output_index,
            transaction: transaction.to_vec(),
            features,
        });
        Ok(self.trusted_input.clone())
    }

    async fn get_wallet_public_key(
        &self,
        path: &str,
    ) -> Result<WalletPublicKey, Error<Self::Error>> {
        self.calls.lock().unwrap().push(Call::WalletPublicKey {
            path: path.to_string(),
        });
        Ok(WalletPublicKey {
            public_key: self.public_key.clone(),
        })
    }

    async fn provide_change_path(&self, path: &str) -> Result<(), Error<Self::Error>> {
        self.calls.lock().unwrap().push(Call::ChangePath {
            path: path.to_string(),
        });
        Ok(())
    }

    async fn start_untrusted_hash_tx_input(
        &self,
        new_transaction: bool,
        transaction: &Transaction,
        trusted_inputs: &[TrustedInput],
        _bip143: bool,
        _overwinter: bool,
        _features: Features,
    ) -> Result<(), Error<Self::Error>> {
        self.calls.lock().unwrap().push(Call::StartUntrusted {
            new_transaction,
            transaction: transaction.clone(),
            trusted_inputs: trusted_inputs.to_vec(),
        });
        Ok(())
    }

    async fn sign_transaction(
        &self,
        path: &str,
        lock_time: u32,
        sig_hash_type: u8,
        _extra: Option<&[u8]>,
        tweak: Option<&[u8]>,
        _features: Features,
    ) -> Result<Vec<u8>, Error<Self::Error>> {
        self.calls.lock().unwrap().push(Call::Sign {
            path: path.to_string(),
            lock_time,
            sig_hash_type,
            tweak: tweak.map(|t| t.to_vec()),
        });
        Ok(self.signature.clone())
    }
}

/// Event sink recording every notification
#[derive(Default)]
pub struct RecordingEvents {
    pub progress: Mutex<Vec<StreamingProgress>>,
    pub requested: Mutex<usize>,
    pub granted: Mutex<usize>,
}

impl SignEvents for RecordingEvents {
    fn on_device_streaming(&self, progress: StreamingProgress) {
        self.progress.lock().unwrap().push(progress);
    }

    fn on_device_signature_requested(&self) {
        *self.requested.lock().unwrap() += 1;
    }

    fn on_device_signature_granted(&self) {
        *self.granted.lock().unwrap() += 1;
    }
}

impl RecordingEvents {
    pub fn progress(&self) -> Vec<StreamingProgress> {
        self.progress.lock().unwrap().clone()
    }
}

/// A plain input spending output 0 of an opaque source transaction
pub fn basic_input() -> SignInput {
    SignInput {
        transaction: "01000000010000000000000000000000000000000000000000000000000000000000000000000000000000ffffffff0100e1f505000000000000000000".to_string(),
        output_index: 0,
        redeem_script: None,
        sequence: None,
        tweak: None,
        issuance: None,
    }
}

/// An input declaring an asset issuance, with distinct byte patterns so the
/// reversals are observable
pub fn issuance_input() -> SignInput {
    let nonce: Vec<u8> = (0x00..0x20).collect();
    let entropy: Vec<u8> = (0x20..0x40).collect();

    SignInput {
        issuance: Some(IssuanceData {
            nonce: hex::encode(nonce),
            entropy: hex::encode(entropy),
            issuance_amount: "010000000005f5e100".to_string(),
            inflation_keys: "00".to_string(),
        }),
        ..basic_input()
    }
}

/// An output requiring a device commitment request
pub fn commitment_output() -> SignOutput {
    SignOutput {
        asset: "ab".repeat(32),
        value: "cd".repeat(32),
        script: format!("76a914{}88ac", "55".repeat(20)),
        blinding_key: "66".repeat(33),
        nonce: "77".repeat(33),
        vbf: Some("88".repeat(32)),
        abf: Some("99".repeat(32)),
        asset_commitment: None,
        value_commitment: None,
    }
}

/// A pre-blinded output carrying its commitments directly
pub fn direct_output() -> SignOutput {
    SignOutput {
        asset: "ab".repeat(32),
        value: "cd".repeat(32),
        script: format!("76a914{}88ac", "44".repeat(20)),
        blinding_key: "66".repeat(33),
        nonce: "77".repeat(33),
        vbf: None,
        abf: None,
        asset_commitment: Some("f1".repeat(33)),
        value_commitment: Some("f2".repeat(33)),
    }
}

/// An unspendable null-data output
pub fn op_return_output() -> SignOutput {
    SignOutput {
        asset: "ab".repeat(32),
        value: "01020304".to_string(),
        script: "6a04deadbeef".to_string(),
        blinding_key: "66".repeat(33),
        nonce: "77".repeat(33),
        vbf: None,
        abf: None,
        asset_commitment: None,
        value_commitment: None,
    }
}
