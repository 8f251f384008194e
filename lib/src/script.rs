// Copyright (c) 2022-2023 Ledger SAS

//! Public key and script helpers for standard spends

use ripemd::Ripemd160;
use sha2::{Digest, Sha256};

use crate::constants::{HASH_SIZE, OP_CHECKSIG, OP_DUP, OP_EQUALVERIFY, OP_HASH160};

/// Compress a SECP256k1 public key.
///
/// Uncompressed (0x04) keys are reduced to the X coordinate with an even /
/// odd Y prefix; already-compressed keys pass through. Returns `None` for
/// any other prefix.
pub fn compress_public_key(key: &[u8]) -> Option<Vec<u8>> {
    match key.first() {
        Some(0x02) | Some(0x03) if key.len() >= 33 => Some(key[..33].to_vec()),
        Some(0x04) if key.len() >= 65 => {
            let prefix = if key[64] & 1 != 0 { 0x03 } else { 0x02 };
            let mut out = Vec::with_capacity(33);
            out.push(prefix);
            out.extend_from_slice(&key[1..33]);
            Some(out)
        }
        _ => None,
    }
}

/// HASH160 (RIPEMD160 over SHA256) of a public key
pub fn hash_public_key(key: &[u8]) -> [u8; HASH_SIZE] {
    let sha = Sha256::digest(key);
    let mut out = [0u8; HASH_SIZE];
    out.copy_from_slice(&Ripemd160::digest(sha));
    out
}

/// Build a standard pay-to-pubkey-hash output script for a key hash
pub fn p2pkh_script(key_hash: &[u8; HASH_SIZE]) -> Vec<u8> {
    let mut script = Vec::with_capacity(HASH_SIZE + 5);
    script.extend_from_slice(&[OP_DUP, OP_HASH160, HASH_SIZE as u8]);
    script.extend_from_slice(key_hash);
    script.extend_from_slice(&[OP_EQUALVERIFY, OP_CHECKSIG]);
    script
}
