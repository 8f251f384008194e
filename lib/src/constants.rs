// Copyright (c) 2022-2023 Ledger SAS

//! Chain-level constants shared across the signing protocol

/// Default lock time when the caller does not set one
pub const DEFAULT_LOCKTIME: u32 = 0;

/// Default input sequence (final)
pub const DEFAULT_SEQUENCE: u32 = 0xffff_ffff;

/// Version written into the device-side working transaction
pub const DEFAULT_VERSION: u32 = 2;

/// SIGHASH_ALL signature hash type
pub const SIGHASH_ALL: u8 = 0x01;

pub const OP_DUP: u8 = 0x76;
pub const OP_HASH160: u8 = 0xa9;
pub const OP_EQUALVERIFY: u8 = 0x88;
pub const OP_CHECKSIG: u8 = 0xac;
pub const OP_RETURN: u8 = 0x6a;

/// HASH160 digest size, as pushed in a pay-to-pubkey-hash script
pub const HASH_SIZE: usize = 20;
