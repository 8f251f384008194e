// Copyright (c) 2022-2023 Ledger SAS

//! Size rules for Liquid confidential data
//!
//! Confidential amounts, assets and nonces are not length-delimited on the
//! wire; each field's size follows from its leading version byte alone, so
//! the parser consults this table byte by byte.

use super::Error;

/// Encoded size of a confidential data field, version byte included.
///
/// Version 0 (null) is only valid where `null_accepted` (nonce fields);
/// version 1 is the explicit form, 9 bytes for values and 33 otherwise;
/// the committed forms are 33 bytes regardless.
pub fn confidential_data_size(
    version: u8,
    is_value: bool,
    null_accepted: bool,
) -> Result<usize, Error> {
    match version {
        0 if null_accepted => Ok(1),
        0 => Err(Error::InvalidNullConfidentialData),
        1 if is_value => Ok(9),
        1 => Ok(33),
        2 | 3 | 8 | 9 | 10 | 11 => Ok(33),
        v => Err(Error::UnsupportedConfidentialVersion(v)),
    }
}
