// Copyright (c) 2022-2023 Ledger SAS

//! Feature flags forwarded with device commands
//!
//! The host API accepts free-form "additionals" strings; the subset the
//! device protocol understands is carried as a flag set from there on.

use bitflags::bitflags;

bitflags! {
    /// Transaction format / protocol features for a device exchange
    pub struct Features: u32 {
        /// Liquid confidential transaction semantics
        const LIQUID = 1 << 0;
        /// Input carries asset issuance data
        const ISSUANCE = 1 << 1;
        /// Decred transaction layout
        const DECRED = 1 << 2;
        /// Bech32 change / output addressing
        const BECH32 = 1 << 3;
    }
}

impl Default for Features {
    fn default() -> Self {
        Features::empty()
    }
}

impl Features {
    /// Parse caller-provided "additionals" strings, ignoring unknown entries
    pub fn from_additionals<S: AsRef<str>>(additionals: &[S]) -> Self {
        let mut flags = Features::empty();

        for a in additionals {
            match a.as_ref() {
                "liquid" => flags |= Features::LIQUID,
                "issuance" => flags |= Features::ISSUANCE,
                "decred" => flags |= Features::DECRED,
                "bech32" => flags |= Features::BECH32,
                _ => (),
            }
        }

        flags
    }
}
