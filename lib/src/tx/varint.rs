// Copyright (c) 2022-2023 Ledger SAS

//! Bitcoin variable-length integer codec

use byteorder::{ByteOrder, LittleEndian};

use super::Error;

fn payload(buf: &[u8], offset: usize, n: usize) -> Result<&[u8], Error> {
    buf.get(offset..offset + n).ok_or(Error::MalformedEncoding {
        offset,
        needed: n,
    })
}

/// Decode a varint at `offset`, returning the value and the number of bytes
/// consumed
pub fn read_varint(buf: &[u8], offset: usize) -> Result<(u64, usize), Error> {
    let prefix = *buf.get(offset).ok_or(Error::MalformedEncoding {
        offset,
        needed: 1,
    })?;

    match prefix {
        0xfd => Ok((LittleEndian::read_u16(payload(buf, offset + 1, 2)?) as u64, 3)),
        0xfe => Ok((LittleEndian::read_u32(payload(buf, offset + 1, 4)?) as u64, 5)),
        0xff => Ok((LittleEndian::read_u64(payload(buf, offset + 1, 8)?), 9)),
        v => Ok((v as u64, 1)),
    }
}

/// Encode a value as a minimal-length varint
pub fn write_varint(value: u64) -> Vec<u8> {
    match value {
        0..=0xfc => vec![value as u8],
        0xfd..=0xffff => {
            let mut out = vec![0xfd, 0, 0];
            LittleEndian::write_u16(&mut out[1..], value as u16);
            out
        }
        0x1_0000..=0xffff_ffff => {
            let mut out = vec![0xfe, 0, 0, 0, 0];
            LittleEndian::write_u32(&mut out[1..], value as u32);
            out
        }
        _ => {
            let mut out = vec![0xff, 0, 0, 0, 0, 0, 0, 0, 0];
            LittleEndian::write_u64(&mut out[1..], value);
            out
        }
    }
}
