//! Disk component binary format.
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │ header (8 bytes)                         │
//! │   num_keys    : u32                      │
//! │   bloom_size  : u32                      │
//! ├──────────────────────────────────────────┤
//! │ offset table (num_keys * 8 bytes)        │
//! │   offset_i    : u64    (absolute)        │
//! ├──────────────────────────────────────────┤
//! │ payload: num_keys records, ascending key │
//! │   key_len     : u32                      │
//! │   key_bytes   : u8 * key_len             │
//! │   value_len   : u32                      │
//! │   value_bytes : u8 * value_len           │
//! ├──────────────────────────────────────────┤
//! │ bloom trailer (bloom_size bytes)         │
//! │   bloom_m, bloom_k, seeds, bits          │
//! └──────────────────────────────────────────┘
//! ```
//!
//! All integers are little-endian; offsets are absolute byte positions in
//! the file. The bloom trailer starts at `file_size - bloom_size`.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Read, Result as IoResult, Write};

/// Size of the fixed header: `num_keys: u32` + `bloom_size: u32`.
pub const HEADER_BYTES: u64 = 8;

/// Size of one offset-table entry.
pub const OFFSET_ENTRY_BYTES: u64 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub num_keys: u32,
    pub bloom_size: u32,
}

impl Header {
    /// Byte length of the fixed header.
    pub const SIZE_BYTES: u64 = HEADER_BYTES;

    pub fn write_to<W: Write>(&self, w: &mut W) -> IoResult<()> {
        w.write_u32::<LittleEndian>(self.num_keys)?;
        w.write_u32::<LittleEndian>(self.bloom_size)?;
        Ok(())
    }

    pub fn read_from<R: Read>(r: &mut R) -> IoResult<Self> {
        let num_keys = r.read_u32::<LittleEndian>()?;
        let bloom_size = r.read_u32::<LittleEndian>()?;
        Ok(Self {
            num_keys,
            bloom_size,
        })
    }
}

/// Writes a payload record: `key_len | key | value_len | value`.
pub fn write_record<W: Write>(w: &mut W, key: &str, value: &str) -> IoResult<()> {
    let key = key.as_bytes();
    let value = value.as_bytes();
    w.write_u32::<LittleEndian>(key.len() as u32)?;
    w.write_all(key)?;
    w.write_u32::<LittleEndian>(value.len() as u32)?;
    w.write_all(value)?;
    Ok(())
}

/// Reads a payload record at the reader's current position.
///
/// `max_field_bytes` bounds both `key_len` and `value_len` *before*
/// allocating, so a corrupt length field cannot be used to force an
/// unbounded allocation.
pub fn read_record<R: Read>(r: &mut R, max_field_bytes: u32) -> IoResult<(String, String)> {
    let key_len = r.read_u32::<LittleEndian>()?;
    if key_len > max_field_bytes {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("key_len {key_len} exceeds maximum {max_field_bytes}"),
        ));
    }
    let mut key_buf = vec![0u8; key_len as usize];
    r.read_exact(&mut key_buf)?;

    let value_len = r.read_u32::<LittleEndian>()?;
    if value_len > max_field_bytes {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("value_len {value_len} exceeds maximum {max_field_bytes}"),
        ));
    }
    let mut value_buf = vec![0u8; value_len as usize];
    r.read_exact(&mut value_buf)?;

    let key = String::from_utf8(key_buf)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    let value = String::from_utf8(value_buf)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    Ok((key, value))
}
