//! Persisted topology records.
//!
//! Layout, suitable for a flash block:
//!
//! ```text
//! | MAGIC 'RGBT' (u32 LE) | payload_len (u16 LE) | postcard payload | CRC32 (u32 LE) |
//! ```
//!
//! The CRC covers the header and payload. Bytes after the CRC are ignored, so a
//! record can be decoded straight out of an erased (0xFF-padded) block.

use crc32fast::Hasher;

use super::Topology;
use crate::{Error, Result};

const MAGIC: u32 = 0x5447_4252; // 'RGBT'
const HEADER_SIZE: usize = 4 + 2; // Magic + PayloadLen
const CRC_SIZE: usize = 4;

/// Largest payload a record may carry.
pub const MAX_PAYLOAD_SIZE: usize = 2048;

/// Largest encoded record.
pub const MAX_RECORD_SIZE: usize = HEADER_SIZE + MAX_PAYLOAD_SIZE + CRC_SIZE;

/// Encode `topology` into `buffer`, returning the record length.
pub fn encode(topology: &Topology, buffer: &mut [u8]) -> Result<usize> {
    let room = buffer
        .len()
        .min(MAX_RECORD_SIZE)
        .checked_sub(HEADER_SIZE + CRC_SIZE)
        .ok_or(Error::FormatError)?;
    let (header, rest) = buffer
        .split_first_chunk_mut::<HEADER_SIZE>()
        .ok_or(Error::FormatError)?;
    let (payload_room, _) = rest.split_at_mut_checked(room).ok_or(Error::FormatError)?;
    let payload_len = postcard::to_slice(topology, payload_room)?.len();
    let payload_len_field = u16::try_from(payload_len).map_err(|_| Error::FormatError)?;

    let [m0, m1, m2, m3] = MAGIC.to_le_bytes();
    let [l0, l1] = payload_len_field.to_le_bytes();
    *header = [m0, m1, m2, m3, l0, l1];

    let crc_offset = HEADER_SIZE.saturating_add(payload_len);
    let (covered, tail) = buffer
        .split_at_mut_checked(crc_offset)
        .ok_or(Error::FormatError)?;
    let crc_field = tail
        .first_chunk_mut::<CRC_SIZE>()
        .ok_or(Error::FormatError)?;
    *crc_field = compute_crc(covered).to_le_bytes();

    debug!("blob: encoded topology, {} byte payload", payload_len);
    Ok(crc_offset.saturating_add(CRC_SIZE))
}

/// Decode a record produced by [`encode`].
pub fn decode(record: &[u8]) -> Result<Topology> {
    let (header, body) = record
        .split_first_chunk::<HEADER_SIZE>()
        .ok_or(Error::TopologyCorrupted)?;
    let [m0, m1, m2, m3, l0, l1] = *header;
    let magic = u32::from_le_bytes([m0, m1, m2, m3]);
    if magic != MAGIC {
        warn!("blob: bad magic {}", magic);
        return Err(Error::TopologyCorrupted);
    }

    let payload_len = usize::from(u16::from_le_bytes([l0, l1]));
    if payload_len > MAX_PAYLOAD_SIZE {
        error!("blob: invalid payload length {}", payload_len);
        return Err(Error::TopologyCorrupted);
    }

    let (payload, tail) = body
        .split_at_checked(payload_len)
        .ok_or(Error::TopologyCorrupted)?;
    let stored_crc = tail
        .first_chunk::<CRC_SIZE>()
        .map(|bytes| u32::from_le_bytes(*bytes))
        .ok_or(Error::TopologyCorrupted)?;
    let (covered, _) = record
        .split_at_checked(HEADER_SIZE.saturating_add(payload_len))
        .ok_or(Error::TopologyCorrupted)?;
    let computed_crc = compute_crc(covered);
    if stored_crc != computed_crc {
        error!(
            "blob: CRC mismatch (expected {}, found {})",
            computed_crc, stored_crc
        );
        return Err(Error::TopologyCorrupted);
    }

    postcard::from_bytes(payload).map_err(|_| {
        error!("blob: deserialization failed");
        Error::TopologyCorrupted
    })
}

/// Compute CRC32 checksum.
fn compute_crc(data: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(data);
    hasher.finalize()
}
