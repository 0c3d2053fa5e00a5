//! Content-hash reduction that keys the placement table.
//!
//! MD5 over the full content, folded to a residue in `0..4` by iterating
//! `acc = (acc * 16 + byte) % 4` across the 16 digest bytes. The fold must
//! stay byte-for-byte identical across implementations: changing it moves
//! every placement and orphans stored data.

use dfp_core::MOD_COUNT;

/// Placement residue of a byte stream's content.
#[must_use]
pub fn content_mod(data: &[u8]) -> u8 {
    let digest = md5::compute(data);
    let mut acc: u32 = 0;
    for &byte in digest.iter() {
        acc = (acc * 16 + u32::from(byte)) % MOD_COUNT as u32;
    }
    #[allow(clippy::cast_possible_truncation)]
    {
        acc as u8
    }
}

/// Best-effort residue derived from a remote file's name.
///
/// Used only when no server reported a piece pair to infer from; hashing
/// the name almost never matches the residue the upload used, so callers
/// log a warning when they reach for this.
#[must_use]
pub fn name_mod(name: &str) -> u8 {
    content_mod(format!("/{name}").as_bytes())
}
