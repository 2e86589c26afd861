//! Key algebra: fixed-width hex <-> 160-bit byte encoding, XOR distance,
//! shard-index derivation, and chunk-key construction (§4.1).

use crate::error::{Error, Result};
use sha1::{Digest, Sha1};
use std::fmt;

/// Width in bytes of a file key, reference id, and chunk-key hash (160 bits)
pub const KEY_BYTES: usize = 20;

/// A 160-bit caller-supplied file key (K)
///
/// Canonical on-wire form is the raw 20 bytes; the accepted textual form is
/// 40 lowercase hex characters. Routing decisions always use the raw bytes.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileKey([u8; KEY_BYTES]);

impl FileKey {
    /// Wrap raw bytes directly, with no validation beyond the fixed width
    pub fn from_bytes(bytes: [u8; KEY_BYTES]) -> Self {
        Self(bytes)
    }

    /// Parse a 40-character lowercase hex string into a file key
    ///
    /// Fails with [`Error::BadKey`] unless the input is exactly 40 lowercase
    /// hex characters.
    pub fn parse(s: &str) -> Result<Self> {
        if s.len() != KEY_BYTES * 2 || !s.bytes().all(|b| b.is_ascii_hexdigit() && !b.is_ascii_uppercase()) {
            return Err(Error::BadKey(format!(
                "expected 40 lowercase hex chars, got {:?}",
                s
            )));
        }
        let mut bytes = [0u8; KEY_BYTES];
        hex::decode_to_slice(s, &mut bytes)
            .map_err(|e| Error::BadKey(format!("invalid hex: {e}")))?;
        Ok(Self(bytes))
    }

    /// Raw 20-byte value
    pub fn as_bytes(&self) -> &[u8; KEY_BYTES] {
        &self.0
    }

    /// Lowercase 40-character hex encoding
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// `H(K) = SHA-1(K)` — the hash used to form chunk keys.
    ///
    /// Computed over the 20 raw bytes of `K`, never over its hex form; this
    /// decouples the storage layout from the user-visible key (§4.1).
    pub fn chunk_hash(&self) -> [u8; KEY_BYTES] {
        let mut hasher = Sha1::new();
        hasher.update(self.0);
        let digest = hasher.finalize();
        let mut out = [0u8; KEY_BYTES];
        out.copy_from_slice(&digest);
        out
    }
}

impl fmt::Debug for FileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FileKey({})", self.to_hex())
    }
}

impl fmt::Display for FileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// A table's persistent 160-bit identity (R), used to permute shard
/// assignment. Immutable for the life of the table.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct ReferenceId([u8; KEY_BYTES]);

impl ReferenceId {
    /// Wrap raw bytes directly
    pub fn from_bytes(bytes: [u8; KEY_BYTES]) -> Self {
        Self(bytes)
    }

    /// Parse a 40-character hex override, as accepted by the `referenceId`
    /// configuration option (§6)
    pub fn parse(s: &str) -> Result<Self> {
        FileKey::parse(s).map(|k| Self(*k.as_bytes()))
    }

    /// Raw 20-byte value
    pub fn as_bytes(&self) -> &[u8; KEY_BYTES] {
        &self.0
    }

    /// Lowercase 40-character hex encoding
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for ReferenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ReferenceId({})", self.to_hex())
    }
}

/// `shardIndex(K, R) = (K XOR R)[0]` for the canonical `B = 256` table.
///
/// For `b` other than 256 the XOR is reduced over its high-order bits
/// (`u16` formed from the first two XOR bytes, taken `mod b`) so the
/// derivation stays well-defined for any shard count (§4.1).
pub fn shard_index(key: &FileKey, reference_id: &ReferenceId, b: u16) -> u16 {
    let k = key.as_bytes();
    let r = reference_id.as_bytes();
    if b == 256 {
        return (k[0] ^ r[0]) as u16;
    }
    let hi = u16::from_be_bytes([k[0] ^ r[0], k[1] ^ r[1]]);
    hi % b.max(1)
}

/// Number of decimal digits in a chunk index's zero-padded textual form
const CHUNK_INDEX_DIGITS: usize = 6;

/// `chunkKey(K, n) = hex(H(K)) ++ " " ++ pad6(n)` (§3)
///
/// 47 bytes total: 40 hex chars, one space, six decimal digits.
pub fn chunk_key(hash: &[u8; KEY_BYTES], n: u32) -> String {
    format!("{} {:0width$}", hex::encode(hash), n, width = CHUNK_INDEX_DIGITS)
}

/// Inclusive lexicographic range covering every chunk of the blob hashed to
/// `hash`, used for enumeration and range deletion (§4.1, `rangeFor`).
pub fn range_for(hash: &[u8; KEY_BYTES]) -> (String, String) {
    let prefix = hex::encode(hash);
    (format!("{prefix} 000000"), format!("{prefix} 999999"))
}

/// Name of the S-bucket subdirectory for shard `i`: `<zero-padded-3-digit-i>.s`
pub fn bucket_dir_name(i: u16) -> String {
    format!("{:03}.s", i)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_round_trips_hex() {
        let hexstr = "adc83b19e793491b1c6ea0fd8b46cd9f32e592fc"[..40].to_string();
        let key = FileKey::parse(&hexstr).unwrap();
        assert_eq!(key.to_hex(), hexstr);
    }

    #[test]
    fn rejects_bad_keys() {
        assert!(FileKey::parse("not-hex").is_err());
        assert!(FileKey::parse(&"a".repeat(39)).is_err());
        assert!(FileKey::parse(&"A".repeat(40)).is_err()); // uppercase rejected
    }

    #[test]
    fn shard_index_matches_scenario_1() {
        // R = 00..00, K = adc83b19e793491b1c6ea0fd8b46cd9f32e592fc -> shardIndex = 0xad = 173
        let k = FileKey::parse("adc83b19e793491b1c6ea0fd8b46cd9f32e592fc").unwrap();
        let r = ReferenceId::from_bytes([0u8; KEY_BYTES]);
        assert_eq!(shard_index(&k, &r, 256), 0xad);
    }

    #[test]
    fn chunk_key_hashes_raw_bytes_not_hex_text() {
        // The chunk-key hash must be taken over the 20 raw bytes of K, not
        // over its 40-character hex form -- hashing the hex text would give
        // a different (and wrong) digest.
        let k = FileKey::parse("adc83b19e793491b1c6ea0fd8b46cd9f32e592fc").unwrap();
        let h = k.chunk_hash();
        let wrong = {
            let mut hasher = Sha1::new();
            hasher.update(k.to_hex().as_bytes());
            let digest = hasher.finalize();
            let mut out = [0u8; KEY_BYTES];
            out.copy_from_slice(&digest);
            out
        };
        assert_ne!(h, wrong);
        assert_eq!(chunk_key(&h, 20).len(), 47);
        assert!(chunk_key(&h, 20).ends_with(" 000020"));
    }

    #[test]
    fn bucket_name_matches_scenario_3() {
        assert_eq!(bucket_dir_name(42), "042.s");
    }

    #[test]
    fn range_for_is_prefix_bounded() {
        let k = FileKey::parse("adc83b19e793491b1c6ea0fd8b46cd9f32e592fc").unwrap();
        let h = k.chunk_hash();
        let (lo, hi) = range_for(&h);
        assert_eq!(lo, chunk_key(&h, 0));
        assert_eq!(hi, chunk_key(&h, 999999));
    }
}
