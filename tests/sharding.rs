//! Key-algebra properties exercised over example vectors and randomized
//! inputs (§8 "Sharding is deterministic given K", "Chunk-count law").

use kfs::key::{bucket_dir_name, chunk_key, shard_index, FileKey, ReferenceId};
use proptest::prelude::*;

fn fk(hex: &str) -> FileKey {
    FileKey::parse(hex).unwrap()
}

fn rid(hex: &str) -> ReferenceId {
    ReferenceId::parse(hex).unwrap()
}

#[test]
fn shard_index_is_commutative_style_distance() {
    // shardIndex depends only on the XOR of the leading byte, independent
    // of which operand contributes which bit pattern.
    let r = rid("000000000000000000000000000000000000000a");
    let k = fk("0000000000000000000000000000000000000a00");
    let by_kr = shard_index(&k, &r, 256);
    let by_rk = (k.as_bytes()[0] ^ r.as_bytes()[0]) as u16;
    assert_eq!(by_kr, by_rk);
}

#[test]
fn shard_index_matches_scenario_one() {
    // All-zero reference id; K from the scenario table.
    let r = rid(&"0".repeat(40));
    let k = fk("adc83b19e793491b1c6ea0fd8b46cd9f32e592fc");
    assert_eq!(shard_index(&k, &r, 256), 0xad);
}

#[test]
fn bucket_dir_name_is_zero_padded() {
    assert_eq!(bucket_dir_name(0), "000.s");
    assert_eq!(bucket_dir_name(42), "042.s");
    assert_eq!(bucket_dir_name(255), "255.s");
}

proptest! {
    #[test]
    fn shard_index_stays_in_range(
        k_bytes in prop::array::uniform20(any::<u8>()),
        r_bytes in prop::array::uniform20(any::<u8>()),
        b in 1u16..=4096,
    ) {
        let k = FileKey::from_bytes(k_bytes);
        let r = ReferenceId::from_bytes(r_bytes);
        let idx = shard_index(&k, &r, b);
        prop_assert!(idx < b);
    }

    #[test]
    fn shard_index_is_deterministic(
        k_bytes in prop::array::uniform20(any::<u8>()),
        r_bytes in prop::array::uniform20(any::<u8>()),
    ) {
        let k = FileKey::from_bytes(k_bytes);
        let r = ReferenceId::from_bytes(r_bytes);
        let first = shard_index(&k, &r, 256);
        let second = shard_index(&k, &r, 256);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn chunk_key_is_lexicographically_ordered_by_index(
        hash in prop::array::uniform20(any::<u8>()),
        n in 0u32..999_999,
    ) {
        let a = chunk_key(&hash, n);
        let b = chunk_key(&hash, n + 1);
        prop_assert!(a < b);
    }
}
