use super::*;
use std::io::Cursor;

// -------------------- Construction --------------------

#[test]
fn new_creates_valid_filter() {
    let bf = BloomFilter::new(100, 0.01);
    assert!(bf.num_bits() > 0);
    assert!(bf.num_hashes() > 0);
    assert!(!bf.bits.is_empty());
}

#[test]
#[should_panic(expected = "expected_items must be > 0")]
fn new_panics_on_zero_items() {
    BloomFilter::new(0, 0.01);
}

#[test]
#[should_panic(expected = "false_positive_rate must be in (0, 1)")]
fn new_panics_on_zero_fpr() {
    BloomFilter::new(100, 0.0);
}

#[test]
#[should_panic(expected = "false_positive_rate must be in (0, 1)")]
fn new_panics_on_one_fpr() {
    BloomFilter::new(100, 1.0);
}

#[test]
fn seeds_follow_deterministic_sequence() {
    let bf = BloomFilter::new(100, 0.01);
    for (i, &seed) in bf.seeds().iter().enumerate() {
        assert_eq!(seed, i as u64 * 179179 + 179);
    }
}

// -------------------- Add / Contains --------------------

#[test]
fn added_key_is_found() {
    let bf = BloomFilter::new(100, 0.01);
    bf.add(b"hello");
    assert!(bf.contains(b"hello"));
}

#[test]
fn missing_key_is_not_found() {
    let bf = BloomFilter::new(100, 0.01);
    assert!(!bf.contains(b"hello"));
}

#[test]
fn many_keys_all_found() {
    let bf = BloomFilter::new(1000, 0.01);
    for i in 0..1000u64 {
        bf.add(&i.to_le_bytes());
    }
    for i in 0..1000u64 {
        assert!(bf.contains(&i.to_le_bytes()), "key {} should be found", i);
    }
}

#[test]
fn false_positive_rate_is_reasonable() {
    let n = 10_000;
    let fpr = 0.01;
    let bf = BloomFilter::new(n, fpr);

    for i in 0..n as u64 {
        bf.add(&i.to_le_bytes());
    }

    let mut false_positives = 0;
    let test_count = 10_000;
    for i in (n as u64)..(n as u64 + test_count) {
        if bf.contains(&i.to_le_bytes()) {
            false_positives += 1;
        }
    }

    let actual_fpr = false_positives as f64 / test_count as f64;
    assert!(
        actual_fpr < fpr * 3.0,
        "FPR too high: {:.4} (target {:.4})",
        actual_fpr,
        fpr
    );
}

#[test]
fn empty_key() {
    let bf = BloomFilter::new(10, 0.01);
    bf.add(b"");
    assert!(bf.contains(b""));
}

#[test]
fn binary_key() {
    let bf = BloomFilter::new(10, 0.01);
    let key = vec![0u8, 1, 2, 255, 254, 253];
    bf.add(&key);
    assert!(bf.contains(&key));
}

// -------------------- Concurrency --------------------

#[test]
fn concurrent_add_and_contains_never_false_negative() {
    use std::sync::Arc;
    use std::thread;

    let bf = Arc::new(BloomFilter::new(1000, 0.01));
    for i in 0..500u64 {
        bf.add(&i.to_le_bytes());
    }

    let writer_bf = Arc::clone(&bf);
    let writer = thread::spawn(move || {
        for i in 500..1000u64 {
            writer_bf.add(&i.to_le_bytes());
        }
    });

    // Keys added before the thread started must never read as absent,
    // regardless of how the concurrent add interleaves.
    for i in 0..500u64 {
        assert!(bf.contains(&i.to_le_bytes()));
    }

    writer.join().unwrap();
    for i in 0..1000u64 {
        assert!(bf.contains(&i.to_le_bytes()));
    }
}

// -------------------- Merge --------------------

#[test]
fn merge_unions_two_filters() {
    let a = BloomFilter::new(100, 0.01);
    let b = BloomFilter::with_seeds(a.num_bits(), a.seeds().to_vec());

    a.add(b"from-a");
    b.add(b"from-b");

    a.merge(&b).unwrap();
    assert!(a.contains(b"from-a"));
    assert!(a.contains(b"from-b"));
}

#[test]
fn merge_rejects_incompatible_filters() {
    let a = BloomFilter::new(100, 0.01);
    let b = BloomFilter::new(500, 0.01);
    assert!(matches!(a.merge(&b), Err(MergeError::Incompatible)));
}

// -------------------- Serialization --------------------

#[test]
fn roundtrip_serialize_deserialize() {
    let bf = BloomFilter::new(500, 0.01);
    for i in 0..500u64 {
        bf.add(&i.to_le_bytes());
    }

    let mut buf = Vec::new();
    bf.write_to(&mut buf).unwrap();
    assert_eq!(buf.len(), bf.serialized_size());

    let mut cursor = Cursor::new(&buf);
    let bf2 = BloomFilter::read_from(&mut cursor).unwrap();

    assert_eq!(bf2.num_bits(), bf.num_bits());
    assert_eq!(bf2.num_hashes(), bf.num_hashes());
    assert_eq!(bf2.seeds(), bf.seeds());

    for i in 0..500u64 {
        assert!(
            bf2.contains(&i.to_le_bytes()),
            "key {} missing after roundtrip",
            i
        );
    }
}

#[test]
fn serialized_size_is_correct() {
    let bf = BloomFilter::new(100, 0.05);
    // 4 (m) + 4 (k) + 8*k (seeds) + bits.len()
    assert_eq!(
        bf.serialized_size(),
        8 + 8 * bf.num_hashes() as usize + bf.bits.len()
    );
}

#[test]
fn deserialize_rejects_oversized_bloom() {
    let mut buf = Vec::new();
    buf.extend_from_slice(&(8u32 * 256 * 1024 * 1024).to_le_bytes()); // bloom_m -> ~256 MiB of bits
    buf.extend_from_slice(&1u32.to_le_bytes()); // bloom_k
    buf.extend_from_slice(&179u64.to_le_bytes()); // seed

    let mut cursor = Cursor::new(&buf);
    let result = BloomFilter::read_from(&mut cursor);
    assert!(result.is_err());
}

#[test]
fn deserialize_rejects_implausible_hash_count() {
    let mut buf = Vec::new();
    buf.extend_from_slice(&64u32.to_le_bytes());
    buf.extend_from_slice(&0u32.to_le_bytes());

    let mut cursor = Cursor::new(&buf);
    assert!(BloomFilter::read_from(&mut cursor).is_err());
}

// -------------------- Debug --------------------

#[test]
fn debug_impl_works() {
    let bf = BloomFilter::new(100, 0.01);
    let debug = format!("{:?}", bf);
    assert!(debug.contains("BloomFilter"));
    assert!(debug.contains("num_bits"));
    assert!(debug.contains("num_hashes"));
}

// -------------------- Edge cases --------------------

#[test]
fn single_item_filter() {
    let bf = BloomFilter::new(1, 0.01);
    bf.add(b"only");
    assert!(bf.contains(b"only"));
}

#[test]
fn very_low_fpr() {
    let bf = BloomFilter::new(100, 0.0001);
    assert!(bf.num_bits() > 1000);
    assert!(bf.num_hashes() > 5);
}

#[test]
fn high_fpr_still_works() {
    let bf = BloomFilter::new(100, 0.5);
    bf.add(b"test");
    assert!(bf.contains(b"test"));
}
