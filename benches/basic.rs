#![feature(test)]

extern crate test;

use cuckoo_table::{CuckooTable, HashFunction, LaneCodec};
use std::collections::hash_map::DefaultHasher;
use test::Bencher;

/// Number of buckets used by the table benchmarks
const TABLE_SIZE: usize = 1 << 16;

// Helper function to build a half-full table of the given layout
fn half_full_table(entries_per_bucket: usize, bits_per_fp: usize) -> CuckooTable {
    let mut table = CuckooTable::builder()
        .table_size(TABLE_SIZE)
        .entries_per_bucket(entries_per_bucket)
        .bits_per_fp(bits_per_fp)
        .seed(0)
        .build()
        .unwrap();
    let mask = table.fp_mask();
    for index in 0..TABLE_SIZE {
        for lane in 0..entries_per_bucket / 2 {
            table.insert_fingerprint(index, lane, (index as u32 + lane as u32) % mask + 1);
        }
    }
    table
}

fn bench_contains(b: &mut Bencher, entries_per_bucket: usize, bits_per_fp: usize) {
    let table = half_full_table(entries_per_bucket, bits_per_fp);
    let mask = table.fp_mask();
    let mut i = 0usize;
    b.iter(|| {
        i = i.wrapping_add(0x9E37_79B9);
        let index = i % TABLE_SIZE;
        let alt_index = (i >> 16) % TABLE_SIZE;
        table.contains_fingerprint_either(index, alt_index, (i as u32 & mask).max(1))
    });
}

/// Two-bucket lookups with the SWAR containment test, one bench per layout.
///
/// Setup: 65k buckets, every bucket half full
/// Test: Lookup of pseudo-random fingerprints in pseudo-random bucket pairs
#[bench]
fn contains_4x4(b: &mut Bencher) {
    bench_contains(b, 4, 4);
}

#[bench]
fn contains_4x8(b: &mut Bencher) {
    bench_contains(b, 4, 8);
}

#[bench]
fn contains_4x12(b: &mut Bencher) {
    bench_contains(b, 4, 12);
}

#[bench]
fn contains_4x16(b: &mut Bencher) {
    bench_contains(b, 4, 16);
}

#[bench]
fn contains_2x32(b: &mut Bencher) {
    bench_contains(b, 2, 32);
}

/// Baseline for `contains_4x12`: decode and compare every lane individually.
#[bench]
fn contains_lane_scan_4x12(b: &mut Bencher) {
    let codec = LaneCodec::Packed4x12;
    let bucket = [0x23, 0x61, 0x45, 0x89, 0xC7, 0xAB];
    let mut value = 0u32;
    b.iter(|| {
        value = (value + 1) & 0xFFF;
        (0..4).any(|lane| codec.read(lane, test::black_box(&bucket)) == value)
    });
}

/// Same bucket as `contains_lane_scan_4x12`, using the packed-word test.
#[bench]
fn contains_swar_4x12(b: &mut Bencher) {
    let codec = LaneCodec::Packed4x12;
    let bucket = [0x23, 0x61, 0x45, 0x89, 0xC7, 0xAB];
    let mut value = 0u32;
    b.iter(|| {
        value = (value + 1) & 0xFFF;
        codec.contains_value(LaneCodec::pack(test::black_box(&bucket)), value)
    });
}

/// Insert with eviction into full buckets, followed by a delete that keeps
/// the table at a steady load.
///
/// Setup: 65k buckets of 4 x 8-bit lanes, every bucket full
/// Test: Evicting insertion and deletion of the evicted fingerprint
#[bench]
fn evicting_insert_and_delete(b: &mut Bencher) {
    let mut table = half_full_table(4, 8);
    for index in 0..TABLE_SIZE {
        table.replacing_fingerprint_insertion(index, 0x11, false);
        table.replacing_fingerprint_insertion(index, 0x22, false);
    }
    let mut i = 0usize;
    b.iter(|| {
        i = i.wrapping_add(1);
        let index = i % TABLE_SIZE;
        if let Some(evicted) = table
            .replacing_fingerprint_insertion(index, 0x33, true)
            .evicted()
        {
            table.delete_fingerprint(index, 0x33);
            table.replacing_fingerprint_insertion(index, evicted, false);
        }
    });
}

/// Jump consistent hashing of integer keys into a million buckets.
#[bench]
fn primary_index(b: &mut Bencher) {
    let hash = HashFunction::<DefaultHasher>::new();
    let mut i = 0u64;
    b.iter(|| {
        i += 1;
        hash.primary_index(&i, 1_000_000)
    });
}

/// Alternate bucket derivation, reduced to the table size.
#[bench]
fn alternate_index(b: &mut Bencher) {
    let hash = HashFunction::<DefaultHasher>::new();
    let mut i = 0usize;
    b.iter(|| {
        i += 1;
        hash.alternate_index(i % TABLE_SIZE, i as u32 | 1) % TABLE_SIZE
    });
}
