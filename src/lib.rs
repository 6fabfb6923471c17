// Cuckoo Table
// The storage engine of a cuckoo filter: a bucket table packing fixed-width
// fingerprints without padding, plus the hashing layer computing primary
// (jump consistent hashing) and alternate (partial-key cuckoo hashing) buckets.

//! # Cuckoo Table
//!
//! A cuckoo filter stores short fingerprints of its keys in a table of small
//! buckets. Each element may live in one of two buckets: its primary bucket,
//! derived from the key, and an alternate bucket derived from the primary one
//! and the fingerprint alone. This crate provides both halves:
//!
//! - [`CuckooTable`]: bit-packed buckets with lane-level read/write, SWAR
//!   containment checks, deletion, and single-step eviction.
//! - [`HashFunction`]: jump consistent hashing for the primary bucket and a
//!   reversible XOR scramble for the alternate one.
//!
//! The insert retry loop ("kicking" evicted fingerprints to their alternate
//! bucket until a free lane is found or a limit is reached) belongs to the
//! caller:
//!
//! ```
//! use cuckoo_table::{CuckooTable, HashFunction, Insertion};
//! use std::collections::hash_map::DefaultHasher;
//!
//! let mut table = CuckooTable::builder()
//!     .table_size(64)
//!     .seed(7)
//!     .build()
//!     .unwrap();
//! let hash = HashFunction::<DefaultHasher>::new();
//!
//! let fingerprint = 0x2a;
//! let index = hash.primary_index(&"key", table.table_size());
//! let alt_index = hash.alternate_index(index, fingerprint) % table.table_size();
//!
//! assert_eq!(
//!     table.replacing_fingerprint_insertion(index, fingerprint, true),
//!     Insertion::Inserted
//! );
//! assert!(table.contains_fingerprint_either(index, alt_index, fingerprint));
//! assert!(table.delete_fingerprint(index, fingerprint));
//! assert!(table.is_empty());
//! ```

pub mod codec;
pub mod hash;
pub mod table;

pub use codec::{FingerprintWidth, LaneCodec};
pub use hash::{HashFunction, jump_consistent_hash};
pub use table::{CuckooTable, CuckooTableBuilder, Insertion};

/// Error type for Cuckoo Table construction
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// No bucket layout exists for the requested configuration
    #[error(
        "Unsupported configuration (entries_per_bucket={entries_per_bucket}, bits_per_fp={bits_per_fp}, fingerprint_width={fingerprint_width}). Supported (entries_per_bucket, bits_per_fp, fingerprint_width): {supported}",
        supported = codec::SUPPORTED_CONFIGURATIONS
    )]
    Configuration {
        entries_per_bucket: usize,
        bits_per_fp: usize,
        fingerprint_width: FingerprintWidth,
    },

    /// A builder parameter is missing or out of range
    #[error("{0}")]
    InvalidParameter(String),
}
