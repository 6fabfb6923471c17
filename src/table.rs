// Bucket Table
// The authoritative store of fingerprints: a single contiguous byte array of
// equally sized buckets, addressed by bucket index and lane index.

use crate::Error;
use crate::codec::{FingerprintWidth, LaneCodec};
use derive_builder::Builder;
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use std::fmt;

/// Default number of fingerprints per bucket
pub const DEFAULT_ENTRIES_PER_BUCKET: usize = 4;

/// Default fingerprint size in bits
pub const DEFAULT_BITS_PER_FP: usize = 8;

/// Outcome of [`CuckooTable::replacing_fingerprint_insertion`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Insertion {
    /// The fingerprint went into a free lane
    Inserted,
    /// The bucket was full and the fingerprint replaced a random lane.
    /// The caller is responsible for relocating the evicted fingerprint.
    Evicted(u32),
    /// The bucket was full and eviction was not allowed; nothing changed
    Full,
}

impl Insertion {
    /// Whether the fingerprint was stored without displacing another one
    pub fn is_inserted(&self) -> bool {
        matches!(self, Insertion::Inserted)
    }

    /// The displaced fingerprint, if any
    pub fn evicted(&self) -> Option<u32> {
        match self {
            Insertion::Evicted(fingerprint) => Some(*fingerprint),
            _ => None,
        }
    }
}

/// A table of buckets holding bit-packed fingerprints.
///
/// ## Storage
///
/// All buckets live in one zero-initialized `Vec<u8>` of exactly
/// `table_size * bytes_per_bucket` bytes, allocated once at construction.
/// A zero lane means "empty", so fingerprints stored by the caller must never
/// mask to zero.
///
/// ## Layout Selection
///
/// The `(entries_per_bucket, bits_per_fp, fingerprint_width)` triple selects
/// one [`LaneCodec`]; unsupported triples are rejected by the builder with
/// [`Error::Configuration`].
///
/// ## Eviction
///
/// [`CuckooTable::replacing_fingerprint_insertion`] performs a single
/// eviction step, choosing the victim lane uniformly at random with the
/// table's own generator `R`. Chaining evictions and deciding when to give up
/// is up to the caller.
///
/// Every mutating operation takes `&mut self`; the table has no internal
/// synchronization.
#[derive(Debug, Builder)]
#[builder(
    pattern = "owned",
    build_fn(private, name = "base_build", validate = "Self::validate")
)]
pub struct CuckooTable<R = StdRng>
where
    R: RngCore + SeedableRng,
{
    // Configuration parameters
    /// Number of buckets
    table_size: usize,

    /// Number of fingerprints per bucket
    #[builder(default = "DEFAULT_ENTRIES_PER_BUCKET")]
    entries_per_bucket: usize,

    /// Size of fingerprints in bits (4, 8, 12, 16 or 32)
    #[builder(default = "DEFAULT_BITS_PER_FP")]
    bits_per_fp: usize,

    /// Width class of the caller's fingerprints, narrowest fit when unset
    #[builder(default, setter(strip_option))]
    fingerprint_width: Option<FingerprintWidth>,

    /// Mask applied to every stored and compared fingerprint, full lane when unset
    #[builder(default, setter(strip_option))]
    fp_mask: Option<u32>,

    /// Seed of the eviction generator, OS entropy when unset
    #[builder(default, setter(strip_option))]
    seed: Option<u64>,

    // Internal values - derived from the configuration
    /// Packing scheme of a bucket
    #[builder(setter(skip), default = "LaneCodec::Byte4x8")]
    codec: LaneCodec,

    /// Size of a bucket in bytes
    #[builder(setter(skip))]
    bytes_per_bucket: usize,

    /// Resolved fingerprint mask
    #[builder(setter(skip))]
    fingerprint_mask: u32,

    /// Bucket storage
    #[builder(setter(skip))]
    buckets: Vec<u8>,

    /// Generator used to pick eviction victims
    #[builder(setter(skip), default = "R::seed_from_u64(0)")]
    rng: R,
}

impl<R: RngCore + SeedableRng> CuckooTable<R> {
    /// Number of buckets
    pub fn table_size(&self) -> usize {
        self.table_size
    }

    /// Number of fingerprints per bucket
    pub fn entries_per_bucket(&self) -> usize {
        self.entries_per_bucket
    }

    /// Fingerprint size in bits
    pub fn bits_per_fp(&self) -> usize {
        self.bits_per_fp
    }

    /// Mask applied to stored and compared fingerprints
    pub fn fp_mask(&self) -> u32 {
        self.fingerprint_mask
    }

    /// Width class of the stored fingerprints
    pub fn fingerprint_width(&self) -> FingerprintWidth {
        self.codec.width()
    }

    /// Packing scheme selected at construction
    pub fn codec(&self) -> LaneCodec {
        self.codec
    }

    /// Maximum number of fingerprints the table can hold
    pub fn max_elements(&self) -> usize {
        self.entries_per_bucket * self.table_size
    }

    /// Size of the bucket storage in bytes
    pub fn memory_usage(&self) -> usize {
        self.buckets.len()
    }

    /// Masked fingerprint stored in lane `lane` of bucket `index`
    #[inline]
    pub fn fingerprint(&self, index: usize, lane: usize) -> u32 {
        self.codec.read(lane, self.bucket(index)) & self.fingerprint_mask
    }

    /// Number of occupied lanes in bucket `index`
    pub fn fingerprint_count(&self, index: usize) -> usize {
        (0..self.entries_per_bucket)
            .filter(|&lane| self.fingerprint(index, lane) != 0)
            .count()
    }

    /// Store `fingerprint` (masked) in lane `lane` of bucket `index`,
    /// overwriting whatever was there.
    #[inline]
    pub fn insert_fingerprint(&mut self, index: usize, lane: usize, fingerprint: u32) {
        let codec = self.codec;
        let value = fingerprint & self.fingerprint_mask;
        codec.write(lane, self.bucket_mut(index), value);
    }

    /// Insert a fingerprint into the first free lane of bucket `index`.
    ///
    /// When the bucket is full and `evict` is set, a lane chosen uniformly at
    /// random among all lanes is overwritten and its previous content returned
    /// as [`Insertion::Evicted`]. When the bucket is full and `evict` is not
    /// set, the bucket is left untouched and [`Insertion::Full`] is returned.
    pub fn replacing_fingerprint_insertion(
        &mut self,
        index: usize,
        fingerprint: u32,
        evict: bool,
    ) -> Insertion {
        if let Some(lane) =
            (0..self.entries_per_bucket).find(|&lane| self.fingerprint(index, lane) == 0)
        {
            self.insert_fingerprint(index, lane, fingerprint);
            return Insertion::Inserted;
        }
        if !evict {
            return Insertion::Full;
        }
        let lane = self.rng.random_range(0..self.entries_per_bucket);
        let evicted = self.fingerprint(index, lane);
        self.insert_fingerprint(index, lane, fingerprint);
        log::trace!("evicted fingerprint {evicted:#x} from bucket {index} lane {lane}");
        Insertion::Evicted(evicted)
    }

    /// Check whether bucket `index` holds `fingerprint`
    #[inline]
    pub fn contains_fingerprint(&self, index: usize, fingerprint: u32) -> bool {
        let word = LaneCodec::pack(self.bucket(index));
        self.codec
            .contains_value(word, fingerprint & self.fingerprint_mask)
    }

    /// Check whether either of two buckets holds `fingerprint`
    #[inline]
    pub fn contains_fingerprint_either(
        &self,
        index: usize,
        alt_index: usize,
        fingerprint: u32,
    ) -> bool {
        self.contains_fingerprint(index, fingerprint)
            || self.contains_fingerprint(alt_index, fingerprint)
    }

    /// Remove one occurrence of `fingerprint` from bucket `index`.
    ///
    /// Returns `false` if the bucket does not hold it. Duplicates are removed
    /// one per call.
    pub fn delete_fingerprint(&mut self, index: usize, fingerprint: u32) -> bool {
        let fingerprint = fingerprint & self.fingerprint_mask;
        match (0..self.entries_per_bucket).find(|&lane| self.fingerprint(index, lane) == fingerprint)
        {
            Some(lane) => {
                self.insert_fingerprint(index, lane, 0);
                true
            }
            None => false,
        }
    }

    /// Number of empty lanes in the whole table
    pub fn free_entries(&self) -> usize {
        (0..self.table_size)
            .map(|index| self.entries_per_bucket - self.fingerprint_count(index))
            .sum()
    }

    /// Number of occupied lanes in the whole table
    pub fn len(&self) -> usize {
        self.max_elements() - self.free_entries()
    }

    /// Check if no lane is occupied
    pub fn is_empty(&self) -> bool {
        self.buckets.iter().all(|&byte| byte == 0)
    }

    /// Empty every bucket, keeping the allocation
    pub fn clear(&mut self) {
        self.buckets.fill(0);
    }

    #[inline]
    fn bucket(&self, index: usize) -> &[u8] {
        let start = index * self.bytes_per_bucket;
        &self.buckets[start..start + self.bytes_per_bucket]
    }

    #[inline]
    fn bucket_mut(&mut self, index: usize) -> &mut [u8] {
        let start = index * self.bytes_per_bucket;
        &mut self.buckets[start..start + self.bytes_per_bucket]
    }
}

impl<R: RngCore + SeedableRng> fmt::Display for CuckooTable<R> {
    /// Dump every bucket on its own line, each raw lane as 8 hex digits
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for index in 0..self.table_size {
            write!(f, "{index} |")?;
            let bucket = self.bucket(index);
            for lane in 0..self.entries_per_bucket {
                write!(f, " {:08x}", self.codec.read(lane, bucket))?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl CuckooTable<StdRng> {
    /// Create a new CuckooTableBuilder with default settings
    pub fn builder() -> CuckooTableBuilder<StdRng> {
        CuckooTableBuilder::default()
    }

    /// Create a table of `table_size` buckets with the default layout
    /// (4 lanes of 8 bits)
    pub fn with_table_size(table_size: usize) -> Result<Self, Error> {
        Self::builder().table_size(table_size).build()
    }
}

impl<R: RngCore + SeedableRng> CuckooTableBuilder<R> {
    /// Validate the builder configuration
    fn validate(&self) -> Result<(), String> {
        if self.table_size == Some(0) {
            return Err("table_size must be greater than zero".into());
        }
        if self.fp_mask == Some(Some(0)) {
            return Err("fp_mask must not be zero".into());
        }
        Ok(())
    }

    /// Build a CuckooTable with the specified configuration
    pub fn build(self) -> Result<CuckooTable<R>, Error> {
        let mut table = self
            .base_build()
            .map_err(|error| Error::InvalidParameter(error.to_string()))?;
        let width = table
            .fingerprint_width
            .unwrap_or_else(|| FingerprintWidth::for_bits(table.bits_per_fp));
        table.codec = LaneCodec::select(table.entries_per_bucket, table.bits_per_fp, width)
            .inspect_err(|error| log::warn!("rejected cuckoo table: {error}"))?;
        // The mask must fit in a lane of the selected layout
        let lane_mask = table.codec.lane_mask();
        if let Some(fp_mask) = table.fp_mask.filter(|fp_mask| fp_mask & !lane_mask != 0) {
            return Err(Error::InvalidParameter(format!(
                "fp_mask {fp_mask:#x} is wider than {} bits per fingerprint",
                table.bits_per_fp
            )));
        }
        table.bytes_per_bucket = table.codec.bytes_per_bucket();
        table.fingerprint_mask = table.fp_mask.unwrap_or(lane_mask);
        // Zero bytes are empty lanes
        table.buckets = vec![0; table.table_size * table.bytes_per_bucket];
        table.rng = match table.seed {
            Some(seed) => R::seed_from_u64(seed),
            None => R::from_os_rng(),
        };
        log::debug!(
            "built cuckoo table: {} buckets, layout {}, mask {:#x}, {} bytes",
            table.table_size,
            table.codec,
            table.fingerprint_mask,
            table.buckets.len()
        );
        Ok(table)
    }
}
