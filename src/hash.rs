// Hash Function
// Primary bucket selection via jump consistent hashing and alternate bucket
// derivation via partial-key cuckoo hashing.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// Multiplier of the linear congruential generator driving the jump hash
const JUMP_LCG_MULTIPLIER: u64 = 2862933555777941757;

/// Odd mixing constant scrambling a fingerprint before it is XORed into an index
const FINGERPRINT_SCRAMBLE: u32 = 0x5bd1_e995;

/// Maps keys to bucket indices.
///
/// The hasher `H` turns an arbitrary key into a well-mixed 64-bit value, which
/// [`jump_consistent_hash`] then reduces to a bucket index. The alternate index
/// of an element only depends on its current index and its fingerprint, so a
/// relocated fingerprint can always find its way back without the key.
#[derive(Debug, Clone)]
pub struct HashFunction<H = DefaultHasher>
where
    H: Hasher + Default,
{
    _hasher: PhantomData<H>,
}

impl<H: Hasher + Default> HashFunction<H> {
    /// Create a hash function using the hasher `H`
    pub fn new() -> Self {
        Self {
            _hasher: PhantomData,
        }
    }

    /// Compute the 64-bit hash of a key
    pub fn hash<T: ?Sized + Hash>(&self, key: &T) -> u64 {
        let mut hasher = <H as Default>::default();
        key.hash(&mut hasher);
        hasher.finish()
    }

    /// Primary bucket of `key` in a table of `num_buckets` buckets.
    ///
    /// Always in `0..num_buckets`, and identical for identical arguments.
    pub fn primary_index<T: ?Sized + Hash>(&self, key: &T, num_buckets: usize) -> usize {
        jump_consistent_hash(self.hash(key), num_buckets)
    }

    /// Alternate bucket of a fingerprint stored at `index` (fingerprint complement).
    ///
    /// Properties:
    /// 1. Symmetry: `alternate_index(alternate_index(i, f), f) == i`.
    /// 2. No reduction: the result is a raw value, the caller reduces it modulo
    ///    the table size. Symmetry survives that reduction when the table size
    ///    is a power of two.
    #[inline]
    pub fn alternate_index(&self, index: usize, fingerprint: u32) -> usize {
        index ^ fingerprint.wrapping_mul(FINGERPRINT_SCRAMBLE) as usize
    }
}

impl<H: Hasher + Default> Default for HashFunction<H> {
    fn default() -> Self {
        Self::new()
    }
}

/// Jump consistent hash (Lamping and Veach).
///
/// Maps `key` uniformly to `0..num_buckets` without any lookup table. The
/// candidate jumps depend on `key` alone, so growing the bucket count from `n`
/// to `n + 1` only ever moves a key into the new bucket `n`.
///
/// `num_buckets` must be at least 1; a single bucket always yields 0.
pub fn jump_consistent_hash(mut key: u64, num_buckets: usize) -> usize {
    debug_assert!(num_buckets > 0, "num_buckets must be greater than zero");
    let num_buckets = num_buckets as u64;
    let mut bucket = 0u64;
    let mut jump = 0u64;
    while jump < num_buckets {
        bucket = jump;
        key = key.wrapping_mul(JUMP_LCG_MULTIPLIER).wrapping_add(1);
        jump = ((bucket + 1) as f64 * ((1u64 << 31) as f64 / ((key >> 33) + 1) as f64)) as u64;
    }
    bucket as usize
}
