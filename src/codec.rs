// Bit-Lane Codec
// Packs a bucket's fingerprints into the smallest possible byte buffer and
// reads, writes and searches them using word-level bit manipulation.

use crate::Error;
use std::fmt;

/// Storage class of a fingerprint value.
///
/// A configuration is identified by `(entries_per_bucket, bits_per_fp, width)`;
/// the width must be the class a caller would use to hold one fingerprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FingerprintWidth {
    U8,
    U16,
    U32,
}

impl FingerprintWidth {
    /// Narrowest width class able to hold `bits` bits
    pub fn for_bits(bits: usize) -> Self {
        match bits {
            0..=8 => FingerprintWidth::U8,
            9..=16 => FingerprintWidth::U16,
            _ => FingerprintWidth::U32,
        }
    }

    /// Number of bits in the width class
    pub fn bits(self) -> usize {
        match self {
            FingerprintWidth::U8 => 8,
            FingerprintWidth::U16 => 16,
            FingerprintWidth::U32 => 32,
        }
    }
}

impl fmt::Display for FingerprintWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "u{}", self.bits())
    }
}

/// Human readable list of the supported configurations, used in error messages
pub(crate) const SUPPORTED_CONFIGURATIONS: &str =
    "{(4, 4, u8), (4, 8, u8), (4, 12, u16), (4, 16, u16), (2, 32, u32)}";

/// One packing scheme per supported `(entries_per_bucket, bits_per_fp)` pair.
///
/// ## Lane Layout
///
/// The bucket bytes are interpreted as a little-endian integer and lane `j`
/// occupies bits `j * bits .. (j + 1) * bits` of it. Consequently:
///
/// - `Nibble4x4`: 2 bytes, lane 0 is the low nibble of byte 0
/// - `Byte4x8`: 4 bytes, one lane per byte
/// - `Packed4x12`: 6 bytes, every 3 bytes hold two lanes that share the
///   middle byte (low nibble belongs to the even lane, high nibble to the odd)
/// - `Half4x16`: 8 bytes, one little-endian `u16` per lane
/// - `Word2x32`: 8 bytes, one little-endian `u32` per lane
///
/// No bucket is wider than 8 bytes, so a whole bucket always fits in a `u64`,
/// which is what makes the SWAR containment test in [`LaneCodec::contains_value`]
/// possible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaneCodec {
    Nibble4x4,
    Byte4x8,
    Packed4x12,
    Half4x16,
    Word2x32,
}

impl LaneCodec {
    /// All codec variants, in order of increasing lane width
    pub const ALL: [LaneCodec; 5] = [
        LaneCodec::Nibble4x4,
        LaneCodec::Byte4x8,
        LaneCodec::Packed4x12,
        LaneCodec::Half4x16,
        LaneCodec::Word2x32,
    ];

    /// Select the codec matching a configuration triple.
    ///
    /// Returns `Error::Configuration` when no codec packs `entries_per_bucket`
    /// lanes of `bits_per_fp` bits for fingerprints of the given width.
    pub fn select(
        entries_per_bucket: usize,
        bits_per_fp: usize,
        width: FingerprintWidth,
    ) -> Result<Self, Error> {
        use FingerprintWidth::*;
        match (entries_per_bucket, bits_per_fp, width) {
            (4, 4, U8) => Ok(LaneCodec::Nibble4x4),
            (4, 8, U8) => Ok(LaneCodec::Byte4x8),
            (4, 12, U16) => Ok(LaneCodec::Packed4x12),
            (4, 16, U16) => Ok(LaneCodec::Half4x16),
            (2, 32, U32) => Ok(LaneCodec::Word2x32),
            _ => Err(Error::Configuration {
                entries_per_bucket,
                bits_per_fp,
                fingerprint_width: width,
            }),
        }
    }

    /// Number of lanes in a bucket
    #[inline]
    pub const fn entries_per_bucket(self) -> usize {
        match self {
            LaneCodec::Word2x32 => 2,
            _ => 4,
        }
    }

    /// Width of a single lane in bits
    #[inline]
    pub const fn bits_per_lane(self) -> u32 {
        match self {
            LaneCodec::Nibble4x4 => 4,
            LaneCodec::Byte4x8 => 8,
            LaneCodec::Packed4x12 => 12,
            LaneCodec::Half4x16 => 16,
            LaneCodec::Word2x32 => 32,
        }
    }

    /// Size of a packed bucket in bytes
    #[inline]
    pub const fn bytes_per_bucket(self) -> usize {
        self.entries_per_bucket() * self.bits_per_lane() as usize / 8
    }

    /// All-ones mask covering a single lane
    #[inline]
    pub const fn lane_mask(self) -> u32 {
        (((1u64) << self.bits_per_lane()) - 1) as u32
    }

    /// Width class of the fingerprints this codec stores
    pub fn width(self) -> FingerprintWidth {
        FingerprintWidth::for_bits(self.bits_per_lane() as usize)
    }

    /// Read lane `lane` from a packed bucket
    #[inline]
    pub fn read(self, lane: usize, bucket: &[u8]) -> u32 {
        debug_assert!(lane < self.entries_per_bucket());
        match self {
            LaneCodec::Nibble4x4 => {
                let byte = bucket[lane >> 1];
                if lane & 1 == 0 {
                    (byte & 0x0F) as u32
                } else {
                    (byte >> 4) as u32
                }
            }
            LaneCodec::Byte4x8 => bucket[lane] as u32,
            LaneCodec::Packed4x12 => {
                // Two lanes per 3 bytes, sharing the middle byte
                let base = (lane >> 1) * 3;
                if lane & 1 == 0 {
                    bucket[base] as u32 | ((bucket[base + 1] as u32 & 0x0F) << 8)
                } else {
                    (bucket[base + 1] as u32 >> 4) | ((bucket[base + 2] as u32) << 4)
                }
            }
            LaneCodec::Half4x16 => {
                let offset = lane * 2;
                u16::from_le_bytes([bucket[offset], bucket[offset + 1]]) as u32
            }
            LaneCodec::Word2x32 => {
                let offset = lane * 4;
                u32::from_le_bytes([
                    bucket[offset],
                    bucket[offset + 1],
                    bucket[offset + 2],
                    bucket[offset + 3],
                ])
            }
        }
    }

    /// Overwrite lane `lane` with the low `bits_per_lane` bits of `value`.
    /// Every other lane of the bucket is left untouched.
    #[inline]
    pub fn write(self, lane: usize, bucket: &mut [u8], value: u32) {
        debug_assert!(lane < self.entries_per_bucket());
        match self {
            LaneCodec::Nibble4x4 => {
                let byte = &mut bucket[lane >> 1];
                let value = (value & 0x0F) as u8;
                if lane & 1 == 0 {
                    *byte = (*byte & 0xF0) | value;
                } else {
                    *byte = (*byte & 0x0F) | (value << 4);
                }
            }
            LaneCodec::Byte4x8 => bucket[lane] = value as u8,
            LaneCodec::Packed4x12 => {
                let base = (lane >> 1) * 3;
                let value = value & 0x0FFF;
                if lane & 1 == 0 {
                    bucket[base] = value as u8;
                    bucket[base + 1] = (bucket[base + 1] & 0xF0) | (value >> 8) as u8;
                } else {
                    bucket[base + 1] = (bucket[base + 1] & 0x0F) | ((value & 0x0F) << 4) as u8;
                    bucket[base + 2] = (value >> 4) as u8;
                }
            }
            LaneCodec::Half4x16 => {
                let offset = lane * 2;
                bucket[offset..offset + 2].copy_from_slice(&(value as u16).to_le_bytes());
            }
            LaneCodec::Word2x32 => {
                let offset = lane * 4;
                bucket[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
            }
        }
    }

    /// Zero-extend a packed bucket into a single machine word.
    ///
    /// This is the only place where a bucket is reinterpreted as an integer;
    /// the word uses the same little-endian lane layout as [`LaneCodec::read`].
    #[inline]
    pub fn pack(bucket: &[u8]) -> u64 {
        debug_assert!(bucket.len() <= 8);
        let mut word = [0u8; 8];
        word[..bucket.len()].copy_from_slice(bucket);
        u64::from_le_bytes(word)
    }

    /// Check whether any lane of a packed bucket word equals `value`.
    ///
    /// ## SWAR Zero-Lane Test
    ///
    /// `value` is broadcast into every lane and XORed with the word, so that
    /// matching lanes become zero. A lane-parallel zero test then runs on the
    /// result `x`:
    ///
    /// ```text
    /// (x - ONES) & !x & HIGHS
    /// ```
    ///
    /// where `ONES` has the lowest bit of every lane set and `HIGHS` the
    /// highest. The expression is non-zero iff at least one lane of `x` is
    /// zero: the lowest zero lane always borrows into its own high bit, and no
    /// lane below it can raise a false flag. Both constants only cover the
    /// bucket's own lanes, so the zero padding above a narrow bucket never
    /// matches.
    #[inline]
    pub fn contains_value(self, word: u64, value: u32) -> bool {
        let ones = self.lane_ones();
        let highs = ones << (self.bits_per_lane() - 1);
        let broadcast = (value & self.lane_mask()) as u64 * ones;
        let x = word ^ broadcast;
        x.wrapping_sub(ones) & !x & highs != 0
    }

    /// Word with the lowest bit of every lane set
    #[inline]
    const fn lane_ones(self) -> u64 {
        match self {
            LaneCodec::Nibble4x4 => 0x1111,
            LaneCodec::Byte4x8 => 0x0101_0101,
            LaneCodec::Packed4x12 => 0x0010_0100_1001,
            LaneCodec::Half4x16 => 0x0001_0001_0001_0001,
            LaneCodec::Word2x32 => 0x0000_0001_0000_0001,
        }
    }
}

impl fmt::Display for LaneCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}, {})",
            self.entries_per_bucket(),
            self.bits_per_lane(),
            self.width()
        )
    }
}
