#![warn(missing_docs)]

//! Identifier space of the ring.
//!
//! An [Id] is an element of the finite ring Z/(2^m), where `m` is the bit width held by
//! [IdSpace]. Arithmetic that can leave the ring (adding a finger offset, hashing an
//! address) always goes through an [IdSpace] so the result is reduced modulo `2^m`.
//! Comparing two identifiers with `<` only tells their numeric order. Containment on the
//! ring is answered by [between] and [Id::is_strictly_between], which walk clockwise.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::Serializer;
use sha1::Digest;
use sha1::Sha1;

use crate::error::Error;
use crate::error::Result;

/// Largest supported bit width of the ring.
pub const MAX_ID_BITS: u8 = 128;

/// Identifier on the ring, always already reduced into its [IdSpace].
#[derive(Copy, Clone, Default, Eq, Ord, PartialEq, PartialOrd, Debug, Hash)]
pub struct Id(u128);

/// Bit width `m` of the ring. The ring holds `2^m` identifiers.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct IdSpace {
    bits: u8,
}

/// Test `id` in (lower, upper], walking clockwise from `lower`.
///
/// When `lower >= upper` the range wraps through zero, so `lower == upper` covers the
/// whole ring.
pub fn between(id: Id, lower: Id, upper: Id) -> bool {
    if lower < upper {
        lower < id && id <= upper
    } else {
        id > lower || id <= upper
    }
}

impl Id {
    /// Raw value of the identifier.
    pub fn value(&self) -> u128 {
        self.0
    }

    /// Test self in (lower, upper].
    pub fn is_between(&self, lower: Id, upper: Id) -> bool {
        between(*self, lower, upper)
    }

    /// Test self in (lower, upper), exclusive on both ends.
    pub fn is_strictly_between(&self, lower: Id, upper: Id) -> bool {
        between(*self, lower, upper) && *self != upper
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "0x{:x}", self.0)
    }
}

impl FromStr for Id {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        let hex = s.strip_prefix("0x").unwrap_or(s);
        u128::from_str_radix(hex, 16)
            .map(Self)
            .map_err(|_| Error::BadIdFormat(s.to_string()))
    }
}

impl Serialize for Id {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where S: Serializer {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Id {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where D: Deserializer<'de> {
        let s = String::deserialize(deserializer)?;
        Id::from_str(&s).map_err(serde::de::Error::custom)
    }
}

impl From<u32> for Id {
    fn from(v: u32) -> Self {
        Self(v.into())
    }
}

impl From<u64> for Id {
    fn from(v: u64) -> Self {
        Self(v.into())
    }
}

impl From<Id> for u128 {
    fn from(id: Id) -> u128 {
        id.0
    }
}

impl IdSpace {
    /// Create a ring of `2^bits` identifiers.
    pub fn new(bits: u8) -> Result<Self> {
        if bits == 0 || bits > MAX_ID_BITS {
            return Err(Error::InvalidIdBits(bits));
        }
        Ok(Self { bits })
    }

    /// Bit width `m`, which is also the number of fingers of every node.
    pub fn bits(&self) -> u8 {
        self.bits
    }

    fn mask(&self) -> u128 {
        if self.bits == MAX_ID_BITS {
            u128::MAX
        } else {
            (1u128 << self.bits) - 1
        }
    }

    /// Whether `id` is below `2^m`. Ids decoded from the wire are not reduced.
    pub fn contains(&self, id: Id) -> bool {
        id.0 <= self.mask()
    }

    /// Reduce a raw value modulo `2^m`.
    pub fn wrap(&self, value: u128) -> Id {
        Id(value & self.mask())
    }

    /// `(id + offset) mod 2^m`
    pub fn add(&self, id: Id, offset: u128) -> Id {
        self.wrap(id.0.wrapping_add(offset))
    }

    /// Start of finger `index` (0-based) of the node `id`: `(id + 2^index) mod 2^m`.
    pub fn finger_start(&self, id: Id, index: usize) -> Id {
        // 2^index is 0 modulo 2^m once index >= 128.
        let offset = u32::try_from(index)
            .ok()
            .and_then(|shift| 1u128.checked_shl(shift))
            .unwrap_or(0);
        self.add(id, offset)
    }

    /// Clockwise distance from `from` to `to`: `(to - from) mod 2^m`.
    pub fn distance(&self, from: Id, to: Id) -> u128 {
        to.0.wrapping_sub(from.0) & self.mask()
    }

    /// Hash arbitrary bytes onto the ring: SHA-1 digest reduced modulo `2^m`.
    pub fn hash(&self, data: impl AsRef<[u8]>) -> Id {
        let digest = Sha1::digest(data.as_ref());
        // The low 128 bits of the big-endian digest are enough for any m <= 128.
        let mut low = [0u8; 16];
        low.copy_from_slice(&digest[digest.len() - 16..]);
        self.wrap(u128::from_be_bytes(low))
    }
}

impl TryFrom<u8> for IdSpace {
    type Error = Error;
    fn try_from(bits: u8) -> Result<Self> {
        Self::new(bits)
    }
}

impl From<IdSpace> for u8 {
    fn from(space: IdSpace) -> u8 {
        space.bits
    }
}
