//! Bounded hash/digest value.
//!
//! The negotiated hash length `L` ranges over `1..=64`. The buffer is
//! fixed-size so the hot path never allocates to hold an anchor, token, or
//! intermediate chain element.

use serde::de::{Error as DeError, SeqAccess, Visitor};
use serde::ser::SerializeSeq;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Upper bound on the negotiated hash length `L`.
pub const MAX_HASH_LEN: usize = 64;

/// A hash/digest value of some negotiated length `L <= MAX_HASH_LEN`.
///
/// Equality and ordering only ever compare the live `len` bytes; the tail
/// of `bytes` beyond `len` is unspecified and must never be read.
///
/// Serialized as its live byte slice: `serde`'s array impls only cover
/// `[T; N]` up to `N = 32`, short of `MAX_HASH_LEN`, so `Serialize`/
/// `Deserialize` are implemented by hand in terms of `as_slice`/`from_slice`.
#[derive(Clone, Copy)]
pub struct HashValue {
    bytes: [u8; MAX_HASH_LEN],
    len: u8,
}

impl HashValue {
    /// An all-zero value of the given length, used as the "absent" sentinel
    /// for `next_anchors`/`next_roots` slots before an update is armed.
    pub fn zero(len: u8) -> Self {
        Self {
            bytes: [0u8; MAX_HASH_LEN],
            len,
        }
    }

    /// Build a `HashValue` from a byte slice, truncating/erroring on overflow.
    pub fn from_slice(data: &[u8]) -> Option<Self> {
        if data.len() > MAX_HASH_LEN {
            return None;
        }
        let mut bytes = [0u8; MAX_HASH_LEN];
        bytes[..data.len()].copy_from_slice(data);
        Some(Self {
            bytes,
            len: data.len() as u8,
        })
    }

    pub fn len(&self) -> usize {
        self.len as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// True if every live byte is zero — the "no anchor installed yet" state.
    pub fn is_zero(&self) -> bool {
        self.as_slice().iter().all(|&b| b == 0)
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes[..self.len()]
    }
}

impl PartialEq for HashValue {
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}
impl Eq for HashValue {}

impl fmt::Debug for HashValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HashValue(")?;
        for b in self.as_slice() {
            write!(f, "{:02x}", b)?;
        }
        write!(f, ")")
    }
}

impl AsRef<[u8]> for HashValue {
    fn as_ref(&self) -> &[u8] {
        self.as_slice()
    }
}

impl Serialize for HashValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.len()))?;
        for byte in self.as_slice() {
            seq.serialize_element(byte)?;
        }
        seq.end()
    }
}

struct HashValueVisitor;

impl<'de> Visitor<'de> for HashValueVisitor {
    type Value = HashValue;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "a byte sequence of at most {MAX_HASH_LEN} bytes")
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
        let mut bytes = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(byte) = seq.next_element()? {
            bytes.push(byte);
        }
        HashValue::from_slice(&bytes)
            .ok_or_else(|| A::Error::custom("hash value exceeds MAX_HASH_LEN"))
    }
}

impl<'de> Deserialize<'de> for HashValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_seq(HashValueVisitor)
    }
}
