//! Host Identity Tag.
//!
//! A 128-bit identifier derived from a host's public key; a pair of HITs
//! names a security association.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A 128-bit Host Identity Tag.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Hit(pub [u8; 16]);

/// Names one direction of one SA: the (local, peer) HIT pair plus which
/// way the traffic flows. Every SA is backed by two `SaKey`s, one per
/// direction.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SaKey {
    pub initiator: Hit,
    pub responder: Hit,
}

impl fmt::Debug for Hit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hit(")?;
        for b in &self.0 {
            write!(f, "{:02x}", b)?;
        }
        write!(f, ")")
    }
}

impl fmt::Debug for SaKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SaKey({:?} <-> {:?})", self.initiator, self.responder)
    }
}
