//! Per-SA anchor state.
//!
//! Every field here is owned exclusively by the tracker for that SA; no
//! other component mutates it directly.

use std::collections::VecDeque;
use tpa_types::{Error, HashValue, TransformId};

/// One slot of the cumulative ring buffer: `(seq, packet_hash)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RingSlot {
    pub seq: u32,
    pub packet_hash: HashValue,
}

/// A Merkle-branch proof that a chain's terminal anchor is a leaf of
/// `active_root`, captured at light-UPDATE Msg-1 time (the only point the
/// wire format carries `BRANCH`/`SECRET` parameters). Carried alongside
/// a root so the per-packet verifier can re-check "the terminal of the
/// chain matches the root" (spec §4.1 edge case) without needing fresh
/// branch data on every ESP datagram, which the wire format never sends.
#[derive(Debug, Clone)]
pub struct RootProof {
    pub branch: Vec<HashValue>,
    pub secret: Vec<u8>,
    pub anchor_offset: u64,
}

/// A pending anchor update cached between a standard/light UPDATE Msg-1
/// and its Msg-2 ACK. Created on Msg-1, destroyed on a matching ACK or on
/// SA teardown.
#[derive(Debug, Clone)]
pub struct PendingUpdate {
    pub seq: u32,
    pub transform: TransformId,
    pub hash_item_length: u32,
    pub active: Vec<HashValue>,
    pub next: Vec<HashValue>,
    pub roots: Option<Vec<HashValue>>,
    /// Per-chain proof that `active[i]` is a leaf of the *current*
    /// `active_root`, present only when this entry came from a light
    /// UPDATE Msg-1. `None` for standard-UPDATE entries.
    pub root_proofs: Option<Vec<RootProof>>,
}

/// Ordered, newest-first cache of pending anchor updates, with at most one
/// entry per update sequence number. Linear search on ACK is fine because
/// the cache is small (bounded by outstanding UPDATEs, typically 1-3); do
/// not replace with a hashmap without measuring.
#[derive(Debug, Default)]
pub struct AnchorCache {
    entries: VecDeque<PendingUpdate>,
}

impl AnchorCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Insert newest-first. At most one entry per `seq` exists: a
    /// re-insertion with the same sequence replaces the prior entry rather
    /// than creating a duplicate.
    pub fn insert(&mut self, entry: PendingUpdate) {
        self.entries.retain(|e| e.seq != entry.seq);
        self.entries.push_front(entry);
    }

    /// Remove and return the entry for `seq`, if any (O(cache length)).
    pub fn take(&mut self, seq: u32) -> Option<PendingUpdate> {
        let pos = self.entries.iter().position(|e| e.seq == seq)?;
        self.entries.remove(pos)
    }

    pub fn contains(&self, seq: u32) -> bool {
        self.entries.iter().any(|e| e.seq == seq)
    }
}

/// Per-direction, per-SA anchor state.
#[derive(Debug)]
pub struct SaState {
    pub transform: TransformId,
    pub num_chains: usize,
    /// `I`, the negotiated number of leaves per tree structure.
    pub hash_item_length: u32,
    /// `tree_depth = ceil(log2(hash_item_length))`, only meaningful for TREE.
    pub tree_depth: Option<u32>,

    pub active_anchors: Vec<HashValue>,
    pub first_active_anchors: Vec<HashValue>,
    pub next_anchors: Vec<HashValue>,

    pub active_roots: Vec<Option<HashValue>>,
    pub next_roots: Vec<Option<HashValue>>,
    /// Proof that `active_anchors[i]` is a leaf of `active_roots[i]`,
    /// when both are present (see `RootProof`).
    pub active_root_proofs: Vec<Option<RootProof>>,
    pub next_root_proofs: Vec<Option<RootProof>>,

    pub seq_no: u32,
    pub hash_buffer: Vec<Option<RingSlot>>,
    pub anchor_cache: AnchorCache,

    /// Last sequence number accepted as the `SEQ` of a light-UPDATE Msg-1,
    /// used for the `SEQ.update_id >= SA.lupdate_seq` ordering check.
    pub lupdate_seq: u32,
}

impl SaState {
    /// Install the SA from a base-exchange `ANCHOR` parameter set. `active`
    /// is consumed into both `active_anchors` and `first_active_anchors`:
    /// the first-active value only ever changes on an ACK, never on
    /// packet-level evidence.
    pub fn install(
        transform: TransformId,
        active: Vec<HashValue>,
        hash_item_length: u32,
        ring_buffer_size: usize,
        hash_len: u8,
    ) -> Self {
        let num_chains = active.len();
        let tree_depth = if transform.is_tree() {
            Some(crate::domain::hash::log2_ceil(hash_item_length as usize))
        } else {
            None
        };
        let zero = HashValue::zero(hash_len);
        Self {
            transform,
            num_chains,
            hash_item_length,
            tree_depth,
            first_active_anchors: active.clone(),
            active_anchors: active,
            next_anchors: vec![zero; num_chains],
            active_roots: vec![None; num_chains],
            next_roots: vec![None; num_chains],
            active_root_proofs: vec![None; num_chains],
            next_root_proofs: vec![None; num_chains],
            seq_no: 0,
            hash_buffer: vec![None; ring_buffer_size],
            anchor_cache: AnchorCache::new(),
            lupdate_seq: 0,
        }
    }

    /// Arm a transition: copy `next` into `next_anchors[i]`, and if a root
    /// (and its proof) was supplied, transfer ownership into
    /// `next_roots[i]`/`next_root_proofs[i]`.
    pub fn arm_next(
        &mut self,
        chain: usize,
        next: HashValue,
        root: Option<HashValue>,
        root_proof: Option<RootProof>,
    ) {
        self.next_anchors[chain] = next;
        if let Some(r) = root {
            self.next_roots[chain] = Some(r);
        }
        if root_proof.is_some() {
            self.next_root_proofs[chain] = root_proof;
        }
    }

    /// Apply a confirmed transition on `chain`: non-TREE semantics (the
    /// just-verified token becomes the new active anchor; the armed next
    /// anchor becomes the new first-active anchor).
    pub fn transition_non_tree(&mut self, chain: usize, verified_token: HashValue) {
        let next = self.next_anchors[chain];
        let zero = HashValue::zero(next.len() as u8);
        self.active_anchors[chain] = verified_token;
        self.first_active_anchors[chain] = next;
        self.next_anchors[chain] = zero;
        self.active_roots[chain] = self.next_roots[chain].take();
        self.active_root_proofs[chain] = self.next_root_proofs[chain].take();
    }

    /// Apply a confirmed transition on `chain`: TREE semantics (the root
    /// and next-root replace the anchor wholesale).
    pub fn transition_tree(&mut self, chain: usize) {
        let next = self.next_anchors[chain];
        let zero = HashValue::zero(next.len() as u8);
        self.active_anchors[chain] = next;
        self.first_active_anchors[chain] = next;
        self.next_anchors[chain] = zero;
        self.active_roots[chain] = self.next_roots[chain].take();
        self.active_root_proofs[chain] = self.next_root_proofs[chain].take();
    }

    /// Look up a ring slot by ESP sequence number.
    pub fn ring_slot(&self, seq: u32) -> Option<&RingSlot> {
        if self.hash_buffer.is_empty() {
            return None;
        }
        let idx = (seq as usize) % self.hash_buffer.len();
        self.hash_buffer[idx].as_ref()
    }

    /// Install `(seq, hash)` into its ring slot iff it's fresher than
    /// what's already there (freshest wins per slot).
    pub fn ring_insert_if_fresher(&mut self, seq: u32, hash: HashValue) {
        if self.hash_buffer.is_empty() {
            return;
        }
        let idx = (seq as usize) % self.hash_buffer.len();
        let fresher = match &self.hash_buffer[idx] {
            Some(slot) => seq > slot.seq,
            None => true,
        };
        if fresher {
            self.hash_buffer[idx] = Some(RingSlot {
                seq,
                packet_hash: hash,
            });
        }
    }

    /// Validate that every active anchor is non-zero while the SA is live.
    /// Intended for tests/assertions, not the hot path.
    pub fn check_active_anchors_nonzero(&self) -> Result<(), Error> {
        if self.active_anchors.iter().any(|a| a.is_zero()) {
            return Err(Error::Malformed(
                "active anchor is zero while SA is live".into(),
            ));
        }
        Ok(())
    }
}
