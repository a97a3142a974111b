//! Connection tracker: maps observed HIP control messages onto per-SA
//! state. Handles R1 transform advertisement, I2/R2 initial anchor
//! installation, UPDATE caching and acknowledgement-driven activation,
//! and light-UPDATE (HHL) Merkle-branch verification.
//!
//! Every function here is pure state-transition logic: no I/O, no
//! network parsing. The caller (the driving port) is responsible for
//! turning raw wire bytes into a `ControlMessage` and for routing it to
//! the right `SaState`.

use crate::domain::hash;
use crate::domain::htree;
use crate::domain::sa_registry::SaRegistry;
use crate::domain::sa_state::{PendingUpdate, RootProof, SaState};
use tpa_types::{ControlMessage, Error, HashValue, SaKey, TransformId};

/// Count of `TransformId` variants, used to bound the cached preferred-
/// transforms list.
const NUM_TRANSFORMS: usize = 6;

/// Which base-exchange message is installing an SA. Spec §4.4 point 2:
/// I2 is the first time an SA is installed for a direction (the
/// registry must not already hold one); R2 must attach to exactly one
/// pre-existing SA for that direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaseExchangeKind {
    I2,
    R2,
}

/// Outcome of dispatching one HIP UPDATE message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// Msg-1 (standard or light) cached a pending update under this
    /// sequence number; no SA state changed yet.
    Cached { seq: u32 },
    /// Msg-2 activated zero or more chains (those whose cached `active`
    /// matched `first_active_anchors`).
    Activated,
}

/// Normalize and bound an R1 `PREFERRED_TRANSFORMS` advertisement to at
/// most `NUM_TRANSFORMS + 1` entries.
///
/// Unknown wire values are already mapped to `TransformId::Unused` by
/// `TransformId::from_wire` before this is called. But a value can be a
/// *recognized* transform the wire format understands while still being
/// one this node doesn't locally support (no key material for it, it was
/// compiled out, etc.) — those entries are normalized to `Unused` here,
/// per spec §4.6.
pub fn cache_preferred_transforms(
    advertised: &[TransformId],
    locally_supported: &[TransformId],
) -> Vec<TransformId> {
    advertised
        .iter()
        .map(|&t| {
            if t != TransformId::Unused && locally_supported.contains(&t) {
                t
            } else {
                TransformId::Unused
            }
        })
        .take(NUM_TRANSFORMS + 1)
        .collect()
}

/// Install an SA from an I2 or R2 base-exchange message, into `registry`
/// under `key`.
///
/// `advertised` is the locally-supported transform set. Returns
/// `Error::Unsupported` if the message's transform is `UNUSED`,
/// `Error::Mismatch` if it names a transform outside `advertised` or if
/// `kind`'s registry invariant is violated (I2 over an existing SA, R2
/// with no pre-existing SA), or `Error::Malformed` if the anchor count or
/// lengths don't line up.
pub fn install_base_exchange(
    registry: &mut SaRegistry,
    key: SaKey,
    kind: BaseExchangeKind,
    msg: &ControlMessage,
    advertised: &[TransformId],
    ring_buffer_size: usize,
    hash_len: u8,
) -> Result<(), Error> {
    let first = msg
        .anchors
        .first()
        .ok_or_else(|| Error::Malformed("base exchange message carries no ANCHOR".into()))?;
    let transform = first.transform;

    if transform == TransformId::Unused {
        return Err(Error::Unsupported { transform });
    }
    if !advertised.contains(&transform) {
        return Err(Error::Mismatch {
            expected: format!("one of {advertised:?}"),
            got: format!("{transform:?}"),
        });
    }
    if msg.anchors.iter().any(|a| a.transform != transform) {
        return Err(Error::Malformed(
            "ANCHOR parameters in one message disagree on transform".into(),
        ));
    }

    let hash_item_length = if transform.is_tree() {
        let depth = hash::log2_ceil(first.hash_item_length as usize);
        hash::pow2(depth) as u32
    } else {
        first.hash_item_length
    };

    let active: Vec<HashValue> = msg.anchors.iter().map(|a| a.active).collect();
    let sa = SaState::install(transform, active, hash_item_length, ring_buffer_size, hash_len);

    match kind {
        BaseExchangeKind::I2 => registry.install_new(key, sa),
        BaseExchangeKind::R2 => registry.attach(key, sa),
    }
}

/// Dispatch one UPDATE message to the correct handler based on which
/// fields are present. The two mutual/location-UPDATE shapes are
/// deliberately left unimplemented (open question in the surrounding
/// control-plane design): `SEQ+ACK+ESP_INFO` and `ACK+ESP_INFO+ANCHOR`.
pub fn dispatch_update(sa: &mut SaState, msg: &ControlMessage) -> Result<UpdateOutcome, Error> {
    let has_seq = msg.seq.is_some();
    let has_ack = msg.ack.is_some();
    let has_anchor = !msg.anchors.is_empty();
    let has_branch = !msg.branches.is_empty();

    match (has_seq, has_ack, has_anchor, msg.esp_info) {
        (true, false, true, false) if !has_branch => {
            let seq = handle_standard_msg1(sa, msg)?;
            Ok(UpdateOutcome::Cached { seq })
        }
        (true, false, true, false) if has_branch => {
            let seq = handle_light_msg1(sa, msg)?;
            Ok(UpdateOutcome::Cached { seq })
        }
        (false, true, false, true) => {
            handle_msg2(sa, msg)?;
            Ok(UpdateOutcome::Activated)
        }
        (true, true, _, true) => Err(Error::NotImplemented("mutual UPDATE (SEQ+ACK+ESP_INFO)")),
        (false, true, true, true) => {
            Err(Error::NotImplemented("mutual/location UPDATE (ACK+ESP_INFO+ANCHOR)"))
        }
        _ => Err(Error::Malformed(
            "unrecognized UPDATE parameter combination".into(),
        )),
    }
}

/// Standard anchor-UPDATE Msg-1: cache the proposed active/next anchors
/// under `SEQ.update_id`, matched against `first_active_anchors[0]`.
fn handle_standard_msg1(sa: &mut SaState, msg: &ControlMessage) -> Result<u32, Error> {
    let seq = msg.seq.ok_or_else(|| Error::Malformed("Msg-1 missing SEQ".into()))?;
    let first = msg
        .anchors
        .first()
        .ok_or_else(|| Error::Malformed("Msg-1 carries no ANCHOR".into()))?;

    if first.active != sa.first_active_anchors[0] {
        return Err(Error::Mismatch {
            expected: format!("{:?}", sa.first_active_anchors[0]),
            got: format!("{:?}", first.active),
        });
    }
    if msg.anchors.len() != sa.num_chains {
        return Err(Error::Mismatch {
            expected: format!("{} ANCHOR parameters", sa.num_chains),
            got: format!("{}", msg.anchors.len()),
        });
    }

    let roots = if msg.roots.is_empty() {
        None
    } else {
        Some(msg.roots.iter().map(|r| r.root).collect())
    };

    sa.anchor_cache.insert(PendingUpdate {
        seq,
        transform: first.transform,
        hash_item_length: sa.hash_item_length,
        active: msg.anchors.iter().map(|a| a.active).collect(),
        next: msg.anchors.iter().map(|a| a.next).collect(),
        roots,
        root_proofs: None,
    });
    Ok(seq)
}

/// Light-UPDATE (HHL) Msg-1: the same caching as the standard protocol,
/// but each proposed anchor must first be proven via a Merkle branch
/// against the chain's current `active_root`. `lupdate_seq` only
/// advances on success; a failed verification leaves both the cache and
/// `lupdate_seq` untouched.
fn handle_light_msg1(sa: &mut SaState, msg: &ControlMessage) -> Result<u32, Error> {
    let seq = msg.seq.ok_or_else(|| Error::Malformed("Msg-1 missing SEQ".into()))?;
    if seq <= sa.lupdate_seq {
        return Err(Error::Replay { seq });
    }
    if msg.anchors.len() != sa.num_chains
        || msg.branches.len() != sa.num_chains
        || msg.secrets.len() != sa.num_chains
    {
        return Err(Error::Malformed(
            "light UPDATE Msg-1 must carry one ANCHOR, BRANCH, and SECRET per chain".into(),
        ));
    }

    for i in 0..sa.num_chains {
        let root = sa.active_roots[i]
            .as_ref()
            .ok_or_else(|| Error::Malformed("no active_root to verify branch against".into()))?;
        let verified = htree::verify_branch(
            root,
            &msg.branches[i].nodes,
            msg.anchors[i].active.as_slice(),
            msg.branches[i].anchor_offset as u64,
            &msg.secrets[i].secret,
        );
        if !verified {
            return Err(Error::VerifyFailed);
        }
    }

    let roots = if msg.roots.is_empty() {
        None
    } else {
        Some(msg.roots.iter().map(|r| r.root).collect())
    };
    // Each chain's BRANCH/SECRET just proved `anchors[i].active` is a leaf
    // of the SA's *current* `active_root`; that proof stays valid after
    // activation and lets the per-packet verifier re-check the same fact
    // (spec §4.1 edge case) without fresh branch data on every datagram.
    let root_proofs = Some(
        (0..sa.num_chains)
            .map(|i| RootProof {
                branch: msg.branches[i].nodes.clone(),
                secret: msg.secrets[i].secret.clone(),
                anchor_offset: msg.branches[i].anchor_offset as u64,
            })
            .collect(),
    );
    sa.anchor_cache.insert(PendingUpdate {
        seq,
        transform: sa.transform,
        hash_item_length: sa.hash_item_length,
        active: msg.anchors.iter().map(|a| a.active).collect(),
        next: msg.anchors.iter().map(|a| a.next).collect(),
        roots,
        root_proofs,
    });
    sa.lupdate_seq = seq;
    Ok(seq)
}

/// Msg-2 (shared by the standard and light protocols): activate the
/// cached update named by `ACK`, arming `next_anchors`/`next_roots` for
/// every chain whose cached `active` still matches
/// `first_active_anchors`. The set of chains to update is computed
/// before any mutation, so a partially-matching entry cannot leave the
/// SA in a half-applied state.
fn handle_msg2(sa: &mut SaState, msg: &ControlMessage) -> Result<(), Error> {
    let ack = msg.ack.ok_or_else(|| Error::Malformed("Msg-2 missing ACK".into()))?;
    let entry = sa.anchor_cache.take(ack).ok_or(Error::CacheMiss { seq: ack })?;

    let chains: Vec<usize> = (0..sa.num_chains)
        .filter(|&i| entry.active.get(i) == Some(&sa.first_active_anchors[i]))
        .collect();

    for i in chains {
        let root = entry.roots.as_ref().and_then(|r| r.get(i).cloned());
        let root_proof = entry
            .root_proofs
            .as_ref()
            .and_then(|proofs| proofs.get(i).cloned());
        sa.arm_next(i, entry.next[i], root, root_proof);
    }
    Ok(())
}
