//! Hash-chain verifier.

use crate::domain::hash;
use crate::domain::htree;
use crate::domain::sa_state::RootProof;
use tpa_types::HashValue;

/// Outcome of walking a candidate token forward against `active`/`next`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainOutcome {
    /// The candidate is `hops` elements further into the current chain
    /// than the last accepted token. Caller replaces `active` with the
    /// candidate.
    Same { hops: u32 },
    /// The candidate rolled onto the next chain. Caller advances the SA
    /// to the armed next anchor.
    Transition { hops: u32 },
}

/// When the chain's terminal is additionally tied to a Merkle root (spec
/// §4.1 edge case: "if `active_root` is present, each hop must
/// additionally verify that the terminal of the chain matches the root
/// via the tree verifier"), a hop match alone is not enough — the
/// terminal anchor must also fold up to `root` via its proof.
///
/// `active_proof`/`next_proof` prove `active`/`next` respectively are
/// leaves of the *same* `root` (both were established against the root
/// in force before any transition); only the proof matching whichever
/// arm produces a hop match is consulted.
pub fn verify_hchain(
    active: &HashValue,
    next: &HashValue,
    candidate: &HashValue,
    window: u32,
    root: Option<&HashValue>,
    active_proof: Option<&RootProof>,
    next_proof: Option<&RootProof>,
) -> Option<ChainOutcome> {
    let mut h_k = *candidate;

    // Active-chain arm: k >= 1 only, so candidate == active is a reject.
    for k in 1..=window {
        h_k = hash::step(&h_k);
        if &h_k == active {
            if !terminal_matches_root(active, root, active_proof) {
                return None;
            }
            return Some(ChainOutcome::Same { hops: k });
        }
    }

    // Next-chain arm: k >= 0, so candidate == next itself is a valid
    // zero-hop transition (the sender's very first packet on the new chain).
    if !next.is_zero() {
        let mut h_k = *candidate;
        if &h_k == next {
            if !terminal_matches_root(next, root, next_proof) {
                return None;
            }
            return Some(ChainOutcome::Transition { hops: 0 });
        }
        for k in 1..=window {
            h_k = hash::step(&h_k);
            if &h_k == next {
                if !terminal_matches_root(next, root, next_proof) {
                    return None;
                }
                return Some(ChainOutcome::Transition { hops: k });
            }
        }
    }

    None
}

fn terminal_matches_root(
    terminal: &HashValue,
    root: Option<&HashValue>,
    proof: Option<&RootProof>,
) -> bool {
    match (root, proof) {
        (None, _) => true,
        (Some(_), None) => true,
        (Some(root), Some(proof)) => htree::verify_branch(
            root,
            &proof.branch,
            terminal.as_slice(),
            proof.anchor_offset,
            &proof.secret,
        ),
    }
}
