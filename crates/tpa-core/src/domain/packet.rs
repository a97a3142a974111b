//! Per-packet verifier — the hot path.
//!
//! Given a just-decapsulated ESP datagram and its resolved inbound SA,
//! decide which parallel chain the packet belongs to, verify its token,
//! advance state on a confirmed anchor transition, and cache
//! forward-declared packet hashes for cumulative authentication. No
//! allocation: every buffer involved is pre-sized by the negotiated
//! transform.

use crate::domain::hash;
use crate::domain::hchain::{self, ChainOutcome};
use crate::domain::sa_state::SaState;
use crate::domain::token::EspView;
use tpa_types::{Error, TransformId};

/// Whether the packet was verified against the live chain/tree state, or
/// accepted out-of-order via the cumulative ring (in which case no SA
/// state changes).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyOutcome {
    Fresh,
    ReplayedFromRing,
}

/// Verify one ESP datagram against `sa`, mutating it on success.
pub fn verify_packet(
    sa: &mut SaState,
    view: &EspView<'_>,
    window: u32,
) -> Result<VerifyOutcome, Error> {
    if sa.transform == TransformId::Unused {
        return Ok(VerifyOutcome::Fresh);
    }

    let esp_seq = view.seq();
    let chain = ((esp_seq.wrapping_sub(1)) as usize) % sa.num_chains;
    let token = view.token();

    if sa.transform.is_tree() {
        let outcome = verify_tree_element(sa, chain, &token)?;
        apply_outcome(sa, chain, &token, outcome);
        sa.seq_no = esp_seq;
        return Ok(VerifyOutcome::Fresh);
    }

    let delta = esp_seq as i64 - sa.seq_no as i64;
    if delta > 0 && delta as u32 <= window {
        let outcome = hchain::verify_hchain(
            &sa.active_anchors[chain],
            &sa.next_anchors[chain],
            &token,
            delta as u32,
            sa.active_roots[chain].as_ref(),
            sa.active_root_proofs[chain].as_ref(),
            sa.next_root_proofs[chain].as_ref(),
        )
        .ok_or(Error::VerifyFailed)?;
        apply_outcome(sa, chain, &token, outcome);
        sa.seq_no = esp_seq;
        if sa.transform.is_cumulative() {
            cache_cumulative_items(sa, view);
        }
        return Ok(VerifyOutcome::Fresh);
    }

    if sa.transform.is_cumulative() && delta <= 0 {
        verify_cumulative_replay(sa, view, esp_seq)?;
        return Ok(VerifyOutcome::ReplayedFromRing);
    }

    Err(Error::Replay { seq: esp_seq })
}

fn apply_outcome(
    sa: &mut SaState,
    chain: usize,
    token: &tpa_types::HashValue,
    outcome: ChainOutcome,
) {
    match outcome {
        ChainOutcome::Same { .. } => {
            sa.active_anchors[chain] = *token;
        }
        ChainOutcome::Transition { .. } => {
            if sa.transform.is_tree() {
                sa.transition_tree(chain);
            } else {
                sa.transition_non_tree(chain, *token);
            }
        }
    }
}

/// TREE transform: the per-packet token is verified directly against the
/// tree-derived anchor, not by chain-walking. `active_anchors[chain]`
/// holds the leaf currently in force (proven once, at UPDATE time, via a
/// Merkle branch); repeated packets presenting that same leaf are
/// accepted as `Same`. A packet presenting `next_anchors[chain]` (armed
/// by a verified light UPDATE) triggers the transition.
fn verify_tree_element(
    sa: &SaState,
    chain: usize,
    token: &tpa_types::HashValue,
) -> Result<ChainOutcome, Error> {
    if token == &sa.active_anchors[chain] {
        return Ok(ChainOutcome::Same { hops: 0 });
    }
    if !sa.next_anchors[chain].is_zero() && token == &sa.next_anchors[chain] {
        return Ok(ChainOutcome::Transition { hops: 0 });
    }
    Err(Error::VerifyFailed)
}

/// CUMULATIVE/PARA_CUMUL: an older packet (`delta <= 0`) is accepted iff
/// its ring slot holds exactly this `esp_seq` and `H(whole ESP payload)`
/// matches what was pre-announced.
fn verify_cumulative_replay(
    sa: &SaState,
    view: &EspView<'_>,
    esp_seq: u32,
) -> Result<(), Error> {
    let slot = sa.ring_slot(esp_seq).ok_or(Error::Replay { seq: esp_seq })?;
    if slot.seq != esp_seq {
        return Err(Error::Replay { seq: esp_seq });
    }
    let computed = hash::h(view.whole(), slot.packet_hash.len());
    if computed == slot.packet_hash {
        Ok(())
    } else {
        Err(Error::Replay { seq: esp_seq })
    }
}

/// After a successful verification, cache every trailing cumulative item
/// whose sequence is fresher than what's already in its ring slot.
fn cache_cumulative_items(sa: &mut SaState, view: &EspView<'_>) {
    for item in view.cumulative_items() {
        sa.ring_insert_if_fresher(item.seq, item.packet_hash);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::token::ESP_HEADER_LEN;
    use tpa_types::{HashValue, TransformId};

    fn chain_of(seed: &[u8], len: usize) -> Vec<HashValue> {
        let mut v = Vec::with_capacity(len + 1);
        let mut cur = hash::h(seed, 20);
        v.push(cur);
        for _ in 0..len {
            cur = hash::step(&cur);
            v.push(cur);
        }
        v
    }

    fn datagram(seq: u32, token: &HashValue) -> Vec<u8> {
        let mut buf = vec![0u8; ESP_HEADER_LEN];
        buf[4..8].copy_from_slice(&seq.to_be_bytes());
        buf.extend_from_slice(token.as_slice());
        buf.extend(std::iter::repeat_n(0xFFu8, 8));
        buf
    }

    fn install_plain(anchor: HashValue) -> SaState {
        SaState::install(TransformId::Plain, vec![anchor], 16, 0, 20)
    }

    #[test]
    fn scenario_plain_chain_in_order() {
        let chain = chain_of(b"seed", 8);
        let anchor = chain[8];
        let mut sa = install_plain(anchor);

        for esp_seq in 1u32..=8 {
            let token = chain[8 - esp_seq as usize];
            let data = datagram(esp_seq, &token);
            let view = EspView::new(&data, 20, 0).unwrap();
            verify_packet(&mut sa, &view, 4).unwrap();
        }
        assert_eq!(sa.seq_no, 8);
        assert_eq!(sa.active_anchors[0], chain[0]);
    }

    #[test]
    fn scenario_gap_within_window() {
        let chain = chain_of(b"seed", 8);
        let anchor = chain[8];
        let mut sa = install_plain(anchor);

        let data1 = datagram(1, &chain[7]);
        let view1 = EspView::new(&data1, 20, 0).unwrap();
        verify_packet(&mut sa, &view1, 4).unwrap();

        let data4 = datagram(4, &chain[4]);
        let view4 = EspView::new(&data4, 20, 0).unwrap();
        verify_packet(&mut sa, &view4, 4).unwrap();

        assert_eq!(sa.seq_no, 4);
        assert_eq!(sa.active_anchors[0], chain[4]);
    }

    #[test]
    fn scenario_transition_on_token() {
        let chain = chain_of(b"seed", 2);
        let anchor = chain[2];
        let next_chain = chain_of(b"seed2", 2);
        let next_anchor = next_chain[2];

        let mut sa = install_plain(anchor);
        sa.next_anchors[0] = next_anchor;
        sa.seq_no = 2;

        let data = datagram(3, &next_anchor);
        let view = EspView::new(&data, 20, 0).unwrap();
        verify_packet(&mut sa, &view, 4).unwrap();

        assert_eq!(sa.active_anchors[0], next_anchor);
        assert_eq!(sa.first_active_anchors[0], next_anchor);
        assert!(sa.next_anchors[0].is_zero());
    }

    #[test]
    fn scenario_replay_rejection() {
        let chain = chain_of(b"seed", 8);
        let anchor = chain[8];
        let mut sa = install_plain(anchor);

        for esp_seq in 1u32..=5 {
            let token = chain[8 - esp_seq as usize];
            let data = datagram(esp_seq, &token);
            let view = EspView::new(&data, 20, 0).unwrap();
            verify_packet(&mut sa, &view, 4).unwrap();
        }

        let replay_data = datagram(5, &chain[3]);
        let view = EspView::new(&replay_data, 20, 0).unwrap();
        let err = verify_packet(&mut sa, &view, 4).unwrap_err();
        assert!(matches!(err, Error::Replay { seq: 5 }));
    }

    #[test]
    fn cumulative_out_of_order_packet_accepted_via_ring() {
        let chain = chain_of(b"seed", 8);
        let anchor = chain[8];
        let mut sa = SaState::install(TransformId::Cumulative, vec![anchor], 16, 64, 20);

        // Packet 3 arrives first carrying a cumulative pre-announcement
        // of packet 1's whole-payload hash, then packet 1 arrives late.
        let packet1_data = datagram(1, &chain[7]);
        let packet1_hash = hash::h(&packet1_data, 20);

        let mut buf = vec![0u8; ESP_HEADER_LEN];
        buf[4..8].copy_from_slice(&3u32.to_be_bytes());
        buf.extend_from_slice(chain[5].as_slice());
        buf.extend_from_slice(&1u32.to_be_bytes());
        buf.extend_from_slice(packet1_hash.as_slice());
        buf.extend(std::iter::repeat_n(0xFFu8, 4));
        let view3 = EspView::new(&buf, 20, 1).unwrap();
        verify_packet(&mut sa, &view3, 4).unwrap();

        assert_eq!(sa.ring_slot(1).unwrap().packet_hash, packet1_hash);

        let view1 = EspView::new(&packet1_data, 20, 0).unwrap();
        let outcome = verify_packet(&mut sa, &view1, 4).unwrap();
        assert_eq!(outcome, VerifyOutcome::ReplayedFromRing);
        assert_eq!(sa.seq_no, 3); // unchanged by the replayed packet
    }

    #[test]
    fn unused_transform_accepts_everything() {
        let mut sa = SaState::install(TransformId::Unused, vec![], 0, 0, 20);
        let data = datagram(1, &HashValue::zero(20));
        let view = EspView::new(&data, 20, 0).unwrap();
        assert_eq!(verify_packet(&mut sa, &view, 4).unwrap(), VerifyOutcome::Fresh);
    }

    #[test]
    fn tree_transform_accepts_current_leaf_repeatedly_then_transitions() {
        let active = HashValue::from_slice(&[1u8; 20]).unwrap();
        let next = HashValue::from_slice(&[2u8; 20]).unwrap();
        let mut sa = SaState::install(TransformId::Tree, vec![active], 4, 0, 20);
        sa.next_anchors[0] = next;

        let data1 = datagram(1, &active);
        let view1 = EspView::new(&data1, 20, 0).unwrap();
        verify_packet(&mut sa, &view1, 64).unwrap();
        assert_eq!(sa.active_anchors[0], active);

        let data2 = datagram(2, &next);
        let view2 = EspView::new(&data2, 20, 0).unwrap();
        verify_packet(&mut sa, &view2, 64).unwrap();
        assert_eq!(sa.active_anchors[0], next);
        assert!(sa.next_anchors[0].is_zero());
    }
}
