//! End-to-end scenarios exercising `tpa-core`'s public API: install an SA
//! from a base-exchange message, run it through UPDATE and ESP traffic,
//! and check the resulting state.

use tpa_core::domain::hash;
use tpa_core::domain::htree;
use tpa_core::{
    AnchorParam, BaseExchangeKind, BranchParam, ControlMessage, EspView, HashValue, Hit,
    NoopMetrics, SaKey, SaRegistry, SecretParam, TokenAuthApi, TokenAuthService, TransformId,
    UpdateOutcome, VerifyOutcome, ESP_HEADER_LEN,
};

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

fn base_exchange(transform: TransformId, active: HashValue) -> ControlMessage {
    let mut msg = ControlMessage::new();
    msg.anchors.push(AnchorParam {
        transform,
        hash_item_length: 16,
        active,
        next: HashValue::zero(20),
    });
    msg
}

fn service() -> TokenAuthService<NoopMetrics> {
    TokenAuthService::new(
        tpa_core::Config::for_transform(TransformId::Plain),
        NoopMetrics,
    )
}

fn key() -> SaKey {
    SaKey {
        initiator: Hit([1u8; 16]),
        responder: Hit([2u8; 16]),
    }
}

/// Install `msg` as an I2 into a fresh registry and return both, so
/// callers can fetch `&mut SaState` via `registry.get_mut(&key)`.
fn install(
    svc: &TokenAuthService<NoopMetrics>,
    msg: &ControlMessage,
    advertised: &[TransformId],
) -> (SaRegistry, SaKey) {
    let mut registry = SaRegistry::new();
    let key = key();
    svc.install_sa(&mut registry, key, BaseExchangeKind::I2, msg, advertised)
        .expect("install");
    (registry, key)
}

/// Scenario 1: plain chain, in-order.
#[test]
fn plain_chain_in_order() {
    let svc = service();
    let chain = chain_of(b"seed", 8);
    let anchor = chain[8];
    let msg = base_exchange(TransformId::Plain, anchor);
    let (mut registry, key) = install(&svc, &msg, &[TransformId::Plain]);
    let sa = registry.get_mut(&key).unwrap();

    for esp_seq in 1u32..=8 {
        let token = chain[8 - esp_seq as usize];
        let data = datagram(esp_seq, &token);
        let view = EspView::new(&data, 20, 0).unwrap();
        svc.verify_packet(sa, &view).expect("verified");
    }
    assert_eq!(sa.seq_no, 8);
    assert_eq!(sa.active_anchors[0], chain[0]);
}

/// Scenario 2: a gap within the window advances the anchor in one step.
#[test]
fn gap_within_window() {
    let svc = service();
    let chain = chain_of(b"seed", 8);
    let anchor = chain[8];
    let msg = base_exchange(TransformId::Plain, anchor);
    let (mut registry, key) = install(&svc, &msg, &[TransformId::Plain]);
    let sa = registry.get_mut(&key).unwrap();

    let data1 = datagram(1, &chain[7]);
    let view1 = EspView::new(&data1, 20, 0).unwrap();
    svc.verify_packet(sa, &view1).unwrap();

    let data4 = datagram(4, &chain[4]);
    let view4 = EspView::new(&data4, 20, 0).unwrap();
    svc.verify_packet(sa, &view4).unwrap();

    assert_eq!(sa.seq_no, 4);
    assert_eq!(sa.active_anchors[0], chain[4]);
}

/// Scenario 3 + 4: an anchor UPDATE round-trip, followed by the
/// transition firing on the next matching ESP token.
#[test]
fn anchor_update_round_trip_then_transition() {
    let svc = service();
    let anchor_a = HashValue::from_slice(&[1u8; 20]).unwrap();
    let next_chain = chain_of(b"next-chain", 4);
    let anchor_a_prime = next_chain[4];

    let msg = base_exchange(TransformId::Plain, anchor_a);
    let (mut registry, key) = install(&svc, &msg, &[TransformId::Plain]);
    let sa = registry.get_mut(&key).unwrap();

    let mut msg1 = ControlMessage::new();
    msg1.seq = Some(7);
    msg1.anchors.push(AnchorParam {
        transform: TransformId::Plain,
        hash_item_length: 16,
        active: anchor_a,
        next: anchor_a_prime,
    });
    let outcome = svc.handle_update(sa, &msg1).unwrap();
    assert_eq!(outcome, UpdateOutcome::Cached { seq: 7 });
    assert_eq!(sa.anchor_cache.len(), 1);
    assert!(sa.next_anchors[0].is_zero());

    let mut msg2 = ControlMessage::new();
    msg2.ack = Some(7);
    msg2.esp_info = true;
    let outcome = svc.handle_update(sa, &msg2).unwrap();
    assert_eq!(outcome, UpdateOutcome::Activated);
    assert!(sa.anchor_cache.is_empty());
    assert_eq!(sa.next_anchors[0], anchor_a_prime);
    assert_eq!(sa.active_anchors[0], anchor_a);

    // Scenario 4: a packet whose token hashes to `anchor_a_prime`.
    let token = next_chain[3];
    let data = datagram(1, &token);
    let view = EspView::new(&data, 20, 0).unwrap();
    svc.verify_packet(sa, &view).unwrap();

    assert_eq!(sa.active_anchors[0], token);
    assert_eq!(sa.first_active_anchors[0], anchor_a_prime);
    assert!(sa.next_anchors[0].is_zero());
}

/// Scenario 5: a light UPDATE with a flipped branch sibling is rejected
/// without caching anything or advancing `lupdate_seq`.
#[test]
fn light_update_bad_branch_is_rejected() {
    let svc = service();
    let leaf0_data = b"leaf0";
    let leaf1_data = b"leaf1";
    let secret = b"shared-secret";
    let leaf0 = hash::leaf(leaf0_data, secret, 20);
    let leaf1 = hash::leaf(leaf1_data, secret, 20);
    let root = hash::node(&leaf0, &leaf1, 20);

    let mut msg = ControlMessage::new();
    msg.anchors.push(AnchorParam {
        transform: TransformId::Tree,
        hash_item_length: 2,
        active: HashValue::from_slice(leaf0_data).unwrap(),
        next: HashValue::zero(20),
    });
    let (mut registry, key) = install(&svc, &msg, &[TransformId::Tree]);
    let sa = registry.get_mut(&key).unwrap();
    sa.active_roots[0] = Some(root);

    assert!(htree::verify_branch(&root, &[leaf1], leaf0_data, 0, secret));

    let mut flipped = leaf1.as_slice().to_vec();
    flipped[0] ^= 0x01;
    let bad_sibling = HashValue::from_slice(&flipped).unwrap();

    let mut msg1 = ControlMessage::new();
    msg1.seq = Some(1);
    msg1.anchors.push(AnchorParam {
        transform: TransformId::Tree,
        hash_item_length: 2,
        active: HashValue::from_slice(leaf0_data).unwrap(),
        next: HashValue::zero(20),
    });
    msg1.branches.push(BranchParam {
        anchor_offset: 0,
        nodes: vec![bad_sibling],
    });
    msg1.secrets.push(SecretParam {
        secret: secret.to_vec(),
    });

    let err = svc.handle_update(sa, &msg1).unwrap_err();
    assert!(matches!(err, tpa_core::Error::VerifyFailed));
    assert!(sa.anchor_cache.is_empty());
    assert_eq!(sa.lupdate_seq, 0);
}

/// Scenario 6: replaying an already-accepted sequence number is rejected
/// and leaves the SA untouched.
#[test]
fn replay_of_accepted_sequence_is_rejected() {
    let svc = service();
    let chain = chain_of(b"seed", 8);
    let anchor = chain[8];
    let msg = base_exchange(TransformId::Plain, anchor);
    let (mut registry, key) = install(&svc, &msg, &[TransformId::Plain]);
    let sa = registry.get_mut(&key).unwrap();

    for esp_seq in 1u32..=5 {
        let token = chain[8 - esp_seq as usize];
        let data = datagram(esp_seq, &token);
        let view = EspView::new(&data, 20, 0).unwrap();
        svc.verify_packet(sa, &view).unwrap();
    }
    let seq_no_before = sa.seq_no;
    let active_before = sa.active_anchors[0];

    let replay = datagram(5, &chain[3]);
    let view = EspView::new(&replay, 20, 0).unwrap();
    let err = svc.verify_packet(sa, &view).unwrap_err();
    assert!(matches!(err, tpa_core::Error::Replay { seq: 5 }));
    assert_eq!(sa.seq_no, seq_no_before);
    assert_eq!(sa.active_anchors[0], active_before);
}

/// Parallel independence: with N=2 chains, the even/odd sub-sequences
/// form independent chains terminating at their own installed anchors.
#[test]
fn parallel_chains_are_independent() {
    let svc = service();
    let chain_a = chain_of(b"chain-a", 4);
    let chain_b = chain_of(b"chain-b", 4);

    let mut msg = ControlMessage::new();
    msg.anchors.push(AnchorParam {
        transform: TransformId::Parallel,
        hash_item_length: 16,
        active: chain_a[4],
        next: HashValue::zero(20),
    });
    msg.anchors.push(AnchorParam {
        transform: TransformId::Parallel,
        hash_item_length: 16,
        active: chain_b[4],
        next: HashValue::zero(20),
    });
    let (mut registry, key) = install(&svc, &msg, &[TransformId::Parallel]);
    let sa = registry.get_mut(&key).unwrap();

    // esp_seq 1, 3 -> chain index 0 (chain_a); esp_seq 2, 4 -> chain index 1 (chain_b).
    for (esp_seq, token) in [
        (1u32, &chain_a[3]),
        (2, &chain_b[3]),
        (3, &chain_a[2]),
        (4, &chain_b[2]),
    ] {
        let data = datagram(esp_seq, token);
        let view = EspView::new(&data, 20, 0).unwrap();
        let outcome = svc.verify_packet(sa, &view).unwrap();
        assert_eq!(outcome, VerifyOutcome::Fresh);
    }

    assert_eq!(sa.active_anchors[0], chain_a[2]);
    assert_eq!(sa.active_anchors[1], chain_b[2]);
}
