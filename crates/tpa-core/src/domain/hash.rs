//! Hash primitives.
//!
//! Pure functions only — no I/O, no per-SA state. Everything downstream
//! (the chain verifier, the tree verifier) is built out of `h`, `leaf`,
//! and `node`.
//!
//! BLAKE3's extendable-output mode lets a single primitive serve every
//! negotiated hash length `L` in `1..=MAX_HASH_LEN` without per-length
//! algorithm selection.

use tpa_types::{HashValue, MAX_HASH_LEN};

/// `H(data)` — the keyed digest, truncated/extended to `out_len` bytes.
/// Chain steps apply this as `h_{k+1} = H(h_k)`.
pub fn h(data: &[u8], out_len: usize) -> HashValue {
    debug_assert!(out_len > 0 && out_len <= MAX_HASH_LEN);
    let mut hasher = blake3::Hasher::new();
    hasher.update(data);
    let mut reader = hasher.finalize_xof();
    let mut buf = [0u8; MAX_HASH_LEN];
    reader.fill(&mut buf[..out_len]);
    HashValue::from_slice(&buf[..out_len]).expect("out_len bounded by MAX_HASH_LEN")
}

/// `H(h_k)` — one hop along a hash chain, preserving the input's length.
pub fn step(prev: &HashValue) -> HashValue {
    h(prev.as_slice(), prev.len())
}

/// `L(data, secret) = H(data || secret)` — the Merkle leaf generator.
pub fn leaf(data: &[u8], secret: &[u8], out_len: usize) -> HashValue {
    let mut buf = Vec::with_capacity(data.len() + secret.len());
    buf.extend_from_slice(data);
    buf.extend_from_slice(secret);
    h(&buf, out_len)
}

/// `N(left, right) = H(left || right)` — the Merkle internal-node generator.
pub fn node(left: &HashValue, right: &HashValue, out_len: usize) -> HashValue {
    let mut buf = Vec::with_capacity(left.len() + right.len());
    buf.extend_from_slice(left.as_slice());
    buf.extend_from_slice(right.as_slice());
    h(&buf, out_len)
}

/// Smallest `k` such that `2^k >= n`. `n == 0` returns 0. Used to derive
/// `tree_depth` from `hash_item_length` when a tree-transform SA is
/// installed.
pub fn log2_ceil(n: usize) -> u32 {
    if n <= 1 {
        return 0;
    }
    usize::BITS - (n - 1).leading_zeros()
}

/// `2^k`.
pub fn pow2(k: u32) -> usize {
    1usize << k
}
