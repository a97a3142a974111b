//! Hash-tree (Merkle) verifier.

use crate::domain::hash;
use tpa_types::HashValue;

/// Recompute a Merkle root by folding `branch` (siblings, deepest first)
/// into the leaf `L(leaf_data, secret)`, choosing left/right at each level
/// from bit `i` of `leaf_index` (bit 0 = deepest).
pub fn fold_branch(
    branch: &[HashValue],
    leaf_index: u64,
    leaf_data: &[u8],
    secret: &[u8],
    out_len: usize,
) -> HashValue {
    let mut node = hash::leaf(leaf_data, secret, out_len);
    for (i, sibling) in branch.iter().enumerate() {
        let bit = (leaf_index >> i) & 1;
        node = if bit == 0 {
            hash::node(&node, sibling, out_len)
        } else {
            hash::node(sibling, &node, out_len)
        };
    }
    node
}

/// `verify_branch(root, branch_nodes, leaf_data, leaf_index, secret) -> bool`.
///
/// Any single-bit change in any argument flips the result, which falls
/// directly out of folding being a pure function of all five inputs.
pub fn verify_branch(
    root: &HashValue,
    branch: &[HashValue],
    leaf_data: &[u8],
    leaf_index: u64,
    secret: &[u8],
) -> bool {
    let recomputed = fold_branch(branch, leaf_index, leaf_data, secret, root.len());
    &recomputed == root
}
