//! Control-message parameter shapes.
//!
//! These are the abstract shapes the tracker consumes; assembling them
//! from an actual HIP packet wire format is the job of the (out-of-scope)
//! control-plane state machine.

use crate::hash::HashValue;
use crate::transform::TransformId;
use serde::{Deserialize, Serialize};

/// `ANCHOR { transform, hash_item_length, anchors: u8[2*L] }`.
///
/// `next` is the all-zero `HashValue` when the parameter carries no
/// next-anchor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnchorParam {
    pub transform: TransformId,
    pub hash_item_length: u32,
    pub active: HashValue,
    pub next: HashValue,
}

/// `ROOT { root_length, root }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RootParam {
    pub root: HashValue,
}

/// `BRANCH { branch_length, anchor_offset, branch_nodes }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BranchParam {
    pub anchor_offset: u32,
    pub nodes: Vec<HashValue>,
}

/// `SECRET { secret_length, secret }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecretParam {
    pub secret: Vec<u8>,
}

/// The parameter set the tracker observes for one HIP control message.
///
/// One value of this type stands in for whichever of R1/I2/R2/UPDATE the
/// (external) control-plane state machine just processed; the tracker
/// dispatches on which fields are present.
#[derive(Debug, Clone, Default)]
pub struct ControlMessage {
    pub seq: Option<u32>,
    pub ack: Option<u32>,
    pub esp_info: bool,
    pub anchors: Vec<AnchorParam>,
    pub roots: Vec<RootParam>,
    pub branches: Vec<BranchParam>,
    pub secrets: Vec<SecretParam>,
    /// R1's `PREFERRED_TRANSFORMS` list.
    pub preferred_transforms: Vec<TransformId>,
}

impl ControlMessage {
    pub fn new() -> Self {
        Self::default()
    }
}
