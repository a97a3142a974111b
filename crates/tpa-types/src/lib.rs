//! # TPA Types
//!
//! Wire-level value types shared by every crate in the workspace: hashes,
//! HITs, transform identifiers, control parameter shapes, and the
//! crate-wide error taxonomy.
//!
//! This crate holds no logic — only types — so that wire formats can be
//! shared across every crate that needs to speak them without pulling
//! in verification or tracking logic.

pub mod errors;
pub mod hash;
pub mod hit;
pub mod params;
pub mod transform;

pub use errors::Error;
pub use hash::{HashValue, MAX_HASH_LEN};
pub use hit::{Hit, SaKey};
pub use params::{AnchorParam, BranchParam, ControlMessage, RootParam, SecretParam};
pub use transform::TransformId;
