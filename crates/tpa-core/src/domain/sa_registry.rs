//! Per-direction SA registry, keyed by `SaKey`.
//!
//! Spec §4.4 point 2: an I2 installs a brand-new SA for a direction that
//! must not already exist ("the list must be empty"); an R2 must attach
//! to exactly one pre-existing SA for that direction. This registry is
//! what lets `install_base_exchange` enforce both invariants instead of
//! fabricating a fresh `SaState` unconditionally on every call.

use std::collections::HashMap;
use tpa_types::{Error, SaKey};

use super::sa_state::SaState;

/// Live SAs, one per direction, looked up by `SaKey`.
#[derive(Debug, Default)]
pub struct SaRegistry {
    sas: HashMap<SaKey, SaState>,
}

impl SaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &SaKey) -> bool {
        self.sas.contains_key(key)
    }

    pub fn get(&self, key: &SaKey) -> Option<&SaState> {
        self.sas.get(key)
    }

    pub fn get_mut(&mut self, key: &SaKey) -> Option<&mut SaState> {
        self.sas.get_mut(key)
    }

    pub fn len(&self) -> usize {
        self.sas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sas.is_empty()
    }

    /// Install a brand-new SA for `key`. The I2 invariant: fails with
    /// `Error::Mismatch` if the direction already has an installed SA.
    pub fn install_new(&mut self, key: SaKey, sa: SaState) -> Result<(), Error> {
        if self.sas.contains_key(&key) {
            return Err(Error::Mismatch {
                expected: "no SA installed yet for this direction".into(),
                got: format!("{key:?} already has an installed SA"),
            });
        }
        self.sas.insert(key, sa);
        Ok(())
    }

    /// Attach to the exactly-one pre-existing SA for `key`. The R2
    /// invariant: fails with `Error::Mismatch` if no SA is installed yet.
    pub fn attach(&mut self, key: SaKey, sa: SaState) -> Result<(), Error> {
        if !self.sas.contains_key(&key) {
            return Err(Error::Mismatch {
                expected: "exactly one pre-existing SA for this direction".into(),
                got: "no SA installed for this direction".into(),
            });
        }
        self.sas.insert(key, sa);
        Ok(())
    }

    /// SA teardown (spec §5): free every cached anchor/root the SA owns
    /// by dropping it. Called exactly once per direction; callers must
    /// not submit further packets for `key` afterward.
    pub fn remove(&mut self, key: &SaKey) -> Option<SaState> {
        self.sas.remove(key)
    }
}
