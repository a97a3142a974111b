//! Inbound ports (driving ports / API).
//!
//! Traits that define the public API of this subsystem: install an SA
//! from a base-exchange message, dispatch an UPDATE, and verify an ESP
//! datagram.

use crate::domain::sa_registry::SaRegistry;
use crate::domain::sa_state::SaState;
use crate::domain::token::EspView;
use crate::domain::tracker::{BaseExchangeKind, UpdateOutcome};
use crate::domain::packet::VerifyOutcome;
use tpa_types::{ControlMessage, Error, SaKey, TransformId};

/// Primary token-authentication API.
///
/// Every method is local to one SA, one control message, or one
/// datagram — there is no hidden cross-SA state, matching the per-SA
/// ownership model described in the data model.
pub trait TokenAuthApi {
    /// Install an SA from an I2 or R2 base-exchange message into
    /// `registry` under `key`. Enforces spec §4.4 point 2: an I2 must
    /// not find an existing SA for `key`; an R2 must find exactly one.
    fn install_sa(
        &self,
        registry: &mut SaRegistry,
        key: SaKey,
        kind: BaseExchangeKind,
        msg: &ControlMessage,
        advertised: &[TransformId],
    ) -> Result<(), Error>;

    /// Dispatch one HIP UPDATE message (standard or light) against `sa`.
    fn handle_update(&self, sa: &mut SaState, msg: &ControlMessage) -> Result<UpdateOutcome, Error>;

    /// Verify one ESP datagram against `sa`, mutating it on success.
    fn verify_packet(&self, sa: &mut SaState, view: &EspView<'_>) -> Result<VerifyOutcome, Error>;
}
