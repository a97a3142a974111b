//! Hash-chain and hash-tree token verification for HIP/ESP data-path
//! authentication.
//!
//! The `domain` module holds every pure algorithm and piece of per-SA
//! state; `ports` defines the driving and driven traits at the edges of
//! this crate; `service` wires the two together into the public API.

pub mod domain;
pub mod ports;
pub mod service;

pub use domain::config::Config;
pub use domain::packet::VerifyOutcome;
pub use domain::sa_registry::SaRegistry;
pub use domain::sa_state::{AnchorCache, PendingUpdate, RingSlot, SaState};
pub use domain::token::{CumulativeItem, EspView, ESP_HEADER_LEN};
pub use domain::tracker::{BaseExchangeKind, UpdateOutcome};
pub use ports::inbound::TokenAuthApi;
pub use ports::outbound::{MetricsSink, NoopMetrics};
pub use service::TokenAuthService;

pub use tpa_types::{
    AnchorParam, BranchParam, ControlMessage, Error, HashValue, Hit, RootParam, SaKey,
    SecretParam, TransformId, MAX_HASH_LEN,
};
