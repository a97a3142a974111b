//! Token-authentication service: wires the domain's tracker and packet
//! verifier up to the inbound API, logging and counting along the way.

use crate::domain::config::Config;
use crate::domain::packet::{self, VerifyOutcome};
use crate::domain::sa_registry::SaRegistry;
use crate::domain::sa_state::SaState;
use crate::domain::token::EspView;
use crate::domain::tracker::{self, BaseExchangeKind, UpdateOutcome};
use crate::ports::inbound::TokenAuthApi;
use crate::ports::outbound::MetricsSink;
use tpa_types::{ControlMessage, Error, SaKey, TransformId};

/// The service implementing `TokenAuthApi`, generic over which
/// `MetricsSink` it reports to.
pub struct TokenAuthService<M: MetricsSink> {
    config: Config,
    metrics: M,
}

impl<M: MetricsSink> TokenAuthService<M> {
    pub fn new(config: Config, metrics: M) -> Self {
        Self { config, metrics }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}

impl<M: MetricsSink> TokenAuthApi for TokenAuthService<M> {
    fn install_sa(
        &self,
        registry: &mut SaRegistry,
        key: SaKey,
        kind: BaseExchangeKind,
        msg: &ControlMessage,
        advertised: &[TransformId],
    ) -> Result<(), Error> {
        let result = tracker::install_base_exchange(
            registry,
            key,
            kind,
            msg,
            advertised,
            self.config.ring_buffer_size,
            self.config.hash_length as u8,
        );
        if let Err(err) = &result {
            tracing::warn!(error = %err, "base exchange SA install rejected");
        } else {
            tracing::debug!("installed SA");
        }
        result
    }

    fn handle_update(
        &self,
        sa: &mut SaState,
        msg: &ControlMessage,
    ) -> Result<UpdateOutcome, Error> {
        let result = tracker::dispatch_update(sa, msg);
        match &result {
            Err(Error::CacheMiss { seq }) => {
                tracing::debug!(seq, "UPDATE ack referenced an unknown or spent cache entry");
                self.metrics.update_cache_miss();
            }
            Err(Error::VerifyFailed) => {
                tracing::warn!("light UPDATE branch verification failed");
                self.metrics.verify_failed();
            }
            Err(err) => tracing::debug!(error = %err, "UPDATE dropped"),
            Ok(UpdateOutcome::Activated) => {
                tracing::debug!("UPDATE activated");
                self.metrics.anchor_transitioned();
            }
            Ok(UpdateOutcome::Cached { seq }) => tracing::debug!(seq, "UPDATE cached"),
        }
        result
    }

    fn verify_packet(
        &self,
        sa: &mut SaState,
        view: &EspView<'_>,
    ) -> Result<VerifyOutcome, Error> {
        let result = packet::verify_packet(sa, view, self.config.window_size);
        match &result {
            Err(Error::VerifyFailed) => self.metrics.verify_failed(),
            Err(Error::Replay { seq }) => {
                tracing::debug!(seq, "packet rejected as replay");
                self.metrics.replay_rejected();
            }
            Err(err) => tracing::debug!(error = %err, "packet verification error"),
            Ok(_) => {}
        }
        result
    }
}
