//! Standalone demonstration runtime for the token-authentication engine.
//!
//! Loads a `Config` (from a TOML file given as the first argument, or
//! transform defaults otherwise), installs a single SA from a synthetic
//! base-exchange message, and walks it through a short hash chain of ESP
//! datagrams to show the engine end to end.

use std::env;
use std::fs;

use anyhow::{Context, Result};
use tpa_core::domain::hash;
use tpa_core::{
    AnchorParam, BaseExchangeKind, Config, ControlMessage, EspView, HashValue, Hit, SaKey,
    SaRegistry, TokenAuthApi, TokenAuthService, TransformId, ESP_HEADER_LEN,
};
use tpa_telemetry::{PrometheusMetrics, TelemetryConfig};

fn load_config() -> Result<Config> {
    match env::args().nth(1) {
        Some(path) => {
            let raw = fs::read_to_string(&path)
                .with_context(|| format!("reading config file {path}"))?;
            Config::from_toml_str(&raw).with_context(|| format!("parsing config file {path}"))
        }
        None => Ok(Config::for_transform(TransformId::Plain)),
    }
}

fn build_esp_datagram(seq: u32, token: &HashValue) -> Vec<u8> {
    let mut buf = vec![0u8; ESP_HEADER_LEN];
    buf[0..4].copy_from_slice(&0xC0FFEEu32.to_be_bytes()); // SPI
    buf[4..8].copy_from_slice(&seq.to_be_bytes());
    buf.extend_from_slice(token.as_slice());
    buf
}

fn main() -> Result<()> {
    let _telemetry = tpa_telemetry::init_telemetry(TelemetryConfig::from_env())
        .context("initializing telemetry")?;

    let config = load_config()?;
    config.validate().context("validating configuration")?;
    tracing::info!(transform = ?config.transform, "loaded configuration");

    let service = TokenAuthService::new(config.clone(), PrometheusMetrics);

    // Derive a short hash chain: seed is "active", walk three hops ahead
    // to get the tokens a sender three packets further along would emit.
    let seed = hash::h(b"demo-seed", config.hash_length);
    let hop1 = hash::step(&seed);
    let hop2 = hash::step(&hop1);
    let hop3 = hash::step(&hop2);

    let mut base_exchange = ControlMessage::new();
    base_exchange.anchors.push(AnchorParam {
        transform: config.transform,
        hash_item_length: config.hash_structure_length as u32,
        active: hop3,
        next: HashValue::zero(config.hash_length as u8),
    });

    let mut registry = SaRegistry::new();
    let sa_key = SaKey {
        initiator: Hit([0u8; 16]),
        responder: Hit([1u8; 16]),
    };
    service
        .install_sa(
            &mut registry,
            sa_key,
            BaseExchangeKind::I2,
            &base_exchange,
            &[config.transform],
        )
        .context("installing SA from base exchange")?;
    let sa = registry.get_mut(&sa_key).expect("just installed");
    tracing::info!(num_chains = sa.num_chains, "SA installed");

    for (seq, token) in [(1u32, &hop2), (2, &hop1), (3, &seed)] {
        let datagram = build_esp_datagram(seq, token);
        let view = EspView::new(&datagram, config.hash_length, 0)?;
        match service.verify_packet(sa, &view) {
            Ok(outcome) => tracing::info!(seq, outcome = ?outcome, "packet verified"),
            Err(err) => tracing::warn!(seq, error = %err, "packet rejected"),
        }
    }

    println!("{}", tpa_telemetry::encode_metrics()?);
    Ok(())
}
