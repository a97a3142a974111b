//! Configuration surface.
//!
//! Every other component is constructed from a `Config` value passed in
//! explicitly: there is no process-wide mutable global. The tracker owns
//! its own copy, and a reload is a total-replace of a parked tracker,
//! never an in-place mutation.

use serde::Deserialize;
use tpa_types::{Error, TransformId};

/// The token/sender/verifier tunables, already validated.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub transform: TransformId,
    pub hash_length: usize,
    pub hash_structure_length: usize,
    pub num_parallel_hchains: usize,
    pub ring_buffer_size: usize,
    pub num_linear_elements: usize,
    pub num_random_elements: usize,
    pub num_hchains_per_item: usize,
    pub num_hierarchies: usize,
    pub refill_threshold: f64,
    pub update_threshold: f64,
    pub window_size: u32,
}

impl Config {
    /// Defaults appropriate to `transform` (several defaults —
    /// `num_parallel_hchains`, `ring_buffer_size`, `num_linear_elements` —
    /// vary by transform).
    pub fn for_transform(transform: TransformId) -> Self {
        let (num_parallel_hchains, ring_buffer_size, num_linear_elements) = match transform {
            TransformId::Unused | TransformId::Plain | TransformId::Tree => (1, 0, 0),
            TransformId::Parallel => (2, 0, 0),
            TransformId::Cumulative => (1, 64, 1),
            TransformId::ParaCumul => (1, 64, 1),
        };
        Self {
            transform,
            hash_length: 20,
            hash_structure_length: 16,
            num_parallel_hchains,
            ring_buffer_size,
            num_linear_elements,
            num_random_elements: 0,
            num_hchains_per_item: 8,
            num_hierarchies: 1,
            refill_threshold: 0.5,
            update_threshold: 0.5,
            window_size: 64,
        }
    }

    /// Run every bounds check on the tunables. Sanity-check failures are
    /// reported up as `Error::Config` — fatal for the process, never
    /// masked.
    pub fn validate(&self) -> Result<(), Error> {
        if self.hash_length == 0 || self.hash_length > tpa_types::MAX_HASH_LEN {
            return Err(Error::Config(format!(
                "hash_length must be in 1..={}, got {}",
                tpa_types::MAX_HASH_LEN,
                self.hash_length
            )));
        }
        if self.hash_structure_length == 0 {
            return Err(Error::Config("hash_structure_length must be > 0".into()));
        }
        if self.num_parallel_hchains == 0 {
            return Err(Error::Config("num_parallel_hchains must be > 0".into()));
        }
        if self.num_hchains_per_item == 0 {
            return Err(Error::Config("num_hchains_per_item must be > 0".into()));
        }
        if self.num_hierarchies == 0 {
            return Err(Error::Config("num_hierarchies must be > 0".into()));
        }
        if !(0.0..=1.0).contains(&self.refill_threshold) {
            return Err(Error::Config(format!(
                "refill_threshold must be in [0,1], got {}",
                self.refill_threshold
            )));
        }
        if !(0.0..=1.0).contains(&self.update_threshold) {
            return Err(Error::Config(format!(
                "update_threshold must be in [0,1], got {}",
                self.update_threshold
            )));
        }
        if self.window_size == 0 {
            return Err(Error::Config("window_size must be > 0".into()));
        }
        Ok(())
    }

    /// Parse the namespaced TOML key tree (`token_config.*`,
    /// `token_config.token_modes.*`, `sender.hcstore.*`, `sender.*`,
    /// `verifier.*`). Unknown keys are ignored; missing keys fall back to
    /// transform defaults. Returns `Error::Config` on a structurally
    /// invalid file or a failed sanity check — the previous config (if
    /// any) is left in place by the caller, since this function never
    /// mutates anything.
    pub fn from_toml_str(raw: &str) -> Result<Self, Error> {
        let parsed: RawFile =
            toml::from_str(raw).map_err(|e| Error::Config(format!("invalid TOML: {e}")))?;

        let transform = parsed
            .token_config
            .transform
            .map(|s| parse_transform(&s))
            .transpose()?
            .unwrap_or(TransformId::Unused);

        let defaults = Config::for_transform(transform);
        let modes = parsed.token_config.token_modes.unwrap_or_default();
        let hcstore = parsed.sender.hcstore.clone().unwrap_or_default();

        let config = Config {
            transform,
            hash_length: parsed.token_config.hash_length.unwrap_or(defaults.hash_length),
            hash_structure_length: parsed
                .token_config
                .hash_structure_length
                .unwrap_or(defaults.hash_structure_length),
            num_parallel_hchains: modes
                .num_parallel_hchains
                .unwrap_or(defaults.num_parallel_hchains),
            ring_buffer_size: modes.ring_buffer_size.unwrap_or(defaults.ring_buffer_size),
            num_linear_elements: modes
                .num_linear_elements
                .unwrap_or(defaults.num_linear_elements),
            num_random_elements: modes
                .num_random_elements
                .unwrap_or(defaults.num_random_elements),
            num_hchains_per_item: hcstore
                .num_hchains_per_item
                .unwrap_or(defaults.num_hchains_per_item),
            num_hierarchies: hcstore.num_hierarchies.unwrap_or(defaults.num_hierarchies),
            refill_threshold: parsed
                .sender
                .refill_threshold
                .unwrap_or(defaults.refill_threshold),
            update_threshold: parsed
                .verifier
                .update_threshold
                .unwrap_or(defaults.update_threshold),
            window_size: parsed
                .token_config
                .window_size
                .unwrap_or(defaults.window_size),
        };

        config.validate()?;
        Ok(config)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::for_transform(TransformId::Unused)
    }
}

fn parse_transform(s: &str) -> Result<TransformId, Error> {
    match s.to_ascii_lowercase().as_str() {
        "unused" => Ok(TransformId::Unused),
        "plain" => Ok(TransformId::Plain),
        "parallel" => Ok(TransformId::Parallel),
        "cumulative" => Ok(TransformId::Cumulative),
        "para_cumul" | "paracumul" => Ok(TransformId::ParaCumul),
        "tree" => Ok(TransformId::Tree),
        other => Err(Error::Config(format!("unknown transform: {other}"))),
    }
}

// --- TOML shape, kept separate from the validated `Config` so unknown
// keys never round-trip and so every field can be individually absent. ---

#[derive(Debug, Default, Deserialize)]
struct RawFile {
    #[serde(default)]
    token_config: RawTokenConfig,
    #[serde(default)]
    sender: RawSender,
    #[serde(default)]
    verifier: RawVerifier,
}

#[derive(Debug, Default, Deserialize)]
struct RawTokenConfig {
    transform: Option<String>,
    hash_length: Option<usize>,
    hash_structure_length: Option<usize>,
    window_size: Option<u32>,
    token_modes: Option<RawTokenModes>,
}

#[derive(Debug, Default, Clone, Deserialize)]
struct RawTokenModes {
    num_parallel_hchains: Option<usize>,
    ring_buffer_size: Option<usize>,
    num_linear_elements: Option<usize>,
    num_random_elements: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct RawSender {
    refill_threshold: Option<f64>,
    hcstore: Option<RawHcstore>,
}

#[derive(Debug, Default, Clone, Deserialize)]
struct RawHcstore {
    num_hchains_per_item: Option<usize>,
    num_hierarchies: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct RawVerifier {
    update_threshold: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid_for_unused() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn transform_defaults_match_table() {
        assert_eq!(Config::for_transform(TransformId::Plain).num_parallel_hchains, 1);
        assert_eq!(Config::for_transform(TransformId::Parallel).num_parallel_hchains, 2);
        assert_eq!(Config::for_transform(TransformId::Cumulative).ring_buffer_size, 64);
        assert_eq!(Config::for_transform(TransformId::Cumulative).num_linear_elements, 1);
        assert_eq!(Config::for_transform(TransformId::Tree).ring_buffer_size, 0);
    }

    #[test]
    fn rejects_zero_hash_length() {
        let mut config = Config::default();
        config.hash_length = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_oversized_hash_length() {
        let mut config = Config::default();
        config.hash_length = tpa_types::MAX_HASH_LEN + 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_threshold_out_of_range() {
        let mut config = Config::default();
        config.refill_threshold = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn loads_minimal_toml_with_defaults() {
        let raw = r#"
            [token_config]
            transform = "cumulative"
        "#;
        let config = Config::from_toml_str(raw).unwrap();
        assert_eq!(config.transform, TransformId::Cumulative);
        assert_eq!(config.ring_buffer_size, 64); // falls back to transform default
        assert_eq!(config.hash_length, 20); // falls back to global default
    }

    #[test]
    fn loads_full_toml_namespace_tree() {
        let raw = r#"
            [token_config]
            transform = "para_cumul"
            hash_length = 32
            hash_structure_length = 8
            window_size = 128

            [token_config.token_modes]
            num_parallel_hchains = 3
            ring_buffer_size = 32
            num_linear_elements = 2
            num_random_elements = 1

            [sender]
            refill_threshold = 0.25

            [sender.hcstore]
            num_hchains_per_item = 16
            num_hierarchies = 2

            [verifier]
            update_threshold = 0.75
        "#;
        let config = Config::from_toml_str(raw).unwrap();
        assert_eq!(config.transform, TransformId::ParaCumul);
        assert_eq!(config.hash_length, 32);
        assert_eq!(config.num_parallel_hchains, 3);
        assert_eq!(config.ring_buffer_size, 32);
        assert_eq!(config.num_linear_elements, 2);
        assert_eq!(config.num_random_elements, 1);
        assert_eq!(config.num_hchains_per_item, 16);
        assert_eq!(config.num_hierarchies, 2);
        assert_eq!(config.refill_threshold, 0.25);
        assert_eq!(config.update_threshold, 0.75);
        assert_eq!(config.window_size, 128);
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let raw = r#"
            [token_config]
            transform = "plain"
            totally_unknown_key = "whatever"
        "#;
        assert!(Config::from_toml_str(raw).is_ok());
    }

    #[test]
    fn invalid_transform_name_is_config_error() {
        let raw = r#"
            [token_config]
            transform = "nonsense"
        "#;
        assert!(matches!(Config::from_toml_str(raw), Err(Error::Config(_))));
    }

    #[test]
    fn failed_sanity_check_does_not_panic() {
        let raw = r#"
            [token_config]
            transform = "plain"
            hash_length = 0
        "#;
        assert!(matches!(Config::from_toml_str(raw), Err(Error::Config(_))));
    }

    #[test]
    fn config_idempotence() {
        let raw = r#"
            [token_config]
            transform = "cumulative"
            hash_length = 24
        "#;
        let a = Config::from_toml_str(raw).unwrap();
        let b = Config::from_toml_str(raw).unwrap();
        assert_eq!(a, b);
    }
}
