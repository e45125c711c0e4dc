//! Composer configuration
//!
//! Defaults suit the demo and tests; a JSON file or `PLONK_*` environment
//! variables can override individual fields.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComposerConfig {
    /// Smallest evaluation domain a proving key may use.
    pub min_circuit_size: usize,
    /// Record a circuit failure when `assert_equal` joins different values.
    pub strict_assert_equal: bool,
    /// Domain separator fed to the Fiat-Shamir transcript.
    pub transcript_label: String,
    /// Extra SRS powers beyond the quotient degree.
    pub srs_degree_padding: usize,
    pub ceremony_participants: usize,
}

impl Default for ComposerConfig {
    fn default() -> Self {
        ComposerConfig {
            min_circuit_size: 8,
            strict_assert_equal: true,
            transcript_label: "plonk-composer-v1".to_string(),
            srs_degree_padding: 8,
            ceremony_participants: 3,
        }
    }
}

impl ComposerConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("invalid composer config JSON")
    }

    /// Defaults overridden by any `PLONK_*` variable that is set.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();
        let parse_usize = |key: &str| -> Result<Option<usize>> {
            lookup(key)
                .map(|v| v.parse::<usize>().with_context(|| format!("{key} must be an integer, got {v:?}")))
                .transpose()
        };

        if let Some(v) = parse_usize("PLONK_MIN_CIRCUIT_SIZE")? {
            config.min_circuit_size = v;
        }
        if let Some(v) = lookup("PLONK_STRICT_ASSERT_EQUAL") {
            config.strict_assert_equal = v
                .parse::<bool>()
                .with_context(|| format!("PLONK_STRICT_ASSERT_EQUAL must be true or false, got {v:?}"))?;
        }
        if let Some(v) = lookup("PLONK_TRANSCRIPT_LABEL") {
            config.transcript_label = v;
        }
        if let Some(v) = parse_usize("PLONK_SRS_DEGREE_PADDING")? {
            config.srs_degree_padding = v;
        }
        if let Some(v) = parse_usize("PLONK_CEREMONY_PARTICIPANTS")? {
            config.ceremony_participants = v;
        }
        Ok(config)
    }
}
