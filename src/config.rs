//! Digest Configuration

use serde::{Deserialize, Serialize};

/// Environment override for the pass ceiling.
pub const TTL_ENV: &str = "BEESCOPE_DIGEST_TTL";

pub const DEFAULT_TTL: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DigestConfig {
    /// Maximum dirty passes before a digest is declared non-convergent
    pub ttl: usize,
}

impl Default for DigestConfig {
    fn default() -> Self { Self { ttl: DEFAULT_TTL } }
}

impl DigestConfig {
    pub fn new() -> Self { Self::default() }
    pub fn with_ttl(mut self, ttl: usize) -> Self { self.ttl = ttl; self }

    /// Default config, with `BEESCOPE_DIGEST_TTL` applied when it parses.
    pub fn from_env() -> Self {
        let config = Self::default();
        match std::env::var(TTL_ENV).ok().and_then(|v| v.trim().parse().ok()) {
            Some(ttl) => config.with_ttl(ttl),
            None => config,
        }
    }
}
