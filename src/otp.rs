//! Time-based one-time code generation.
//!
//! GitHub's two-factor prompt wants the 6-digit TOTP code an
//! authenticator app would show. [`TotpGenerator`] produces it from the
//! base32 seed displayed during two-factor enrollment, with the standard
//! SHA-1 / 6 digits / 30 second parameters.

use anyhow::{anyhow, Context, Result};
use totp_rs::{Algorithm, Secret, TOTP};

/// Generates the current TOTP code from a base32 seed.
pub struct TotpGenerator {
    totp: TOTP,
}

impl TotpGenerator {
    /// Build a generator from a base32 seed. Whitespace and case are
    /// normalized, since seeds are often copied in groups of four.
    pub fn from_base32(seed: &str) -> Result<Self> {
        let normalized: String = seed
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_uppercase();
        let secret = Secret::Encoded(normalized)
            .to_bytes()
            .map_err(|err| anyhow!("invalid base32 one-time-code seed: {err:?}"))?;
        let totp = TOTP::new(Algorithm::SHA1, 6, 1, 30, secret)
            .map_err(|err| anyhow!("could not build TOTP generator: {err:?}"))?;
        Ok(Self { totp })
    }

    /// The code valid right now. Generate immediately before submitting;
    /// codes roll over every 30 seconds.
    pub fn generate(&self) -> Result<String> {
        self.totp
            .generate_current()
            .context("system clock is before the Unix epoch")
    }
}

impl std::fmt::Debug for TotpGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never expose the seed.
        f.debug_struct("TotpGenerator").finish()
    }
}
