//! This server's Ed25519 signing key, used to author outbound chain
//! transactions. The chain gateway owns this key and never exposes it
//! (spec.md §4.5).

use ed25519_dalek::{Signer, SigningKey, VerifyingKey};
use rand_core::OsRng;

use crate::error::ChainError;

pub struct ChainSigningKey {
    signing_key: SigningKey,
}

impl ChainSigningKey {
    /// Parse the 32-byte seed from the `FOOTFALL__CHAIN__SIGNING_KEY_HEX`
    /// config value.
    pub fn from_hex(seed_hex: &str) -> Result<Self, ChainError> {
        let bytes = hex::decode(seed_hex.trim_start_matches("0x"))
            .map_err(|e| ChainError::Other(anyhow::anyhow!("invalid chain signing key hex: {e}")))?;
        let seed: [u8; 32] = bytes
            .try_into()
            .map_err(|_| ChainError::Other(anyhow::anyhow!("chain signing key must be 32 bytes")))?;
        Ok(Self { signing_key: SigningKey::from_bytes(&seed) })
    }

    /// Generate an ephemeral key pair — used by tests and local-only runs
    /// that never talk to a real chain.
    pub fn generate() -> Self {
        Self { signing_key: SigningKey::generate(&mut OsRng) }
    }

    pub fn verifying_key(&self) -> VerifyingKey {
        self.signing_key.verifying_key()
    }

    pub fn public_key_hex(&self) -> String {
        hex::encode(self.signing_key.verifying_key().as_bytes())
    }

    pub fn sign(&self, message: &[u8]) -> [u8; 64] {
        self.signing_key.sign(message).to_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_hex_round_trips_generate() {
        let kp = ChainSigningKey::generate();
        let hex = hex::encode(kp.signing_key.to_bytes());
        let reloaded = ChainSigningKey::from_hex(&hex).unwrap();
        assert_eq!(kp.public_key_hex(), reloaded.public_key_hex());
    }
}
