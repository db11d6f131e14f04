//! Ed25519 detached signature verification over a SHA-256 digest.
//!
//! Per spec.md §4.2: the signature is over `SHA-256(canonical(payload))`,
//! not over the canonical bytes directly. Implementations that skip the
//! hashing step will never verify a real device's signature.

use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use sha2::{Digest, Sha256};

use crate::canonical::{canonicalize, SigningFields};

/// Verify a submission's signature.
///
/// Never panics and never propagates an error: any internal failure
/// (malformed key, malformed signature) is folded into a `false` result,
/// matching spec.md §4.2's "returns false, never throws" contract.
pub fn verify(fields: &SigningFields<'_>, signature: &[u8; 64], public_key: &[u8; 32]) -> bool {
    let Ok(verifying_key) = VerifyingKey::from_bytes(public_key) else {
        return false;
    };
    let signature = Signature::from_bytes(signature);

    let canonical = canonicalize(fields);
    let digest = Sha256::digest(&canonical);

    verifying_key.verify(&digest, &signature).is_ok()
}
