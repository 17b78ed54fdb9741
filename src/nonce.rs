//! Nonce-derived blinding factors.

use curve25519_dalek::ristretto::{CompressedRistretto, RistrettoPoint};
use curve25519_dalek::scalar::Scalar;
use digest::Digest;
use sha3::Sha3_512;

use config::{ALPHA_SALT, GAMMA_SALT_BASE, RHO_SALT, TAU1_SALT, TAU2_SALT};

/// A shared secret point from which every blinding factor of a proof is derived.
///
/// Whoever knows the nonce can recompute those blindings and open the
/// first commitment of the proof.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Nonce(CompressedRistretto);

impl From<RistrettoPoint> for Nonce {
    fn from(point: RistrettoPoint) -> Nonce {
        Nonce(point.compress())
    }
}

impl From<CompressedRistretto> for Nonce {
    fn from(point: CompressedRistretto) -> Nonce {
        Nonce(point)
    }
}

impl Nonce {
    /// Compressed encoding of the nonce point.
    pub fn as_bytes(&self) -> &[u8; 32] {
        self.0.as_bytes()
    }

    /// Deterministic scalar bound to this nonce and `salt`.
    pub fn hash_with_salt(&self, salt: u64) -> Scalar {
        let hash = Sha3_512::default()
            .chain(b"asset-rangeproofs nonce")
            .chain(self.0.as_bytes())
            .chain(&salt.to_le_bytes());
        Scalar::from_hash(hash)
    }

    pub(crate) fn gamma(&self, i: usize) -> Scalar {
        self.hash_with_salt(GAMMA_SALT_BASE + i as u64)
    }

    pub(crate) fn alpha(&self) -> Scalar {
        self.hash_with_salt(ALPHA_SALT)
    }

    pub(crate) fn rho(&self) -> Scalar {
        self.hash_with_salt(RHO_SALT)
    }

    pub(crate) fn tau1(&self) -> Scalar {
        self.hash_with_salt(TAU1_SALT)
    }

    pub(crate) fn tau2(&self) -> Scalar {
        self.hash_with_salt(TAU2_SALT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use curve25519_dalek::constants::RISTRETTO_BASEPOINT_POINT;

    #[test]
    fn salts_give_independent_scalars() {
        let nonce = Nonce::from(RISTRETTO_BASEPOINT_POINT);
        let derived = [
            nonce.alpha(),
            nonce.rho(),
            nonce.tau1(),
            nonce.tau2(),
            nonce.gamma(0),
            nonce.gamma(1),
        ];
        for i in 0..derived.len() {
            for j in i + 1..derived.len() {
                assert_ne!(derived[i], derived[j]);
            }
        }
        assert_eq!(nonce.gamma(3), nonce.hash_with_salt(103));
    }

    #[test]
    fn derivation_depends_on_the_nonce() {
        let a = Nonce::from(RISTRETTO_BASEPOINT_POINT);
        let b = Nonce::from(RISTRETTO_BASEPOINT_POINT * Scalar::from(2u64));
        assert_eq!(a.alpha(), Nonce::from(RISTRETTO_BASEPOINT_POINT.compress()).alpha());
        assert_ne!(a.alpha(), b.alpha());
    }
}
