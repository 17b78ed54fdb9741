//! Per-asset generator sets.
//!
//! Every asset gets its own independent tuple of bases: `G` for values,
//! `H` for blindings, and the vectors `Gi`, `Hi` used by the bit
//! commitments and the inner-product argument.  All of them are derived
//! deterministically from the asset identifier, so prover and verifier
//! agree without exchanging anything.

#![allow(non_snake_case)]

use std::fmt;
use std::sync::Arc;

use curve25519_dalek::ristretto::RistrettoPoint;
use digest::{ExtendableOutput, Input, XofReader};
use sha3::{Sha3_256, Sha3_512, Shake256};

/// Opaque 32-byte identifier of the asset a commitment is denominated in.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct AssetId(pub [u8; 32]);

impl AssetId {
    /// Derives an asset id by hashing a human-readable label.
    pub fn from_label(label: &[u8]) -> AssetId {
        let mut hash = Sha3_256::default();
        hash.input(b"asset-rangeproofs AssetId");
        hash.input(label);
        let mut id = [0u8; 32];
        id.copy_from_slice(digest::Digest::result(hash).as_slice());
        AssetId(id)
    }

    /// The raw identifier bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl From<[u8; 32]> for AssetId {
    fn from(bytes: [u8; 32]) -> AssetId {
        AssetId(bytes)
    }
}

impl fmt::Debug for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "AssetId(")?;
        for b in self.0.iter() {
            write!(f, "{:02x}", b)?;
        }
        write!(f, ")")
    }
}

/// The generators needed for proofs over a single asset.
///
/// Cloning is cheap: the vector bases are shared between clones.
#[derive(Clone)]
pub struct Generators {
    G: RistrettoPoint,
    H: RistrettoPoint,
    Gi: Arc<Vec<RistrettoPoint>>,
    Hi: Arc<Vec<RistrettoPoint>>,
}

impl Generators {
    /// Base for committed values.
    pub fn G(&self) -> RistrettoPoint {
        self.G
    }

    /// Base for blinding factors.
    pub fn H(&self) -> RistrettoPoint {
        self.H
    }

    /// The first `n` vector bases paired with the bits of `aL`.
    ///
    /// # Panics
    ///
    /// Panics if `n` exceeds [`capacity`](Generators::capacity).
    pub fn Gi(&self, n: usize) -> &[RistrettoPoint] {
        &self.Gi[..n]
    }

    /// The first `n` vector bases paired with the bits of `aR`.
    ///
    /// # Panics
    ///
    /// Panics if `n` exceeds [`capacity`](Generators::capacity).
    pub fn Hi(&self, n: usize) -> &[RistrettoPoint] {
        &self.Hi[..n]
    }

    /// Number of `Gi`/`Hi` bases available.
    pub fn capacity(&self) -> usize {
        self.Gi.len()
    }
}

/// Derives [`Generators`] for any asset, sized for a fixed number of bits.
///
/// The factory keeps no cache; callers that verify many batches for the
/// same asset can hold on to the returned `Generators`.
#[derive(Clone, Debug)]
pub struct GeneratorsFactory {
    capacity: usize,
}

impl GeneratorsFactory {
    /// Creates a factory producing `capacity` vector bases per asset.
    pub fn new(capacity: usize) -> Self {
        GeneratorsFactory { capacity }
    }

    /// Number of `Gi`/`Hi` bases in every produced instance.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the value base `G` and blinding base `H` of `asset`,
    /// without deriving any vector bases.
    pub fn get_bases(&self, asset: &AssetId) -> (RistrettoPoint, RistrettoPoint) {
        (hash_to_point(b"G", asset), hash_to_point(b"H", asset))
    }

    /// Returns the generator set of `asset`.
    pub fn get_instance(&self, asset: &AssetId) -> Generators {
        let (G, H) = self.get_bases(asset);

        let Gi: Vec<_> = GeneratorsChain::new(b"Gi", asset)
            .take(self.capacity)
            .collect();
        let Hi: Vec<_> = GeneratorsChain::new(b"Hi", asset)
            .take(self.capacity)
            .collect();

        Generators {
            G,
            H,
            Gi: Arc::new(Gi),
            Hi: Arc::new(Hi),
        }
    }
}

fn hash_to_point(role: &[u8], asset: &AssetId) -> RistrettoPoint {
    let mut input = Vec::with_capacity(64);
    input.extend_from_slice(b"asset-rangeproofs base ");
    input.extend_from_slice(role);
    input.extend_from_slice(asset.as_bytes());
    RistrettoPoint::hash_from_bytes::<Sha3_512>(&input)
}

/// An endless stream of independent points read from a SHAKE256 XOF.
struct GeneratorsChain {
    reader: <Shake256 as ExtendableOutput>::Reader,
}

impl GeneratorsChain {
    fn new(label: &[u8], asset: &AssetId) -> Self {
        let mut shake = Shake256::default();
        shake.input(b"GeneratorsChain");
        shake.input(label);
        shake.input(asset.as_bytes());

        GeneratorsChain {
            reader: shake.xof_result(),
        }
    }
}

impl Iterator for GeneratorsChain {
    type Item = RistrettoPoint;

    fn next(&mut self) -> Option<Self::Item> {
        let mut uniform_bytes = [0u8; 64];
        self.reader.read(&mut uniform_bytes);

        Some(RistrettoPoint::from_uniform_bytes(&uniform_bytes))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (usize::max_value(), None)
    }
}
