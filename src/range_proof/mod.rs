#![allow(non_snake_case)]
//! Aggregated range proofs with nonce-based recovery.
//!
//! The protocol follows the Bulletproofs aggregated range proof: the
//! prover commits to the bits of every value, compresses the final
//! inner product with an [`InnerProductProof`], and all blinding factors
//! except the vectors `sL`, `sR` are derived from a [`Nonce`].  The
//! first value and a short message are folded into two of those
//! blindings so that the nonce holder can read them back later.

use byteorder::{ByteOrder, LittleEndian};
use curve25519_dalek::ristretto::CompressedRistretto;
use curve25519_dalek::scalar::Scalar;
use merlin::Transcript;
use rand::{thread_rng, CryptoRng, RngCore};
use serde::de::Visitor;
use serde::{self, Deserialize, Deserializer, Serialize, Serializer};

use config::{RangeProofConfig, INPUT_VALUE_BITS};
use errors::ProofError;
use generators::{AssetId, Generators, GeneratorsFactory};
use inner_product_proof::InnerProductProof;
use nonce::Nonce;
use transcript::TranscriptProtocol;
use util::{self, read32};

mod message;
mod prover;
mod recovery;
mod verifier;

pub use self::recovery::{RecoveredValue, RecoveryRequest};

/// Label of the Fiat-Shamir transcript shared by prover, verifier and recovery.
pub(crate) const TRANSCRIPT_LABEL: &[u8] = b"asset-rangeproofs";

/// Upper bound on the number of commitments accepted while parsing.
const MAX_PARSED_COMMITMENTS: usize = 1 << 16;

/// A proof that one or more committed values are each in \\([0, 2^{64})\\).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RangeProof {
    /// Commitments \\(V\_j = \gamma\_j H + v\_j G\\), one per value
    pub(crate) V_vec: Vec<CompressedRistretto>,
    /// Commitment to the bits of the values
    pub(crate) A: CompressedRistretto,
    /// Commitment to the blinding vectors
    pub(crate) S: CompressedRistretto,
    /// Commitment to the \\(t_1\\) coefficient of \\( t(x) \\)
    pub(crate) T_1: CompressedRistretto,
    /// Commitment to the \\(t_2\\) coefficient of \\( t(x) \\)
    pub(crate) T_2: CompressedRistretto,
    /// Evaluation of the polynomial \\(t(x)\\) at the challenge point \\(x\\)
    pub(crate) t_x: Scalar,
    /// Blinding factor for the synthetic commitment to \\(t(x)\\), \\(\tau\_x\\)
    pub(crate) t_x_blinding: Scalar,
    /// Blinding factor for the synthetic commitment to the inner-product arguments, \\(\mu\\)
    pub(crate) e_blinding: Scalar,
    /// Proof data for the inner-product argument.
    pub(crate) ipp_proof: InnerProductProof,
}

/// Fiat-Shamir challenges of a proof, in the order they are drawn.
#[derive(Copy, Clone)]
pub(crate) struct Challenges {
    pub y: Scalar,
    pub z: Scalar,
    pub x: Scalar,
    pub x_ip: Scalar,
}

impl RangeProof {
    /// The value commitments, in the order the values were given to the prover.
    pub fn value_commitments(&self) -> &[CompressedRistretto] {
        &self.V_vec
    }

    /// The compressed inner-product argument.
    pub fn inner_product_proof(&self) -> &InnerProductProof {
        &self.ipp_proof
    }

    /// Number of commitments padded up to a power of two.
    pub(crate) fn padded_value_count(&self) -> usize {
        util::next_power_of_two(self.V_vec.len())
    }

    /// Checks the shape of the proof against `config`.
    pub(crate) fn check_size(&self, config: &RangeProofConfig) -> Result<(), ProofError> {
        let m = self.V_vec.len();
        if m == 0 || m > config.max_input_values {
            return Err(ProofError::InvalidProofSize);
        }
        let rounds = self.ipp_proof.L_vec.len();
        if rounds != self.ipp_proof.R_vec.len() {
            return Err(ProofError::InvalidProofSize);
        }
        if rounds != RangeProofEngine::inner_product_rounds(m) {
            return Err(ProofError::InvalidProofSize);
        }
        Ok(())
    }

    /// Replays the transcript up to the inner-product argument and
    /// returns the challenges `y`, `z`, `x`, `x_ip`.
    ///
    /// The transcript is left positioned for the inner-product rounds.
    pub(crate) fn replay_challenges(
        &self,
        transcript: &mut Transcript,
    ) -> Result<Challenges, ProofError> {
        transcript.rangeproof_domain_sep(INPUT_VALUE_BITS as u64, self.V_vec.len() as u64);
        for V in self.V_vec.iter() {
            transcript.commit_point(b"V", V);
        }

        transcript.commit_point(b"A", &self.A);
        transcript.commit_point(b"S", &self.S);
        let y = nonzero(transcript.challenge_scalar(b"y"))?;
        transcript.commit_scalar(b"y", &y);
        let z = nonzero(transcript.challenge_scalar(b"z"))?;
        transcript.commit_scalar(b"z", &z);

        transcript.commit_point(b"T_1", &self.T_1);
        transcript.commit_point(b"T_2", &self.T_2);
        let x = nonzero(transcript.challenge_scalar(b"x"))?;

        transcript.commit_scalar(b"x", &x);
        transcript.commit_scalar(b"t_x_blinding", &self.t_x_blinding);
        transcript.commit_scalar(b"e_blinding", &self.e_blinding);
        transcript.commit_scalar(b"t_x", &self.t_x);
        let x_ip = nonzero(transcript.challenge_scalar(b"x_ip"))?;

        Ok(Challenges { y, z, x, x_ip })
    }

    /// Returns the size in bytes required to serialize the range proof.
    pub fn serialized_size(&self) -> usize {
        let points = self.V_vec.len() + 4 + 2 * self.ipp_proof.L_vec.len();
        let scalars = 3 + 2;
        3 * 8 + (points + scalars) * 32
    }

    /// Serializes the proof into a byte array.
    ///
    /// The layout is:
    /// * a `u64` (little-endian) count \\(m\\) followed by \\(m\\) commitments \\(V\_j\\),
    /// * the points \\(A, S, T\_1, T\_2\\),
    /// * the scalars \\(\tau\_x, \mu, \hat{t}\\),
    /// * a `u64` count \\(k\\) followed by \\(L\_0, \dots, L\_{k-1}\\),
    /// * a `u64` count \\(k\\) followed by \\(R\_0, \dots, R\_{k-1}\\),
    /// * the scalars \\(a, b\\).
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.serialized_size());

        write_points(&mut buf, &self.V_vec);
        buf.extend_from_slice(self.A.as_bytes());
        buf.extend_from_slice(self.S.as_bytes());
        buf.extend_from_slice(self.T_1.as_bytes());
        buf.extend_from_slice(self.T_2.as_bytes());

        buf.extend_from_slice(self.t_x_blinding.as_bytes());
        buf.extend_from_slice(self.e_blinding.as_bytes());
        buf.extend_from_slice(self.t_x.as_bytes());

        write_points(&mut buf, &self.ipp_proof.L_vec);
        write_points(&mut buf, &self.ipp_proof.R_vec);
        buf.extend_from_slice(self.ipp_proof.a.as_bytes());
        buf.extend_from_slice(self.ipp_proof.b.as_bytes());

        buf
    }

    /// Deserializes the proof from a byte slice.
    ///
    /// Points are not decompressed here; a proof whose points are invalid
    /// parses successfully and is rejected by verification.  Returns
    /// `FormatError` on truncated or trailing data and on non-canonical
    /// scalars.
    pub fn from_bytes(slice: &[u8]) -> Result<RangeProof, ProofError> {
        let mut reader = ByteReader { slice, pos: 0 };

        let V_vec = reader.read_points()?;
        let A = reader.read_point()?;
        let S = reader.read_point()?;
        let T_1 = reader.read_point()?;
        let T_2 = reader.read_point()?;

        let t_x_blinding = reader.read_scalar()?;
        let e_blinding = reader.read_scalar()?;
        let t_x = reader.read_scalar()?;

        let L_vec = reader.read_points()?;
        let R_vec = reader.read_points()?;
        let a = reader.read_scalar()?;
        let b = reader.read_scalar()?;

        if reader.pos != slice.len() {
            return Err(ProofError::FormatError);
        }

        Ok(RangeProof {
            V_vec,
            A,
            S,
            T_1,
            T_2,
            t_x,
            t_x_blinding,
            e_blinding,
            ipp_proof: InnerProductProof { L_vec, R_vec, a, b },
        })
    }
}

fn nonzero(s: Scalar) -> Result<Scalar, ProofError> {
    if s == Scalar::zero() {
        Err(ProofError::BatchRejected)
    } else {
        Ok(s)
    }
}

fn write_points(buf: &mut Vec<u8>, points: &[CompressedRistretto]) {
    let mut len = [0u8; 8];
    LittleEndian::write_u64(&mut len, points.len() as u64);
    buf.extend_from_slice(&len);
    for p in points {
        buf.extend_from_slice(p.as_bytes());
    }
}

struct ByteReader<'a> {
    slice: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    fn take(&mut self, n: usize) -> Result<&'a [u8], ProofError> {
        if self.slice.len() - self.pos < n {
            return Err(ProofError::FormatError);
        }
        let out = &self.slice[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    fn read_point(&mut self) -> Result<CompressedRistretto, ProofError> {
        Ok(CompressedRistretto(read32(self.take(32)?)))
    }

    fn read_scalar(&mut self) -> Result<Scalar, ProofError> {
        Scalar::from_canonical_bytes(read32(self.take(32)?)).ok_or(ProofError::FormatError)
    }

    fn read_points(&mut self) -> Result<Vec<CompressedRistretto>, ProofError> {
        let len = LittleEndian::read_u64(self.take(8)?);
        if len > MAX_PARSED_COMMITMENTS as u64 {
            return Err(ProofError::FormatError);
        }
        let len = len as usize;
        if (self.slice.len() - self.pos) / 32 < len {
            return Err(ProofError::FormatError);
        }
        (0..len).map(|_| self.read_point()).collect()
    }
}

impl Serialize for RangeProof {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_bytes(&self.to_bytes()[..])
    }
}

impl<'de> Deserialize<'de> for RangeProof {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct RangeProofVisitor;

        impl<'de> Visitor<'de> for RangeProofVisitor {
            type Value = RangeProof;

            fn expecting(&self, formatter: &mut ::core::fmt::Formatter) -> ::core::fmt::Result {
                formatter.write_str("a valid RangeProof")
            }

            fn visit_bytes<E>(self, v: &[u8]) -> Result<RangeProof, E>
            where
                E: serde::de::Error,
            {
                RangeProof::from_bytes(v).map_err(serde::de::Error::custom)
            }
        }

        deserializer.deserialize_bytes(RangeProofVisitor)
    }
}

/// Entry point for proving, batch verification and recovery.
///
/// The engine owns the configured limits and derives the per-asset
/// generators on every call.
#[derive(Clone, Debug)]
pub struct RangeProofEngine {
    config: RangeProofConfig,
    gens_factory: GeneratorsFactory,
}

impl Default for RangeProofEngine {
    fn default() -> Self {
        let config = RangeProofConfig::default();
        let gens_factory = GeneratorsFactory::new(config.generators_capacity());
        RangeProofEngine {
            config,
            gens_factory,
        }
    }
}

impl RangeProofEngine {
    /// Creates an engine after checking `config`.
    pub fn new(config: RangeProofConfig) -> Result<Self, ProofError> {
        config.validate()?;
        let gens_factory = GeneratorsFactory::new(config.generators_capacity());
        Ok(RangeProofEngine {
            config,
            gens_factory,
        })
    }

    /// The limits this engine enforces.
    pub fn config(&self) -> &RangeProofConfig {
        &self.config
    }

    /// The generators used for proofs over `asset`.
    pub fn generators(&self, asset: &AssetId) -> Generators {
        self.gens_factory.get_instance(asset)
    }

    /// Number of inner-product rounds in a proof of `num_values` values.
    pub fn inner_product_rounds(num_values: usize) -> usize {
        (util::next_power_of_two(num_values) * INPUT_VALUE_BITS).trailing_zeros() as usize
    }

    /// Proves that every entry of `values` is a 64-bit value, embedding
    /// `message` so that it can be recovered with `nonce`.
    ///
    /// The blinding vectors are seeded from the thread-local RNG.
    pub fn prove(
        &self,
        values: &[u64],
        nonce: &Nonce,
        message: &[u8],
        asset: &AssetId,
    ) -> Result<RangeProof, ProofError> {
        self.prove_with_rng(values, nonce, message, asset, &mut thread_rng())
    }

    /// Like [`prove`](RangeProofEngine::prove), seeding the blinding
    /// vectors from `rng`.  A deterministic `rng` gives a deterministic proof.
    pub fn prove_with_rng<T: RngCore + CryptoRng>(
        &self,
        values: &[u64],
        nonce: &Nonce,
        message: &[u8],
        asset: &AssetId,
        rng: &mut T,
    ) -> Result<RangeProof, ProofError> {
        let gens = self.generators(asset);
        prover::RangeProver::new(&self.config, &gens, values, nonce, message)?.prove(rng)
    }

    /// Returns `true` iff every proof in the batch is valid for `asset`.
    pub fn verify(&self, proofs: &[(usize, RangeProof)], asset: &AssetId) -> bool {
        self.verify_with_rng(proofs, asset, &mut thread_rng())
    }

    /// Like [`verify`](RangeProofEngine::verify), drawing the batch weights from `rng`.
    pub fn verify_with_rng<T: RngCore + CryptoRng>(
        &self,
        proofs: &[(usize, RangeProof)],
        asset: &AssetId,
        rng: &mut T,
    ) -> bool {
        match self.try_verify_with_rng(proofs, asset, rng) {
            Ok(()) => true,
            Err(e) => {
                debug!("range proof batch of {} rejected: {}", proofs.len(), e);
                false
            }
        }
    }

    /// Verifies the batch, reporting why it was rejected.
    pub fn try_verify(
        &self,
        proofs: &[(usize, RangeProof)],
        asset: &AssetId,
    ) -> Result<(), ProofError> {
        self.try_verify_with_rng(proofs, asset, &mut thread_rng())
    }

    /// Like [`try_verify`](RangeProofEngine::try_verify), drawing the batch weights from `rng`.
    pub fn try_verify_with_rng<T: RngCore + CryptoRng>(
        &self,
        proofs: &[(usize, RangeProof)],
        asset: &AssetId,
        rng: &mut T,
    ) -> Result<(), ProofError> {
        let gens = self.generators(asset);
        verifier::verify_batch(&self.config, &gens, proofs, rng)
    }

    /// Opens the first commitment of every request whose nonce matches.
    ///
    /// Requests that are malformed or whose nonce does not open the
    /// commitment are left out of the result.
    pub fn recover(&self, requests: &[RecoveryRequest], asset: &AssetId) -> Vec<RecoveredValue> {
        let (G, H) = self.gens_factory.get_bases(asset);
        recovery::recover(&self.config, &G, &H, requests)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use curve25519_dalek::constants::RISTRETTO_BASEPOINT_POINT;
    use rand::SeedableRng;
    use rand_chacha::ChaChaRng;

    fn small_engine() -> RangeProofEngine {
        RangeProofEngine::new(RangeProofConfig {
            max_input_values: 4,
            ..RangeProofConfig::default()
        })
        .unwrap()
    }

    fn nonce(k: u64) -> Nonce {
        Nonce::from(RISTRETTO_BASEPOINT_POINT * Scalar::from(k))
    }

    #[test]
    fn round_counts_follow_padded_bit_length() {
        assert_eq!(RangeProofEngine::inner_product_rounds(1), 6);
        assert_eq!(RangeProofEngine::inner_product_rounds(2), 7);
        assert_eq!(RangeProofEngine::inner_product_rounds(3), 8);
        assert_eq!(RangeProofEngine::inner_product_rounds(16), 10);
    }

    #[test]
    fn bytes_roundtrip_preserves_proof() {
        let engine = small_engine();
        let asset = AssetId::from_label(b"bytes");
        let mut rng = ChaChaRng::from_seed([1u8; 32]);
        let proof = engine
            .prove_with_rng(&[5, 6, 7], &nonce(3), b"hi", &asset, &mut rng)
            .unwrap();

        let bytes = proof.to_bytes();
        assert_eq!(bytes.len(), proof.serialized_size());
        assert_eq!(RangeProof::from_bytes(&bytes).unwrap(), proof);

        let encoded = bincode::serialize(&proof).unwrap();
        let decoded: RangeProof = bincode::deserialize(&encoded).unwrap();
        assert_eq!(decoded, proof);
    }

    #[test]
    fn from_bytes_rejects_truncated_and_trailing_data() {
        let engine = small_engine();
        let asset = AssetId::from_label(b"bytes");
        let proof = engine.prove(&[1], &nonce(1), b"", &asset).unwrap();
        let bytes = proof.to_bytes();

        assert_eq!(
            RangeProof::from_bytes(&bytes[..bytes.len() - 1]),
            Err(ProofError::FormatError)
        );
        let mut long = bytes.clone();
        long.push(0);
        assert_eq!(RangeProof::from_bytes(&long), Err(ProofError::FormatError));

        let mut huge_count = bytes.clone();
        huge_count[..8].copy_from_slice(&[0xff; 8]);
        assert_eq!(
            RangeProof::from_bytes(&huge_count),
            Err(ProofError::FormatError)
        );
    }

    #[test]
    fn check_size_matches_round_count() {
        let engine = small_engine();
        let asset = AssetId::from_label(b"size");
        let proof = engine.prove(&[1, 2], &nonce(9), b"", &asset).unwrap();
        assert!(proof.check_size(engine.config()).is_ok());

        let mut short = proof.clone();
        short.ipp_proof.L_vec.pop();
        short.ipp_proof.R_vec.pop();
        assert_eq!(
            short.check_size(engine.config()),
            Err(ProofError::InvalidProofSize)
        );

        let mut lopsided = proof.clone();
        lopsided.ipp_proof.R_vec.pop();
        assert_eq!(
            lopsided.check_size(engine.config()),
            Err(ProofError::InvalidProofSize)
        );

        let mut empty = proof;
        empty.V_vec.clear();
        assert_eq!(
            empty.check_size(engine.config()),
            Err(ProofError::InvalidProofSize)
        );
    }

    #[test]
    fn new_rejects_invalid_config() {
        let config = RangeProofConfig {
            max_input_values: 0,
            ..RangeProofConfig::default()
        };
        assert!(RangeProofEngine::new(config).is_err());
    }
}
