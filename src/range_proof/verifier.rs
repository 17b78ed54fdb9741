#![allow(non_snake_case)]
//! Batch verification of range proofs.
//!
//! Verification runs in two passes.  The first replays the transcript of
//! every proof and decompresses its points into a
//! [`ProofWithDerivedValues`]; the second folds every proof, scaled by
//! fresh random weights, into one [`BatchAccumulator`] whose
//! multiscalar multiplication must come out as the identity.

use std::iter;

use curve25519_dalek::ristretto::{CompressedRistretto, RistrettoPoint};
use curve25519_dalek::scalar::Scalar;
use curve25519_dalek::traits::{IsIdentity, VartimeMultiscalarMul};
use merlin::Transcript;
use rand::{CryptoRng, RngCore};

use config::{RangeProofConfig, INPUT_VALUE_BITS};
use errors::ProofError;
use generators::Generators;
use inner_product_proof::VerificationScalars;
use util;

use super::{Challenges, RangeProof, TRANSCRIPT_LABEL};

/// A proof together with everything the verifier derives from it alone.
struct ProofWithDerivedValues<'a> {
    proof: &'a RangeProof,
    V: Vec<RistrettoPoint>,
    A: RistrettoPoint,
    S: RistrettoPoint,
    T_1: RistrettoPoint,
    T_2: RistrettoPoint,
    L: Vec<RistrettoPoint>,
    R: Vec<RistrettoPoint>,
    challenges: Challenges,
    ipp: VerificationScalars,
    /// Padded number of values.
    m: usize,
}

impl<'a> ProofWithDerivedValues<'a> {
    fn derive(proof: &'a RangeProof, config: &RangeProofConfig) -> Result<Self, ProofError> {
        proof.check_size(config)?;

        let m = proof.padded_value_count();
        let mut transcript = Transcript::new(TRANSCRIPT_LABEL);
        let challenges = proof.replay_challenges(&mut transcript)?;
        let ipp = proof
            .ipp_proof
            .verification_scalars(m * INPUT_VALUE_BITS, &mut transcript)?;

        Ok(ProofWithDerivedValues {
            proof,
            V: decompress_all(&proof.V_vec)?,
            A: decompress(&proof.A)?,
            S: decompress(&proof.S)?,
            T_1: decompress(&proof.T_1)?,
            T_2: decompress(&proof.T_2)?,
            L: decompress_all(&proof.ipp_proof.L_vec)?,
            R: decompress_all(&proof.ipp_proof.R_vec)?,
            challenges,
            ipp,
            m,
        })
    }

    fn nm(&self) -> usize {
        self.m * INPUT_VALUE_BITS
    }
}

fn decompress(p: &CompressedRistretto) -> Result<RistrettoPoint, ProofError> {
    p.decompress().ok_or(ProofError::FormatError)
}

fn decompress_all(points: &[CompressedRistretto]) -> Result<Vec<RistrettoPoint>, ProofError> {
    points.iter().map(decompress).collect()
}

/// Running sums of the combined verification equation.
///
/// `y0`, `z1` end up on `H`, `y1`, `z3` on `G`, `z4`/`z5` on `Gi`/`Hi`,
/// and every proof-specific point is kept with its weight in
/// `scalars`/`points`.
struct BatchAccumulator {
    y0: Scalar,
    y1: Scalar,
    z1: Scalar,
    z3: Scalar,
    z4: Vec<Scalar>,
    z5: Vec<Scalar>,
    scalars: Vec<Scalar>,
    points: Vec<RistrettoPoint>,
}

impl BatchAccumulator {
    fn new(max_nm: usize, dynamic_capacity: usize) -> Self {
        BatchAccumulator {
            y0: Scalar::zero(),
            y1: Scalar::zero(),
            z1: Scalar::zero(),
            z3: Scalar::zero(),
            z4: vec![Scalar::zero(); max_nm],
            z5: vec![Scalar::zero(); max_nm],
            scalars: Vec::with_capacity(dynamic_capacity),
            points: Vec::with_capacity(dynamic_capacity),
        }
    }

    fn push(&mut self, scalar: Scalar, point: RistrettoPoint) {
        self.scalars.push(scalar);
        self.points.push(point);
    }

    /// Adds one proof, weighting the polynomial identity by `w_y` and the
    /// inner-product relation by `w_z`.
    fn add(&mut self, d: &ProofWithDerivedValues, w_y: Scalar, w_z: Scalar) {
        let Challenges { y, z, x, x_ip } = d.challenges;
        let proof = d.proof;
        let (a, b) = (proof.ipp_proof.a, proof.ipp_proof.b);
        let n = INPUT_VALUE_BITS;
        let nm = d.nm();
        let zz = z * z;

        // t G + tau_x H = z^2 <z^j, V_j> + delta G + x T_1 + x^2 T_2
        let delta = (z - zz) * util::sum_of_powers(&y, nm)
            - util::exp_iter(z)
                .skip(3)
                .take(d.m)
                .fold(Scalar::zero(), |acc, z_j| acc + z_j)
                * util::bit_constants().ones_dot_two_pows;

        self.y0 -= proof.t_x_blinding * w_y;
        self.y1 += (proof.t_x - delta) * w_y;
        for (z_j, V_j) in util::exp_iter(z).skip(2).zip(d.V.iter()) {
            self.push(z_j * w_y, *V_j);
        }
        self.push(x * w_y, d.T_1);
        self.push(x * x * w_y, d.T_2);

        // Inner-product relation over G_i and H'_i = y^-i H_i
        self.z1 += proof.e_blinding * w_z;
        self.z3 += (proof.t_x - a * b) * x_ip * w_z;
        self.push(w_z, d.A);
        self.push(x * w_z, d.S);
        for (u_sq, L) in d.ipp.u_sq.iter().zip(d.L.iter()) {
            self.push(u_sq * w_z, *L);
        }
        for (u_inv_sq, R) in d.ipp.u_inv_sq.iter().zip(d.R.iter()) {
            self.push(u_inv_sq * w_z, *R);
        }

        let two_pows = &util::bit_constants().two_pows;
        let s = &d.ipp.s;
        let y_inv = y.invert();
        let mut exp_y_inv = Scalar::one();
        let mut exp_z = zz;
        for j in 0..d.m {
            for i in 0..n {
                let k = j * n + i;
                let zz2_k = exp_z * two_pows[i];
                self.z4[k] -= (a * s[k] + z) * w_z;
                self.z5[k] -= (exp_y_inv * (b * s[nm - 1 - k] - zz2_k) - z) * w_z;
                exp_y_inv *= y_inv;
            }
            exp_z *= z;
        }
    }

    fn check(self, gens: &Generators) -> Result<(), ProofError> {
        let nm = self.z4.len();
        let G_scalar = self.z3 - self.y1;
        let H_scalar = self.y0 - self.z1;

        let combined = RistrettoPoint::vartime_multiscalar_mul(
            iter::once(H_scalar)
                .chain(iter::once(G_scalar))
                .chain(self.z4.into_iter())
                .chain(self.z5.into_iter())
                .chain(self.scalars.into_iter()),
            iter::once(gens.H())
                .chain(iter::once(gens.G()))
                .chain(gens.Gi(nm).iter().cloned())
                .chain(gens.Hi(nm).iter().cloned())
                .chain(self.points.into_iter()),
        );

        if combined.is_identity() {
            Ok(())
        } else {
            Err(ProofError::BatchRejected)
        }
    }
}

fn random_not_zero<T: RngCore + CryptoRng>(rng: &mut T) -> Scalar {
    loop {
        let s = Scalar::random(rng);
        if s != Scalar::zero() {
            return s;
        }
    }
}

/// Verifies every `(index, proof)` pair against `gens` in one check.
///
/// The indices only label proofs in log output.
pub(crate) fn verify_batch<T: RngCore + CryptoRng>(
    config: &RangeProofConfig,
    gens: &Generators,
    proofs: &[(usize, RangeProof)],
    rng: &mut T,
) -> Result<(), ProofError> {
    if proofs.is_empty() {
        return Ok(());
    }

    let mut derived = Vec::with_capacity(proofs.len());
    for (index, proof) in proofs.iter() {
        match ProofWithDerivedValues::derive(proof, config) {
            Ok(d) => derived.push(d),
            Err(e) => {
                debug!("range proof {} failed preparation: {}", index, e);
                return Err(e);
            }
        }
    }

    let max_nm = derived.iter().map(|d| d.nm()).max().unwrap_or(0);
    if max_nm > gens.capacity() {
        return Err(ProofError::InvalidProofSize);
    }
    let dynamic_capacity = derived
        .iter()
        .map(|d| d.V.len() + 4 + d.L.len() + d.R.len())
        .sum();

    let mut acc = BatchAccumulator::new(max_nm, dynamic_capacity);
    for d in derived.iter() {
        let w_y = random_not_zero(rng);
        let w_z = random_not_zero(rng);
        acc.add(d, w_y, w_z);
    }

    acc.check(gens)
}
