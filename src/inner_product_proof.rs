#![allow(non_snake_case)]
//! The inner-product argument used to compress the range proof vectors.
//!
//! Given bases \\(\mathbf{G}\\), \\(\mathbf{H}'\\) and \\(Q\\), the prover
//! shows knowledge of \\(\mathbf{a}\\), \\(\mathbf{b}\\) such that
//! \\(P = \langle \mathbf{a}, \mathbf{G} \rangle + \langle \mathbf{b}, \mathbf{H}' \rangle + \langle \mathbf{a}, \mathbf{b} \rangle Q\\)
//! using \\(\lg n\\) pairs of points \\(L\_k, R\_k\\).

use std::borrow::Borrow;
use std::iter;

use curve25519_dalek::ristretto::{CompressedRistretto, RistrettoPoint};
use curve25519_dalek::scalar::Scalar;
use curve25519_dalek::traits::VartimeMultiscalarMul;
use merlin::Transcript;

use errors::ProofError;
use transcript::TranscriptProtocol;
use util::inner_product;

/// Round commitments and final scalars of an inner-product argument.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InnerProductProof {
    pub(crate) L_vec: Vec<CompressedRistretto>,
    pub(crate) R_vec: Vec<CompressedRistretto>,
    pub(crate) a: Scalar,
    pub(crate) b: Scalar,
}

/// Challenge-derived scalars a verifier needs to fold the argument into
/// one multiscalar multiplication.
pub(crate) struct VerificationScalars {
    /// \\(u\_k^2\\), weights of the \\(L\_k\\).
    pub u_sq: Vec<Scalar>,
    /// \\(u\_k^{-2}\\), weights of the \\(R\_k\\).
    pub u_inv_sq: Vec<Scalar>,
    /// \\(s\_i\\), the folded coefficient of \\(G\_i\\).
    pub s: Vec<Scalar>,
}

impl InnerProductProof {
    /// Create an inner-product proof.
    ///
    /// The proof is created with respect to the bases \\(G\\), \\(H'\\),
    /// where \\(H'\_i = H\_i \cdot \texttt{Hprime\\_factors}\_i\\).
    /// The scaling is applied while folding the first round, so
    /// \\(H'\\) is never materialised.
    ///
    /// Returns `None` if a round challenge is zero; the caller is
    /// expected to restart the enclosing proof.
    ///
    /// The lengths of the vectors must all be the same power of 2.
    pub fn create(
        transcript: &mut Transcript,
        Q: &RistrettoPoint,
        Hprime_factors: &[Scalar],
        mut G_vec: Vec<RistrettoPoint>,
        mut H_vec: Vec<RistrettoPoint>,
        mut a_vec: Vec<Scalar>,
        mut b_vec: Vec<Scalar>,
    ) -> Option<InnerProductProof> {
        let mut G = &mut G_vec[..];
        let mut H = &mut H_vec[..];
        let mut a = &mut a_vec[..];
        let mut b = &mut b_vec[..];

        let mut n = G.len();

        assert_eq!(H.len(), n);
        assert_eq!(a.len(), n);
        assert_eq!(b.len(), n);
        assert_eq!(Hprime_factors.len(), n);
        assert!(n.is_power_of_two());

        transcript.innerproduct_domain_sep(n as u64);

        let lg_n = n.trailing_zeros() as usize;
        let mut L_vec = Vec::with_capacity(lg_n);
        let mut R_vec = Vec::with_capacity(lg_n);

        // H' factors still to be folded in; only the first round has any.
        let mut scale = Some(Hprime_factors);

        while n != 1 {
            n = n / 2;
            let (a_L, a_R) = a.split_at_mut(n);
            let (b_L, b_R) = b.split_at_mut(n);
            let (G_L, G_R) = G.split_at_mut(n);
            let (H_L, H_R) = H.split_at_mut(n);

            let (scale_L, scale_R) = match scale.take() {
                Some(factors) => (factors[..n].to_vec(), factors[n..].to_vec()),
                None => (vec![Scalar::one(); n], vec![Scalar::one(); n]),
            };

            let c_L = inner_product(a_L, b_R);
            let c_R = inner_product(a_R, b_L);

            let L = RistrettoPoint::vartime_multiscalar_mul(
                a_L.iter()
                    .cloned()
                    .chain(b_R.iter().zip(scale_L.iter()).map(|(b_i, f_i)| b_i * f_i))
                    .chain(iter::once(c_L)),
                G_R.iter().chain(H_L.iter()).chain(iter::once(Q)),
            )
            .compress();

            let R = RistrettoPoint::vartime_multiscalar_mul(
                a_R.iter()
                    .cloned()
                    .chain(b_L.iter().zip(scale_R.iter()).map(|(b_i, f_i)| b_i * f_i))
                    .chain(iter::once(c_R)),
                G_L.iter().chain(H_R.iter()).chain(iter::once(Q)),
            )
            .compress();

            L_vec.push(L);
            R_vec.push(R);

            transcript.commit_point(b"L", &L);
            transcript.commit_point(b"R", &R);

            let u = transcript.challenge_scalar(b"u");
            if u == Scalar::zero() {
                return None;
            }
            let u_inv = u.invert();

            for i in 0..n {
                a_L[i] = a_L[i] * u + u_inv * a_R[i];
                b_L[i] = b_L[i] * u_inv + u * b_R[i];
                G_L[i] = RistrettoPoint::vartime_multiscalar_mul(&[u_inv, u], &[G_L[i], G_R[i]]);
                H_L[i] = RistrettoPoint::vartime_multiscalar_mul(
                    &[u * scale_L[i], u_inv * scale_R[i]],
                    &[H_L[i], H_R[i]],
                );
            }

            a = a_L;
            b = b_L;
            G = G_L;
            H = H_L;
        }

        Some(InnerProductProof {
            L_vec,
            R_vec,
            a: a[0],
            b: b[0],
        })
    }

    /// Replays the round challenges on `transcript` and computes the
    /// scalars needed to check the argument for vectors of length `n`.
    pub(crate) fn verification_scalars(
        &self,
        n: usize,
        transcript: &mut Transcript,
    ) -> Result<VerificationScalars, ProofError> {
        let lg_n = self.L_vec.len();
        if lg_n >= 32 || lg_n != self.R_vec.len() {
            return Err(ProofError::InvalidProofSize);
        }
        if n != (1 << lg_n) {
            return Err(ProofError::InvalidProofSize);
        }

        transcript.innerproduct_domain_sep(n as u64);

        let mut challenges = Vec::with_capacity(lg_n);
        for (L, R) in self.L_vec.iter().zip(self.R_vec.iter()) {
            transcript.commit_point(b"L", L);
            transcript.commit_point(b"R", R);
            let u = transcript.challenge_scalar(b"u");
            // An honest prover restarts on a zero challenge.
            if u == Scalar::zero() {
                return Err(ProofError::BatchRejected);
            }
            challenges.push(u);
        }

        let mut challenges_inv = challenges.clone();
        let allinv = Scalar::batch_invert(&mut challenges_inv);

        let u_sq: Vec<Scalar> = challenges.iter().map(|u| u * u).collect();
        let u_inv_sq: Vec<Scalar> = challenges_inv.iter().map(|u| u * u).collect();

        // s_i is the product of u_k^{+1} or u_k^{-1} chosen by the bits of i.
        let mut s = Vec::with_capacity(n);
        s.push(allinv);
        for i in 1..n {
            let lg_i = (32 - 1 - (i as u32).leading_zeros()) as usize;
            let k = 1 << lg_i;
            let u_lg_i_sq = u_sq[(lg_n - 1) - lg_i];
            s.push(s[i - k] * u_lg_i_sq);
        }

        Ok(VerificationScalars { u_sq, u_inv_sq, s })
    }

    /// Checks the argument on its own against the commitment `P`.
    ///
    /// Range proofs fold the same check into the batch verifier; this
    /// standalone form exists for testing the argument in isolation.
    pub fn verify<I>(
        &self,
        n: usize,
        transcript: &mut Transcript,
        Hprime_factors: I,
        P: &RistrettoPoint,
        Q: &RistrettoPoint,
        G: &[RistrettoPoint],
        H: &[RistrettoPoint],
    ) -> Result<(), ProofError>
    where
        I: IntoIterator,
        I::Item: Borrow<Scalar>,
    {
        let VerificationScalars { u_sq, u_inv_sq, s } =
            self.verification_scalars(n, transcript)?;

        let a_times_s = s.iter().map(|s_i| self.a * s_i).take(G.len());

        let inv_s = s.iter().rev();

        let h_times_b_div_s = Hprime_factors
            .into_iter()
            .zip(inv_s)
            .map(|(h_i, s_i_inv)| (self.b * s_i_inv) * h_i.borrow());

        let neg_u_sq = u_sq.iter().map(|ui| -ui);
        let neg_u_inv_sq = u_inv_sq.iter().map(|ui| -ui);

        let Ls = self
            .L_vec
            .iter()
            .map(|p| p.decompress().ok_or(ProofError::FormatError))
            .collect::<Result<Vec<_>, _>>()?;

        let Rs = self
            .R_vec
            .iter()
            .map(|p| p.decompress().ok_or(ProofError::FormatError))
            .collect::<Result<Vec<_>, _>>()?;

        let expect_P = RistrettoPoint::vartime_multiscalar_mul(
            iter::once(self.a * self.b)
                .chain(a_times_s)
                .chain(h_times_b_div_s)
                .chain(neg_u_sq)
                .chain(neg_u_inv_sq),
            iter::once(Q)
                .chain(G.iter())
                .chain(H.iter())
                .chain(Ls.iter())
                .chain(Rs.iter()),
        );

        if expect_P == *P {
            Ok(())
        } else {
            Err(ProofError::BatchRejected)
        }
    }

    /// The left round commitments \\(L\_k\\).
    pub fn L_vec(&self) -> &[CompressedRistretto] {
        &self.L_vec
    }

    /// The right round commitments \\(R\_k\\).
    pub fn R_vec(&self) -> &[CompressedRistretto] {
        &self.R_vec
    }

    /// The final folded scalars \\((a, b)\\).
    pub fn final_scalars(&self) -> (Scalar, Scalar) {
        (self.a, self.b)
    }
}
