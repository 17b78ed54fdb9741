#![allow(non_snake_case)]

use std::iter;

use clear_on_drop::clear::Clear;
use curve25519_dalek::ristretto::{CompressedRistretto, RistrettoPoint};
use curve25519_dalek::scalar::Scalar;
use curve25519_dalek::traits::MultiscalarMul;
use merlin::{Transcript, TranscriptRng};
use rand::{CryptoRng, RngCore};

use config::{RangeProofConfig, INPUT_VALUE_BITS};
use errors::ProofError;
use generators::Generators;
use inner_product_proof::InnerProductProof;
use nonce::Nonce;
use transcript::TranscriptProtocol;
use util::{self, VecPoly1};

use super::message;
use super::{RangeProof, TRANSCRIPT_LABEL};

/// Builds a [`RangeProof`] for a fixed set of values.
///
/// Everything that does not depend on the transcript challenges
/// (value commitments, nonce-derived blindings, bit vectors) is prepared
/// once in `new`; `prove` then runs attempts until one of them draws
/// only non-zero challenges.
pub(crate) struct RangeProver<'a> {
    config: &'a RangeProofConfig,
    gens: &'a Generators,
    nonce: &'a Nonce,
    V_vec: Vec<CompressedRistretto>,
    /// Number of values padded to a power of two.
    m: usize,
    secrets: Secrets,
}

/// Witness data of a proof, wiped when the prover is dropped.
struct Secrets {
    gammas: Vec<Scalar>,
    a_L: Vec<Scalar>,
    a_R: Vec<Scalar>,
    alpha: Scalar,
    rho: Scalar,
    tau1: Scalar,
    tau2: Scalar,
}

impl Drop for Secrets {
    fn drop(&mut self) {
        for e in self
            .gammas
            .iter_mut()
            .chain(self.a_L.iter_mut())
            .chain(self.a_R.iter_mut())
        {
            e.clear();
        }
        self.alpha.clear();
        self.rho.clear();
        self.tau1.clear();
        self.tau2.clear();
    }
}

/// The random blinding vectors `s_L`, `s_R` of a single attempt.
struct BlindingVectors {
    s_L: Vec<Scalar>,
    s_R: Vec<Scalar>,
}

impl BlindingVectors {
    fn random<R: RngCore + CryptoRng>(len: usize, rng: &mut R) -> Self {
        BlindingVectors {
            s_L: (0..len).map(|_| Scalar::random(&mut *rng)).collect(),
            s_R: (0..len).map(|_| Scalar::random(&mut *rng)).collect(),
        }
    }

    fn wipe(&mut self) {
        for e in self.s_L.iter_mut().chain(self.s_R.iter_mut()) {
            e.clear();
        }
    }
}

impl Drop for BlindingVectors {
    fn drop(&mut self) {
        self.wipe();
    }
}

impl<'a> RangeProver<'a> {
    /// Checks the inputs and commits to every value.
    pub fn new(
        config: &'a RangeProofConfig,
        gens: &'a Generators,
        values: &[u64],
        nonce: &'a Nonce,
        message: &[u8],
    ) -> Result<Self, ProofError> {
        if values.is_empty() {
            return Err(ProofError::InvalidInput("no values to prove".into()));
        }
        if values.len() > config.max_input_values {
            return Err(ProofError::InvalidInput(format!(
                "{} values exceed the limit of {}",
                values.len(),
                config.max_input_values
            )));
        }
        if message.len() > config.max_message_size {
            return Err(ProofError::InvalidInput(format!(
                "message of {} bytes exceeds the limit of {}",
                message.len(),
                config.max_message_size
            )));
        }

        let m = util::next_power_of_two(values.len());
        let n = INPUT_VALUE_BITS;

        let gammas: Vec<Scalar> = (0..values.len()).map(|i| nonce.gamma(i)).collect();
        let V_vec = values
            .iter()
            .zip(gammas.iter())
            .map(|(v, gamma)| {
                RistrettoPoint::multiscalar_mul(&[*gamma, Scalar::from(*v)], &[gens.H(), gens.G()])
                    .compress()
            })
            .collect();

        // Bits are least significant first; padding slots hold zero.
        let mut a_L = Vec::with_capacity(n * m);
        for j in 0..m {
            let v = values.get(j).cloned().unwrap_or(0);
            for i in 0..n {
                a_L.push(Scalar::from((v >> i) & 1));
            }
        }
        let a_R = a_L.iter().map(|bit| bit - Scalar::one()).collect();

        let secrets = Secrets {
            gammas,
            a_L,
            a_R,
            alpha: nonce.alpha() + message::prefix_scalar(values[0], message),
            rho: nonce.rho(),
            tau1: nonce.tau1() + message::suffix_scalar(message),
            tau2: nonce.tau2(),
        };

        Ok(RangeProver {
            config,
            gens,
            nonce,
            V_vec,
            m,
            secrets,
        })
    }

    /// Runs proving attempts on a fresh transcript until one succeeds
    /// or the configured number of attempts is spent.
    ///
    /// The transcript is not reset between attempts, so a retry draws
    /// challenges from a state that already absorbed the failed attempt.
    pub fn prove<T: RngCore + CryptoRng>(self, rng: &mut T) -> Result<RangeProof, ProofError> {
        let mut transcript = Transcript::new(TRANSCRIPT_LABEL);
        transcript.rangeproof_domain_sep(INPUT_VALUE_BITS as u64, self.V_vec.len() as u64);
        for V in self.V_vec.iter() {
            transcript.commit_point(b"V", V);
        }

        let mut rng = transcript
            .build_rng()
            .commit_witness_bytes(b"nonce", self.nonce.as_bytes())
            .finalize(rng);

        for attempt in 0..self.config.max_prove_tries {
            if let Some(proof) = self.attempt(&mut transcript, &mut rng)? {
                return Ok(proof);
            }
            debug!(
                "range proof attempt {} hit a zero challenge, retrying",
                attempt + 1
            );
        }

        warn!(
            "giving up on range proof after {} attempts",
            self.config.max_prove_tries
        );
        Err(ProofError::ProofConstructionExhausted)
    }

    /// One pass of the protocol from the bit commitment onwards.
    /// Returns `Ok(None)` when a challenge is zero.
    fn attempt(
        &self,
        transcript: &mut Transcript,
        rng: &mut TranscriptRng,
    ) -> Result<Option<RangeProof>, ProofError> {
        let n = INPUT_VALUE_BITS;
        let nm = n * self.m;
        let secrets = &self.secrets;
        let G = self.gens.G();
        let H = self.gens.H();
        let Gi = self.gens.Gi(nm);
        let Hi = self.gens.Hi(nm);

        let A = RistrettoPoint::multiscalar_mul(
            iter::once(&secrets.alpha)
                .chain(secrets.a_L.iter())
                .chain(secrets.a_R.iter()),
            iter::once(&H).chain(Gi.iter()).chain(Hi.iter()),
        )
        .compress();

        let blinding = BlindingVectors::random(nm, rng);

        let S = RistrettoPoint::multiscalar_mul(
            iter::once(&secrets.rho)
                .chain(blinding.s_L.iter())
                .chain(blinding.s_R.iter()),
            iter::once(&H).chain(Gi.iter()).chain(Hi.iter()),
        )
        .compress();

        transcript.commit_point(b"A", &A);
        transcript.commit_point(b"S", &S);
        let y = transcript.challenge_scalar(b"y");
        if y == Scalar::zero() {
            return Ok(None);
        }
        transcript.commit_scalar(b"y", &y);
        let z = transcript.challenge_scalar(b"z");
        if z == Scalar::zero() {
            return Ok(None);
        }
        transcript.commit_scalar(b"z", &z);

        // l(x) = (a_L - z 1) + s_L x
        // r(x) = y^nm o (a_R + z 1 + s_R x) + z^(2+j) 2^n in block j
        let mut l_poly = VecPoly1::zero(nm);
        let mut r_poly = VecPoly1::zero(nm);

        let two_pows = &util::bit_constants().two_pows;
        let mut exp_y = Scalar::one();
        let mut exp_z = z * z;
        for j in 0..self.m {
            for i in 0..n {
                let k = j * n + i;
                l_poly.0[k] = secrets.a_L[k] - z;
                l_poly.1[k] = blinding.s_L[k];
                r_poly.0[k] = exp_y * (secrets.a_R[k] + z) + exp_z * two_pows[i];
                r_poly.1[k] = exp_y * blinding.s_R[k];
                exp_y *= y;
            }
            exp_z *= z;
        }

        let t_poly = l_poly.inner_product(&r_poly);

        let T_1 = RistrettoPoint::multiscalar_mul(&[t_poly.1, secrets.tau1], &[G, H]).compress();
        let T_2 = RistrettoPoint::multiscalar_mul(&[t_poly.2, secrets.tau2], &[G, H]).compress();

        transcript.commit_point(b"T_1", &T_1);
        transcript.commit_point(b"T_2", &T_2);
        let x = transcript.challenge_scalar(b"x");
        if x == Scalar::zero() {
            return Ok(None);
        }

        let l_vec = l_poly.eval(x);
        let r_vec = r_poly.eval(x);
        let t_x = util::inner_product(&l_vec, &r_vec);
        if t_x != t_poly.eval(x) {
            return Err(ProofError::ProverInternalError);
        }

        let t_x_blinding = util::exp_iter(z)
            .skip(2)
            .zip(secrets.gammas.iter())
            .fold(secrets.tau2 * x * x + secrets.tau1 * x, |acc, (z_j, gamma)| {
                acc + z_j * gamma
            });
        let e_blinding = secrets.alpha + secrets.rho * x;

        transcript.commit_scalar(b"x", &x);
        transcript.commit_scalar(b"t_x_blinding", &t_x_blinding);
        transcript.commit_scalar(b"e_blinding", &e_blinding);
        transcript.commit_scalar(b"t_x", &t_x);
        let x_ip = transcript.challenge_scalar(b"x_ip");
        if x_ip == Scalar::zero() {
            return Ok(None);
        }

        let Q = G * x_ip;
        let y_inv = y.invert();
        let Hprime_factors: Vec<Scalar> = util::exp_iter(y_inv).take(nm).collect();

        let ipp_proof = match InnerProductProof::create(
            transcript,
            &Q,
            &Hprime_factors,
            Gi.to_vec(),
            Hi.to_vec(),
            l_vec,
            r_vec,
        ) {
            Some(proof) => proof,
            None => return Ok(None),
        };

        Ok(Some(RangeProof {
            V_vec: self.V_vec.clone(),
            A,
            S,
            T_1,
            T_2,
            t_x,
            t_x_blinding,
            e_blinding,
            ipp_proof,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use curve25519_dalek::constants::RISTRETTO_BASEPOINT_POINT;
    use generators::{AssetId, GeneratorsFactory};
    use rand::thread_rng;

    fn setup() -> (RangeProofConfig, Generators, Nonce) {
        let config = RangeProofConfig {
            max_input_values: 4,
            ..RangeProofConfig::default()
        };
        let gens = GeneratorsFactory::new(config.generators_capacity())
            .get_instance(&AssetId::from_label(b"prover"));
        let nonce = Nonce::from(RISTRETTO_BASEPOINT_POINT * Scalar::from(11u64));
        (config, gens, nonce)
    }

    #[test]
    fn rejects_out_of_policy_inputs() {
        let (config, gens, nonce) = setup();

        let empty = RangeProver::new(&config, &gens, &[], &nonce, b"");
        assert!(match empty {
            Err(ProofError::InvalidInput(_)) => true,
            _ => false,
        });

        let too_many = RangeProver::new(&config, &gens, &[1, 2, 3, 4, 5], &nonce, b"");
        assert!(too_many.is_err());

        let long_message = [1u8; 55];
        assert!(RangeProver::new(&config, &gens, &[1], &nonce, &long_message).is_err());
    }

    #[test]
    fn commitments_open_with_nonce_blindings() {
        let (config, gens, nonce) = setup();
        let prover = RangeProver::new(&config, &gens, &[3, 4, 5], &nonce, b"").unwrap();

        assert_eq!(prover.m, 4);
        assert_eq!(prover.V_vec.len(), 3);
        for (j, v) in [3u64, 4, 5].iter().enumerate() {
            let expected = (gens.H() * nonce.gamma(j) + gens.G() * Scalar::from(*v)).compress();
            assert_eq!(prover.V_vec[j], expected);
        }
    }

    #[test]
    fn bit_vectors_encode_values_lsb_first() {
        let (config, gens, nonce) = setup();
        let prover = RangeProver::new(&config, &gens, &[6, u64::max_value()], &nonce, b"").unwrap();
        let a_L = &prover.secrets.a_L;

        assert_eq!(a_L.len(), 2 * INPUT_VALUE_BITS);
        assert_eq!(a_L[0], Scalar::zero());
        assert_eq!(a_L[1], Scalar::one());
        assert_eq!(a_L[2], Scalar::one());
        assert_eq!(a_L[3], Scalar::zero());
        assert!(a_L[64..].iter().all(|b| *b == Scalar::one()));
        assert!(prover
            .secrets
            .a_R
            .iter()
            .zip(a_L.iter())
            .all(|(r, l)| *r == *l - Scalar::one()));
    }

    #[test]
    fn blinding_vectors_are_wiped() {
        let mut rng = Transcript::new(b"blinding")
            .build_rng()
            .finalize(&mut thread_rng());
        let mut blinding = BlindingVectors::random(8, &mut rng);
        assert_eq!(blinding.s_L.len(), 8);
        assert_eq!(blinding.s_R.len(), 8);
        assert!(blinding.s_L.iter().any(|s| *s != Scalar::zero()));

        blinding.wipe();
        assert!(blinding
            .s_L
            .iter()
            .chain(blinding.s_R.iter())
            .all(|s| *s == Scalar::zero()));
    }

    #[test]
    fn zero_attempts_exhausts() {
        let (mut config, gens, nonce) = setup();
        config.max_prove_tries = 0;
        let prover = RangeProver::new(&config, &gens, &[1], &nonce, b"").unwrap();
        assert_eq!(
            prover.prove(&mut thread_rng()).unwrap_err(),
            ProofError::ProofConstructionExhausted
        );
    }

    #[test]
    fn proof_has_expected_shape() {
        let (config, gens, nonce) = setup();
        let proof = RangeProver::new(&config, &gens, &[1, 2, 3], &nonce, b"shape")
            .unwrap()
            .prove(&mut thread_rng())
            .unwrap();
        assert_eq!(proof.V_vec.len(), 3);
        assert_eq!(proof.ipp_proof.L_vec.len(), 8);
        assert!(proof.check_size(&config).is_ok());
    }
}
