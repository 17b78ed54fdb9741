//! Opening the first commitment of a proof with the nonce it was built from.

#![allow(non_snake_case)]

use curve25519_dalek::ristretto::RistrettoPoint;
use curve25519_dalek::scalar::Scalar;
use curve25519_dalek::traits::MultiscalarMul;
use merlin::Transcript;
use subtle::ConstantTimeEq;

use config::RangeProofConfig;
use errors::ProofError;
use nonce::Nonce;
use util;

use super::message;
use super::{RangeProof, TRANSCRIPT_LABEL};

/// A proof paired with the nonce its owner believes it was built from.
#[derive(Clone, Debug)]
pub struct RecoveryRequest<'a> {
    /// Caller-chosen label, copied into the result.
    pub index: usize,
    /// The proof to open.
    pub proof: &'a RangeProof,
    /// Candidate nonce.
    pub nonce: Nonce,
}

impl<'a> RecoveryRequest<'a> {
    /// Creates a request for `proof` under `nonce`.
    pub fn new(index: usize, proof: &'a RangeProof, nonce: Nonce) -> Self {
        RecoveryRequest {
            index,
            proof,
            nonce,
        }
    }
}

/// The opening of the first commitment of a proof.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecoveredValue {
    /// Index of the request this was recovered from.
    pub index: usize,
    /// The first committed value.
    pub amount: u64,
    /// Blinding factor of the first commitment.
    pub gamma: Scalar,
    /// The embedded message, without trailing zero bytes.
    pub message: Vec<u8>,
}

/// `G` and `H` are the value and blinding bases of the proofs' asset.
pub(crate) fn recover(
    config: &RangeProofConfig,
    G: &RistrettoPoint,
    H: &RistrettoPoint,
    requests: &[RecoveryRequest],
) -> Vec<RecoveredValue> {
    requests
        .iter()
        .filter_map(|request| match recover_one(config, G, H, request) {
            Ok(recovered) => recovered,
            Err(e) => {
                trace!("skipping recovery candidate {}: {}", request.index, e);
                None
            }
        })
        .collect()
}

/// Returns `Ok(None)` when the nonce does not open the first commitment.
fn recover_one(
    config: &RangeProofConfig,
    G: &RistrettoPoint,
    H: &RistrettoPoint,
    request: &RecoveryRequest,
) -> Result<Option<RecoveredValue>, ProofError> {
    let proof = request.proof;
    let nonce = &request.nonce;
    let ipp = &proof.ipp_proof;
    if proof.V_vec.is_empty() || ipp.L_vec.is_empty() || ipp.L_vec.len() != ipp.R_vec.len() {
        return Err(ProofError::InvalidProofSize);
    }
    if proof.V_vec.len() > config.max_input_values {
        return Err(ProofError::InvalidProofSize);
    }

    let mut transcript = Transcript::new(TRANSCRIPT_LABEL);
    let challenges = proof.replay_challenges(&mut transcript)?;
    let (z, x) = (challenges.z, challenges.x);

    // mu = alpha + rho x, with alpha carrying v0 || message prefix
    let packed = proof.e_blinding - nonce.rho() * x - nonce.alpha();
    let (amount, prefix) = message::split_prefix(&packed);

    let gamma = nonce.gamma(0);
    let expected = RistrettoPoint::multiscalar_mul(&[gamma, Scalar::from(amount)], &[*H, *G])
        .compress();
    if !bool::from(expected.as_bytes()[..].ct_eq(&proof.V_vec[0].as_bytes()[..])) {
        trace!("nonce of candidate {} does not open its commitment", request.index);
        return Ok(None);
    }

    // tau_x = tau2 x^2 + tau1 x + sum_j z^(j+2) gamma_j
    let gammas_term = util::exp_iter(z)
        .skip(2)
        .take(proof.V_vec.len())
        .enumerate()
        .fold(Scalar::zero(), |acc, (j, z_j)| acc + z_j * nonce.gamma(j));
    let tau1 = (proof.t_x_blinding - nonce.tau2() * x * x - gammas_term) * x.invert();
    let suffix = tau1 - nonce.tau1();

    Ok(Some(RecoveredValue {
        index: request.index,
        amount,
        gamma,
        message: message::join(&prefix, &suffix),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use curve25519_dalek::constants::RISTRETTO_BASEPOINT_POINT;
    use generators::{AssetId, Generators, GeneratorsFactory};
    use rand::thread_rng;
    use range_proof::prover::RangeProver;

    fn setup() -> (RangeProofConfig, Generators) {
        let config = RangeProofConfig {
            max_input_values: 4,
            ..RangeProofConfig::default()
        };
        let gens = GeneratorsFactory::new(config.generators_capacity())
            .get_instance(&AssetId::from_label(b"recovery"));
        (config, gens)
    }

    fn nonce(k: u64) -> Nonce {
        Nonce::from(RISTRETTO_BASEPOINT_POINT * Scalar::from(k))
    }

    fn prove(
        config: &RangeProofConfig,
        gens: &Generators,
        values: &[u64],
        nonce: &Nonce,
        message: &[u8],
    ) -> RangeProof {
        RangeProver::new(config, gens, values, nonce, message)
            .unwrap()
            .prove(&mut thread_rng())
            .unwrap()
    }

    #[test]
    fn recovers_value_gamma_and_message() {
        let (config, gens) = setup();
        let proof = prove(&config, &gens, &[123456789], &nonce(5), b"payment #42");

        let requests = [RecoveryRequest::new(9, &proof, nonce(5))];
        let recovered = recover(&config, &gens.G(), &gens.H(), &requests);
        assert_eq!(
            recovered,
            vec![RecoveredValue {
                index: 9,
                amount: 123456789,
                gamma: nonce(5).gamma(0),
                message: b"payment #42".to_vec(),
            }]
        );
    }

    #[test]
    fn recovers_first_value_of_an_aggregate() {
        let (config, gens) = setup();
        let message: Vec<u8> = (b'a'..=b'z').chain(b'A'..=b'Z').collect();
        let proof = prove(&config, &gens, &[77, 88, 99], &nonce(6), &message);

        let requests = [RecoveryRequest::new(0, &proof, nonce(6))];
        let recovered = recover(&config, &gens.G(), &gens.H(), &requests);
        assert_eq!(recovered.len(), 1);
        assert_eq!(recovered[0].amount, 77);
        assert_eq!(recovered[0].message, message);
    }

    #[test]
    fn wrong_nonce_and_malformed_candidates_are_skipped() {
        let (config, gens) = setup();
        let proof = prove(&config, &gens, &[1000], &nonce(7), b"");

        let mut no_rounds = proof.clone();
        no_rounds.ipp_proof.L_vec.clear();
        no_rounds.ipp_proof.R_vec.clear();

        let mut no_values = proof.clone();
        no_values.V_vec.clear();

        let recovered = recover(
            &config,
            &gens.G(),
            &gens.H(),
            &[
                RecoveryRequest::new(0, &proof, nonce(8)),
                RecoveryRequest::new(1, &no_rounds, nonce(7)),
                RecoveryRequest::new(2, &no_values, nonce(7)),
                RecoveryRequest::new(3, &proof, nonce(7)),
            ],
        );
        assert_eq!(recovered.len(), 1);
        assert_eq!(recovered[0].index, 3);
        assert_eq!(recovered[0].amount, 1000);
        assert!(recovered[0].message.is_empty());
    }
}
