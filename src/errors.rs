//! Errors related to proving, verifying and parsing range proofs.

/// Represents an error in proof creation, verification, or parsing.
///
/// `InvalidInput` and the size/format variants describe a caller mistake.
/// `BatchRejected` is the only variant meaning "the proofs are
/// cryptographically invalid".
#[derive(Fail, Clone, Debug, Eq, PartialEq)]
pub enum ProofError {
    /// The values, message or configuration passed to the prover are out of policy.
    #[fail(display = "Invalid input: {}", _0)]
    InvalidInput(String),
    /// Every proving attempt hit a zero challenge.
    #[fail(display = "Exceeded the maximum number of proving attempts.")]
    ProofConstructionExhausted,
    /// The prover's polynomial evaluation did not match its coefficients.
    #[fail(display = "Internal prover error: t(x) does not match <l(x), r(x)>.")]
    ProverInternalError,
    /// A proof in the batch has an empty, oversized or inconsistent shape.
    #[fail(display = "Proof has an invalid number of commitments or rounds.")]
    InvalidProofSize,
    /// Proof data could not be parsed or a point failed to decompress.
    #[fail(display = "Proof data could not be parsed.")]
    FormatError,
    /// The aggregated verification equation did not hold.
    #[fail(display = "Range proof batch verification failed.")]
    BatchRejected,
}
