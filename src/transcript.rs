//! Defines a `TranscriptProtocol` trait for using a Merlin transcript.

use curve25519_dalek::ristretto::CompressedRistretto;
use curve25519_dalek::scalar::Scalar;
use merlin::Transcript;

pub trait TranscriptProtocol {
    /// Commit a domain separator for an `n`-bit, `m`-value range proof.
    fn rangeproof_domain_sep(&mut self, n: u64, m: u64);
    /// Commit a domain separator for a length-`n` inner-product proof.
    fn innerproduct_domain_sep(&mut self, n: u64);
    /// Commit a `scalar` with the given `label`.
    fn commit_scalar(&mut self, label: &'static [u8], scalar: &Scalar);
    /// Commit a `point` with the given `label`.
    fn commit_point(&mut self, label: &'static [u8], point: &CompressedRistretto);
    /// Compute a `label`ed challenge variable.
    fn challenge_scalar(&mut self, label: &'static [u8]) -> Scalar;
}

impl TranscriptProtocol for Transcript {
    fn rangeproof_domain_sep(&mut self, n: u64, m: u64) {
        self.commit_bytes(b"dom-sep", b"asset-rangeproof v1");
        Transcript::commit_u64(self, b"n", n);
        Transcript::commit_u64(self, b"m", m);
    }

    fn innerproduct_domain_sep(&mut self, n: u64) {
        self.commit_bytes(b"dom-sep", b"ipp v1");
        Transcript::commit_u64(self, b"n", n);
    }

    fn commit_scalar(&mut self, label: &'static [u8], scalar: &Scalar) {
        self.commit_bytes(label, scalar.as_bytes());
    }

    fn commit_point(&mut self, label: &'static [u8], point: &CompressedRistretto) {
        self.commit_bytes(label, point.as_bytes());
    }

    fn challenge_scalar(&mut self, label: &'static [u8]) -> Scalar {
        let mut buf = [0u8; 64];
        self.challenge_bytes(label, &mut buf);

        Scalar::from_bytes_mod_order_wide(&buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use curve25519_dalek::constants::RISTRETTO_BASEPOINT_COMPRESSED;

    #[test]
    fn identical_transcripts_give_identical_challenges() {
        let mut t1 = Transcript::new(b"test");
        let mut t2 = Transcript::new(b"test");
        t1.rangeproof_domain_sep(64, 1);
        t2.rangeproof_domain_sep(64, 1);
        t1.commit_point(b"V", &RISTRETTO_BASEPOINT_COMPRESSED);
        t2.commit_point(b"V", &RISTRETTO_BASEPOINT_COMPRESSED);

        assert_eq!(t1.challenge_scalar(b"y"), t2.challenge_scalar(b"y"));
    }

    #[test]
    fn absorption_order_changes_challenges() {
        let a = Scalar::from(1u64);
        let b = Scalar::from(2u64);

        let mut t1 = Transcript::new(b"test");
        t1.commit_scalar(b"s", &a);
        t1.commit_scalar(b"s", &b);

        let mut t2 = Transcript::new(b"test");
        t2.commit_scalar(b"s", &b);
        t2.commit_scalar(b"s", &a);

        assert_ne!(t1.challenge_scalar(b"x"), t2.challenge_scalar(b"x"));
    }

    #[test]
    fn domain_separators_bind_sizes() {
        let mut one = Transcript::new(b"test");
        one.rangeproof_domain_sep(64, 1);
        let mut two = Transcript::new(b"test");
        two.rangeproof_domain_sep(64, 2);
        assert_ne!(one.challenge_scalar(b"y"), two.challenge_scalar(b"y"));

        let mut short = Transcript::new(b"test");
        short.innerproduct_domain_sep(64);
        let mut long = Transcript::new(b"test");
        long.innerproduct_domain_sep(128);
        assert_ne!(short.challenge_scalar(b"u"), long.challenge_scalar(b"u"));
    }
}
