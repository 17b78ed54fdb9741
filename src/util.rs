use clear_on_drop::clear::Clear;
use curve25519_dalek::scalar::Scalar;
use once_cell::sync::Lazy;

use config::INPUT_VALUE_BITS;

/// Represents a degree-1 vector polynomial \\(\mathbf{a} + \mathbf{b} \cdot x\\).
pub struct VecPoly1(pub Vec<Scalar>, pub Vec<Scalar>);

/// Represents a degree-2 scalar polynomial \\(a + b \cdot x + c \cdot x^2\\)
pub struct Poly2(pub Scalar, pub Scalar, pub Scalar);

/// Provides an iterator over the powers of a `Scalar`.
///
/// This struct is created by the `exp_iter` function.
pub struct ScalarExp {
    x: Scalar,
    next_exp_x: Scalar,
}

impl Iterator for ScalarExp {
    type Item = Scalar;

    fn next(&mut self) -> Option<Scalar> {
        let exp_x = self.next_exp_x;
        self.next_exp_x *= self.x;
        Some(exp_x)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (usize::max_value(), None)
    }
}

/// Return an iterator of the powers of `x`.
pub fn exp_iter(x: Scalar) -> ScalarExp {
    let next_exp_x = Scalar::one();
    ScalarExp { x, next_exp_x }
}

pub fn add_vec(a: &[Scalar], b: &[Scalar]) -> Vec<Scalar> {
    debug_assert_eq!(a.len(), b.len());
    let mut out = vec![Scalar::zero(); b.len()];
    for i in 0..a.len() {
        out[i] = a[i] + b[i];
    }
    out
}

impl VecPoly1 {
    pub fn zero(n: usize) -> Self {
        VecPoly1(vec![Scalar::zero(); n], vec![Scalar::zero(); n])
    }

    pub fn inner_product(&self, rhs: &VecPoly1) -> Poly2 {
        // Uses Karatsuba's method

        let l = self;
        let r = rhs;

        let t0 = inner_product(&l.0, &r.0);
        let t2 = inner_product(&l.1, &r.1);

        let l0_plus_l1 = add_vec(&l.0, &l.1);
        let r0_plus_r1 = add_vec(&r.0, &r.1);

        let t1 = inner_product(&l0_plus_l1, &r0_plus_r1) - t0 - t2;

        Poly2(t0, t1, t2)
    }

    pub fn eval(&self, x: Scalar) -> Vec<Scalar> {
        let n = self.0.len();
        let mut out = vec![Scalar::zero(); n];
        for i in 0..n {
            out[i] = self.0[i] + self.1[i] * x;
        }
        out
    }
}

impl Poly2 {
    pub fn eval(&self, x: Scalar) -> Scalar {
        self.0 + x * (self.1 + x * self.2)
    }
}

impl Drop for VecPoly1 {
    fn drop(&mut self) {
        for e in self.0.iter_mut() {
            e.clear();
        }
        for e in self.1.iter_mut() {
            e.clear();
        }
    }
}

impl Drop for Poly2 {
    fn drop(&mut self) {
        self.0.clear();
        self.1.clear();
        self.2.clear();
    }
}

/// Computes an inner product of two vectors
/// \\[
///    {\langle {\mathbf{a}}, {\mathbf{b}} \rangle} = \sum\_{i=0}^{n-1} a\_i \cdot b\_i.
/// \\]
/// Panics if the lengths of \\(\mathbf{a}\\) and \\(\mathbf{b}\\) are not equal.
pub fn inner_product(a: &[Scalar], b: &[Scalar]) -> Scalar {
    let mut out = Scalar::zero();
    if a.len() != b.len() {
        panic!("inner_product(a,b): lengths of vectors do not match");
    }
    for i in 0..a.len() {
        out += a[i] * b[i];
    }
    out
}

/// Takes the sum of all the powers of `x`, up to `n`
/// If `n` is a power of 2, it uses the efficient algorithm with `2*lg n` multiplcations and additions.
/// If `n` is not a power of 2, it uses the slow algorithm with `n` multiplications and additions.
/// In the Bulletproofs case, all calls to `sum_of_powers` should have `n` as a power of 2.
pub fn sum_of_powers(x: &Scalar, n: usize) -> Scalar {
    if !n.is_power_of_two() {
        return sum_of_powers_slow(x, n);
    }
    if n == 0 || n == 1 {
        return Scalar::from(n as u64);
    }
    let mut m = n;
    let mut result = Scalar::one() + x;
    let mut factor = *x;
    while m > 2 {
        factor = factor * factor;
        result = result + factor * result;
        m = m / 2;
    }
    result
}

// takes the sum of all of the powers of x, up to n
fn sum_of_powers_slow(x: &Scalar, n: usize) -> Scalar {
    exp_iter(*x).take(n).fold(Scalar::zero(), |acc, x| acc + x)
}

/// Powers of two for one value and their sum, shared by every proof.
pub struct BitConstants {
    /// \\(2^0, \ldots, 2^{n-1}\\) for \\(n\\) = `INPUT_VALUE_BITS`.
    pub two_pows: Vec<Scalar>,
    /// \\(\langle \mathbf{1}, \mathbf{2}^n \rangle = 2^n - 1\\).
    pub ones_dot_two_pows: Scalar,
}

static BIT_CONSTANTS: Lazy<BitConstants> = Lazy::new(|| {
    let two_pows: Vec<Scalar> = exp_iter(Scalar::from(2u64)).take(INPUT_VALUE_BITS).collect();
    let ones_dot_two_pows = two_pows.iter().fold(Scalar::zero(), |acc, p| acc + p);
    BitConstants {
        two_pows,
        ones_dot_two_pows,
    }
});

/// Returns the process-wide bit constants, computing them on first use.
pub fn bit_constants() -> &'static BitConstants {
    &BIT_CONSTANTS
}

/// Smallest power of two that is at least `n` (and at least 1).
pub fn next_power_of_two(n: usize) -> usize {
    if n <= 1 {
        1
    } else {
        n.next_power_of_two()
    }
}

/// Given `data` with `len >= 32`, return the first 32 bytes.
pub fn read32(data: &[u8]) -> [u8; 32] {
    let mut buf32 = [0u8; 32];
    buf32[..].copy_from_slice(&data[..32]);
    buf32
}

/// Encoding of a scalar without its trailing zero bytes.
pub fn trimmed_bytes(s: &Scalar) -> Vec<u8> {
    let bytes = s.to_bytes();
    let len = bytes.iter().rposition(|b| *b != 0).map_or(0, |i| i + 1);
    bytes[..len].to_vec()
}

/// Scalar whose little-endian encoding starts with `bytes` (at most 32) and is zero-padded.
pub fn scalar_from_padded_bytes(bytes: &[u8]) -> Scalar {
    let mut buf = [0u8; 32];
    buf[..bytes.len()].copy_from_slice(bytes);
    Scalar::from_bytes_mod_order(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exp_2_is_powers_of_2() {
        let exp_2: Vec<_> = exp_iter(Scalar::from(2u64)).take(4).collect();

        assert_eq!(exp_2[0], Scalar::from(1u64));
        assert_eq!(exp_2[1], Scalar::from(2u64));
        assert_eq!(exp_2[2], Scalar::from(4u64));
        assert_eq!(exp_2[3], Scalar::from(8u64));
    }

    #[test]
    fn test_inner_product() {
        let a = vec![
            Scalar::from(1u64),
            Scalar::from(2u64),
            Scalar::from(3u64),
            Scalar::from(4u64),
        ];
        let b = vec![
            Scalar::from(2u64),
            Scalar::from(3u64),
            Scalar::from(4u64),
            Scalar::from(5u64),
        ];
        assert_eq!(Scalar::from(40u64), inner_product(&a, &b));
    }

    #[test]
    fn vec_of_scalars_multiply() {
        let l = VecPoly1(
            vec![Scalar::from(1u64), Scalar::from(2u64)],
            vec![Scalar::from(3u64), Scalar::from(4u64)],
        );
        let r = VecPoly1(
            vec![Scalar::from(5u64), Scalar::from(6u64)],
            vec![Scalar::from(7u64), Scalar::from(8u64)],
        );
        let t = l.inner_product(&r);
        let x = Scalar::from(10u64);

        assert_eq!(t.eval(x), inner_product(&l.eval(x), &r.eval(x)));
        assert_eq!(t.0, Scalar::from(17u64));
    }

    #[test]
    fn test_sum_of_powers() {
        let x = Scalar::from(10u64);
        assert_eq!(sum_of_powers_slow(&x, 0), sum_of_powers(&x, 0));
        assert_eq!(sum_of_powers_slow(&x, 1), sum_of_powers(&x, 1));
        assert_eq!(sum_of_powers_slow(&x, 2), sum_of_powers(&x, 2));
        assert_eq!(sum_of_powers_slow(&x, 4), sum_of_powers(&x, 4));
        assert_eq!(sum_of_powers_slow(&x, 64), sum_of_powers(&x, 64));
        assert_eq!(sum_of_powers_slow(&x, 6), sum_of_powers(&x, 6));
    }

    #[test]
    fn bit_constants_sum_to_max_value() {
        let constants = bit_constants();
        assert_eq!(constants.two_pows.len(), INPUT_VALUE_BITS);
        assert_eq!(constants.two_pows[10], Scalar::from(1024u64));
        assert_eq!(
            constants.ones_dot_two_pows,
            Scalar::from(u64::max_value())
        );
    }

    #[test]
    fn bit_constants_are_initialised_once() {
        let handles: Vec<_> = (0..4)
            .map(|_| ::std::thread::spawn(|| bit_constants() as *const BitConstants as usize))
            .collect();
        let addrs: Vec<usize> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(addrs.windows(2).all(|w| w[0] == w[1]));
    }

    #[test]
    fn trimmed_bytes_drops_trailing_zeros() {
        let s = scalar_from_padded_bytes(b"abc");
        assert_eq!(trimmed_bytes(&s), b"abc".to_vec());
        assert!(trimmed_bytes(&Scalar::zero()).is_empty());
    }

    #[test]
    fn next_power_of_two_handles_small_inputs() {
        assert_eq!(next_power_of_two(0), 1);
        assert_eq!(next_power_of_two(1), 1);
        assert_eq!(next_power_of_two(3), 4);
        assert_eq!(next_power_of_two(16), 16);
    }
}
