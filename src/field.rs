//! Arithmetic in GF(2^255-19) shared by the limb backends.
//!
//! A backend supplies the limb-level primitives (conversion to and from
//! bytes, addition, subtraction, multiplication, squaring and a masked
//! conditional assignment). Everything built from those primitives lives
//! here as provided methods, so both limb widths run the exact same
//! exponentiation chains and square-root logic.

use crate::util::fixed_time_eq;
use core::ops::{Add, Mul, Neg, Sub};

/// The contract every field backend fulfils.
///
/// Values are kept lazily reduced between operations; `to_bytes` is the only
/// place a canonical representative in `[0, p)` is produced. Every method is
/// constant-time with respect to the field values involved. Flags are `u8`
/// values that are either `0` or `1`.
pub trait FieldArithmetic:
    Copy
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Neg<Output = Self>
{
    fn zero() -> Self;

    fn one() -> Self;

    /// Interprets 255 little-endian bits (the top bit of `s[31]` is
    /// ignored). Values in `[p, 2^255)` are accepted and reduced implicitly.
    fn from_bytes(s: &[u8; 32]) -> Self;

    /// The canonical little-endian encoding of the value, in `[0, p)`.
    fn to_bytes(&self) -> [u8; 32];

    fn square(&self) -> Self;

    /// `2 * self^2`
    fn square_and_double(&self) -> Self;

    /// Replaces `self` with `other` if `flag == 1`, leaves it if `flag == 0`.
    fn maybe_set(&mut self, other: &Self, flag: u8);

    /// `self^(2^n)`
    fn square_n(&self, n: usize) -> Self {
        (0..n).fold(*self, |x, _| x.square())
    }

    /// `self^(p-2)`, the multiplicative inverse. Maps zero to zero.
    fn invert(&self) -> Self {
        let (z_250_0, z11) = pow22501(self);
        // p-2 = (2^250-1)*2^5 + 11
        z_250_0.square_n(5) * z11
    }

    /// `self^((p-5)/8)`, the core of the square-root computations.
    fn pow22523(&self) -> Self {
        let (z_250_0, _) = pow22501(self);
        // (p-5)/8 = (2^250-1)*2^2 + 1
        z_250_0.square_n(2) * *self
    }

    /// Legendre symbol `self^((p-1)/2)`: one for nonzero squares, `-1` for
    /// non-squares, zero for zero.
    fn chi(&self) -> Self {
        let (z_250_0, _) = pow22501(self);
        let z3 = self.square() * *self;
        // (p-1)/2 = (2^250-1)*2^4 + 6
        z_250_0.square_n(4) * z3.square()
    }

    fn is_zero(&self) -> u8 {
        fixed_time_eq(&self.to_bytes(), &[0u8; 32]) as u8
    }

    /// The low bit of the canonical encoding.
    fn is_negative(&self) -> u8 {
        self.to_bytes()[0] & 1
    }

    fn ct_eq(&self, other: &Self) -> u8 {
        fixed_time_eq(&self.to_bytes(), &other.to_bytes()) as u8
    }

    fn maybe_negate(&mut self, flag: u8) {
        let negated = -*self;
        self.maybe_set(&negated, flag);
    }

    /// The non-negative one of `self` and `-self`.
    fn abs(&self) -> Self {
        let mut r = *self;
        r.maybe_negate(self.is_negative());
        r
    }

    /// Non-negative square root of `u/v`.
    ///
    /// Returns `(1, sqrt(u/v))` when `u/v` is a square, `(1, 0)` when
    /// `u == 0`, `(0, 0)` when `v == 0` and `u != 0`, and
    /// `(0, sqrt(i*u/v))` otherwise, where `i = sqrt(-1)`.
    fn sqrt_ratio_m1(u: &Self, v: &Self, sqrtm1: &Self) -> (u8, Self) {
        let v3 = v.square() * *v;
        let uv7 = v3.square() * *v * *u;
        let mut x = uv7.pow22523() * v3 * *u;

        let vxx = x.square() * *v;
        let has_m_root = (vxx - *u).is_zero();
        let has_p_root = (vxx + *u).is_zero();
        let has_f_root = (vxx + *u * *sqrtm1).is_zero();
        let x_sqrtm1 = x * *sqrtm1;
        x.maybe_set(&x_sqrtm1, has_p_root | has_f_root);

        (has_m_root | has_p_root, x.abs())
    }
}

// Returns `(z^(2^250-1), z^11)`, the shared prefix of every fixed
// exponentiation chain above.
fn pow22501<F: FieldArithmetic>(z: &F) -> (F, F) {
    let z2 = z.square();
    let z8 = z2.square_n(2);
    let z9 = *z * z8;
    let z11 = z2 * z9;
    let z22 = z11.square();
    let z_5_0 = z9 * z22;
    let z_10_0 = z_5_0.square_n(5) * z_5_0;
    let z_20_0 = z_10_0.square_n(10) * z_10_0;
    let z_40_0 = z_20_0.square_n(20) * z_20_0;
    let z_50_0 = z_40_0.square_n(10) * z_10_0;
    let z_100_0 = z_50_0.square_n(50) * z_50_0;
    let z_200_0 = z_100_0.square_n(100) * z_100_0;
    let z_250_0 = z_200_0.square_n(50) * z_50_0;
    (z_250_0, z11)
}

#[cfg(test)]
pub(crate) mod tests {
    //! Property checks run unchanged against every backend.

    use super::FieldArithmetic;
    use hex_literal::hex;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    // p = 2^255 - 19
    pub const P_BYTES: [u8; 32] =
        hex!("edffffffffffffffffffffffffffffffffffffffffffffffffffffffffffff7f");
    const SQRTM1_BYTES: [u8; 32] =
        hex!("b0a00e4a271beec478e42fad0618432fa7d7fb3d99004d2b0bdfc14f8024832b");

    fn random_bytes(rng: &mut StdRng) -> [u8; 32] {
        let mut e = [0u8; 32];
        rng.fill(&mut e);
        e[31] &= 127;
        e
    }

    fn from_u64<F: FieldArithmetic>(n: u64) -> F {
        let mut s = [0u8; 32];
        s[..8].copy_from_slice(&n.to_le_bytes());
        F::from_bytes(&s)
    }

    pub fn check_all<F: FieldArithmetic>() {
        canonical_round_trip::<F>();
        boundary_encodings::<F>();
        add_laws::<F>();
        mul_laws::<F>();
        invert_laws::<F>();
        square_matches_mul::<F>();
        chained_additions_stay_in_bounds::<F>();
        select_and_negate::<F>();
        legendre_symbol::<F>();
        square_roots::<F>();
    }

    fn canonical_round_trip<F: FieldArithmetic>() {
        let mut rng = StdRng::seed_from_u64(1289);
        for _ in 0..50 {
            let mut e = random_bytes(&mut rng);
            // keep it below p
            e[31] &= 63;
            assert_eq!(F::from_bytes(&e).to_bytes(), e);
        }
    }

    fn boundary_encodings<F: FieldArithmetic>() {
        // p encodes zero, p + 1 encodes one, 2^255 - 1 encodes 18
        assert_eq!(F::from_bytes(&P_BYTES).to_bytes(), [0u8; 32]);
        let mut p_plus_one = P_BYTES;
        p_plus_one[0] += 1;
        assert_eq!(F::from_bytes(&p_plus_one).to_bytes(), F::one().to_bytes());
        let all_ones = [0xffu8; 32];
        assert_eq!(
            F::from_bytes(&all_ones).to_bytes(),
            from_u64::<F>(18).to_bytes()
        );
        // the top bit is not part of the value
        let mut one_with_top_bit = [0u8; 32];
        one_with_top_bit[0] = 1;
        one_with_top_bit[31] = 0x80;
        assert_eq!(F::from_bytes(&one_with_top_bit).to_bytes(), F::one().to_bytes());
        // p - 1 survives unchanged
        let mut p_minus_one = P_BYTES;
        p_minus_one[0] -= 1;
        assert_eq!(F::from_bytes(&p_minus_one).to_bytes(), p_minus_one);
        assert_eq!((-F::one()).to_bytes(), p_minus_one);
    }

    fn add_laws<F: FieldArithmetic>() {
        let mut rng = StdRng::seed_from_u64(761);
        for _ in 0..40 {
            let a = F::from_bytes(&random_bytes(&mut rng));
            let b = F::from_bytes(&random_bytes(&mut rng));
            let c = F::from_bytes(&random_bytes(&mut rng));
            assert_eq!((a + b).to_bytes(), (b + a).to_bytes());
            assert_eq!(((a + b) + c).to_bytes(), (a + (b + c)).to_bytes());
            assert_eq!((a - a).to_bytes(), [0u8; 32]);
            assert_eq!((a + F::zero()).to_bytes(), a.to_bytes());
            assert_eq!(((a - b) + b).to_bytes(), a.to_bytes());
            assert_eq!((a + (-a)).is_zero(), 1);
        }
    }

    fn mul_laws<F: FieldArithmetic>() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..40 {
            let a = F::from_bytes(&random_bytes(&mut rng));
            let b = F::from_bytes(&random_bytes(&mut rng));
            let c = F::from_bytes(&random_bytes(&mut rng));
            assert_eq!((a * b).to_bytes(), (b * a).to_bytes());
            assert_eq!(((a * b) * c).to_bytes(), (a * (b * c)).to_bytes());
            assert_eq!((a * (b + c)).to_bytes(), (a * b + a * c).to_bytes());
            assert_eq!((a * F::one()).to_bytes(), a.to_bytes());
        }
        assert_eq!((from_u64::<F>(6) * from_u64::<F>(7)).to_bytes(), from_u64::<F>(42).to_bytes());
    }

    fn invert_laws<F: FieldArithmetic>() {
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..20 {
            let a = F::from_bytes(&random_bytes(&mut rng));
            assert_eq!(a.is_zero(), 0);
            assert_eq!((a * a.invert()).to_bytes(), F::one().to_bytes());
            assert_eq!(a.invert().invert().to_bytes(), a.to_bytes());
        }
        assert_eq!(F::zero().invert().is_zero(), 1);
    }

    fn square_matches_mul<F: FieldArithmetic>() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..40 {
            let a = F::from_bytes(&random_bytes(&mut rng));
            assert_eq!(a.square().to_bytes(), (a * a).to_bytes());
            assert_eq!(a.square_and_double().to_bytes(), (a * a + a * a).to_bytes());
            assert_eq!(a.square_n(3).to_bytes(), (a * a).square().square().to_bytes());
        }
    }

    // Sums and differences of fully reduced values are the largest inputs the
    // group law feeds into `mul`; results must still be exact.
    fn chained_additions_stay_in_bounds<F: FieldArithmetic>() {
        let max = F::from_bytes(&[0xffu8; 32]);
        let m1 = -F::one();
        let sum = (m1 + m1) + (m1 + m1);
        assert_eq!(sum.to_bytes(), (-from_u64::<F>(4)).to_bytes());
        let diff = F::zero() - sum;
        assert_eq!(diff.to_bytes(), from_u64::<F>(4).to_bytes());
        let prod = (max + max) * (m1 - max);
        // (2*18) * (-1 - 18) = -684
        assert_eq!(prod.to_bytes(), (-from_u64::<F>(684)).to_bytes());
        assert_eq!((sum * sum).to_bytes(), from_u64::<F>(16).to_bytes());
        assert_eq!((sum - m1 * sum).to_bytes(), (-from_u64::<F>(8)).to_bytes());
    }

    fn select_and_negate<F: FieldArithmetic>() {
        let a = from_u64::<F>(10);
        let b = from_u64::<F>(11);
        let mut r = a;
        r.maybe_set(&b, 0);
        assert_eq!(r.to_bytes(), a.to_bytes());
        r.maybe_set(&b, 1);
        assert_eq!(r.to_bytes(), b.to_bytes());

        let mut n = a;
        n.maybe_negate(0);
        assert_eq!(n.to_bytes(), a.to_bytes());
        n.maybe_negate(1);
        assert_eq!(n.to_bytes(), (-a).to_bytes());
        assert_eq!(n.is_negative(), 1);
        assert_eq!(n.abs().to_bytes(), a.to_bytes());
        assert_eq!(a.ct_eq(&from_u64::<F>(10)), 1);
        assert_eq!(a.ct_eq(&b), 0);
    }

    fn legendre_symbol<F: FieldArithmetic>() {
        assert_eq!(F::zero().chi().is_zero(), 1);
        assert_eq!(from_u64::<F>(4).chi().to_bytes(), F::one().to_bytes());
        // 2 is not a square modulo p since p = 5 (mod 8)
        assert_eq!(from_u64::<F>(2).chi().to_bytes(), (-F::one()).to_bytes());
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..10 {
            let a = F::from_bytes(&random_bytes(&mut rng));
            assert_eq!(a.square().chi().to_bytes(), F::one().to_bytes());
        }
    }

    fn square_roots<F: FieldArithmetic>() {
        let i = F::from_bytes(&SQRTM1_BYTES);
        assert_eq!(i.square().to_bytes(), (-F::one()).to_bytes());

        let (ok, r) = F::sqrt_ratio_m1(&from_u64::<F>(9), &from_u64::<F>(4), &i);
        assert_eq!(ok, 1);
        assert_eq!((r.square() * from_u64::<F>(4)).to_bytes(), from_u64::<F>(9).to_bytes());
        assert_eq!(r.is_negative(), 0);

        let (ok, r) = F::sqrt_ratio_m1(&F::zero(), &from_u64::<F>(5), &i);
        assert_eq!((ok, r.is_zero()), (1, 1));
        let (ok, r) = F::sqrt_ratio_m1(&F::one(), &F::zero(), &i);
        assert_eq!((ok, r.is_zero()), (0, 1));

        // 2 is a non-square, so the root of i*2 is returned
        let (ok, r) = F::sqrt_ratio_m1(&from_u64::<F>(2), &F::one(), &i);
        assert_eq!(ok, 0);
        assert_eq!(r.square().to_bytes(), (i * from_u64::<F>(2)).to_bytes());
    }
}
