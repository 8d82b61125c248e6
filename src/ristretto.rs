//! Ristretto255: the prime-order group obtained by quotienting
//! Edwards25519 by its 4-torsion.
//!
//! Every element is backed by an extended Edwards point; any two points
//! differing by a 4-torsion point are the same element, encode to the same
//! 32 bytes and compare equal. The byte encoding is unrelated to the
//! compressed Edwards encoding, so the two are never interchangeable.

use crate::{
    error::Error,
    field::FieldArithmetic,
    ge::{ge_scalarmult_base, GeP3},
    statics::{
        FE_D, FE_INVSQRTAMD, FE_ONE, FE_ONEMSQD, FE_SQDMONE, FE_SQRTADM1,
        FE_SQRTM1,
    },
    FieldElement,
};
use core::ops::{Add, Neg, Sub};
use rand::{CryptoRng, Error as RndError, RngCore};

/// An element of the Ristretto255 group.
#[derive(Clone, Copy, Debug)]
pub struct RistrettoPoint(pub(crate) GeP3);

/// Whether `s` is a canonical, non-negative field element encoding:
/// `s < p`, the low bit clear and the top bit clear.
fn is_canonical(s: &[u8; 32]) -> bool {
    let mut c = u32::from((s[31] & 0x7f) ^ 0x7f);
    for &si in s[1..31].iter() {
        c |= u32::from(si ^ 0xff);
    }
    c = (c.wrapping_sub(1)) >> 8;
    let d = (0xed - 1u32).wrapping_sub(u32::from(s[0])) >> 8;
    let e = u32::from(s[31] >> 7);

    ((c & d) | e | u32::from(s[0])) & 1 == 0
}

// The Elligator map from a field element to a group element, landing
// directly in the quotient group.
fn elligator(t: &FieldElement) -> GeP3 {
    let r = FE_SQRTM1 * t.square();
    let u = (r + FE_ONE) * FE_ONEMSQD;
    let mut c = -FE_ONE;
    let v = (c - r * FE_D) * (r + FE_D);

    let (was_square, mut s) = FieldElement::sqrt_ratio_m1(&u, &v, &FE_SQRTM1);
    let wasnt_square = 1 - was_square;
    let s_prime = -(s * *t).abs();
    s.maybe_set(&s_prime, wasnt_square);
    c.maybe_set(&r, wasnt_square);

    let n = c * (r - FE_ONE) * FE_SQDMONE - v;

    let w0 = (s + s) * v;
    let w1 = n * FE_SQRTADM1;
    let ss = s.square();
    let w2 = FE_ONE - ss;
    let w3 = FE_ONE + ss;

    GeP3 {
        x: w0 * w3,
        y: w2 * w1,
        z: w1 * w3,
        t: w0 * w2,
    }
}

impl RistrettoPoint {
    pub fn identity() -> RistrettoPoint {
        RistrettoPoint(GeP3::identity())
    }

    /// Decodes an element, rejecting every encoding other than the
    /// canonical one of its coset.
    pub fn from_bytes(s: &[u8; 32]) -> Result<RistrettoPoint, Error> {
        if !is_canonical(s) {
            return Err(Error::InvalidRistretto);
        }
        let s_ = FieldElement::from_bytes(s);
        let ss = s_.square();
        let u1 = FE_ONE - ss;
        let u1u1 = u1.square();
        let u2 = FE_ONE + ss;
        let u2u2 = u2.square();
        // v = -(d u1^2) - u2^2
        let v = -(FE_D * u1u1) - u2u2;
        let v_u2u2 = v * u2u2;

        let (was_square, inv_sqrt) =
            FieldElement::sqrt_ratio_m1(&FE_ONE, &v_u2u2, &FE_SQRTM1);
        let den_x = inv_sqrt * u2;
        let den_y = inv_sqrt * den_x * v;

        let x = (s_ * den_x + s_ * den_x).abs();
        let y = u1 * den_y;
        let t = x * y;

        if (1 - was_square) | t.is_negative() | y.is_zero() != 0 {
            return Err(Error::InvalidRistretto);
        }
        Ok(RistrettoPoint(GeP3 {
            x,
            y,
            z: FE_ONE,
            t,
        }))
    }

    /// The canonical encoding of the coset.
    pub fn to_bytes(&self) -> [u8; 32] {
        let GeP3 { x, y, z, t } = self.0;

        let u1 = (z + y) * (z - y);
        let u2 = x * y;
        let u1_u2u2 = u2.square() * u1;
        let (_, inv_sqrt) = FieldElement::sqrt_ratio_m1(&FE_ONE, &u1_u2u2, &FE_SQRTM1);
        let den1 = inv_sqrt * u1;
        let den2 = inv_sqrt * u2;
        let z_inv = den1 * den2 * t;

        let ix = x * FE_SQRTM1;
        let iy = y * FE_SQRTM1;
        let eden = den1 * FE_INVSQRTAMD;
        let rotate = (t * z_inv).is_negative();

        let mut x_ = x;
        let mut y_ = y;
        let mut den_inv = den2;
        x_.maybe_set(&iy, rotate);
        y_.maybe_set(&ix, rotate);
        den_inv.maybe_set(&eden, rotate);

        y_.maybe_negate((x_ * z_inv).is_negative());

        (den_inv * (z - y_)).abs().to_bytes()
    }

    /// Maps 64 uniformly random bytes (typically a hash output) to an
    /// element: each half is read as a field element with its top bit
    /// dropped, mapped, and the two results are added.
    pub fn from_hash(h: &[u8; 64]) -> RistrettoPoint {
        let mut r0 = [0u8; 32];
        let mut r1 = [0u8; 32];
        r0.copy_from_slice(&h[..32]);
        r1.copy_from_slice(&h[32..]);
        let p0 = elligator(&FieldElement::from_bytes(&r0));
        let p1 = elligator(&FieldElement::from_bytes(&r1));
        RistrettoPoint(p0.add_p3(&p1))
    }

    /// `a * self`, constant time.
    ///
    /// Preconditions:
    ///   `a[31] <= 127`
    pub fn scalarmult(&self, a: &[u8; 32]) -> RistrettoPoint {
        RistrettoPoint(self.0.scalarmult(a))
    }

    /// `a * B` for the Ed25519 base point B, constant time.
    ///
    /// Preconditions:
    ///   `a[31] <= 127`
    pub fn scalarmult_base(a: &[u8; 32]) -> RistrettoPoint {
        RistrettoPoint(ge_scalarmult_base(a))
    }

    /// Coset equality: `X1 Y2 == Y1 X2` or `Y1 Y2 == X1 X2`.
    pub fn ct_eq(&self, other: &RistrettoPoint) -> u8 {
        let GeP3 { x: x1, y: y1, .. } = self.0;
        let GeP3 { x: x2, y: y2, .. } = other.0;
        (x1 * y2).ct_eq(&(y1 * x2)) | (y1 * y2).ct_eq(&(x1 * x2))
    }
}

impl PartialEq for RistrettoPoint {
    fn eq(&self, other: &RistrettoPoint) -> bool {
        self.ct_eq(other) == 1
    }
}

impl Eq for RistrettoPoint {}

impl Add for RistrettoPoint {
    type Output = RistrettoPoint;

    fn add(self, rhs: RistrettoPoint) -> RistrettoPoint {
        RistrettoPoint(self.0.add_p3(&rhs.0))
    }
}

impl Sub for RistrettoPoint {
    type Output = RistrettoPoint;

    fn sub(self, rhs: RistrettoPoint) -> RistrettoPoint {
        RistrettoPoint(self.0.sub_p3(&rhs.0))
    }
}

impl Neg for RistrettoPoint {
    type Output = RistrettoPoint;

    fn neg(self) -> RistrettoPoint {
        RistrettoPoint(-self.0)
    }
}

/// Hash-to-group on bytes; see [`RistrettoPoint::from_hash`].
pub fn ristretto255_from_hash(h: &[u8; 64]) -> [u8; 32] {
    RistrettoPoint::from_hash(h).to_bytes()
}

/// Whether `s` is the canonical encoding of some element.
pub fn ristretto255_is_valid_point(s: &[u8; 32]) -> bool {
    RistrettoPoint::from_bytes(s).is_ok()
}

/// A uniformly distributed element, as the encoding of the hash-to-group
/// map applied to 64 random bytes.
pub fn ristretto255_random<R: RngCore + CryptoRng>(
    rng: &mut R,
) -> Result<[u8; 32], RndError> {
    let mut h = [0u8; 64];
    rng.try_fill_bytes(&mut h)?;
    Ok(ristretto255_from_hash(&h))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scalar::{sc_load_uint64, L};
    use hex_literal::hex;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    // k * B for k = 0, 1, 2, 3, 4
    const MULTIPLES: [[u8; 32]; 5] = [
        hex!("0000000000000000000000000000000000000000000000000000000000000000"),
        hex!("e2f2ae0a6abc4e71a884a961c500515f58e30b6aa582dd8db6a65945e08d2d76"),
        hex!("6a493210f7499cd17fecb510ae0cea23a110e8d5b901f8acadd3095c73a3b919"),
        hex!("94741f5d5d52755ece4f23f044ee27d5d1ea1e2bd196b462166b16152a9d0259"),
        hex!("da80862773358b466ffadfe0b3293ab3d9fd53c5ea6c955358f568322daf6a57"),
    ];

    // Edwards encodings of the 4-torsion: (0, 1), (0, -1), (i, 0), (-i, 0)
    const TORSION: [[u8; 32]; 4] = [
        hex!("0100000000000000000000000000000000000000000000000000000000000000"),
        hex!("ecffffffffffffffffffffffffffffffffffffffffffffffffffffffffffff7f"),
        hex!("0000000000000000000000000000000000000000000000000000000000000000"),
        hex!("0000000000000000000000000000000000000000000000000000000000000080"),
    ];

    #[test]
    fn encodes_small_multiples_of_the_base_point() {
        for (k, expected) in MULTIPLES.iter().enumerate() {
            let p = RistrettoPoint::scalarmult_base(&sc_load_uint64(k as u64));
            assert_eq!(&p.to_bytes(), expected);
            assert_eq!(RistrettoPoint::from_bytes(expected).unwrap().to_bytes(), *expected);
        }
        assert_eq!(RistrettoPoint::identity().to_bytes(), MULTIPLES[0]);
    }

    #[test]
    fn encoding_is_invariant_under_torsion() {
        let b = RistrettoPoint::scalarmult_base(&sc_load_uint64(1));
        for t in TORSION.iter() {
            let t = GeP3::from_bytes(t).unwrap();
            let shifted = RistrettoPoint(b.0.add_p3(&t));
            assert_eq!(shifted.to_bytes(), MULTIPLES[1]);
            assert_eq!(shifted, b);
        }
    }

    #[test]
    fn group_operations() {
        let b = RistrettoPoint::from_bytes(&MULTIPLES[1]).unwrap();
        let b2 = RistrettoPoint::from_bytes(&MULTIPLES[2]).unwrap();
        let b3 = RistrettoPoint::from_bytes(&MULTIPLES[3]).unwrap();
        assert_eq!((b + b2).to_bytes(), MULTIPLES[3]);
        assert_eq!((b3 - b).to_bytes(), MULTIPLES[2]);
        assert_eq!((b + -b).to_bytes(), MULTIPLES[0]);
        assert_eq!(b.scalarmult(&sc_load_uint64(4)).to_bytes(), MULTIPLES[4]);
        assert_eq!(b.scalarmult(&L), RistrettoPoint::identity());
        assert_ne!(b, b2);
    }

    #[test]
    fn rejects_non_canonical_encodings() {
        let bad = [
            // s >= p
            hex!("edffffffffffffffffffffffffffffffffffffffffffffffffffffffffffff7f"),
            hex!("f3ffffffffffffffffffffffffffffffffffffffffffffffffffffffffffff7f"),
            // top bit set
            hex!("0000000000000000000000000000000000000000000000000000000000000080"),
            // s negative
            hex!("0100000000000000000000000000000000000000000000000000000000000000"),
            hex!("e3f2ae0a6abc4e71a884a961c500515f58e30b6aa582dd8db6a65945e08d2d76"),
        ];
        for s in bad.iter() {
            assert_eq!(RistrettoPoint::from_bytes(s).unwrap_err(), Error::InvalidRistretto);
            assert!(!ristretto255_is_valid_point(s));
        }
    }

    #[test]
    fn rejects_encodings_outside_the_group() {
        let bad = [
            // t negative
            hex!("0200000000000000000000000000000000000000000000000000000000000000"),
            // u1 v^2 has no square root
            hex!("0800000000000000000000000000000000000000000000000000000000000000"),
            // y = 0
            hex!("ecffffffffffffffffffffffffffffffffffffffffffffffffffffffffffff7f"),
        ];
        for s in bad.iter() {
            assert_eq!(RistrettoPoint::from_bytes(s).unwrap_err(), Error::InvalidRistretto);
        }
        let ok = hex!("0400000000000000000000000000000000000000000000000000000000000000");
        assert_eq!(RistrettoPoint::from_bytes(&ok).unwrap().to_bytes(), ok);
    }

    #[test]
    fn hash_to_group_vector() {
        let h = hex!(
            "5d1be09e3d0c82fc538112490e35701979d99e06ca3e2b5b54bffe8b4dc772c1"
            "4d98b696a1bbfb5ca32c436cc61c16563790306c79eaca7705668b47dffe5bb6"
        );
        assert_eq!(
            ristretto255_from_hash(&h),
            hex!("3066f82a1a747d45120d1740f14358531a8f04bbffe6a819f86dfe50f44a0a46")
        );
    }

    #[test]
    fn hashed_and_random_elements_decode() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..4 {
            let mut h = [0u8; 64];
            rng.fill(&mut h[..]);
            let s = ristretto255_from_hash(&h);
            let p = RistrettoPoint::from_bytes(&s).unwrap();
            assert_eq!(p, RistrettoPoint::from_hash(&h));
            assert_eq!(p.to_bytes(), s);
            assert!(p.0.is_on_curve());
        }
        let s = ristretto255_random(&mut rng).unwrap();
        assert!(ristretto255_is_valid_point(&s));
    }
}
