//! Group elements of the twisted Edwards curve
//! `-x^2 + y^2 = 1 + d x^2 y^2` where `d = -121665/121666`.
//!
//! Representations:
//! - [`GeP2`] (projective): (X:Y:Z) satisfying x=X/Z, y=Y/Z
//! - [`GeP3`] (extended): (X:Y:Z:T) satisfying x=X/Z, y=Y/Z, XY=ZT
//! - [`GeP1P1`] (completed): ((X:Z),(Y:T)) satisfying x=X/Z, y=Y/T
//! - [`GePrecomp`] (Duif): (y+x,y-x,2dxy), only for public points
//! - [`GeCached`]: (Y+X,Y-X,Z,2dT), an extended point prepared as an addend
//!
//! None of these convert into each other implicitly; every change of
//! representation is an explicit method call.

use crate::{
    error::Error,
    field::FieldArithmetic,
    scalar::L,
    statics::{
        BI, FE_CURVE25519_A, FE_D, FE_D2, FE_ONE, FE_SQRTM1, FE_ZERO,
        GE_PRECOMP_BASE,
    },
    util::{equal, negative},
    FieldElement,
};
use core::{
    cmp::min,
    ops::{Add, Neg, Sub},
};
use rand::{CryptoRng, Error as RndError, RngCore};

#[derive(Clone, Copy, Debug)]
pub struct GeP2 {
    pub(crate) x: FieldElement,
    pub(crate) y: FieldElement,
    pub(crate) z: FieldElement,
}

#[derive(Clone, Copy, Debug)]
pub struct GeP3 {
    pub(crate) x: FieldElement,
    pub(crate) y: FieldElement,
    pub(crate) z: FieldElement,
    pub(crate) t: FieldElement,
}

#[derive(Clone, Copy, Debug)]
pub struct GeP1P1 {
    pub(crate) x: FieldElement,
    pub(crate) y: FieldElement,
    pub(crate) z: FieldElement,
    pub(crate) t: FieldElement,
}

#[derive(Clone, Copy, Debug)]
pub struct GePrecomp {
    pub(crate) y_plus_x: FieldElement,
    pub(crate) y_minus_x: FieldElement,
    pub(crate) xy2d: FieldElement,
}

#[derive(Clone, Copy, Debug)]
pub struct GeCached {
    pub(crate) y_plus_x: FieldElement,
    pub(crate) y_minus_x: FieldElement,
    pub(crate) z: FieldElement,
    pub(crate) t2d: FieldElement,
}

impl GeP1P1 {
    /// Relabels a completed point; three multiplications, no inversion.
    pub fn to_p2(&self) -> GeP2 {
        GeP2 {
            x: self.x * self.t,
            y: self.y * self.z,
            z: self.z * self.t,
        }
    }

    /// Relabels a completed point; four multiplications, no inversion.
    pub fn to_p3(&self) -> GeP3 {
        GeP3 {
            x: self.x * self.t,
            y: self.y * self.z,
            z: self.z * self.t,
            t: self.x * self.y,
        }
    }
}

impl GeP2 {
    pub fn identity() -> GeP2 {
        GeP2 {
            x: FE_ZERO,
            y: FE_ONE,
            z: FE_ONE,
        }
    }

    /// Compressed encoding: canonical y with the sign of x in the top bit.
    pub fn to_bytes(&self) -> [u8; 32] {
        encode(&self.x, &self.y, &self.z)
    }

    pub fn dbl(&self) -> GeP1P1 {
        let xx = self.x.square();
        let yy = self.y.square();
        let b = self.z.square_and_double();
        let a = self.x + self.y;
        let aa = a.square();
        let y3 = yy + xx;
        let z3 = yy - xx;
        let x3 = aa - y3;
        let t3 = b - z3;

        GeP1P1 {
            x: x3,
            y: y3,
            z: z3,
            t: t3,
        }
    }

    // Signed sliding-window recoding: odd digits in [-15, 15], mostly zeros.
    fn slide(a: &[u8; 32]) -> [i8; 256] {
        let mut r = [0i8; 256];
        for (i, ri) in r.iter_mut().enumerate() {
            *ri = (1 & (a[i >> 3] >> (i & 7))) as i8;
        }
        for i in 0..256 {
            if r[i] != 0 {
                for b in 1..min(7, 256 - i) {
                    if r[i + b] != 0 {
                        if r[i] + (r[i + b] << b) <= 15 {
                            r[i] += r[i + b] << b;
                            r[i + b] = 0;
                        } else if r[i] - (r[i + b] << b) >= -15 {
                            r[i] -= r[i + b] << b;
                            for k in r.iter_mut().skip(i + b) {
                                if *k == 0 {
                                    *k = 1;
                                    break;
                                }
                                *k = 0;
                            }
                        } else {
                            break;
                        }
                    }
                }
            }
        }

        r
    }

    /// `r = a * A + b * B`
    /// where `a = a[0]+256*a[1]+...+256^31 a[31]`
    /// and `b = b[0]+256*b[1]+...+256^31 b[31]`.
    /// B is the Ed25519 base point (x,4/5) with x positive.
    ///
    /// Variable time: for public inputs only (signature verification).
    pub fn double_scalarmult_vartime(
        a_scalar: &[u8; 32],
        a_point: &GeP3,
        b_scalar: &[u8; 32],
    ) -> GeP2 {
        let aslide = GeP2::slide(a_scalar);
        let bslide = GeP2::slide(b_scalar);

        // A,3A,5A,7A,9A,11A,13A,15A
        let mut ai = [a_point.to_cached(); 8];
        let a2 = a_point.dbl().to_p3();
        for i in 1..8 {
            ai[i] = (a2 + ai[i - 1]).to_p3().to_cached();
        }

        let mut r = GeP2::identity();

        let mut i = match (0..256).rev().find(|&i| aslide[i] != 0 || bslide[i] != 0)
        {
            Some(i) => i,
            None => return r,
        };

        loop {
            let mut t = r.dbl();
            if aslide[i] > 0 {
                t = t.to_p3() + ai[(aslide[i] / 2) as usize];
            } else if aslide[i] < 0 {
                t = t.to_p3() - ai[(-aslide[i] / 2) as usize];
            }

            if bslide[i] > 0 {
                t = t.to_p3() + BI[(bslide[i] / 2) as usize];
            } else if bslide[i] < 0 {
                t = t.to_p3() - BI[(-bslide[i] / 2) as usize];
            }

            r = t.to_p2();

            if i == 0 {
                return r;
            }
            i -= 1;
        }
    }
}

// x = X/Z and y = Y/Z through one constant-time inversion.
fn encode(x: &FieldElement, y: &FieldElement, z: &FieldElement) -> [u8; 32] {
    let recip = z.invert();
    let x = *x * recip;
    let y = *y * recip;
    let mut bs = y.to_bytes();
    bs[31] ^= x.is_negative() << 7;
    bs
}

// Recovers x^2 = u/v through x = uv^3 (uv^7)^((p-5)/8) and returns the
// candidate root along with vx^2 for checking it.
fn recover_x(u: &FieldElement, v: &FieldElement) -> (FieldElement, FieldElement) {
    let v3 = v.square() * *v;
    let uv7 = v3.square() * *v * *u;
    let x = uv7.pow22523() * v3 * *u;
    let vxx = x.square() * *v;
    (x, vxx)
}

impl GeP3 {
    /// The neutral element `(0, 1)`.
    pub fn identity() -> GeP3 {
        GeP3 {
            x: FE_ZERO,
            y: FE_ONE,
            z: FE_ONE,
            t: FE_ZERO,
        }
    }

    /// Decodes a compressed point in constant time.
    ///
    /// y is reduced implicitly, so encodings with y in `[p, 2^255)` decode
    /// to the point with `y - p`; use [`ge_is_canonical`] to reject them.
    /// Fails when `(y^2 - 1)/(d y^2 + 1)` has no square root.
    pub fn from_bytes(s: &[u8; 32]) -> Result<GeP3, Error> {
        let y = FieldElement::from_bytes(s);
        let z = FE_ONE;
        let yy = y.square();
        let u = yy - z; // y^2-1
        let v = yy * FE_D + z; // dy^2+1

        let (mut x, vxx) = recover_x(&u, &v);
        let has_m_root = (vxx - u).is_zero();
        let has_p_root = (vxx + u).is_zero();
        let x_sqrtm1 = x * FE_SQRTM1;
        x.maybe_set(&x_sqrtm1, 1 - has_m_root);

        x.maybe_negate(x.is_negative() ^ (s[31] >> 7));
        let t = x * y;

        if has_m_root | has_p_root == 0 {
            return Err(Error::InvalidPoint);
        }
        Ok(GeP3 { x, y, z, t })
    }

    /// Decodes a compressed point and negates it, for verifiers that need
    /// `-A`. Variable time: public inputs only.
    pub fn from_bytes_negate_vartime(s: &[u8; 32]) -> Result<GeP3, Error> {
        let y = FieldElement::from_bytes(s);
        let z = FE_ONE;
        let yy = y.square();
        let u = yy - z;
        let v = yy * FE_D + z;

        let (mut x, vxx) = recover_x(&u, &v);
        if (vxx - u).is_zero() == 0 {
            if (vxx + u).is_zero() == 0 {
                return Err(Error::InvalidPoint);
            }
            x = x * FE_SQRTM1;
        }

        if x.is_negative() == (s[31] >> 7) {
            x = -x;
        }

        let t = x * y;

        Ok(GeP3 { x, y, z, t })
    }

    pub fn to_bytes(&self) -> [u8; 32] {
        encode(&self.x, &self.y, &self.z)
    }

    pub fn to_p2(&self) -> GeP2 {
        GeP2 {
            x: self.x,
            y: self.y,
            z: self.z,
        }
    }

    pub fn to_cached(&self) -> GeCached {
        GeCached {
            y_plus_x: self.y + self.x,
            y_minus_x: self.y - self.x,
            z: self.z,
            t2d: self.t * FE_D2,
        }
    }

    /// Affine `(y+x, y-x, 2dxy)` form. Costs an inversion, and the result
    /// is only meant for tables of publicly known points.
    pub fn to_precomp(&self) -> GePrecomp {
        let recip = self.z.invert();
        let x = self.x * recip;
        let y = self.y * recip;
        GePrecomp {
            y_plus_x: y + x,
            y_minus_x: y - x,
            xy2d: x * y * FE_D2,
        }
    }

    pub fn dbl(&self) -> GeP1P1 {
        self.to_p2().dbl()
    }

    /// `self + q`
    pub fn add_p3(&self, q: &GeP3) -> GeP3 {
        (*self + q.to_cached()).to_p3()
    }

    /// `self - q`
    pub fn sub_p3(&self, q: &GeP3) -> GeP3 {
        (*self - q.to_cached()).to_p3()
    }

    pub fn add_cached(&self, q: &GeCached) -> GeP3 {
        (*self + *q).to_p3()
    }

    pub fn sub_cached(&self, q: &GeCached) -> GeP3 {
        (*self - *q).to_p3()
    }

    pub fn add_precomp(&self, q: &GePrecomp) -> GeP3 {
        (*self + *q).to_p3()
    }

    /// `8 * self`
    pub fn mul_by_cofactor(&self) -> GeP3 {
        let mut s = self.dbl().to_p2();
        s = s.dbl().to_p2();
        s.dbl().to_p3()
    }

    /// `h = a * self`
    /// where `a = a[0]+256*a[1]+...+256^31 a[31]`.
    ///
    /// Constant time in both `a` and the point.
    ///
    /// Preconditions:
    ///   `a[31] <= 127`
    pub fn scalarmult(&self, a: &[u8; 32]) -> GeP3 {
        // P, 2P, ..., 8P
        let mut pi = [self.to_cached(); 8];
        let p2 = self.dbl().to_p3();
        pi[1] = p2.to_cached();
        let p3 = (*self + pi[1]).to_p3();
        pi[2] = p3.to_cached();
        let p4 = p2.dbl().to_p3();
        pi[3] = p4.to_cached();
        pi[4] = (*self + pi[3]).to_p3().to_cached();
        pi[5] = p3.dbl().to_p3().to_cached();
        pi[6] = (*self + pi[5]).to_p3().to_cached();
        pi[7] = p4.dbl().to_p3().to_cached();

        let es = signed_radix16(a);

        let mut h = GeP3::identity();
        for i in (1..64).rev() {
            let t = GeCached::select(&pi, es[i]);
            let mut s = (h + t).to_p2();
            s = s.dbl().to_p2();
            s = s.dbl().to_p2();
            s = s.dbl().to_p2();
            h = s.dbl().to_p3(); // *16
        }
        let t = GeCached::select(&pi, es[0]);
        (h + t).to_p3()
    }

    pub fn is_identity(&self) -> bool {
        (self.x.is_zero() & (self.y - self.z).is_zero()) == 1
    }

    /// Checks `(-X^2 + Y^2) Z^2 = Z^4 + d X^2 Y^2`.
    pub fn is_on_curve(&self) -> bool {
        let x2 = self.x.square();
        let y2 = self.y.square();
        let z2 = self.z.square();
        let lhs = (y2 - x2) * z2;
        let rhs = x2 * y2 * FE_D + z2.square();
        (lhs - rhs).is_zero() == 1
    }

    /// Checks `l * self` is the identity, so no small-order component is
    /// present.
    pub fn is_on_main_subgroup(&self) -> bool {
        self.scalarmult(&L).is_identity()
    }
}

impl Neg for GeP3 {
    type Output = GeP3;

    fn neg(self) -> GeP3 {
        GeP3 {
            x: -self.x,
            y: self.y,
            z: self.z,
            t: -self.t,
        }
    }
}

// Unified addition, 8M: valid for doubling and for the identity.
impl Add<GeCached> for GeP3 {
    type Output = GeP1P1;

    fn add(self, rhs: GeCached) -> GeP1P1 {
        let y1_plus_x1 = self.y + self.x;
        let y1_minus_x1 = self.y - self.x;
        let a = y1_plus_x1 * rhs.y_plus_x;
        let b = y1_minus_x1 * rhs.y_minus_x;
        let c = rhs.t2d * self.t;
        let zz = self.z * rhs.z;
        let d = zz + zz;

        GeP1P1 {
            x: a - b,
            y: a + b,
            z: d + c,
            t: d - c,
        }
    }
}

// Mixed addition, 7M: the addend has Z = 1.
impl Add<GePrecomp> for GeP3 {
    type Output = GeP1P1;

    fn add(self, rhs: GePrecomp) -> GeP1P1 {
        let y1_plus_x1 = self.y + self.x;
        let y1_minus_x1 = self.y - self.x;
        let a = y1_plus_x1 * rhs.y_plus_x;
        let b = y1_minus_x1 * rhs.y_minus_x;
        let c = rhs.xy2d * self.t;
        let d = self.z + self.z;

        GeP1P1 {
            x: a - b,
            y: a + b,
            z: d + c,
            t: d - c,
        }
    }
}

impl Sub<GeCached> for GeP3 {
    type Output = GeP1P1;

    fn sub(self, rhs: GeCached) -> GeP1P1 {
        let y1_plus_x1 = self.y + self.x;
        let y1_minus_x1 = self.y - self.x;
        let a = y1_plus_x1 * rhs.y_minus_x;
        let b = y1_minus_x1 * rhs.y_plus_x;
        let c = rhs.t2d * self.t;
        let zz = self.z * rhs.z;
        let d = zz + zz;

        GeP1P1 {
            x: a - b,
            y: a + b,
            z: d - c,
            t: d + c,
        }
    }
}

impl Sub<GePrecomp> for GeP3 {
    type Output = GeP1P1;

    fn sub(self, rhs: GePrecomp) -> GeP1P1 {
        let y1_plus_x1 = self.y + self.x;
        let y1_minus_x1 = self.y - self.x;
        let a = y1_plus_x1 * rhs.y_minus_x;
        let b = y1_minus_x1 * rhs.y_plus_x;
        let c = rhs.xy2d * self.t;
        let d = self.z + self.z;

        GeP1P1 {
            x: a - b,
            y: a + b,
            z: d - c,
            t: d + c,
        }
    }
}

// Recodes a into 64 signed radix-16 digits, es[i] in [-8, 8], with
// a = sum(es[i] * 16^i).
//
// Preconditions:
//   a[31] <= 127
fn signed_radix16(a: &[u8; 32]) -> [i8; 64] {
    let mut es = [0i8; 64];
    for (i, &ai) in a.iter().enumerate() {
        es[2 * i] = (ai & 15) as i8;
        es[2 * i + 1] = ((ai >> 4) & 15) as i8;
    }
    // each es[i] is between 0 and 15
    // es[63] is between 0 and 7

    let mut carry: i8 = 0;
    for e in es.iter_mut().take(63) {
        *e += carry;
        carry = *e + 8;
        carry >>= 4;
        *e -= carry << 4;
    }
    es[63] += carry;
    // each es[i] is between -8 and 8
    es
}

// |b| and b < 0 without branching.
#[inline]
fn abs_and_sign(b: i8) -> (u8, u8) {
    let bnegative = negative(b);
    let babs = (b - (((-(bnegative as i8)) & b) << 1)) as u8;
    (babs, bnegative)
}

impl GeCached {
    fn identity() -> GeCached {
        GeCached {
            y_plus_x: FE_ONE,
            y_minus_x: FE_ONE,
            z: FE_ONE,
            t2d: FE_ZERO,
        }
    }

    fn maybe_set(&mut self, other: &GeCached, flag: u8) {
        self.y_plus_x.maybe_set(&other.y_plus_x, flag);
        self.y_minus_x.maybe_set(&other.y_minus_x, flag);
        self.z.maybe_set(&other.z, flag);
        self.t2d.maybe_set(&other.t2d, flag);
    }

    // b * P for b in [-8, 8], given multiples = [P, 2P, ..., 8P]. Every
    // entry is read.
    fn select(multiples: &[GeCached; 8], b: i8) -> GeCached {
        let (babs, bnegative) = abs_and_sign(b);
        let mut t = GeCached::identity();
        for (i, m) in multiples.iter().enumerate() {
            t.maybe_set(m, equal(babs, i as u8 + 1));
        }
        let minus_t = GeCached {
            y_plus_x: t.y_minus_x,
            y_minus_x: t.y_plus_x,
            z: t.z,
            t2d: -t.t2d,
        };
        t.maybe_set(&minus_t, bnegative);
        t
    }
}

impl GePrecomp {
    pub(crate) const ZERO: GePrecomp = GePrecomp {
        y_plus_x: FieldElement::ONE,
        y_minus_x: FieldElement::ONE,
        xy2d: FieldElement::ZERO,
    };

    fn maybe_set(&mut self, other: &GePrecomp, flag: u8) {
        self.y_plus_x.maybe_set(&other.y_plus_x, flag);
        self.y_minus_x.maybe_set(&other.y_minus_x, flag);
        self.xy2d.maybe_set(&other.xy2d, flag);
    }

    // b * 256^pos * B for b in [-8, 8]. Every entry of the row is read.
    fn select(pos: usize, b: i8) -> GePrecomp {
        let (babs, bnegative) = abs_and_sign(b);
        let mut t = GePrecomp::ZERO;
        for (i, m) in GE_PRECOMP_BASE[pos].iter().enumerate() {
            t.maybe_set(m, equal(babs, i as u8 + 1));
        }
        let minus_t = GePrecomp {
            y_plus_x: t.y_minus_x,
            y_minus_x: t.y_plus_x,
            xy2d: -t.xy2d,
        };
        t.maybe_set(&minus_t, bnegative);
        t
    }
}

/// `h = a * B`
/// where `a = a[0]+256*a[1]+...+256^31 a[31]`.
/// B is the Ed25519 base point (x,4/5) with x positive.
///
/// Constant time: table entries are picked by masked selection over the
/// whole row, never by indexing with a digit.
///
/// Preconditions:
///   `a[31] <= 127`
pub fn ge_scalarmult_base(a: &[u8; 32]) -> GeP3 {
    let es = signed_radix16(a);

    let mut h = GeP3::identity();
    for i in (1..64).step_by(2) {
        h = h.add_precomp(&GePrecomp::select(i / 2, es[i]));
    }

    let mut s = h.dbl().to_p2();
    s = s.dbl().to_p2();
    s = s.dbl().to_p2();
    h = s.dbl().to_p3();

    for i in (0..64).step_by(2) {
        h = h.add_precomp(&GePrecomp::select(i / 2, es[i]));
    }

    h
}

/// Whether `s` encodes its y-coordinate canonically, i.e. y < p. The sign
/// bit is not looked at.
pub fn ge_is_canonical(s: &[u8; 32]) -> bool {
    let mut c = u32::from((s[31] & 0x7f) ^ 0x7f);
    for &si in s[1..31].iter() {
        c |= u32::from(si ^ 0xff);
    }
    // c = 1 iff bytes 1..31 are all at their maximum
    c = (c.wrapping_sub(1)) >> 8;
    // d = 1 iff s[0] >= 0xed
    let d = (0xed - 1u32).wrapping_sub(u32::from(s[0])) >> 8;

    (c & d & 1) == 0
}

// Encodings (up to the sign bit) of the points of order 1, 2, 4 and 8,
// including the non-canonical aliases of 0 and 1 and p - 1.
const SMALL_ORDER_BLACKLIST: [[u8; 32]; 7] = [
    // 0 (order 4)
    [
        0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    ],
    // 1 (order 1)
    [
        0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    ],
    // order 8
    [
        0x26, 0xe8, 0x95, 0x8f, 0xc2, 0xb2, 0x27, 0xb0, 0x45, 0xc3, 0xf4,
        0x89, 0xf2, 0xef, 0x98, 0xf0, 0xd5, 0xdf, 0xac, 0x05, 0xd3, 0xc6,
        0x33, 0x39, 0xb1, 0x38, 0x02, 0x88, 0x6d, 0x53, 0xfc, 0x05,
    ],
    // order 8
    [
        0xc7, 0x17, 0x6a, 0x70, 0x3d, 0x4d, 0xd8, 0x4f, 0xba, 0x3c, 0x0b,
        0x76, 0x0d, 0x10, 0x67, 0x0f, 0x2a, 0x20, 0x53, 0xfa, 0x2c, 0x39,
        0xcc, 0xc6, 0x4e, 0xc7, 0xfd, 0x77, 0x92, 0xac, 0x03, 0x7a,
    ],
    // p-1 (order 2)
    [
        0xec, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
        0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
        0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0x7f,
    ],
    // p (=0, order 4)
    [
        0xed, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
        0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
        0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0x7f,
    ],
    // p+1 (=1, order 1)
    [
        0xee, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
        0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
        0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0x7f,
    ],
];

/// Whether `s` encodes a point of order 1, 2, 4 or 8 (either sign, and
/// the non-canonical aliases). Compares against every blacklisted
/// encoding with no early exit.
pub fn ge_has_small_order(s: &[u8; 32]) -> bool {
    let mut c = [0u8; 7];
    for (ci, bad) in c.iter_mut().zip(SMALL_ORDER_BLACKLIST.iter()) {
        for j in 0..31 {
            *ci |= s[j] ^ bad[j];
        }
        *ci |= (s[31] & 0x7f) ^ bad[31];
    }
    let mut k = 0u32;
    for &ci in c.iter() {
        k |= u32::from(ci).wrapping_sub(1);
    }
    (k >> 8) & 1 == 1
}

// Elligator 2 onto curve25519, moved to the Edwards curve and multiplied
// by the cofactor. x_sign (0 or 0x80) picks the sign of the Edwards x.
fn elligator2(r: &FieldElement, x_sign: u8) -> GeP3 {
    let rr2 = r.square_and_double() + FE_ONE;
    let mut x = -(FE_CURVE25519_A * rr2.invert());

    // e = x^3 + A x^2 + x, a square iff x lands on the curve
    let x2 = x.square();
    let e = x2 * x + x + x2 * FE_CURVE25519_A;
    let e_is_minus_1 = e.chi().to_bytes()[1] & 1;

    x.maybe_negate(e_is_minus_1);
    let mut a = FE_ZERO;
    a.maybe_set(&FE_CURVE25519_A, e_is_minus_1);
    x = x - a;

    // y_ed = (x-1)/(x+1)
    let y_ed = (x - FE_ONE) * (x + FE_ONE).invert();
    let mut s = y_ed.to_bytes();
    s[31] |= x_sign;

    // (x-1)/(x+1) is the y of a curve point whenever x is a curve25519
    // u-coordinate, which the chi test above guarantees.
    let p = GeP3::from_bytes(&s).unwrap_or_else(|_| GeP3::identity());
    p.mul_by_cofactor()
}

fn uniform_to_point(r: &[u8; 32]) -> GeP3 {
    let mut s = *r;
    let x_sign = s[31] & 0x80;
    s[31] &= 0x7f;
    elligator2(&FieldElement::from_bytes(&s), x_sign)
}

/// Deterministically maps 32 uniform bytes to the encoding of a point in
/// the prime-order subgroup. The top bit of `r[31]` picks the sign of x.
pub fn ge_from_uniform(r: &[u8; 32]) -> [u8; 32] {
    uniform_to_point(r).to_bytes()
}

/// Maps a 64-byte digest to a point: [`ge_from_uniform`] of each half,
/// added together.
pub fn ge_from_hash(h: &[u8; 64]) -> [u8; 32] {
    let mut r0 = [0u8; 32];
    let mut r1 = [0u8; 32];
    r0.copy_from_slice(&h[..32]);
    r1.copy_from_slice(&h[32..]);
    uniform_to_point(&r0)
        .add_p3(&uniform_to_point(&r1))
        .to_bytes()
}

/// `p + q` on encodings.
pub fn ge_add(p: &[u8; 32], q: &[u8; 32]) -> Result<[u8; 32], Error> {
    let p = GeP3::from_bytes(p)?;
    let q = GeP3::from_bytes(q)?;
    Ok(p.add_p3(&q).to_bytes())
}

/// `p - q` on encodings.
pub fn ge_sub(p: &[u8; 32], q: &[u8; 32]) -> Result<[u8; 32], Error> {
    let p = GeP3::from_bytes(p)?;
    let q = GeP3::from_bytes(q)?;
    Ok(p.sub_p3(&q).to_bytes())
}

/// Strict validation of a public point: canonical, not of small order, on
/// the curve and in the prime-order subgroup.
pub fn ge_is_valid_point(s: &[u8; 32]) -> bool {
    if !ge_is_canonical(s) || ge_has_small_order(s) {
        return false;
    }
    match GeP3::from_bytes(s) {
        Ok(p) => p.is_on_curve() && p.is_on_main_subgroup(),
        Err(_) => false,
    }
}

/// A uniformly distributed point of the prime-order subgroup.
pub fn ge_random<R: RngCore + CryptoRng>(
    rng: &mut R,
) -> Result<[u8; 32], RndError> {
    let mut r = [0u8; 32];
    rng.try_fill_bytes(&mut r)?;
    Ok(ge_from_uniform(&r))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scalar::{sc_muladd, sc_reduce};
    use hex_literal::hex;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    const BASE: [u8; 32] =
        hex!("5866666666666666666666666666666666666666666666666666666666666666");
    const BASE_TIMES_2: [u8; 32] =
        hex!("c9a3f86aae465f0e56513864510f3997561fa2c9e85ea21dc2292309f3cd6022");
    const BASE_TIMES_7: [u8; 32] =
        hex!("b862409fb5c4c4123df2abf7462b88f041ad36dd6864ce872fd5472be363c5b1");
    const ORDER_2: [u8; 32] =
        hex!("ecffffffffffffffffffffffffffffffffffffffffffffffffffffffffffff7f");
    const ORDER_4: [u8; 32] =
        hex!("0000000000000000000000000000000000000000000000000000000000000000");
    const ORDER_8: [u8; 32] =
        hex!("26e8958fc2b227b045c3f489f2ef98f0d5dfac05d3c63339b13802886d53fc05");

    fn identity_bytes() -> [u8; 32] {
        let mut s = [0u8; 32];
        s[0] = 1;
        s
    }

    fn scalar(n: u64) -> [u8; 32] {
        let mut s = [0u8; 32];
        s[..8].copy_from_slice(&n.to_le_bytes());
        s
    }

    fn random_scalar(rng: &mut StdRng) -> [u8; 32] {
        let mut wide = [0u8; 64];
        rng.fill(&mut wide[..]);
        sc_reduce(&mut wide);
        let mut s = [0u8; 32];
        s.copy_from_slice(&wide[..32]);
        s
    }

    fn base() -> GeP3 {
        GeP3::from_bytes(&BASE).unwrap()
    }

    #[test]
    fn identity_encoding() {
        assert_eq!(GeP3::identity().to_bytes(), identity_bytes());
        assert_eq!(GeP2::identity().to_bytes(), identity_bytes());
        assert!(GeP3::from_bytes(&identity_bytes()).unwrap().is_identity());
    }

    #[test]
    fn base_point_round_trip() {
        let b = base();
        assert_eq!(b.to_bytes(), BASE);
        assert!(b.is_on_curve());
        assert!(b.is_on_main_subgroup());
        assert!(!b.is_identity());
    }

    #[test]
    fn scalarmult_base_small_multiples() {
        assert_eq!(ge_scalarmult_base(&scalar(1)).to_bytes(), BASE);
        assert_eq!(ge_scalarmult_base(&scalar(2)).to_bytes(), BASE_TIMES_2);
        assert_eq!(ge_scalarmult_base(&scalar(7)).to_bytes(), BASE_TIMES_7);
        assert_eq!(ge_scalarmult_base(&scalar(0)).to_bytes(), identity_bytes());
        assert!(ge_scalarmult_base(&L).is_identity());

        let b = base();
        assert_eq!((b + b.to_cached()).to_p3().to_bytes(), BASE_TIMES_2);
        assert_eq!(b.dbl().to_p3().to_bytes(), BASE_TIMES_2);
        assert_eq!(b.dbl().to_p2().to_bytes(), BASE_TIMES_2);
    }

    #[test]
    fn scalarmult_matches_scalarmult_base() {
        let mut rng = StdRng::seed_from_u64(42);
        let b = base();
        for _ in 0..8 {
            let a = random_scalar(&mut rng);
            assert_eq!(b.scalarmult(&a).to_bytes(), ge_scalarmult_base(&a).to_bytes());
        }
        assert_eq!(b.scalarmult(&scalar(7)).to_bytes(), BASE_TIMES_7);
        assert!(b.scalarmult(&L).is_identity());
        assert!(b.scalarmult(&scalar(0)).is_identity());
    }

    #[test]
    fn scalarmult_distributes_over_scalar_products() {
        let mut rng = StdRng::seed_from_u64(43);
        let a = random_scalar(&mut rng);
        let b = random_scalar(&mut rng);
        let mut ab = [0u8; 32];
        sc_muladd(&mut ab, &a, &b, &[0u8; 32]);
        let p = ge_scalarmult_base(&a);
        assert_eq!(p.scalarmult(&b).to_bytes(), ge_scalarmult_base(&ab).to_bytes());
    }

    #[test]
    fn group_laws() {
        let mut rng = StdRng::seed_from_u64(44);
        let p = ge_scalarmult_base(&random_scalar(&mut rng));
        let q = ge_scalarmult_base(&random_scalar(&mut rng));
        let id = GeP3::identity();

        assert_eq!(p.add_p3(&id).to_bytes(), p.to_bytes());
        assert!(p.add_p3(&-p).is_identity());
        assert!(p.sub_p3(&p).is_identity());
        assert_eq!(p.add_p3(&q).to_bytes(), q.add_p3(&p).to_bytes());
        assert_eq!(p.add_p3(&q).sub_p3(&q).to_bytes(), p.to_bytes());
        assert_eq!(p.add_cached(&q.to_cached()).to_bytes(), p.add_p3(&q).to_bytes());
        assert_eq!(p.sub_cached(&q.to_cached()).to_bytes(), p.sub_p3(&q).to_bytes());
        assert_eq!(p.add_precomp(&q.to_precomp()).to_bytes(), p.add_p3(&q).to_bytes());
        assert_eq!((p - q.to_precomp()).to_p3().to_bytes(), p.sub_p3(&q).to_bytes());
        assert!(p.add_p3(&q).is_on_curve());
    }

    #[test]
    fn double_scalarmult_vartime_matches_constant_time_path() {
        let mut rng = StdRng::seed_from_u64(45);
        let big_a = ge_scalarmult_base(&random_scalar(&mut rng));
        for _ in 0..4 {
            let a = random_scalar(&mut rng);
            let b = random_scalar(&mut rng);
            let expected = big_a.scalarmult(&a).add_p3(&ge_scalarmult_base(&b));
            assert_eq!(
                GeP2::double_scalarmult_vartime(&a, &big_a, &b).to_bytes(),
                expected.to_bytes()
            );
        }
        let zero = [0u8; 32];
        assert_eq!(
            GeP2::double_scalarmult_vartime(&scalar(1), &big_a, &zero).to_bytes(),
            big_a.to_bytes()
        );
        assert_eq!(
            GeP2::double_scalarmult_vartime(&zero, &big_a, &scalar(1)).to_bytes(),
            BASE
        );
        assert_eq!(
            GeP2::double_scalarmult_vartime(&zero, &big_a, &zero).to_bytes(),
            identity_bytes()
        );
    }

    #[test]
    fn negate_vartime_decoding() {
        let neg_b = GeP3::from_bytes_negate_vartime(&BASE).unwrap();
        assert_eq!(
            neg_b.to_bytes(),
            hex!("58666666666666666666666666666666666666666666666666666666666666e6")
        );
        assert!(neg_b.add_p3(&base()).is_identity());
        assert_eq!(
            GeP3::from_bytes_negate_vartime(&scalar(2)).unwrap_err(),
            Error::InvalidPoint
        );
    }

    #[test]
    fn rejects_y_without_square_root() {
        // y = 2 gives x^2 = 3/(4d+1), which is not a square
        assert_eq!(GeP3::from_bytes(&scalar(2)).unwrap_err(), Error::InvalidPoint);
    }

    #[test]
    fn zero_bytes_decode_to_order_four_point() {
        // y = 0 forces x^2 = -1, whose root sqrt(-1) exists
        let p = GeP3::from_bytes(&ORDER_4).unwrap();
        assert!(p.is_on_curve());
        assert!(!p.is_on_main_subgroup());
        assert!(p.dbl().to_p3().dbl().to_p3().is_identity());
        assert!(ge_has_small_order(&ORDER_4));
    }

    #[test]
    fn non_canonical_encodings_reduce_silently() {
        // y = p + 1 is y = 1, the identity
        let mut p_plus_one = ORDER_2;
        p_plus_one[0] = 0xee;
        assert!(!ge_is_canonical(&p_plus_one));
        assert!(GeP3::from_bytes(&p_plus_one).unwrap().is_identity());

        // y = p is y = 0
        let mut p = ORDER_2;
        p[0] = 0xed;
        assert!(!ge_is_canonical(&p));
        assert_eq!(GeP3::from_bytes(&p).unwrap().to_bytes(), ORDER_4);

        // y = p + 4 is y = 4 with the sign bit set
        let mut y4 = hex!("f1ffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffff");
        assert!(!ge_is_canonical(&y4));
        y4[31] &= 0x7f;
        assert!(!ge_is_canonical(&y4));

        assert!(ge_is_canonical(&BASE));
        assert!(ge_is_canonical(&ORDER_2));
        assert!(ge_is_canonical(&ORDER_4));
        let mut signed = BASE;
        signed[31] |= 0x80;
        assert!(ge_is_canonical(&signed));
    }

    #[test]
    fn small_order_points() {
        for s in [ORDER_2, ORDER_4, ORDER_8, identity_bytes()].iter() {
            assert!(ge_has_small_order(s));
            let mut negated = *s;
            negated[31] ^= 0x80;
            assert!(ge_has_small_order(&negated));
            if let Ok(p) = GeP3::from_bytes(s) {
                assert!(p.scalarmult(&scalar(8)).is_identity());
            }
        }
        assert!(!ge_has_small_order(&BASE));
        assert!(!ge_has_small_order(&BASE_TIMES_2));
    }

    #[test]
    fn main_subgroup_membership() {
        let b = base();
        let t2 = GeP3::from_bytes(&ORDER_2).unwrap();
        let t8 = GeP3::from_bytes(&ORDER_8).unwrap();
        assert!(b.is_on_main_subgroup());
        assert!(!b.add_p3(&t2).is_on_main_subgroup());
        assert!(!b.add_p3(&t8).is_on_main_subgroup());
        assert!(!t8.is_on_main_subgroup());
        assert!(b.add_p3(&t8).mul_by_cofactor().is_on_main_subgroup());
    }

    #[test]
    fn on_curve_check_rejects_tampered_coordinates() {
        let mut p = ge_scalarmult_base(&scalar(5));
        assert!(p.is_on_curve());
        p.y = p.y + FE_ONE;
        assert!(!p.is_on_curve());
    }

    #[test]
    fn strict_point_validation() {
        assert!(ge_is_valid_point(&BASE));
        assert!(ge_is_valid_point(&BASE_TIMES_7));
        assert!(!ge_is_valid_point(&ORDER_8));
        assert!(!ge_is_valid_point(&ORDER_4));
        assert!(!ge_is_valid_point(&scalar(2)));
        let t2 = GeP3::from_bytes(&ORDER_2).unwrap();
        assert!(!ge_is_valid_point(&base().add_p3(&t2).to_bytes()));
    }

    #[test]
    fn encoded_addition() {
        assert_eq!(ge_add(&BASE, &BASE).unwrap(), BASE_TIMES_2);
        assert_eq!(ge_sub(&BASE_TIMES_2, &BASE).unwrap(), BASE);
        assert_eq!(ge_sub(&BASE, &BASE).unwrap(), identity_bytes());
        assert_eq!(ge_add(&BASE, &scalar(2)).unwrap_err(), Error::InvalidPoint);
    }

    #[test]
    fn from_uniform_vectors() {
        let mut r = [0u8; 32];
        for (i, ri) in r.iter_mut().enumerate() {
            *ri = i as u8;
        }
        assert_eq!(
            ge_from_uniform(&r),
            hex!("0691eee3cf70a0056df6bfa03120635636581b5c4ea571dfc680f78c7e0b4137")
        );
        for (i, ri) in r.iter_mut().enumerate() {
            *ri = 0xff - i as u8;
        }
        assert_eq!(
            ge_from_uniform(&r),
            hex!("9572130b506d0642569c54cc37eb2503b182187a9d2607d733138ef2b3528f0a")
        );
        assert_eq!(ge_from_uniform(&[0u8; 32]), identity_bytes());
    }

    #[test]
    fn from_uniform_lands_in_main_subgroup() {
        let mut rng = StdRng::seed_from_u64(46);
        for _ in 0..4 {
            let mut r = [0u8; 32];
            rng.fill(&mut r);
            let s = ge_from_uniform(&r);
            assert_eq!(ge_from_uniform(&r), s);
            let p = GeP3::from_bytes(&s).unwrap();
            assert!(p.is_on_curve());
            assert!(p.is_on_main_subgroup());
        }
    }

    #[test]
    fn from_hash_adds_both_halves() {
        let mut h = [0u8; 64];
        for (i, hi) in h.iter_mut().enumerate() {
            *hi = i as u8;
        }
        let s = ge_from_hash(&h);
        assert_eq!(
            s,
            hex!("4d7b67065c1cf1295b41269d00a6d8a9b085278fe0b4e8c8363b220c7ac21872")
        );
        let mut lo = [0u8; 32];
        let mut hi = [0u8; 32];
        lo.copy_from_slice(&h[..32]);
        hi.copy_from_slice(&h[32..]);
        assert_eq!(ge_add(&ge_from_uniform(&lo), &ge_from_uniform(&hi)).unwrap(), s);
        assert!(ge_is_valid_point(&s));
    }

    #[test]
    fn random_points_are_valid() {
        let mut rng = StdRng::seed_from_u64(47);
        let s = ge_random(&mut rng).unwrap();
        assert!(ge_is_valid_point(&s));
    }
}
