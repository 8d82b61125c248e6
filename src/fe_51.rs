//! Radix 2^51 field backend: five unsigned 64-bit limbs, 128-bit products.

use crate::field::FieldArithmetic;
use core::{
    cmp::{Eq, PartialEq},
    ops::{Add, Mul, Neg, Sub},
};

/// An element t, entries t\[0\]...t\[4\], represents the integer
/// `t[0]+2^51 t[1]+2^102 t[2]+2^153 t[3]+2^204 t[4]`.
///
/// Limbs are below 2^52 after `mul`, `square`, `sub` and `neg`; a handful
/// of chained additions may grow them up to 2^54, the largest input `mul`
/// accepts.
#[derive(Clone, Copy, Debug)]
pub struct FieldElement(pub(crate) [u64; 5]);

const LOW_51_BIT_MASK: u64 = (1 << 51) - 1;

// 16p, limb by limb. Added before subtracting so no limb underflows.
const SIXTEEN_P: [u64; 5] = [
    36_028_797_018_963_664,
    36_028_797_018_963_952,
    36_028_797_018_963_952,
    36_028_797_018_963_952,
    36_028_797_018_963_952,
];

#[inline]
const fn load_8(s: &[u8; 32], i: usize) -> u64 {
    let mut r = 0u64;
    let mut k = 0;
    while k < 8 {
        r |= (s[i + k] as u64) << (8 * k);
        k += 1;
    }
    r
}

// Carries every limb once; limb 4 wraps into limb 0 multiplied by 19.
// Output limbs are below 2^51 + 2^13 * 19.
#[inline]
const fn weak_reduce(mut l: [u64; 5]) -> [u64; 5] {
    let c0 = l[0] >> 51;
    let c1 = l[1] >> 51;
    let c2 = l[2] >> 51;
    let c3 = l[3] >> 51;
    let c4 = l[4] >> 51;
    l[0] &= LOW_51_BIT_MASK;
    l[1] &= LOW_51_BIT_MASK;
    l[2] &= LOW_51_BIT_MASK;
    l[3] &= LOW_51_BIT_MASK;
    l[4] &= LOW_51_BIT_MASK;
    l[0] += c4 * 19;
    l[1] += c0;
    l[2] += c1;
    l[3] += c2;
    l[4] += c3;
    l
}

#[inline]
fn m(x: u64, y: u64) -> u128 {
    u128::from(x) * u128::from(y)
}

// Carries 128-bit column sums down to 51-bit limbs.
//
// With inputs below 2^54 every column is below 2^115, so each carry fits in
// a u64, and column 4 (which never receives a *19 term) stays below 2^111,
// keeping `carry * 19` below 2^64.
fn reduce_wide(mut c: [u128; 5]) -> FieldElement {
    let mut out = [0u64; 5];
    for i in 0..4 {
        c[i + 1] += c[i] >> 51;
        out[i] = (c[i] as u64) & LOW_51_BIT_MASK;
    }
    out[4] = (c[4] as u64) & LOW_51_BIT_MASK;
    out[0] += ((c[4] >> 51) as u64) * 19;
    out[1] += out[0] >> 51;
    out[0] &= LOW_51_BIT_MASK;
    FieldElement(out)
}

impl FieldElement {
    pub const ZERO: FieldElement = FieldElement([0; 5]);
    pub const ONE: FieldElement = FieldElement([1, 0, 0, 0, 0]);

    /// Decodes 255 little-endian bits; the top bit of `s[31]` is ignored.
    ///
    /// Usable in constant expressions, which is how the curve constants and
    /// base-point tables are built.
    pub const fn from_bytes(s: &[u8; 32]) -> FieldElement {
        FieldElement([
            load_8(s, 0) & LOW_51_BIT_MASK,
            (load_8(s, 6) >> 3) & LOW_51_BIT_MASK,
            (load_8(s, 12) >> 6) & LOW_51_BIT_MASK,
            (load_8(s, 19) >> 1) & LOW_51_BIT_MASK,
            (load_8(s, 24) >> 12) & LOW_51_BIT_MASK,
        ])
    }

    pub fn to_bytes(&self) -> [u8; 32] {
        let mut l = weak_reduce(self.0);

        // Now l < 2^255 + 2^13*19, so q = floor(l / p) is 0 or 1, and
        // q = 1 exactly when l + 19 overflows 2^255.
        let mut q = (l[0] + 19) >> 51;
        q = (l[1] + q) >> 51;
        q = (l[2] + q) >> 51;
        q = (l[3] + q) >> 51;
        q = (l[4] + q) >> 51;

        // l - pq = l + 19q - 2^255 q
        l[0] += 19 * q;
        l[1] += l[0] >> 51;
        l[0] &= LOW_51_BIT_MASK;
        l[2] += l[1] >> 51;
        l[1] &= LOW_51_BIT_MASK;
        l[3] += l[2] >> 51;
        l[2] &= LOW_51_BIT_MASK;
        l[4] += l[3] >> 51;
        l[3] &= LOW_51_BIT_MASK;
        // dropping bit 255 subtracts 2^255 q
        l[4] &= LOW_51_BIT_MASK;

        let mut out = [0u8; 32];
        let mut acc: u128 = 0;
        let mut acc_bits = 0;
        let mut k = 0;
        for &li in l.iter() {
            acc |= u128::from(li) << acc_bits;
            acc_bits += 51;
            while acc_bits >= 8 {
                out[k] = acc as u8;
                acc >>= 8;
                acc_bits -= 8;
                k += 1;
            }
        }
        out[31] = acc as u8;
        out
    }
}

impl PartialEq for FieldElement {
    fn eq(&self, other: &FieldElement) -> bool {
        self.ct_eq(other) == 1
    }
}

impl Eq for FieldElement {}

impl Add for FieldElement {
    type Output = FieldElement;

    // No carries: limbs grow by at most one bit.
    fn add(self, rhs: FieldElement) -> FieldElement {
        let FieldElement(mut h) = self;
        for (hi, gi) in h.iter_mut().zip(rhs.0.iter()) {
            *hi += gi;
        }
        FieldElement(h)
    }
}

impl Sub for FieldElement {
    type Output = FieldElement;

    // Preconditions:
    //    rhs limbs below 2^55
    fn sub(self, rhs: FieldElement) -> FieldElement {
        let FieldElement(f) = self;
        let FieldElement(g) = rhs;
        let mut h = [0u64; 5];
        for i in 0..5 {
            h[i] = (f[i] + SIXTEEN_P[i]) - g[i];
        }
        FieldElement(weak_reduce(h))
    }
}

impl Neg for FieldElement {
    type Output = FieldElement;

    fn neg(self) -> FieldElement {
        FieldElement::ZERO - self
    }
}

impl Mul for FieldElement {
    type Output = FieldElement;

    // Preconditions:
    //    limbs of both operands below 2^54
    //
    // Postconditions:
    //    limbs below 2^51 + 2^13
    fn mul(self, rhs: FieldElement) -> FieldElement {
        let FieldElement(a) = self;
        let FieldElement(b) = rhs;
        let mut b_19 = [0u64; 5];
        for (bi_19, &bi) in b_19.iter_mut().zip(b.iter()) {
            *bi_19 = bi * 19;
        }

        // Column i+j takes a[i]*b[j]; columns past the fourth wrap around
        // with a factor of 19 since 2^255 = 19.
        let mut c = [0u128; 5];
        for i in 0..5 {
            for j in 0..5 {
                if i + j < 5 {
                    c[i + j] += m(a[i], b[j]);
                } else {
                    c[i + j - 5] += m(a[i], b_19[j]);
                }
            }
        }
        reduce_wide(c)
    }
}

impl FieldArithmetic for FieldElement {
    fn zero() -> FieldElement {
        FieldElement::ZERO
    }

    fn one() -> FieldElement {
        FieldElement::ONE
    }

    fn from_bytes(s: &[u8; 32]) -> FieldElement {
        FieldElement::from_bytes(s)
    }

    fn to_bytes(&self) -> [u8; 32] {
        FieldElement::to_bytes(self)
    }

    fn square(&self) -> FieldElement {
        let FieldElement(a) = self;
        let mut c = [0u128; 5];
        for i in 0..5 {
            for j in i..5 {
                let mut aj = a[j];
                if i != j {
                    aj *= 2;
                }
                if i + j >= 5 {
                    aj *= 19;
                }
                c[(i + j) % 5] += m(a[i], aj);
            }
        }
        reduce_wide(c)
    }

    fn square_and_double(&self) -> FieldElement {
        let sq = self.square();
        sq + sq
    }

    fn maybe_set(&mut self, other: &FieldElement, flag: u8) {
        let mask = u64::from(flag).wrapping_neg();
        for (fi, gi) in self.0.iter_mut().zip(other.0.iter()) {
            *fi ^= mask & (*fi ^ gi);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{FieldElement, LOW_51_BIT_MASK};
    use crate::field::{tests::check_all, FieldArithmetic};

    #[test]
    fn field_laws_hold() {
        check_all::<FieldElement>();
    }

    #[test]
    fn maybe_set_test() {
        let mut f = FieldElement([10, 20, 30, 40, 50]);
        let g = FieldElement([11, 21, 31, 41, 51]);
        let f_initial = f;
        f.maybe_set(&g, 0);
        assert_eq!(f.0, f_initial.0);
        f.maybe_set(&g, 1);
        assert_eq!(f.0, g.0);
    }

    #[test]
    fn largest_inputs_multiply_exactly() {
        // Every limb at the 2^54 bound; the value is 8(2^255 - 1) = 8 * 18.
        let big = FieldElement([(1 << 54) - 8; 5]);
        let expected = FieldElement([144, 0, 0, 0, 0]);
        assert_eq!((big * big).to_bytes(), (expected * expected).to_bytes());
        assert_eq!(big.square().to_bytes(), (expected * expected).to_bytes());
        for &limb in (big * big).0.iter() {
            assert!(limb <= LOW_51_BIT_MASK + (1 << 13));
        }
    }
}
