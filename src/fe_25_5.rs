//! Radix 2^25.5 field backend: ten signed 32-bit limbs, 64-bit products.

use crate::field::FieldArithmetic;
use core::{
    cmp::{Eq, PartialEq},
    ops::{Add, Mul, Neg, Sub},
};

/// Here the field is \Z/(2^255-19).
///
/// An element t, entries t\[0\]...t\[9\], represents the integer
/// `t[0]+2^26 t[1]+2^51 t[2]+2^77 t[3]+2^102 t[4]+...+2^230 t[9]`.
/// Bounds on each t\[i\] vary depending on context.
#[derive(Clone, Copy, Debug)]
pub struct FieldElement(pub(crate) [i32; 10]);

// Limb i is 26 bits wide for even i and 25 bits wide for odd i.
#[inline]
const fn limb_bits(i: usize) -> u32 {
    26 - (i as u32 & 1)
}

#[inline]
const fn load_3(s: &[u8; 32], i: usize) -> i64 {
    (s[i] as i64) | ((s[i + 1] as i64) << 8) | ((s[i + 2] as i64) << 16)
}

#[inline]
const fn load_4(s: &[u8; 32], i: usize) -> i64 {
    load_3(s, i) | ((s[i + 3] as i64) << 24)
}

// Rounded carry out of limb i into limb i+1 (limb 9 wraps into limb 0
// multiplied by 19). Leaves |h[i]| <= 2^25 or 2^24.
#[inline]
const fn carry(mut h: [i64; 10], i: usize) -> [i64; 10] {
    let bits = limb_bits(i);
    let c = (h[i] + (1 << (bits - 1))) >> bits;
    h[i] -= c << bits;
    if i == 9 {
        h[0] += c * 19;
    } else {
        h[i + 1] += c;
    }
    h
}

// Brings 64-bit column sums back to 32-bit limbs.
//
// Preconditions:
//    |h0| <= 1.2*2^59, |h1| <= 1.5*2^58, similar ranges for the even and
//    odd limbs (the largest column sums a product can produce).
//
// Postconditions:
//    |h| bounded by 1.01*2^25,1.01*2^24,1.01*2^25,1.01*2^24,etc.
const fn reduce_wide(h: [i64; 10]) -> FieldElement {
    // Two independent chains, 0..4 and 4..9, interleaved; limb 9 then wraps
    // into limb 0 and one last carry settles limb 0.
    let mut h = carry(carry(h, 0), 4);
    h = carry(carry(h, 1), 5);
    h = carry(carry(h, 2), 6);
    h = carry(carry(h, 3), 7);
    h = carry(carry(h, 4), 8);
    h = carry(carry(h, 9), 0);

    let mut out = [0i32; 10];
    let mut i = 0;
    while i < 10 {
        out[i] = h[i] as i32;
        i += 1;
    }
    FieldElement(out)
}

// Schoolbook column sums of f * g.
//
// Limbs i and j land in column (i+j) mod 10. When both i and j are odd
// their weights carry an extra factor of 2, and columns past the ninth wrap
// around with a factor of 19 since 2^255 = 19.
fn mul_wide(f: &[i32; 10], g: &[i32; 10]) -> [i64; 10] {
    let mut h = [0i64; 10];
    for (i, &fi) in f.iter().enumerate() {
        for (j, &gj) in g.iter().enumerate() {
            let mut fg = i64::from(fi) * i64::from(gj);
            if i & j & 1 == 1 {
                fg *= 2;
            }
            if i + j >= 10 {
                fg *= 19;
            }
            h[(i + j) % 10] += fg;
        }
    }
    h
}

// Same as `mul_wide(f, f)`, visiting each unordered pair of limbs once.
fn square_wide(f: &[i32; 10]) -> [i64; 10] {
    let mut h = [0i64; 10];
    for i in 0..10 {
        for j in i..10 {
            let mut ff = i64::from(f[i]) * i64::from(f[j]);
            if i != j {
                ff *= 2;
            }
            if i & j & 1 == 1 {
                ff *= 2;
            }
            if i + j >= 10 {
                ff *= 19;
            }
            h[(i + j) % 10] += ff;
        }
    }
    h
}

fn widen(f: &[i32; 10]) -> [i64; 10] {
    let mut h = [0i64; 10];
    for (hi, &fi) in h.iter_mut().zip(f.iter()) {
        *hi = i64::from(fi);
    }
    h
}

impl FieldElement {
    pub const ZERO: FieldElement = FieldElement([0; 10]);
    pub const ONE: FieldElement = FieldElement([1, 0, 0, 0, 0, 0, 0, 0, 0, 0]);

    /// Decodes 255 little-endian bits; the top bit of `s[31]` is ignored.
    ///
    /// Usable in constant expressions, which is how the curve constants and
    /// base-point tables are built.
    pub const fn from_bytes(s: &[u8; 32]) -> FieldElement {
        reduce_wide([
            load_4(s, 0),
            load_3(s, 4) << 6,
            load_3(s, 7) << 5,
            load_3(s, 10) << 3,
            load_3(s, 13) << 2,
            load_4(s, 16),
            load_3(s, 20) << 7,
            load_3(s, 23) << 5,
            load_3(s, 26) << 4,
            (load_3(s, 29) & 8_388_607) << 2,
        ])
    }

    // Write p=2^255-19; q=floor(h/p).
    // Basic claim: q = floor(2^(-255)(h + 19 2^(-25)h9 + 2^(-1))).
    //
    // Proof:
    //   Have |h|<=p so |q|<=1 so |19^2 2^(-255) q|<1/4.
    //   Also have |h-2^230 h9|<2^230 so |19 2^(-255)(h-2^230 h9)|<1/4.
    //
    //   Write y=2^(-1)-19^2 2^(-255)q-19 2^(-255)(h-2^230 h9).
    //   Then 0<y<1.
    //
    //   Write r=h-pq.
    //   Have 0<=r<=p-1=2^255-20.
    //   Thus 0<=r+19(2^-255)r<r+19(2^-255)2^255<=2^255-1.
    //
    //   Write x=r+19(2^-255)r+y.
    //   Then 0<x<2^255 so floor(2^(-255)x) = 0 so floor(q+2^(-255)x) = q.
    //
    //   Have q+2^(-255)x = 2^(-255)(h + 19 2^(-25) h9 + 2^(-1))
    //   so floor(2^(-255)(h + 19 2^(-25) h9 + 2^(-1))) = q.
    pub fn to_bytes(&self) -> [u8; 32] {
        // Sums and differences are not carried; settle them first so the
        // claim above holds.
        let FieldElement(mut h) = reduce_wide(widen(&self.0));

        let mut q = (19 * h[9] + (1 << 24)) >> 25;
        for (i, &hi) in h.iter().enumerate() {
            q = (hi + q) >> limb_bits(i);
        }

        // Goal: Output h-(2^255-19)q, which is between 0 and 2^255-20.
        h[0] += 19 * q;
        for i in 0..9 {
            let c = h[i] >> limb_bits(i);
            h[i + 1] += c;
            h[i] -= c << limb_bits(i);
        }
        // h10 = carry9 = q, which is dropped along with 2^255 q.
        h[9] &= (1 << 25) - 1;

        let mut out = [0u8; 32];
        let mut acc: u64 = 0;
        let mut acc_bits = 0;
        let mut k = 0;
        for (i, &hi) in h.iter().enumerate() {
            acc |= (hi as u64) << acc_bits;
            acc_bits += limb_bits(i);
            while acc_bits >= 8 {
                out[k] = acc as u8;
                acc >>= 8;
                acc_bits -= 8;
                k += 1;
            }
        }
        // 255 bits: 31 whole bytes and 7 bits left over
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

    // Preconditions:
    //    |f| bounded by 1.1*2^25,1.1*2^24,1.1*2^25,1.1*2^24,etc.
    //    |g| bounded by 1.1*2^25,1.1*2^24,1.1*2^25,1.1*2^24,etc.
    //
    // Postconditions:
    //    |h| bounded by 1.1*2^26,1.1*2^25,1.1*2^26,1.1*2^25,etc.
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

    // Same bounds as `add`.
    fn sub(self, rhs: FieldElement) -> FieldElement {
        let FieldElement(mut h) = self;
        for (hi, gi) in h.iter_mut().zip(rhs.0.iter()) {
            *hi -= gi;
        }
        FieldElement(h)
    }
}

impl Neg for FieldElement {
    type Output = FieldElement;

    fn neg(self) -> FieldElement {
        let FieldElement(mut h) = self;
        for hi in h.iter_mut() {
            *hi = -*hi;
        }
        FieldElement(h)
    }
}

impl Mul for FieldElement {
    type Output = FieldElement;

    // Preconditions:
    //    |f| bounded by 1.1*2^26,1.1*2^25,1.1*2^26,1.1*2^25,etc.
    //    |g| bounded by 1.1*2^26,1.1*2^25,1.1*2^26,1.1*2^25,etc.
    //
    // Postconditions:
    //    |h| bounded by 1.1*2^25,1.1*2^24,1.1*2^25,1.1*2^24,etc.
    fn mul(self, rhs: FieldElement) -> FieldElement {
        reduce_wide(mul_wide(&self.0, &rhs.0))
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
        reduce_wide(square_wide(&self.0))
    }

    fn square_and_double(&self) -> FieldElement {
        let mut h = square_wide(&self.0);
        for hi in h.iter_mut() {
            *hi += *hi;
        }
        reduce_wide(h)
    }

    fn maybe_set(&mut self, other: &FieldElement, flag: u8) {
        let mask = -i32::from(flag);
        for (fi, gi) in self.0.iter_mut().zip(other.0.iter()) {
            *fi ^= mask & (*fi ^ gi);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::FieldElement;
    use crate::field::tests::check_all;

    #[test]
    fn field_laws_hold() {
        check_all::<FieldElement>();
    }

    #[test]
    fn maybe_set_test() {
        let mut f = FieldElement([10, 20, 30, 40, 50, 60, 70, 80, 90, 100]);
        let g = FieldElement([11, 21, 31, 41, 51, 61, 71, 81, 91, 101]);
        let f_initial = f;
        crate::field::FieldArithmetic::maybe_set(&mut f, &g, 0);
        assert_eq!(f.0, f_initial.0);
        crate::field::FieldArithmetic::maybe_set(&mut f, &g, 1);
        assert_eq!(f.0, g.0);
    }

    #[test]
    fn wide_products_are_carried() {
        let big = FieldElement([
            (1 << 26) - 1,
            (1 << 25) - 1,
            (1 << 26) - 1,
            (1 << 25) - 1,
            (1 << 26) - 1,
            (1 << 25) - 1,
            (1 << 26) - 1,
            (1 << 25) - 1,
            (1 << 26) - 1,
            (1 << 25) - 1,
        ]);
        let h = (big * big).0;
        for (i, &hi) in h.iter().enumerate() {
            let bound = if i % 2 == 0 { 1 << 25 } else { 1 << 24 };
            assert!(hi.abs() <= bound + bound / 100 + 1);
        }
    }
}
