//! Arithmetic modulo the prime order of the base point,
//! `l = 2^252 + 27742317777372353535851937790883648493`.
//!
//! Scalars are 32-byte little-endian strings. Internally they are split
//! into signed 21-bit limbs with 64-bit headroom, and reductions fold the
//! limbs above 2^252 back using `2^252 = -27742317777372353535851937790883648493 (mod l)`.
//! Nothing here branches on or indexes by scalar values.

use crate::util::fixed_time_eq;
use rand::{CryptoRng, Error as RndError, RngCore};

/// l, little-endian.
pub const L: [u8; 32] = [
    0xed, 0xd3, 0xf5, 0x5c, 0x1a, 0x63, 0x12, 0x58, 0xd6, 0x9c, 0xf7, 0xa2,
    0xde, 0xf9, 0xde, 0x14, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x10,
];

const LIMB_BITS: usize = 21;
const LIMB_MASK: i64 = (1 << LIMB_BITS) - 1;

// -2^252 mod l as six signed 21-bit digits; limb i+12 folds into limbs
// i..i+5 with these weights.
const FOLD: [i64; 6] = [666_643, 470_296, 654_183, -997_805, 136_657, -683_901];

// Limbs of 21 bits starting at bit 21*k. The last limb keeps every
// remaining bit.
fn load_limbs(s: &[u8], out: &mut [i64]) {
    let n = out.len();
    for (k, limb) in out.iter_mut().enumerate() {
        let bit = LIMB_BITS * k;
        let byte = bit / 8;
        let mut v = 0i64;
        for (j, &b) in s[byte..].iter().take(4).enumerate() {
            v |= i64::from(b) << (8 * j);
        }
        v >>= bit % 8;
        if k + 1 < n {
            v &= LIMB_MASK;
        }
        *limb = v;
    }
}

#[inline]
fn fold(s: &mut [i64; 24], i: usize) {
    for (j, &w) in FOLD.iter().enumerate() {
        s[i - 12 + j] += s[i] * w;
    }
    s[i] = 0;
}

// Carry rounded to the nearest multiple of 2^21, so limbs stay signed and
// small in magnitude.
#[inline]
fn carry_rounded(s: &mut [i64; 24], i: usize) {
    let c = (s[i] + (1 << (LIMB_BITS - 1))) >> LIMB_BITS;
    s[i + 1] += c;
    s[i] -= c << LIMB_BITS;
}

#[inline]
fn carry_floor(s: &mut [i64; 24], i: usize) {
    let c = s[i] >> LIMB_BITS;
    s[i + 1] += c;
    s[i] -= c << LIMB_BITS;
}

// Reduces 24 limbs of at most 2^21 in magnitude (the top one may hold a
// few more bits) to the canonical residue mod l.
fn reduce_limbs(mut s: [i64; 24]) -> [u8; 32] {
    for i in (18..24).rev() {
        fold(&mut s, i);
    }
    for i in (6..17).step_by(2) {
        carry_rounded(&mut s, i);
    }
    for i in (7..16).step_by(2) {
        carry_rounded(&mut s, i);
    }

    for i in (12..18).rev() {
        fold(&mut s, i);
    }
    for i in (0..11).step_by(2) {
        carry_rounded(&mut s, i);
    }
    for i in (1..12).step_by(2) {
        carry_rounded(&mut s, i);
    }

    // Limbs are now small but possibly negative; two more folds of the
    // overflow limb with floor carries bring every limb into [0, 2^21).
    fold(&mut s, 12);
    for i in 0..12 {
        carry_floor(&mut s, i);
    }
    fold(&mut s, 12);
    for i in 0..11 {
        carry_floor(&mut s, i);
    }

    let mut out = [0u8; 32];
    let mut acc: u64 = 0;
    let mut acc_bits = 0;
    let mut k = 0;
    for &limb in s.iter().take(12) {
        acc |= (limb as u64) << acc_bits;
        acc_bits += LIMB_BITS;
        while acc_bits >= 8 {
            out[k] = acc as u8;
            acc >>= 8;
            acc_bits -= 8;
            k += 1;
        }
    }
    // 252 bits: 31 whole bytes and 4 bits left over
    out[31] = acc as u8;
    out
}

/// Input:
///   `s[0]+256*s[1]+...+256^63*s[63] = s`
///
/// Output:
///   `s[0]+256*s[1]+...+256^31*s[31] = s mod l`,
///   written over the first 32 bytes of `s`. The upper 32 bytes are left
///   untouched.
pub fn sc_reduce(s: &mut [u8; 64]) {
    let mut limbs = [0i64; 24];
    load_limbs(&s[..], &mut limbs);
    let r = reduce_limbs(limbs);
    s[..32].copy_from_slice(&r);
}

/// Input:
///   `a[0]+256*a[1]+...+256^31*a[31] = a`
///   `b[0]+256*b[1]+...+256^31*b[31] = b`
///   `c[0]+256*c[1]+...+256^31*c[31] = c`
///
/// Output:
///   `s[0]+256*s[1]+...+256^31*s[31] = (ab+c) mod l`
///
/// The product is accumulated in 21-bit limbs and reduced directly, never
/// materialised as a 64-byte integer. `s` may not alias the inputs, which
/// the borrow rules already guarantee.
pub fn sc_muladd(s: &mut [u8; 32], a: &[u8; 32], b: &[u8; 32], c: &[u8; 32]) {
    let mut al = [0i64; 12];
    let mut bl = [0i64; 12];
    let mut cl = [0i64; 12];
    load_limbs(a, &mut al);
    load_limbs(b, &mut bl);
    load_limbs(c, &mut cl);

    let mut t = [0i64; 24];
    t[..12].copy_from_slice(&cl);
    for (i, &ai) in al.iter().enumerate() {
        for (j, &bj) in bl.iter().enumerate() {
            t[i + j] += ai * bj;
        }
    }

    for i in (0..23).step_by(2) {
        carry_rounded(&mut t, i);
    }
    for i in (1..22).step_by(2) {
        carry_rounded(&mut t, i);
    }

    *s = reduce_limbs(t);
}

/// `(a * b) mod l`
pub fn sc_mul(a: &[u8; 32], b: &[u8; 32]) -> [u8; 32] {
    let mut s = [0u8; 32];
    sc_muladd(&mut s, a, b, &[0u8; 32]);
    s
}

/// `s^2 mod l`
pub fn sc_sq(s: &[u8; 32]) -> [u8; 32] {
    sc_mul(s, s)
}

/// Embeds a 64-bit value as a scalar.
pub fn sc_load_uint64(n: u64) -> [u8; 32] {
    let mut s = [0u8; 32];
    s[..8].copy_from_slice(&n.to_le_bytes());
    s
}

/// Whether `s < l`. Scans every byte regardless of where the decision
/// is made.
pub fn sc_is_canonical(s: &[u8; 32]) -> bool {
    let mut c: u32 = 0;
    let mut n: u32 = 1;
    for i in (0..32).rev() {
        let si = u32::from(s[i]);
        let li = u32::from(L[i]);
        // c picks up s[i] < l[i] at the first differing byte from the top
        c |= (si.wrapping_sub(li) >> 8) & n;
        // n stays 1 while every byte so far equals the corresponding l byte
        n &= ((si ^ li).wrapping_sub(1)) >> 8;
    }
    c != 0
}

pub fn sc_is_zero(s: &[u8; 32]) -> bool {
    fixed_time_eq(s, &[0u8; 32])
}

/// Multiplicative inverse `s^(l-2) mod l`, by square-and-multiply over the
/// bits of the public exponent. Maps zero to zero.
pub fn sc_invert(s: &[u8; 32]) -> [u8; 32] {
    let mut e = L;
    // l ends in 0xed, so subtracting 2 never borrows
    e[0] -= 2;

    let mut r = sc_load_uint64(1);
    for i in (0..253).rev() {
        r = sc_sq(&r);
        if (e[i >> 3] >> (i & 7)) & 1 == 1 {
            r = sc_mul(&r, s);
        }
    }
    r
}

fn widen(s: &[u8; 32]) -> [u8; 64] {
    let mut w = [0u8; 64];
    w[..32].copy_from_slice(s);
    w
}

// a += b over 64 bytes, discarding the final carry.
fn add_wide(a: &mut [u8; 64], b: &[u8; 64]) {
    let mut c: u16 = 0;
    for (ai, &bi) in a.iter_mut().zip(b.iter()) {
        c += u16::from(*ai) + u16::from(bi);
        *ai = c as u8;
        c >>= 8;
    }
}

// a -= b over 64 bytes, modulo 2^512.
fn sub_wide(a: &mut [u8; 64], b: &[u8; 64]) {
    let mut borrow: u16 = 0;
    for (ai, &bi) in a.iter_mut().zip(b.iter()) {
        let d = u16::from(*ai)
            .wrapping_sub(u16::from(bi))
            .wrapping_sub(borrow);
        *ai = d as u8;
        borrow = (d >> 8) & 1;
    }
}

fn reduced(mut w: [u8; 64]) -> [u8; 32] {
    sc_reduce(&mut w);
    let mut s = [0u8; 32];
    s.copy_from_slice(&w[..32]);
    s
}

/// `(x + y) mod l`. The inputs need not be reduced.
pub fn sc_add(x: &[u8; 32], y: &[u8; 32]) -> [u8; 32] {
    let mut w = widen(x);
    add_wide(&mut w, &widen(y));
    reduced(w)
}

/// `(x - y) mod l`
pub fn sc_sub(x: &[u8; 32], y: &[u8; 32]) -> [u8; 32] {
    sc_add(x, &sc_negate(y))
}

/// `-s mod l`, computed as `l * 2^256 - s` and reduced, which is defined
/// for any 256-bit `s`.
pub fn sc_negate(s: &[u8; 32]) -> [u8; 32] {
    let mut w = [0u8; 64];
    w[32..].copy_from_slice(&L);
    sub_wide(&mut w, &widen(s));
    reduced(w)
}

/// `(1 - s) mod l`
pub fn sc_complement(s: &[u8; 32]) -> [u8; 32] {
    let mut w = [0u8; 64];
    w[0] = 1;
    w[32..].copy_from_slice(&L);
    sub_wide(&mut w, &widen(s));
    reduced(w)
}

/// A uniformly distributed nonzero scalar below l.
///
/// Draws 253-bit candidates and rejects the ones at or above l (about
/// half of them) or equal to zero.
pub fn sc_random<R: RngCore + CryptoRng>(
    rng: &mut R,
) -> Result<[u8; 32], RndError> {
    let mut r = [0u8; 32];
    loop {
        rng.try_fill_bytes(&mut r)?;
        r[31] &= 0x1f;
        if sc_is_canonical(&r) && !sc_is_zero(&r) {
            return Ok(r);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    fn random_scalar(rng: &mut StdRng) -> [u8; 32] {
        let mut wide = [0u8; 64];
        rng.fill(&mut wide[..]);
        reduced(wide)
    }

    // a * b as a full 64-byte integer, by schoolbook on bytes.
    fn wide_product(a: &[u8; 32], b: &[u8; 32]) -> [u8; 64] {
        let mut acc = [0u64; 64];
        for i in 0..32 {
            for j in 0..32 {
                acc[i + j] += u64::from(a[i]) * u64::from(b[j]);
            }
        }
        let mut out = [0u8; 64];
        let mut carry = 0u64;
        for (o, &v) in out.iter_mut().zip(acc.iter()) {
            carry += v;
            *o = carry as u8;
            carry >>= 8;
        }
        out
    }

    #[test]
    fn reduce_known_values() {
        // l reduces to zero, l + 1 to one
        assert_eq!(reduced(widen(&L)), [0u8; 32]);
        let mut l_plus_one = L;
        l_plus_one[0] += 1;
        assert_eq!(reduced(widen(&l_plus_one)), sc_load_uint64(1));

        assert_eq!(
            reduced([0xff; 64]),
            hex!("000f9c44e31106a447938568a71b0ed065bef517d273ecce3d9a307c1b419903")
        );
        assert_eq!(
            reduced(widen(&[0xff; 32])),
            hex!("1c95988d7431ecd670cf7d73f45befc6feffffffffffffffffffffffffffff0f")
        );
    }

    #[test]
    fn reduce_leaves_upper_half() {
        let mut s = [0u8; 64];
        s[40] = 7;
        sc_reduce(&mut s);
        assert_eq!(s[40], 7);
    }

    #[test]
    fn muladd_matches_reduce_of_product() {
        let mut rng = StdRng::seed_from_u64(97);
        for _ in 0..50 {
            let a = random_scalar(&mut rng);
            let b = random_scalar(&mut rng);
            let c = random_scalar(&mut rng);

            let mut wide = wide_product(&a, &b);
            add_wide(&mut wide, &widen(&c));
            let expected = reduced(wide);

            let mut s = [0u8; 32];
            sc_muladd(&mut s, &a, &b, &c);
            assert_eq!(s, expected);
            assert!(sc_is_canonical(&s));
        }
    }

    #[test]
    fn muladd_accepts_unreduced_inputs() {
        let max = [0xffu8; 32];
        let mut wide = wide_product(&max, &max);
        add_wide(&mut wide, &widen(&max));
        let mut s = [0u8; 32];
        sc_muladd(&mut s, &max, &max, &max);
        assert_eq!(s, reduced(wide));
    }

    #[test]
    fn mul_commutes_and_has_identity() {
        let mut rng = StdRng::seed_from_u64(98);
        let one = sc_load_uint64(1);
        for _ in 0..20 {
            let a = random_scalar(&mut rng);
            let b = random_scalar(&mut rng);
            assert_eq!(sc_mul(&a, &b), sc_mul(&b, &a));
            assert_eq!(sc_mul(&a, &one), a);
            assert_eq!(sc_sq(&a), sc_mul(&a, &a));
        }
        assert_eq!(
            sc_mul(&sc_load_uint64(6), &sc_load_uint64(7)),
            sc_load_uint64(42)
        );
    }

    #[test]
    fn canonical_bounds() {
        assert!(!sc_is_canonical(&L));
        let mut l_minus_one = L;
        l_minus_one[0] -= 1;
        assert!(sc_is_canonical(&l_minus_one));
        let mut l_plus_one = L;
        l_plus_one[0] += 1;
        assert!(!sc_is_canonical(&l_plus_one));
        assert!(sc_is_canonical(&[0u8; 32]));
        assert!(!sc_is_canonical(&[0xffu8; 32]));
        // differs from l only below the top byte
        let mut high = L;
        high[15] = 0x15;
        assert!(!sc_is_canonical(&high));
        high[15] = 0x13;
        assert!(sc_is_canonical(&high));
    }

    #[test]
    fn non_canonical_scalars_reduce() {
        let mut l_plus_five = L;
        l_plus_five[0] += 5;
        assert!(!sc_is_canonical(&l_plus_five));
        assert_eq!(reduced(widen(&l_plus_five)), sc_load_uint64(5));
        assert_eq!(sc_add(&l_plus_five, &[0u8; 32]), sc_load_uint64(5));
    }

    #[test]
    fn invert() {
        let mut rng = StdRng::seed_from_u64(99);
        let one = sc_load_uint64(1);
        for _ in 0..4 {
            let a = random_scalar(&mut rng);
            assert_eq!(sc_mul(&a, &sc_invert(&a)), one);
        }
        assert_eq!(sc_invert(&one), one);
        assert_eq!(sc_invert(&[0u8; 32]), [0u8; 32]);
    }

    #[test]
    fn add_sub_negate_complement() {
        let mut rng = StdRng::seed_from_u64(100);
        let zero = [0u8; 32];
        let one = sc_load_uint64(1);
        for _ in 0..20 {
            let a = random_scalar(&mut rng);
            let b = random_scalar(&mut rng);
            assert_eq!(sc_sub(&sc_add(&a, &b), &b), a);
            assert_eq!(sc_add(&a, &sc_negate(&a)), zero);
            assert_eq!(sc_add(&a, &sc_complement(&a)), one);
            assert_eq!(sc_sub(&a, &b), sc_negate(&sc_sub(&b, &a)));
        }
        assert_eq!(sc_negate(&zero), zero);
        assert_eq!(sc_complement(&zero), one);
        let mut l_minus_one = L;
        l_minus_one[0] -= 1;
        assert_eq!(sc_negate(&one), l_minus_one);
        // the largest 256-bit input is handled as well
        let max = [0xffu8; 32];
        assert_eq!(sc_add(&max, &sc_negate(&max)), zero);
    }

    #[test]
    fn load_uint64() {
        let s = sc_load_uint64(0x0102_0304_0506_0708);
        assert_eq!(&s[..8], &[8, 7, 6, 5, 4, 3, 2, 1]);
        assert!(s[8..].iter().all(|&b| b == 0));
        assert!(sc_is_canonical(&sc_load_uint64(u64::max_value())));
    }

    #[test]
    fn random_scalars_are_canonical_and_nonzero() {
        let mut rng = StdRng::seed_from_u64(101);
        for _ in 0..16 {
            let s = sc_random(&mut rng).unwrap();
            assert!(sc_is_canonical(&s));
            assert!(!sc_is_zero(&s));
        }
    }
}
