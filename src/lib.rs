//! Arithmetic core for Ed25519 and Ristretto255.
//!
//! - [`FieldElement`]: GF(2^255-19), backed by five 51-bit limbs on 64-bit
//!   targets and ten 25.5-bit limbs elsewhere (or with the `fe-25-5`
//!   feature).
//! - [`ge`]: points of the twisted Edwards curve in the ref10
//!   representations, with constant-time fixed- and variable-base scalar
//!   multiplication, encoding, validation and hash-to-curve.
//! - [`ristretto`]: the prime-order Ristretto255 group built on those
//!   points.
//! - [`scalar`]: arithmetic modulo the group order l.
//!
//! All byte strings are little-endian. Operations on secret data are
//! constant time; the few that are not carry `vartime` in their name.
#![warn(clippy::all)]
#![allow(
    clippy::suspicious_arithmetic_impl,
    clippy::many_single_char_names,
    clippy::unknown_clippy_lints
)]
#![no_std]

#[cfg(feature = "std")]
extern crate std;

mod error;
// Both backends are always built; only one is named `FieldElement`.
#[cfg_attr(not(test), allow(dead_code))]
mod fe_25_5;
#[cfg_attr(not(test), allow(dead_code))]
mod fe_51;
mod field;
pub mod ge;
pub mod ristretto;
pub mod scalar;
mod statics;
mod util;

#[cfg(any(feature = "fe-25-5", not(target_pointer_width = "64")))]
pub use crate::fe_25_5::FieldElement;
#[cfg(not(any(feature = "fe-25-5", not(target_pointer_width = "64"))))]
pub use crate::fe_51::FieldElement;

pub use crate::{
    error::Error,
    field::FieldArithmetic,
    ge::{
        ge_add, ge_from_hash, ge_from_uniform, ge_has_small_order,
        ge_is_canonical, ge_is_valid_point, ge_random, ge_scalarmult_base,
        ge_sub, GeCached, GeP1P1, GeP2, GeP3, GePrecomp,
    },
    ristretto::{
        ristretto255_from_hash, ristretto255_is_valid_point,
        ristretto255_random, RistrettoPoint,
    },
    scalar::{
        sc_add, sc_complement, sc_invert, sc_is_canonical, sc_is_zero,
        sc_load_uint64, sc_mul, sc_muladd, sc_negate, sc_random, sc_reduce,
        sc_sq, sc_sub,
    },
    util::fixed_time_eq,
};

#[cfg(test)]
mod tests {
    //! End-to-end checks tying the field, group and scalar layers together
    //! the way a signature scheme uses them.

    use super::*;
    use hex_literal::hex;
    use rand::{rngs::StdRng, SeedableRng};

    const BASE: [u8; 32] =
        hex!("5866666666666666666666666666666666666666666666666666666666666666");

    // Sign/verify shape: R = rB, S = r + ka, check SB == R + k(aB).
    #[test]
    fn schnorr_equation_holds() {
        let mut rng = StdRng::seed_from_u64(2018);
        for _ in 0..4 {
            let a = sc_random(&mut rng).unwrap();
            let r = sc_random(&mut rng).unwrap();
            let k = sc_random(&mut rng).unwrap();

            let big_a = ge_scalarmult_base(&a).to_bytes();
            let big_r = ge_scalarmult_base(&r).to_bytes();
            let mut s = [0u8; 32];
            sc_muladd(&mut s, &k, &a, &r);

            // SB - k A == R
            let neg_a = GeP3::from_bytes_negate_vartime(&big_a).unwrap();
            let check = GeP2::double_scalarmult_vartime(&k, &neg_a, &s);
            assert_eq!(check.to_bytes(), big_r);

            // the same through the constant-time byte helpers
            let ka = GeP3::from_bytes(&big_a).unwrap().scalarmult(&k).to_bytes();
            assert_eq!(ge_add(&big_r, &ka).unwrap(), ge_scalarmult_base(&s).to_bytes());
        }
    }

    #[test]
    fn scalar_inverse_undoes_point_multiplication() {
        let mut rng = StdRng::seed_from_u64(2019);
        let k = sc_random(&mut rng).unwrap();
        let p = GeP3::from_bytes(&BASE).unwrap().scalarmult(&k);
        let back = p.scalarmult(&sc_invert(&k));
        assert_eq!(back.to_bytes(), BASE);
    }

    #[test]
    fn ristretto_and_edwards_encodings_differ() {
        let one = sc_load_uint64(1);
        let edwards = ge_scalarmult_base(&one).to_bytes();
        let ristretto = RistrettoPoint::scalarmult_base(&one).to_bytes();
        assert_ne!(edwards, ristretto);
        // the Edwards base point encoding has the low bit clear but is not
        // the canonical Ristretto encoding of the base point
        if let Ok(p) = RistrettoPoint::from_bytes(&edwards) {
            assert_ne!(p, RistrettoPoint::scalarmult_base(&one));
        }
    }

    #[test]
    fn selected_backend_agrees_with_both_limb_widths() {
        let x = crate::fe_51::FieldElement::from_bytes(&BASE);
        let y = crate::fe_25_5::FieldElement::from_bytes(&BASE);
        assert_eq!(x.invert().to_bytes(), y.invert().to_bytes());
        assert_eq!(
            FieldElement::from_bytes(&BASE).invert().to_bytes(),
            y.invert().to_bytes()
        );
    }
}
