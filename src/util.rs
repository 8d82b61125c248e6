extern "C" {
    fn fixed_time_eq_c(lhsp: *const u8, rhsp: *const u8, count: usize) -> u32;
}

/// Compare two slices using a fixed number of operations. If the two slices
/// are not of equal length, the function returns false immediately.
pub fn fixed_time_eq(lhs: &[u8], rhs: &[u8]) -> bool {
    if lhs.len() != rhs.len() {
        false
    } else {
        unsafe { fixed_time_eq_c(lhs.as_ptr(), rhs.as_ptr(), lhs.len()) == 0 }
    }
}

// 1 if b == c, 0 otherwise.
#[inline]
pub(crate) fn equal(b: u8, c: u8) -> u8 {
    let x = b ^ c; // 0: yes; 1..255: no
    let mut y = u32::from(x); // 0: yes; 1..255: no
    y = y.wrapping_sub(1); // 4294967295: yes; 0..254: no
    y >>= 31; // 1: yes; 0: no
    y as u8
}

// 1 if b < 0, 0 otherwise.
#[inline]
pub(crate) fn negative(b: i8) -> u8 {
    let mut x = i64::from(b) as u64;
    x >>= 63; // 1: yes; 0: no
    x as u8
}

#[cfg(test)]
mod tests {
    use super::{equal, fixed_time_eq, negative};

    #[test]
    fn fixed_time_eq_compares_contents() {
        let a = [1u8, 2, 3, 4];
        let mut b = a;
        assert!(fixed_time_eq(&a, &b));
        b[3] ^= 0x80;
        assert!(!fixed_time_eq(&a, &b));
        assert!(!fixed_time_eq(&a, &a[..3]));
        assert!(fixed_time_eq(&[], &[]));
    }

    #[test]
    fn byte_predicates() {
        assert_eq!(equal(7, 7), 1);
        assert_eq!(equal(7, 8), 0);
        assert_eq!(equal(0, 255), 0);
        assert_eq!(negative(-1), 1);
        assert_eq!(negative(-128), 1);
        assert_eq!(negative(0), 0);
        assert_eq!(negative(127), 0);
    }
}
