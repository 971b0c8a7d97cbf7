//! GTIN check digit arithmetic shared by EAN-13 and UPC-A
//!
//! Both symbologies use the same mod-10 scheme; they differ only in which
//! positions carry weight 3.

/// EAN-13 check digit over the first 12 digits (weights 1,3,1,3,...)
pub fn ean13_check_digit(digits: &[u8; 12]) -> u8 {
    weighted_check_digit(digits, 1, 3)
}

/// UPC-A check digit over the first 11 digits (weights 3,1,3,1,...)
pub fn upca_check_digit(digits: &[u8; 11]) -> u8 {
    weighted_check_digit(digits, 3, 1)
}

/// `(10 - (sum mod 10)) mod 10` where even (0-based) positions get `even_weight`
fn weighted_check_digit(digits: &[u8], even_weight: u32, odd_weight: u32) -> u8 {
    let sum: u32 = digits
        .iter()
        .enumerate()
        .map(|(i, &d)| d as u32 * if i % 2 == 0 { even_weight } else { odd_weight })
        .sum();
    ((10 - sum % 10) % 10) as u8
}

/// Convert ASCII digits to their values; `None` on length mismatch or non-digit
pub(crate) fn digit_values<const N: usize>(ascii: &[u8]) -> Option<[u8; N]> {
    if ascii.len() != N {
        return None;
    }
    let mut out = [0u8; N];
    for (slot, &b) in out.iter_mut().zip(ascii) {
        if !b.is_ascii_digit() {
            return None;
        }
        *slot = b - b'0';
    }
    Some(out)
}

/// Whether a full 13-digit EAN code carries the right check digit
pub fn ean13_matches(digits: &[u8; 13]) -> bool {
    let (body, check) = digits.split_at(12);
    weighted_check_digit(body, 1, 3) == check[0]
}

/// Whether a full 12-digit UPC-A code carries the right check digit
pub fn upca_matches(digits: &[u8; 12]) -> bool {
    let (body, check) = digits.split_at(11);
    weighted_check_digit(body, 3, 1) == check[0]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ean13_check_digit() {
        assert_eq!(ean13_check_digit(&[4, 0, 0, 6, 3, 8, 1, 3, 3, 3, 9, 3]), 1);
        assert_eq!(ean13_check_digit(&[5, 9, 0, 1, 2, 3, 4, 1, 2, 3, 4, 5]), 7);
        // Sum divisible by 10 must give 0, not 10
        assert_eq!(ean13_check_digit(&[0; 12]), 0);
    }

    #[test]
    fn test_upca_check_digit() {
        assert_eq!(upca_check_digit(&[0, 3, 6, 0, 0, 0, 2, 9, 1, 4, 5]), 2);
        assert_eq!(upca_check_digit(&[0; 11]), 0);
    }

    #[test]
    fn test_full_code_matches() {
        assert!(ean13_matches(&[4, 0, 0, 6, 3, 8, 1, 3, 3, 3, 9, 3, 1]));
        assert!(!ean13_matches(&[4, 0, 0, 6, 3, 8, 1, 3, 3, 3, 9, 3, 2]));
        assert!(ean13_matches(&[0; 13]));
        assert!(upca_matches(&[0, 3, 6, 0, 0, 0, 2, 9, 1, 4, 5, 2]));
        assert!(!upca_matches(&[0, 3, 6, 0, 0, 0, 2, 9, 1, 4, 5, 3]));
    }

    #[test]
    fn test_matches_agree_with_check_digit() {
        let body = [5, 9, 0, 1, 2, 3, 4, 1, 2, 3, 4, 5];
        for check in 0..10u8 {
            let mut full = [0u8; 13];
            full[..12].copy_from_slice(&body);
            full[12] = check;
            assert_eq!(ean13_matches(&full), check == ean13_check_digit(&body));
        }
    }

    #[test]
    fn test_digit_values() {
        assert_eq!(digit_values::<3>(b"907"), Some([9, 0, 7]));
        assert_eq!(digit_values::<3>(b"9a7"), None);
        assert_eq!(digit_values::<3>(b"90"), None);
    }
}
