//! Bounded copy helpers
//!
//! Every fixed-capacity boundary in the communication layer (parameter names,
//! status text, actuator channel arrays) goes through [`copy_bounded`], so the
//! number of elements moved is always `min(dst.len(), src.len())`.

/// Copy as many leading elements of `src` into `dst` as fit
///
/// Elements of `dst` past the copied prefix are left untouched. Returns the
/// number of elements copied.
///
/// # Example
///
/// ```
/// use rosflight_comms::core::bounded::copy_bounded;
///
/// let mut name = [0u8; 4];
/// assert_eq!(copy_bounded(&mut name, b"ROLL_RATE"), 4);
/// assert_eq!(&name, b"ROLL");
/// ```
pub fn copy_bounded<T: Copy>(dst: &mut [T], src: &[T]) -> usize {
    let len = dst.len().min(src.len());
    dst[..len].copy_from_slice(&src[..len]);
    len
}

/// Copy a string into a nul-padded fixed-width field
///
/// The string is cut at the first nul byte (if any) and truncated to the
/// field width; the remainder of the field is zeroed. A full-width string is
/// not nul-terminated, matching MAVLink `char[N]` semantics.
pub fn copy_nul_padded<const N: usize>(src: &[u8]) -> [u8; N] {
    let mut out = [0u8; N];
    let end = src.iter().position(|&b| b == 0).unwrap_or(src.len());
    copy_bounded(&mut out, &src[..end]);
    out
}

/// Length of a nul-padded field's content
pub fn nul_terminated_len(field: &[u8]) -> usize {
    field.iter().position(|&b| b == 0).unwrap_or(field.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_copy_bounded_truncates_to_destination() {
        let mut dst = [0u8; 3];
        assert_eq!(copy_bounded(&mut dst, &[1, 2, 3, 4, 5]), 3);
        assert_eq!(dst, [1, 2, 3]);
    }

    #[test]
    fn test_copy_bounded_short_source_leaves_tail() {
        let mut dst = [9u8; 4];
        assert_eq!(copy_bounded(&mut dst, &[1, 2]), 2);
        assert_eq!(dst, [1, 2, 9, 9]);
    }

    #[test]
    fn test_copy_bounded_empty() {
        let mut dst: [u16; 0] = [];
        assert_eq!(copy_bounded(&mut dst, &[1, 2]), 0);
    }

    #[test]
    fn test_copy_nul_padded() {
        let field: [u8; 8] = copy_nul_padded(b"GAIN");
        assert_eq!(&field, b"GAIN\0\0\0\0");

        let field: [u8; 4] = copy_nul_padded(b"GAIN_ROLL");
        assert_eq!(&field, b"GAIN");

        // Content after an embedded nul is dropped
        let field: [u8; 6] = copy_nul_padded(b"AB\0CD");
        assert_eq!(&field, b"AB\0\0\0\0");
    }

    #[test]
    fn test_nul_terminated_len() {
        assert_eq!(nul_terminated_len(b"ABC\0\0"), 3);
        assert_eq!(nul_terminated_len(b"ABCDE"), 5);
        assert_eq!(nul_terminated_len(b"\0"), 0);
    }
}
