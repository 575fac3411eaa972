pub const QUOTE: u8 = b'"';
pub const BACKSLASH: u8 = b'\\';
pub const COLON: u8 = b':';
pub const COMMA: u8 = b',';
pub const HYPHEN: u8 = b'-';
pub const PLUS: u8 = b'+';
pub const DOT: u8 = b'.';
pub const OPEN_CURLY: u8 = b'{';
pub const CLOSE_CURLY: u8 = b'}';
pub const OPEN_BRACKET: u8 = b'[';
pub const CLOSE_BRACKET: u8 = b']';

pub const DEFAULT_BUFFER_SIZE: usize = 16 * 1024;

pub const MAX_DEPTH: usize = 256;

/// Slots in a type descriptor's direct lookup table. Must be a power of two.
pub const QUICK_LOOKUP_SIZE: usize = 32;

#[inline]
pub fn is_whitespace(byte: u8) -> bool {
    matches!(byte, b' ' | b'\t' | b'\n' | b'\r')
}

#[inline]
pub fn starts_number(byte: u8) -> bool {
    byte == HYPHEN || byte.is_ascii_digit()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[rstest::rstest]
    fn test_is_whitespace() {
        assert!(is_whitespace(b' '));
        assert!(is_whitespace(b'\t'));
        assert!(is_whitespace(b'\n'));
        assert!(is_whitespace(b'\r'));
        assert!(!is_whitespace(b'a'));
        assert!(!is_whitespace(0x0b));
    }

    #[rstest::rstest]
    fn test_starts_number() {
        assert!(starts_number(b'-'));
        assert!(starts_number(b'0'));
        assert!(starts_number(b'9'));
        assert!(!starts_number(b'+'));
        assert!(!starts_number(b'.'));
    }

    #[rstest::rstest]
    fn test_quick_lookup_is_power_of_two() {
        assert!(QUICK_LOOKUP_SIZE.is_power_of_two());
    }
}
