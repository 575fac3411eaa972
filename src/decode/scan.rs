use memchr::memchr2;

use crate::constants::{BACKSLASH, QUOTE};
use crate::text::string::hash_step;

/// Running state of a search for a string's closing quote.
///
/// The state survives buffer refills, so a search may stop at the end of the
/// available bytes and resume later without rescanning escapes.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct QuoteScan {
    /// The last byte seen was a backslash that has not been consumed yet.
    pending_escape: bool,
    pub(crate) has_escapes: bool,
    pub(crate) multibyte: bool,
}

impl QuoteScan {
    /// Where to resume after more bytes arrived behind the `scanned` prefix.
    /// Rewinds to a code point boundary unless an escape is still pending.
    pub(crate) fn resume_point(&self, bytes: &[u8], scanned: usize) -> usize {
        if self.pending_escape {
            scanned
        } else {
            rewind_to_boundary(bytes, scanned)
        }
    }
}

/// `QuoteScan` that also hashes every byte it passes.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct NameScan {
    pub(crate) quote: QuoteScan,
    pub(crate) hash: u32,
}

/// Finds the index of the closing quote in `bytes[from..]`, classifying
/// whether any byte had its high bit set. `None` means more input is needed.
pub(crate) fn find_closing_quote(bytes: &[u8], from: usize, state: &mut QuoteScan) -> Option<usize> {
    for (idx, &byte) in bytes.iter().enumerate().skip(from) {
        if state.pending_escape {
            state.pending_escape = false;
            state.multibyte |= byte >= 0x80;
            continue;
        }
        match byte {
            QUOTE => return Some(idx),
            BACKSLASH => {
                state.pending_escape = true;
                state.has_escapes = true;
            }
            _ => state.multibyte |= byte >= 0x80,
        }
    }
    None
}

/// `memchr`-driven variant for ASCII mode; does not classify multi-byte input.
pub(crate) fn find_closing_quote_ascii(
    bytes: &[u8],
    from: usize,
    state: &mut QuoteScan,
) -> Option<usize> {
    let mut idx = from;
    if state.pending_escape {
        if idx >= bytes.len() {
            return None;
        }
        state.pending_escape = false;
        idx += 1;
    }
    while idx < bytes.len() {
        let offset = memchr2(QUOTE, BACKSLASH, &bytes[idx..])?;
        let pos = idx + offset;
        if bytes[pos] == QUOTE {
            return Some(pos);
        }
        state.has_escapes = true;
        if pos + 1 < bytes.len() {
            idx = pos + 2;
        } else {
            state.pending_escape = true;
            return None;
        }
    }
    None
}

/// Finds the closing quote of a member name while hashing the raw bytes in
/// front of it, so matching a name never materializes a `String`.
pub(crate) fn find_closing_quote_and_hash(
    bytes: &[u8],
    from: usize,
    state: &mut NameScan,
) -> Option<usize> {
    for (idx, &byte) in bytes.iter().enumerate().skip(from) {
        if state.quote.pending_escape {
            state.quote.pending_escape = false;
        } else if byte == QUOTE {
            return Some(idx);
        } else if byte == BACKSLASH {
            state.quote.pending_escape = true;
            state.quote.has_escapes = true;
        }
        state.quote.multibyte |= byte >= 0x80;
        state.hash = hash_step(state.hash, byte);
    }
    None
}

#[inline]
fn is_continuation(byte: u8) -> bool {
    byte & 0b1100_0000 == 0b1000_0000
}

/// Walks back from `index` to the first byte of the code point that contains
/// it, so a rescan never starts in the middle of a multi-byte sequence.
pub(crate) fn rewind_to_boundary(bytes: &[u8], index: usize) -> usize {
    let mut index = index.min(bytes.len());
    while index > 0 && index < bytes.len() && is_continuation(bytes[index]) {
        index -= 1;
    }
    index
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::string::wire_hash;

    #[rstest::rstest]
    #[case(br#"abc""#, Some(3))]
    #[case(br#"a\"b""#, Some(4))]
    #[case(br#"a\\""#, Some(3))]
    #[case(br#"a\\\"""#, Some(5))]
    #[case(br#"abc"#, None)]
    fn test_find_closing_quote(#[case] input: &[u8], #[case] expected: Option<usize>) {
        let mut state = QuoteScan::default();
        assert_eq!(find_closing_quote(input, 0, &mut state), expected);
        let mut state = QuoteScan::default();
        assert_eq!(find_closing_quote_ascii(input, 0, &mut state), expected);
    }

    #[rstest::rstest]
    fn test_escape_state_survives_resume() {
        let input = br#"ab\"c""#;
        let mut state = QuoteScan::default();
        assert_eq!(find_closing_quote(&input[..3], 0, &mut state), None);
        assert_eq!(find_closing_quote(input, 3, &mut state), Some(5));
        assert!(state.has_escapes);

        let mut state = QuoteScan::default();
        assert_eq!(find_closing_quote_ascii(&input[..3], 0, &mut state), None);
        assert_eq!(find_closing_quote_ascii(input, 3, &mut state), Some(5));
    }

    #[rstest::rstest]
    fn test_multibyte_is_classified() {
        let mut state = QuoteScan::default();
        assert_eq!(find_closing_quote(b"plain\"", 0, &mut state), Some(5));
        assert!(!state.multibyte);

        let input = "caf\u{e9}\"".as_bytes();
        let mut state = QuoteScan::default();
        assert_eq!(find_closing_quote(input, 0, &mut state), Some(5));
        assert!(state.multibyte);
    }

    #[rstest::rstest]
    fn test_name_hash_matches_wire_hash() {
        let mut state = NameScan::default();
        assert_eq!(find_closing_quote_and_hash(b"menuitem\": 1", 0, &mut state), Some(8));
        assert_eq!(state.hash, wire_hash(b"menuitem"));
        assert!(!state.quote.has_escapes);
    }

    #[rstest::rstest]
    fn test_name_hash_resumes_without_double_counting() {
        let mut state = NameScan::default();
        let input = b"popup\"";
        assert_eq!(find_closing_quote_and_hash(&input[..2], 0, &mut state), None);
        assert_eq!(find_closing_quote_and_hash(input, 2, &mut state), Some(5));
        assert_eq!(state.hash, wire_hash(b"popup"));
    }

    #[rstest::rstest]
    fn test_rewind_to_boundary() {
        let bytes = "a\u{20ac}b".as_bytes();
        assert_eq!(bytes.len(), 5);
        assert_eq!(rewind_to_boundary(bytes, 0), 0);
        assert_eq!(rewind_to_boundary(bytes, 1), 1);
        assert_eq!(rewind_to_boundary(bytes, 2), 1);
        assert_eq!(rewind_to_boundary(bytes, 3), 1);
        assert_eq!(rewind_to_boundary(bytes, 4), 4);
        assert_eq!(rewind_to_boundary(bytes, 5), 5);
        assert_eq!(rewind_to_boundary(bytes, 9), 5);
    }
}
