use memchr::memchr;

use crate::constants::BACKSLASH;
use crate::options::TextMode;
use crate::{Error, Result};

/// One step of the member-name hash.
#[inline]
pub fn hash_step(hash: u32, byte: u8) -> u32 {
    hash.wrapping_mul(31).wrapping_add(u32::from(byte))
}

/// Hash of a wire name's UTF-8 bytes, as computed while scanning member names.
pub fn wire_hash(bytes: &[u8]) -> u32 {
    bytes.iter().fold(0, |hash, &byte| hash_step(hash, byte))
}

/// Turns the raw bytes between two quotes into a `String`.
///
/// `multibyte` is the scanner's verdict on whether a high-bit byte was seen;
/// `None` means the scanner did not classify the token.
pub(crate) fn decode_text(
    bytes: &[u8],
    mode: TextMode,
    has_escapes: bool,
    multibyte: Option<bool>,
) -> Result<String> {
    if has_escapes {
        return unescape(bytes);
    }
    match (mode, multibyte) {
        (TextMode::Utf8, Some(false)) => Ok(ascii_to_string(bytes)),
        (TextMode::Utf8, _) => decode_utf8(bytes),
        (TextMode::Ascii, _) if bytes.is_ascii() => Ok(ascii_to_string(bytes)),
        (TextMode::Ascii, _) => decode_utf8(bytes),
    }
}

#[inline]
fn ascii_to_string(bytes: &[u8]) -> String {
    debug_assert!(bytes.is_ascii());
    bytes.iter().copied().map(char::from).collect()
}

fn decode_utf8(bytes: &[u8]) -> Result<String> {
    String::from_utf8(bytes.to_vec())
        .map_err(|err| Error::invalid_string(format!("invalid utf-8 in string: {err}")))
}

/// Decodes JSON escapes in the raw string body `bytes`.
pub(crate) fn unescape(bytes: &[u8]) -> Result<String> {
    let mut out = Vec::with_capacity(bytes.len());
    let mut idx = 0;
    while idx < bytes.len() {
        let Some(offset) = memchr(BACKSLASH, &bytes[idx..]) else {
            out.extend_from_slice(&bytes[idx..]);
            break;
        };
        let pos = idx + offset;
        out.extend_from_slice(&bytes[idx..pos]);
        let escape = *bytes
            .get(pos + 1)
            .ok_or_else(|| Error::invalid_string("unterminated escape"))?;
        idx = pos + 2;
        let ch = match escape {
            b'"' => '"',
            b'\\' => '\\',
            b'/' => '/',
            b'b' => '\u{08}',
            b'f' => '\u{0c}',
            b'n' => '\n',
            b'r' => '\r',
            b't' => '\t',
            b'u' => {
                let (ch, consumed) = decode_unicode_escape(&bytes[idx..])?;
                idx += consumed;
                ch
            }
            other => {
                return Err(Error::invalid_string(format!(
                    "invalid escape \\{}",
                    char::from(other)
                )))
            }
        };
        let mut utf8 = [0u8; 4];
        out.extend_from_slice(ch.encode_utf8(&mut utf8).as_bytes());
    }
    String::from_utf8(out)
        .map_err(|err| Error::invalid_string(format!("invalid utf-8 in string: {err}")))
}

/// Decodes the hex digits following `\u`, pairing surrogates. Returns the
/// character and the number of bytes consumed after the `u`.
fn decode_unicode_escape(bytes: &[u8]) -> Result<(char, usize)> {
    let first = read_hex4(bytes)?;
    match first {
        0xD800..=0xDBFF => {
            let rest = &bytes[4..];
            if rest.len() < 2 || rest[0] != BACKSLASH || rest[1] != b'u' {
                return Err(Error::invalid_string("unpaired surrogate in \\u escape"));
            }
            let second = read_hex4(&rest[2..])?;
            if !(0xDC00..=0xDFFF).contains(&second) {
                return Err(Error::invalid_string("invalid low surrogate in \\u escape"));
            }
            let code = 0x10000 + ((u32::from(first) - 0xD800) << 10) + (u32::from(second) - 0xDC00);
            let ch = char::from_u32(code)
                .ok_or_else(|| Error::invalid_string("invalid \\u escape"))?;
            Ok((ch, 10))
        }
        0xDC00..=0xDFFF => Err(Error::invalid_string("unpaired surrogate in \\u escape")),
        code => {
            let ch = char::from_u32(u32::from(code))
                .ok_or_else(|| Error::invalid_string("invalid \\u escape"))?;
            Ok((ch, 4))
        }
    }
}

fn read_hex4(bytes: &[u8]) -> Result<u16> {
    let digits = bytes
        .get(..4)
        .ok_or_else(|| Error::invalid_string("truncated \\u escape"))?;
    digits.iter().try_fold(0u16, |acc, &byte| {
        let digit = char::from(byte)
            .to_digit(16)
            .ok_or_else(|| Error::invalid_string("invalid hex digit in \\u escape"))?;
        Ok(acc * 16 + digit as u16)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[rstest::rstest]
    fn test_wire_hash_is_stable() {
        assert_eq!(wire_hash(b""), 0);
        assert_eq!(wire_hash(b"a"), 97);
        assert_eq!(wire_hash(b"ab"), 97 * 31 + 98);
        assert_ne!(wire_hash(b"id"), wire_hash(b"di"));
    }

    #[rstest::rstest]
    #[case(TextMode::Ascii)]
    #[case(TextMode::Utf8)]
    fn test_modes_agree_on_ascii(#[case] mode: TextMode) {
        let decoded = decode_text(b"New Window", mode, false, Some(false)).unwrap();
        assert_eq!(decoded, "New Window");
    }

    #[rstest::rstest]
    #[case(TextMode::Ascii)]
    #[case(TextMode::Utf8)]
    fn test_modes_keep_multibyte_text(#[case] mode: TextMode) {
        let raw = "Gr\u{fc}\u{df}e \u{1f600}".as_bytes();
        let decoded = decode_text(raw, mode, false, None).unwrap();
        assert_eq!(decoded, "Gr\u{fc}\u{df}e \u{1f600}");
    }

    #[rstest::rstest]
    fn test_invalid_utf8_is_rejected() {
        let err = decode_text(&[0x66, 0xff, 0x6f], TextMode::Utf8, false, Some(true)).unwrap_err();
        assert_eq!(err.kind, crate::ErrorKind::InvalidString);
    }

    #[rstest::rstest]
    #[case(br#"line\nbreak"#, "line\nbreak")]
    #[case(br#"quote \" here"#, "quote \" here")]
    #[case(br#"back\\slash"#, "back\\slash")]
    #[case(br#"\/\b\f\r\t"#, "/\u{08}\u{0c}\r\t")]
    #[case(br#"\u00e9t\u00E9"#, "\u{e9}t\u{e9}")]
    #[case(br#"\ud83d\ude00"#, "\u{1f600}")]
    fn test_unescape(#[case] raw: &[u8], #[case] expected: &str) {
        assert_eq!(unescape(raw).unwrap(), expected);
    }

    #[rstest::rstest]
    #[case(br#"bad \x escape"#)]
    #[case(br#"\u12"#)]
    #[case(br#"\u12zz"#)]
    #[case(br#"\ud83d alone"#)]
    #[case(br#"\ude00"#)]
    #[case(br#"dangling\"#)]
    fn test_unescape_rejects(#[case] raw: &[u8]) {
        let err = unescape(raw).unwrap_err();
        assert_eq!(err.kind, crate::ErrorKind::InvalidString);
    }
}
