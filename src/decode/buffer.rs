use std::io::{self, Read};

use crate::{Error, Result};

/// Refillable window over a byte source.
///
/// Bytes before `pos` are discarded on the next refill unless a token is
/// pinned with [`ByteCursor::begin_token`]; a pinned token survives refills
/// by compacting it to the front of the buffer or, when it already fills the
/// whole buffer, by doubling the buffer.
pub(crate) struct ByteCursor<R> {
    source: R,
    buf: Vec<u8>,
    limit: usize,
    pos: usize,
    mark: Option<usize>,
    discarded: u64,
    eof: bool,
}

impl<R: Read> ByteCursor<R> {
    pub(crate) fn new(source: R, capacity: usize) -> Self {
        Self {
            source,
            buf: vec![0; capacity.max(1)],
            limit: 0,
            pos: 0,
            mark: None,
            discarded: 0,
            eof: false,
        }
    }

    #[cfg(test)]
    pub(crate) fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Absolute offset of the read position within the source.
    pub(crate) fn offset(&self) -> u64 {
        self.discarded + self.pos as u64
    }

    /// Guarantees at least one unread byte. `Ok(false)` means end of input.
    #[inline]
    pub(crate) fn ensure(&mut self) -> Result<bool> {
        if self.pos < self.limit {
            return Ok(true);
        }
        self.fill()
    }

    #[inline]
    pub(crate) fn peek(&mut self) -> Result<Option<u8>> {
        if self.ensure()? {
            Ok(Some(self.buf[self.pos]))
        } else {
            Ok(None)
        }
    }

    /// Like [`peek`](Self::peek) but end of input is a truncation error.
    #[inline]
    pub(crate) fn peek_required(&mut self, context: &'static str) -> Result<u8> {
        self.peek()?.ok_or_else(|| Error::truncated(context))
    }

    #[inline]
    pub(crate) fn bump(&mut self) {
        debug_assert!(self.pos < self.limit);
        self.pos += 1;
    }

    pub(crate) fn next_required(&mut self, context: &'static str) -> Result<u8> {
        let byte = self.peek_required(context)?;
        self.pos += 1;
        Ok(byte)
    }

    /// Skips JSON whitespace and returns the next byte without consuming it.
    pub(crate) fn skip_whitespace(&mut self) -> Result<Option<u8>> {
        loop {
            if !self.ensure()? {
                return Ok(None);
            }
            let window = &self.buf[self.pos..self.limit];
            match window
                .iter()
                .position(|&byte| !crate::constants::is_whitespace(byte))
            {
                Some(skip) => {
                    self.pos += skip;
                    return Ok(Some(self.buf[self.pos]));
                }
                None => self.pos = self.limit,
            }
        }
    }

    /// Pins the read position as the start of a token.
    pub(crate) fn begin_token(&mut self) {
        self.mark = Some(self.pos);
    }

    /// Bytes from the token start up to the fill limit.
    pub(crate) fn token(&self) -> &[u8] {
        let start = self.mark.unwrap_or(self.pos);
        &self.buf[start..self.limit]
    }

    /// Pulls more bytes behind the pinned token. `Ok(false)` means end of input.
    pub(crate) fn extend_token(&mut self) -> Result<bool> {
        debug_assert!(self.mark.is_some());
        self.pos = self.limit;
        self.fill()
    }

    /// Unpins the token and moves the read position `len` bytes past its start.
    pub(crate) fn end_token(&mut self, len: usize) {
        let start = self.mark.take().unwrap_or(self.pos);
        debug_assert!(start + len <= self.limit);
        self.pos = start + len;
    }

    fn fill(&mut self) -> Result<bool> {
        debug_assert!(self.pos == self.limit);
        if self.eof {
            return Ok(false);
        }
        match self.mark {
            None => {
                self.discarded += self.limit as u64;
                self.pos = 0;
                self.limit = 0;
            }
            Some(_) if self.limit == self.buf.len() => self.make_room(),
            Some(_) => {}
        }

        let read = self.read_more()?;
        if read == 0 {
            self.eof = true;
            return Ok(false);
        }
        self.limit += read;
        debug_assert!(self.pos <= self.limit && self.limit <= self.buf.len());
        Ok(true)
    }

    /// Frees space behind a pinned token: slide it to the front, or grow.
    fn make_room(&mut self) {
        let mark = self.mark.unwrap_or(0);
        if mark > 0 {
            self.buf.copy_within(mark..self.limit, 0);
            self.discarded += mark as u64;
            self.pos -= mark;
            self.limit -= mark;
            self.mark = Some(0);
        } else {
            self.grow();
        }
    }

    /// Doubles the buffer, keeping every byte already read in place.
    fn grow(&mut self) {
        let capacity = self.buf.len() * 2;
        log::trace!("growing read buffer to {capacity} bytes");
        self.buf.resize(capacity, 0);
    }

    fn read_more(&mut self) -> Result<usize> {
        loop {
            match self.source.read(&mut self.buf[self.limit..]) {
                Ok(read) => return Ok(read),
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(Error::io(err).at(self.offset())),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Hands out one byte per read call.
    struct Trickle<'a>(&'a [u8]);

    impl Read for Trickle<'_> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match (self.0.split_first(), buf.first_mut()) {
                (Some((&byte, rest)), Some(slot)) => {
                    *slot = byte;
                    self.0 = rest;
                    Ok(1)
                }
                _ => Ok(0),
            }
        }
    }

    #[rstest::rstest]
    fn test_peek_and_bump_across_refills() {
        let mut cursor = ByteCursor::new(&b"abc"[..], 1);
        let mut seen = Vec::new();
        while let Some(byte) = cursor.peek().unwrap() {
            seen.push(byte);
            cursor.bump();
        }
        assert_eq!(seen, b"abc");
        assert_eq!(cursor.offset(), 3);
        assert_eq!(cursor.capacity(), 1);
    }

    #[rstest::rstest]
    fn test_pinned_token_grows_buffer() {
        let mut cursor = ByteCursor::new(Trickle(b"hello world"), 2);
        cursor.begin_token();
        while cursor.extend_token().unwrap() {}
        assert_eq!(cursor.token(), b"hello world");
        assert!(cursor.capacity() >= 11);
        cursor.end_token(5);
        assert_eq!(cursor.peek().unwrap(), Some(b' '));
        assert_eq!(cursor.offset(), 5);
    }

    #[rstest::rstest]
    fn test_pinned_token_is_compacted() {
        let mut cursor = ByteCursor::new(Trickle(b"xxxxabcdef"), 4);
        for _ in 0..3 {
            cursor.next_required("test").unwrap();
        }
        cursor.begin_token();
        while cursor.token().len() < 5 {
            assert!(cursor.extend_token().unwrap());
        }
        assert_eq!(&cursor.token()[..5], b"xabcd");
        cursor.end_token(5);
        assert_eq!(cursor.offset(), 8);
        assert_eq!(cursor.next_required("test").unwrap(), b'e');
    }

    #[rstest::rstest]
    fn test_skip_whitespace_spans_refills() {
        let mut cursor = ByteCursor::new(Trickle(b"   \n\t {"), 1);
        assert_eq!(cursor.skip_whitespace().unwrap(), Some(b'{'));
        assert_eq!(cursor.offset(), 6);
    }

    #[rstest::rstest]
    fn test_end_of_input_is_reported() {
        let mut cursor = ByteCursor::new(&b""[..], 8);
        assert_eq!(cursor.peek().unwrap(), None);
        let err = cursor.next_required("object").unwrap_err();
        assert_eq!(err.kind, crate::ErrorKind::Truncated);
    }
}
