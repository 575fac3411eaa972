pub(crate) mod buffer;
pub(crate) mod context;
pub(crate) mod scan;

use std::collections::HashMap;
use std::io::Read;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset};

use crate::constants::{
    starts_number, CLOSE_BRACKET, CLOSE_CURLY, COLON, COMMA, OPEN_BRACKET, OPEN_CURLY, QUOTE,
};
use crate::num::number::{DecimalAccumulator, IntegerAccumulator};
use crate::options::{ContainerKinds, DecodeOptions, TextMode, UnknownMembers};
use crate::text::string::{decode_text, unescape, wire_hash};
use crate::types::descriptor::TypeDescriptor;
use crate::types::member::Member;
use crate::types::shape::{MapShape, SequenceShape, Shape};
use crate::types::tag::TypeTag;
use crate::{Error, Result};

use self::buffer::ByteCursor;
use self::context::{Holder, Instance, ParseContext};
use self::scan::{
    find_closing_quote, find_closing_quote_and_hash, find_closing_quote_ascii, NameScan,
    QuoteScan,
};

/// Offset dates without seconds, e.g. `2021-03-04T05:06+01:00`.
const SHORT_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M%:z";

/// Decodes one JSON value from `source` into a `T`.
///
/// The source is read in chunks of `options.buffer_size` bytes; nothing past
/// the end of the value is inspected beyond what the last chunk contained.
pub fn read_value<T: Member, R: Read>(source: R, options: &DecodeOptions) -> Result<T> {
    decode_root(source, options, false)
}

/// Decodes a complete in-memory document; only whitespace may follow the value.
pub fn from_slice<T: Member>(input: &[u8], options: &DecodeOptions) -> Result<T> {
    decode_root(input, options, true)
}

pub fn from_str<T: Member>(input: &str, options: &DecodeOptions) -> Result<T> {
    from_slice(input.as_bytes(), options)
}

fn decode_root<T: Member, R: Read>(
    source: R,
    options: &DecodeOptions,
    whole: bool,
) -> Result<T> {
    let shape = T::shape();
    let mut decoder = Decoder::new(source, options);
    let mut holder = Holder::default();
    let mut parsed = decoder.parse_value(&shape, options.containers, &mut holder);
    if whole && parsed.is_ok() {
        parsed = decoder.expect_end();
    }
    let offset = decoder.cursor.offset();
    parsed
        .and_then(|()| T::produce(&mut holder))
        .map_err(|err| err.at(offset))
}

enum MemberMatch {
    Field(usize),
    Unknown(String),
}

struct Decoder<'o, R> {
    cursor: ByteCursor<R>,
    options: &'o DecodeOptions,
    /// Date literals already parsed during this call.
    dates: HashMap<String, DateTime<FixedOffset>>,
    depth: usize,
}

impl<'o, R: Read> Decoder<'o, R> {
    fn new(source: R, options: &'o DecodeOptions) -> Self {
        Self {
            cursor: ByteCursor::new(source, options.buffer_size),
            options,
            dates: HashMap::new(),
            depth: 0,
        }
    }

    /// Decodes the next value into `holder`, shaped by the member it belongs to.
    fn parse_value(
        &mut self,
        shape: &Shape,
        kinds: ContainerKinds,
        holder: &mut Holder,
    ) -> Result<()> {
        let byte = self
            .cursor
            .skip_whitespace()?
            .ok_or_else(|| Error::truncated("value"))?;
        match byte {
            QUOTE => {
                self.cursor.bump();
                let text = self.scan_string(self.options.value_mode)?;
                if shape.tag() == TypeTag::Date {
                    let date = self.parse_date(text)?;
                    holder.set_date(date);
                } else {
                    holder.set_string(text);
                }
            }
            _ if starts_number(byte) => {
                if shape.tag().is_integral() {
                    holder.set_long(self.scan_integer(shape.tag())?);
                } else {
                    holder.set_double(self.scan_decimal()?);
                }
            }
            b't' => {
                self.expect_literal(b"true", "literal `true`")?;
                holder.set_bool(true);
            }
            b'f' => {
                self.expect_literal(b"false", "literal `false`")?;
                holder.set_bool(false);
            }
            b'n' => {
                self.expect_literal(b"null", "literal `null`")?;
                holder.set_null();
            }
            OPEN_CURLY => {
                self.cursor.bump();
                self.descend()?;
                let instance = self.parse_object(shape, kinds)?;
                self.depth -= 1;
                holder.set_object(instance);
            }
            OPEN_BRACKET => {
                self.cursor.bump();
                let Shape::Sequence(sequence) = shape else {
                    return Err(Error::mismatch(shape.describe(), "array"));
                };
                self.descend()?;
                let mut context = ParseContext::for_container((sequence.new)(kinds));
                self.parse_elements(sequence, kinds, &mut context)?;
                self.depth -= 1;
                holder.set_object(context.into_target());
            }
            other => return Err(Error::unexpected_byte(other, "a value")),
        }
        Ok(())
    }

    /// Body of a `{ ... }` after the opening brace: a bound object or a map.
    fn parse_object(&mut self, shape: &Shape, kinds: ContainerKinds) -> Result<Instance> {
        match shape {
            Shape::Object(nested) => {
                let mut context = ParseContext::for_object(Arc::clone(nested.descriptor()));
                self.parse_members(&mut context)?;
                Ok(context.into_target())
            }
            Shape::Map(map) => {
                let mut context = ParseContext::for_container((map.new)(kinds));
                self.parse_entries(map, kinds, &mut context)?;
                Ok(context.into_target())
            }
            Shape::Scalar(_) | Shape::Sequence(_) => {
                Err(Error::mismatch(shape.describe(), "object"))
            }
        }
    }

    fn parse_members(&mut self, context: &mut ParseContext) -> Result<()> {
        let Some(descriptor) = context.descriptor.clone() else {
            return Err(Error::mismatch("object", "container"));
        };
        let mut first = true;
        loop {
            if self.open_member(first, CLOSE_CURLY, "object")? {
                return Ok(());
            }
            let matched = self.match_member(&descriptor)?;
            self.expect_byte(COLON, "`:`")?;

            match matched {
                MemberMatch::Field(index) => {
                    let field = &descriptor.fields()[index];
                    if field.is_excluded() {
                        self.skip_value()?;
                    } else {
                        context.holder.clear();
                        let kinds = field.containers(self.options.containers);
                        self.parse_value(field.shape(), kinds, &mut context.holder)?;
                        field.assign(context.target.as_mut(), &mut context.holder)?;
                    }
                }
                MemberMatch::Unknown(name) => match self.options.unknown_members {
                    UnknownMembers::Error => {
                        return Err(Error::unknown_member(descriptor.type_name(), &name));
                    }
                    UnknownMembers::Skip => {
                        log::trace!("skipping unknown member {name:?} of {}", descriptor.type_name());
                        self.skip_value()?;
                    }
                },
            }

            first = false;
            if self.close_member(CLOSE_CURLY, "`,` or `}`")? {
                return Ok(());
            }
        }
    }

    fn parse_entries(
        &mut self,
        map: &MapShape,
        kinds: ContainerKinds,
        context: &mut ParseContext,
    ) -> Result<()> {
        let mut first = true;
        loop {
            if self.open_member(first, CLOSE_CURLY, "object")? {
                return Ok(());
            }
            let key = self.scan_string(self.options.member_mode)?;
            self.expect_byte(COLON, "`:`")?;
            context.holder.clear();
            self.parse_value(&map.value, kinds, &mut context.holder)?;
            (map.insert)(context.target.as_mut(), key, &mut context.holder)?;

            first = false;
            if self.close_member(CLOSE_CURLY, "`,` or `}`")? {
                return Ok(());
            }
        }
    }

    fn parse_elements(
        &mut self,
        sequence: &SequenceShape,
        kinds: ContainerKinds,
        context: &mut ParseContext,
    ) -> Result<()> {
        let mut first = true;
        loop {
            let byte = self
                .cursor
                .skip_whitespace()?
                .ok_or_else(|| Error::truncated("array"))?;
            if first && byte == CLOSE_BRACKET {
                self.cursor.bump();
                return Ok(());
            }
            context.holder.clear();
            self.parse_value(&sequence.element, kinds, &mut context.holder)?;
            (sequence.push)(context.target.as_mut(), &mut context.holder)?;

            first = false;
            if self.close_member(CLOSE_BRACKET, "`,` or `]`")? {
                return Ok(());
            }
        }
    }

    /// Consumes the opening quote of a member name. Returns `true` instead
    /// when the container closes immediately, which only the first slot allows.
    fn open_member(&mut self, first: bool, close: u8, context: &'static str) -> Result<bool> {
        let byte = self
            .cursor
            .skip_whitespace()?
            .ok_or_else(|| Error::truncated(context))?;
        match byte {
            QUOTE => {
                self.cursor.bump();
                Ok(false)
            }
            _ if first && byte == close => {
                self.cursor.bump();
                Ok(true)
            }
            other => Err(Error::unexpected_byte(other, "a member name")),
        }
    }

    /// Consumes the separator after a member or element; `true` on `close`.
    fn close_member(&mut self, close: u8, expected: &'static str) -> Result<bool> {
        let byte = self
            .cursor
            .skip_whitespace()?
            .ok_or_else(|| Error::truncated("container"))?;
        match byte {
            COMMA => {
                self.cursor.bump();
                Ok(false)
            }
            _ if byte == close => {
                self.cursor.bump();
                Ok(true)
            }
            other => Err(Error::unexpected_byte(other, expected)),
        }
    }

    /// Scans a member name up to and past its closing quote and looks it up
    /// while the raw bytes are still pinned in the buffer.
    fn match_member(&mut self, descriptor: &TypeDescriptor) -> Result<MemberMatch> {
        let mode = self.options.member_mode;
        let mut state = NameScan::default();
        let mut scanned = 0;
        self.cursor.begin_token();
        loop {
            let token = self.cursor.token();
            let found = match mode {
                TextMode::Ascii => find_closing_quote_ascii(token, scanned, &mut state.quote),
                TextMode::Utf8 => find_closing_quote_and_hash(token, scanned, &mut state),
            };
            if let Some(end) = found {
                let raw = &token[..end];
                let matched = if state.quote.has_escapes {
                    let name = unescape(raw)?;
                    match descriptor.field_index(wire_hash(name.as_bytes()), name.as_bytes()) {
                        Some(index) => MemberMatch::Field(index),
                        None => MemberMatch::Unknown(name),
                    }
                } else {
                    let hash = match mode {
                        TextMode::Ascii => wire_hash(raw),
                        TextMode::Utf8 => state.hash,
                    };
                    match descriptor.field_index(hash, raw) {
                        Some(index) => MemberMatch::Field(index),
                        None => MemberMatch::Unknown(String::from_utf8_lossy(raw).into_owned()),
                    }
                };
                self.cursor.end_token(end + 1);
                return Ok(matched);
            }
            // Hashed bytes must not be revisited, so the scan resumes exactly.
            scanned = token.len();
            if !self.cursor.extend_token()? {
                return Err(Error::truncated("member name"));
            }
        }
    }

    /// Scans a string body after its opening quote and leaves the cursor past
    /// the closing quote.
    fn scan_string(&mut self, mode: TextMode) -> Result<String> {
        let mut state = QuoteScan::default();
        let mut scanned = 0;
        self.cursor.begin_token();
        loop {
            let token = self.cursor.token();
            let found = match mode {
                TextMode::Ascii => find_closing_quote_ascii(token, scanned, &mut state),
                TextMode::Utf8 => find_closing_quote(token, scanned, &mut state),
            };
            if let Some(end) = found {
                let multibyte = match mode {
                    TextMode::Ascii => None,
                    TextMode::Utf8 => Some(state.multibyte),
                };
                let text = decode_text(&token[..end], mode, state.has_escapes, multibyte)?;
                self.cursor.end_token(end + 1);
                return Ok(text);
            }
            scanned = token.len();
            if !self.cursor.extend_token()? {
                return Err(Error::truncated("string"));
            }
            scanned = state.resume_point(self.cursor.token(), scanned);
        }
    }

    fn scan_integer(&mut self, tag: TypeTag) -> Result<i64> {
        let mut number = IntegerAccumulator::default();
        while let Some(byte) = self.cursor.peek()? {
            if !number.accept(byte)? {
                break;
            }
            self.cursor.bump();
        }
        number.finish(tag)
    }

    fn scan_decimal(&mut self) -> Result<f64> {
        let mut number = DecimalAccumulator::default();
        while let Some(byte) = self.cursor.peek()? {
            if !number.accept(byte)? {
                break;
            }
            self.cursor.bump();
        }
        number.finish()
    }

    fn expect_literal(&mut self, literal: &'static [u8], name: &'static str) -> Result<()> {
        for &expected in literal {
            let byte = self.cursor.next_required(name)?;
            if byte != expected {
                return Err(Error::unexpected_byte(byte, name));
            }
        }
        Ok(())
    }

    fn expect_byte(&mut self, expected: u8, name: &'static str) -> Result<()> {
        let byte = self
            .cursor
            .skip_whitespace()?
            .ok_or_else(|| Error::truncated(name))?;
        if byte != expected {
            return Err(Error::unexpected_byte(byte, name));
        }
        self.cursor.bump();
        Ok(())
    }

    fn expect_end(&mut self) -> Result<()> {
        match self.cursor.skip_whitespace()? {
            None => Ok(()),
            Some(byte) => Err(Error::unexpected_byte(byte, "end of input")),
        }
    }

    fn descend(&mut self) -> Result<()> {
        if self.depth >= self.options.max_depth {
            return Err(Error::depth_limit(self.options.max_depth));
        }
        self.depth += 1;
        Ok(())
    }

    fn parse_date(&mut self, literal: String) -> Result<DateTime<FixedOffset>> {
        if let Some(date) = self.dates.get(&literal) {
            return Ok(*date);
        }
        let date = DateTime::parse_from_rfc3339(&literal)
            .or_else(|err| DateTime::parse_from_str(&literal, SHORT_DATE_FORMAT).map_err(|_| err))
            .map_err(|err| Error::invalid_date(&literal, err))?;
        self.dates.insert(literal, date);
        Ok(date)
    }

    /// Consumes one value of any shape without materializing it.
    fn skip_value(&mut self) -> Result<()> {
        let byte = self
            .cursor
            .skip_whitespace()?
            .ok_or_else(|| Error::truncated("value"))?;
        match byte {
            QUOTE => {
                self.cursor.bump();
                self.scan_string(self.options.value_mode)?;
            }
            _ if starts_number(byte) => {
                self.scan_decimal()?;
            }
            b't' => self.expect_literal(b"true", "literal `true`")?,
            b'f' => self.expect_literal(b"false", "literal `false`")?,
            b'n' => self.expect_literal(b"null", "literal `null`")?,
            OPEN_CURLY => {
                self.cursor.bump();
                self.descend()?;
                let mut first = true;
                loop {
                    if self.open_member(first, CLOSE_CURLY, "object")? {
                        break;
                    }
                    self.scan_string(self.options.member_mode)?;
                    self.expect_byte(COLON, "`:`")?;
                    self.skip_value()?;
                    first = false;
                    if self.close_member(CLOSE_CURLY, "`,` or `}`")? {
                        break;
                    }
                }
                self.depth -= 1;
            }
            OPEN_BRACKET => {
                self.cursor.bump();
                self.descend()?;
                let mut first = true;
                loop {
                    let byte = self
                        .cursor
                        .skip_whitespace()?
                        .ok_or_else(|| Error::truncated("array"))?;
                    if first && byte == CLOSE_BRACKET {
                        self.cursor.bump();
                        break;
                    }
                    self.skip_value()?;
                    first = false;
                    if self.close_member(CLOSE_BRACKET, "`,` or `]`")? {
                        break;
                    }
                }
                self.depth -= 1;
            }
            other => return Err(Error::unexpected_byte(other, "a value")),
        }
        Ok(())
    }
}
