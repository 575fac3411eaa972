//! Digit accumulators for the two numeric scanning routes.
//!
//! Both accumulators are fed one byte at a time so a literal can straddle any
//! number of buffer refills without being copied. `accept` returns `false`
//! on the first byte that is not part of the literal; that byte is left for
//! the caller.

use crate::constants::{DOT, HYPHEN, PLUS};
use crate::types::tag::TypeTag;
use crate::{Error, Result};

/// Magnitude and sign of an integer literal; the 64-bit result is chosen by
/// [`finish`](Self::finish) from the member's tag.
#[derive(Debug, Default)]
pub(crate) struct IntegerAccumulator {
    negative: bool,
    magnitude: u64,
    digits: usize,
    leading_zero: bool,
}

impl IntegerAccumulator {
    pub(crate) fn accept(&mut self, byte: u8) -> Result<bool> {
        match byte {
            HYPHEN if self.digits == 0 && !self.negative => {
                self.negative = true;
                Ok(true)
            }
            b'0'..=b'9' => {
                if self.leading_zero {
                    return Err(Error::invalid_number("leading zero in number literal"));
                }
                let digit = u64::from(byte - b'0');
                self.magnitude = self
                    .magnitude
                    .checked_mul(10)
                    .and_then(|v| v.checked_add(digit))
                    .ok_or_else(out_of_range)?;
                self.leading_zero = self.digits == 0 && digit == 0;
                self.digits += 1;
                Ok(true)
            }
            DOT | b'e' | b'E' => Err(Error::mismatch("integer", "fractional number")),
            _ => Ok(false),
        }
    }

    /// The literal as the 64-bit holder value for `tag`.
    ///
    /// Unsigned tags take `0..=u64::MAX`, stored bit for bit so the member's
    /// `as` conversion recovers it. Negative literals must fit in `i64`.
    pub(crate) fn finish(self, tag: TypeTag) -> Result<i64> {
        if self.digits == 0 {
            return Err(Error::invalid_number("number literal without digits"));
        }
        if self.negative {
            if self.magnitude > i64::MIN.unsigned_abs() {
                return Err(out_of_range());
            }
            return Ok((self.magnitude as i64).wrapping_neg());
        }
        if tag.is_unsigned() {
            return Ok(self.magnitude as i64);
        }
        i64::try_from(self.magnitude).map_err(|_| out_of_range())
    }
}

fn out_of_range() -> Error {
    Error::invalid_number("integer literal out of 64-bit range")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum DecimalPart {
    #[default]
    Integer,
    Fraction,
    ExponentSign,
    Exponent,
}

/// Fixed-point-then-scale decimal reader: an integer mantissa and one
/// power-of-ten exponent that combines the literal's exponent with the count
/// of fractional digits. Results carry ordinary binary rounding; this is not
/// a correctly rounded decimal parser.
#[derive(Debug, Default)]
pub(crate) struct DecimalAccumulator {
    part: DecimalPart,
    negative: bool,
    mantissa: u64,
    /// The mantissa is full; further digits only move the decimal point.
    saturated: bool,
    int_digits: usize,
    fraction_seen: bool,
    /// Fractional digits held in the mantissa.
    frac_digits: usize,
    /// Integer digits dropped after the mantissa filled up.
    dropped_digits: usize,
    leading_zero: bool,
    exp_negative: bool,
    exponent: i32,
    exp_digits: usize,
}

/// Largest power of ten applied in one step.
const MAX_STEP: i32 = 308;

impl DecimalAccumulator {
    pub(crate) fn accept(&mut self, byte: u8) -> Result<bool> {
        match (self.part, byte) {
            (DecimalPart::Integer, HYPHEN) if self.int_digits == 0 && !self.negative => {
                self.negative = true;
            }
            (DecimalPart::Integer, b'0'..=b'9') => {
                if self.leading_zero {
                    return Err(Error::invalid_number("leading zero in number literal"));
                }
                self.leading_zero = self.int_digits == 0 && byte == b'0';
                self.int_digits += 1;
                if !self.push_mantissa(byte) {
                    self.dropped_digits += 1;
                }
            }
            (DecimalPart::Integer, DOT) if self.int_digits > 0 => {
                self.part = DecimalPart::Fraction;
            }
            (DecimalPart::Fraction, b'0'..=b'9') => {
                self.fraction_seen = true;
                if self.push_mantissa(byte) {
                    self.frac_digits += 1;
                }
            }
            (DecimalPart::Integer | DecimalPart::Fraction, b'e' | b'E') if self.int_digits > 0 => {
                self.check_fraction()?;
                self.part = DecimalPart::ExponentSign;
            }
            (DecimalPart::ExponentSign, HYPHEN | PLUS) => {
                self.exp_negative = byte == HYPHEN;
                self.part = DecimalPart::Exponent;
            }
            (DecimalPart::ExponentSign | DecimalPart::Exponent, b'0'..=b'9') => {
                self.part = DecimalPart::Exponent;
                self.exponent = self
                    .exponent
                    .saturating_mul(10)
                    .saturating_add(i32::from(byte - b'0'));
                self.exp_digits += 1;
            }
            _ => return Ok(false),
        }
        Ok(true)
    }

    /// Appends a digit to the mantissa; `false` once it no longer fits.
    fn push_mantissa(&mut self, byte: u8) -> bool {
        if self.saturated {
            return false;
        }
        let digit = u64::from(byte - b'0');
        match self.mantissa.checked_mul(10).and_then(|v| v.checked_add(digit)) {
            Some(next) => {
                self.mantissa = next;
                true
            }
            None => {
                self.saturated = true;
                false
            }
        }
    }

    fn check_fraction(&self) -> Result<()> {
        if self.part == DecimalPart::Fraction && !self.fraction_seen {
            return Err(Error::invalid_number("missing digits after decimal point"));
        }
        Ok(())
    }

    pub(crate) fn finish(self) -> Result<f64> {
        if self.int_digits == 0 {
            return Err(Error::invalid_number("number literal without digits"));
        }
        self.check_fraction()?;
        let exponent_open = match self.part {
            DecimalPart::ExponentSign => true,
            DecimalPart::Exponent => self.exp_digits == 0,
            DecimalPart::Integer | DecimalPart::Fraction => false,
        };
        if exponent_open {
            return Err(Error::invalid_number("missing digits in exponent"));
        }

        let exponent = if self.exp_negative {
            -self.exponent
        } else {
            self.exponent
        };
        let exponent = exponent
            .saturating_add(saturating_i32(self.dropped_digits))
            .saturating_sub(saturating_i32(self.frac_digits));
        let value = scale(self.mantissa as f64, exponent);
        Ok(if self.negative { -value } else { value })
    }
}

fn saturating_i32(count: usize) -> i32 {
    i32::try_from(count).unwrap_or(i32::MAX)
}

/// `value * 10^exponent`, stepping through extreme exponents so the
/// intermediate power never overflows to infinity.
fn scale(mut value: f64, mut exponent: i32) -> f64 {
    if value == 0.0 {
        return value;
    }
    while exponent > MAX_STEP && value.is_finite() {
        value *= 10f64.powi(MAX_STEP);
        exponent -= MAX_STEP;
    }
    while exponent < -MAX_STEP && value != 0.0 {
        value /= 10f64.powi(MAX_STEP);
        exponent += MAX_STEP;
    }
    if exponent >= 0 {
        value * 10f64.powi(exponent)
    } else {
        value / 10f64.powi(-exponent)
    }
}
