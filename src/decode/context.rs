use std::any::Any;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset};

use crate::types::descriptor::TypeDescriptor;
use crate::{Error, Result};

/// A type-erased target instance under construction.
pub type Instance = Box<dyn Any + Send>;

/// Which holder slot carries the in-flight value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Held {
    #[default]
    Empty,
    Null,
    String,
    Integer,
    Decimal,
    Bool,
    Date,
    Object,
}

impl Held {
    pub fn name(self) -> &'static str {
        match self {
            Held::Empty => "nothing",
            Held::Null => "null",
            Held::String => "string",
            Held::Integer => "integer",
            Held::Decimal => "number",
            Held::Bool => "boolean",
            Held::Date => "date",
            Held::Object => "object",
        }
    }
}

/// Scratch slots for the single value most recently decoded at one level of
/// the descent, waiting to be committed into its owner.
#[derive(Default)]
pub struct Holder {
    held: Held,
    string: String,
    long: i64,
    double: f64,
    boolean: bool,
    date: Option<DateTime<FixedOffset>>,
    object: Option<Instance>,
}

impl Holder {
    pub fn held(&self) -> Held {
        self.held
    }

    pub fn is_null(&self) -> bool {
        self.held == Held::Null
    }

    pub(crate) fn clear(&mut self) {
        self.held = Held::Empty;
        self.object = None;
    }

    pub(crate) fn set_null(&mut self) {
        self.held = Held::Null;
        self.object = None;
    }

    pub(crate) fn set_string(&mut self, value: String) {
        self.held = Held::String;
        self.string = value;
    }

    pub(crate) fn set_long(&mut self, value: i64) {
        self.held = Held::Integer;
        self.long = value;
        self.double = value as f64;
    }

    pub(crate) fn set_double(&mut self, value: f64) {
        self.held = Held::Decimal;
        self.double = value;
    }

    pub(crate) fn set_bool(&mut self, value: bool) {
        self.held = Held::Bool;
        self.boolean = value;
    }

    pub(crate) fn set_date(&mut self, value: DateTime<FixedOffset>) {
        self.held = Held::Date;
        self.date = Some(value);
    }

    pub(crate) fn set_object(&mut self, value: Instance) {
        self.held = Held::Object;
        self.object = Some(value);
    }

    fn expect(&self, held: Held, expected: &'static str) -> Result<()> {
        if self.held == held {
            Ok(())
        } else {
            Err(Error::mismatch(expected, self.held.name()))
        }
    }

    /// The 64-bit integer holder.
    pub fn long(&self, expected: &'static str) -> Result<i64> {
        self.expect(Held::Integer, expected)?;
        Ok(self.long)
    }

    /// The double holder; integer literals are widened.
    pub fn double(&self, expected: &'static str) -> Result<f64> {
        match self.held {
            Held::Decimal | Held::Integer => Ok(self.double),
            other => Err(Error::mismatch(expected, other.name())),
        }
    }

    pub fn boolean(&self, expected: &'static str) -> Result<bool> {
        self.expect(Held::Bool, expected)?;
        Ok(self.boolean)
    }

    pub fn take_string(&mut self, expected: &'static str) -> Result<String> {
        self.expect(Held::String, expected)?;
        self.held = Held::Empty;
        Ok(std::mem::take(&mut self.string))
    }

    pub fn take_date(&mut self, expected: &'static str) -> Result<DateTime<FixedOffset>> {
        self.expect(Held::Date, expected)?;
        self.held = Held::Empty;
        self.date
            .take()
            .ok_or_else(|| Error::mismatch(expected, Held::Empty.name()))
    }

    /// Moves out the finished child instance, which must be a `T`.
    pub fn take_object<T: Any>(&mut self, expected: &'static str) -> Result<T> {
        self.expect(Held::Object, expected)?;
        self.held = Held::Empty;
        let instance = self
            .object
            .take()
            .ok_or_else(|| Error::mismatch(expected, Held::Empty.name()))?;
        instance
            .downcast::<T>()
            .map(|boxed| *boxed)
            .map_err(|_| Error::mismatch(expected, "object of another type"))
    }

    /// Like [`take_object`](Self::take_object), but `null` yields `T::default()`.
    pub fn take_object_or_default<T: Any + Default>(&mut self, expected: &'static str) -> Result<T> {
        if self.is_null() {
            self.held = Held::Empty;
            return Ok(T::default());
        }
        self.take_object(expected)
    }
}

impl fmt::Debug for Holder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Holder")
            .field("held", &self.held)
            .field("string", &self.string)
            .field("long", &self.long)
            .field("double", &self.double)
            .field("boolean", &self.boolean)
            .field("date", &self.date)
            .field("object", &self.object.is_some())
            .finish()
    }
}

/// State for one object, array or map being materialized.
pub(crate) struct ParseContext {
    pub(crate) target: Instance,
    pub(crate) descriptor: Option<Arc<TypeDescriptor>>,
    pub(crate) holder: Holder,
}

impl ParseContext {
    pub(crate) fn for_object(descriptor: Arc<TypeDescriptor>) -> Self {
        Self {
            target: descriptor.new_instance(),
            descriptor: Some(descriptor),
            holder: Holder::default(),
        }
    }

    pub(crate) fn for_container(target: Instance) -> Self {
        Self {
            target,
            descriptor: None,
            holder: Holder::default(),
        }
    }

    pub(crate) fn into_target(self) -> Instance {
        self.target
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[rstest::rstest]
    fn test_holder_reports_mismatch() {
        let mut holder = Holder::default();
        holder.set_string("x".to_string());
        let err = holder.long("i32").unwrap_err();
        assert_eq!(err.kind, crate::ErrorKind::Mismatch);
        assert_eq!(holder.take_string("string").unwrap(), "x");
        assert_eq!(holder.held(), Held::Empty);
    }

    #[rstest::rstest]
    fn test_integer_widens_to_double() {
        let mut holder = Holder::default();
        holder.set_long(7);
        assert_eq!(holder.double("f64").unwrap(), 7.0);
        holder.set_double(1.5);
        assert!(holder.long("i64").is_err());
    }

    #[rstest::rstest]
    fn test_take_object_checks_type() {
        let mut holder = Holder::default();
        holder.set_object(Box::new(vec![1u8, 2]));
        assert!(holder.take_object::<String>("string").is_err());

        holder.set_object(Box::new(vec![1u8, 2]));
        assert_eq!(holder.take_object::<Vec<u8>>("array").unwrap(), vec![1, 2]);

        holder.set_null();
        assert_eq!(holder.take_object_or_default::<Vec<u8>>("array").unwrap(), Vec::<u8>::new());
    }
}
