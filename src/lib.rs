pub mod constants;
pub mod decode;
pub mod error;
pub mod num;
pub mod options;
pub mod text;
pub mod types;

use std::io::Read;

pub use crate::decode::context::{Held, Holder, Instance};
pub use crate::error::{Error, ErrorKind};
pub use crate::options::{
    ContainerKinds, DecodeOptions, MapKind, SequenceKind, TextMode, UnknownMembers,
};
pub use crate::text::string::wire_hash;
pub use crate::types::containers::{Dict, Seq};
pub use crate::types::descriptor::{Bind, FieldDescriptor, FieldOptions, Fields, TypeDescriptor};
pub use crate::types::member::Member;
pub use crate::types::registry;
pub use crate::types::shape::Shape;
pub use crate::types::tag::TypeTag;

pub type Result<T> = std::result::Result<T, Error>;

pub fn read_value<T: Member, R: Read>(source: R) -> Result<T> {
    read_value_with_options(source, &DecodeOptions::default())
}

pub fn read_value_with_options<T: Member, R: Read>(source: R, options: &DecodeOptions) -> Result<T> {
    decode::read_value(source, options)
}

pub fn from_str<T: Member>(input: &str) -> Result<T> {
    from_str_with_options(input, &DecodeOptions::default())
}

pub fn from_str_with_options<T: Member>(input: &str, options: &DecodeOptions) -> Result<T> {
    decode::from_str(input, options)
}

pub fn from_slice<T: Member>(input: &[u8]) -> Result<T> {
    from_slice_with_options(input, &DecodeOptions::default())
}

pub fn from_slice_with_options<T: Member>(input: &[u8], options: &DecodeOptions) -> Result<T> {
    decode::from_slice(input, options)
}

/// A configured decoder handle.
///
/// Holds one resolved [`DecodeOptions`] so callers that decode many documents
/// the same way do not thread options through every call.
#[derive(Debug, Clone, Default)]
pub struct ObjectMapper {
    options: DecodeOptions,
}

impl ObjectMapper {
    pub fn new(options: DecodeOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &DecodeOptions {
        &self.options
    }

    pub fn read_value<T: Member, R: Read>(&self, source: R) -> Result<T> {
        decode::read_value(source, &self.options)
    }

    pub fn read_str<T: Member>(&self, input: &str) -> Result<T> {
        decode::from_str(input, &self.options)
    }
}
