/// Semantic type tag of a member value.
///
/// The low bit is reserved: it is set for exactly the integral numeric kinds,
/// which decides whether a number literal is scanned by the integer or by the
/// decimal route.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeTag {
    I8 = 0b0000_1,
    I16 = 0b0001_1,
    I32 = 0b0010_1,
    I64 = 0b0011_1,
    U8 = 0b0100_1,
    U16 = 0b0101_1,
    U32 = 0b0110_1,
    U64 = 0b0111_1,
    Char = 0b1000_1,

    F32 = 0b0000_0,
    F64 = 0b0001_0,
    Bool = 0b0010_0,
    String = 0b0011_0,
    Date = 0b0100_0,
    Enum = 0b0101_0,
    Object = 0b0110_0,
}

pub const INTEGRAL_BIT: u8 = 0b1;

impl TypeTag {
    #[inline]
    pub fn is_integral(self) -> bool {
        self as u8 & INTEGRAL_BIT != 0
    }

    /// Unsigned integral kinds accept literals up to `u64::MAX`.
    #[inline]
    pub fn is_unsigned(self) -> bool {
        matches!(self, TypeTag::U8 | TypeTag::U16 | TypeTag::U32 | TypeTag::U64)
    }

    pub fn name(self) -> &'static str {
        match self {
            TypeTag::I8 => "i8",
            TypeTag::I16 => "i16",
            TypeTag::I32 => "i32",
            TypeTag::I64 => "i64",
            TypeTag::U8 => "u8",
            TypeTag::U16 => "u16",
            TypeTag::U32 => "u32",
            TypeTag::U64 => "u64",
            TypeTag::Char => "char",
            TypeTag::F32 => "f32",
            TypeTag::F64 => "f64",
            TypeTag::Bool => "bool",
            TypeTag::String => "string",
            TypeTag::Date => "date",
            TypeTag::Enum => "enum",
            TypeTag::Object => "object",
        }
    }
}
