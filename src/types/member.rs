use std::any::Any;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, LinkedList, VecDeque};
use std::hash::Hash;

use chrono::{DateTime, FixedOffset};

use crate::decode::context::{Held, Holder, Instance};
use crate::options::ContainerKinds;
use crate::types::containers::{Dict, Seq};
use crate::types::shape::{MapShape, SequenceShape, Shape};
use crate::types::tag::TypeTag;
use crate::{Error, Result};

/// A value that can occupy a bindable member.
///
/// `shape` tells the decoder how to scan the JSON value; `produce` converts
/// the holder's contents into `Self` once the value has been decoded.
pub trait Member: Sized + Send + 'static {
    fn shape() -> Shape;

    fn produce(holder: &mut Holder) -> Result<Self>;
}

macro_rules! integral_member {
    ($($ty:ty => $tag:ident),* $(,)?) => {$(
        impl Member for $ty {
            fn shape() -> Shape {
                Shape::Scalar(TypeTag::$tag)
            }

            fn produce(holder: &mut Holder) -> Result<Self> {
                if holder.is_null() {
                    return Ok(0);
                }
                Ok(holder.long(TypeTag::$tag.name())? as $ty)
            }
        }
    )*};
}

integral_member!(
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    isize => I64,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    usize => U64,
);

impl Member for char {
    fn shape() -> Shape {
        Shape::Scalar(TypeTag::Char)
    }

    fn produce(holder: &mut Holder) -> Result<Self> {
        match holder.held() {
            Held::Null => Ok('\0'),
            Held::String => {
                let text = holder.take_string("char")?;
                let mut chars = text.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Ok(c),
                    _ => Err(Error::mismatch("char", "string")),
                }
            }
            _ => {
                let code = holder.long("char")?;
                u32::try_from(code)
                    .ok()
                    .and_then(char::from_u32)
                    .ok_or_else(|| Error::invalid_number(format!("{code} is not a code point")))
            }
        }
    }
}

impl Member for f64 {
    fn shape() -> Shape {
        Shape::Scalar(TypeTag::F64)
    }

    fn produce(holder: &mut Holder) -> Result<Self> {
        if holder.is_null() {
            return Ok(0.0);
        }
        holder.double("f64")
    }
}

impl Member for f32 {
    fn shape() -> Shape {
        Shape::Scalar(TypeTag::F32)
    }

    fn produce(holder: &mut Holder) -> Result<Self> {
        if holder.is_null() {
            return Ok(0.0);
        }
        Ok(holder.double("f32")? as f32)
    }
}

impl Member for bool {
    fn shape() -> Shape {
        Shape::Scalar(TypeTag::Bool)
    }

    fn produce(holder: &mut Holder) -> Result<Self> {
        if holder.is_null() {
            return Ok(false);
        }
        holder.boolean("bool")
    }
}

impl Member for String {
    fn shape() -> Shape {
        Shape::Scalar(TypeTag::String)
    }

    fn produce(holder: &mut Holder) -> Result<Self> {
        if holder.is_null() {
            return Ok(String::new());
        }
        holder.take_string("string")
    }
}

impl Member for DateTime<FixedOffset> {
    fn shape() -> Shape {
        Shape::Scalar(TypeTag::Date)
    }

    fn produce(holder: &mut Holder) -> Result<Self> {
        if holder.is_null() {
            return Err(Error::unexpected_null("DateTime<FixedOffset>"));
        }
        holder.take_date("date")
    }
}

/// `null` becomes `None`; anything else decodes as `M`.
impl<M: Member> Member for Option<M> {
    fn shape() -> Shape {
        M::shape()
    }

    fn produce(holder: &mut Holder) -> Result<Self> {
        if holder.is_null() {
            return Ok(None);
        }
        M::produce(holder).map(Some)
    }
}

fn new_default<C: Default + Send + 'static>(_: ContainerKinds) -> Instance {
    Box::new(C::default())
}

fn new_seq<E: Send + 'static>(kinds: ContainerKinds) -> Instance {
    Box::new(Seq::<E>::with_kind(kinds.sequence))
}

fn new_dict<V: Send + 'static>(kinds: ContainerKinds) -> Instance {
    Box::new(Dict::<V>::with_kind(kinds.map))
}

fn push_element<C, E>(target: &mut dyn Any, holder: &mut Holder) -> Result<()>
where
    C: Extend<E> + 'static,
    E: Member,
{
    let collection = target
        .downcast_mut::<C>()
        .ok_or_else(|| Error::mismatch(std::any::type_name::<C>(), "foreign collection"))?;
    let element = E::produce(holder)?;
    collection.extend(std::iter::once(element));
    Ok(())
}

fn insert_entry<C, V>(target: &mut dyn Any, key: String, holder: &mut Holder) -> Result<()>
where
    C: Extend<(String, V)> + 'static,
    V: Member,
{
    let map = target
        .downcast_mut::<C>()
        .ok_or_else(|| Error::mismatch(std::any::type_name::<C>(), "foreign map"))?;
    let value = V::produce(holder)?;
    map.extend(std::iter::once((key, value)));
    Ok(())
}

fn sequence_of<C, E>(new: fn(ContainerKinds) -> Instance) -> Shape
where
    C: Extend<E> + 'static,
    E: Member,
{
    Shape::Sequence(SequenceShape {
        element: Box::new(E::shape()),
        new,
        push: push_element::<C, E>,
    })
}

fn map_of<C, V>(new: fn(ContainerKinds) -> Instance) -> Shape
where
    C: Extend<(String, V)> + 'static,
    V: Member,
{
    Shape::Map(MapShape {
        value: Box::new(V::shape()),
        new,
        insert: insert_entry::<C, V>,
    })
}

macro_rules! sequence_member {
    ($($container:ident < E $(: $($bound:path),+)? >),* $(,)?) => {$(
        impl<E: Member $($(+ $bound)+)?> Member for $container<E> {
            fn shape() -> Shape {
                sequence_of::<$container<E>, E>(new_default::<$container<E>>)
            }

            fn produce(holder: &mut Holder) -> Result<Self> {
                holder.take_object_or_default("array")
            }
        }
    )*};
}

sequence_member!(
    Vec<E>,
    VecDeque<E>,
    LinkedList<E>,
    HashSet<E: Eq, Hash>,
    BTreeSet<E: Ord>,
);

impl<E: Member> Member for Box<[E]> {
    fn shape() -> Shape {
        Vec::<E>::shape()
    }

    fn produce(holder: &mut Holder) -> Result<Self> {
        Vec::<E>::produce(holder).map(Vec::into_boxed_slice)
    }
}

impl<E: Member> Member for Seq<E> {
    fn shape() -> Shape {
        sequence_of::<Seq<E>, E>(new_seq::<E>)
    }

    fn produce(holder: &mut Holder) -> Result<Self> {
        holder.take_object_or_default("array")
    }
}

impl<V: Member> Member for HashMap<String, V> {
    fn shape() -> Shape {
        map_of::<HashMap<String, V>, V>(new_default::<HashMap<String, V>>)
    }

    fn produce(holder: &mut Holder) -> Result<Self> {
        holder.take_object_or_default("map")
    }
}

impl<V: Member> Member for BTreeMap<String, V> {
    fn shape() -> Shape {
        map_of::<BTreeMap<String, V>, V>(new_default::<BTreeMap<String, V>>)
    }

    fn produce(holder: &mut Holder) -> Result<Self> {
        holder.take_object_or_default("map")
    }
}

impl<V: Member> Member for Dict<V> {
    fn shape() -> Shape {
        map_of::<Dict<V>, V>(new_dict::<V>)
    }

    fn produce(holder: &mut Holder) -> Result<Self> {
        holder.take_object_or_default("map")
    }
}

/// Makes [`Bind`](crate::Bind) types usable as members of other types, so
/// they can be nested as objects and collected in sequences and maps.
/// `null` yields the type's default.
///
/// ```
/// use jsonbind::{bindable, Bind, Fields};
///
/// #[derive(Default)]
/// struct Point {
///     x: i32,
///     y: i32,
/// }
///
/// impl Bind for Point {
///     fn describe(fields: &mut Fields<Self>) {
///         fields.field("x", |p| &mut p.x);
///         fields.field("y", |p| &mut p.y);
///     }
/// }
///
/// bindable!(Point);
///
/// let points: Vec<Point> = jsonbind::from_str(r#"[{"x":1,"y":2}]"#).unwrap();
/// assert_eq!(points[0].y, 2);
/// ```
#[macro_export]
macro_rules! bindable {
    ($($ty:ty),+ $(,)?) => {$(
        impl $crate::Member for $ty {
            fn shape() -> $crate::Shape {
                $crate::Shape::object::<$ty>()
            }

            fn produce(holder: &mut $crate::Holder) -> $crate::Result<Self> {
                holder.take_object_or_default::<$ty>(::std::any::type_name::<$ty>())
            }
        }
    )+};
}

/// Binds a fieldless enum to a fixed set of JSON string literals.
///
/// An enum has no empty value, so `null` is a `Mismatch`; members that may be
/// `null` are declared as `Option<Enum>`.
///
/// ```
/// use jsonbind::bindable_enum;
///
/// #[derive(Debug, PartialEq)]
/// enum Level {
///     Low,
///     High,
/// }
///
/// bindable_enum!(Level { Low => "low", High => "high" });
///
/// let levels: Vec<Level> = jsonbind::from_str(r#"["high","low"]"#).unwrap();
/// assert_eq!(levels, [Level::High, Level::Low]);
/// ```
#[macro_export]
macro_rules! bindable_enum {
    ($ty:ident { $($variant:ident => $wire:literal),+ $(,)? }) => {
        impl $crate::Member for $ty {
            fn shape() -> $crate::Shape {
                $crate::Shape::Scalar($crate::TypeTag::Enum)
            }

            fn produce(holder: &mut $crate::Holder) -> $crate::Result<Self> {
                if holder.is_null() {
                    return Err($crate::Error::unexpected_null(stringify!($ty)));
                }
                let literal = holder.take_string(::std::any::type_name::<$ty>())?;
                match literal.as_str() {
                    $($wire => Ok($ty::$variant),)+
                    _ => Err($crate::Error::unknown_variant(
                        ::std::any::type_name::<$ty>(),
                        &literal,
                    )),
                }
            }
        }
    };
}
