use std::any::Any;
use std::fmt;
use std::sync::{Arc, OnceLock};

use crate::decode::context::{Holder, Instance};
use crate::options::ContainerKinds;
use crate::types::descriptor::{Bind, TypeDescriptor};
use crate::types::registry;
use crate::types::tag::TypeTag;
use crate::Result;

pub type NewContainer = fn(ContainerKinds) -> Instance;
pub type PushElement = fn(&mut dyn Any, &mut Holder) -> Result<()>;
pub type InsertEntry = fn(&mut dyn Any, String, &mut Holder) -> Result<()>;

/// How a member's JSON value is scanned and materialized.
pub enum Shape {
    Scalar(TypeTag),
    Object(Nested),
    Sequence(SequenceShape),
    Map(MapShape),
}

impl Shape {
    pub fn object<T: Bind>() -> Self {
        Shape::Object(Nested::of::<T>())
    }

    pub fn tag(&self) -> TypeTag {
        match self {
            Shape::Scalar(tag) => *tag,
            Shape::Object(_) | Shape::Sequence(_) | Shape::Map(_) => TypeTag::Object,
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            Shape::Scalar(tag) => tag.name(),
            Shape::Object(nested) => nested.type_name,
            Shape::Sequence(_) => "array",
            Shape::Map(_) => "map",
        }
    }
}

impl fmt::Debug for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shape::Scalar(tag) => f.debug_tuple("Scalar").field(tag).finish(),
            Shape::Object(nested) => f.debug_tuple("Object").field(&nested.type_name).finish(),
            Shape::Sequence(seq) => f.debug_tuple("Sequence").field(&seq.element).finish(),
            Shape::Map(map) => f.debug_tuple("Map").field(&map.value).finish(),
        }
    }
}

/// Reference to a nested type's descriptor, resolved on first use so that
/// self-referential types never recurse during descriptor construction.
pub struct Nested {
    type_name: &'static str,
    resolve: fn() -> Arc<TypeDescriptor>,
    resolved: OnceLock<Arc<TypeDescriptor>>,
}

impl Nested {
    pub fn of<T: Bind>() -> Self {
        Self {
            type_name: std::any::type_name::<T>(),
            resolve: registry::resolve::<T>,
            resolved: OnceLock::new(),
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn descriptor(&self) -> &Arc<TypeDescriptor> {
        self.resolved.get_or_init(self.resolve)
    }
}

/// Sequence-like member: element shape plus type-erased collection ops.
pub struct SequenceShape {
    pub element: Box<Shape>,
    pub new: NewContainer,
    pub push: PushElement,
}

/// Map-like member with string keys.
pub struct MapShape {
    pub value: Box<Shape>,
    pub new: NewContainer,
    pub insert: InsertEntry,
}
