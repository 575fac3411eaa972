use std::any::{Any, TypeId};
use std::fmt;
use std::marker::PhantomData;

use smallvec::SmallVec;
use smol_str::SmolStr;

use crate::constants::QUICK_LOOKUP_SIZE;
use crate::decode::context::{Holder, Instance};
use crate::options::{ContainerKinds, MapKind, SequenceKind};
use crate::text::string::wire_hash;
use crate::types::member::Member;
use crate::types::shape::Shape;
use crate::types::tag::TypeTag;
use crate::{Error, Result};

/// A type that JSON objects can be bound into.
///
/// `describe` registers every bindable member once; the result is cached
/// process-wide as a [`TypeDescriptor`].
///
/// ```
/// use jsonbind::{Bind, Fields};
///
/// #[derive(Default)]
/// struct MenuItem {
///     value: String,
///     onclick: String,
/// }
///
/// impl Bind for MenuItem {
///     fn describe(fields: &mut Fields<Self>) {
///         fields.field("value", |item| &mut item.value);
///         fields.field("onclick", |item| &mut item.onclick);
///     }
/// }
/// ```
pub trait Bind: Default + Send + 'static {
    /// Called once per type. It may resolve other types through
    /// [`registry::resolve`](crate::registry::resolve), but never `Self`,
    /// whose build lock is held for the duration of the call.
    fn describe(fields: &mut Fields<Self>);
}

type Setter = Box<dyn Fn(&mut dyn Any, &mut Holder) -> Result<()> + Send + Sync>;

/// Metadata for one bindable member.
pub struct FieldDescriptor {
    name: &'static str,
    wire_name: SmolStr,
    hash: u32,
    tag: TypeTag,
    shape: Shape,
    excluded: bool,
    sequence: Option<SequenceKind>,
    map: Option<MapKind>,
    setter: Setter,
}

impl FieldDescriptor {
    /// Declared member name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn wire_name(&self) -> &str {
        &self.wire_name
    }

    pub fn hash(&self) -> u32 {
        self.hash
    }

    pub fn tag(&self) -> TypeTag {
        self.tag
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn is_excluded(&self) -> bool {
        self.excluded
    }

    /// Container kinds for this member: its own overrides over `defaults`.
    pub fn containers(&self, defaults: ContainerKinds) -> ContainerKinds {
        ContainerKinds {
            sequence: self.sequence.unwrap_or(defaults.sequence),
            map: self.map.unwrap_or(defaults.map),
        }
    }

    /// Commits the holder's value into `target`'s member.
    pub(crate) fn assign(&self, target: &mut dyn Any, holder: &mut Holder) -> Result<()> {
        (self.setter)(target, holder)
    }
}

impl fmt::Debug for FieldDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("name", &self.name)
            .field("wire_name", &self.wire_name)
            .field("hash", &self.hash)
            .field("tag", &self.tag)
            .field("shape", &self.shape)
            .field("excluded", &self.excluded)
            .finish()
    }
}

/// Registration builder handed to [`Bind::describe`].
pub struct Fields<T> {
    entries: Vec<FieldDescriptor>,
    _target: PhantomData<fn() -> T>,
}

impl<T: Bind> Fields<T> {
    fn new() -> Self {
        Self {
            entries: Vec::new(),
            _target: PhantomData,
        }
    }

    /// Registers a member under its declared name; `accessor` projects the
    /// member out of a target instance.
    pub fn field<F, A>(&mut self, name: &'static str, accessor: A) -> FieldOptions<'_>
    where
        F: Member,
        A: Fn(&mut T) -> &mut F + Send + Sync + 'static,
    {
        let shape = F::shape();
        let setter: Setter = Box::new(move |target: &mut dyn Any, holder: &mut Holder| {
            let target = target
                .downcast_mut::<T>()
                .ok_or_else(|| Error::mismatch(std::any::type_name::<T>(), "foreign target"))?;
            *accessor(target) = F::produce(holder)?;
            Ok(())
        });
        let index = self.entries.len();
        self.entries.push(FieldDescriptor {
            name,
            wire_name: SmolStr::new_static(name),
            hash: wire_hash(name.as_bytes()),
            tag: shape.tag(),
            shape,
            excluded: false,
            sequence: None,
            map: None,
            setter,
        });
        FieldOptions {
            field: &mut self.entries[index],
        }
    }
}

/// Per-member customization returned by [`Fields::field`].
pub struct FieldOptions<'a> {
    field: &'a mut FieldDescriptor,
}

impl FieldOptions<'_> {
    /// Matches the member under `wire_name` instead of its declared name.
    pub fn rename(self, wire_name: impl Into<SmolStr>) -> Self {
        let wire_name = wire_name.into();
        self.field.hash = wire_hash(wire_name.as_bytes());
        self.field.wire_name = wire_name;
        self
    }

    /// The member's value is parsed but never written.
    pub fn exclude(self) -> Self {
        self.field.excluded = true;
        self
    }

    /// Concrete sequence for a `Seq` member, overriding the configured default.
    pub fn sequence(self, kind: SequenceKind) -> Self {
        self.field.sequence = Some(kind);
        self
    }

    /// Concrete map for a `Dict` member, overriding the configured default.
    pub fn map(self, kind: MapKind) -> Self {
        self.field.map = Some(kind);
        self
    }
}

/// Immutable per-type table of field descriptors with hash dispatch.
pub struct TypeDescriptor {
    type_id: TypeId,
    type_name: &'static str,
    fields: Vec<FieldDescriptor>,
    hashes: SmallVec<[u32; 16]>,
    /// `index + 1` of a field whose hash lands in the slot; `0` is empty.
    quick: [u16; QUICK_LOOKUP_SIZE],
    construct: fn() -> Instance,
}

fn construct<T: Bind>() -> Instance {
    Box::new(T::default())
}

impl TypeDescriptor {
    pub(crate) fn build<T: Bind>() -> Self {
        let mut registered = Fields::<T>::new();
        T::describe(&mut registered);

        let type_name = std::any::type_name::<T>();
        let mut fields: Vec<FieldDescriptor> = Vec::with_capacity(registered.entries.len());
        for field in registered.entries {
            if fields.iter().any(|seen| seen.wire_name == field.wire_name) {
                log::warn!(
                    "{type_name}: member {:?} registered twice; keeping the first",
                    field.wire_name
                );
                continue;
            }
            fields.push(field);
        }

        let hashes: SmallVec<[u32; 16]> = fields.iter().map(|field| field.hash).collect();
        let mut quick = [0u16; QUICK_LOOKUP_SIZE];
        for (index, field) in fields.iter().enumerate() {
            let Ok(stored) = u16::try_from(index + 1) else {
                break;
            };
            quick[field.hash as usize & (QUICK_LOOKUP_SIZE - 1)] = stored;
        }

        Self {
            type_id: TypeId::of::<T>(),
            type_name,
            fields,
            hashes,
            quick,
            construct: construct::<T>,
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Index of the field whose wire name is `name`, given `hash == wire_hash(name)`.
    ///
    /// Probes the direct slot first, then scans every hash. A hash match is
    /// only accepted when the wire name is byte-identical, so two names with
    /// the same hash never alias.
    pub fn field_index(&self, hash: u32, name: &[u8]) -> Option<usize> {
        let slot = self.quick[hash as usize & (QUICK_LOOKUP_SIZE - 1)];
        if slot != 0 {
            let index = usize::from(slot) - 1;
            if self.hashes[index] == hash && self.fields[index].wire_name.as_bytes() == name {
                return Some(index);
            }
        }
        self.hashes
            .iter()
            .enumerate()
            .find(|&(index, &candidate)| {
                candidate == hash && self.fields[index].wire_name.as_bytes() == name
            })
            .map(|(index, _)| index)
    }

    pub fn field_by_hash(&self, hash: u32, name: &[u8]) -> Option<&FieldDescriptor> {
        self.field_index(hash, name).map(|index| &self.fields[index])
    }

    pub fn field_by_name(&self, name: &str) -> Option<&FieldDescriptor> {
        self.field_by_hash(wire_hash(name.as_bytes()), name.as_bytes())
    }

    pub(crate) fn new_instance(&self) -> Instance {
        (self.construct)()
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("type_name", &self.type_name)
            .field("fields", &self.fields)
            .finish()
    }
}
