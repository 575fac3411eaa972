//! Process-wide cache of [`TypeDescriptor`]s keyed by type identity.

use std::any::TypeId;
use std::sync::{Arc, Mutex, PoisonError};

use dashmap::DashMap;
use once_cell::sync::Lazy;

use crate::types::descriptor::{Bind, TypeDescriptor};

struct Registry {
    descriptors: DashMap<TypeId, Arc<TypeDescriptor>>,
    /// One build lock per type still being described.
    building: DashMap<TypeId, Arc<Mutex<()>>>,
}

static REGISTRY: Lazy<Registry> = Lazy::new(|| Registry {
    descriptors: DashMap::new(),
    building: DashMap::new(),
});

/// Returns the descriptor for `T`, building it on first request.
///
/// Concurrent first requests build at most once; every caller receives the
/// same `Arc` for the lifetime of the process. Builds of different types do
/// not wait on each other, so a [`Bind::describe`] may resolve other types.
pub fn resolve<T: Bind>() -> Arc<TypeDescriptor> {
    let key = TypeId::of::<T>();
    if let Some(found) = REGISTRY.descriptors.get(&key) {
        return Arc::clone(found.value());
    }

    let lock = Arc::clone(REGISTRY.building.entry(key).or_default().value());
    let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(found) = REGISTRY.descriptors.get(&key) {
        return Arc::clone(found.value());
    }

    // Nested members resolve lazily, so `describe` never re-enters here.
    let descriptor = Arc::new(TypeDescriptor::build::<T>());
    log::debug!(
        "registered {} with {} members",
        descriptor.type_name(),
        descriptor.fields().len()
    );
    REGISTRY.descriptors.insert(key, Arc::clone(&descriptor));
    REGISTRY.building.remove(&key);
    descriptor
}

/// The cached descriptor for `T`, without building one.
pub fn cached<T: Bind>() -> Option<Arc<TypeDescriptor>> {
    REGISTRY
        .descriptors
        .get(&TypeId::of::<T>())
        .map(|found| Arc::clone(found.value()))
}

/// Number of descriptors published so far.
pub fn len() -> usize {
    REGISTRY.descriptors.len()
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::types::descriptor::Fields;

    static DESCRIBED: AtomicUsize = AtomicUsize::new(0);

    #[derive(Default)]
    struct Counted {
        value: i32,
    }

    impl Bind for Counted {
        fn describe(fields: &mut Fields<Self>) {
            DESCRIBED.fetch_add(1, Ordering::SeqCst);
            fields.field("value", |c| &mut c.value);
        }
    }

    #[rstest::rstest]
    fn test_resolve_builds_once() {
        let first = resolve::<Counted>();
        let second = resolve::<Counted>();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(DESCRIBED.load(Ordering::SeqCst), 1);
        assert!(cached::<Counted>().is_some());
        assert!(len() >= 1);
    }

    #[derive(Default)]
    struct Eager {
        inner: i32,
    }

    impl Bind for Eager {
        fn describe(fields: &mut Fields<Self>) {
            // Resolving another type while this one is being built.
            let counted = resolve::<Counted>();
            assert_eq!(counted.fields().len(), 1);
            fields.field("inner", |e| &mut e.inner);
        }
    }

    #[rstest::rstest]
    fn test_describe_may_resolve_other_types() {
        let eager = resolve::<Eager>();
        assert_eq!(eager.fields().len(), 1);
        assert!(cached::<Counted>().is_some());
        assert!(REGISTRY.building.get(&TypeId::of::<Eager>()).is_none());
    }

    #[derive(Default)]
    struct Threaded {
        value: i32,
    }

    impl Bind for Threaded {
        fn describe(fields: &mut Fields<Self>) {
            fields.field("value", |t| &mut t.value);
        }
    }

    #[rstest::rstest]
    fn test_concurrent_first_use_shares_descriptor() {
        let handles: Vec<_> = (0..8)
            .map(|_| std::thread::spawn(resolve::<Threaded>))
            .collect();
        let resolved: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        for descriptor in &resolved[1..] {
            assert!(Arc::ptr_eq(&resolved[0], descriptor));
        }
    }
}
