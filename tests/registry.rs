use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use jsonbind::{bindable, registry, wire_hash, Bind, Fields, Seq, SequenceKind};
use rayon::prelude::*;
use rstest::rstest;

static DESCRIBE_CALLS: AtomicUsize = AtomicUsize::new(0);

#[derive(Debug, Default)]
struct Order {
    id: u32,
    lines: Seq<Line>,
}

#[derive(Debug, Default)]
struct Line {
    sku: String,
    quantity: u16,
}

impl Bind for Order {
    fn describe(fields: &mut Fields<Self>) {
        DESCRIBE_CALLS.fetch_add(1, Ordering::SeqCst);
        fields.field("id", |o| &mut o.id);
        fields
            .field("lines", |o| &mut o.lines)
            .sequence(SequenceKind::Deque);
    }
}

impl Bind for Line {
    fn describe(fields: &mut Fields<Self>) {
        fields.field("sku", |l| &mut l.sku);
        fields.field("quantity", |l| &mut l.quantity);
    }
}

bindable!(Order, Line);

fn order_json(id: u32) -> String {
    format!(r#"{{"id": {id}, "lines": [{{"sku": "A-{id}", "quantity": 2}}, {{"sku": "B", "quantity": 1}}]}}"#)
}

#[rstest]
fn concurrent_first_use_builds_one_descriptor() {
    let orders: Vec<Order> = (0..64u32)
        .into_par_iter()
        .map(|id| jsonbind::from_str(&order_json(id)).unwrap())
        .collect();

    assert_eq!(DESCRIBE_CALLS.load(Ordering::SeqCst), 1);
    for (id, order) in orders.iter().enumerate() {
        assert_eq!(order.id as usize, id);
        assert_eq!(order.lines.kind(), SequenceKind::Deque);
        let skus: Vec<_> = order.lines.iter().map(|line| line.sku.as_str()).collect();
        assert_eq!(skus, [format!("A-{id}").as_str(), "B"]);
    }

    let descriptors: Vec<_> = (0..16)
        .into_par_iter()
        .map(|_| registry::resolve::<Order>())
        .collect();
    for descriptor in &descriptors {
        assert!(Arc::ptr_eq(descriptor, &descriptors[0]));
    }
    assert_eq!(DESCRIBE_CALLS.load(Ordering::SeqCst), 1);
}

#[rstest]
fn nested_descriptor_is_the_cached_one() {
    let _: Order = jsonbind::from_str(&order_json(1)).unwrap();
    let line = registry::cached::<Line>().expect("line descriptor is cached after use");
    assert!(Arc::ptr_eq(&line, &registry::resolve::<Line>()));
    assert_eq!(line.fields().len(), 2);
    assert!(registry::len() >= 2);
}

#[rstest]
fn descriptor_lookup_by_hash() {
    let descriptor = registry::resolve::<Line>();
    let quantity = descriptor
        .field_by_hash(wire_hash(b"quantity"), b"quantity")
        .unwrap();
    assert_eq!(quantity.name(), "quantity");
    assert_eq!(quantity.wire_name(), "quantity");
    assert!(descriptor.field_by_hash(wire_hash(b"sku"), b"SKU").is_none());
    assert!(descriptor.type_name().ends_with("Line"));
}
