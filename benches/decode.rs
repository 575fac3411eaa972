use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use jsonbind::{bindable, Bind, DecodeOptions, Fields, TextMode};
use serde::Deserialize;

const MENU_JSON: &str = include_str!("../tests/fixtures/menu.json");

#[derive(Default, Deserialize)]
struct MenuBar {
    menu: Menu,
}

#[allow(dead_code)]
#[derive(Default, Deserialize)]
struct Menu {
    id: String,
    value: String,
    popup: Popup,
}

#[derive(Default, Deserialize)]
struct Popup {
    menuitem: Vec<MenuItem>,
}

#[allow(dead_code)]
#[derive(Default, Deserialize)]
struct MenuItem {
    value: String,
    onclick: String,
}

impl Bind for MenuBar {
    fn describe(fields: &mut Fields<Self>) {
        fields.field("menu", |bar| &mut bar.menu);
    }
}

impl Bind for Menu {
    fn describe(fields: &mut Fields<Self>) {
        fields.field("id", |menu| &mut menu.id);
        fields.field("value", |menu| &mut menu.value);
        fields.field("popup", |menu| &mut menu.popup);
    }
}

impl Bind for Popup {
    fn describe(fields: &mut Fields<Self>) {
        fields.field("menuitem", |popup| &mut popup.menuitem);
    }
}

impl Bind for MenuItem {
    fn describe(fields: &mut Fields<Self>) {
        fields.field("value", |item| &mut item.value);
        fields.field("onclick", |item| &mut item.onclick);
    }
}

bindable!(MenuBar, Menu, Popup, MenuItem);

#[allow(dead_code)]
#[derive(Default, Deserialize)]
struct Record {
    id: u64,
    name: String,
    score: f64,
    active: bool,
    tags: Vec<String>,
}

impl Bind for Record {
    fn describe(fields: &mut Fields<Self>) {
        fields.field("id", |r| &mut r.id);
        fields.field("name", |r| &mut r.name);
        fields.field("score", |r| &mut r.score);
        fields.field("active", |r| &mut r.active);
        fields.field("tags", |r| &mut r.tags);
    }
}

bindable!(Record);

fn records_json(count: usize) -> String {
    let records: Vec<String> = (0..count)
        .map(|id| {
            format!(
                r#"{{"id": {id}, "name": "record number {id}", "score": {}.25, "active": {}, "tags": ["alpha", "beta", "gamma"]}}"#,
                id % 1000,
                id % 2 == 0
            )
        })
        .collect();
    format!("[{}]", records.join(","))
}

fn bench_menu(c: &mut Criterion) {
    let mut group = c.benchmark_group("menu");
    group.throughput(Throughput::Bytes(MENU_JSON.len() as u64));
    group.bench_function("jsonbind", |b| {
        b.iter(|| {
            let bar: MenuBar = jsonbind::from_str(black_box(MENU_JSON)).unwrap();
            black_box(bar.menu.popup.menuitem.len())
        })
    });
    group.bench_function("serde_json", |b| {
        b.iter(|| {
            let bar: MenuBar = serde_json::from_str(black_box(MENU_JSON)).unwrap();
            black_box(bar.menu.popup.menuitem.len())
        })
    });
    group.finish();
}

fn bench_records(c: &mut Criterion) {
    let mut group = c.benchmark_group("records");
    group.measurement_time(Duration::from_secs(5));
    for count in [100usize, 10_000] {
        let input = records_json(count);
        group.throughput(Throughput::Bytes(input.len() as u64));
        for (label, mode) in [("ascii", TextMode::Ascii), ("utf8", TextMode::Utf8)] {
            let options = DecodeOptions::new()
                .with_member_mode(mode)
                .with_value_mode(mode);
            group.bench_with_input(BenchmarkId::new(label, count), &input, |b, input| {
                b.iter(|| {
                    let records: Vec<Record> =
                        jsonbind::read_value_with_options(input.as_bytes(), &options).unwrap();
                    black_box(records.len())
                })
            });
        }
        group.bench_with_input(BenchmarkId::new("serde_json", count), &input, |b, input| {
            b.iter(|| {
                let records: Vec<Record> = serde_json::from_str(input).unwrap();
                black_box(records.len())
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_menu, bench_records);
criterion_main!(benches);
